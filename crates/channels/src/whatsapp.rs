//! WhatsApp channel adapter.
//!
//! Implements the Channel trait for a device-paired WhatsApp session. Traffic
//! only flows while the pairing session is `Connected`; a disconnect closes
//! the inbound stream. Inbound messages are injected by the transport bridge
//! (or by tests); outbound replies go to per-chat device queues.

use async_trait::async_trait;
use lexclaw_core::channel::{Channel, ChannelId, ChannelMessage, PairingStatus};
use lexclaw_core::error::ChannelError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

type InboundTx = mpsc::Sender<Result<ChannelMessage, ChannelError>>;

/// WhatsApp channel adapter, gated on the pairing status.
pub struct WhatsAppChannel {
    channel_id: ChannelId,
    status: watch::Receiver<PairingStatus>,
    /// Inbound message sender (for injecting messages from the transport).
    inject_tx: Arc<tokio::sync::Mutex<Option<InboundTx>>>,
    /// Outbound message senders per chat_id.
    outbound: tokio::sync::Mutex<HashMap<String, mpsc::Sender<String>>>,
}

impl WhatsAppChannel {
    pub fn new(status: watch::Receiver<PairingStatus>) -> Self {
        Self {
            channel_id: ChannelId("whatsapp".into()),
            status,
            inject_tx: Arc::new(tokio::sync::Mutex::new(None)),
            outbound: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    fn ensure_paired(&self) -> Result<(), ChannelError> {
        match *self.status.borrow() {
            PairingStatus::Connected => Ok(()),
            other => Err(ChannelError::NotPaired(other)),
        }
    }

    /// Inject a message received from a paired device.
    pub async fn inject_message(&self, msg: ChannelMessage) -> Result<(), ChannelError> {
        self.ensure_paired()?;
        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(msg))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Message channel closed".into()))
        } else {
            Err(ChannelError::ConnectionLost(
                "WhatsApp channel not started".into(),
            ))
        }
    }

    /// Register a device queue for a chat; replies to that chat land here.
    pub async fn register_chat(&self, chat_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(64);
        self.outbound.lock().await.insert(chat_id.to_string(), tx);
        rx
    }

    /// Number of chats with a registered device queue.
    pub async fn active_chats(&self) -> usize {
        self.outbound.lock().await.len()
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn id(&self) -> &ChannelId {
        &self.channel_id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        self.ensure_paired()?;
        info!("WhatsApp channel starting");

        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);

        // Close the inbound stream as soon as pairing is lost.
        let mut status = self.status.clone();
        let inject_tx = Arc::clone(&self.inject_tx);
        tokio::spawn(async move {
            if status
                .wait_for(|s| *s != PairingStatus::Connected)
                .await
                .is_ok()
            {
                warn!("Pairing lost, closing WhatsApp inbound stream");
            }
            *inject_tx.lock().await = None;
        });

        Ok(rx)
    }

    async fn send(&self, chat_id: &str, content: &str) -> Result<(), ChannelError> {
        self.ensure_paired()?;
        let outbound = self.outbound.lock().await;
        if let Some(tx) = outbound.get(chat_id) {
            tx.send(content.to_string())
                .await
                .map_err(|_| ChannelError::DeliveryFailed {
                    channel: "whatsapp".into(),
                    reason: format!("Chat '{chat_id}' queue closed"),
                })
        } else {
            info!(chat_id = %chat_id, "No device queue for chat, message dropped");
            Ok(())
        }
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), ChannelError> {
        self.ensure_paired()?;
        let outbound = self.outbound.lock().await;
        if let Some(tx) = outbound.get(chat_id) {
            let _ = tx.send(r#"{"type":"typing"}"#.to_string()).await;
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("WhatsApp channel stopping");
        *self.inject_tx.lock().await = None;
        self.outbound.lock().await.clear();
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(*self.status.borrow() == PairingStatus::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(chat_id: &str, content: &str) -> ChannelMessage {
        ChannelMessage {
            channel_id: ChannelId("whatsapp".into()),
            sender_id: chat_id.into(),
            sender_name: Some("Maria".into()),
            content: content.into(),
            chat_id: chat_id.into(),
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn refuses_to_start_unpaired() {
        let (_tx, rx) = watch::channel(PairingStatus::AwaitingScan);
        let ch = WhatsAppChannel::new(rx);
        assert!(matches!(
            ch.start().await,
            Err(ChannelError::NotPaired(PairingStatus::AwaitingScan))
        ));
        assert!(!ch.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn inject_and_receive_when_connected() {
        let (_tx, rx) = watch::channel(PairingStatus::Connected);
        let ch = WhatsAppChannel::new(rx);
        let mut inbound = ch.start().await.unwrap();

        ch.inject_message(message("5511988887777", "Recebi uma multa"))
            .await
            .unwrap();
        let received = inbound.recv().await.unwrap().unwrap();
        assert_eq!(received.content, "Recebi uma multa");
    }

    #[tokio::test]
    async fn send_routes_to_chat_queue() {
        let (_tx, rx) = watch::channel(PairingStatus::Connected);
        let ch = WhatsAppChannel::new(rx);
        let mut device = ch.register_chat("5511988887777").await;
        assert_eq!(ch.active_chats().await, 1);

        ch.send("5511988887777", "Olá!").await.unwrap();
        assert_eq!(device.recv().await.unwrap(), "Olá!");

        // Unknown chats are dropped, not failed
        ch.send("other", "x").await.unwrap();
    }

    #[tokio::test]
    async fn disconnect_closes_inbound_and_blocks_sends() {
        let (status_tx, rx) = watch::channel(PairingStatus::Connected);
        let ch = WhatsAppChannel::new(rx);
        let mut inbound = ch.start().await.unwrap();

        status_tx.send_replace(PairingStatus::Disconnected);
        assert!(inbound.recv().await.is_none());

        assert!(matches!(
            ch.send("5511988887777", "x").await,
            Err(ChannelError::NotPaired(PairingStatus::Disconnected))
        ));
        assert!(ch.inject_message(message("a", "b")).await.is_err());
    }
}

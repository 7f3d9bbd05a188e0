//! Channel bridge — routes inbound transport messages to conversations.
//!
//! Each chat id maps to one conversation in the [`SessionRegistry`]. A
//! message that arrives while that chat's previous turn is still awaiting
//! its reply is rejected, the same way the chat UI disables sending.

use std::sync::Arc;

use lexclaw_agent::SessionRegistry;
use lexclaw_channels::{PairingService, WhatsAppChannel};
use lexclaw_core::channel::{Channel, ChannelMessage, PairingStatus};
use lexclaw_core::error::{ChannelError, ConversationError};
use lexclaw_core::message::ConversationId;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Outcome of routing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// A turn was started; the reply is delivered in the background.
    Started,
    /// Dropped because the chat already has a turn in flight.
    Busy,
    /// Dropped because the text was blank.
    Ignored,
}

/// Route one inbound message to its conversation and deliver the reply
/// through `channel` once it resolves.
pub async fn route_message(
    channel: &Arc<dyn Channel>,
    sessions: &SessionRegistry,
    msg: ChannelMessage,
) -> Routed {
    let conversation = sessions
        .get_or_open(ConversationId::from(msg.chat_id.as_str()))
        .await;

    let pending = match conversation.submit(&msg.content).await {
        Ok(pending) => pending,
        Err(ConversationError::TurnInFlight(id)) => {
            warn!(conversation_id = %id, "Turn in flight, inbound message dropped");
            return Routed::Busy;
        }
        Err(e) => {
            debug!(chat_id = %msg.chat_id, error = %e, "Inbound message ignored");
            return Routed::Ignored;
        }
    };

    if let Err(e) = channel.send_typing(&msg.chat_id).await {
        debug!(chat_id = %msg.chat_id, error = %e, "Typing indicator not sent");
    }

    let channel = Arc::clone(channel);
    let chat_id = msg.chat_id;
    tokio::spawn(async move {
        match pending.reply().await {
            Ok(reply) => {
                if let Err(e) = channel.send(&chat_id, &reply.text).await {
                    warn!(chat_id = %chat_id, error = %e, "Reply not delivered");
                }
            }
            Err(e) => error!(chat_id = %chat_id, error = %e, "Turn task failed"),
        }
    });

    Routed::Started
}

/// Drain an inbound stream until the transport closes it.
pub async fn run_channel(
    channel: Arc<dyn Channel>,
    sessions: Arc<SessionRegistry>,
    mut inbound: mpsc::Receiver<Result<ChannelMessage, ChannelError>>,
) {
    while let Some(result) = inbound.recv().await {
        match result {
            Ok(msg) => {
                route_message(&channel, &sessions, msg).await;
            }
            Err(e) => warn!(channel = channel.name(), error = %e, "Inbound error"),
        }
    }
    info!(channel = channel.name(), "Inbound stream closed");
}

/// Serve the WhatsApp transport for as long as the pairing service lives,
/// restarting the channel each time the device is paired again.
pub async fn serve_whatsapp(
    pairing: Arc<PairingService>,
    channel: Arc<WhatsAppChannel>,
    sessions: Arc<SessionRegistry>,
) {
    let mut status = pairing.subscribe_status();
    drop(pairing);

    loop {
        if status
            .wait_for(|s| *s == PairingStatus::Connected)
            .await
            .is_err()
        {
            break;
        }

        match channel.start().await {
            Ok(inbound) => {
                let dyn_channel: Arc<dyn Channel> = channel.clone();
                run_channel(dyn_channel, Arc::clone(&sessions), inbound).await;
            }
            Err(e) => warn!(error = %e, "WhatsApp channel failed to start"),
        }

        // Wait for the pairing to drop before arming again.
        if status
            .wait_for(|s| *s != PairingStatus::Connected)
            .await
            .is_err()
        {
            break;
        }
    }
}

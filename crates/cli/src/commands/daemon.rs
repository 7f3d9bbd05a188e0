//! `lexclaw daemon` — Gateway plus the WhatsApp transport.

use std::sync::Arc;

use lexclaw_channels::WhatsAppChannel;
use lexclaw_config::AppConfig;
use lexclaw_gateway::{GatewayState, bridge};
use tracing::info;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("⚖️  LexClaw Daemon — Starting");
    println!("   Gateway:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Session:  {}", config.pairing.session_name);

    let state = GatewayState::from_config(&config)?;
    state.pairing.start().await;

    let whatsapp = Arc::new(WhatsAppChannel::new(state.pairing.subscribe_status()));
    tokio::spawn(bridge::serve_whatsapp(
        Arc::clone(&state.pairing),
        whatsapp,
        Arc::clone(&state.sessions),
    ));
    info!("WhatsApp transport armed; waiting for pairing");

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    lexclaw_gateway::serve(state, &addr).await?;

    Ok(())
}

//! `lexclaw pair` — Show the rotating pairing token and simulate a scan.

use lexclaw_channels::PairingService;
use lexclaw_config::AppConfig;
use lexclaw_core::channel::PairingStatus;
use lexclaw_core::event::EventBus;
use std::sync::Arc;

pub async fn run(scan_after: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let pairing = PairingService::simulated(&config.pairing, Arc::new(EventBus::default()));
    let mut status = pairing.subscribe_status();
    let tick = std::time::Duration::from_millis(config.pairing.tick_interval_ms.max(1));

    println!("⚖️  LexClaw — Connect WhatsApp");
    println!("   Open WhatsApp on the phone, go to Linked Devices and scan the code.\n");

    pairing.start().await;

    for _ in 0..scan_after {
        let snapshot = pairing.snapshot().await;
        let token = snapshot.token.as_deref().unwrap_or("-");
        let marker = if snapshot.expiring_soon { " ⏳" } else { "" };
        println!(
            "   [{}] token {}  ({}s){}",
            snapshot.generation, token, snapshot.remaining_ticks, marker
        );
        tokio::time::sleep(tick).await;
    }

    println!("\n   📱 Device scanned the code, authenticating...");
    pairing.present_credential().await?;

    status
        .wait_for(|s| *s == PairingStatus::Connected)
        .await
        .map_err(|e| format!("Pairing service stopped: {e}"))?;

    let snapshot = pairing.snapshot().await;
    println!(
        "   ✅ Connected as \"{}\"",
        snapshot.session_name.as_deref().unwrap_or(&config.pairing.session_name)
    );

    pairing.disconnect().await?;
    let snapshot = pairing.snapshot().await;
    println!(
        "   🔌 Disconnected; waiting for a new scan with token generation {}",
        snapshot.generation
    );

    pairing.stop().await;
    Ok(())
}

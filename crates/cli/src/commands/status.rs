//! `lexclaw status` — Show configuration status.

use lexclaw_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("⚖️  LexClaw Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Temperature:  {}", config.temperature);
    println!("  Company:      {}", config.bot.company_name);
    println!("  Assistant:    {} ({})", config.bot.assistant_name, config.bot.tone);
    println!(
        "  Pairing:      {} ticks × {} ms, session \"{}\"",
        config.pairing.token_validity_ticks,
        config.pairing.tick_interval_ms,
        config.pairing.session_name
    );
    match config.conversation.history_window() {
        Some(limit) => println!("  History:      last {limit} messages"),
        None => println!("  History:      unbounded"),
    }
    println!("  Timeout:      {}s", config.responder.timeout_secs);
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);

    match config.require_api_key() {
        Ok(_) => println!("\n  ✅ API key configured"),
        Err(e) => println!("\n  ⚠️  {e}"),
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — run `lexclaw onboard` first");
    }

    Ok(())
}

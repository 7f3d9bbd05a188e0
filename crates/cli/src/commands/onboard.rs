//! `lexclaw onboard` — First-time setup.

use lexclaw_config::{API_KEY_ENV_VARS, AppConfig};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("⚖️  LexClaw — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!(
        "   1. Set {} or add api_key to {}",
        API_KEY_ENV_VARS[0],
        config_path.display()
    );
    println!("   2. Adjust the [bot] section (company, assistant name, tone)");
    println!("   3. Run: lexclaw chat\n");

    Ok(())
}

//! `lexclaw chat` — Interactive or single-message chat in the terminal.

use std::io::Write;

use lexclaw_config::AppConfig;
use lexclaw_core::message::ChatMessage;
use lexclaw_gateway::GatewayState;
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_reply(reply: &ChatMessage) {
    println!();
    for line in reply.text.lines() {
        println!("  Assistente > {line}");
    }
    println!();
}

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fails fast without a credential.
    let state = GatewayState::from_config(&config)?;
    let conversation = state.sessions.open().await;

    if let Some(msg) = message {
        eprint!("  Digitando...");
        let reply = conversation.send(&msg).await?;
        eprint!("\r              \r");
        println!("{}", reply.text);
        return Ok(());
    }

    let bot = state.sessions.bot().snapshot();
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        LexClaw — Interactive Chat            ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:   {}", config.default_provider);
    println!("  Model:      {}", config.default_model);
    println!("  Assistant:  {} ({})", bot.assistant_name, bot.company_name);
    println!("  Tone:       {}", bot.tone);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");

    if let Some(greeting) = conversation.messages().await.first() {
        print_reply(greeting);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  Você > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text == "exit" || text == "quit" {
            break;
        }

        if !text.is_empty() {
            eprint!("  ...");
            let result = conversation.send(text).await;
            eprint!("\r     \r");
            match result {
                Ok(reply) => print_reply(&reply),
                Err(e) => eprintln!("  [Error] {e}\n"),
            }
        }

        print!("  Você > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Até logo! 👋");
    println!();

    Ok(())
}

//! LexClaw CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config file
//! - `chat`     — Talk to the assistant in the terminal
//! - `pair`     — Show the pairing token and simulate a device scan
//! - `gateway`  — Start the HTTP API server
//! - `daemon`   — Gateway plus the WhatsApp transport
//! - `status`   — Show configuration status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "lexclaw",
    about = "LexClaw — WhatsApp legal-intake assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ~/.lexclaw/config.toml with defaults
    Onboard,

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show the pairing token countdown and simulate a scan
    Pair {
        /// Timer ticks to wait before presenting the credential
        #[arg(long, default_value_t = 3)]
        scan_after: u32,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start the gateway and the WhatsApp transport
    Daemon,

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Pair { scan_after } => commands::pair::run(scan_after).await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Daemon => commands::daemon::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}

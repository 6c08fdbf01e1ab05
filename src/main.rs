mod lifecycle;
mod qr;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use warden_client::{discover_chrome, BridgeFactory};
use warden_core::config;
use warden_store::SessionStore;

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Warden — single-session WhatsApp operator bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot and supervise the connection until interrupted.
    Start,
    /// Inspect configuration, credentials, and browser availability.
    Status,
    /// Wipe the stored credential session (forces a fresh QR pairing).
    Purge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.bot.log_level)),
        )
        .init();

    let session_dir = cfg.session.resolved_dir(&cfg.bot.data_dir);
    let store = SessionStore::new(&session_dir);

    match cli.command {
        Commands::Start => {
            println!("Warden — starting {}...", cfg.bot.name);
            let factory = Arc::new(BridgeFactory::new(
                cfg.bridge.clone(),
                &session_dir,
                &cfg.session.client_id,
            ));
            let controller = lifecycle::Controller::new(cfg, store, factory);
            controller.run().await?;
        }
        Commands::Status => {
            println!("Warden — Status\n");
            println!("Config: {}", cli.config);
            println!("Bot name: {}", cfg.bot.name);
            println!();

            let summary = store.inspect();
            println!("Session dir: {session_dir}");
            if summary.file_count > 0 {
                println!(
                    "  credentials: {} files, {} bytes (paired)",
                    summary.file_count, summary.total_bytes
                );
            } else {
                println!("  credentials: none (next start requires a QR scan)");
            }
            println!();

            println!("Bridge: {} {}", cfg.bridge.program, cfg.bridge.script);
            match discover_chrome(&cfg.bridge.chrome_candidates) {
                Some(path) => println!("  browser: {}", path.display()),
                None => println!("  browser: none of the configured candidates exist"),
            }
        }
        Commands::Purge => {
            let summary = store.inspect();
            store
                .purge(
                    cfg.session.purge_retries,
                    std::time::Duration::from_millis(cfg.session.purge_backoff_ms),
                )
                .await?;
            println!(
                "Purged {} files from {session_dir}. The next start will show a pairing QR.",
                summary.file_count
            );
        }
    }

    Ok(())
}

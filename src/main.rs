use clap::{Parser, Subcommand};
use guild_migrate::attachments::HttpDownloader;
use guild_migrate::migrate::{self, Mode};
use guild_migrate::platform::discord::DiscordPlatform;
use guild_migrate::{config::Config, Data};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Copy channels, message history, emojis and stickers from one guild to another.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map channels by name and replay their message history
    Messages,
    /// Copy custom emojis and stickers
    Assets,
    /// Messages, then assets
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    info!("Starting guild migration with {:?}", config);

    let data = Data {
        platform: Arc::new(DiscordPlatform::new(&config.discord_token)),
        downloader: Arc::new(HttpDownloader::new(reqwest::Client::new())),
        config,
    };

    let mode = match cli.command {
        Commands::Messages => Mode::Messages,
        Commands::Assets => Mode::Assets,
        Commands::All => Mode::All,
    };

    let report = migrate::run(&data, mode).await?;
    info!(
        "Done: {}",
        serde_json::to_string(&report).unwrap_or_else(|_| format!("{:?}", report))
    );

    Ok(())
}

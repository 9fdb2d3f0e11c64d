use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::channels::NameMatch;
use crate::format::FormatOptions;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub source_guild_id: u64,
    pub target_guild_id: u64,
    pub temp_dir: PathBuf,
    /// Messages requested per history page (platform maximum is 100)
    pub page_size: u8,
    pub pacing: Pacing,
    pub format: FormatOptions,
    pub copy_emojis: bool,
    pub copy_stickers: bool,
    pub name_match: NameMatch,
}

/// Fixed delays used to stay under the remote rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub page_delay: Duration,
    pub send_delay: Duration,
    pub attachment_delay: Duration,
    pub retry_delay: Duration,
    pub channel_create_delay: Duration,
    pub asset_delay: Duration,
    pub rate_limit_pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(400),
            send_delay: Duration::from_millis(1200),
            attachment_delay: Duration::from_millis(300),
            retry_delay: Duration::from_millis(1500),
            channel_create_delay: Duration::from_millis(500),
            asset_delay: Duration::from_millis(1500),
            rate_limit_pause: Duration::from_secs(5),
        }
    }
}

impl Pacing {
    /// No waiting at all; used when driving the pipeline against a local platform.
    pub fn none() -> Self {
        Self {
            page_delay: Duration::ZERO,
            send_delay: Duration::ZERO,
            attachment_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            channel_create_delay: Duration::ZERO,
            asset_delay: Duration::ZERO,
            rate_limit_pause: Duration::ZERO,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u8 = 100;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        let defaults = Pacing::default();
        let discord_token = env::var("DISCORD_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN must be set"))?;

        Ok(Config {
            discord_token,
            source_guild_id: required_id("SOURCE_GUILD_ID")?,
            target_guild_id: required_id("TARGET_GUILD_ID")?,
            temp_dir: env::var("MIGRATE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("guild-migrate-temp")),
            page_size: env::var("MESSAGE_BATCH_LIMIT")
                .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
                .parse::<u8>()
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, DEFAULT_PAGE_SIZE),
            pacing: Pacing {
                page_delay: duration_var("PAGE_DELAY", defaults.page_delay),
                send_delay: duration_var("SEND_DELAY", defaults.send_delay),
                attachment_delay: duration_var(
                    "ATTACHMENT_DOWNLOAD_DELAY",
                    defaults.attachment_delay,
                ),
                retry_delay: duration_var("SEND_RETRY_DELAY", defaults.retry_delay),
                channel_create_delay: duration_var(
                    "CHANNEL_CREATE_DELAY",
                    defaults.channel_create_delay,
                ),
                asset_delay: duration_var("ASSET_DELAY", defaults.asset_delay),
                rate_limit_pause: duration_var("RATE_LIMIT_PAUSE", defaults.rate_limit_pause),
            },
            format: FormatOptions {
                forwarded: flag_var("ENABLE_FORWARDED_MESSAGES", true),
                embeds: flag_var("ENABLE_EMBEDS", true),
                stickers: flag_var("ENABLE_STICKERS", true),
            },
            copy_emojis: flag_var("COPY_EMOJIS", true),
            copy_stickers: flag_var("COPY_STICKERS", true),
            name_match: env::var("NAME_MATCH")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
        })
    }
}

fn required_id(key: &str) -> anyhow::Result<u64> {
    env::var(key)
        .map_err(|_| anyhow::anyhow!("{} must be set", key))?
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a valid u64", key))
}

fn duration_var(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| humantime::parse_duration(value.trim()).ok())
        .unwrap_or(default)
}

fn flag_var(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("source_guild_id", &self.source_guild_id)
            .field("target_guild_id", &self.target_guild_id)
            .field("temp_dir", &self.temp_dir)
            .field("page_size", &self.page_size)
            .field("pacing", &self.pacing)
            .field("format", &self.format)
            .field("copy_emojis", &self.copy_emojis)
            .field("copy_stickers", &self.copy_stickers)
            .field("name_match", &self.name_match)
            .finish()
    }
}

/// Discord message limit is 2000 characters
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

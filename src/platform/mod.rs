use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::{ChannelInfo, EmojiInfo, GuildInfo, NewChannel, SourceMessage, StickerInfo};

pub mod discord;
#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read staged file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlatformError {
    /// The remote API reports throttling only through its failure text.
    pub fn is_rate_limited(&self) -> bool {
        is_rate_limit_text(&self.to_string())
    }
}

pub fn is_rate_limit_text(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("429") || lowered.contains("rate limit")
}

/// A file on disk to upload alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFile {
    pub path: PathBuf,
    pub filename: String,
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// The remote chat service. Every call may fail with a permission or
/// rate-limit error; callers treat those as per-item failures.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Tag of the authenticated account; doubles as a credential check.
    async fn current_user(&self) -> PlatformResult<String>;
    async fn guild(&self, guild_id: u64) -> PlatformResult<GuildInfo>;
    async fn text_channels(&self, guild_id: u64) -> PlatformResult<Vec<ChannelInfo>>;
    async fn create_text_channel(
        &self,
        guild_id: u64,
        channel: &NewChannel,
    ) -> PlatformResult<ChannelInfo>;
    /// One page of history, newest first, strictly older than `before`.
    async fn messages_before(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> PlatformResult<Vec<SourceMessage>>;
    /// Returns the id of the created message.
    async fn send_message(
        &self,
        channel_id: u64,
        content: &str,
        files: &[OutgoingFile],
    ) -> PlatformResult<u64>;
    async fn emojis(&self, guild_id: u64) -> PlatformResult<Vec<EmojiInfo>>;
    async fn create_emoji(&self, guild_id: u64, name: &str, image: Vec<u8>) -> PlatformResult<()>;
    async fn stickers(&self, guild_id: u64) -> PlatformResult<Vec<StickerInfo>>;
    async fn create_sticker(
        &self,
        guild_id: u64,
        sticker: &StickerInfo,
        image: Vec<u8>,
    ) -> PlatformResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rate_limit_failures() {
        assert!(PlatformError::Request("HTTP 429 Too Many Requests".to_string()).is_rate_limited());
        assert!(PlatformError::Request("You are being Rate Limited.".to_string()).is_rate_limited());
        assert!(!PlatformError::Request("Missing Permissions".to_string()).is_rate_limited());
        assert!(!PlatformError::NotFound("guild 1".to_string()).is_rate_limited());
    }
}

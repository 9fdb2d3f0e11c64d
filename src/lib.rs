pub mod assets;
pub mod attachments;
pub mod channels;
pub mod config;
pub mod format;
pub mod history;
pub mod migrate;
pub mod model;
pub mod platform;
pub mod report;
pub mod send;

use std::sync::Arc;

/// Shared state for one run
pub struct Data {
    pub config: config::Config,
    pub platform: Arc<dyn platform::ChatPlatform>,
    /// CDN fetches for attachments, emojis and stickers
    pub downloader: Arc<dyn attachments::Downloader>,
}

//! In-memory platform and downloader for driving the pipeline in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{ChatPlatform, OutgoingFile, PlatformError, PlatformResult};
use crate::attachments::Downloader;
use crate::channels::NameMatch;
use crate::config::{Config, Pacing, DEFAULT_PAGE_SIZE};
use crate::format::FormatOptions;
use crate::Data;
use crate::model::{
    ChannelInfo, EmojiInfo, GuildInfo, MessageKind, NewChannel, SourceMessage, StickerInfo,
};

#[derive(Debug, Clone)]
pub struct SentFile {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub id: u64,
    pub content: String,
    pub files: Vec<SentFile>,
}

#[derive(Default)]
struct State {
    guilds: HashMap<u64, GuildInfo>,
    channels: HashMap<u64, Vec<ChannelInfo>>,
    /// Oldest first, as the channel would have stored them
    history: HashMap<u64, Vec<SourceMessage>>,
    sent: HashMap<u64, Vec<SentMessage>>,
    emojis: HashMap<u64, Vec<EmojiInfo>>,
    stickers: HashMap<u64, Vec<StickerInfo>>,
    next_id: u64,
    page_requests: usize,
    fail_page_at: Option<usize>,
    send_attempts: usize,
    passing_sends: usize,
    failing_sends: usize,
    send_error: String,
    fail_channel_create: bool,
    asset_error: Option<String>,
    staged_at_send: Vec<PathBuf>,
}

pub struct MemoryPlatform {
    state: Mutex<State>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 10_000,
                send_error: "Internal Server Error".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn add_guild(&self, id: u64, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.guilds.insert(
            id,
            GuildInfo {
                id,
                name: name.to_string(),
            },
        );
        state.channels.entry(id).or_default();
    }

    pub fn add_channel(&self, guild_id: u64, id: u64, name: &str, position: u16) -> ChannelInfo {
        let channel = ChannelInfo {
            id,
            name: name.to_string(),
            topic: Some(format!("about {}", name)),
            nsfw: false,
            position,
        };
        let mut state = self.state.lock().unwrap();
        state
            .channels
            .entry(guild_id)
            .or_default()
            .push(channel.clone());
        channel
    }

    /// Appends to the channel history; ids must be increasing.
    pub fn push_message(&self, channel_id: u64, message: SourceMessage) {
        let mut state = self.state.lock().unwrap();
        state.history.entry(channel_id).or_default().push(message);
    }

    pub fn add_emoji(&self, guild_id: u64, id: u64, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.emojis.entry(guild_id).or_default().push(EmojiInfo {
            name: name.to_string(),
            url: format!("https://cdn.test/emojis/{}.png", id),
        });
    }

    pub fn add_sticker(&self, guild_id: u64, id: u64, name: &str, url: Option<String>) {
        let mut state = self.state.lock().unwrap();
        state.stickers.entry(guild_id).or_default().push(StickerInfo {
            id,
            name: name.to_string(),
            description: None,
            tags: Vec::new(),
            url,
        });
    }

    /// The page request with this zero-based index fails.
    pub fn fail_page_at(&self, index: usize) {
        self.state.lock().unwrap().fail_page_at = Some(index);
    }

    /// The next `count` send attempts fail with `error`.
    pub fn fail_sends(&self, count: usize, error: &str) {
        let mut state = self.state.lock().unwrap();
        state.failing_sends = count;
        state.send_error = error.to_string();
    }

    /// Lets `passing` sends through, then fails the next `count` with `error`.
    pub fn fail_sends_after(&self, passing: usize, count: usize, error: &str) {
        let mut state = self.state.lock().unwrap();
        state.passing_sends = passing;
        state.failing_sends = count;
        state.send_error = error.to_string();
    }

    pub fn fail_channel_create(&self) {
        self.state.lock().unwrap().fail_channel_create = true;
    }

    pub fn fail_asset_creates(&self, error: &str) {
        self.state.lock().unwrap().asset_error = Some(error.to_string());
    }

    pub fn page_requests(&self) -> usize {
        self.state.lock().unwrap().page_requests
    }

    pub fn send_attempts(&self) -> usize {
        self.state.lock().unwrap().send_attempts
    }

    pub fn sent(&self, channel_id: u64) -> Vec<SentMessage> {
        self.state
            .lock()
            .unwrap()
            .sent
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Paths of every file handed to a send, whether or not it succeeded.
    pub fn staged_at_send(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().staged_at_send.clone()
    }

    pub fn channels(&self, guild_id: u64) -> Vec<ChannelInfo> {
        self.state
            .lock()
            .unwrap()
            .channels
            .get(&guild_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn emoji_names(&self, guild_id: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .emojis
            .get(&guild_id)
            .map(|emojis| emojis.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn sticker_names(&self, guild_id: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .stickers
            .get(&guild_id)
            .map(|stickers| stickers.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatPlatform for MemoryPlatform {
    async fn current_user(&self) -> PlatformResult<String> {
        Ok("migrator#0001".to_string())
    }

    async fn guild(&self, guild_id: u64) -> PlatformResult<GuildInfo> {
        self.state
            .lock()
            .unwrap()
            .guilds
            .get(&guild_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("guild {}", guild_id)))
    }

    async fn text_channels(&self, guild_id: u64) -> PlatformResult<Vec<ChannelInfo>> {
        Ok(self.channels(guild_id))
    }

    async fn create_text_channel(
        &self,
        guild_id: u64,
        channel: &NewChannel,
    ) -> PlatformResult<ChannelInfo> {
        let mut state = self.state.lock().unwrap();
        if state.fail_channel_create {
            return Err(PlatformError::Request("Missing Permissions".to_string()));
        }
        state.next_id += 1;
        let created = ChannelInfo {
            id: state.next_id,
            name: channel.name.clone(),
            topic: channel.topic.clone(),
            nsfw: channel.nsfw,
            position: 0,
        };
        state
            .channels
            .entry(guild_id)
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn messages_before(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> PlatformResult<Vec<SourceMessage>> {
        let mut state = self.state.lock().unwrap();
        let index = state.page_requests;
        state.page_requests += 1;
        if state.fail_page_at == Some(index) {
            return Err(PlatformError::Request("Service Unavailable".to_string()));
        }

        let history = state.history.get(&channel_id).cloned().unwrap_or_default();
        Ok(history
            .into_iter()
            .rev()
            .filter(|message| before.map_or(true, |before| message.id < before))
            .take(usize::from(limit))
            .collect())
    }

    async fn send_message(
        &self,
        channel_id: u64,
        content: &str,
        files: &[OutgoingFile],
    ) -> PlatformResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.send_attempts += 1;
        state
            .staged_at_send
            .extend(files.iter().map(|file| file.path.clone()));

        if state.passing_sends > 0 {
            state.passing_sends -= 1;
        } else if state.failing_sends > 0 {
            state.failing_sends -= 1;
            return Err(PlatformError::Request(state.send_error.clone()));
        }

        let mut sent_files = Vec::with_capacity(files.len());
        for file in files {
            let data = std::fs::read(&file.path).map_err(|source| PlatformError::File {
                path: file.path.clone(),
                source,
            })?;
            sent_files.push(SentFile {
                filename: file.filename.clone(),
                data,
            });
        }

        state.next_id += 1;
        let id = state.next_id;
        state.sent.entry(channel_id).or_default().push(SentMessage {
            id,
            content: content.to_string(),
            files: sent_files,
        });
        Ok(id)
    }

    async fn emojis(&self, guild_id: u64) -> PlatformResult<Vec<EmojiInfo>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .emojis
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_emoji(&self, guild_id: u64, name: &str, image: Vec<u8>) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = &state.asset_error {
            return Err(PlatformError::Request(error.clone()));
        }
        if image.is_empty() {
            return Err(PlatformError::Request("Invalid image data".to_string()));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.emojis.entry(guild_id).or_default().push(EmojiInfo {
            name: name.to_string(),
            url: format!("https://cdn.test/emojis/{}.png", id),
        });
        Ok(())
    }

    async fn stickers(&self, guild_id: u64) -> PlatformResult<Vec<StickerInfo>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .stickers
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_sticker(
        &self,
        guild_id: u64,
        sticker: &StickerInfo,
        _image: Vec<u8>,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = &state.asset_error {
            return Err(PlatformError::Request(error.clone()));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.stickers.entry(guild_id).or_default().push(StickerInfo {
            id,
            ..sticker.clone()
        });
        Ok(())
    }
}

/// Serves fixed bytes per URL; unknown URLs fail like a 404.
#[derive(Default)]
pub struct MemoryDownloader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryDownloader {
    pub fn with(mut self, url: &str, data: &[u8]) -> Self {
        self.files.insert(url.to_string(), data.to_vec());
        self
    }
}

#[async_trait]
impl Downloader for MemoryDownloader {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Download failed: 404 Not Found ({})", url))
    }
}

pub fn text_message(id: u64, author: &str, content: &str) -> SourceMessage {
    SourceMessage {
        id,
        author: author.to_string(),
        created_at: 1_700_000_000 + id as i64,
        edited_at: None,
        content: content.to_string(),
        kind: MessageKind::Regular,
        reference: None,
        attachments: Vec::new(),
        embeds: Vec::new(),
        stickers: Vec::new(),
    }
}

/// A fresh per-test directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "guild-migrate-test-{}-{}",
        std::process::id(),
        name
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Run context over the in-memory platform with no pacing delays.
pub fn test_data(platform: Arc<MemoryPlatform>, downloader: MemoryDownloader, temp_dir: &Path) -> Data {
    Data {
        config: Config {
            discord_token: "test".to_string(),
            source_guild_id: 1,
            target_guild_id: 2,
            temp_dir: temp_dir.to_path_buf(),
            page_size: DEFAULT_PAGE_SIZE,
            pacing: Pacing::none(),
            format: FormatOptions::default(),
            copy_emojis: true,
            copy_stickers: true,
            name_match: NameMatch::Exact,
        },
        platform,
        downloader: Arc::new(downloader),
    }
}

//! Platform-neutral records the migration pipeline works on.
//!
//! Everything here is read from the source guild once and never mutated;
//! the pipeline only derives outgoing payloads from it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
    pub topic: Option<String>,
    pub nsfw: bool,
    pub position: u16,
}

/// What to create in the target guild when no channel matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    pub name: String,
    pub topic: Option<String>,
    pub nsfw: bool,
}

impl From<&ChannelInfo> for NewChannel {
    fn from(channel: &ChannelInfo) -> Self {
        Self {
            name: channel.name.clone(),
            topic: channel.topic.clone().filter(|t| !t.is_empty()),
            nsfw: channel.nsfw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    Regular,
    /// An inline reply to another message
    Reply,
    /// System messages (pins, joins, boosts, ...)
    Other,
}

/// Pointer to another message, carried by replies and forwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLink {
    pub channel_id: u64,
    pub message_id: Option<u64>,
    /// Set for forwards; replies and crossposts use plain references
    pub forward: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub url: String,
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmbedSummary {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMessage {
    pub id: u64,
    pub author: String,
    /// Unix seconds
    pub created_at: i64,
    pub edited_at: Option<i64>,
    pub content: String,
    pub kind: MessageKind,
    pub reference: Option<MessageLink>,
    pub attachments: Vec<AttachmentRef>,
    pub embeds: Vec<EmbedSummary>,
    pub stickers: Vec<StickerRef>,
}

impl SourceMessage {
    /// A reply that still points at the message it answered.
    pub fn is_reply(&self) -> bool {
        self.kind == MessageKind::Reply
            && self
                .reference
                .as_ref()
                .is_some_and(|link| link.message_id.is_some())
    }

    /// Channel a forward was taken from. Only the reference's own kind marks a
    /// forward; crossposts and pins carry plain references.
    pub fn forwarded_from(&self) -> Option<u64> {
        self.reference
            .as_ref()
            .filter(|link| link.forward)
            .map(|link| link.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiInfo {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerInfo {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// `None` for formats the CDN cannot serve as an image (Lottie)
    pub url: Option<String>,
}

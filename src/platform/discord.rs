use async_trait::async_trait;
use serenity::builder::{CreateAttachment, CreateChannel, CreateMessage, CreateSticker, GetMessages};
use serenity::http::Http;
use serenity::model::channel::{
    Attachment, ChannelType, Embed, GuildChannel, Message, MessageReferenceKind, MessageType,
};
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::model::sticker::StickerItem;
use std::sync::Arc;
use tracing::debug;

use super::{ChatPlatform, OutgoingFile, PlatformError, PlatformResult};
use crate::model::{
    AttachmentRef, ChannelInfo, EmbedSummary, EmojiInfo, GuildInfo, MessageKind, MessageLink,
    NewChannel, SourceMessage, StickerInfo, StickerRef,
};

impl From<serenity::Error> for PlatformError {
    fn from(err: serenity::Error) -> Self {
        PlatformError::Request(err.to_string())
    }
}

/// `ChatPlatform` over the Discord REST API. Rate-limit buckets are tracked by
/// serenity's own ratelimiter; anything it surfaces is reported as an error.
pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl DiscordPlatform {
    pub fn new(token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(token)),
        }
    }
}

fn channel_info(channel: &GuildChannel) -> ChannelInfo {
    ChannelInfo {
        id: channel.id.get(),
        name: channel.name.clone(),
        topic: channel.topic.clone(),
        nsfw: channel.nsfw,
        position: channel.position,
    }
}

fn attachment_ref(attachment: &Attachment) -> AttachmentRef {
    AttachmentRef {
        url: attachment.url.clone(),
        filename: attachment.filename.clone(),
        size: u64::from(attachment.size),
    }
}

fn embed_summary(embed: &Embed) -> EmbedSummary {
    EmbedSummary {
        title: embed.title.clone(),
        description: embed.description.clone(),
        url: embed.url.clone(),
    }
}

fn sticker_ref(sticker: &StickerItem) -> StickerRef {
    StickerRef {
        name: sticker.name.clone(),
    }
}

fn source_message(message: &Message) -> SourceMessage {
    let kind = match message.kind {
        MessageType::Regular => MessageKind::Regular,
        MessageType::InlineReply => MessageKind::Reply,
        _ => MessageKind::Other,
    };

    let reference = message.message_reference.as_ref().map(|reference| MessageLink {
        channel_id: reference.channel_id.get(),
        message_id: reference.message_id.map(|id| id.get()),
        forward: reference.kind == MessageReferenceKind::Forward,
    });

    let mut converted = SourceMessage {
        id: message.id.get(),
        author: message.author.tag(),
        created_at: message.timestamp.unix_timestamp(),
        edited_at: message.edited_timestamp.map(|ts| ts.unix_timestamp()),
        content: message.content.clone(),
        kind,
        reference,
        attachments: message.attachments.iter().map(attachment_ref).collect(),
        embeds: message.embeds.iter().map(embed_summary).collect(),
        stickers: message.sticker_items.iter().map(sticker_ref).collect(),
    };

    // A forward arrives empty; what was forwarded lives in the snapshot.
    if converted.forwarded_from().is_some() {
        if let Some(snapshot) = message.message_snapshots.first() {
            converted.content = snapshot.content.clone();
            converted.attachments = snapshot.attachments.iter().map(attachment_ref).collect();
            converted.embeds = snapshot.embeds.iter().map(embed_summary).collect();
            converted.stickers = snapshot.sticker_items.iter().map(sticker_ref).collect();
        }
    }

    converted
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn current_user(&self) -> PlatformResult<String> {
        let user = self.http.get_current_user().await?;
        Ok(user.tag())
    }

    async fn guild(&self, guild_id: u64) -> PlatformResult<GuildInfo> {
        let guild = self
            .http
            .get_guild(GuildId::new(guild_id))
            .await
            .map_err(|e| PlatformError::NotFound(format!("guild {} ({})", guild_id, e)))?;
        Ok(GuildInfo {
            id: guild.id.get(),
            name: guild.name,
        })
    }

    async fn text_channels(&self, guild_id: u64) -> PlatformResult<Vec<ChannelInfo>> {
        let channels = self.http.get_channels(GuildId::new(guild_id)).await?;
        Ok(channels
            .iter()
            .filter(|channel| channel.kind == ChannelType::Text)
            .map(channel_info)
            .collect())
    }

    async fn create_text_channel(
        &self,
        guild_id: u64,
        channel: &NewChannel,
    ) -> PlatformResult<ChannelInfo> {
        let mut builder = CreateChannel::new(channel.name.clone())
            .kind(ChannelType::Text)
            .nsfw(channel.nsfw);
        if let Some(topic) = &channel.topic {
            builder = builder.topic(topic.clone());
        }

        let created = GuildId::new(guild_id)
            .create_channel(&self.http, builder)
            .await?;
        Ok(channel_info(&created))
    }

    async fn messages_before(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> PlatformResult<Vec<SourceMessage>> {
        let mut request = GetMessages::new().limit(limit);
        if let Some(before) = before {
            request = request.before(MessageId::new(before));
        }

        let page = ChannelId::new(channel_id)
            .messages(&self.http, request)
            .await?;
        debug!("Fetched {} message(s) from channel {}", page.len(), channel_id);
        Ok(page.iter().map(source_message).collect())
    }

    async fn send_message(
        &self,
        channel_id: u64,
        content: &str,
        files: &[OutgoingFile],
    ) -> PlatformResult<u64> {
        let mut attachments = Vec::with_capacity(files.len());
        for file in files {
            let data = tokio::fs::read(&file.path)
                .await
                .map_err(|source| PlatformError::File {
                    path: file.path.clone(),
                    source,
                })?;
            attachments.push(CreateAttachment::bytes(data, file.filename.clone()));
        }

        let builder = CreateMessage::new().content(content).add_files(attachments);
        let sent = ChannelId::new(channel_id)
            .send_message(&self.http, builder)
            .await?;
        Ok(sent.id.get())
    }

    async fn emojis(&self, guild_id: u64) -> PlatformResult<Vec<EmojiInfo>> {
        let emojis = GuildId::new(guild_id).emojis(&self.http).await?;
        Ok(emojis
            .iter()
            .map(|emoji| EmojiInfo {
                name: emoji.name.clone(),
                url: emoji.url(),
            })
            .collect())
    }

    async fn create_emoji(&self, guild_id: u64, name: &str, image: Vec<u8>) -> PlatformResult<()> {
        let image = CreateAttachment::bytes(image, format!("{}.png", name)).to_base64();
        GuildId::new(guild_id)
            .create_emoji(&self.http, name, &image)
            .await?;
        Ok(())
    }

    async fn stickers(&self, guild_id: u64) -> PlatformResult<Vec<StickerInfo>> {
        let stickers = GuildId::new(guild_id).stickers(&self.http).await?;
        Ok(stickers
            .iter()
            .map(|sticker| StickerInfo {
                id: sticker.id.get(),
                name: sticker.name.clone(),
                description: sticker.description.clone(),
                tags: sticker.tags.clone(),
                url: sticker.image_url(),
            })
            .collect())
    }

    async fn create_sticker(
        &self,
        guild_id: u64,
        sticker: &StickerInfo,
        image: Vec<u8>,
    ) -> PlatformResult<()> {
        let tags = if sticker.tags.is_empty() {
            "custom".to_string()
        } else {
            sticker.tags.join(",")
        };
        let file = CreateAttachment::bytes(image, format!("{}.png", sticker.name));
        let builder = CreateSticker::new(sticker.name.clone(), file)
            .tags(tags)
            .description(sticker.description.clone().unwrap_or_default());

        GuildId::new(guild_id)
            .create_sticker(&self.http, builder)
            .await?;
        Ok(())
    }
}

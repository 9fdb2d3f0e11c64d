//! Rendering of migrated messages.
//!
//! The original author, time and any context the target cannot reproduce
//! natively (reply/forward links, embeds, stickers) are folded into the text of
//! the re-sent message. Output is fully determined by the input message.

use crate::model::{EmbedSummary, SourceMessage};

/// Embed descriptions longer than this are cut and suffixed with `...`
pub const EMBED_DESCRIPTION_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub forwarded: bool,
    pub embeds: bool,
    pub stickers: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            forwarded: true,
            embeds: true,
            stickers: true,
        }
    }
}

pub fn format_message(message: &SourceMessage, options: &FormatOptions) -> String {
    let mut content = format!(
        "**Originally by {}** (<t:{}:F>)",
        message.author, message.created_at
    );

    if message.is_reply() {
        content.push_str("\n*↪️ This was a reply to another message*");
    }

    if options.forwarded {
        if let Some(channel_id) = message.forwarded_from() {
            content.push_str(&format!(
                "\n*📨 Forwarded message (from channel {})*",
                channel_id
            ));
        }
    }

    if let Some(edited_at) = message.edited_at {
        content.push_str(&format!("\n*✏️ Last edited: <t:{}:R>*", edited_at));
    }

    if !message.content.is_empty() {
        content.push_str("\n\n");
        content.push_str(&message.content);
    }

    if options.embeds && !message.embeds.is_empty() {
        content.push_str(&format!(
            "\n\n*📎 Original message contained {} embed(s)*",
            message.embeds.len()
        ));
        for embed in &message.embeds {
            push_embed(&mut content, embed);
        }
    }

    if options.stickers && !message.stickers.is_empty() {
        let names = message
            .stickers
            .iter()
            .map(|sticker| sticker.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        content.push_str(&format!("\n\n*🎨 Original message had sticker(s): {}*", names));
    }

    content
}

fn push_embed(content: &mut String, embed: &EmbedSummary) {
    if embed.title.is_none() && embed.description.is_none() {
        return;
    }

    content.push_str(&format!(
        "\n\n**Embed:** {}",
        embed.title.as_deref().unwrap_or("Untitled")
    ));
    if let Some(description) = &embed.description {
        content.push('\n');
        content.push_str(&truncate_description(description));
    }
    if let Some(url) = &embed.url {
        content.push_str(&format!("\n🔗 {}", url));
    }
}

pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= EMBED_DESCRIPTION_LIMIT {
        return description.to_string();
    }
    let mut truncated: String = description.chars().take(EMBED_DESCRIPTION_LIMIT).collect();
    truncated.push_str("...");
    truncated
}

/// Splits a payload into chunks of at most `limit` characters, cutting at the
/// last newline inside each window when there is one.
pub fn split_content(content: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = content;

    while rest.chars().count() > limit {
        let hard_end = rest
            .char_indices()
            .nth(limit)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let cut = match rest[..hard_end].rfind('\n') {
            Some(idx) if idx > 0 => idx,
            _ => hard_end,
        };
        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].trim_start_matches('\n');
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

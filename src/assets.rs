//! Emoji and sticker copy between guilds.
//!
//! An asset whose name already exists in the target guild is skipped, so a
//! second run only fills in what the first one missed.

use tracing::{error, info, warn};

use crate::model::{EmojiInfo, StickerInfo};
use crate::platform::is_rate_limit_text;
use crate::report::CopyReport;
use crate::Data;

pub async fn copy_emojis(data: &Data, source_guild_id: u64, target_guild_id: u64) -> CopyReport {
    info!("Starting emoji copy...");
    let mut report = CopyReport::default();

    let source_emojis = match data.platform.emojis(source_guild_id).await {
        Ok(emojis) => emojis,
        Err(e) => {
            error!("  Failed to fetch emojis: {}", e);
            return report;
        }
    };
    info!("  Found {} emoji(s) in source server", source_emojis.len());
    if source_emojis.is_empty() {
        info!("  No emojis to copy");
        return report;
    }

    let mut existing: Vec<String> = match data.platform.emojis(target_guild_id).await {
        Ok(emojis) => emojis.into_iter().map(|e| e.name).collect(),
        Err(e) => {
            warn!("  Failed to fetch target emojis: {}", e);
            Vec::new()
        }
    };

    for emoji in &source_emojis {
        if existing
            .iter()
            .any(|name| data.config.name_match.matches(&emoji.name, name))
        {
            info!("  Skipping emoji :{}: (already exists)", emoji.name);
            report.skipped += 1;
            continue;
        }

        match copy_emoji(data, target_guild_id, emoji).await {
            Ok(()) => {
                report.copied += 1;
                existing.push(emoji.name.clone());
                info!("  Successfully copied emoji :{}:", emoji.name);
                tokio::time::sleep(data.config.pacing.asset_delay).await;
            }
            Err(e) => {
                report.failed += 1;
                error!("  Failed to copy emoji :{}:: {:#}", emoji.name, e);
                pause_if_rate_limited(data, &e).await;
            }
        }
    }

    log_summary("Emoji", &report);
    report
}

async fn copy_emoji(data: &Data, target_guild_id: u64, emoji: &EmojiInfo) -> anyhow::Result<()> {
    if emoji.url.is_empty() {
        anyhow::bail!("No URL for emoji :{}:", emoji.name);
    }
    info!("  Downloading emoji :{}:...", emoji.name);
    let image = data.downloader.fetch(&emoji.url).await?;

    info!("  Creating emoji :{}: in target server...", emoji.name);
    data.platform
        .create_emoji(target_guild_id, &emoji.name, image)
        .await?;
    Ok(())
}

pub async fn copy_stickers(
    data: &Data,
    source_guild_id: u64,
    target_guild_id: u64,
) -> CopyReport {
    info!("Starting sticker copy...");
    let mut report = CopyReport::default();

    let source_stickers = match data.platform.stickers(source_guild_id).await {
        Ok(stickers) => stickers,
        Err(e) => {
            error!("  Failed to fetch stickers: {}", e);
            return report;
        }
    };
    info!("  Found {} sticker(s) in source server", source_stickers.len());
    if source_stickers.is_empty() {
        info!("  No stickers to copy");
        return report;
    }

    let mut existing: Vec<String> = match data.platform.stickers(target_guild_id).await {
        Ok(stickers) => stickers.into_iter().map(|s| s.name).collect(),
        Err(e) => {
            error!("  Failed to fetch target stickers: {}", e);
            Vec::new()
        }
    };

    for sticker in &source_stickers {
        if existing
            .iter()
            .any(|name| data.config.name_match.matches(&sticker.name, name))
        {
            info!("  Skipping sticker \"{}\" (already exists)", sticker.name);
            report.skipped += 1;
            continue;
        }

        match copy_sticker(data, target_guild_id, sticker).await {
            Ok(()) => {
                report.copied += 1;
                existing.push(sticker.name.clone());
                info!("  Successfully copied sticker \"{}\"", sticker.name);
                tokio::time::sleep(data.config.pacing.asset_delay).await;
            }
            Err(e) => {
                report.failed += 1;
                error!("  Failed to copy sticker \"{}\": {:#}", sticker.name, e);
                let text = format!("{:#}", e).to_lowercase();
                if text.contains("boost") || text.contains("premium") {
                    warn!("    Note: Server may need a higher boost level to upload stickers");
                }
                pause_if_rate_limited(data, &e).await;
            }
        }
    }

    log_summary("Sticker", &report);
    if report.failed > 0 {
        info!("  Note: sticker uploads may require a server boost level; emojis do not.");
    }
    report
}

async fn copy_sticker(
    data: &Data,
    target_guild_id: u64,
    sticker: &StickerInfo,
) -> anyhow::Result<()> {
    let Some(url) = &sticker.url else {
        anyhow::bail!("No URL for sticker \"{}\"", sticker.name);
    };
    info!("  Downloading sticker \"{}\"...", sticker.name);
    let image = data.downloader.fetch(url).await?;

    info!("  Creating sticker \"{}\" in target server...", sticker.name);
    data.platform
        .create_sticker(target_guild_id, sticker, image)
        .await?;
    Ok(())
}

async fn pause_if_rate_limited(data: &Data, err: &anyhow::Error) {
    if is_rate_limit_text(&format!("{:#}", err)) {
        let pause = data.config.pacing.rate_limit_pause;
        info!("  Rate limited, waiting {}...", humantime::format_duration(pause));
        tokio::time::sleep(pause).await;
    }
}

fn log_summary(kind: &str, report: &CopyReport) {
    info!("{} Copy Summary:", kind);
    info!("  Copied: {}", report.copied);
    info!("  Skipped: {}", report.skipped);
    info!("  Failed: {}", report.failed);
}

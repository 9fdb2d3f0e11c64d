//! Guild-to-guild migration run.
//!
//! `Idle -> MappingChannels -> {per channel: Fetching -> Transforming ->
//! Sending} -> Cleanup -> Terminal`. Channels, and messages within a channel,
//! are handled one at a time against a single session.

use anyhow::Context as _;
use tracing::{debug, error, info};

use crate::assets;
use crate::attachments::{remove_staging_dir, stage_attachments};
use crate::channels::{map_channels, MappedChannel};
use crate::format::format_message;
use crate::history::fetch_all_messages;
use crate::model::{ChannelInfo, GuildInfo, SourceMessage};
use crate::report::{ChannelReport, MappingReport, RunReport};
use crate::send::{deliver, RetryPolicy, SendOutcome};
use crate::Data;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    MappingChannels,
    Fetching,
    Transforming,
    Sending,
    Cleanup,
    Terminal,
}

/// What a run copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Messages,
    Assets,
    All,
}

impl Mode {
    fn messages(self) -> bool {
        matches!(self, Mode::Messages | Mode::All)
    }

    fn assets(self) -> bool {
        matches!(self, Mode::Assets | Mode::All)
    }
}

struct PhaseTracker {
    phase: RunPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        if self.phase != next {
            debug!("Run phase: {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }
}

/// Checks the credential and both guild ids. Any failure here is fatal.
pub async fn resolve_guilds(data: &Data) -> anyhow::Result<(GuildInfo, GuildInfo)> {
    let user = data
        .platform
        .current_user()
        .await
        .context("Failed to login, check DISCORD_TOKEN")?;
    info!("Logged in as {}", user);

    let source = data
        .platform
        .guild(data.config.source_guild_id)
        .await
        .context("Invalid SOURCE_GUILD_ID")?;
    let target = data
        .platform
        .guild(data.config.target_guild_id)
        .await
        .context("Invalid TARGET_GUILD_ID")?;

    info!("Source: {} (ID: {})", source.name, source.id);
    info!("Target: {} (ID: {})", target.name, target.id);
    Ok((source, target))
}

pub async fn run(data: &Data, mode: Mode) -> anyhow::Result<RunReport> {
    let (source, target) = resolve_guilds(data).await?;
    let mut report = RunReport::default();
    let mut tracker = PhaseTracker::new();

    if mode.messages() {
        let (mapping, channels) = migrate_messages(data, &source, &target, &mut tracker).await?;
        report.mapping = mapping;
        report.channels = channels;
    }

    if mode.assets() {
        if data.config.copy_emojis {
            report.emojis = Some(assets::copy_emojis(data, source.id, target.id).await);
        } else {
            info!("Emoji copying is disabled");
        }
        if data.config.copy_stickers {
            report.stickers = Some(assets::copy_stickers(data, source.id, target.id).await);
        } else {
            info!("Sticker copying is disabled");
        }
    }

    tracker.enter(RunPhase::Cleanup);
    info!("Cleaning up temporary files...");
    remove_staging_dir(&data.config.temp_dir).await;
    tracker.enter(RunPhase::Terminal);

    if mode.messages() {
        info!(
            "Migration complete: {} message(s) copied, {} failed across {} channel(s)",
            report.messages_copied(),
            report.messages_failed(),
            report.channels.len()
        );
    }
    Ok(report)
}

async fn migrate_messages(
    data: &Data,
    source: &GuildInfo,
    target: &GuildInfo,
    tracker: &mut PhaseTracker,
) -> anyhow::Result<(MappingReport, Vec<ChannelReport>)> {
    let source_channels = data
        .platform
        .text_channels(source.id)
        .await
        .context("Failed to list source channels")?;
    let target_channels = data
        .platform
        .text_channels(target.id)
        .await
        .context("Failed to list target channels")?;
    info!("Found {} text channels in source guild.", source_channels.len());

    tracker.enter(RunPhase::MappingChannels);
    let mapping = map_channels(
        data.platform.as_ref(),
        target.id,
        source_channels,
        target_channels,
        data.config.name_match,
        data.config.pacing.channel_create_delay,
    )
    .await;

    info!("Starting message migration...");
    let mut reports = Vec::with_capacity(mapping.entries.len());
    for MappedChannel { source, target } in &mapping.entries {
        let Some(target) = target else {
            info!("Skipping #{} (no target channel)", source.name);
            reports.push(ChannelReport::skipped(&source.name));
            continue;
        };
        reports.push(migrate_channel(data, source, target, tracker).await);
    }

    Ok((mapping.report, reports))
}

async fn migrate_channel(
    data: &Data,
    source: &ChannelInfo,
    target: &ChannelInfo,
    tracker: &mut PhaseTracker,
) -> ChannelReport {
    info!("Processing: #{} -> #{}", source.name, target.name);
    let mut report = ChannelReport {
        source: source.name.clone(),
        target: Some(target.name.clone()),
        ..Default::default()
    };

    tracker.enter(RunPhase::Fetching);
    info!("  Fetching messages...");
    let messages = fetch_all_messages(
        data.platform.as_ref(),
        source.id,
        data.config.page_size,
        data.config.pacing.page_delay,
    )
    .await;
    report.total = messages.len();
    info!("  Found {} message(s) to copy", messages.len());

    if messages.is_empty() {
        info!("  Channel empty, skipping");
        return report;
    }

    let policy = RetryPolicy::from_pacing(&data.config.pacing);
    for message in &messages {
        match relay_message(data, target.id, message, &policy, tracker).await {
            SendOutcome::Sent { message_id, .. } => {
                report.copied += 1;
                debug!("  Message {} relayed as {}", message.id, message_id);
                info!("  Copied message {}/{}", report.copied, messages.len());
            }
            SendOutcome::Failed { last_error, .. } => {
                report.failed += 1;
                error!("  Error copying message {}: {}", message.id, last_error);
            }
        }
        tokio::time::sleep(data.config.pacing.send_delay).await;
    }

    info!(
        "  Channel complete: {} copied, {} failed",
        report.copied, report.failed
    );
    report
}

/// Re-sends one message. Staged attachments are removed when `staged` goes
/// out of scope, after the last send attempt.
async fn relay_message(
    data: &Data,
    target_channel_id: u64,
    message: &SourceMessage,
    policy: &RetryPolicy,
    tracker: &mut PhaseTracker,
) -> SendOutcome {
    tracker.enter(RunPhase::Transforming);
    let content = format_message(message, &data.config.format);
    let staged = stage_attachments(
        data.downloader.as_ref(),
        &message.attachments,
        &data.config.temp_dir,
        data.config.pacing.attachment_delay,
    )
    .await;

    tracker.enter(RunPhase::Sending);
    deliver(
        data.platform.as_ref(),
        target_channel_id,
        &content,
        &staged.outgoing(),
        policy,
    )
    .await
}

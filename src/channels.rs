use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::model::{ChannelInfo, NewChannel};
use crate::platform::ChatPlatform;
use crate::report::MappingReport;

/// How a source name is matched against names already in the target guild.
///
/// Names are not unique keys: two source channels with the same name both map
/// onto the first pre-existing target of that name, and a renamed channel is
/// treated as new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    #[default]
    Exact,
    IgnoreCase,
}

impl NameMatch {
    pub fn matches(&self, source: &str, target: &str) -> bool {
        match self {
            NameMatch::Exact => source == target,
            NameMatch::IgnoreCase => source.to_lowercase() == target.to_lowercase(),
        }
    }
}

impl FromStr for NameMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(NameMatch::Exact),
            "ignore-case" | "ignore_case" | "case-insensitive" => Ok(NameMatch::IgnoreCase),
            other => Err(format!("unknown name match policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedChannel {
    pub source: ChannelInfo,
    /// `None` when no target existed and creating one failed
    pub target: Option<ChannelInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelMapping {
    pub entries: Vec<MappedChannel>,
    pub report: MappingReport,
}

/// Sorts channels the way the guild sidebar shows them.
pub fn sidebar_order(channels: &mut [ChannelInfo]) {
    channels.sort_by_key(|channel| (channel.position, channel.id));
}

/// Pairs every source channel with a target channel, creating missing ones.
///
/// Matching runs against the target list as it was before the run; a channel
/// created here is never reused for a later source.
pub async fn map_channels(
    platform: &dyn ChatPlatform,
    target_guild_id: u64,
    mut sources: Vec<ChannelInfo>,
    targets: Vec<ChannelInfo>,
    policy: NameMatch,
    create_delay: Duration,
) -> ChannelMapping {
    sidebar_order(&mut sources);
    let mut mapping = ChannelMapping::default();

    info!("Mapping channels...");
    for source in sources {
        let existing = targets
            .iter()
            .find(|target| policy.matches(&source.name, &target.name))
            .cloned();

        let target = match existing {
            Some(target) => {
                mapping.report.matched += 1;
                Some(target)
            }
            None => {
                info!("  Creating channel: #{}", source.name);
                let created = platform
                    .create_text_channel(target_guild_id, &NewChannel::from(&source))
                    .await;
                tokio::time::sleep(create_delay).await;
                match created {
                    Ok(channel) => {
                        mapping.report.created += 1;
                        Some(channel)
                    }
                    Err(e) => {
                        mapping.report.failed += 1;
                        warn!("  Failed to create channel {}: {}", source.name, e);
                        None
                    }
                }
            }
        };

        if target.is_some() {
            info!("  Mapped #{}", source.name);
        }
        mapping.entries.push(MappedChannel { source, target });
    }

    mapping
}

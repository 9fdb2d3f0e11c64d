//! Tallies returned by each phase of a run and summed by the caller.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub source: String,
    pub target: Option<String>,
    pub total: usize,
    pub copied: usize,
    pub failed: usize,
}

impl ChannelReport {
    pub fn skipped(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingReport {
    pub matched: usize,
    pub created: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub mapping: MappingReport,
    pub channels: Vec<ChannelReport>,
    pub emojis: Option<CopyReport>,
    pub stickers: Option<CopyReport>,
}

impl RunReport {
    pub fn messages_copied(&self) -> usize {
        self.channels.iter().map(|c| c.copied).sum()
    }

    pub fn messages_failed(&self) -> usize {
        self.channels.iter().map(|c| c.failed).sum()
    }
}

use std::time::Duration;
use tracing::{error, warn};

use crate::config::{Pacing, DISCORD_MESSAGE_LIMIT};
use crate::format::split_content;
use crate::platform::{ChatPlatform, OutgoingFile};

/// Attempts per outgoing payload. A message split into `n` chunks may take up
/// to `n * MAX_SEND_ATTEMPTS` sends in total.
pub const MAX_SEND_ATTEMPTS: usize = 5;

/// Flat retry: the same delay between every attempt, no growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
    /// Used instead of `delay` when the failure looks like a rate limit
    pub rate_limit_pause: Duration,
}

impl RetryPolicy {
    pub fn from_pacing(pacing: &Pacing) -> Self {
        Self {
            attempts: MAX_SEND_ATTEMPTS,
            delay: pacing.retry_delay,
            rate_limit_pause: pacing.rate_limit_pause,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { message_id: u64, attempts: usize },
    Failed { attempts: usize, last_error: String },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }
}

pub async fn send_with_retry(
    platform: &dyn ChatPlatform,
    channel_id: u64,
    content: &str,
    files: &[OutgoingFile],
    policy: &RetryPolicy,
) -> SendOutcome {
    let attempts = policy.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match platform.send_message(channel_id, content, files).await {
            Ok(message_id) => {
                return SendOutcome::Sent {
                    message_id,
                    attempts: attempt,
                }
            }
            Err(e) => {
                warn!("  Send failed (attempt {}/{}): {}", attempt, attempts, e);
                let pause = if e.is_rate_limited() {
                    warn!("  Rate limited, pausing for {:?}", policy.rate_limit_pause);
                    policy.rate_limit_pause
                } else {
                    policy.delay
                };
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }

    error!("  Failed to send message after {} attempts", attempts);
    SendOutcome::Failed {
        attempts,
        last_error,
    }
}

/// Sends a rendered message, splitting text past the platform limit.
/// Files go out with the final chunk; a failed chunk fails the whole message.
pub async fn deliver(
    platform: &dyn ChatPlatform,
    channel_id: u64,
    content: &str,
    files: &[OutgoingFile],
    policy: &RetryPolicy,
) -> SendOutcome {
    let chunks = split_content(content, DISCORD_MESSAGE_LIMIT);
    let last = chunks.len() - 1;
    let mut outcome = SendOutcome::Failed {
        attempts: 0,
        last_error: "nothing to send".to_string(),
    };

    for (idx, chunk) in chunks.iter().enumerate() {
        let chunk_files: &[OutgoingFile] = if idx == last { files } else { &[] };
        outcome = send_with_retry(platform, channel_id, chunk, chunk_files, policy).await;
        if !outcome.is_sent() {
            if idx > 0 {
                warn!(
                    "  Partial delivery: {}/{} chunk(s) already sent to channel {}",
                    idx,
                    chunks.len(),
                    channel_id
                );
            }
            break;
        }
    }
    outcome
}

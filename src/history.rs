use std::time::Duration;
use tracing::{debug, warn};

use crate::model::SourceMessage;
use crate::platform::ChatPlatform;

/// Fetches the full history of a channel, oldest first.
///
/// Pages arrive newest-first and are walked backwards with a `before` cursor.
/// A failed page request ends the walk: whatever was fetched so far is
/// returned, so a flaky channel yields a truncated (never reordered) history.
pub async fn fetch_all_messages(
    platform: &dyn ChatPlatform,
    channel_id: u64,
    page_size: u8,
    page_delay: Duration,
) -> Vec<SourceMessage> {
    let page_size = page_size.max(1);
    let mut all: Vec<SourceMessage> = Vec::new();
    let mut before: Option<u64> = None;

    loop {
        let page = match platform
            .messages_before(channel_id, before, page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    "History fetch for channel {} stopped after {} message(s): {}",
                    channel_id,
                    all.len(),
                    e
                );
                break;
            }
        };

        let Some(last) = page.last() else {
            break;
        };
        before = Some(last.id);
        let full_page = page.len() >= usize::from(page_size);
        all.extend(page);

        if !full_page {
            break;
        }
        debug!("Channel {}: {} message(s) so far", channel_id, all.len());
        tokio::time::sleep(page_delay).await;
    }

    all.reverse();
    all
}

use std::collections::HashSet;

use digest_datastore::Channel;

use crate::{relevance::RelevanceFilter, yt::ChannelSource};

/// Runs every query against `source` and merges the relevant candidates.
///
/// Channels are keyed by id; the first relevant occurrence wins and discovery
/// order is preserved. All queries are drained before the result is cut down
/// to `max_channels`. A failing query contributes nothing.
#[tracing::instrument(skip(source, filter))]
pub async fn discover_channels<C>(
    source: &C,
    filter: &RelevanceFilter,
    queries: &[String],
    max_channels: usize,
) -> Vec<Channel>
where
    C: ChannelSource + Sync,
{
    let mut seen = HashSet::new();
    let mut channels = Vec::new();

    for query in queries {
        tracing::info!(%query, "Searching for channels");

        let candidates = match source.search_channels(query, max_channels).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(error = ?e, %query, "Channel search failed");
                continue;
            }
        };

        for mut channel in candidates {
            if seen.contains(&channel.id) {
                continue;
            }

            let score = filter.score(&channel);
            if score < filter.threshold() {
                tracing::debug!(channel_id = %channel.id, score, "Channel below relevance threshold");
                continue;
            }

            channel.relevance_score = score;
            tracing::info!(
                channel_id = %channel.id,
                title = %channel.title,
                score,
                "Found relevant channel"
            );
            seen.insert(channel.id.clone());
            channels.push(channel);
        }
    }

    tracing::info!(count = channels.len(), "Discovery finished");
    channels.truncate(max_channels);
    channels
}

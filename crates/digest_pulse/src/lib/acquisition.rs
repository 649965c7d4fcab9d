use std::path::Path;

use digest_datastore::{sanitize_filename, Channel, Video};
use futures::{future, stream, StreamExt};

use crate::yt::{ChannelSource, MediaDownloader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    Download,
    /// Reuse media from an earlier run, dropping videos that have none
    ExistingOnly,
}

/// Lists up to `videos_per_channel` recent videos of `channel` and acquires
/// each one into `<download_dir>/<channel title>`.
///
/// A video that fails to acquire is logged and left out; its siblings are
/// unaffected and the listing order is kept. At most `concurrency` downloads
/// are in flight at once.
#[tracing::instrument(skip_all, fields(channel_id = %channel.id))]
pub async fn acquire_channel_videos<C, A>(
    source: &C,
    downloader: &A,
    channel: &Channel,
    videos_per_channel: usize,
    download_dir: &Path,
    mode: AcquireMode,
    concurrency: usize,
) -> Vec<Video>
where
    C: ChannelSource + Sync,
    A: MediaDownloader + Sync,
{
    let videos = match source.list_recent(&channel.id, videos_per_channel).await {
        Ok(videos) => videos,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to list recent videos");
            return Vec::new();
        }
    };

    if videos.is_empty() {
        tracing::warn!(title = %channel.title, "No videos found for channel");
        return Vec::new();
    }
    tracing::info!(count = videos.len(), "Found videos for channel");

    let channel_dir = download_dir.join(sanitize_filename(&channel.title));
    let channel_dir = channel_dir.as_path();

    let acquired = stream::iter(videos.into_iter().take(videos_per_channel))
        .map(|video| acquire_one(downloader, video, channel_dir, mode))
        .buffered(concurrency.max(1))
        .filter_map(future::ready)
        .collect::<Vec<_>>()
        .await;

    tracing::info!(count = acquired.len(), "Acquired videos for channel");
    acquired
}

async fn acquire_one<A>(
    downloader: &A,
    mut video: Video,
    channel_dir: &Path,
    mode: AcquireMode,
) -> Option<Video>
where
    A: MediaDownloader + Sync,
{
    let local_path = match mode {
        AcquireMode::Download => downloader
            .acquire(&video, channel_dir)
            .await
            .inspect_err(|e| {
                tracing::error!(error = ?e, video_id = %video.id, "Failed to acquire video")
            })
            .ok(),
        AcquireMode::ExistingOnly => {
            let existing = downloader.locate(&video, channel_dir);
            if existing.is_none() {
                tracing::warn!(video_id = %video.id, "No previously downloaded media");
            }
            existing
        }
    }?;

    tracing::info!(video_id = %video.id, path = ?local_path, "Acquired video");
    video.local_path = Some(local_path);
    Some(video)
}

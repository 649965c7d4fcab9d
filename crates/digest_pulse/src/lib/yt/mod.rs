pub mod api;
pub mod downloader;

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use digest_datastore::{Channel, Video};

/// Platform-side search and metadata lookups
pub trait ChannelSource {
    /// Up to `max_results` candidate channels for a free-text query
    fn search_channels(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<Channel>>> + Send;

    fn fetch_channel(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Channel>>> + Send;

    /// Most recent uploads of a channel, already restricted to the configured
    /// duration window
    fn list_recent(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<Video>>> + Send;
}

/// Fetches a video's media payload to local storage
pub trait MediaDownloader {
    fn acquire(
        &self,
        video: &Video,
        download_dir: &Path,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;

    /// Path of a previously acquired payload, if there is one
    fn locate(&self, video: &Video, download_dir: &Path) -> Option<PathBuf>;
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use digest_datastore::Video;

use crate::yt::MediaDownloader;

/// Extracts audio of a video with an external `yt-dlp` binary
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    binary: PathBuf,
    cookies_path: Option<PathBuf>,
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlpDownloader {
    pub const AUDIO_FORMAT: &'static str = "mp3";

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cookies_path: None,
        }
    }

    pub fn with_cookies(mut self, cookies_path: Option<PathBuf>) -> Self {
        self.cookies_path = cookies_path;
        self
    }

    /// Where the audio of `video` lands inside `download_dir`
    pub fn media_path(video: &Video, download_dir: &Path) -> PathBuf {
        download_dir.join(format!("{}.{}", video.id, Self::AUDIO_FORMAT))
    }
}

impl MediaDownloader for YtDlpDownloader {
    #[tracing::instrument(skip(self, video), fields(video_id = %video.id))]
    async fn acquire(&self, video: &Video, download_dir: &Path) -> anyhow::Result<PathBuf> {
        let target = Self::media_path(video, download_dir);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            tracing::info!(path = ?target, "Media already downloaded");
            return Ok(target);
        }

        tokio::fs::create_dir_all(download_dir)
            .await
            .with_context(|| format!("Failed to create {}", download_dir.display()))?;

        let output_template = download_dir.join(format!("{}.%(ext)s", video.id));
        let mut command = tokio::process::Command::new(&self.binary);
        command
            .args(["--no-playlist", "--quiet", "-x", "--audio-format", Self::AUDIO_FORMAT])
            .arg("-o")
            .arg(&output_template);
        if let Some(cookies) = &self.cookies_path {
            command.arg("--cookies").arg(cookies);
        }
        command.arg(&video.url);

        tracing::info!(url = %video.url, "Downloading audio");
        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp exited with {}: {}", output.status, stderr.trim());
        }

        if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
            anyhow::bail!("yt-dlp finished but {} is missing", target.display());
        }

        Ok(target)
    }

    fn locate(&self, video: &Video, download_dir: &Path) -> Option<PathBuf> {
        let path = Self::media_path(video, download_dir);
        path.is_file().then_some(path)
    }
}

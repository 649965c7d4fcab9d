use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    datastore::{record_file_name, sanitize_filename, DataStore},
    RenderedReport, ReportPaths, Video,
};

/// Plain-file store: one subdirectory per channel for transcripts and
/// summaries, flat timestamped files for reports.
#[derive(Debug, Clone)]
pub struct FsDataStore {
    pub transcript_dir: PathBuf,
    pub summary_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl FsDataStore {
    pub fn new(
        transcript_dir: impl Into<PathBuf>,
        summary_dir: impl Into<PathBuf>,
        report_dir: impl Into<PathBuf>,
    ) -> Self {
        FsDataStore {
            transcript_dir: transcript_dir.into(),
            summary_dir: summary_dir.into(),
            report_dir: report_dir.into(),
        }
    }

    /// Store rooted at `root` using the default directory names
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(
            root.join("transcripts"),
            root.join("summaries"),
            root.join("reports"),
        )
    }

    async fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        tokio::fs::write(path, contents)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?path, "Failed to write file"))
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn channel_dir(base: &Path, video: &Video) -> PathBuf {
        base.join(sanitize_filename(&video.channel_title))
    }
}

impl DataStore for FsDataStore {
    async fn save_transcript(&self, video: &Video, text: &str) -> anyhow::Result<PathBuf> {
        let path = Self::channel_dir(&self.transcript_dir, video)
            .join(record_file_name(video, "transcript"));

        Self::write(&path, text).await?;
        tracing::info!(video_id = %video.id, path = ?path, "Saved transcript");

        Ok(path)
    }

    async fn save_summary(&self, video: &Video, summary: &str) -> anyhow::Result<PathBuf> {
        let path =
            Self::channel_dir(&self.summary_dir, video).join(record_file_name(video, "summary"));

        let contents = format!(
            "Title: {}\nChannel: {}\nURL: {}\nPublished: {}\nDuration: {}\nViews: {}\n\nSummary:\n{}",
            video.title,
            video.channel_title,
            video.url,
            video.published_at.to_rfc3339(),
            video.duration_display(),
            video.view_count_display(),
            summary,
        );

        Self::write(&path, &contents).await?;
        tracing::info!(video_id = %video.id, path = ?path, "Saved summary");

        Ok(path)
    }

    async fn save_report(&self, report: &RenderedReport) -> anyhow::Result<ReportPaths> {
        let base_name = report.base_name();
        let paths = ReportPaths {
            html: self.report_dir.join(format!("{base_name}.html")),
            text: self.report_dir.join(format!("{base_name}.txt")),
            json: self.report_dir.join(format!("{base_name}.json")),
        };

        Self::write(&paths.html, &report.html).await?;
        Self::write(&paths.text, &report.text).await?;
        Self::write(&paths.json, &report.json).await?;
        tracing::info!(paths = ?paths, "Saved report");

        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "digest-datastore-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn video() -> Video {
        Video {
            id: "vid123".into(),
            title: "BTC: what next?".into(),
            channel_id: "chan1".into(),
            channel_title: "Crypto/Daily".into(),
            published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            duration_secs: 754,
            view_count: Some(1200),
            url: "https://www.youtube.com/watch?v=vid123".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_transcript_lands_in_sanitized_channel_dir() {
        let root = temp_root("transcript");
        let store = FsDataStore::in_dir(&root);

        let path = store
            .save_transcript(&video(), "hello world")
            .await
            .expect("Failed to save transcript");

        assert_eq!(
            path,
            root.join("transcripts")
                .join("Crypto_Daily")
                .join("BTC_ what next__vid123_transcript.txt")
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_dot_channel_title_stays_inside_store() {
        let root = temp_root("dotdot");
        let store = FsDataStore::in_dir(&root);
        let video = Video {
            id: "v1".into(),
            title: "t".into(),
            channel_title: "..".into(),
            ..Default::default()
        };

        let transcript = store
            .save_transcript(&video, "text")
            .await
            .expect("Failed to save transcript");
        let summary = store
            .save_summary(&video, "summary")
            .await
            .expect("Failed to save summary");

        assert_eq!(
            transcript,
            root.join("transcripts").join("_").join("t_v1_transcript.txt")
        );
        assert!(summary.starts_with(root.join("summaries").join("_")));

        let empty = Video {
            channel_title: String::new(),
            ..video
        };
        let path = store.save_transcript(&empty, "text").await.unwrap();
        assert_eq!(path.parent(), Some(root.join("transcripts").join("_").as_path()));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_summary_file_contains_metadata() {
        let root = temp_root("summary");
        let store = FsDataStore::in_dir(&root);

        let path = store
            .save_summary(&video(), "Prices went up.")
            .await
            .expect("Failed to save summary");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Title: BTC: what next?\nChannel: Crypto/Daily\n"));
        assert!(contents.contains("Duration: 12:34\n"));
        assert!(contents.contains("Views: 1200\n"));
        assert!(contents.ends_with("Summary:\nPrices went up."));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_report_written_in_all_formats() {
        let root = temp_root("report");
        let store = FsDataStore::in_dir(&root);

        let report = RenderedReport {
            title: "Digest".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            html: "<html></html>".into(),
            text: "Digest".into(),
            json: "[]".into(),
        };

        let paths = store.save_report(&report).await.expect("Failed to save report");

        assert_eq!(
            paths.html,
            root.join("reports").join("digest_report_2024-05-01_08-30-00.html")
        );
        assert_eq!(std::fs::read_to_string(&paths.json).unwrap(), "[]");
        assert!(paths.text.exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}

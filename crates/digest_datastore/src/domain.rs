use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content source discovered through a search query.
///
/// `relevance_score` is filled in by the relevance filter at discovery time;
/// the rest comes straight from the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub relevance_score: f64,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub view_count: Option<u64>,
}

/// One video of a channel, enriched in place as it moves through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub url: String,
    /// Set once the media payload has been acquired
    pub local_path: Option<PathBuf>,
    pub transcript_path: Option<PathBuf>,
    // serialized through SummaryRecord::summary
    #[serde(skip)]
    pub summary: Option<String>,
}

impl Video {
    /// Duration formatted as `H:MM:SS`, or `M:SS` for videos under an hour
    pub fn duration_display(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        let seconds = self.duration_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }

    pub fn view_count_display(&self) -> String {
        self.view_count
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRecord {
    pub video: Video,
    pub text: String,
    pub path: PathBuf,
}

/// The unit aggregated into the final report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(flatten)]
    pub video: Video,
    pub summary: String,
    pub path: PathBuf,
}

/// A report rendered in every format it is persisted or delivered in.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub html: String,
    pub text: String,
    pub json: String,
}

impl RenderedReport {
    /// Timestamped base name shared by all persisted formats
    pub fn base_name(&self) -> String {
        format!(
            "digest_report_{}",
            self.generated_at.format("%Y-%m-%d_%H-%M-%S")
        )
    }
}

/// Locations of a persisted report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub html: PathBuf,
    pub text: PathBuf,
    pub json: PathBuf,
}

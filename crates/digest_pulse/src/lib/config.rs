use std::path::PathBuf;

use crate::relevance::{DEFAULT_KEYWORDS, DEFAULT_RELEVANCE_THRESHOLD};

pub const DEFAULT_SEARCH_QUERIES: &[&str] = &[
    "crypto news",
    "cryptocurrency analysis",
    "bitcoin news",
    "ethereum news",
    "crypto market analysis",
];

/// Word bounds handed to the summarizer. Transcripts shorter than `min_words`
/// are passed through verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        SummaryBounds {
            min_words: 100,
            max_words: 300,
        }
    }
}

/// Knobs for a single batch run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub search_queries: Vec<String>,
    pub max_channels: usize,
    pub videos_per_channel: usize,
    pub keywords: Vec<String>,
    pub relevance_threshold: f64,
    pub summary_bounds: SummaryBounds,
    pub download_dir: PathBuf,
    /// Items of one channel processed at once; 1 keeps the run sequential
    pub concurrency: usize,
    /// Only use media already present in `download_dir`
    pub skip_download: bool,
    pub skip_email: bool,
    pub email_recipient: Option<String>,
    pub report_title: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            search_queries: DEFAULT_SEARCH_QUERIES.iter().map(|q| q.to_string()).collect(),
            max_channels: 10,
            videos_per_channel: 5,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            summary_bounds: SummaryBounds::default(),
            download_dir: PathBuf::from("downloads"),
            concurrency: 1,
            skip_download: false,
            skip_email: false,
            email_recipient: None,
            report_title: "YouTube Channel Digest".into(),
        }
    }
}

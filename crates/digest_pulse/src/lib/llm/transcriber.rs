use std::{future::Future, path::PathBuf};

use digest_datastore::Video;
use serde::Deserialize;

/// Why no transcript came back. None of these abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Transcripts are disabled for video {0}")]
    Disabled(String),
    #[error("No transcript found for video {0}")]
    NotFound(String),
    #[error("Could not retrieve transcript: {0}")]
    Transport(String),
}

pub trait Transcriber {
    const TRANSCRIBER_MODEL: &'static str;

    fn transcribe(
        &self,
        video: &Video,
    ) -> impl Future<Output = Result<String, TranscriptError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioInput {
    Chunked {
        chunk_duration_seconds: u16,
        chunks_dir_path: PathBuf,
        file_path: PathBuf,
    },
    File(PathBuf),
}

#[derive(Debug, Deserialize)]
pub struct TranscribeResponse {
    pub duration: f64,
    pub text: String,
    pub segments: Option<Vec<TranscribeSegment>>,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

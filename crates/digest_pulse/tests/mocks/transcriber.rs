use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use digest_datastore::Video;
use digest_pulse::{Transcriber, TranscriptError};

#[derive(Clone)]
pub struct MockTranscriber {
    pub response_text: String,
    pub texts: HashMap<String, String>,
    pub missing_ids: HashSet<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriber {
    pub fn new(response_text: &str) -> Self {
        Self {
            response_text: response_text.to_string(),
            texts: HashMap::new(),
            missing_ids: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new("")
        }
    }

    pub fn with_text(mut self, video_id: &str, text: &str) -> Self {
        self.texts.insert(video_id.to_string(), text.to_string());
        self
    }

    pub fn without_transcript(mut self, video_id: &str) -> Self {
        self.missing_ids.insert(video_id.to_string());
        self
    }
}

impl Transcriber for MockTranscriber {
    const TRANSCRIBER_MODEL: &'static str = "mock-whisper";

    async fn transcribe(&self, video: &Video) -> Result<String, TranscriptError> {
        self.calls.lock().unwrap().push(video.id.clone());
        if let Some(ref msg) = self.fail_with {
            return Err(TranscriptError::Transport(msg.clone()));
        }
        if self.missing_ids.contains(&video.id) {
            return Err(TranscriptError::NotFound(video.id.clone()));
        }
        Ok(self
            .texts
            .get(&video.id)
            .unwrap_or(&self.response_text)
            .clone())
    }
}

use std::path::{Path, PathBuf};

use digest_datastore::Video;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    AudioInput, Summarizer, SummaryResponse, TranscribeResponse, Transcriber, TranscriptError,
};

/// Whisper rejects uploads above 25 MB; stay a little below that
const MAX_UPLOAD_BYTES: u64 = 24 * 1024 * 1024;

pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    ffmpeg: PathBuf,
    chunk_duration_seconds: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
    #[error("Empty completion response")]
    EmptyCompletion,
}

impl OpenAIClient {
    const SYSTEM_PROMPT: &str = include_str!("./prompts/system_0.txt");

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
            ffmpeg: PathBuf::from("ffmpeg"),
            chunk_duration_seconds: 600,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_ffmpeg(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ffmpeg = binary.into();
        self
    }

    pub fn with_chunk_duration(mut self, seconds: u16) -> Self {
        self.chunk_duration_seconds = seconds.max(1);
        self
    }

    /// Uploads small enough for a single request go as-is, larger ones are
    /// split into chunks next to the source file
    fn audio_input(&self, file_path: &Path) -> Result<AudioInput, OpenAIError> {
        let size = std::fs::metadata(file_path)?.len();
        if size <= MAX_UPLOAD_BYTES {
            return Ok(AudioInput::File(file_path.to_path_buf()));
        }

        let stem = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| OpenAIError::Ffmpeg("Invalid file path".into()))?;
        let chunks_dir_path = file_path.with_file_name(format!("{stem}_chunks"));

        Ok(AudioInput::Chunked {
            chunk_duration_seconds: self.chunk_duration_seconds,
            chunks_dir_path,
            file_path: file_path.to_path_buf(),
        })
    }

    async fn split_audio_to_chunks(
        &self,
        file_path: &Path,
        chunk_duration_seconds: u16,
        output_pattern: &Path,
    ) -> Result<(), OpenAIError> {
        let output = tokio::process::Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(file_path)
            .args(["-f", "segment", "-segment_time"])
            .arg(chunk_duration_seconds.to_string())
            .args(["-c", "copy"])
            .arg(output_pattern)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OpenAIError::Ffmpeg(stderr.trim().to_string()));
        }
        Ok(())
    }

    pub async fn transcribe_input(
        &self,
        input: AudioInput,
    ) -> Result<TranscribeResponse, OpenAIError> {
        let (file_path, chunks_dir_path, chunk_duration_seconds) = match input {
            AudioInput::File(path) => {
                return self
                    .send_transcribe_request(&path, <Self as Transcriber>::TRANSCRIBER_MODEL, None)
                    .await;
            }
            AudioInput::Chunked {
                file_path,
                chunks_dir_path,
                chunk_duration_seconds,
            } => (file_path, chunks_dir_path, chunk_duration_seconds),
        };

        let chunks_exist = std::fs::read_dir(&chunks_dir_path)
            .map(|mut entries| entries.any(|e| e.is_ok()))
            .unwrap_or(false);

        // chunk via ffmpeg if not already done
        if !chunks_exist {
            tokio::fs::create_dir_all(&chunks_dir_path).await?;
            let base_name = file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| OpenAIError::Ffmpeg("Invalid file path".into()))?;

            tracing::info!("Splitting audio to chunks");
            let split = self
                .split_audio_to_chunks(
                    &file_path,
                    chunk_duration_seconds,
                    &chunks_dir_path.join(format!("{base_name}_%03d.mp3")),
                )
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Failed to split audio to chunks"));

            if let Err(e) = split {
                // partial chunks would be reused as a complete split
                let _ = tokio::fs::remove_dir_all(&chunks_dir_path).await;
                return Err(e);
            }
        }

        let mut chunks: Vec<PathBuf> = std::fs::read_dir(&chunks_dir_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        chunks.sort();

        let mut all_segments = Vec::new();
        let mut all_text = String::new();
        let mut time_offset = 0.0_f64;
        let mut duration = 0.0_f64;
        let mut previous_text = None;

        for chunk in &chunks {
            let response = self
                .send_transcribe_request(
                    chunk,
                    <Self as Transcriber>::TRANSCRIBER_MODEL,
                    previous_text,
                )
                .await
                .inspect_err(|e| tracing::error!(error = %e, chunk = ?chunk, "Failed to transcribe chunk"))?;

            duration += response.duration;

            if let Some(segments) = response.segments {
                all_segments.extend(segments.into_iter().map(|mut seg| {
                    seg.start += time_offset;
                    seg.end += time_offset;
                    seg
                }));
            }

            all_text.push_str(&response.text);
            all_text.push(' ');
            previous_text = Some(response.text);
            time_offset += chunk_duration_seconds as f64;
        }

        Ok(TranscribeResponse {
            duration,
            text: all_text.trim().to_string(),
            segments: Some(all_segments),
        })
    }

    pub async fn send_transcribe_request(
        &self,
        file: &Path,
        model_name: &str,
        prompt: Option<String>,
    ) -> Result<TranscribeResponse, OpenAIError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".into());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        let mut form = reqwest::multipart::Form::new()
            .text("model", model_name.to_string())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", part);

        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt);
        }

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<TranscribeResponse>().await?)
    }

    pub async fn send_completion_request(
        &self,
        model_name: &str,
        user_content: String,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = serde_json::json!({
            "model": model_name,
            "messages": [
                {
                    "role": "system",
                    "content": Self::SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": user_content
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

/// Builds the user message the system prompt expects
fn summary_request(content: &str, min_words: usize, max_words: usize, word_budget: usize) -> String {
    let mut words = content.split_whitespace();
    let transcript = words.by_ref().take(word_budget).collect::<Vec<_>>().join(" ");
    if words.next().is_some() {
        tracing::warn!(word_budget, "Transcript exceeds context window, truncating");
    }

    format!("LENGTH: {min_words}-{max_words} words\n\n{transcript}")
}

impl Transcriber for OpenAIClient {
    const TRANSCRIBER_MODEL: &'static str = "whisper-1";

    #[tracing::instrument(skip(self, video), fields(video_id = %video.id))]
    async fn transcribe(&self, video: &Video) -> Result<String, TranscriptError> {
        let Some(path) = video.local_path.as_deref().filter(|p| p.exists()) else {
            return Err(TranscriptError::NotFound(video.id.clone()));
        };

        let input = self
            .audio_input(path)
            .map_err(|e| TranscriptError::Transport(e.to_string()))?;

        let response = self
            .transcribe_input(input)
            .await
            .map_err(|e| TranscriptError::Transport(e.to_string()))?;

        tracing::info!(duration = response.duration, "Transcribed audio");
        Ok(response.text)
    }
}

impl Summarizer for OpenAIClient {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o-mini";

    type Error = OpenAIError;

    async fn summarize(
        &self,
        content: &str,
        min_words: usize,
        max_words: usize,
    ) -> Result<SummaryResponse, Self::Error> {
        // roughly four tokens per three words
        let word_budget = Self::CONTEXT_WINDOW_LIMIT * 3 / 4;
        let request = summary_request(content, min_words, max_words, word_budget);

        let response = self
            .send_completion_request(Self::SUMMARIZER_MODEL, request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        let summary = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(OpenAIError::EmptyCompletion)?;

        Ok(SummaryResponse { summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_request_header() {
        let request = summary_request("one two three", 100, 300, 1000);
        assert_eq!(request, "LENGTH: 100-300 words\n\none two three");
    }

    #[test]
    fn test_summary_request_truncates_to_budget() {
        let request = summary_request("a b c d e", 1, 2, 3);
        assert!(request.ends_with("\n\na b c"));
    }

    #[tokio::test]
    async fn test_missing_media_is_not_found() {
        let client = OpenAIClient::new("key");
        let video = Video {
            id: "vid1".into(),
            local_path: Some(PathBuf::from("/definitely/not/here.mp3")),
            ..Default::default()
        };

        let err = client.transcribe(&video).await.unwrap_err();
        assert!(matches!(err, TranscriptError::NotFound(id) if id == "vid1"));
    }

    #[tokio::test]
    async fn test_failed_split_removes_chunks_dir() {
        let dir = std::env::temp_dir().join(format!("digest-pulse-split-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join("long.mp3");
        std::fs::write(&file_path, b"not really audio").unwrap();
        let chunks_dir_path = dir.join("long_chunks");

        let client = OpenAIClient::new("key").with_ffmpeg("/nonexistent/ffmpeg");
        let result = client
            .transcribe_input(AudioInput::Chunked {
                chunk_duration_seconds: 60,
                chunks_dir_path: chunks_dir_path.clone(),
                file_path,
            })
            .await;

        assert!(result.is_err());
        assert!(!chunks_dir_path.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

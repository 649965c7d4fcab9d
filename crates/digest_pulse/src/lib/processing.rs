use digest_datastore::{DataStore, SummaryRecord, TranscriptRecord, Video};

use crate::{
    config::SummaryBounds,
    llm::transcriber::TranscriptError,
    Summarizer, Transcriber,
};

/// Summary text recorded when the summarizer fails
pub const SUMMARY_FAILURE_MARKER: &str = "Error generating summary.";

/// Summarizes `text` within `bounds`.
///
/// Text shorter than `bounds.min_words` comes back verbatim. A summarizer
/// failure yields [`SUMMARY_FAILURE_MARKER`] instead of an error.
#[tracing::instrument(skip_all, fields(words = tracing::field::Empty))]
pub async fn summarize_text<S>(summarizer: &S, text: &str, bounds: SummaryBounds) -> String
where
    S: Summarizer + Sync,
{
    let words = text.split_whitespace().count();
    tracing::Span::current().record("words", words as u64);

    if words < bounds.min_words {
        tracing::warn!(min_words = bounds.min_words, "Text is too short to summarize");
        return text.to_string();
    }

    match summarizer
        .summarize(text, bounds.min_words, bounds.max_words)
        .await
    {
        Ok(response) => {
            tracing::info!(
                summary_words = response.summary.split_whitespace().count(),
                "Generated summary"
            );
            response.summary
        }
        Err(e) => {
            tracing::error!(error = ?e, "Failed to generate summary");
            SUMMARY_FAILURE_MARKER.to_string()
        }
    }
}

/// Extracts a transcript for an acquired video and persists it.
///
/// Every failure mode is logged and collapses to `None`.
#[tracing::instrument(skip_all, fields(video_id = %video.id))]
pub async fn extract_transcript<T, D>(
    transcriber: &T,
    store: &D,
    mut video: Video,
) -> Option<TranscriptRecord>
where
    T: Transcriber + Sync,
    D: DataStore + Sync,
{
    let text = match transcriber.transcribe(&video).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("Transcript is empty");
            return None;
        }
        Err(e @ (TranscriptError::Disabled(_) | TranscriptError::NotFound(_))) => {
            tracing::warn!(error = %e, "No transcript available");
            return None;
        }
        Err(e @ TranscriptError::Transport(_)) => {
            tracing::error!(error = %e, "Failed to extract transcript");
            return None;
        }
    };

    let path = store
        .save_transcript(&video, &text)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to save transcript"))
        .ok()?;

    video.transcript_path = Some(path.clone());
    Some(TranscriptRecord { video, text, path })
}

/// Runs one acquired video through extraction, persistence, summarization
/// and persistence again. Each stage stops the video on an empty or failed
/// result without surfacing an error.
#[tracing::instrument(skip_all, fields(video_id = %video.id, title = %video.title))]
pub async fn process_video<T, S, D>(
    transcriber: &T,
    summarizer: &S,
    store: &D,
    video: Video,
    bounds: SummaryBounds,
) -> Option<SummaryRecord>
where
    T: Transcriber + Sync,
    S: Summarizer + Sync,
    D: DataStore + Sync,
{
    let TranscriptRecord {
        mut video, text, ..
    } = extract_transcript(transcriber, store, video).await?;

    let summary = summarize_text(summarizer, &text, bounds).await;

    let path = store
        .save_summary(&video, &summary)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to save summary"))
        .ok()?;

    tracing::info!(path = ?path, "Processed video");
    video.summary = Some(summary.clone());
    Some(SummaryRecord {
        video,
        summary,
        path,
    })
}

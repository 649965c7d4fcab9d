mod acquisition;
pub mod config;
pub mod delivery;
mod discovery;
pub mod error;
mod llm;
mod processing;
mod processor;
pub mod relevance;
mod report;
pub mod scheduler;
pub mod tracing;
pub mod yt;

pub use acquisition::{acquire_channel_videos, AcquireMode};
pub use config::{PipelineConfig, SummaryBounds};
pub use delivery::{HttpMailer, MailerError, ReportMailer};
pub use discovery::discover_channels;
pub use llm::openai;
pub use llm::{
    summarizer::{Summarizer, SummaryResponse},
    transcriber::{AudioInput, TranscribeResponse, TranscribeSegment, Transcriber, TranscriptError},
};
pub use processing::{extract_transcript, process_video, summarize_text, SUMMARY_FAILURE_MARKER};
pub use processor::{builder::DigestProcessorBuilder, BatchOutcome, BatchReport, DigestProcessor};
pub use relevance::RelevanceFilter;
pub use report::render_report;
pub use scheduler::{BatchJob, Cadence, LastRun, ScheduleStatus, Scheduler};

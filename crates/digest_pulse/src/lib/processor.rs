pub mod builder;

use std::{any::Any, fmt, panic::AssertUnwindSafe};

use chrono::Utc;
use digest_datastore::{Channel, DataStore, ReportPaths, SummaryRecord};
use futures::{future, stream, FutureExt, StreamExt};

use crate::{
    acquisition::{acquire_channel_videos, AcquireMode},
    config::PipelineConfig,
    delivery::ReportMailer,
    discovery::discover_channels,
    processing::process_video,
    relevance::RelevanceFilter,
    report::render_report,
    scheduler::BatchJob,
    yt::{ChannelSource, MediaDownloader},
    Summarizer, Transcriber,
};

/// Terminal state of one batch run
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Succeeded,
    NoChannels,
    NoVideos,
    NoSummaries,
    DeliveryFailed { reason: String },
    Failed { reason: String },
}

impl BatchOutcome {
    /// Whether the run should be reported as a failure to the caller
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            BatchOutcome::DeliveryFailed { .. } | BatchOutcome::Failed { .. }
        )
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Succeeded => write!(f, "succeeded"),
            BatchOutcome::NoChannels => write!(f, "no_channels"),
            BatchOutcome::NoVideos => write!(f, "no_videos"),
            BatchOutcome::NoSummaries => write!(f, "no_summaries"),
            BatchOutcome::DeliveryFailed { reason } => write!(f, "delivery_failed: {reason}"),
            BatchOutcome::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Everything a batch run produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub channels: Vec<Channel>,
    pub videos_acquired: usize,
    pub summaries: Vec<SummaryRecord>,
    pub report_paths: Option<ReportPaths>,
}

impl BatchReport {
    fn with_outcome(outcome: BatchOutcome) -> Self {
        BatchReport {
            outcome,
            channels: Vec::new(),
            videos_acquired: 0,
            summaries: Vec::new(),
            report_paths: None,
        }
    }
}

// Discover -> acquire per channel -> process per video -> aggregate -> deliver
pub struct DigestProcessor<P, A, T, S, D, M>
where
    P: ChannelSource + Send + Sync + 'static,
    A: MediaDownloader + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
    M: ReportMailer + Send + Sync + 'static,
{
    channel_source: P,
    downloader: A,
    transcriber: T,
    summarizer: S,
    store: D,
    mailer: M,
    filter: RelevanceFilter,
    config: PipelineConfig,
}

impl<P, A, T, S, D, M> DigestProcessor<P, A, T, S, D, M>
where
    P: ChannelSource + Send + Sync + 'static,
    A: MediaDownloader + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
    M: ReportMailer + Send + Sync + 'static,
{
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Executes one batch run.
    ///
    /// Never fails: errors and panics escaping the stages are logged and
    /// turned into [`BatchOutcome::Failed`] so a scheduler can run again.
    pub async fn run(&self) -> BatchReport {
        match AssertUnwindSafe(self.run_batch()).catch_unwind().await {
            Ok(Ok(report)) => {
                tracing::info!(
                    outcome = %report.outcome,
                    channels = report.channels.len(),
                    videos = report.videos_acquired,
                    summaries = report.summaries.len(),
                    "Batch run finished"
                );
                report
            }
            Ok(Err(e)) => {
                tracing::error!(error = ?e, "Batch run failed");
                BatchReport::with_outcome(BatchOutcome::Failed {
                    reason: format!("{e:#}"),
                })
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(%reason, "Batch run panicked");
                BatchReport::with_outcome(BatchOutcome::Failed { reason })
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn run_batch(&self) -> anyhow::Result<BatchReport> {
        let config = &self.config;

        let channels = discover_channels(
            &self.channel_source,
            &self.filter,
            &config.search_queries,
            config.max_channels,
        )
        .await;

        if channels.is_empty() {
            tracing::warn!("No relevant channels found");
            return Ok(BatchReport::with_outcome(BatchOutcome::NoChannels));
        }

        let mode = if config.skip_download {
            AcquireMode::ExistingOnly
        } else {
            AcquireMode::Download
        };

        let mut videos_acquired = 0;
        let mut summaries = Vec::new();

        for channel in &channels {
            tracing::info!(channel_id = %channel.id, title = %channel.title, "Processing channel");

            let videos = acquire_channel_videos(
                &self.channel_source,
                &self.downloader,
                channel,
                config.videos_per_channel,
                &config.download_dir,
                mode,
                config.concurrency,
            )
            .await;

            if videos.is_empty() {
                tracing::warn!(channel_id = %channel.id, "No videos to process for channel");
                continue;
            }
            videos_acquired += videos.len();

            let channel_summaries = stream::iter(videos)
                .map(|video| {
                    process_video(
                        &self.transcriber,
                        &self.summarizer,
                        &self.store,
                        video,
                        config.summary_bounds,
                    )
                })
                .buffered(config.concurrency.max(1))
                .filter_map(future::ready)
                .collect::<Vec<_>>()
                .await;

            if channel_summaries.is_empty() {
                tracing::warn!(channel_id = %channel.id, "No summaries generated for channel");
            } else {
                tracing::info!(
                    channel_id = %channel.id,
                    count = channel_summaries.len(),
                    "Added summaries for channel"
                );
            }
            summaries.extend(channel_summaries);
        }

        let mut report = BatchReport {
            outcome: BatchOutcome::Succeeded,
            channels,
            videos_acquired,
            summaries,
            report_paths: None,
        };

        if videos_acquired == 0 {
            tracing::warn!("No videos acquired for any channel");
            report.outcome = BatchOutcome::NoVideos;
            return Ok(report);
        }

        if report.summaries.is_empty() {
            tracing::warn!("No summaries generated for any channel");
            report.outcome = BatchOutcome::NoSummaries;
            return Ok(report);
        }

        tracing::info!(count = report.summaries.len(), "Generating report");
        let rendered = render_report(&config.report_title, &report.summaries, Utc::now())?;

        report.report_paths = self
            .store
            .save_report(&rendered)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to save report"))
            .ok();

        if config.skip_email {
            tracing::info!("Skipping email report");
            return Ok(report);
        }

        let attachments = report
            .report_paths
            .as_ref()
            .map(|paths| vec![paths.text.clone()])
            .unwrap_or_default();

        if let Err(e) = self
            .mailer
            .send_report(&rendered, config.email_recipient.as_deref(), &attachments)
            .await
        {
            tracing::error!(error = ?e, "Failed to send email report");
            report.outcome = BatchOutcome::DeliveryFailed {
                reason: e.to_string(),
            };
        }

        Ok(report)
    }
}

impl<P, A, T, S, D, M> BatchJob for DigestProcessor<P, A, T, S, D, M>
where
    P: ChannelSource + Send + Sync + 'static,
    A: MediaDownloader + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
    M: ReportMailer + Send + Sync + 'static,
{
    const NAME: &'static str = "channel-digest";

    type Output = BatchOutcome;

    async fn execute(&self) -> anyhow::Result<BatchOutcome> {
        let outcome = self.run().await.outcome;
        if outcome.is_failure() {
            anyhow::bail!("{outcome}");
        }
        Ok(outcome)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use digest_datastore::FsDataStore;
use digest_pulse::{
    config::{DEFAULT_SEARCH_QUERIES, SummaryBounds},
    openai::OpenAIClient,
    relevance::{DEFAULT_KEYWORDS, DEFAULT_RELEVANCE_THRESHOLD},
    tracing::init_tracing_subscriber,
    yt::{api::YouTubeClient, downloader::YtDlpDownloader},
    BatchOutcome, Cadence, DigestProcessorBuilder, HttpMailer, PipelineConfig, Scheduler,
};

/// Discovers relevant YouTube channels, summarizes their latest videos and
/// mails a digest report.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Channel search query; repeat for several
    #[arg(long = "search-query", global = true)]
    search_queries: Vec<String>,

    #[arg(long, global = true, env = "MAX_SEARCH_RESULTS", default_value_t = 10)]
    max_channels: usize,

    #[arg(long, global = true, env = "VIDEOS_PER_CHANNEL", default_value_t = 5)]
    videos_per_channel: usize,

    /// Relevance keyword; repeat for several
    #[arg(long = "keyword", global = true)]
    keywords: Vec<String>,

    #[arg(long, global = true, env = "RELEVANCE_THRESHOLD", default_value_t = DEFAULT_RELEVANCE_THRESHOLD)]
    relevance_threshold: f64,

    /// Shortest video considered, in seconds
    #[arg(long, global = true, env = "MIN_VIDEO_DURATION", default_value_t = 300)]
    min_duration: u64,

    /// Longest video considered, in seconds
    #[arg(long, global = true, env = "MAX_VIDEO_DURATION", default_value_t = 1800)]
    max_duration: u64,

    #[arg(long, global = true, env = "SUMMARY_MIN_LENGTH", default_value_t = 100)]
    summary_min_words: usize,

    #[arg(long, global = true, env = "SUMMARY_MAX_LENGTH", default_value_t = 300)]
    summary_max_words: usize,

    #[arg(long, global = true, env = "CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Only use media downloaded by an earlier run
    #[arg(long, global = true)]
    skip_download: bool,

    #[arg(long, global = true)]
    skip_email: bool,

    /// Overrides the configured mail recipient for this run
    #[arg(long, global = true)]
    email_recipient: Option<String>,

    #[arg(long, global = true, env = "DOWNLOAD_DIR", default_value = "downloads")]
    download_dir: PathBuf,

    /// Holds the transcripts/, summaries/ and reports/ directories
    #[arg(long, global = true, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, global = true, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: Option<String>,

    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, global = true, env = "YTDLP_COOKIES_PATH")]
    ytdlp_cookies_path: Option<PathBuf>,

    #[arg(long, global = true, env = "MAIL_API_KEY", hide_env_values = true)]
    mail_api_key: Option<String>,

    #[arg(long, global = true, env = "MAIL_API_URL")]
    mail_api_url: Option<String>,

    #[arg(long, global = true, env = "EMAIL_SENDER")]
    email_sender: Option<String>,

    #[arg(long, global = true, env = "EMAIL_RECIPIENT")]
    default_recipient: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a single batch run and exit
    Run,
    /// Run immediately, then keep running on a schedule until interrupted
    Schedule {
        #[arg(
            long,
            env = "SCHEDULE_INTERVAL",
            default_value_t = 24,
            conflicts_with = "cron",
            value_parser = clap::value_parser!(u64).range(1..=87_600)
        )]
        interval_hours: u64,

        /// Six-field cron expression, e.g. "0 0 6 * * *"
        #[arg(long)]
        cron: Option<String>,

        /// Seconds between due-time checks
        #[arg(long, default_value_t = 60)]
        tick_seconds: u64,
    },
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let search_queries = if self.search_queries.is_empty() {
            DEFAULT_SEARCH_QUERIES.iter().map(|q| q.to_string()).collect()
        } else {
            self.search_queries.clone()
        };
        let keywords = if self.keywords.is_empty() {
            DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
        } else {
            self.keywords.clone()
        };

        PipelineConfig {
            search_queries,
            max_channels: self.max_channels,
            videos_per_channel: self.videos_per_channel,
            keywords,
            relevance_threshold: self.relevance_threshold,
            summary_bounds: SummaryBounds {
                min_words: self.summary_min_words,
                max_words: self.summary_max_words,
            },
            download_dir: self.download_dir.clone(),
            concurrency: self.concurrency.max(1),
            skip_download: self.skip_download,
            skip_email: self.skip_email,
            email_recipient: self.email_recipient.clone(),
            ..Default::default()
        }
    }

    /// `None` when any mail setting is missing; sending then fails with
    /// a delivery error unless `--skip-email` is set
    fn mailer(&self) -> Option<HttpMailer> {
        Some(HttpMailer::new(
            self.mail_api_key.clone()?,
            self.mail_api_url.clone()?,
            self.email_sender.clone()?,
            self.default_recipient.clone()?,
        ))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let youtube_key = cli
        .youtube_api_key
        .clone()
        .context("YOUTUBE_API_KEY not set")?;
    let openai_key = cli
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY not set")?;

    let mailer = cli.mailer();
    if mailer.is_none() && !cli.skip_email {
        tracing::warn!("Mail settings incomplete, report delivery will fail");
    }

    let channel_source = YouTubeClient::new(youtube_key)
        .with_duration_window(cli.min_duration, cli.max_duration);
    let downloader = YtDlpDownloader::default().with_cookies(cli.ytdlp_cookies_path.clone());

    //XXX: handles both transcription and summarization; hence two clients
    let transcriber = OpenAIClient::new(&openai_key);
    let summarizer = OpenAIClient::new(&openai_key);

    let processor = DigestProcessorBuilder::new()
        .config(cli.pipeline_config())
        .channel_source(channel_source)
        .downloader(downloader)
        .transcriber(transcriber)
        .summarizer(summarizer)
        .store(FsDataStore::in_dir(&cli.output_dir))
        .mailer(mailer)
        .build();

    match cli.command {
        Command::Run => {
            let report = processor.run().await;
            if let Some(paths) = &report.report_paths {
                tracing::info!(html = ?paths.html, text = ?paths.text, json = ?paths.json, "Report saved");
            }
            match report.outcome {
                outcome @ (BatchOutcome::Failed { .. } | BatchOutcome::DeliveryFailed { .. }) => {
                    anyhow::bail!("Batch run did not complete: {outcome}")
                }
                outcome => tracing::info!(%outcome, "Batch run complete"),
            }
        }
        Command::Schedule {
            interval_hours,
            cron,
            tick_seconds,
        } => {
            let cadence = match cron {
                Some(expression) => Cadence::cron(&expression)
                    .with_context(|| format!("Invalid cron expression '{expression}'"))?,
                None => Cadence::hours(interval_hours),
            };

            let scheduler =
                Scheduler::new(cadence).with_tick(Duration::from_secs(tick_seconds.max(1)));
            scheduler.start(Arc::new(processor));

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;

            tracing::info!(status = ?scheduler.status(), "Shutting down");
            scheduler.stop().await;
        }
    }

    Ok(())
}

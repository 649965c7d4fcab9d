use std::path::PathBuf;

use digest_datastore::DataStore;

use crate::{
    config::{PipelineConfig, SummaryBounds},
    delivery::ReportMailer,
    relevance::RelevanceFilter,
    yt::{ChannelSource, MediaDownloader},
    DigestProcessor, Summarizer, Transcriber,
};

pub struct DigestProcessorBuilder<P = (), A = (), T = (), S = (), D = (), M = ()> {
    channel_source: P,
    downloader: A,
    transcriber: T,
    summarizer: S,
    store: D,
    mailer: M,
    config: PipelineConfig,
}

impl Default for DigestProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestProcessorBuilder {
    pub fn new() -> Self {
        Self {
            channel_source: (),
            downloader: (),
            transcriber: (),
            summarizer: (),
            store: (),
            mailer: (),
            config: PipelineConfig::default(),
        }
    }
}

impl<P, A, T, S, D, M> DigestProcessorBuilder<P, A, T, S, D, M> {
    pub fn channel_source<P2: ChannelSource + Send + Sync + 'static>(
        self,
        channel_source: P2,
    ) -> DigestProcessorBuilder<P2, A, T, S, D, M> {
        DigestProcessorBuilder {
            channel_source,
            downloader: self.downloader,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            store: self.store,
            mailer: self.mailer,
            config: self.config,
        }
    }

    pub fn downloader<A2: MediaDownloader + Send + Sync + 'static>(
        self,
        downloader: A2,
    ) -> DigestProcessorBuilder<P, A2, T, S, D, M> {
        DigestProcessorBuilder {
            channel_source: self.channel_source,
            downloader,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            store: self.store,
            mailer: self.mailer,
            config: self.config,
        }
    }

    pub fn transcriber<T2: Transcriber + Send + Sync + 'static>(
        self,
        transcriber: T2,
    ) -> DigestProcessorBuilder<P, A, T2, S, D, M> {
        DigestProcessorBuilder {
            channel_source: self.channel_source,
            downloader: self.downloader,
            transcriber,
            summarizer: self.summarizer,
            store: self.store,
            mailer: self.mailer,
            config: self.config,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> DigestProcessorBuilder<P, A, T, S2, D, M> {
        DigestProcessorBuilder {
            channel_source: self.channel_source,
            downloader: self.downloader,
            transcriber: self.transcriber,
            summarizer,
            store: self.store,
            mailer: self.mailer,
            config: self.config,
        }
    }

    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> DigestProcessorBuilder<P, A, T, S, D2, M> {
        DigestProcessorBuilder {
            channel_source: self.channel_source,
            downloader: self.downloader,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            store,
            mailer: self.mailer,
            config: self.config,
        }
    }

    pub fn mailer<M2: ReportMailer + Send + Sync + 'static>(
        self,
        mailer: M2,
    ) -> DigestProcessorBuilder<P, A, T, S, D, M2> {
        DigestProcessorBuilder {
            channel_source: self.channel_source,
            downloader: self.downloader,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            store: self.store,
            mailer,
            config: self.config,
        }
    }

    /// Replaces the whole configuration; later setters still apply on top
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn search_queries<Q: Into<String>>(mut self, queries: impl IntoIterator<Item = Q>) -> Self {
        self.config.search_queries = queries.into_iter().map(Into::into).collect();
        self
    }

    pub fn keywords<K: Into<String>>(mut self, keywords: impl IntoIterator<Item = K>) -> Self {
        self.config.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn relevance_threshold(mut self, threshold: f64) -> Self {
        self.config.relevance_threshold = threshold;
        self
    }

    pub fn max_channels(mut self, max_channels: usize) -> Self {
        self.config.max_channels = max_channels;
        self
    }

    pub fn videos_per_channel(mut self, videos_per_channel: usize) -> Self {
        self.config.videos_per_channel = videos_per_channel;
        self
    }

    pub fn summary_bounds(mut self, min_words: usize, max_words: usize) -> Self {
        self.config.summary_bounds = SummaryBounds {
            min_words,
            max_words,
        };
        self
    }

    pub fn download_dir(mut self, download_dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = download_dir.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    pub fn skip_download(mut self, skip: bool) -> Self {
        self.config.skip_download = skip;
        self
    }

    pub fn skip_email(mut self, skip: bool) -> Self {
        self.config.skip_email = skip;
        self
    }

    pub fn email_recipient(mut self, recipient: Option<String>) -> Self {
        self.config.email_recipient = recipient;
        self
    }
}

impl<P, A, T, S, D, M> DigestProcessorBuilder<P, A, T, S, D, M>
where
    P: ChannelSource + Send + Sync + 'static,
    A: MediaDownloader + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
    M: ReportMailer + Send + Sync + 'static,
{
    pub fn build(self) -> DigestProcessor<P, A, T, S, D, M> {
        let filter = RelevanceFilter::new(&self.config.keywords, self.config.relevance_threshold);

        DigestProcessor {
            channel_source: self.channel_source,
            downloader: self.downloader,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            store: self.store,
            mailer: self.mailer,
            filter,
            config: self.config,
        }
    }
}

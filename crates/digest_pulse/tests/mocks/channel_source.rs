use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use digest_datastore::{Channel, Video};
use digest_pulse::yt::ChannelSource;

#[derive(Clone, Default)]
pub struct MockChannelSource {
    pub search_results: HashMap<String, Vec<Channel>>,
    pub failing_queries: HashSet<String>,
    pub uploads: HashMap<String, Vec<Video>>,
    pub search_calls: Arc<Mutex<Vec<String>>>,
    pub panic_with: Option<String>,
}

impl MockChannelSource {
    pub fn with_search(mut self, query: &str, channels: Vec<Channel>) -> Self {
        self.search_results.insert(query.to_string(), channels);
        self
    }

    pub fn with_failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn with_uploads(mut self, channel_id: &str, videos: Vec<Video>) -> Self {
        self.uploads.insert(channel_id.to_string(), videos);
        self
    }

    pub fn panicking(msg: &str) -> Self {
        Self {
            panic_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl ChannelSource for MockChannelSource {
    async fn search_channels(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Channel>> {
        if let Some(ref msg) = self.panic_with {
            panic!("{}", msg);
        }
        self.search_calls.lock().unwrap().push(query.to_string());
        if self.failing_queries.contains(query) {
            return Err(anyhow::anyhow!("search failed for '{}'", query));
        }
        Ok(self
            .search_results
            .get(query)
            .map(|channels| channels.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_channel(&self, channel_id: &str) -> anyhow::Result<Option<Channel>> {
        Ok(self
            .search_results
            .values()
            .flatten()
            .find(|c| c.id == channel_id)
            .cloned())
    }

    async fn list_recent(&self, channel_id: &str, max_results: usize) -> anyhow::Result<Vec<Video>> {
        Ok(self
            .uploads
            .get(channel_id)
            .map(|videos| videos.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }
}

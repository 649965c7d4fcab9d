use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use digest_datastore::Video;
use digest_pulse::yt::MediaDownloader;

#[derive(Clone, Default)]
pub struct MockDownloader {
    pub failing_ids: HashSet<String>,
    /// Media left behind by an earlier run
    pub existing_ids: HashSet<String>,
    pub delays: HashMap<String, Duration>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl MockDownloader {
    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            failing_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_existing(mut self, ids: &[&str]) -> Self {
        self.existing_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }
}

impl MediaDownloader for MockDownloader {
    async fn acquire(&self, video: &Video, download_dir: &Path) -> anyhow::Result<PathBuf> {
        self.calls.lock().unwrap().push(video.id.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&video.id) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_ids.contains(&video.id) {
            return Err(anyhow::anyhow!("download failed for {}", video.id));
        }
        Ok(download_dir.join(format!("{}.mp3", video.id)))
    }

    fn locate(&self, video: &Video, download_dir: &Path) -> Option<PathBuf> {
        self.existing_ids
            .contains(&video.id)
            .then(|| download_dir.join(format!("{}.mp3", video.id)))
    }
}

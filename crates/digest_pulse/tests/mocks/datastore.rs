use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use digest_datastore::{record_file_name, DataStore, RenderedReport, ReportPaths, Video};

#[derive(Clone, Default)]
pub struct MockDataStore {
    pub transcripts: Arc<Mutex<Vec<(String, String)>>>,
    pub summaries: Arc<Mutex<Vec<(String, String)>>>,
    pub reports: Arc<Mutex<Vec<RenderedReport>>>,
    pub fail_with: Option<String>,
}

impl MockDataStore {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl DataStore for MockDataStore {
    async fn save_transcript(&self, video: &Video, text: &str) -> anyhow::Result<PathBuf> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.transcripts
            .lock()
            .unwrap()
            .push((video.id.clone(), text.to_string()));
        Ok(PathBuf::from("transcripts").join(record_file_name(video, "transcript")))
    }

    async fn save_summary(&self, video: &Video, summary: &str) -> anyhow::Result<PathBuf> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.summaries
            .lock()
            .unwrap()
            .push((video.id.clone(), summary.to_string()));
        Ok(PathBuf::from("summaries").join(record_file_name(video, "summary")))
    }

    async fn save_report(&self, report: &RenderedReport) -> anyhow::Result<ReportPaths> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.reports.lock().unwrap().push(report.clone());
        let base = PathBuf::from("reports").join(report.base_name());
        Ok(ReportPaths {
            html: base.with_extension("html"),
            text: base.with_extension("txt"),
            json: base.with_extension("json"),
        })
    }
}

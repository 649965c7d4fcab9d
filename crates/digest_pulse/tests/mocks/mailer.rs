use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use digest_datastore::RenderedReport;
use digest_pulse::{MailerError, ReportMailer};

#[derive(Debug, Clone, PartialEq)]
pub struct SentReport {
    pub title: String,
    pub recipient: Option<String>,
    pub attachments: Vec<PathBuf>,
}

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<SentReport>>>,
    pub fail_with: Option<String>,
}

impl MockMailer {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl ReportMailer for MockMailer {
    async fn send_report(
        &self,
        report: &RenderedReport,
        recipient: Option<&str>,
        attachments: &[PathBuf],
    ) -> Result<(), MailerError> {
        if let Some(ref msg) = self.fail_with {
            return Err(MailerError::Api {
                status: 500,
                message: msg.clone(),
            });
        }
        self.sent.lock().unwrap().push(SentReport {
            title: report.title.clone(),
            recipient: recipient.map(str::to_string),
            attachments: attachments.to_vec(),
        });
        Ok(())
    }
}

use std::{future::Future, path::PathBuf};

use digest_datastore::RenderedReport;
use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("No mailer configured")]
    NotConfigured,
}

/// Delivers a rendered report. `recipient` overrides the mailer's default.
pub trait ReportMailer {
    fn send_report(
        &self,
        report: &RenderedReport,
        recipient: Option<&str>,
        attachments: &[PathBuf],
    ) -> impl Future<Output = Result<(), MailerError>> + Send;
}

impl<M: ReportMailer + Sync> ReportMailer for Option<M> {
    async fn send_report(
        &self,
        report: &RenderedReport,
        recipient: Option<&str>,
        attachments: &[PathBuf],
    ) -> Result<(), MailerError> {
        match self {
            Some(mailer) => mailer.send_report(report, recipient, attachments).await,
            None => Err(MailerError::NotConfigured),
        }
    }
}

/// Sends mail through a Mailgun-style HTTP API (`POST {base_url}/messages`,
/// multipart form, basic auth with user `api`).
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    api_key: String,
    base_url: String,
    sender: String,
    default_recipient: String,
}

impl HttpMailer {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        sender: impl Into<String>,
        default_recipient: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            sender: sender.into(),
            default_recipient: default_recipient.into(),
        }
    }

    pub fn default_recipient(&self) -> &str {
        &self.default_recipient
    }
}

impl ReportMailer for HttpMailer {
    #[tracing::instrument(skip(self, report), fields(title = %report.title))]
    async fn send_report(
        &self,
        report: &RenderedReport,
        recipient: Option<&str>,
        attachments: &[PathBuf],
    ) -> Result<(), MailerError> {
        let recipient = recipient.unwrap_or(&self.default_recipient);

        let subject = format!(
            "{} - {}",
            report.title,
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        );

        let mut form = reqwest::multipart::Form::new()
            .text("from", self.sender.clone())
            .text("to", recipient.to_string())
            .text("subject", subject)
            .text("text", report.text.clone())
            .text("html", report.html.clone());

        for path in attachments {
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = ?e, path = ?path, "Attachment not found, skipping");
                    continue;
                }
            };
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".into());
            form = form.part(
                "attachment",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        }

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .basic_auth("api", Some(&self.api_key))
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(MailerError::Api { status, message });
        }

        tracing::info!(%recipient, "Report email sent");
        Ok(())
    }
}

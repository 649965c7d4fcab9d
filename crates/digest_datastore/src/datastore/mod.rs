use std::{future::Future, path::PathBuf, sync::LazyLock};

use regex::Regex;

use crate::{RenderedReport, ReportPaths, Video};

pub mod fs;

/// Longest sanitized name, in characters
pub const MAX_FILENAME_CHARS: usize = 100;

static INVALID_FILENAME_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

pub trait DataStore {
    fn save_transcript(
        &self,
        video: &Video,
        text: &str,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;

    fn save_summary(
        &self,
        video: &Video,
        summary: &str,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;

    fn save_report(
        &self,
        report: &RenderedReport,
    ) -> impl Future<Output = anyhow::Result<ReportPaths>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn save_transcript(&self, video: &Video, text: &str) -> anyhow::Result<PathBuf> {
        (**self).save_transcript(video, text).await
    }

    async fn save_summary(&self, video: &Video, summary: &str) -> anyhow::Result<PathBuf> {
        (**self).save_summary(video, summary).await
    }

    async fn save_report(&self, report: &RenderedReport) -> anyhow::Result<ReportPaths> {
        (**self).save_report(report).await
    }
}

/// Replaces characters that are invalid in file names on common platforms with `_`
/// and truncates the result to [`MAX_FILENAME_CHARS`] characters.
///
/// Empty and dot-only names become `_` so the result is always a single
/// path component below its parent.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = INVALID_FILENAME_CHARS_RE
        .replace_all(name, "_")
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        return "_".into();
    }
    sanitized
}

/// `<sanitized title>_<id>_<suffix>.txt`; only the title is truncated so the id stays intact
pub fn record_file_name(video: &Video, suffix: &str) -> String {
    format!("{}_{}_{suffix}.txt", sanitize_filename(&video.title), video.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_invalid_chars() {
        assert_eq!(
            sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#),
            "a_b_c_d_e_f_g_h_i_j"
        );
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long = r#"a<b>c:d"e/f\g|h?i*j"#.repeat(20);
        let sanitized = sanitize_filename(&long);

        assert_eq!(sanitized.chars().count(), MAX_FILENAME_CHARS);
        assert!(sanitized.starts_with("a_b_c_d_e_f_g_h_i_j"));
        assert!(!sanitized.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
    }

    #[test]
    fn test_sanitize_neutralizes_relative_components() {
        assert_eq!(sanitize_filename(""), "_");
        assert_eq!(sanitize_filename("."), "_");
        assert_eq!(sanitize_filename(".."), "_");
        assert_eq!(sanitize_filename("../.."), ".._..");
        assert_eq!(sanitize_filename("...and more"), "...and more");
    }

    #[test]
    fn test_sanitize_counts_chars_not_bytes() {
        let name = "ü".repeat(150);
        assert_eq!(sanitize_filename(&name).chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn test_record_file_name_keeps_id() {
        let video = Video {
            id: "dQw4w9WgXcQ".into(),
            title: "x".repeat(300),
            ..Default::default()
        };

        let name = record_file_name(&video, "summary");
        assert!(name.ends_with("_dQw4w9WgXcQ_summary.txt"));
        assert_eq!(
            name.len(),
            MAX_FILENAME_CHARS + "_dQw4w9WgXcQ_summary.txt".len()
        );
    }
}

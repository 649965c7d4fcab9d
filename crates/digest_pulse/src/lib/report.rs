//! Renders the aggregated summaries of a batch run as HTML, plain text and JSON.
//!
//! Videos are grouped by channel, channels appear in the order their first
//! summary was produced.

use std::fmt::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use digest_datastore::{RenderedReport, SummaryRecord};
use itertools::Itertools;

pub fn render_report(
    title: &str,
    summaries: &[SummaryRecord],
    generated_at: DateTime<Utc>,
) -> anyhow::Result<RenderedReport> {
    let json =
        serde_json::to_string_pretty(summaries).context("Failed to serialize summaries")?;

    Ok(RenderedReport {
        title: title.to_string(),
        generated_at,
        html: render_html(title, summaries, generated_at),
        text: render_text(title, summaries, generated_at),
        json,
    })
}

fn by_channel(summaries: &[SummaryRecord]) -> Vec<(&str, Vec<&SummaryRecord>)> {
    summaries
        .iter()
        .map(|s| s.video.channel_id.as_str())
        .unique()
        .map(|channel_id| {
            let videos = summaries
                .iter()
                .filter(|s| s.video.channel_id == channel_id)
                .collect::<Vec<_>>();
            let channel_title = videos
                .first()
                .map(|s| s.video.channel_title.as_str())
                .unwrap_or("Unknown Channel");
            (channel_title, videos)
        })
        .collect()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn render_html(title: &str, summaries: &[SummaryRecord], generated_at: DateTime<Utc>) -> String {
    let title = escape_html(title);
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
.container {{ max-width: 1000px; margin: 0 auto; padding: 20px; }}
.channel-header {{ background-color: #3498db; color: white; padding: 10px; border-radius: 5px; }}
.video-summary {{ margin: 20px 0; border-left: 4px solid #3498db; padding-left: 15px; }}
.video-meta {{ font-size: 14px; color: #7f8c8d; }}
</style>
</head>
<body>
<div class="container">
<h1>{title}</h1>
<p><strong>Report generated:</strong> {generated}</p>
<p><strong>Total videos summarized:</strong> {count}</p>
"#,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        count = summaries.len(),
    );

    for (channel_title, videos) in by_channel(summaries) {
        let _ = write!(
            html,
            "<div class=\"channel-section\">\n<div class=\"channel-header\"><h2>{}</h2></div>\n",
            escape_html(channel_title)
        );

        for record in videos {
            let video = &record.video;
            let _ = write!(
                html,
                concat!(
                    "<div class=\"video-summary\">\n",
                    "<div class=\"video-title\"><a href=\"{url}\">{title}</a></div>\n",
                    "<div class=\"video-meta\">Published: {published} | Duration: {duration} | Views: {views}</div>\n",
                    "<p>{summary}</p>\n",
                    "</div>\n"
                ),
                url = escape_html(&video.url),
                title = escape_html(&video.title),
                published = video.published_at.format("%Y-%m-%d"),
                duration = video.duration_display(),
                views = video.view_count_display(),
                summary = escape_html(&record.summary),
            );
        }

        html.push_str("</div>\n");
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_text(title: &str, summaries: &[SummaryRecord], generated_at: DateTime<Utc>) -> String {
    let mut text = format!(
        "{title}\n{underline}\n\nReport generated: {generated}\nTotal videos summarized: {count}\n",
        underline = "=".repeat(title.chars().count()),
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        count = summaries.len(),
    );

    for (channel_title, videos) in by_channel(summaries) {
        let _ = write!(
            text,
            "\n\n{channel_title}\n{}\n\n",
            "-".repeat(channel_title.chars().count())
        );

        for record in videos {
            let video = &record.video;
            let _ = write!(
                text,
                "Title: {}\nURL: {}\nPublished: {} | Duration: {} | Views: {}\n\nSummary:\n{}\n\n----------------------------------------\n\n",
                video.title,
                video.url,
                video.published_at.format("%Y-%m-%d"),
                video.duration_display(),
                video.view_count_display(),
                record.summary,
            );
        }
    }

    text
}

//! # YouTube Data API client
//!
//! Channel search, channel metadata and recent uploads via the v3 REST API.
//! Requests go through a middleware stack that retries transient failures
//! and honours `Retry-After` headers.

use std::{collections::HashMap, sync::LazyLock};

use anyhow::Context;
use chrono::{DateTime, Utc};
use digest_datastore::{Channel, Video};
use itertools::Itertools;
use regex::Regex;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_retry_after::RetryAfterMiddleware;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{error::Error, yt::ChannelSource};

static ISO8601_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});

/// Parses an ISO-8601 duration such as `PT1H2M3S` into seconds
pub fn parse_iso8601_duration(duration: &str) -> Result<u64, Error> {
    let captures = ISO8601_DURATION_RE
        .captures(duration)
        .ok_or_else(|| Error::InvalidDuration(duration.to_string()))?;

    let part = |idx: usize| -> Result<u64, Error> {
        captures
            .get(idx)
            .map(|m| m.as_str().parse::<u64>())
            .transpose()
            .map(|v| v.unwrap_or(0))
            .map_err(|_| Error::InvalidDuration(duration.to_string()))
    };

    let invalid = || Error::InvalidDuration(duration.to_string());
    [(part(1)?, 86_400), (part(2)?, 3600), (part(3)?, 60), (part(4)?, 1)]
        .into_iter()
        .try_fold(0u64, |total, (value, unit)| {
            value.checked_mul(unit).and_then(|secs| total.checked_add(secs))
        })
        .ok_or_else(invalid)
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
    #[serde(default)]
    statistics: Statistics,
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

/// Counters arrive as decimal strings and may be hidden by the owner
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn parse_count(value: &Option<String>) -> Option<u64> {
    value.as_deref().and_then(|v| v.parse().ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    content_details: VideoContentDetails,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: DateTime<Utc>,
    channel_id: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Default, Deserialize)]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
}

impl From<ChannelItem> for Channel {
    fn from(item: ChannelItem) -> Self {
        Channel {
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            relevance_score: 0.0,
            published_at: item.snippet.published_at,
            thumbnail_url: item.snippet.thumbnails.high.map(|t| t.url),
            subscriber_count: parse_count(&item.statistics.subscriber_count),
            video_count: parse_count(&item.statistics.video_count),
            view_count: parse_count(&item.statistics.view_count),
        }
    }
}

impl TryFrom<VideoItem> for Video {
    type Error = Error;

    fn try_from(item: VideoItem) -> Result<Self, Self::Error> {
        let duration_secs = parse_iso8601_duration(&item.content_details.duration)?;

        Ok(Video {
            url: format!("{}?v={}", YouTubeClient::WATCH_URL, item.id),
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            channel_id: item.snippet.channel_id,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            duration_secs,
            view_count: parse_count(&item.statistics.view_count),
            like_count: parse_count(&item.statistics.like_count),
            comment_count: parse_count(&item.statistics.comment_count),
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    min_duration_secs: u64,
    max_duration_secs: u64,
}

impl YouTubeClient {
    pub const WATCH_URL: &'static str = "https://www.youtube.com/watch";

    /// Page size limit of the list endpoints
    const MAX_PAGE_SIZE: usize = 50;

    pub fn new(api_key: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryAfterMiddleware::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://www.googleapis.com/youtube/v3".into(),
            min_duration_secs: 300,
            max_duration_secs: 1800,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Videos outside `min..=max` seconds are dropped from listings
    pub fn with_duration_window(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.min_duration_secs = min_secs;
        self.max_duration_secs = max_secs;
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> anyhow::Result<T> {
        let resp = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, endpoint, "Failed to make http request"))
            .with_context(|| format!("Request to '{endpoint}' failed"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("YouTube API error on '{endpoint}': {status} - {message}");
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to decode '{endpoint}' response"))
    }

    async fn fetch_channel_item(&self, channel_id: &str) -> anyhow::Result<Option<ChannelItem>> {
        let resp: ListResponse<ChannelItem> = self
            .get(
                "channels",
                &[
                    ("part", "snippet,statistics,contentDetails"),
                    ("id", channel_id),
                ],
            )
            .await?;

        Ok(resp.items.into_iter().next())
    }

    fn in_duration_window(&self, video: &Video) -> bool {
        (self.min_duration_secs..=self.max_duration_secs).contains(&video.duration_secs)
    }
}

impl ChannelSource for YouTubeClient {
    #[tracing::instrument(skip(self))]
    async fn search_channels(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Channel>> {
        let max_results = max_results.clamp(1, Self::MAX_PAGE_SIZE).to_string();
        let resp: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "channel"),
                    ("q", query),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        let mut channels = Vec::with_capacity(resp.items.len());
        for item in resp.items {
            match self.fetch_channel(&item.snippet.channel_id).await {
                Ok(Some(channel)) => channels.push(channel),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = ?e, channel_id = %item.snippet.channel_id, "Failed to get channel info")
                }
            }
        }

        tracing::info!(count = channels.len(), "Found channels for query");
        Ok(channels)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_channel(&self, channel_id: &str) -> anyhow::Result<Option<Channel>> {
        let item = self.fetch_channel_item(channel_id).await?;
        if item.is_none() {
            tracing::warn!("No channel found");
        }
        Ok(item.map(Channel::from))
    }

    #[tracing::instrument(skip(self))]
    async fn list_recent(&self, channel_id: &str, max_results: usize) -> anyhow::Result<Vec<Video>> {
        let Some(uploads) = self
            .fetch_channel_item(channel_id)
            .await?
            .and_then(|item| item.content_details)
            .and_then(|details| details.related_playlists.uploads)
        else {
            tracing::warn!("Channel has no uploads playlist");
            return Ok(Vec::new());
        };

        let max_results = max_results.clamp(1, Self::MAX_PAGE_SIZE).to_string();
        let playlist: ListResponse<PlaylistItem> = self
            .get(
                "playlistItems",
                &[
                    ("part", "contentDetails"),
                    ("playlistId", &uploads),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        if playlist.items.is_empty() {
            return Ok(Vec::new());
        }

        let ids = playlist
            .items
            .iter()
            .map(|item| item.content_details.video_id.as_str())
            .join(",");

        let details: ListResponse<VideoItem> = self
            .get(
                "videos",
                &[("part", "snippet,contentDetails,statistics"), ("id", &ids)],
            )
            .await?;

        // the videos endpoint does not guarantee request order
        let mut by_id = details
            .items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect::<HashMap<_, _>>();

        let videos = playlist
            .items
            .iter()
            .filter_map(|p| by_id.remove(&p.content_details.video_id))
            .filter(|item| {
                if item.snippet.title.is_empty() {
                    tracing::warn!(video_id = %item.id, "Skipping video without title");
                }
                !item.snippet.title.is_empty()
            })
            .filter_map(|item| {
                let id = item.id.clone();
                Video::try_from(item)
                    .inspect_err(|e| tracing::warn!(error = %e, video_id = %id, "Skipping video"))
                    .ok()
            })
            .filter(|video| {
                let keep = self.in_duration_window(video);
                if !keep {
                    tracing::info!(
                        video_id = %video.id,
                        duration_secs = video.duration_secs,
                        "Video duration outside acceptable range"
                    );
                }
                keep
            })
            .collect::<Vec<_>>();

        tracing::info!(count = videos.len(), "Retrieved videos for channel");
        Ok(videos)
    }
}

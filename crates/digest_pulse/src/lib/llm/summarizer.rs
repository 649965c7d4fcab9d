use std::{fmt::Debug, future::Future};

use serde::Deserialize;

pub trait Summarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug;

    /// Summary of `content` aiming for `min_words..=max_words` words
    fn summarize(
        &self,
        content: &str,
        min_words: usize,
        max_words: usize,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

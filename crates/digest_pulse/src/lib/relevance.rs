use digest_datastore::Channel;

/// Keyword set used when none is configured
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "crypto",
    "cryptocurrency",
    "bitcoin",
    "btc",
    "ethereum",
    "eth",
    "blockchain",
    "defi",
    "nft",
    "altcoin",
    "trading",
    "binance",
    "coinbase",
    "token",
    "mining",
    "wallet",
    "ledger",
    "trezor",
];

pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.7;

/// Keyword-density scorer deciding whether a channel is in-domain.
///
/// A keyword counts once if it occurs anywhere in the lowercased title or
/// description. The score is the fraction of keywords that matched.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
    threshold: f64,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS, DEFAULT_RELEVANCE_THRESHOLD)
    }
}

impl RelevanceFilter {
    pub fn new<K: AsRef<str>>(keywords: impl IntoIterator<Item = K>, threshold: f64) -> Self {
        RelevanceFilter {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score(&self, channel: &Channel) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }

        let title = channel.title.to_lowercase();
        let description = channel.description.to_lowercase();

        let matches = self
            .keywords
            .iter()
            .filter(|k| title.contains(k.as_str()) || description.contains(k.as_str()))
            .count();

        matches as f64 / self.keywords.len() as f64
    }

    pub fn is_relevant(&self, channel: &Channel) -> bool {
        self.score(channel) >= self.threshold
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One article as returned by the news API, scoped to a single topic and day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub url: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    /// The API document verbatim, kept alongside the parsed fields.
    pub source_payload: serde_json::Value,
}

/// An article that passed the duplicate filter and was summarized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizedArticle {
    pub header: String,
    pub summary: String,
    pub url: String,
    pub image: Option<String>,
    #[serde(rename = "original_article")]
    pub original: RawArticle,
}

/// The per-topic digest stored once per topic per day. Never mutated after
/// creation; a rerun replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicDigest {
    pub topic: String,
    pub date: NaiveDate,
    #[serde(rename = "summaries")]
    pub articles: Vec<SummarizedArticle>,
    pub count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestSection {
    pub topic: String,
    pub articles: Vec<SummarizedArticle>,
}

/// A subscriber's personalized digest: their chosen topics joined against the
/// stored topic digests for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalDigest {
    pub user_id: String,
    pub date: NaiveDate,
    pub sections: Vec<DigestSection>,
    pub total_articles: usize,
}

/// The stored newsletter envelope. `delivered` transitions false -> true
/// exactly once, after a confirmed send, and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterRecord {
    pub user_id: String,
    pub date: NaiveDate,
    pub content: PersonalDigest,
    pub created_at: DateTime<Utc>,
    pub delivered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticlesRecord {
    pub topic: String,
    pub date: NaiveDate,
    pub articles: Vec<RawArticle>,
    pub count: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Subscriber profile, owned by an external store and read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

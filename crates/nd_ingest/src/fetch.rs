use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nd_core::{Error, NewsSource, RawArticle, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_MAX_PER_TOPIC: usize = 10;

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Client for api.thenewsapi.com. Fetches up to 50 articles per topic and
/// keeps only those published on the run date, capped at `max_per_topic`.
pub struct TheNewsApiClient {
    client: Client,
    api_token: String,
    base_url: String,
    max_per_topic: usize,
}

impl TheNewsApiClient {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_token: api_token.into(),
            base_url: "https://api.thenewsapi.com".to_string(),
            max_per_topic: DEFAULT_MAX_PER_TOPIC,
        }
    }

    /// Reads `NEWS_API_TOKEN`; a missing token is a fatal startup error.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("NEWS_API_TOKEN")
            .map_err(|_| Error::Fetch("NEWS_API_TOKEN is not set".to_string()))?;
        Ok(Self::new(token))
    }

    pub fn with_max_per_topic(mut self, max: usize) -> Self {
        self.max_per_topic = max;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn parse_article(item: &serde_json::Value) -> Option<RawArticle> {
        let url = item.get("url").and_then(|v| v.as_str())?;
        let published_at = item.get("published_at").and_then(|v| v.as_str())?;
        let published_at = DateTime::parse_from_rfc3339(published_at)
            .ok()?
            .with_timezone(&Utc);
        let title = item
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("No Title");
        let image_url = item
            .get("image_url")
            .and_then(|v| v.as_str())
            .map(String::from);

        Some(RawArticle {
            url: url.to_string(),
            title: title.to_string(),
            published_at,
            image_url,
            source_payload: item.clone(),
        })
    }
}

#[async_trait]
impl NewsSource for TheNewsApiClient {
    async fn fetch(&self, topic: &str, date: NaiveDate) -> Result<Vec<RawArticle>> {
        let response = self
            .client
            .get(format!("{}/v1/news/all", self.base_url))
            .query(&[
                ("api_token", self.api_token.as_str()),
                ("categories", topic),
                ("language", "en"),
                ("limit", "50"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<NewsResponse>()
            .await?;

        let mut today = Vec::new();
        for item in &response.data {
            let Some(article) = Self::parse_article(item) else {
                debug!("skipping malformed article document for topic {}", topic);
                continue;
            };
            if article.published_at.date_naive() != date {
                continue;
            }
            today.push(article);
            if today.len() == self.max_per_topic {
                break;
            }
        }

        debug!("found {} articles for {} on {}", today.len(), topic, date);
        Ok(today)
    }
}

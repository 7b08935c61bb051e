use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::RawArticle;
use crate::Result;

/// News search API: same-day articles for one topic.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, topic: &str, date: NaiveDate) -> Result<Vec<RawArticle>>;
}

/// Article download + plain-text extraction.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String>;
}

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// Keyed document store. Only point upserts, point reads and a full
/// collection scan are required; no query semantics.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or fully replace the document at (collection, id).
    async fn upsert(&self, collection: &str, id: &str, document: Value) -> Result<()>;

    /// Point read; Ok(None) when the document does not exist.
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// All (id, document) pairs in a collection.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

pub mod collections {
    pub const RAW_ARTICLES: &str = "raw_articles";
    pub const SUMMARIES: &str = "summaries";
    pub const NEWSLETTERS: &str = "newsletters";
    pub const USERS: &str = "users";
}

/// Document id for the per-topic daily collections: `{topic}_{date}`.
pub fn topic_key(topic: &str, date: NaiveDate) -> String {
    format!("{}_{}", topic, date)
}

/// Document id for the newsletters collection: `{user_id}_{date}`.
pub fn newsletter_key(user_id: &str, date: NaiveDate) -> String {
    format!("{}_{}", user_id, date)
}

pub async fn fetch_document<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<T>> {
    match store.fetch(collection, id).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn upsert_document<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    document: &T,
) -> Result<()> {
    store
        .upsert(collection, id, serde_json::to_value(document)?)
        .await
}

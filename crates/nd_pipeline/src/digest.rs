use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use nd_core::storage::{collections, topic_key, upsert_document};
use nd_core::{DocumentStore, Result, SummarizedArticle, TopicDigest};
use tracing::info;

/// Wraps the day's accepted, summarized articles for one topic into a
/// TopicDigest and persists it. An empty day writes nothing: absence of the
/// document is the "no news today" state, distinct from an empty digest.
pub struct DigestBuilder {
    store: Arc<dyn DocumentStore>,
}

impl DigestBuilder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Reruns replace the prior digest for (topic, date) wholesale.
    pub async fn build(
        &self,
        topic: &str,
        date: NaiveDate,
        accepted: Vec<SummarizedArticle>,
    ) -> Result<Option<TopicDigest>> {
        if accepted.is_empty() {
            info!("no digest for {} on {}: nothing accepted", topic, date);
            return Ok(None);
        }

        let digest = TopicDigest {
            topic: topic.to_string(),
            date,
            count: accepted.len(),
            articles: accepted,
            created_at: Utc::now(),
        };

        upsert_document(
            self.store.as_ref(),
            collections::SUMMARIES,
            &topic_key(topic, date),
            &digest,
        )
        .await?;

        info!("stored digest for {} with {} articles", topic, digest.count);
        Ok(Some(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nd_core::RawArticle;
    use nd_storage::MemoryStore;
    use serde_json::Value;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()
    }

    fn article(n: usize) -> SummarizedArticle {
        SummarizedArticle {
            header: format!("Story {}", n),
            summary: "A summary.".to_string(),
            url: format!("https://example.com/{}", n),
            image: None,
            original: RawArticle {
                url: format!("https://example.com/{}", n),
                title: format!("Story {}", n),
                published_at: date().and_hms_opt(8, 0, 0).unwrap().and_utc(),
                image_url: None,
                source_payload: Value::Null,
            },
        }
    }

    #[tokio::test]
    async fn count_matches_articles() {
        let store = Arc::new(MemoryStore::new());
        let builder = DigestBuilder::new(store.clone());

        let digest = builder
            .build("tech", date(), vec![article(1), article(2)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(digest.count, 2);
        assert_eq!(digest.count, digest.articles.len());

        let stored = store
            .fetch("summaries", "tech_2025-07-04")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["count"], 2);
        assert_eq!(stored["summaries"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_day_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let builder = DigestBuilder::new(store.clone());

        let digest = builder.build("sports", date(), vec![]).await.unwrap();
        assert!(digest.is_none());
        assert!(store
            .fetch("summaries", "sports_2025-07-04")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rebuild_is_idempotent_sans_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let builder = DigestBuilder::new(store.clone());

        builder
            .build("tech", date(), vec![article(1), article(2)])
            .await
            .unwrap();
        let first = store.fetch("summaries", "tech_2025-07-04").await.unwrap().unwrap();

        builder
            .build("tech", date(), vec![article(1), article(2)])
            .await
            .unwrap();
        let second = store.fetch("summaries", "tech_2025-07-04").await.unwrap().unwrap();

        let strip = |mut v: Value| {
            v.as_object_mut().unwrap().remove("created_at");
            v
        };
        assert_eq!(strip(first), strip(second));
    }

    #[tokio::test]
    async fn rebuild_replaces_not_merges() {
        let store = Arc::new(MemoryStore::new());
        let builder = DigestBuilder::new(store.clone());

        builder
            .build("tech", date(), vec![article(1), article(2)])
            .await
            .unwrap();
        builder.build("tech", date(), vec![article(3)]).await.unwrap();

        let stored = store.fetch("summaries", "tech_2025-07-04").await.unwrap().unwrap();
        assert_eq!(stored["count"], 1);
        assert_eq!(stored["summaries"][0]["header"], "Story 3");
    }
}

use std::sync::Arc;

use chrono::NaiveDate;
use nd_core::storage::{collections, fetch_document, topic_key};
use nd_core::{DigestSection, DocumentStore, PersonalDigest, TopicDigest};
use tracing::warn;

/// Joins one subscriber's topic preferences against the day's stored topic
/// digests. Topics with no digest are omitted; a store error on one topic is
/// treated as absence for this subscriber and never aborts the others.
pub struct Personalizer {
    store: Arc<dyn DocumentStore>,
}

impl Personalizer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn personalize(
        &self,
        user_id: &str,
        topics: &[String],
        date: NaiveDate,
    ) -> PersonalDigest {
        let mut sections = Vec::new();
        let mut total_articles = 0;

        for topic in topics {
            let digest = match fetch_document::<TopicDigest>(
                self.store.as_ref(),
                collections::SUMMARIES,
                &topic_key(topic, date),
            )
            .await
            {
                Ok(digest) => digest,
                Err(e) => {
                    warn!(
                        "digest lookup failed for topic {} (subscriber {}): {}",
                        topic, user_id, e
                    );
                    None
                }
            };

            if let Some(digest) = digest {
                if !digest.articles.is_empty() {
                    total_articles += digest.articles.len();
                    sections.push(DigestSection {
                        topic: topic.clone(),
                        articles: digest.articles,
                    });
                }
            }
        }

        PersonalDigest {
            user_id: user_id.to_string(),
            date,
            sections,
            total_articles,
        }
    }
}

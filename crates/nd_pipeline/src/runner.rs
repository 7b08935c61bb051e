use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use nd_core::storage::{collections, fetch_document, newsletter_key, topic_key, upsert_document};
use nd_core::{
    DocumentStore, InferenceModel, NewsSource, NewsletterRecord, RawArticlesRecord, Result,
    SummarizedArticle, TextExtractor,
};
use nd_delivery::{DeliveryOrchestrator, DeliveryResult};
use nd_inference::DuplicateFilter;
use tracing::{debug, info, warn};

use crate::digest::DigestBuilder;
use crate::personalize::Personalizer;
use crate::preferences::PreferenceResolver;

pub const DEFAULT_TOPICS: &[&str] = &["general", "science", "sports", "tech", "entertainment"];

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub topics: Vec<String>,
    pub similarity_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            similarity_threshold: nd_inference::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub digests_built: usize,
    pub articles_accepted: usize,
    pub duplicates_rejected: usize,
    pub newsletters_sent: usize,
    pub newsletters_skipped: usize,
    pub newsletters_failed: usize,
}

/// One full batch run: every topic drains through fetch, extraction, dedup,
/// summarization and digest building before any subscriber is processed, so
/// personalization always reads complete topic digests. Failures are local
/// to the article, topic or subscriber that raised them.
pub struct Pipeline {
    store: Arc<dyn DocumentStore>,
    model: Arc<dyn InferenceModel>,
    source: Arc<dyn NewsSource>,
    extractor: Arc<dyn TextExtractor>,
    orchestrator: DeliveryOrchestrator,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        model: Arc<dyn InferenceModel>,
        source: Arc<dyn NewsSource>,
        extractor: Arc<dyn TextExtractor>,
        orchestrator: DeliveryOrchestrator,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            model,
            source,
            extractor,
            orchestrator,
            config,
        }
    }

    pub async fn run(&self, date: NaiveDate) -> Result<RunReport> {
        info!("📰 starting digest run for {}", date);
        let mut report = RunReport::default();

        // The filter cache lives for exactly one run.
        let mut filter = DuplicateFilter::new(self.model.clone())
            .with_threshold(self.config.similarity_threshold);

        for topic in &self.config.topics {
            match self.process_topic(&mut filter, topic, date, &mut report).await {
                Ok(true) => report.digests_built += 1,
                Ok(false) => {}
                Err(e) => warn!("topic {} abandoned: {}", topic, e),
            }
        }

        self.process_subscribers(date, &mut report).await;

        info!(
            "✨ run complete: {} digests, {} sent, {} skipped, {} failed",
            report.digests_built,
            report.newsletters_sent,
            report.newsletters_skipped,
            report.newsletters_failed
        );
        Ok(report)
    }

    async fn process_topic(
        &self,
        filter: &mut DuplicateFilter,
        topic: &str,
        date: NaiveDate,
        report: &mut RunReport,
    ) -> Result<bool> {
        info!("fetching news for topic: {}", topic);
        let raw = self.source.fetch(topic, date).await?;
        if raw.is_empty() {
            info!("no articles for {} today", topic);
            return Ok(false);
        }

        let record = RawArticlesRecord {
            topic: topic.to_string(),
            date,
            count: raw.len(),
            articles: raw.clone(),
            fetched_at: Utc::now(),
        };
        if let Err(e) = upsert_document(
            self.store.as_ref(),
            collections::RAW_ARTICLES,
            &topic_key(topic, date),
            &record,
        )
        .await
        {
            warn!("failed to store raw articles for {}: {}", topic, e);
        }

        let mut accepted = Vec::new();
        for article in raw {
            let text = match self.extractor.extract(&article.url).await {
                Ok(text) => text,
                Err(e) => {
                    debug!("skipping {}: {}", article.url, e);
                    continue;
                }
            };

            match filter.admit(topic, &text).await {
                Ok(true) => {}
                Ok(false) => {
                    report.duplicates_rejected += 1;
                    debug!("duplicate coverage skipped: {}", article.url);
                    continue;
                }
                Err(e) => {
                    warn!("dedup failed for {}: {}", article.url, e);
                    continue;
                }
            }

            let summary = match self.model.summarize(&text).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!("summarization failed for {}: {}", article.url, e);
                    continue;
                }
            };

            accepted.push(SummarizedArticle {
                header: article.title.clone(),
                summary,
                url: article.url.clone(),
                image: article.image_url.clone(),
                original: article,
            });
            report.articles_accepted += 1;
        }

        let builder = DigestBuilder::new(self.store.clone());
        Ok(builder.build(topic, date, accepted).await?.is_some())
    }

    async fn process_subscribers(&self, date: NaiveDate, report: &mut RunReport) {
        let resolver = PreferenceResolver::new(self.store.clone());
        let preferences = match resolver.resolve_all().await {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("could not resolve subscriber preferences: {}", e);
                return;
            }
        };
        if preferences.is_empty() {
            info!("no subscribers with topic preferences");
            return;
        }

        let mut subscribers: Vec<_> = preferences.into_iter().collect();
        subscribers.sort_by(|a, b| a.0.cmp(&b.0));

        let personalizer = Personalizer::new(self.store.clone());
        for (user_id, topics) in subscribers {
            let digest = personalizer.personalize(&user_id, &topics, date).await;
            if digest.total_articles == 0 {
                debug!("no content for {} today", user_id);
                continue;
            }

            let key = newsletter_key(&user_id, date);

            // A digest already sent today must not be rebuilt with
            // delivered reset, or a rerun would send it twice.
            match fetch_document::<NewsletterRecord>(
                self.store.as_ref(),
                collections::NEWSLETTERS,
                &key,
            )
            .await
            {
                Ok(Some(existing)) if existing.delivered => {
                    info!("newsletter for {} already delivered today", user_id);
                    report.newsletters_skipped += 1;
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("delivery state unknown for {}: {}", user_id, e);
                    report.newsletters_failed += 1;
                    continue;
                }
            }

            let record = NewsletterRecord {
                user_id: user_id.clone(),
                date,
                content: digest,
                created_at: Utc::now(),
                delivered: false,
            };
            if let Err(e) = upsert_document(
                self.store.as_ref(),
                collections::NEWSLETTERS,
                &key,
                &record,
            )
            .await
            {
                warn!("failed to store newsletter for {}: {}", user_id, e);
                report.newsletters_failed += 1;
                continue;
            }

            match self.orchestrator.deliver(&record).await {
                DeliveryResult::Sent => report.newsletters_sent += 1,
                DeliveryResult::Skipped(reason) => {
                    info!("skipped {}: {}", user_id, reason);
                    report.newsletters_skipped += 1;
                }
                DeliveryResult::Failed(reason) => {
                    warn!("delivery failed for {}: {}", user_id, reason);
                    report.newsletters_failed += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nd_core::{EmailTransport, Error, RawArticle};
    use nd_delivery::{NewsletterRenderer, RenderMode};
    use nd_storage::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned per-topic articles instead of the live news API.
    struct CannedSource {
        by_topic: HashMap<String, Vec<RawArticle>>,
    }

    #[async_trait]
    impl NewsSource for CannedSource {
        async fn fetch(&self, topic: &str, _date: NaiveDate) -> Result<Vec<RawArticle>> {
            Ok(self.by_topic.get(topic).cloned().unwrap_or_default())
        }
    }

    /// Canned per-url text instead of live extraction.
    struct CannedExtractor {
        by_url: HashMap<String, String>,
    }

    #[async_trait]
    impl TextExtractor for CannedExtractor {
        async fn extract(&self, url: &str) -> Result<String> {
            self.by_url
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Extraction(format!("no text for {}", url)))
        }
    }

    /// Fixed embeddings per text; summaries echo the text.
    struct ScriptedModel {
        embeddings: HashMap<String, Vec<f32>>,
    }

    #[async_trait]
    impl InferenceModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn summarize(&self, text: &str) -> Result<String> {
            Ok(format!("Summary of: {}", text))
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.embeddings.get(text).cloned().unwrap_or(vec![0.0, 1.0]))
        }
    }

    struct RecordingTransport {
        sends: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmailTransport for RecordingTransport {
        async fn send(&self, to: &str, _subject: &str, _html_body: &str) -> Result<()> {
            self.sends.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    fn raw(url: &str, title: &str, date: NaiveDate) -> RawArticle {
        RawArticle {
            url: url.to_string(),
            title: title.to_string(),
            published_at: date.and_hms_opt(9, 0, 0).unwrap().and_utc(),
            image_url: None,
            source_payload: json!({"url": url}),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()
    }

    fn pipeline(
        store: Arc<MemoryStore>,
        transport: Arc<RecordingTransport>,
        topics: &[&str],
        by_topic: HashMap<String, Vec<RawArticle>>,
        by_url: HashMap<String, String>,
        embeddings: HashMap<String, Vec<f32>>,
    ) -> Pipeline {
        let model = Arc::new(ScriptedModel { embeddings });
        let orchestrator = DeliveryOrchestrator::new(
            store.clone(),
            transport,
            NewsletterRenderer::new(RenderMode::Plain),
        );
        Pipeline::new(
            store,
            model,
            Arc::new(CannedSource { by_topic }),
            Arc::new(CannedExtractor { by_url }),
            orchestrator,
            PipelineConfig {
                topics: topics.iter().map(|t| t.to_string()).collect(),
                similarity_threshold: 0.95,
            },
        )
    }

    #[tokio::test]
    async fn tech_and_sports_scenario() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport {
            sends: Mutex::new(Vec::new()),
        });

        store
            .upsert("users", "alice", json!({"email": "alice@example.com", "topics": ["tech"]}))
            .await
            .unwrap();
        store
            .upsert("users", "bob", json!({"email": "bob@example.com", "topics": ["sports"]}))
            .await
            .unwrap();

        let by_topic = HashMap::from([
            (
                "tech".to_string(),
                vec![
                    raw("https://example.com/a", "Chips Ahead", date()),
                    raw("https://example.com/b", "Robots Rise", date()),
                ],
            ),
            ("sports".to_string(), vec![]),
        ]);
        let by_url = HashMap::from([
            ("https://example.com/a".to_string(), "text a".to_string()),
            ("https://example.com/b".to_string(), "text b".to_string()),
        ]);
        let embeddings = HashMap::from([
            ("text a".to_string(), vec![1.0, 0.0]),
            ("text b".to_string(), vec![0.0, 1.0]),
        ]);

        let pipeline = pipeline(
            store.clone(),
            transport.clone(),
            &["tech", "sports"],
            by_topic,
            by_url,
            embeddings,
        );
        let report = pipeline.run(date()).await.unwrap();

        // Only tech produced a digest.
        assert_eq!(report.digests_built, 1);
        assert!(store.fetch("summaries", "tech_2025-07-04").await.unwrap().is_some());
        assert!(store.fetch("summaries", "sports_2025-07-04").await.unwrap().is_none());

        // Alice got a newsletter with both tech stories; Bob got nothing.
        assert_eq!(report.newsletters_sent, 1);
        assert_eq!(transport.sends.lock().unwrap().as_slice(), ["alice@example.com"]);

        let newsletter = store
            .fetch("newsletters", "alice_2025-07-04")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(newsletter["content"]["total_articles"], 2);
        assert_eq!(newsletter["delivered"], json!(true));
        assert!(store
            .fetch("newsletters", "bob_2025-07-04")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_coverage_is_collapsed() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport {
            sends: Mutex::new(Vec::new()),
        });

        let similar = vec![0.97, (1.0f32 - 0.97 * 0.97).sqrt()];
        let by_topic = HashMap::from([(
            "tech".to_string(),
            vec![
                raw("https://example.com/a", "Original", date()),
                raw("https://example.com/b", "Same Story", date()),
            ],
        )]);
        let by_url = HashMap::from([
            ("https://example.com/a".to_string(), "text a".to_string()),
            ("https://example.com/b".to_string(), "text b".to_string()),
        ]);
        let embeddings = HashMap::from([
            ("text a".to_string(), vec![1.0, 0.0]),
            ("text b".to_string(), similar),
        ]);

        let pipeline = pipeline(
            store.clone(),
            transport,
            &["tech"],
            by_topic,
            by_url,
            embeddings,
        );
        let report = pipeline.run(date()).await.unwrap();

        assert_eq!(report.duplicates_rejected, 1);
        assert_eq!(report.articles_accepted, 1);
        let digest = store.fetch("summaries", "tech_2025-07-04").await.unwrap().unwrap();
        assert_eq!(digest["count"], 1);
        assert_eq!(digest["summaries"][0]["header"], "Original");
    }

    #[tokio::test]
    async fn rerun_after_delivery_does_not_send_twice() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport {
            sends: Mutex::new(Vec::new()),
        });

        store
            .upsert("users", "alice", json!({"email": "alice@example.com", "topics": ["tech"]}))
            .await
            .unwrap();

        let by_topic = HashMap::from([(
            "tech".to_string(),
            vec![raw("https://example.com/a", "Chips Ahead", date())],
        )]);
        let by_url =
            HashMap::from([("https://example.com/a".to_string(), "text a".to_string())]);
        let embeddings = HashMap::from([("text a".to_string(), vec![1.0, 0.0])]);

        let pipeline = pipeline(
            store.clone(),
            transport.clone(),
            &["tech"],
            by_topic,
            by_url,
            embeddings,
        );

        let first = pipeline.run(date()).await.unwrap();
        assert_eq!(first.newsletters_sent, 1);

        let second = pipeline.run(date()).await.unwrap();
        assert_eq!(second.newsletters_sent, 0);
        assert_eq!(second.newsletters_skipped, 1);
        assert_eq!(transport.sends.lock().unwrap().len(), 1);

        let newsletter = store
            .fetch("newsletters", "alice_2025-07-04")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(newsletter["delivered"], json!(true));
    }

    #[tokio::test]
    async fn extraction_failures_do_not_abort_the_topic() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport {
            sends: Mutex::new(Vec::new()),
        });

        let by_topic = HashMap::from([(
            "tech".to_string(),
            vec![
                raw("https://example.com/broken", "Broken", date()),
                raw("https://example.com/a", "Works", date()),
            ],
        )]);
        // No text for /broken: extraction fails, /a still flows through.
        let by_url =
            HashMap::from([("https://example.com/a".to_string(), "text a".to_string())]);
        let embeddings = HashMap::from([("text a".to_string(), vec![1.0, 0.0])]);

        let pipeline = pipeline(
            store.clone(),
            transport,
            &["tech"],
            by_topic,
            by_url,
            embeddings,
        );
        let report = pipeline.run(date()).await.unwrap();

        assert_eq!(report.articles_accepted, 1);
        let digest = store.fetch("summaries", "tech_2025-07-04").await.unwrap().unwrap();
        assert_eq!(digest["count"], 1);
        assert_eq!(digest["summaries"][0]["header"], "Works");
    }
}

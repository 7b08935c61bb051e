use std::sync::Arc;

use nd_core::{cosine_similarity, InferenceModel, Result};
use tracing::debug;

mod cache;

pub use cache::{EmbeddingCache, InMemoryCache};

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.95;

/// Semantic duplicate filter over one run's article stream. Candidates are
/// compared against every embedding already admitted for their topic; the
/// first-seen article of a story wins. O(n²) per topic, n stays in the tens.
pub struct DuplicateFilter {
    model: Arc<dyn InferenceModel>,
    cache: Box<dyn EmbeddingCache>,
    threshold: f32,
}

impl DuplicateFilter {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self::with_cache(model, Box::new(InMemoryCache::new()))
    }

    pub fn with_cache(model: Arc<dyn InferenceModel>, cache: Box<dyn EmbeddingCache>) -> Self {
        Self {
            model,
            cache,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Decide whether an article's text is novel for its topic. Returns
    /// Ok(false) for duplicates and for empty text; rejection is silent and
    /// leaves the cache untouched.
    pub async fn admit(&mut self, topic: &str, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            return Ok(false);
        }

        let candidate = self.model.embed(text).await?;

        for seen in self.cache.lookup(topic) {
            let similarity = cosine_similarity(&candidate, seen);
            if similarity > self.threshold {
                debug!(
                    "rejecting duplicate for topic {} (similarity {:.3})",
                    topic, similarity
                );
                return Ok(false);
            }
        }

        self.cache.insert(topic, candidate);
        Ok(true)
    }
}

use std::collections::HashMap;

/// Embeddings admitted so far, keyed by topic. The cache is owned by one
/// pipeline run and discarded at run end; topics never share entries.
pub trait EmbeddingCache: Send + Sync {
    /// Embeddings already admitted for a topic, in admission order.
    fn lookup(&self, topic: &str) -> &[Vec<f32>];

    fn insert(&mut self, topic: &str, embedding: Vec<f32>);
}

/// Default per-run cache backed by a plain map.
pub struct InMemoryCache {
    topics: HashMap<String, Vec<Vec<f32>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingCache for InMemoryCache {
    fn lookup(&self, topic: &str) -> &[Vec<f32>] {
        self.topics.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    fn insert(&mut self, topic: &str, embedding: Vec<f32>) {
        self.topics.entry(topic.to_string()).or_default().push(embedding);
    }
}

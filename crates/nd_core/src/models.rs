use async_trait::async_trait;

use crate::Result;

/// Abstractive summarization plus embedding generation. Any model that can
/// produce a short summary and a fixed-size vector for a text satisfies this.
#[async_trait]
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize a piece of article text.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Generate an embedding vector for a piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use nd_core::{InferenceModel, Result};

/// Offline model for tests and dry runs. Summaries are the leading sentences
/// of the text; embeddings are derived from length and character frequencies.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

#[async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let sentences: Vec<&str> = text
            .split(|c| c == '.' || c == '!' || c == '?')
            .filter(|s| !s.trim().is_empty())
            .take(3)
            .collect();

        Ok(sentences.join(". ") + ".")
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; 768];

        let text_len = text.len() as f32;
        if text_len == 0.0 {
            return Ok(embedding);
        }
        embedding[0] = text_len / 1000.0;

        let mut char_freq = HashMap::new();
        for c in text.chars() {
            *char_freq.entry(c).or_insert(0) += 1;
        }

        for (i, (_, &count)) in char_freq.iter().enumerate().take(767) {
            embedding[i + 1] = count as f32 / text_len;
        }

        Ok(embedding)
    }
}

use async_trait::async_trait;
use nd_core::{Error, Result, TextExtractor};
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

pub const DEFAULT_MIN_WORDS: usize = 50;

/// Downloads an article page and extracts its paragraph text. Articles with
/// fewer than `min_words` words are rejected as too short to summarize.
pub struct HtmlExtractor {
    client: Client,
    min_words: usize,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            min_words: DEFAULT_MIN_WORDS,
        }
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    fn body_text(html: &str) -> Result<String> {
        let document = Html::parse_document(html);

        // Prefer paragraphs inside an <article> element, fall back to all
        // paragraphs when the page has no semantic article markup.
        let article_paragraphs = Selector::parse("article p")
            .map_err(|e| Error::Extraction(format!("invalid selector: {}", e)))?;
        let all_paragraphs = Selector::parse("p")
            .map_err(|e| Error::Extraction(format!("invalid selector: {}", e)))?;

        let mut paragraphs: Vec<String> = document
            .select(&article_paragraphs)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if paragraphs.is_empty() {
            paragraphs = document
                .select(&all_paragraphs)
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }

        Ok(paragraphs.join("\n\n"))
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        Url::parse(url).map_err(|e| Error::Extraction(format!("invalid URL {}: {}", url, e)))?;

        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = Self::body_text(&html)?;
        let words = text.split_whitespace().count();
        if words < self.min_words {
            return Err(Error::Extraction(format!(
                "article too short ({} words): {}",
                words, url
            )));
        }

        Ok(text)
    }
}

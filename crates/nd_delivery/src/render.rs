use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use nd_core::{PersonalDigest, SummarizedArticle};

/// Visual style of the rendered newsletter. Both modes carry exactly the
/// same data; only presentation differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Card,
    Plain,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "card" => Ok(RenderMode::Card),
            "plain" => Ok(RenderMode::Plain),
            other => Err(format!("unknown render mode: {} (expected card or plain)", other)),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Card => write!(f, "card"),
            RenderMode::Plain => write!(f, "plain"),
        }
    }
}

pub fn subject(date: NaiveDate) -> String {
    format!("Your AI Newsletter for {}", date)
}

/// Renders a personalized digest into one self-contained HTML document:
/// date header, table of contents with per-article anchors, one section per
/// article, footer.
pub struct NewsletterRenderer {
    mode: RenderMode,
}

impl NewsletterRenderer {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn render(&self, digest: &PersonalDigest) -> String {
        match self.mode {
            RenderMode::Card => self.render_card(digest),
            RenderMode::Plain => self.render_plain(digest),
        }
    }

    /// Articles across all sections with their topic and a digest-wide index
    /// used for anchor ids. Both modes render from this same flattening.
    fn flatten(digest: &PersonalDigest) -> Vec<(usize, &str, &SummarizedArticle)> {
        digest
            .sections
            .iter()
            .flat_map(|section| {
                section
                    .articles
                    .iter()
                    .map(move |article| (section.topic.as_str(), article))
            })
            .enumerate()
            .map(|(i, (topic, article))| (i, topic, article))
            .collect()
    }

    fn render_plain(&self, digest: &PersonalDigest) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<body>\n");
        html.push_str("<h1>Your AI Newsletter</h1>\n");
        html.push_str(&format!("<p>{}</p>\n", digest.date));

        html.push_str("<h2>In this issue</h2>\n<ul>\n");
        for (index, topic, article) in Self::flatten(digest) {
            html.push_str(&format!(
                "<li><a href=\"#article-{}\">[{}] {}</a></li>\n",
                index,
                escape(topic),
                escape(&article.header)
            ));
        }
        html.push_str("</ul>\n<hr>\n");

        for (index, topic, article) in Self::flatten(digest) {
            html.push_str(&format!(
                "<h2 id=\"article-{}\">{}</h2>\n",
                index,
                escape(&article.header)
            ));
            html.push_str(&format!("<p><em>{}</em></p>\n", escape(topic)));
            html.push_str("<ul>\n");
            for bullet in summary_bullets(&article.summary) {
                html.push_str(&format!("<li>{}</li>\n", escape(&bullet)));
            }
            html.push_str("</ul>\n");
            html.push_str(&format!(
                "<p><a href=\"{}\">Read the full article</a></p>\n",
                article.url
            ));
        }

        html.push_str(&format!(
            "<hr>\n<p>{} articles across {} topics. You are receiving this because of your topic preferences.</p>\n",
            digest.total_articles,
            digest.sections.len()
        ));
        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_card(&self, digest: &PersonalDigest) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
        html.push_str(
            "body { font-family: Helvetica, Arial, sans-serif; background: #f4f4f7; margin: 0; }\n\
             .container { max-width: 640px; margin: 0 auto; padding: 24px; }\n\
             .masthead { text-align: center; padding-bottom: 16px; border-bottom: 2px solid #1a1a2e; }\n\
             .card { background: #ffffff; border-radius: 8px; padding: 20px; margin: 16px 0; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }\n\
             .topic { color: #5a5ad1; text-transform: uppercase; font-size: 12px; letter-spacing: 1px; }\n\
             .toc a { color: #1a1a2e; text-decoration: none; }\n\
             .footer { color: #8a8a9a; font-size: 12px; text-align: center; padding: 16px; }\n\
             img { max-width: 100%; border-radius: 4px; }\n",
        );
        html.push_str("</style>\n</head>\n<body>\n<div class=\"container\">\n");

        html.push_str("<div class=\"masthead\">\n<h1>Your AI Newsletter</h1>\n");
        html.push_str(&format!("<p>{}</p>\n</div>\n", digest.date));

        html.push_str("<div class=\"card toc\">\n<h2>In this issue</h2>\n<ul>\n");
        for (index, topic, article) in Self::flatten(digest) {
            html.push_str(&format!(
                "<li><a href=\"#article-{}\">[{}] {}</a></li>\n",
                index,
                escape(topic),
                escape(&article.header)
            ));
        }
        html.push_str("</ul>\n</div>\n");

        for (index, topic, article) in Self::flatten(digest) {
            html.push_str("<div class=\"card\">\n");
            html.push_str(&format!("<p class=\"topic\">{}</p>\n", escape(topic)));
            html.push_str(&format!(
                "<h2 id=\"article-{}\">{}</h2>\n",
                index,
                escape(&article.header)
            ));
            if let Some(image) = &article.image {
                html.push_str(&format!("<img src=\"{}\" alt=\"\">\n", image));
            }
            html.push_str("<ul>\n");
            for bullet in summary_bullets(&article.summary) {
                html.push_str(&format!("<li>{}</li>\n", escape(&bullet)));
            }
            html.push_str("</ul>\n");
            html.push_str(&format!(
                "<p><a href=\"{}\">Read the full article</a></p>\n</div>\n",
                article.url
            ));
        }

        html.push_str(&format!(
            "<div class=\"footer\">\n<p>{} articles across {} topics. You are receiving this because of your topic preferences.</p>\n</div>\n",
            digest.total_articles,
            digest.sections.len()
        ));
        html.push_str("</div>\n</body>\n</html>\n");
        html
    }
}

/// Split a summary into sentence bullets; a summary with no sentence
/// boundaries becomes a single bullet.
fn summary_bullets(summary: &str) -> Vec<String> {
    let bullets: Vec<String> = summary
        .split_inclusive(|c| c == '.' || c == '!' || c == '?')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if bullets.is_empty() {
        vec![summary.trim().to_string()]
    } else {
        bullets
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nd_core::{DigestSection, RawArticle};

    fn article(header: &str, summary: &str) -> SummarizedArticle {
        SummarizedArticle {
            header: header.to_string(),
            summary: summary.to_string(),
            url: format!("https://example.com/{}", header.to_lowercase().replace(' ', "-")),
            image: Some("https://example.com/img.jpg".to_string()),
            original: RawArticle {
                url: format!("https://example.com/{}", header),
                title: header.to_string(),
                published_at: Utc::now(),
                image_url: None,
                source_payload: serde_json::Value::Null,
            },
        }
    }

    fn digest() -> PersonalDigest {
        PersonalDigest {
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
            sections: vec![
                DigestSection {
                    topic: "tech".to_string(),
                    articles: vec![
                        article("Chips Ahead", "New chips. Faster still."),
                        article("Robots Rise", "Robots everywhere."),
                    ],
                },
                DigestSection {
                    topic: "sports".to_string(),
                    articles: vec![article("Final Score", "A close match.")],
                },
            ],
            total_articles: 3,
        }
    }

    #[test]
    fn subject_embeds_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert_eq!(subject(date), "Your AI Newsletter for 2025-07-04");
    }

    #[test]
    fn both_modes_carry_the_same_content() {
        let digest = digest();
        for mode in [RenderMode::Card, RenderMode::Plain] {
            let html = NewsletterRenderer::new(mode).render(&digest);
            // date header, TOC anchors, per-article anchored sections
            assert!(html.contains("2025-07-04"), "{mode}: missing date");
            for anchor in ["#article-0", "#article-1", "#article-2"] {
                assert!(html.contains(anchor), "{mode}: missing TOC link {anchor}");
            }
            for id in ["id=\"article-0\"", "id=\"article-1\"", "id=\"article-2\""] {
                assert!(html.contains(id), "{mode}: missing section {id}");
            }
            for header in ["Chips Ahead", "Robots Rise", "Final Score"] {
                assert!(html.contains(header), "{mode}: missing header {header}");
            }
            assert!(html.contains("https://example.com/chips-ahead"));
            assert!(html.contains("In this issue"));
            assert!(html.contains("3 articles across 2 topics"));
        }
    }

    #[test]
    fn anchors_are_numbered_across_sections() {
        let html = NewsletterRenderer::new(RenderMode::Plain).render(&digest());
        // The sports article continues the numbering started by tech.
        let toc_entry = "<a href=\"#article-2\">[sports] Final Score</a>";
        assert!(html.contains(toc_entry));
    }

    #[test]
    fn summaries_become_sentence_bullets() {
        assert_eq!(
            summary_bullets("New chips. Faster still."),
            vec!["New chips.", "Faster still."]
        );
        assert_eq!(summary_bullets("no terminator"), vec!["no terminator"]);
        assert_eq!(summary_bullets("One only!"), vec!["One only!"]);
    }

    #[test]
    fn html_in_headlines_is_escaped() {
        let mut d = digest();
        d.sections[0].articles[0].header = "<script>alert(1)</script> & more".to_string();
        let html = NewsletterRenderer::new(RenderMode::Card).render(&d);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
    }

    #[test]
    fn render_mode_parses_from_cli_names() {
        assert_eq!("card".parse::<RenderMode>().unwrap(), RenderMode::Card);
        assert_eq!("plain".parse::<RenderMode>().unwrap(), RenderMode::Plain);
        assert!("fancy".parse::<RenderMode>().is_err());
    }
}

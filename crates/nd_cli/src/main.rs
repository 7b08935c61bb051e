use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use nd_delivery::{DeliveryOrchestrator, NewsletterRenderer, RenderMode, SmtpMailer};
use nd_ingest::{HtmlExtractor, TheNewsApiClient};
use nd_pipeline::{Pipeline, PipelineConfig, DEFAULT_TOPICS};
use tracing::info;

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut number = String::new();

        for c in s.chars() {
            if c.is_ascii_digit() {
                number.push(c);
            } else if !c.is_whitespace() {
                let value: u64 = number
                    .parse()
                    .map_err(|_| format!("expected a number before '{}'", c))?;
                number.clear();
                total_seconds += match c {
                    's' => value,
                    'm' => value * 60,
                    'h' => value * 3600,
                    'd' => value * 86400,
                    _ => return Err(format!("invalid duration unit: {}", c)),
                };
            }
        }

        // A trailing bare number counts as seconds.
        if !number.is_empty() {
            total_seconds += number
                .parse::<u64>()
                .map_err(|_| "invalid number in duration".to_string())?;
        }

        if total_seconds == 0 {
            return Err("duration must be non-zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Document store backend: memory or sqlite (with the sqlite feature)
    #[arg(long, default_value = "memory")]
    storage: String,
    /// Inference model: deepseek or dummy
    #[arg(long, default_value = "deepseek")]
    model: String,
    /// API key for the inference model; falls back to DEEPSEEK_API_KEY
    #[arg(long)]
    api_key: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the daily digest pipeline to completion
    Run {
        /// Topics to process, comma separated
        #[arg(long, value_delimiter = ',')]
        topics: Option<Vec<String>>,
        /// Cosine similarity above which an article is a duplicate
        #[arg(long, default_value_t = nd_inference::DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f32,
        /// Newsletter style: card or plain
        #[arg(long, default_value = "card")]
        render_mode: RenderMode,
        /// Maximum same-day articles kept per topic
        #[arg(long, default_value_t = nd_ingest::fetch::DEFAULT_MAX_PER_TOPIC)]
        max_per_topic: usize,
        /// Repeat the run on this interval (e.g. 12h, 30m, 1d)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
}

#[tokio::main]
async fn main() -> nd_core::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let store = nd_storage::create_store(&cli.storage).await?;
    info!("💾 storage initialized (using {})", cli.storage);

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok());
    let model = nd_inference::create_model(&cli.model, api_key)?;
    info!("🧠 inference model initialized (using {})", model.name());

    match cli.command {
        Commands::Run {
            topics,
            threshold,
            render_mode,
            max_per_topic,
            interval,
        } => {
            let source = Arc::new(TheNewsApiClient::from_env()?.with_max_per_topic(max_per_topic));
            let extractor = Arc::new(HtmlExtractor::new());
            let transport = Arc::new(SmtpMailer::from_env()?);
            let orchestrator = DeliveryOrchestrator::new(
                store.clone(),
                transport,
                NewsletterRenderer::new(render_mode),
            );

            let config = PipelineConfig {
                topics: topics.unwrap_or_else(|| {
                    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
                }),
                similarity_threshold: threshold,
            };
            info!("🗞️ topics: {}", config.topics.join(", "));

            let pipeline = Pipeline::new(store, model, source, extractor, orchestrator, config);

            if let Some(interval) = interval {
                info!("running every {}s", interval.0.as_secs());
                loop {
                    if let Err(e) = pipeline.run(Utc::now().date_naive()).await {
                        tracing::error!("run failed: {}", e);
                    }
                    info!("waiting {}s until the next run", interval.0.as_secs());
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                let report = pipeline.run(Utc::now().date_naive()).await?;
                info!(
                    "done: {} digests built, {} newsletters sent, {} skipped, {} failed",
                    report.digests_built,
                    report.newsletters_sent,
                    report.newsletters_skipped,
                    report.newsletters_failed
                );
            }
        }
    }

    Ok(())
}

pub mod digest;
pub mod personalize;
pub mod preferences;
pub mod runner;

pub use digest::DigestBuilder;
pub use personalize::Personalizer;
pub use preferences::PreferenceResolver;
pub use runner::{Pipeline, PipelineConfig, RunReport, DEFAULT_TOPICS};

pub mod prelude {
    pub use super::digest::DigestBuilder;
    pub use super::personalize::Personalizer;
    pub use super::preferences::PreferenceResolver;
    pub use super::runner::{Pipeline, PipelineConfig, RunReport};
    pub use nd_core::{Result, TopicDigest};
}

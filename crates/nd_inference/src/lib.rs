pub mod dedup;
pub mod models;

pub use dedup::{DuplicateFilter, EmbeddingCache, InMemoryCache, DEFAULT_SIMILARITY_THRESHOLD};
pub use models::create_model;

pub mod prelude {
    pub use super::dedup::DuplicateFilter;
    pub use super::models::create_model;
    pub use nd_core::{Error, InferenceModel, Result};
}

use std::sync::Arc;

use nd_core::{DocumentStore, Error, Result};

pub mod backends;

pub use backends::*;

/// Select a document store backend by CLI name.
pub async fn create_store(kind: &str) -> Result<Arc<dyn DocumentStore>> {
    match kind {
        "memory" => Ok(Arc::new(backends::memory::MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(backends::sqlite::SqliteStore::new().await?)),
        other => Err(Error::Storage(format!("unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_store;
}

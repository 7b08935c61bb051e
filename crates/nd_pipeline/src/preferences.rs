use std::collections::HashMap;
use std::sync::Arc;

use nd_core::storage::collections;
use nd_core::{DocumentStore, Result, UserRecord};
use tracing::{info, warn};

/// Single pass over the subscriber profile collection. Subscribers without
/// topics are excluded; a malformed profile is skipped, not fatal.
pub struct PreferenceResolver {
    store: Arc<dyn DocumentStore>,
}

impl PreferenceResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_all(&self) -> Result<HashMap<String, Vec<String>>> {
        let users = self.store.list(collections::USERS).await?;

        let mut preferences = HashMap::new();
        for (user_id, document) in users {
            let user: UserRecord = match serde_json::from_value(document) {
                Ok(user) => user,
                Err(e) => {
                    warn!("skipping malformed profile {}: {}", user_id, e);
                    continue;
                }
            };
            if user.topics.is_empty() {
                continue;
            }
            preferences.insert(user_id, user.topics);
        }

        info!("resolved preferences for {} subscribers", preferences.len());
        Ok(preferences)
    }
}

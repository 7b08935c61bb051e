use std::sync::Arc;

use nd_core::storage::{collections, fetch_document, newsletter_key, upsert_document};
use nd_core::{DocumentStore, EmailTransport, NewsletterRecord, UserRecord};
use tracing::{error, info, warn};

use crate::render::{subject, NewsletterRenderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Sent,
    Skipped(String),
    Failed(String),
}

/// Sends one subscriber's newsletter and records delivery state. At most one
/// successful send is ever marked per (subscriber, date): a stored record
/// with `delivered == true` short-circuits before any transport call, and
/// `delivered` is only persisted after the transport confirms success.
pub struct DeliveryOrchestrator {
    store: Arc<dyn DocumentStore>,
    transport: Arc<dyn EmailTransport>,
    renderer: NewsletterRenderer,
}

impl DeliveryOrchestrator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        transport: Arc<dyn EmailTransport>,
        renderer: NewsletterRenderer,
    ) -> Self {
        Self {
            store,
            transport,
            renderer,
        }
    }

    pub async fn deliver(&self, record: &NewsletterRecord) -> DeliveryResult {
        let key = newsletter_key(&record.user_id, record.date);

        // Already-delivered guard: a rerun must not double-send.
        match fetch_document::<NewsletterRecord>(self.store.as_ref(), collections::NEWSLETTERS, &key)
            .await
        {
            Ok(Some(existing)) if existing.delivered => {
                return DeliveryResult::Skipped("already delivered".to_string());
            }
            Ok(_) => {}
            Err(e) => {
                return DeliveryResult::Failed(format!("could not check delivery state: {}", e));
            }
        }

        let user = match fetch_document::<UserRecord>(
            self.store.as_ref(),
            collections::USERS,
            &record.user_id,
        )
        .await
        {
            Ok(Some(user)) => user,
            Ok(None) => return DeliveryResult::Skipped("unknown subscriber".to_string()),
            Err(e) => return DeliveryResult::Failed(format!("profile lookup failed: {}", e)),
        };

        let Some(email) = user.email.filter(|address| !address.is_empty()) else {
            return DeliveryResult::Skipped("no email address".to_string());
        };

        let subject = subject(record.date);
        let html = self.renderer.render(&record.content);

        if let Err(e) = self.transport.send(&email, &subject, &html).await {
            warn!("send failed for {}: {}", record.user_id, e);
            return DeliveryResult::Failed(e.to_string());
        }

        let mut delivered = record.clone();
        delivered.delivered = true;
        if let Err(e) = upsert_document(
            self.store.as_ref(),
            collections::NEWSLETTERS,
            &key,
            &delivered,
        )
        .await
        {
            // The email went out but the store write failed; a rerun may
            // attempt this subscriber again.
            error!(
                "sent newsletter for {} but failed to record delivery: {}",
                record.user_id, e
            );
            return DeliveryResult::Failed(format!("delivery state not recorded: {}", e));
        }

        info!(
            "📬 delivered newsletter for {} ({} articles)",
            record.user_id, record.content.total_articles
        );
        DeliveryResult::Sent
    }
}

use async_trait::async_trait;

use crate::Result;

/// Outbound email capability.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

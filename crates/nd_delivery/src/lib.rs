pub mod orchestrator;
pub mod render;
pub mod smtp;

pub use orchestrator::{DeliveryOrchestrator, DeliveryResult};
pub use render::{subject, NewsletterRenderer, RenderMode};
pub use smtp::SmtpMailer;

pub mod prelude {
    pub use super::orchestrator::{DeliveryOrchestrator, DeliveryResult};
    pub use super::render::{NewsletterRenderer, RenderMode};
    pub use super::smtp::SmtpMailer;
    pub use nd_core::{EmailTransport, Result};
}

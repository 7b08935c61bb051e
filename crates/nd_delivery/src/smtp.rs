use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use nd_core::{EmailTransport, Error, Result};

const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT_SECS: u64 = 10;

/// SMTP transport over a STARTTLS relay. lettre's transport is blocking, so
/// sends run under spawn_blocking to keep the runtime free.
#[derive(Clone)]
pub struct SmtpMailer {
    server: String,
    port: u16,
    from: String,
    username: String,
    password: String,
}

impl SmtpMailer {
    /// Reads DIGEST_SMTP_SERVER, DIGEST_SMTP_PORT (default 587),
    /// DIGEST_SMTP_FROM, DIGEST_SMTP_USERNAME and DIGEST_SMTP_PASSWORD.
    /// Missing credentials are a fatal startup error.
    pub fn from_env() -> Result<Self> {
        let server = require_env("DIGEST_SMTP_SERVER")?;
        let from = require_env("DIGEST_SMTP_FROM")?;
        let username = require_env("DIGEST_SMTP_USERNAME")?;
        let password = require_env("DIGEST_SMTP_PASSWORD")?;
        let port = match std::env::var("DIGEST_SMTP_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| Error::Delivery(format!("invalid DIGEST_SMTP_PORT: {}", port)))?,
            Err(_) => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            server,
            port,
            from,
            username,
            password,
        })
    }

    fn send_blocking(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let email = Message::builder()
            .from(self
                .from
                .parse()
                .map_err(|e| Error::Delivery(format!("invalid from address: {}", e)))?)
            .to(to
                .parse()
                .map_err(|e| Error::Delivery(format!("invalid recipient {}: {}", to, e)))?)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| Error::Delivery(format!("failed to build message: {}", e)))?;

        let credentials = Credentials::new(self.username.clone(), self.password.clone());
        let mailer = SmtpTransport::starttls_relay(&self.server)
            .map_err(|e| Error::Delivery(format!("invalid SMTP relay {}: {}", self.server, e)))?
            .port(self.port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT_SECS)))
            .build();

        mailer
            .send(&email)
            .map_err(|e| Error::Delivery(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Delivery(format!("{} is not set", name)))
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let mailer = self.clone();
        let to = to.to_string();
        let subject = subject.to_string();
        let html_body = html_body.to_string();

        tokio::task::spawn_blocking(move || mailer.send_blocking(&to, &subject, &html_body))
            .await
            .map_err(|e| Error::Delivery(format!("send task failed: {}", e)))?
    }
}

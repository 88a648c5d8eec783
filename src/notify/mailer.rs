use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use serde_json::json;

use crate::config::{ResendConfig, SmtpConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one HTML message. Returns the provider's message id when it reports one.
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String>;
}

/// Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: Option<String>,
}

impl ResendMailer {
    pub fn new(config: &ResendConfig, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build Resend client: {e}"))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String> {
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": &email.from,
                "to": [&email.to],
                "subject": &email.subject,
                "html": &email.html,
            }))
            .send()
            .await
            .map_err(|e| format!("Resend request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(1024)
                .collect::<String>();
            return Err(format!("Resend returned {}: {body}", status.as_u16()));
        }

        let body: ResendResponse = resp
            .json()
            .await
            .map_err(|e| format!("Invalid Resend response: {e}"))?;

        Ok(body.id)
    }
}

/// SMTP relay over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String> {
        let message = Message::builder()
            .from(
                email
                    .from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(email.to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(None)
    }
}

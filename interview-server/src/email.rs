use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

const RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Email provider is not configured. Set RESEND_API_KEY and RESEND_FROM_EMAIL.")]
    NotConfigured,
    #[error("Email send failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Email send failed: {0}")]
    Api(String),
}

/// Outbound plaintext mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

pub struct ResendMailer {
    client: Client,
    api_key: Option<String>,
    from_email: Option<String>,
    api_url: String,
}

impl ResendMailer {
    pub fn new(api_key: Option<String>, from_email: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from_email,
            api_url: RESEND_URL.to_string(),
        }
    }

    /// Point delivery at a different endpoint (tests).
    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), MailError> {
        let (Some(api_key), Some(from_email)) = (&self.api_key, &self.from_email) else {
            return Err(MailError::NotConfigured);
        };

        let request = ResendRequest {
            from: from_email,
            to: [to],
            subject,
            text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            let detail = if detail.is_empty() {
                status.to_string()
            } else {
                detail
            };
            return Err(MailError::Api(detail));
        }

        Ok(())
    }
}

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::MailConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mail provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Outbound transactional mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Resend HTTP API client.
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            from: cfg.from.clone(),
        })
    }

    fn payload<'a>(&'a self, email: &'a Email) -> ResendPayload<'a> {
        ResendPayload {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(email))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(MailError::Status {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(to = %email.to, "mail accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_wraps_recipient_in_a_list() {
        let mailer = ResendMailer::new(&MailConfig {
            api_key: "re_test".into(),
            api_url: "https://api.resend.com/emails".into(),
            from: "MedDigest <newsletter@meddigest.io>".into(),
        })
        .unwrap();
        let email = Email {
            to: "a@x.com".into(),
            subject: "Hi".into(),
            html: "<p>hi</p>".into(),
        };
        let json = serde_json::to_value(mailer.payload(&email)).unwrap();
        assert_eq!(json["from"], "MedDigest <newsletter@meddigest.io>");
        assert_eq!(json["to"], serde_json::json!(["a@x.com"]));
        assert_eq!(json["subject"], "Hi");
        assert_eq!(json["html"], "<p>hi</p>");
    }
}

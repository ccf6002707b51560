// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound email for contact and newsletter notifications.

pub mod templates;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// A message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Email provider request failed: {0}")]
    Transport(String),

    #[error("Email provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Sends email. Failures are returned, never panicked.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Whether the mailer can deliver at all.
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;

    /// Send several messages concurrently; results are in input order.
    async fn send_many(&self, messages: Vec<EmailMessage>) -> Vec<Result<(), EmailError>> {
        join_all(messages.into_iter().map(|message| self.send(message))).await
    }
}

/// Request body accepted by the Resend API.
#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let payload = ResendPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
            reply_to: message.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Email provider unreachable");
                EmailError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(to = ?message.to, subject = %message.subject, "Email sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), %body, "Email provider rejected message");
        Err(EmailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Stand-in used when no provider key is configured.
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send(&self, _message: EmailMessage) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records messages and fails those addressed to `fail_to`.
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail_to: &'static str,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
            let fail = message.to.iter().any(|t| t == self.fail_to);
            self.sent.lock().unwrap().push(message);
            if fail {
                Err(EmailError::Transport("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: vec![to.to_string()],
            subject: "s".to_string(),
            html: "<p>h</p>".to_string(),
            text: "h".to_string(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn test_send_many_preserves_order_and_isolates_failures() {
        let mailer = RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail_to: "b@example.com",
        };

        let results = mailer
            .send_many(vec![message("a@example.com"), message("b@example.com")])
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EmailError::Transport(_))));
        assert_eq!(mailer.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_reports_not_configured() {
        let mailer = UnconfiguredMailer;
        assert!(!mailer.is_configured());
        assert_eq!(
            mailer.send(message("a@example.com")).await,
            Err(EmailError::NotConfigured)
        );
    }

    #[test]
    fn test_payload_omits_missing_reply_to() {
        let to = vec!["a@example.com".to_string()];
        let payload = ResendPayload {
            from: "Site <noreply@example.com>",
            to: &to,
            subject: "s",
            html: "h",
            text: "t",
            reply_to: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("reply_to").is_none());
        assert_eq!(json["to"][0], "a@example.com");
    }
}

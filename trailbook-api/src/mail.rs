/// Outbound email
///
/// Mail goes out through an HTTP mail API, consumed as a black box: one POST
/// with a bearer credential and a JSON payload. The `Mailer` trait is the
/// seam; handlers never talk to the transport directly, so tests can swap in
/// a recording stub. Bodies are plain text.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::MailConfig;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider rejected the message
    #[error("mail provider rejected the message: {status}")]
    Rejected { status: u16 },
}

/// Outbound mail seam
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one plain-text message
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Message payload for the HTTP mail API
#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Production mailer posting to the configured HTTP mail API
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&OutboundMessage {
                from: &self.config.from,
                to,
                subject,
                text: body,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::Rejected {
                status: response.status().as_u16(),
            });
        }

        tracing::debug!(to, subject, "email sent");
        Ok(())
    }
}

/// Sends the post-signup welcome message
pub async fn send_welcome(mailer: &dyn Mailer, to: &str, name: &str) -> Result<(), MailError> {
    let body = format!(
        "Hi {name},\n\n\
         Welcome to Trailbook! We're glad to have you on board.\n\
         Browse the tours and book your first adventure whenever you're ready.\n\n\
         The Trailbook team"
    );
    mailer.send(to, "Welcome to Trailbook!", &body).await
}

/// Sends the password-reset message carrying the raw token URL
///
/// `reset_url` already embeds the plaintext token; only its hash exists in
/// the database.
pub async fn send_password_reset(
    mailer: &dyn Mailer,
    to: &str,
    reset_url: &str,
) -> Result<(), MailError> {
    let body = format!(
        "Forgot your password?\n\n\
         Submit a PATCH request with your new password and password_confirm to:\n\
         {reset_url}\n\n\
         The link is valid for 10 minutes. If you didn't forget your password,\n\
         please ignore this email."
    );
    mailer
        .send(to, "Your password reset token (valid for 10 minutes)", &body)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records sent messages instead of delivering them
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
            self.sent.lock().unwrap().push((
                to.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_welcome_mail_contents() {
        let mailer = RecordingMailer::default();
        send_welcome(&mailer, "jonas@example.com", "Jonas")
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (to, subject, body) = &sent[0];
        assert_eq!(to, "jonas@example.com");
        assert!(subject.contains("Welcome"));
        assert!(body.contains("Hi Jonas"));
    }

    #[tokio::test]
    async fn test_reset_mail_carries_the_url() {
        let mailer = RecordingMailer::default();
        let url = "https://trailbook.dev/api/v1/users/reset-password/abc123";
        send_password_reset(&mailer, "jonas@example.com", url)
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        let (_, subject, body) = &sent[0];
        assert!(subject.contains("10 minutes"));
        assert!(body.contains(url));
    }

    #[test]
    fn test_outbound_message_shape() {
        let msg = OutboundMessage {
            from: "Trailbook <hello@trailbook.dev>",
            to: "jonas@example.com",
            subject: "s",
            text: "t",
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["from"], "Trailbook <hello@trailbook.dev>");
        assert_eq!(json["to"], "jonas@example.com");
        assert_eq!(json["text"], "t");
    }
}

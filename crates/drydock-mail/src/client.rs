//! Transactional email client
//!
//! Talks to a Resend-style HTTP API: a JSON POST to `/emails` with a
//! bearer API key. When sending is disabled (local development) the
//! message is logged instead.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::MailError;

/// Mailer configuration
#[derive(Clone, Debug)]
pub struct MailerConfig {
    /// Base URL of the email API
    pub api_base: String,
    /// API key for the email service
    pub api_key: String,
    /// Sender address, e.g. `Drydock <no-reply@example.com>`
    pub from: String,
    /// When false, messages are logged rather than sent
    pub enabled: bool,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Email API client
pub struct Mailer {
    config: MailerConfig,
    client: Client,
}

impl Mailer {
    /// Create a new mailer
    pub fn new(config: MailerConfig) -> Result<Self, MailError> {
        if config.enabled && config.api_key.is_empty() {
            return Err(MailError::Configuration(
                "Mail sending enabled but no API key configured".to_string(),
            ));
        }

        let client = Client::builder().build()?;

        info!("Created mail client for {}", config.api_base);

        Ok(Self { config, client })
    }

    /// Send one HTML message
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if !self.config.enabled {
            info!("Mail sending disabled, would send '{}' to {}", subject, to);
            return Ok(());
        }

        let request = SendEmailRequest {
            from: &self.config.from,
            to: vec![to],
            subject,
            html,
        };

        let response = self
            .client
            .post(format!(
                "{}/emails",
                self.config.api_base.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SendEmailResponse = response.json().await?;
        debug!("Sent '{}' to {} (id: {:?})", subject, to, body.id);

        Ok(())
    }

    /// Send a registration verification code
    pub async fn send_otp_email(
        &self,
        to: &str,
        name: &str,
        code: &str,
    ) -> Result<(), MailError> {
        let html = format!(
            r#"<html><body>
<h2>Hello {name},</h2>
<p>Thank you for registering as a mechanic. To complete your registration,
please verify your email address with this code:</p>
<p style="font-size:32px;font-weight:bold;letter-spacing:5px;">{code}</p>
<p>The code is valid for 15 minutes. If you didn't request this, please
ignore this email.</p>
</body></html>"#
        );

        self.send(to, "Verify your mechanic registration", &html)
            .await
    }

    /// Send a password reset link
    pub async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        reset_link: &str,
    ) -> Result<(), MailError> {
        let html = format!(
            r#"<html><body>
<h2>Hello {name},</h2>
<p>We received a request to reset your password. Follow this link to choose
a new one:</p>
<p><a href="{reset_link}">{reset_link}</a></p>
<p>The link is valid for 15 minutes. If you didn't request this, please
ignore this email.</p>
</body></html>"#
        );

        self.send(to, "Reset your password", &html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_mailer_needs_no_key() {
        let mailer = Mailer::new(MailerConfig {
            api_base: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: "Drydock <no-reply@example.com>".to_string(),
            enabled: false,
        });
        assert!(mailer.is_ok());
    }

    #[test]
    fn test_enabled_mailer_requires_key() {
        let mailer = Mailer::new(MailerConfig {
            api_base: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: "Drydock <no-reply@example.com>".to_string(),
            enabled: true,
        });
        assert!(matches!(mailer, Err(MailError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_disabled_send_is_a_noop() {
        let mailer = Mailer::new(MailerConfig {
            api_base: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: "Drydock <no-reply@example.com>".to_string(),
            enabled: false,
        })
        .unwrap();

        mailer
            .send_otp_email("john@example.com", "John", "123456")
            .await
            .unwrap();
    }
}

//! Email delivery
//!
//! Verification codes leave the system through the [`Mailer`] trait so the
//! rest of the service layer never touches SMTP directly. The production
//! implementation relays over SMTP with credentials from static
//! configuration; tests substitute an in-memory recorder.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

/// Outbound delivery channel for verification codes.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a verification code to the given address.
    async fn send_verification_code(&self, to: &str, code: u32) -> Result<()>;
}

/// SMTP-backed mailer configured from [`EmailConfig`].
pub struct SmtpMailer {
    smtp_host: String,
    smtp_port: u16,
    smtp_username: String,
    smtp_password: String,
    from: String,
}

impl SmtpMailer {
    /// Create a mailer from email configuration.
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            smtp_username: config.smtp_username.clone(),
            smtp_password: config.smtp_password.clone(),
            from: format!("{} <{}>", config.from_name, config.from_address),
        }
    }

    /// Whether an SMTP host has been configured.
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.is_empty()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_code(&self, to: &str, code: u32) -> Result<()> {
        if !self.is_configured() {
            return Err(anyhow!(
                "SMTP host not configured. Set email.smtp_host or REVIVA_EMAIL_SMTP_HOST."
            ));
        }

        let body = format!("Your verification code is: {}", code);

        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(to
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject("Your Verification Code")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let creds = Credentials::new(self.smtp_username.clone(), self.smtp_password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                .credentials(creds)
                .port(self.smtp_port)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> SmtpMailer {
        SmtpMailer::new(&EmailConfig {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "no-reply@reviva.local".to_string(),
            from_name: "Reviva".to_string(),
        })
    }

    #[test]
    fn test_is_configured() {
        assert!(!unconfigured().is_configured());

        let mailer = SmtpMailer::new(&EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            ..Default::default()
        });
        assert!(mailer.is_configured());
    }

    #[tokio::test]
    async fn test_send_without_host_fails() {
        let mailer = unconfigured();

        let result = mailer.send_verification_code("user@example.com", 12345).await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("SMTP host not configured"));
    }

    #[test]
    fn test_from_header_combines_name_and_address() {
        let mailer = SmtpMailer::new(&EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            from_address: "codes@reviva.test".to_string(),
            from_name: "Reviva Codes".to_string(),
            ..Default::default()
        });

        assert_eq!(mailer.from, "Reviva Codes <codes@reviva.test>");
    }
}

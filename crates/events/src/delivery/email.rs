//! Client emails via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send the two
//! plain-text mails of the preview flow: the magic link and the "your
//! previews are ready" announcement. If `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and no mailer is constructed.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use cadenza_core::types::Timestamp;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "previews@cadenza.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default                  |
    /// |-----------------|----------|--------------------------|
    /// | `SMTP_HOST`     | yes      | -                        |
    /// | `SMTP_PORT`     | no       | `587`                    |
    /// | `SMTP_FROM`     | no       | `previews@cadenza.local` |
    /// | `SMTP_USER`     | no       | -                        |
    /// | `SMTP_PASSWORD` | no       | -                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Message bodies
// ---------------------------------------------------------------------------

/// Subject and body of the magic-link mail.
pub fn magic_link_message(link: &str) -> (String, String) {
    (
        "Seu acesso à prévia".to_string(),
        format!(
            "Olá!\n\nUse o link abaixo para acessar a prévia da sua música:\n\n{link}\n\n\
             Se você não pediu este acesso, ignore este email."
        ),
    )
}

/// Subject and body of the "previews are ready" mail.
pub fn preview_ready_message(
    client_name: &str,
    project_title: &str,
    preview_url: &str,
    expires_at: Timestamp,
) -> (String, String) {
    (
        format!("Sua prévia está pronta: {project_title}"),
        format!(
            "Olá, {client_name}!\n\nAs versões de \"{project_title}\" estão prontas para você ouvir:\n\n\
             {preview_url}\n\nO link é válido até {}.",
            expires_at.format("%d/%m/%Y")
        ),
    )
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

pub struct EmailDelivery {
    from_address: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (config.smtp_user, config.smtp_password) {
            transport_builder = transport_builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            from_address: config.from_address,
            mailer: transport_builder.build(),
        })
    }

    pub async fn send_magic_link(&self, to_email: &str, link: &str) -> Result<(), EmailError> {
        let (subject, body) = magic_link_message(link);
        self.send(to_email, subject, body).await
    }

    pub async fn send_preview_ready(
        &self,
        to_email: &str,
        client_name: &str,
        project_title: &str,
        preview_url: &str,
        expires_at: Timestamp,
    ) -> Result<(), EmailError> {
        let (subject, body) =
            preview_ready_message(client_name, project_title, preview_url, expires_at);
        self.send(to_email, subject, body).await
    }

    async fn send(&self, to_email: &str, subject: String, body: String) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.mailer.send(email).await?;
        tracing::info!(to = to_email, "Email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn magic_link_body_contains_link() {
        let (subject, body) = magic_link_message("https://musica.example.com/preview/P123");
        assert!(!subject.is_empty());
        assert!(body.contains("https://musica.example.com/preview/P123"));
    }

    #[test]
    fn preview_ready_body_mentions_expiry() {
        let expires = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let (subject, body) =
            preview_ready_message("Ana", "Parabéns", "https://x.test/preview/P1", expires);
        assert!(subject.contains("Parabéns"));
        assert!(body.contains("Olá, Ana!"));
        assert!(body.contains("09/03/2026"));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn email_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = EmailError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }
}

use cadenza_core::grant::DEFAULT_PREVIEW_CODE_TTL_DAYS;
use cadenza_core::token::TokenCodec;
use cadenza_events::{EmailConfig, WebhookConfig};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public site that serves the preview pages; preview links point here.
    pub public_site_url: String,
    pub preview: PreviewTokenConfig,
    /// Operator JWT configuration.
    pub jwt: JwtConfig,
    pub webhook: WebhookConfig,
    /// `None` disables the magic-link endpoint and preview-ready mails.
    pub email: Option<EmailConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `PUBLIC_SITE_URL`      | `http://localhost:5173`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_site_url = std::env::var("PUBLIC_SITE_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_site_url,
            preview: PreviewTokenConfig::from_env(),
            jwt: JwtConfig::from_env(),
            webhook: WebhookConfig::from_env(),
            email: EmailConfig::from_env(),
        }
    }

    /// Link sent to the client for `project_id`.
    pub fn preview_url(&self, project_id: &str, token: &str) -> String {
        cadenza_core::token::link_with_token(
            &format!("{}/preview/{project_id}", self.public_site_url),
            token,
        )
    }
}

/// Preview token settings.
#[derive(Debug, Clone)]
pub struct PreviewTokenConfig {
    /// When set, tokens are HMAC-signed and unsigned tokens are rejected.
    pub secret: Option<String>,
    /// Lifetime of a freshly minted preview code.
    pub code_ttl_days: i64,
}

impl Default for PreviewTokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            code_ttl_days: DEFAULT_PREVIEW_CODE_TTL_DAYS,
        }
    }
}

impl PreviewTokenConfig {
    /// | Env Var                 | Default |
    /// |-------------------------|---------|
    /// | `PREVIEW_TOKEN_SECRET`  | unset   |
    /// | `PREVIEW_CODE_TTL_DAYS` | `7`     |
    pub fn from_env() -> Self {
        let secret = std::env::var("PREVIEW_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let code_ttl_days: i64 = std::env::var("PREVIEW_CODE_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_PREVIEW_CODE_TTL_DAYS.to_string())
            .parse()
            .expect("PREVIEW_CODE_TTL_DAYS must be a valid i64");
        assert!(code_ttl_days > 0, "PREVIEW_CODE_TTL_DAYS must be positive");

        Self {
            secret,
            code_ttl_days,
        }
    }

    pub fn codec(&self) -> TokenCodec {
        TokenCodec::from_secret(self.secret.clone())
    }
}

use std::time::Duration;

use chrono::Duration as ChronoDuration;

use cadenza_core::grant::DEFAULT_GRANT_TTL_DAYS;

/// Preview client configuration.
#[derive(Debug, Clone)]
pub struct PreviewClientConfig {
    /// Base URL of the backend of record, without trailing slash.
    pub api_url: String,
    /// Public site serving the preview pages; magic links redirect here.
    pub site_url: String,
    /// Bound on every backend call.
    pub backend_timeout: Duration,
    /// Lifetime of a locally stored access grant.
    pub grant_ttl: ChronoDuration,
}

impl Default for PreviewClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            site_url: "http://localhost:5173".into(),
            backend_timeout: Duration::from_secs(15),
            grant_ttl: ChronoDuration::days(DEFAULT_GRANT_TTL_DAYS),
        }
    }
}

impl PreviewClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `CADENZA_API_URL`              | `http://localhost:3000` |
    /// | `CADENZA_SITE_URL`             | `http://localhost:5173` |
    /// | `CADENZA_BACKEND_TIMEOUT_SECS` | `15`                    |
    /// | `CADENZA_GRANT_TTL_DAYS`       | `14`                    |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = std::env::var("CADENZA_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let site_url = std::env::var("CADENZA_SITE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.site_url);

        let backend_timeout_secs: u64 = std::env::var("CADENZA_BACKEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("CADENZA_BACKEND_TIMEOUT_SECS must be a valid u64");

        let grant_ttl_days: i64 = std::env::var("CADENZA_GRANT_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_GRANT_TTL_DAYS.to_string())
            .parse()
            .expect("CADENZA_GRANT_TTL_DAYS must be a valid i64");

        Self {
            api_url,
            site_url,
            backend_timeout: Duration::from_secs(backend_timeout_secs),
            grant_ttl: ChronoDuration::days(grant_ttl_days),
        }
    }

    /// Page a magic link for `project_id` brings the client back to.
    pub fn preview_url(&self, project_id: &str) -> String {
        format!("{}/preview/{project_id}", self.site_url)
    }

    pub fn uses_https(&self) -> bool {
        self.site_url.starts_with("https://")
    }
}

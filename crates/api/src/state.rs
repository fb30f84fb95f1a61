use std::sync::Arc;

use cadenza_core::token::TokenCodec;
use cadenza_events::Notifier;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: cadenza_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Issues and checks preview tokens; signed when a secret is configured.
    pub codec: Arc<TokenCodec>,
    /// Webhook and email channels.
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(pool: cadenza_db::DbPool, config: ServerConfig, notifier: Notifier) -> Self {
        let codec = config.preview.codec();
        Self {
            pool,
            config: Arc::new(config),
            codec: Arc::new(codec),
            notifier,
        }
    }
}

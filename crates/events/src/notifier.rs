//! Fans preview events out to the configured channels.

use std::sync::Arc;

use crate::delivery::email::{EmailConfig, EmailDelivery};
use crate::delivery::webhook::{WebhookConfig, WebhookDelivery};
use crate::event::PreviewEvent;

/// Holds whichever delivery channels are configured. Cheap to clone.
#[derive(Clone, Default)]
pub struct Notifier {
    webhook: Option<Arc<WebhookDelivery>>,
    email: Option<Arc<EmailDelivery>>,
}

impl Notifier {
    /// Build the channels from explicit configuration. A channel that cannot
    /// be constructed is logged and left disabled.
    pub fn new(webhook: WebhookConfig, email: Option<EmailConfig>) -> Self {
        let webhook = if webhook.is_active() {
            match WebhookDelivery::new(webhook) {
                Ok(delivery) => Some(Arc::new(delivery)),
                Err(e) => {
                    tracing::error!(error = %e, "Webhook delivery disabled");
                    None
                }
            }
        } else {
            None
        };

        let email = email.and_then(|config| match EmailDelivery::new(config) {
            Ok(delivery) => Some(Arc::new(delivery)),
            Err(e) => {
                tracing::error!(error = %e, "Email delivery disabled");
                None
            }
        });

        tracing::info!(
            webhook = webhook.is_some(),
            email = email.is_some(),
            "Notification channels configured"
        );
        Self { webhook, email }
    }

    /// No channels at all.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn webhook_enabled(&self) -> bool {
        self.webhook.is_some()
    }

    pub fn email(&self) -> Option<&EmailDelivery> {
        self.email.as_deref()
    }

    /// Deliver `event` to the webhook in the background. Returns whether a
    /// delivery was scheduled.
    pub fn publish(&self, event: PreviewEvent) -> bool {
        let Some(webhook) = self.webhook.clone() else {
            tracing::debug!(event_type = %event.event_type, "No webhook configured, event dropped");
            return false;
        };

        tokio::spawn(async move {
            if let Err(e) = webhook.deliver(&event).await {
                tracing::error!(
                    project_id = %event.project_id,
                    event_type = %event.event_type,
                    error = %e,
                    "Preview event not delivered"
                );
            }
        });
        true
    }
}

//! Outbound notifications for the preview workflow.
//!
//! - [`PreviewEvent`]: envelope for feedback, approval and notification events.
//! - [`delivery`]: signed webhook delivery and SMTP email.
//! - [`Notifier`]: fans events out to the configured channels.

pub mod delivery;
pub mod event;
pub mod notifier;

pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::webhook::{WebhookConfig, WebhookDelivery, WebhookError};
pub use event::PreviewEvent;
pub use notifier::Notifier;

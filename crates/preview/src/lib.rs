//! Client-side core of the Cadenza preview page.
//!
//! - [`credentials`]: remembers preview access across visits, with storage
//!   fallbacks for private browsing.
//! - [`auth`]: preview auth controller with local and backend-verified trust.
//! - [`reconcile`]: picks the backend, cached or demo copy of a project.
//! - [`workflow`]: feedback and approval actions.
//! - [`http`]: client for the `cadenza-api` backend of record.
//! - [`session`]: wires all of the above for one page load.

pub mod auth;
pub mod backend;
pub mod config;
pub mod cookie;
pub mod credentials;
pub mod error;
pub mod http;
pub mod memory;
pub mod private_mode;
pub mod reconcile;
pub mod session;
pub mod storage;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use auth::{AuthNotice, AuthState, PreviewAuthController, TrustLevel};
pub use config::PreviewClientConfig;
pub use error::{BackendError, PreviewError};
pub use http::PreviewApiClient;
pub use memory::MemoryBackend;
pub use reconcile::{LoadedProject, ProjectOrigin, SyncReconciler};
pub use session::{BrowserStorage, PreviewBackend, PreviewSession};
pub use workflow::ProjectWorkflow;

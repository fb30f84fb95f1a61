//! Domain core for the Cadenza preview access and approval workflow.
//!
//! Pure logic only: no I/O, no clocks beyond `chrono::Utc::now`. Shared by
//! the preview client (`cadenza-preview`) and the backend of record
//! (`cadenza-api` / `cadenza-db`).

pub mod access;
pub mod error;
pub mod grant;
pub mod hashing;
pub mod project;
pub mod status;
pub mod token;
pub mod types;
pub mod wire;

//! Row structs and insert DTOs.
//!
//! Each submodule holds a `FromRow` struct matching the table and, where
//! rows are written, a DTO carrying the insert fields.

pub mod access_log;
pub mod feedback;
pub mod preview_code;
pub mod project;
pub mod version;

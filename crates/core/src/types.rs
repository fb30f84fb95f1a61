/// Surrogate keys for append-only rows (feedback entries, access logs).
pub type DbId = i64;

/// Projects are addressed by short external identifiers (e.g. `P123`).
pub type ProjectId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

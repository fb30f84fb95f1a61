//! Zero-sized repositories over `&PgPool`.

pub mod access_log_repo;
pub mod feedback_repo;
pub mod preview_code_repo;
pub mod project_repo;
pub mod version_repo;

pub use access_log_repo::AccessLogRepo;
pub use feedback_repo::FeedbackRepo;
pub use preview_code_repo::PreviewCodeRepo;
pub use project_repo::ProjectRepo;
pub use version_repo::VersionRepo;

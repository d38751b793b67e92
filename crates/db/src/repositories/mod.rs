//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod cron_log_repo;
pub mod document_repo;
pub mod email_log_repo;
pub mod user_repo;

pub use cron_log_repo::CronLogRepo;
pub use document_repo::DocumentRepo;
pub use email_log_repo::EmailLogRepo;
pub use user_repo::UserRepo;

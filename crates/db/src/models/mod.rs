//! Row models and insert DTOs.

pub mod audit;
pub mod document;

pub use audit::{CronLog, EmailLog, EmailStats, NewCronLog, NewEmailLog};
pub use document::DocumentRecord;

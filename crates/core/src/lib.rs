//! Domain logic for the document-portal reminder service.
//!
//! This crate is pure: no I/O, no async. It provides the expiry window
//! calculator and milestone bucketing used by both reminder jobs, plus the
//! shared domain error and type aliases.

pub mod error;
pub mod expiry;
pub mod types;

pub use error::CoreError;
pub use expiry::{ExpiryWindow, MilestoneBucket};

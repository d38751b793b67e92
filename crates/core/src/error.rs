//! Domain-level error type shared across crates.

/// Domain errors produced below the HTTP layer.
///
/// The API crate maps these onto HTTP status codes; see `AppError` there.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed a domain validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller is not allowed to perform the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

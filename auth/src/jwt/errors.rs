use thiserror::Error;

/// Error type for JWT operations.
///
/// Every verification failure (malformed, wrong signature, wrong algorithm,
/// expired, bad claims) collapses into `InvalidToken`. The message is for logs
/// only and must not be sent to callers.
#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Missing token")]
    MissingToken,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),
}

use thiserror::Error;

/// Error type for JWT operations.
///
/// Verification failures are kept distinct so callers can tell an expired
/// session apart from a forged or garbled token when logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,
}

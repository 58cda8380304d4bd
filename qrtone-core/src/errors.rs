//! QRTone error types with granular categories

use thiserror::Error;

/// Top-level error type for all QRTone operations
#[derive(Debug, Error)]
pub enum QrToneError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("ECC error: {0}")]
    Ecc(#[from] EccError),
}

/// Encoding-specific errors
///
/// The ECC level is a closed enum, so the only rejectable encode input is an
/// oversized payload.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Payload length {length} exceeds maximum {max}")]
    PayloadTooLong { length: usize, max: usize },
}

/// Galois-field and Reed-Solomon errors
///
/// These stay internal to the decode path; the modem maps every one of them
/// to "drop the frame and re-arm the trigger".
#[derive(Debug, Error)]
pub enum EccError {
    #[error("Illegal argument: {reason}")]
    IllegalArgument { reason: &'static str },

    #[error("Polynomial division by zero")]
    DivideByZero,

    #[error("Reed-Solomon decode failed: {reason}")]
    ReedSolomon { reason: &'static str },

    #[error("Illegal state: {reason}")]
    IllegalState { reason: &'static str },
}

/// Result type alias for QRTone operations
pub type Result<T> = std::result::Result<T, QrToneError>;

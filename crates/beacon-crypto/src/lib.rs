//! # beacon-crypto
//!
//! Cryptographic primitives for the beacon oracle.
//!
//! The suite is fixed: BLAKE3 for every digest and Ed25519 for reporter
//! signatures. No algorithm negotiation is permitted.
//!
//! ## Modules
//!
//! - [`blake3`] - Domain-separated BLAKE3 hashing and field framing
//! - [`ed25519`] - Ed25519 signing and verification (RFC 8032)

pub mod blake3;
pub mod ed25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// The signature bytes are not a well-formed Ed25519 signature.
    #[error("invalid signature encoding: expected {expected} bytes, got {actual}")]
    InvalidSignatureEncoding { expected: usize, actual: usize },

    /// The public key bytes do not decode to a curve point.
    #[error("invalid public key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

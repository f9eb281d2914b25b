//! # beacon-oracle
//!
//! Verification and aggregation engine for reporter-signed data feeds.
//!
//! Reporters sign observations off-chain. This crate verifies those
//! signatures, enforces freshness and monotonic update rules, aggregates
//! several reporters into a median feed, and serves the committed readings
//! behind an access gate. Every operation takes the [`state::OracleState`]
//! explicitly and the current time as `now` (Unix seconds).
//!
//! ## Modules
//!
//! - [`ids`] - Deterministic feed, aggregate, template and alias identifiers
//! - [`signed`] - Signed digests, payload codec, signature verification
//! - [`freshness`] - Freshness window and clock skew policy
//! - [`update`] - Single-source update paths
//! - [`aggregate`] - Aggregate update paths (stored members, signed batch)
//! - [`median`] - Median with in-place quickselect
//! - [`state`] - Keyed stores and atomic changesets
//! - [`templates`] - Template registry
//! - [`alias`] - Alias registry
//! - [`access`] - Access and role gates
//! - [`reader`] - Gated read facade

pub mod access;
pub mod aggregate;
pub mod alias;
pub mod freshness;
pub mod ids;
pub mod median;
pub mod reader;
pub mod signed;
pub mod state;
pub mod templates;
pub mod update;

pub use beacon_types::RangeError;

/// Error types for oracle operations.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The payload is not the expected number of bytes.
    #[error("invalid payload length: expected {expected}, got {actual}")]
    InvalidPayloadLength {
        /// Required length in bytes.
        expected: usize,
        /// Supplied length in bytes.
        actual: usize,
    },

    /// Parallel input arrays differ in length.
    #[error("parameter length mismatch: {field} has {actual} entries, expected {expected}")]
    ParameterLengthMismatch {
        /// The offending array.
        field: &'static str,
        /// Length of the first array.
        expected: usize,
        /// Length of the offending array.
        actual: usize,
    },

    /// Too few members for an aggregate.
    #[error("insufficient members: need {required}, have {available}")]
    InsufficientMembers {
        /// Minimum number of members.
        required: usize,
        /// Number supplied.
        available: usize,
    },

    /// A reserved all-zero identifier was supplied where a real one is needed.
    #[error("zero identifier supplied for {0}")]
    ZeroIdentifier(&'static str),

    /// An alias name must contain at least one byte.
    #[error("alias name is empty")]
    EmptyAliasName,

    /// A narrowing conversion would lose information.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// The timestamp is older than the freshness window allows.
    #[error("stale timestamp: {timestamp} is outside the freshness window at {now}")]
    StaleTimestamp {
        /// The signed timestamp.
        timestamp: u64,
        /// Current time.
        now: u64,
    },

    /// The timestamp is further in the future than the clock skew allows.
    #[error("future timestamp: {timestamp} exceeds the clock skew allowance at {now}")]
    FutureTimestamp {
        /// The signed timestamp.
        timestamp: u64,
        /// Current time.
        now: u64,
    },

    /// A single-source update is not strictly newer than the stored reading.
    #[error("non-monotonic timestamp: {new} <= {last}")]
    NonMonotonicTimestamp {
        /// The candidate timestamp.
        new: u64,
        /// The stored timestamp.
        last: u64,
    },

    /// An aggregate update is older than the stored aggregate reading.
    #[error("outdated aggregate: {new} < {last}")]
    OutdatedAggregate {
        /// The candidate (mean) timestamp.
        new: u64,
        /// The stored timestamp.
        last: u64,
    },

    /// The signature does not belong to the claimed reporter.
    #[error("signature mismatch for reporter {reporter}")]
    SignatureMismatch {
        /// Hex of the claimed reporter identity.
        reporter: String,
    },

    /// The signature bytes are malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// No template is registered under the identifier.
    #[error("unknown template {0}")]
    UnknownTemplate(String),

    /// The caller may not perform this operation.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A value-only read found no data.
    #[error("no data for {0}")]
    NoData(String),
}

/// Classification of [`OracleError`] into the rejection taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input rejected before cryptographic or state work.
    InputShape,
    /// A value or timestamp outside its stored range.
    Range,
    /// Too old, too new, or not newer than the stored reading.
    Freshness,
    /// Bad signature or unknown signer.
    Authentication,
    /// The caller failed an access check.
    AccessDenied,
    /// The feed has never been written.
    NoData,
}

impl OracleError {
    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPayloadLength { .. }
            | Self::ParameterLengthMismatch { .. }
            | Self::InsufficientMembers { .. }
            | Self::ZeroIdentifier(_)
            | Self::EmptyAliasName => ErrorKind::InputShape,
            Self::Range(_) => ErrorKind::Range,
            Self::StaleTimestamp { .. }
            | Self::FutureTimestamp { .. }
            | Self::NonMonotonicTimestamp { .. }
            | Self::OutdatedAggregate { .. } => ErrorKind::Freshness,
            Self::SignatureMismatch { .. }
            | Self::InvalidSignature(_)
            | Self::UnknownTemplate(_) => ErrorKind::Authentication,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::NoData(_) => ErrorKind::NoData,
        }
    }
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;

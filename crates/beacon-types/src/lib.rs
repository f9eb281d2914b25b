//! # beacon-types
//!
//! Shared domain types used across the beacon workspace.

pub mod events;
pub mod observation;
pub mod record;
pub mod word;

pub use word::{Int224, RangeError, SignedWord};

/// Common identifier aliases. All identifiers are 32-byte digests or keys.
pub type FeedId = [u8; 32];
pub type TemplateId = [u8; 32];
pub type EndpointId = [u8; 32];
pub type NameHash = [u8; 32];
/// Raw Ed25519 verifying key bytes of a reporter.
pub type ReporterId = [u8; 32];
/// Identity of a caller (reader, alias setter, manager).
pub type AccountId = [u8; 32];

/// The reserved all-zero identifier meaning "absent".
///
/// As a reader identity it means "anyone" (an unauthenticated off-chain read).
pub const ZERO_ID: [u8; 32] = [0u8; 32];

/// Length in bytes of one encoded word in an observation payload.
pub const WORD_LEN: usize = 32;

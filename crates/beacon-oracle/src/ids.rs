//! Deterministic identifier derivation.
//!
//! | identifier | digest input |
//! |------------|--------------|
//! | single-source feed | `reporter \|\| template_id` |
//! | aggregate feed | `LE32(n) \|\| (LE32(32) \|\| member)*` |
//! | parameterized feed | `encode_multi_field(template_id, parameters)` |
//! | template | `encode_multi_field(reporter, endpoint_id, parameters)` |
//! | alias name | raw UTF-8 bytes of the name |
//!
//! Member order is significant for aggregates: permuting the members yields
//! a different aggregate identifier.

use beacon_crypto::blake3;
use beacon_types::{EndpointId, FeedId, NameHash, ReporterId, TemplateId, ZERO_ID};

use crate::{OracleError, Result};

/// Derive the feed identifier of a reporter signing under a template.
///
/// # Errors
///
/// [`OracleError::ZeroIdentifier`] if either input is all zeros.
pub fn derive_single_source_id(reporter: &ReporterId, template_id: &TemplateId) -> Result<FeedId> {
    if reporter == &ZERO_ID {
        return Err(OracleError::ZeroIdentifier("reporter"));
    }
    if template_id == &ZERO_ID {
        return Err(OracleError::ZeroIdentifier("template"));
    }
    Ok(blake3::hash_concat(&[reporter.as_slice(), template_id.as_slice()]))
}

/// Derive the identifier of an aggregate over an ordered list of members.
pub fn derive_aggregate_id(members: &[FeedId]) -> FeedId {
    blake3::hash(&blake3::encode_word_list(members))
}

/// Derive the feed identifier of a template called with `parameters`.
///
/// # Errors
///
/// [`OracleError::ZeroIdentifier`] if `template_id` is all zeros.
pub fn derive_parameterized_id(template_id: &TemplateId, parameters: &[u8]) -> Result<FeedId> {
    if template_id == &ZERO_ID {
        return Err(OracleError::ZeroIdentifier("template"));
    }
    Ok(blake3::hash(&blake3::encode_multi_field(&[
        template_id.as_slice(),
        parameters,
    ])))
}

/// Derive a template identifier from its defining fields.
pub fn derive_template_id(
    reporter: &ReporterId,
    endpoint_id: &EndpointId,
    parameters: &[u8],
) -> TemplateId {
    blake3::hash(&blake3::encode_multi_field(&[
        reporter.as_slice(),
        endpoint_id.as_slice(),
        parameters,
    ]))
}

/// Hash a human-readable alias name.
pub fn alias_name_hash(name: &str) -> NameHash {
    blake3::hash(name.as_bytes())
}

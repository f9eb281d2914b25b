//! Signed observations: digests, payload codec and verification.
//!
//! A reporter signs a 32-byte digest derived under a registered BLAKE3
//! context:
//!
//! ```text
//! timestamped:   derive_key("beacon v1 signed-observation",
//!                           template_id || BE256(timestamp) || payload)
//! parameterized: derive_key("beacon v1 signed-parameterized",
//!                           encode_multi_field(template_id, parameters, payload))
//! ```
//!
//! Timestamped payloads are one big-endian two's complement word (the
//! value). Parameterized payloads are two words: the value followed by an
//! unsigned timestamp.

use beacon_crypto::blake3::{self, contexts};
use beacon_crypto::ed25519::{self, SigningKey};
use beacon_crypto::CryptoError;
use beacon_types::observation::{ParameterizedObservation, SignedObservation};
use beacon_types::record::FeedRecord;
use beacon_types::word::narrow_timestamp;
use beacon_types::{FeedId, Int224, ReporterId, SignedWord, TemplateId, WORD_LEN};
use primitive_types::U256;

use crate::freshness::FreshnessPolicy;
use crate::ids;
use crate::{OracleError, Result};

/// Length of a timestamped observation payload.
pub const VALUE_PAYLOAD_LEN: usize = WORD_LEN;

/// Length of a parameterized observation payload.
pub const PARAMETERIZED_PAYLOAD_LEN: usize = 2 * WORD_LEN;

/// An observation that passed freshness, shape, signature and range checks.
///
/// Nothing has been written yet; the caller decides whether to commit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedObservation {
    pub feed_id: FeedId,
    pub template_id: TemplateId,
    /// The decoded value before narrowing.
    pub value: SignedWord,
    /// The signed timestamp before narrowing.
    pub timestamp: u64,
    /// The narrowed form to store.
    pub record: FeedRecord,
}

/// Big-endian 256-bit encoding of a timestamp.
fn timestamp_word(timestamp: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&timestamp.to_be_bytes());
    word
}

/// Digest signed for a timestamped observation.
pub fn observation_digest(template_id: &TemplateId, timestamp: u64, payload: &[u8]) -> [u8; 32] {
    let mut material = Vec::with_capacity(2 * WORD_LEN + payload.len());
    material.extend_from_slice(template_id);
    material.extend_from_slice(&timestamp_word(timestamp));
    material.extend_from_slice(payload);
    blake3::derive_key(contexts::SIGNED_OBSERVATION, &material)
}

/// Digest signed for a parameterized observation.
pub fn parameterized_digest(template_id: &TemplateId, parameters: &[u8], payload: &[u8]) -> [u8; 32] {
    let material = blake3::encode_multi_field(&[template_id.as_slice(), parameters, payload]);
    blake3::derive_key(contexts::SIGNED_PARAMETERIZED, &material)
}

/// Encode a value as a timestamped observation payload.
pub fn encode_value_payload(value: SignedWord) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Encode a value and timestamp word as a parameterized payload.
pub fn encode_parameterized_payload(value: SignedWord, timestamp: U256) -> Vec<u8> {
    let mut payload = Vec::with_capacity(PARAMETERIZED_PAYLOAD_LEN);
    payload.extend_from_slice(&value.to_be_bytes());
    let mut word = [0u8; 32];
    timestamp.to_big_endian(&mut word);
    payload.extend_from_slice(&word);
    payload
}

/// Decode a timestamped observation payload.
///
/// # Errors
///
/// [`OracleError::InvalidPayloadLength`] unless `payload` is exactly one word.
pub fn decode_value_payload(payload: &[u8]) -> Result<SignedWord> {
    let word: &[u8; 32] = payload
        .try_into()
        .map_err(|_| OracleError::InvalidPayloadLength {
            expected: VALUE_PAYLOAD_LEN,
            actual: payload.len(),
        })?;
    Ok(SignedWord::from_be_bytes(word))
}

/// Decode a parameterized payload into `(value, timestamp word)`.
///
/// # Errors
///
/// [`OracleError::InvalidPayloadLength`] unless `payload` is exactly two words.
pub fn decode_parameterized_payload(payload: &[u8]) -> Result<(SignedWord, U256)> {
    if payload.len() != PARAMETERIZED_PAYLOAD_LEN {
        return Err(OracleError::InvalidPayloadLength {
            expected: PARAMETERIZED_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }
    let (value, timestamp) = payload.split_at(WORD_LEN);
    let value = decode_value_payload(value)?;
    Ok((value, U256::from_big_endian(timestamp)))
}

/// Produce a timestamped observation signed by `key` (reporter side).
pub fn sign_observation(
    key: &SigningKey,
    template_id: TemplateId,
    timestamp: u64,
    value: SignedWord,
) -> SignedObservation {
    let payload = encode_value_payload(value);
    let digest = observation_digest(&template_id, timestamp, &payload);
    SignedObservation {
        reporter: key.verifying_key().to_bytes(),
        template_id,
        timestamp,
        payload,
        signature: key.sign(&digest).to_bytes().to_vec(),
    }
}

/// Produce a parameterized observation signed by `key` (reporter side).
pub fn sign_parameterized(
    key: &SigningKey,
    template_id: TemplateId,
    parameters: Vec<u8>,
    value: SignedWord,
    timestamp: U256,
) -> ParameterizedObservation {
    let payload = encode_parameterized_payload(value, timestamp);
    let digest = parameterized_digest(&template_id, &parameters, &payload);
    ParameterizedObservation {
        template_id,
        parameters,
        payload,
        signature: key.sign(&digest).to_bytes().to_vec(),
    }
}

/// Check that `signature` over `digest` belongs to `reporter`.
///
/// # Errors
///
/// - [`OracleError::InvalidSignature`] if the signature is malformed
/// - [`OracleError::SignatureMismatch`] if it was not made by `reporter`
pub fn verify_reporter(reporter: &ReporterId, digest: &[u8; 32], signature: &[u8]) -> Result<()> {
    ed25519::verify_signer(reporter, digest, signature).map_err(|e| {
        tracing::warn!(reporter = %hex::encode(reporter), error = %e, "signature rejected");
        match e {
            CryptoError::InvalidSignatureEncoding { .. } => {
                OracleError::InvalidSignature(e.to_string())
            }
            CryptoError::InvalidKey(_) | CryptoError::SignatureVerification => {
                OracleError::SignatureMismatch {
                    reporter: hex::encode(reporter),
                }
            }
        }
    })
}

/// Narrow a decoded value to the stored range.
pub fn narrow_value(value: SignedWord) -> Result<Int224> {
    Ok(Int224::try_from(value)?)
}

/// Verify a timestamped observation without touching any state.
///
/// Checks, in order: the timestamp is fresh at `now` and fits the stored
/// width; the payload is exactly one word and the identifiers are
/// non-zero; the signature belongs to the reporter; the value fits the
/// stored 224-bit range.
pub fn verify_observation(
    observation: &SignedObservation,
    policy: &FreshnessPolicy,
    now: u64,
) -> Result<VerifiedObservation> {
    let SignedObservation {
        reporter,
        template_id,
        timestamp,
        payload,
        signature,
    } = observation;

    policy.check(*timestamp, now)?;
    let stored_timestamp = narrow_timestamp(*timestamp)?;

    let value = decode_value_payload(payload)?;
    let feed_id = ids::derive_single_source_id(reporter, template_id)?;

    let digest = observation_digest(template_id, *timestamp, payload);
    verify_reporter(reporter, &digest, signature)?;

    let narrowed = narrow_value(value)?;

    Ok(VerifiedObservation {
        feed_id,
        template_id: *template_id,
        value,
        timestamp: *timestamp,
        record: FeedRecord {
            value: narrowed,
            timestamp: stored_timestamp,
        },
    })
}

//! Single-source update paths.
//!
//! Two ways to write a single-source feed:
//!
//! - [`submit_signed_observation`]: the signature covers
//!   `(template_id, timestamp, payload)` and the feed is identified by
//!   `(reporter, template_id)`.
//! - [`submit_parameterized_observation`]: the signature covers
//!   `(template_id, parameters, payload)`, the timestamp travels inside the
//!   payload, the signer is looked up in the template registry, and the
//!   feed is identified by `(template_id, parameters)`, so one template can
//!   back many feeds.
//!
//! Both paths accept an update only if its timestamp is strictly newer than
//! the stored one, which rules out replays and same-timestamp resubmission.

use beacon_types::events::OracleEvent;
use beacon_types::observation::{ParameterizedObservation, SignedObservation};
use beacon_types::record::FeedRecord;
use beacon_types::word::narrow_timestamp_word;

use crate::signed::{self, VerifiedObservation};
use crate::state::{Changeset, OracleState};
use crate::{ids, templates};
use crate::{OracleError, Result};

/// Reject `candidate` unless it is strictly newer than `stored`.
fn ensure_newer(candidate: u32, stored: &FeedRecord) -> Result<()> {
    if candidate <= stored.timestamp {
        tracing::warn!(
            new = candidate,
            last = stored.timestamp,
            "rejecting non-monotonic update"
        );
        return Err(OracleError::NonMonotonicTimestamp {
            new: u64::from(candidate),
            last: u64::from(stored.timestamp),
        });
    }
    Ok(())
}

/// Verify a timestamped observation and write it to its single-source feed.
///
/// # Errors
///
/// - Freshness: [`OracleError::StaleTimestamp`], [`OracleError::FutureTimestamp`],
///   [`OracleError::NonMonotonicTimestamp`]
/// - Input shape: [`OracleError::InvalidPayloadLength`], [`OracleError::ZeroIdentifier`]
/// - Authentication: [`OracleError::SignatureMismatch`], [`OracleError::InvalidSignature`]
/// - Range: [`OracleError::Range`]
pub fn submit_signed_observation(
    state: &mut OracleState,
    observation: &SignedObservation,
    now: u64,
) -> Result<OracleEvent> {
    let VerifiedObservation {
        feed_id,
        template_id,
        value,
        timestamp,
        record,
    } = signed::verify_observation(observation, state.policy(), now)?;

    ensure_newer(record.timestamp, &state.feed(&feed_id))?;

    let event = OracleEvent::SingleSourceUpdated {
        feed_id,
        template_id,
        value,
        timestamp,
    };
    let mut changes = Changeset::new();
    changes.write_feed(feed_id, record).emit(event.clone());
    state.commit(changes);

    tracing::debug!(
        feed_id = %hex::encode(feed_id),
        value = %value,
        timestamp,
        "single-source feed updated"
    );
    Ok(event)
}

/// Verify a parameterized observation and write it to its feed.
///
/// The reporter is whoever the template registry holds for `template_id`.
/// The payload's timestamp word must fit 32 bits and is subject to the same
/// freshness and strict monotonicity rules as the timestamped path.
///
/// # Errors
///
/// As [`submit_signed_observation`], plus [`OracleError::UnknownTemplate`].
pub fn submit_parameterized_observation(
    state: &mut OracleState,
    observation: &ParameterizedObservation,
    now: u64,
) -> Result<OracleEvent> {
    let ParameterizedObservation {
        template_id,
        parameters,
        payload,
        signature,
    } = observation;

    let reporter = templates::reporter_for(state, template_id)?;
    let (value, timestamp_word) = signed::decode_parameterized_payload(payload)?;
    let feed_id = ids::derive_parameterized_id(template_id, parameters)?;

    let digest = signed::parameterized_digest(template_id, parameters, payload);
    signed::verify_reporter(&reporter, &digest, signature)?;

    let narrowed = signed::narrow_value(value)?;
    let stored_timestamp = narrow_timestamp_word(timestamp_word)?;
    let timestamp = u64::from(stored_timestamp);
    state.policy().check(timestamp, now)?;

    ensure_newer(stored_timestamp, &state.feed(&feed_id))?;

    let event = OracleEvent::ParameterizedUpdated {
        feed_id,
        template_id: *template_id,
        value,
        timestamp,
    };
    let mut changes = Changeset::new();
    changes
        .write_feed(
            feed_id,
            FeedRecord {
                value: narrowed,
                timestamp: stored_timestamp,
            },
        )
        .emit(event.clone());
    state.commit(changes);

    tracing::debug!(
        feed_id = %hex::encode(feed_id),
        value = %value,
        timestamp,
        "parameterized feed updated"
    );
    Ok(event)
}

//! Aggregate update paths.
//!
//! An aggregate feed is the median of two or more member feeds, identified
//! by the ordered list of its members ([`ids::derive_aggregate_id`]). Its
//! timestamp is the mean of the member timestamps, truncated.
//!
//! Members are resolved to a uniform [`ResolvedMember`] before aggregation:
//!
//! - [`MemberInput::StoredOnly`] reads the member's committed record as is.
//! - [`MemberInput::Signed`] runs full observation verification and uses
//!   the fresh value without writing it to the member feed.
//!
//! Unlike single-source updates, an aggregate write is rejected only when
//! the candidate timestamp is older than the stored one. Re-aggregating at
//! an unchanged mean timestamp overwrites the stored median.

use beacon_types::events::OracleEvent;
use beacon_types::observation::SignedObservation;
use beacon_types::record::FeedRecord;
use beacon_types::word::narrow_timestamp;
use beacon_types::{FeedId, ReporterId, SignedWord, TemplateId};

use crate::median;
use crate::signed;
use crate::state::{Changeset, OracleState};
use crate::{ids, OracleError, Result};

/// Minimum number of members in an aggregate.
pub const MIN_AGGREGATE_MEMBERS: usize = 2;

/// One member of a batch aggregate update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberInput {
    /// A fresh signed observation, verified before use.
    Signed(SignedObservation),
    /// An already committed feed, trusted as stored.
    StoredOnly {
        /// The member feed.
        feed_id: FeedId,
    },
}

impl MemberInput {
    /// Classify a batch entry: an unsigned observation only names the
    /// stored feed of `(reporter, template_id)`.
    ///
    /// # Errors
    ///
    /// [`OracleError::ZeroIdentifier`] if an unsigned entry has a zero
    /// reporter or template.
    pub fn from_observation(observation: SignedObservation) -> Result<Self> {
        if observation.is_signed() {
            return Ok(Self::Signed(observation));
        }
        let feed_id = ids::derive_single_source_id(&observation.reporter, &observation.template_id)?;
        Ok(Self::StoredOnly { feed_id })
    }
}

/// A member reduced to the inputs of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMember {
    pub feed_id: FeedId,
    pub value: SignedWord,
    pub timestamp: u64,
}

impl ResolvedMember {
    fn from_stored(feed_id: FeedId, record: FeedRecord) -> Self {
        Self {
            feed_id,
            value: record.value.widen(),
            timestamp: u64::from(record.timestamp),
        }
    }
}

fn ensure_enough(count: usize) -> Result<()> {
    if count < MIN_AGGREGATE_MEMBERS {
        return Err(OracleError::InsufficientMembers {
            required: MIN_AGGREGATE_MEMBERS,
            available: count,
        });
    }
    Ok(())
}

/// Resolve every member, verifying signed ones against `now`.
///
/// Nothing is written; the first failing member aborts the whole batch.
pub fn resolve_members(
    state: &OracleState,
    members: &[MemberInput],
    now: u64,
) -> Result<Vec<ResolvedMember>> {
    members
        .iter()
        .map(|member| match member {
            MemberInput::StoredOnly { feed_id } => {
                Ok(ResolvedMember::from_stored(*feed_id, state.feed(feed_id)))
            }
            MemberInput::Signed(observation) => {
                let verified = signed::verify_observation(observation, state.policy(), now)?;
                Ok(ResolvedMember {
                    feed_id: verified.feed_id,
                    value: verified.value,
                    timestamp: verified.timestamp,
                })
            }
        })
        .collect()
}

/// Mean of the member timestamps, truncated.
fn mean_timestamp(members: &[ResolvedMember]) -> u64 {
    let sum: u128 = members.iter().map(|m| u128::from(m.timestamp)).sum();
    let mean = sum / members.len().max(1) as u128;
    // every timestamp is a u64, so their mean is too
    u64::try_from(mean).unwrap_or(u64::MAX)
}

/// Reduce resolved members to one aggregate record and commit it.
fn commit_aggregate(state: &mut OracleState, members: &[ResolvedMember]) -> Result<OracleEvent> {
    ensure_enough(members.len())?;

    let member_ids: Vec<FeedId> = members.iter().map(|m| m.feed_id).collect();
    let values: Vec<SignedWord> = members.iter().map(|m| m.value).collect();

    let timestamp = mean_timestamp(members);
    let value = median::median(&values).ok_or(OracleError::InsufficientMembers {
        required: MIN_AGGREGATE_MEMBERS,
        available: 0,
    })?;

    let record = FeedRecord {
        value: signed::narrow_value(value)?,
        timestamp: narrow_timestamp(timestamp)?,
    };

    let aggregate_id = ids::derive_aggregate_id(&member_ids);
    let stored = state.feed(&aggregate_id);
    if record.timestamp < stored.timestamp {
        tracing::warn!(
            aggregate_id = %hex::encode(aggregate_id),
            new = record.timestamp,
            last = stored.timestamp,
            "rejecting outdated aggregate"
        );
        return Err(OracleError::OutdatedAggregate {
            new: timestamp,
            last: u64::from(stored.timestamp),
        });
    }

    let event = OracleEvent::AggregateUpdated {
        aggregate_id,
        members: member_ids,
        value,
        timestamp,
    };
    let mut changes = Changeset::new();
    changes.write_feed(aggregate_id, record).emit(event.clone());
    state.commit(changes);

    tracing::debug!(
        aggregate_id = %hex::encode(aggregate_id),
        members = members.len(),
        value = %value,
        timestamp,
        "aggregate feed updated"
    );
    Ok(event)
}

/// Aggregate the committed records of `member_ids`.
///
/// # Errors
///
/// - [`OracleError::InsufficientMembers`] for fewer than two members
/// - [`OracleError::OutdatedAggregate`] if the mean timestamp is older than
///   the stored aggregate's
pub fn update_aggregate_from_stored_members(
    state: &mut OracleState,
    member_ids: &[FeedId],
) -> Result<OracleEvent> {
    ensure_enough(member_ids.len())?;
    let members: Vec<ResolvedMember> = member_ids
        .iter()
        .map(|id| ResolvedMember::from_stored(*id, state.feed(id)))
        .collect();
    commit_aggregate(state, &members)
}

/// Aggregate a batch of tagged members.
///
/// Every signed member is verified before the aggregate is computed, and
/// no member feed is written.
pub fn update_aggregate_from_members(
    state: &mut OracleState,
    members: &[MemberInput],
    now: u64,
) -> Result<OracleEvent> {
    ensure_enough(members.len())?;
    let resolved = resolve_members(state, members, now)?;
    commit_aggregate(state, &resolved)
}

fn check_parallel(field: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(OracleError::ParameterLengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Aggregate a batch given as parallel arrays.
///
/// Index `i` is a signed member when `signatures[i]` is non-empty and a
/// stored-only member of `(reporters[i], template_ids[i])` otherwise.
///
/// # Errors
///
/// [`OracleError::ParameterLengthMismatch`] if the arrays differ in length,
/// then as [`update_aggregate_from_members`].
pub fn update_aggregate_from_signed_observations(
    state: &mut OracleState,
    reporters: &[ReporterId],
    template_ids: &[TemplateId],
    timestamps: &[u64],
    payloads: &[Vec<u8>],
    signatures: &[Vec<u8>],
    now: u64,
) -> Result<OracleEvent> {
    let len = reporters.len();
    check_parallel("template_ids", len, template_ids.len())?;
    check_parallel("timestamps", len, timestamps.len())?;
    check_parallel("payloads", len, payloads.len())?;
    check_parallel("signatures", len, signatures.len())?;
    ensure_enough(len)?;

    let members = (0..len)
        .map(|i| {
            MemberInput::from_observation(SignedObservation {
                reporter: reporters[i],
                template_id: template_ids[i],
                timestamp: timestamps[i],
                payload: payloads[i].clone(),
                signature: signatures[i].clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    update_aggregate_from_members(state, &members, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::submit_signed_observation;
    use crate::ErrorKind;
    use beacon_crypto::ed25519::KeyPair;

    const NOW: u64 = 1_700_000_000;
    const TEMPLATE: TemplateId = [0x42; 32];

    fn w(v: i64) -> SignedWord {
        SignedWord::from(v)
    }

    fn reporter(seed: u8) -> KeyPair {
        KeyPair::from_bytes(&[seed; 32])
    }

    /// Commit `value` at `timestamp` for reporter `seed` and return its feed.
    fn seed_feed(state: &mut OracleState, seed: u8, value: i64, timestamp: u64) -> FeedId {
        let kp = reporter(seed);
        let obs = signed::sign_observation(&kp.signing_key, TEMPLATE, timestamp, w(value));
        submit_signed_observation(state, &obs, NOW).expect("seed update");
        ids::derive_single_source_id(&kp.identity(), &TEMPLATE).expect("ids")
    }

    #[test]
    fn test_stored_members_median_and_mean() {
        let mut state = OracleState::new();
        let a = seed_feed(&mut state, 1, 10, NOW - 30);
        let b = seed_feed(&mut state, 2, 30, NOW - 20);
        let c = seed_feed(&mut state, 3, 20, NOW - 11);

        let event = update_aggregate_from_stored_members(&mut state, &[a, b, c]).expect("aggregate");
        let aggregate_id = ids::derive_aggregate_id(&[a, b, c]);
        assert_eq!(event.subject(), &aggregate_id);

        let record = state.feed(&aggregate_id);
        assert_eq!(record.value.widen(), w(20));
        assert_eq!(u64::from(record.timestamp), (3 * NOW - 61) / 3);
    }

    #[test]
    fn test_single_member_rejected() {
        let mut state = OracleState::new();
        let a = seed_feed(&mut state, 1, 10, NOW);
        let err = update_aggregate_from_stored_members(&mut state, &[a]).unwrap_err();
        assert!(matches!(
            err,
            OracleError::InsufficientMembers { required: 2, available: 1 }
        ));
        assert_eq!(err.kind(), ErrorKind::InputShape);
        assert!(update_aggregate_from_stored_members(&mut state, &[]).is_err());
    }

    #[test]
    fn test_equal_timestamp_reaggregates() {
        let mut state = OracleState::new();
        let a = seed_feed(&mut state, 1, 10, NOW);
        let b = seed_feed(&mut state, 2, 20, NOW);
        update_aggregate_from_stored_members(&mut state, &[a, b]).expect("first");
        update_aggregate_from_stored_members(&mut state, &[a, b]).expect("same timestamp accepted");
        assert_eq!(state.events().len(), 4);
    }

    #[test]
    fn test_older_aggregate_rejected() {
        let mut state = OracleState::new();
        let a = seed_feed(&mut state, 1, 10, NOW);
        let b = seed_feed(&mut state, 2, 20, NOW);
        let aggregate_id = ids::derive_aggregate_id(&[a, b]);

        let mut changes = Changeset::new();
        let ahead = FeedRecord {
            timestamp: (NOW + 100) as u32,
            ..FeedRecord::default()
        };
        changes.write_feed(aggregate_id, ahead);
        state.commit(changes);

        let err = update_aggregate_from_stored_members(&mut state, &[a, b]).unwrap_err();
        assert!(matches!(err, OracleError::OutdatedAggregate { .. }));
        assert_eq!(state.feed(&aggregate_id), ahead);
    }

    #[test]
    fn test_member_order_selects_distinct_aggregate() {
        let mut state = OracleState::new();
        let a = seed_feed(&mut state, 1, 10, NOW);
        let b = seed_feed(&mut state, 2, 20, NOW);
        update_aggregate_from_stored_members(&mut state, &[a, b]).expect("ab");
        update_aggregate_from_stored_members(&mut state, &[b, a]).expect("ba");
        assert_ne!(ids::derive_aggregate_id(&[a, b]), ids::derive_aggregate_id(&[b, a]));
        assert_eq!(state.feeds().count(), 4);
    }

    #[test]
    fn test_mixed_signed_and_stored_batch() {
        let mut state = OracleState::new();
        let stored_a = seed_feed(&mut state, 1, -7, NOW - 100);
        let stored_b = seed_feed(&mut state, 2, 50, NOW - 50);

        let signers: Vec<KeyPair> = (3..6).map(reporter).collect();
        let fresh = [(5i64, NOW - 3), (100, NOW - 2), (-20, NOW - 1)];
        let mut members: Vec<MemberInput> = signers
            .iter()
            .zip(fresh)
            .map(|(kp, (v, ts))| {
                MemberInput::Signed(signed::sign_observation(&kp.signing_key, TEMPLATE, ts, w(v)))
            })
            .collect();
        members.push(MemberInput::StoredOnly { feed_id: stored_a });
        members.push(MemberInput::StoredOnly { feed_id: stored_b });

        let before: Vec<_> = [stored_a, stored_b].iter().map(|id| state.feed(id)).collect();
        update_aggregate_from_members(&mut state, &members, NOW).expect("mixed batch");

        let mut ids_in_order: Vec<FeedId> = signers
            .iter()
            .map(|kp| ids::derive_single_source_id(&kp.identity(), &TEMPLATE).expect("ids"))
            .collect();
        ids_in_order.extend([stored_a, stored_b]);
        let record = state.feed(&ids::derive_aggregate_id(&ids_in_order));

        let reference_values = [w(5), w(100), w(-20), w(-7), w(50)];
        assert_eq!(Some(record.value.widen()), median::median_by_sort(&reference_values));
        let reference_ts = (NOW - 3 + NOW - 2 + NOW - 1 + NOW - 100 + NOW - 50) / 5;
        assert_eq!(u64::from(record.timestamp), reference_ts);

        // signed members are not written to their own feeds
        for kp in &signers {
            let id = ids::derive_single_source_id(&kp.identity(), &TEMPLATE).expect("ids");
            assert!(state.feed(&id).is_empty());
        }
        let after: Vec<_> = [stored_a, stored_b].iter().map(|id| state.feed(id)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_bad_member_leaves_state_untouched() {
        let mut state = OracleState::new();
        let stored = seed_feed(&mut state, 1, 1, NOW);
        let kp = reporter(2);
        let mut bad = signed::sign_observation(&kp.signing_key, TEMPLATE, NOW, w(3));
        bad.payload[31] ^= 1;

        let members = [
            MemberInput::StoredOnly { feed_id: stored },
            MemberInput::Signed(bad),
        ];
        let events_before = state.events().len();
        let feeds_before = state.feeds().count();
        let err = update_aggregate_from_members(&mut state, &members, NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(state.events().len(), events_before);
        assert_eq!(state.feeds().count(), feeds_before);
    }

    #[test]
    fn test_parallel_arrays() {
        let mut state = OracleState::new();
        let stored_kp = reporter(1);
        seed_feed(&mut state, 1, 40, NOW - 10);

        let signer = reporter(2);
        let obs = signed::sign_observation(&signer.signing_key, TEMPLATE, NOW, w(60));

        let event = update_aggregate_from_signed_observations(
            &mut state,
            &[stored_kp.identity(), signer.identity()],
            &[TEMPLATE, TEMPLATE],
            &[0, NOW],
            &[Vec::new(), obs.payload.clone()],
            &[Vec::new(), obs.signature.clone()],
            NOW,
        )
        .expect("aggregate");

        assert!(matches!(
            event,
            OracleEvent::AggregateUpdated { value, timestamp, .. }
                if value == w(50) && timestamp == NOW - 5
        ));
    }

    #[test]
    fn test_parallel_array_mismatch() {
        let mut state = OracleState::new();
        let err = update_aggregate_from_signed_observations(
            &mut state,
            &[[1u8; 32], [2u8; 32]],
            &[TEMPLATE],
            &[NOW, NOW],
            &[vec![], vec![]],
            &[vec![], vec![]],
            NOW,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OracleError::ParameterLengthMismatch { field: "template_ids", expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_extreme_values_stay_in_range() {
        let mut state = OracleState::new();
        let kp_max = reporter(1);
        let kp_min = reporter(2);
        let max = beacon_types::Int224::MAX.widen();
        let min = beacon_types::Int224::MIN.widen();
        let members = [
            MemberInput::Signed(signed::sign_observation(&kp_max.signing_key, TEMPLATE, NOW, max)),
            MemberInput::Signed(signed::sign_observation(&kp_min.signing_key, TEMPLATE, NOW, min)),
        ];
        let event = update_aggregate_from_members(&mut state, &members, NOW).expect("aggregate");
        assert!(matches!(
            event,
            OracleEvent::AggregateUpdated { value, .. } if value == SignedWord::ZERO
        ));
    }
}

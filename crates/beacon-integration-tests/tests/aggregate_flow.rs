//! Integration test: aggregate feeds.
//!
//! Exercises median aggregation across reporters:
//! 1. Five reporters publish single-source readings
//! 2. Aggregate from stored members
//! 3. Aggregate from a mixed batch of fresh signed and stored members,
//!    checked against a reference that substitutes the values directly
//! 4. Member order and framing of aggregate identifiers
//! 5. All-or-nothing behavior of a batch with one bad member

use beacon_crypto::blake3;
use beacon_crypto::ed25519::KeyPair;
use beacon_oracle::aggregate::{
    update_aggregate_from_members, update_aggregate_from_signed_observations,
    update_aggregate_from_stored_members, MemberInput,
};
use beacon_oracle::median::median_by_sort;
use beacon_oracle::signed::sign_observation;
use beacon_oracle::state::OracleState;
use beacon_oracle::update::submit_signed_observation;
use beacon_oracle::{ids, ErrorKind, OracleError};
use beacon_types::{FeedId, SignedWord, TemplateId};

/// Simulated clock for deterministic testing.
const TEST_NOW: u64 = 1_700_000_000;

const TEMPLATE: TemplateId = [0x22; 32];

fn reporters() -> Vec<KeyPair> {
    (1..=5u8).map(|seed| KeyPair::from_bytes(&[seed; 32])).collect()
}

fn feed_of(kp: &KeyPair) -> FeedId {
    ids::derive_single_source_id(&kp.identity(), &TEMPLATE).expect("feed id")
}

fn w(v: i64) -> SignedWord {
    SignedWord::from(v)
}

#[test]
fn median_of_stored_members() {
    let mut state = OracleState::new();
    let keys = reporters();
    let readings = [(-40i64, 300u64), (10, 250), (25, 200), (7, 150), (1_000, 100)];

    for (kp, (value, age)) in keys.iter().zip(readings) {
        let obs = sign_observation(&kp.signing_key, TEMPLATE, TEST_NOW - age, w(value));
        submit_signed_observation(&mut state, &obs, TEST_NOW).expect("reading");
    }

    let members: Vec<FeedId> = keys.iter().map(feed_of).collect();
    update_aggregate_from_stored_members(&mut state, &members).expect("aggregate");

    let record = state.feed(&ids::derive_aggregate_id(&members));
    assert_eq!(record.value.widen(), w(10));
    assert_eq!(u64::from(record.timestamp), TEST_NOW - 200);
}

#[test]
fn mixed_batch_matches_direct_reference() {
    let mut state = OracleState::new();
    let keys = reporters();

    // =========================================================
    // Step 1: reporters 4 and 5 have stored readings
    // =========================================================
    let stored = [(&keys[3], 55i64, TEST_NOW - 400), (&keys[4], -9, TEST_NOW - 90)];
    for (kp, value, timestamp) in stored {
        let obs = sign_observation(&kp.signing_key, TEMPLATE, timestamp, w(value));
        submit_signed_observation(&mut state, &obs, TEST_NOW).expect("stored reading");
    }

    // =========================================================
    // Step 2: reporters 1-3 sign fresh readings for the batch
    // =========================================================
    let fresh = [(12i64, TEST_NOW - 5), (31, TEST_NOW - 4), (18, TEST_NOW - 3)];
    let mut batch: Vec<MemberInput> = keys[..3]
        .iter()
        .zip(fresh)
        .map(|(kp, (value, ts))| MemberInput::Signed(sign_observation(&kp.signing_key, TEMPLATE, ts, w(value))))
        .collect();
    batch.extend(keys[3..].iter().map(|kp| MemberInput::StoredOnly { feed_id: feed_of(kp) }));

    update_aggregate_from_members(&mut state, &batch, TEST_NOW).expect("mixed batch");

    // =========================================================
    // Step 3: compare with the directly substituted reference
    // =========================================================
    let members: Vec<FeedId> = keys.iter().map(feed_of).collect();
    let record = state.feed(&ids::derive_aggregate_id(&members));

    let reference_values = [w(12), w(31), w(18), w(55), w(-9)];
    let reference_timestamps = [TEST_NOW - 5, TEST_NOW - 4, TEST_NOW - 3, TEST_NOW - 400, TEST_NOW - 90];
    let reference_ts = reference_timestamps.iter().sum::<u64>() / 5;

    assert_eq!(Some(record.value.widen()), median_by_sort(&reference_values));
    assert_eq!(record.value.widen(), w(18));
    assert_eq!(u64::from(record.timestamp), reference_ts);

    // Fresh readings were only used for the aggregate.
    for kp in &keys[..3] {
        assert!(state.feed(&feed_of(kp)).is_empty());
    }
}

#[test]
fn parallel_array_batch_equals_tagged_batch() {
    let keys = reporters();
    let mut tagged_state = OracleState::new();
    let mut array_state = OracleState::new();

    for state in [&mut tagged_state, &mut array_state] {
        let obs = sign_observation(&keys[0].signing_key, TEMPLATE, TEST_NOW - 50, w(70));
        submit_signed_observation(state, &obs, TEST_NOW).expect("stored reading");
    }

    let signed = sign_observation(&keys[1].signing_key, TEMPLATE, TEST_NOW, w(90));
    let tagged = [
        MemberInput::StoredOnly { feed_id: feed_of(&keys[0]) },
        MemberInput::Signed(signed.clone()),
    ];
    let a = update_aggregate_from_members(&mut tagged_state, &tagged, TEST_NOW).expect("tagged");

    let b = update_aggregate_from_signed_observations(
        &mut array_state,
        &[keys[0].identity(), keys[1].identity()],
        &[TEMPLATE, TEMPLATE],
        &[0, signed.timestamp],
        &[Vec::new(), signed.payload.clone()],
        &[Vec::new(), signed.signature.clone()],
        TEST_NOW,
    )
    .expect("arrays");

    assert_eq!(a, b);
}

#[test]
fn aggregate_identifier_framing() {
    let a: FeedId = [0xA0; 32];
    let b: FeedId = [0xB0; 32];

    assert_ne!(ids::derive_aggregate_id(&[a, b]), ids::derive_aggregate_id(&[b, a]));

    let mut naive = Vec::new();
    naive.extend_from_slice(&a);
    naive.extend_from_slice(&b);
    assert_ne!(ids::derive_aggregate_id(&[a, b]), blake3::hash(&naive));
}

#[test]
fn one_bad_member_aborts_batch() {
    let mut state = OracleState::new();
    let keys = reporters();

    let obs = sign_observation(&keys[0].signing_key, TEMPLATE, TEST_NOW - 1, w(1));
    submit_signed_observation(&mut state, &obs, TEST_NOW).expect("stored reading");
    state.drain_events();
    let before: Vec<_> = keys.iter().map(|kp| state.feed(&feed_of(kp))).collect();

    let good = sign_observation(&keys[1].signing_key, TEMPLATE, TEST_NOW, w(2));
    let stale = sign_observation(&keys[2].signing_key, TEMPLATE, TEST_NOW - 7200, w(3));
    let batch = [
        MemberInput::StoredOnly { feed_id: feed_of(&keys[0]) },
        MemberInput::Signed(good),
        MemberInput::Signed(stale),
    ];

    let err = update_aggregate_from_members(&mut state, &batch, TEST_NOW).unwrap_err();
    assert!(matches!(err, OracleError::StaleTimestamp { .. }));
    assert_eq!(err.kind(), ErrorKind::Freshness);

    let after: Vec<_> = keys.iter().map(|kp| state.feed(&feed_of(kp))).collect();
    assert_eq!(before, after);
    assert!(state.events().is_empty());
    assert_eq!(state.feeds().count(), 1);
}

#[test]
fn aggregate_timestamps_may_repeat_but_not_regress() {
    let mut state = OracleState::new();
    let keys = reporters();
    for kp in &keys[..2] {
        let obs = sign_observation(&kp.signing_key, TEMPLATE, TEST_NOW - 100, w(5));
        submit_signed_observation(&mut state, &obs, TEST_NOW).expect("reading");
    }
    let members = [feed_of(&keys[0]), feed_of(&keys[1])];
    update_aggregate_from_stored_members(&mut state, &members).expect("first");
    update_aggregate_from_stored_members(&mut state, &members).expect("same mean timestamp");

    // A fresh batch with an older mean timestamp than stored is rejected.
    let batch = [
        MemberInput::Signed(sign_observation(&keys[0].signing_key, TEMPLATE, TEST_NOW - 300, w(9))),
        MemberInput::Signed(sign_observation(&keys[1].signing_key, TEMPLATE, TEST_NOW - 300, w(9))),
    ];
    let err = update_aggregate_from_members(&mut state, &batch, TEST_NOW).unwrap_err();
    assert!(matches!(err, OracleError::OutdatedAggregate { .. }));
    assert_eq!(state.feed(&ids::derive_aggregate_id(&members)).value.widen(), w(5));
}

//! Integration test: oracle state survives a restart.
//!
//! 1. Register a template, publish readings, aggregate, set an alias
//! 2. Save everything to SQLite in one transaction
//! 3. Reload into a fresh state and keep enforcing monotonicity
//! 4. Audit log contents per feed

use beacon_crypto::ed25519::KeyPair;
use beacon_db::queries::events;
use beacon_oracle::access::RoleTable;
use beacon_oracle::freshness::FreshnessPolicy;
use beacon_oracle::signed::{sign_observation, sign_parameterized};
use beacon_oracle::state::OracleState;
use beacon_oracle::update::{submit_parameterized_observation, submit_signed_observation};
use beacon_oracle::{aggregate, alias, ids, templates, ErrorKind};
use beacon_types::events::OracleEvent;
use beacon_types::{SignedWord, TemplateId};
use primitive_types::U256;

/// Simulated clock for deterministic testing.
const TEST_NOW: u64 = 1_700_000_000;

const TEMPLATE: TemplateId = [0x33; 32];

#[test]
fn restart_preserves_stores_and_rules() {
    let mut conn = beacon_db::open_memory().expect("open db");
    let mut state = OracleState::new();
    let a = KeyPair::from_bytes(&[1u8; 32]);
    let b = KeyPair::from_bytes(&[2u8; 32]);
    let manager = [9u8; 32];

    // =========================================================
    // Step 1: populate every store
    // =========================================================
    for (kp, value) in [(&a, 100i64), (&b, 300)] {
        let obs = sign_observation(&kp.signing_key, TEMPLATE, TEST_NOW, SignedWord::from(value));
        submit_signed_observation(&mut state, &obs, TEST_NOW).expect("reading");
    }
    let members = [
        ids::derive_single_source_id(&a.identity(), &TEMPLATE).expect("id"),
        ids::derive_single_source_id(&b.identity(), &TEMPLATE).expect("id"),
    ];
    aggregate::update_aggregate_from_stored_members(&mut state, &members).expect("aggregate");
    let aggregate_id = ids::derive_aggregate_id(&members);

    let template_id =
        templates::register_template(&mut state, a.identity(), [4u8; 32], b"q=1").expect("template");
    let roles = RoleTable::with_manager(manager);
    alias::set_alias(&mut state, &roles, manager, "median", aggregate_id).expect("alias");

    // =========================================================
    // Step 2: persist
    // =========================================================
    let written = beacon_db::save_state(&mut conn, &state).expect("save");
    assert_eq!(written, 5);
    state.drain_events();

    // =========================================================
    // Step 3: reload and continue
    // =========================================================
    let mut reloaded = beacon_db::load_state(&conn, FreshnessPolicy::default()).expect("load");
    assert_eq!(reloaded.feed(&aggregate_id), state.feed(&aggregate_id));
    assert_eq!(reloaded.feed(&aggregate_id).value.widen(), SignedWord::from(200i64));
    assert_eq!(alias::resolve_alias(&reloaded, "median"), Some(aggregate_id));
    assert_eq!(templates::reporter_for(&reloaded, &template_id).expect("template"), a.identity());

    // Monotonicity is enforced against the reloaded timestamp.
    let replay = sign_observation(&a.signing_key, TEMPLATE, TEST_NOW, SignedWord::from(1i64));
    let err = submit_signed_observation(&mut reloaded, &replay, TEST_NOW).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Freshness);

    let next = sign_observation(&a.signing_key, TEMPLATE, TEST_NOW + 1, SignedWord::from(150i64));
    submit_signed_observation(&mut reloaded, &next, TEST_NOW + 1).expect("newer reading");

    // The reloaded template registry authenticates parameterized reports.
    let param_obs = sign_parameterized(
        &a.signing_key,
        template_id,
        b"q=1".to_vec(),
        SignedWord::from(-8i64),
        U256::from(TEST_NOW),
    );
    submit_parameterized_observation(&mut reloaded, &param_obs, TEST_NOW).expect("parameterized");

    beacon_db::save_state(&mut conn, &reloaded).expect("save again");

    // =========================================================
    // Step 4: audit log
    // =========================================================
    let history = events::list_for_feed(&conn, &members[0]).expect("history");
    let values: Vec<SignedWord> = history
        .iter()
        .filter_map(|event| match event {
            OracleEvent::SingleSourceUpdated { value, .. } => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![SignedWord::from(100i64), SignedWord::from(150i64)]);

    let aggregate_history = events::list_for_feed(&conn, &aggregate_id).expect("history");
    assert!(matches!(
        aggregate_history.as_slice(),
        [OracleEvent::AggregateUpdated { members: m, .. }] if m.as_slice() == members.as_slice()
    ));
    assert_eq!(events::count(&conn).expect("count"), 7);
}

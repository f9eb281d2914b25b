//! Command handlers.
//!
//! Every mutating command runs exactly one engine operation against the
//! loaded state and then persists the stores and emitted events in one
//! transaction. A rejected operation leaves both the in-memory state and the
//! database untouched.

use std::path::Path;

use anyhow::Context;
use beacon_crypto::ed25519::{KeyPair, SigningKey};
use beacon_db::queries::events;
use beacon_oracle::access::{RoleTable, Whitelist};
use beacon_oracle::reader::ReaderFacade;
use beacon_oracle::state::OracleState;
use beacon_oracle::{aggregate, alias, signed, templates, update};
use beacon_types::events::OracleEvent;
use beacon_types::observation::{ParameterizedObservation, SignedObservation};
use beacon_types::record::FeedRecord;
use beacon_types::{AccountId, EndpointId, FeedId, ReporterId, SignedWord, TemplateId};
use primitive_types::U256;
use rusqlite::Connection;
use serde_json::{json, Value};

use crate::config::NodeConfig;

type Result = anyhow::Result<Value>;

/// Database file name inside the data directory.
pub const DB_FILE: &str = "beacon.db";

/// A loaded oracle with its database and access tables.
pub struct Node {
    conn: Connection,
    state: OracleState,
    roles: RoleTable,
    whitelist: Whitelist,
}

fn record_json(record: &FeedRecord) -> Value {
    json!({
        "value": record.value.widen().to_string(),
        "timestamp": record.timestamp,
    })
}

impl Node {
    /// Open the database in the configured data directory and load state.
    pub fn open(config: &NodeConfig) -> anyhow::Result<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("cannot create {}", data_dir.display()))?;
        let conn = beacon_db::open(&data_dir.join(DB_FILE))?;
        Self::with_connection(conn, config)
    }

    /// Load state from an already open database.
    pub fn with_connection(conn: Connection, config: &NodeConfig) -> anyhow::Result<Self> {
        let state = beacon_db::load_state(&conn, config.freshness_policy())?;
        Ok(Self {
            conn,
            state,
            roles: config.roles()?,
            whitelist: config.whitelist()?,
        })
    }

    /// Write state and pending events, then clear the events.
    fn persist(&mut self) -> anyhow::Result<usize> {
        let written = beacon_db::save_state(&mut self.conn, &self.state)?;
        self.state.drain_events();
        Ok(written)
    }

    /// Persist and report the single event an operation emitted.
    fn finish(&mut self, event: OracleEvent) -> Result {
        self.persist()?;
        Ok(serde_json::to_value(event)?)
    }

    pub fn register_template(
        &mut self,
        reporter: ReporterId,
        endpoint_id: EndpointId,
        parameters: &[u8],
    ) -> Result {
        let template_id =
            templates::register_template(&mut self.state, reporter, endpoint_id, parameters)?;
        self.persist()?;
        Ok(json!({ "template_id": hex::encode(template_id) }))
    }

    pub fn submit(&mut self, observation: &SignedObservation, now: u64) -> Result {
        let event = update::submit_signed_observation(&mut self.state, observation, now)?;
        self.finish(event)
    }

    pub fn submit_parameterized(&mut self, observation: &ParameterizedObservation, now: u64) -> Result {
        let event = update::submit_parameterized_observation(&mut self.state, observation, now)?;
        self.finish(event)
    }

    pub fn aggregate(&mut self, member_ids: &[FeedId]) -> Result {
        let event = aggregate::update_aggregate_from_stored_members(&mut self.state, member_ids)?;
        self.finish(event)
    }

    /// Aggregate a batch; entries with an empty signature are stored-only.
    pub fn aggregate_signed(&mut self, batch: &[SignedObservation], now: u64) -> Result {
        let reporters: Vec<ReporterId> = batch.iter().map(|o| o.reporter).collect();
        let template_ids: Vec<TemplateId> = batch.iter().map(|o| o.template_id).collect();
        let timestamps: Vec<u64> = batch.iter().map(|o| o.timestamp).collect();
        let payloads: Vec<Vec<u8>> = batch.iter().map(|o| o.payload.clone()).collect();
        let signatures: Vec<Vec<u8>> = batch.iter().map(|o| o.signature.clone()).collect();

        let event = aggregate::update_aggregate_from_signed_observations(
            &mut self.state,
            &reporters,
            &template_ids,
            &timestamps,
            &payloads,
            &signatures,
            now,
        )?;
        self.finish(event)
    }

    pub fn set_alias(&mut self, setter: AccountId, name: &str, feed_id: FeedId) -> Result {
        let name_hash = alias::set_alias(&mut self.state, &self.roles, setter, name, feed_id)?;
        self.persist()?;
        Ok(json!({
            "name": name,
            "name_hash": hex::encode(name_hash),
            "feed_id": hex::encode(feed_id),
        }))
    }

    fn reader(&self) -> ReaderFacade<'_, Whitelist, RoleTable> {
        ReaderFacade::new(&self.state, &self.whitelist, &self.roles)
    }

    pub fn read(&self, feed_id: &FeedId, reader: &AccountId, now: u64) -> Result {
        let record = self.reader().read(feed_id, reader, now)?;
        Ok(record_json(&record))
    }

    pub fn read_alias(&self, name: &str, reader: &AccountId, now: u64) -> Result {
        let record = self.reader().read_by_alias(name, reader, now)?;
        Ok(record_json(&record))
    }

    /// Value-only read; fails when the feed has no data.
    pub fn read_value(&self, feed_id: &FeedId, reader: &AccountId, now: u64) -> Result {
        let value = self.reader().read_value(feed_id, reader, now)?;
        Ok(json!({ "value": value.widen().to_string() }))
    }

    /// Logged events of one feed, oldest first.
    pub fn history(&self, subject: &FeedId) -> Result {
        let events = events::list_for_feed(&self.conn, subject)?;
        Ok(serde_json::to_value(events)?)
    }
}

/// Generate a reporter keypair.
pub fn keygen() -> Value {
    let kp = KeyPair::generate();
    json!({
        "secret_key": hex::encode(kp.signing_key.to_bytes().as_slice()),
        "reporter": hex::encode(kp.identity()),
    })
}

/// Sign a timestamped observation, or a parameterized one when
/// `parameters` is given.
pub fn sign(
    secret: &[u8; 32],
    template_id: TemplateId,
    timestamp: u64,
    value: SignedWord,
    parameters: Option<Vec<u8>>,
) -> Result {
    let key = SigningKey::from_bytes(secret);
    match parameters {
        Some(parameters) => Ok(serde_json::to_value(signed::sign_parameterized(
            &key,
            template_id,
            parameters,
            value,
            U256::from(timestamp),
        ))?),
        None => Ok(serde_json::to_value(signed::sign_observation(
            &key,
            template_id,
            timestamp,
            value,
        ))?),
    }
}

/// Read a JSON document from a file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

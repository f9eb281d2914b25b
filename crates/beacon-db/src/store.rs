//! Loading and saving the whole oracle state.
//!
//! [`save_state`] writes the three keyed stores and the pending event log in
//! one SQL transaction, so a crash never leaves a feed written without its
//! audit event. [`load_state`] re-narrows every stored value; a row that no
//! longer fits its domain type is reported as [`DbError::Corrupt`].

use std::collections::HashMap;

use beacon_oracle::freshness::FreshnessPolicy;
use beacon_oracle::state::OracleState;
use beacon_types::record::{FeedRecord, Template};
use beacon_types::{Int224, SignedWord};
use rusqlite::Connection;

use crate::queries::{aliases, events, feeds, templates};
use crate::{DbError, Result};

fn decode_id(table: &'static str, bytes: Vec<u8>) -> Result<[u8; 32]> {
    <[u8; 32]>::try_from(bytes).map_err(|bytes| DbError::Corrupt {
        table,
        reason: format!("expected a 32-byte identifier, got {} bytes", bytes.len()),
    })
}

fn decode_feed(row: feeds::FeedRow) -> Result<([u8; 32], FeedRecord)> {
    let feed_id = decode_id("feeds", row.feed_id)?;
    let word = decode_id("feeds", row.value)?;
    let value = Int224::try_from(SignedWord::from_be_bytes(&word)).map_err(|e| DbError::Corrupt {
        table: "feeds",
        reason: e.to_string(),
    })?;
    let timestamp = u32::try_from(row.timestamp).map_err(|_| DbError::Corrupt {
        table: "feeds",
        reason: format!("timestamp {} out of range", row.timestamp),
    })?;
    Ok((feed_id, FeedRecord { value, timestamp }))
}

fn decode_template(row: templates::TemplateRow) -> Result<([u8; 32], Template)> {
    Ok((
        decode_id("templates", row.template_id)?,
        Template {
            reporter: decode_id("templates", row.reporter)?,
            endpoint_id: decode_id("templates", row.endpoint_id)?,
            parameters: row.parameters,
        },
    ))
}

/// Rebuild the oracle state from the database.
///
/// The event log is not loaded; it lives only in `feed_events`.
pub fn load_state(conn: &Connection, policy: FreshnessPolicy) -> Result<OracleState> {
    let feeds = feeds::list(conn)?
        .into_iter()
        .map(decode_feed)
        .collect::<Result<HashMap<_, _>>>()?;
    let templates = templates::list(conn)?
        .into_iter()
        .map(decode_template)
        .collect::<Result<HashMap<_, _>>>()?;
    let aliases = aliases::list(conn)?
        .into_iter()
        .map(|row| {
            Ok((
                decode_id("aliases", row.name_hash)?,
                decode_id("aliases", row.feed_id)?,
            ))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    tracing::debug!(
        feeds = feeds.len(),
        templates = templates.len(),
        aliases = aliases.len(),
        "oracle state loaded"
    );
    Ok(OracleState::from_parts(policy, feeds, templates, aliases))
}

/// Persist every store of `state` and append its pending events.
///
/// Returns the number of events written. The caller should then drain the
/// events from `state` so they are not appended twice.
pub fn save_state(conn: &mut Connection, state: &OracleState) -> Result<usize> {
    let tx = conn.transaction()?;
    for (feed_id, record) in state.feeds() {
        feeds::upsert(&tx, feed_id, record)?;
    }
    for (template_id, template) in state.templates() {
        templates::upsert(&tx, template_id, template)?;
    }
    for (name_hash, feed_id) in state.aliases() {
        aliases::set(&tx, name_hash, feed_id)?;
    }
    for event in state.events() {
        events::append(&tx, event)?;
    }
    tx.commit()?;

    tracing::debug!(events = state.events().len(), "oracle state saved");
    Ok(state.events().len())
}

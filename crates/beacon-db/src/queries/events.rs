//! Audit event log queries.
//!
//! Events are stored as JSON bodies keyed by their subject (feed,
//! aggregate, template or alias identifier), in emission order.

use beacon_types::events::OracleEvent;
use rusqlite::Connection;

use crate::{DbError, Result};

/// Append one event to the log. Returns its row id.
pub fn append(conn: &Connection, event: &OracleEvent) -> Result<i64> {
    let body =
        serde_json::to_string(event).map_err(|e| DbError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO feed_events (subject, kind, body) VALUES (?1, ?2, ?3)",
        rusqlite::params![event.subject().as_slice(), event.kind(), body],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Events whose subject is `subject`, oldest first.
pub fn list_for_feed(conn: &Connection, subject: &[u8; 32]) -> Result<Vec<OracleEvent>> {
    let mut stmt =
        conn.prepare("SELECT body FROM feed_events WHERE subject = ?1 ORDER BY id")?;

    let bodies = stmt
        .query_map([subject.as_slice()], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    bodies
        .iter()
        .map(|body| {
            serde_json::from_str(body).map_err(|e| DbError::Serialization(e.to_string()))
        })
        .collect()
}

/// Total number of logged events.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM feed_events", [], |row| row.get(0))?;
    Ok(n as u64)
}

//! Alias registry queries.

use beacon_types::{FeedId, NameHash};
use rusqlite::Connection;

use crate::Result;

/// A raw alias row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRow {
    pub name_hash: Vec<u8>,
    pub feed_id: Vec<u8>,
}

/// Point an alias at a feed, replacing any previous target.
pub fn set(conn: &Connection, name_hash: &NameHash, feed_id: &FeedId) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO aliases (name_hash, feed_id) VALUES (?1, ?2)",
        rusqlite::params![name_hash.as_slice(), feed_id.as_slice()],
    )?;
    Ok(())
}

/// List every alias.
pub fn list(conn: &Connection) -> Result<Vec<AliasRow>> {
    let mut stmt = conn.prepare("SELECT name_hash, feed_id FROM aliases")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(AliasRow {
                name_hash: row.get(0)?,
                feed_id: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

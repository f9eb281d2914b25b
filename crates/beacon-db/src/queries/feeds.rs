//! Feed store queries.

use beacon_types::record::FeedRecord;
use beacon_types::FeedId;
use rusqlite::Connection;

use crate::Result;

/// A raw feed row. Decoded into a [`FeedRecord`] by [`crate::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub feed_id: Vec<u8>,
    pub value: Vec<u8>,
    pub timestamp: i64,
}

/// Insert or overwrite the record of a feed.
pub fn upsert(conn: &Connection, feed_id: &FeedId, record: &FeedRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO feeds (feed_id, value, timestamp) VALUES (?1, ?2, ?3)
         ON CONFLICT(feed_id) DO UPDATE SET value = excluded.value, timestamp = excluded.timestamp",
        rusqlite::params![
            feed_id.as_slice(),
            record.value.widen().to_be_bytes().as_slice(),
            i64::from(record.timestamp),
        ],
    )?;
    Ok(())
}

/// List every stored feed.
pub fn list(conn: &Connection) -> Result<Vec<FeedRow>> {
    let mut stmt = conn.prepare("SELECT feed_id, value, timestamp FROM feeds")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(FeedRow {
                feed_id: row.get(0)?,
                value: row.get(1)?,
                timestamp: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

//! SQL schema definitions.

/// Complete schema for the v1 beacon database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Feed store: one row per feed, overwritten on every accepted update
-- ============================================================

CREATE TABLE IF NOT EXISTS feeds (
    feed_id BLOB PRIMARY KEY CHECK (length(feed_id) = 32),
    value BLOB NOT NULL CHECK (length(value) = 32),
    timestamp INTEGER NOT NULL CHECK (timestamp >= 0)
);

-- ============================================================
-- Registries
-- ============================================================

CREATE TABLE IF NOT EXISTS templates (
    template_id BLOB PRIMARY KEY CHECK (length(template_id) = 32),
    reporter BLOB NOT NULL CHECK (length(reporter) = 32),
    endpoint_id BLOB NOT NULL CHECK (length(endpoint_id) = 32),
    parameters BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS aliases (
    name_hash BLOB PRIMARY KEY CHECK (length(name_hash) = 32),
    feed_id BLOB NOT NULL CHECK (length(feed_id) = 32)
);

-- ============================================================
-- Audit log: emitted events carry the un-narrowed values
-- ============================================================

CREATE TABLE IF NOT EXISTS feed_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject BLOB NOT NULL,
    kind TEXT NOT NULL,
    body TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feed_events_subject ON feed_events(subject, id);
"#;

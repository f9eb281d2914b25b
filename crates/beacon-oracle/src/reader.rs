//! Gated read access to committed feeds.
//!
//! A caller may read when any of these holds:
//!
//! - the caller is the all-zero "anyone" identity
//! - the caller is an unlimited reader
//! - the access gate whitelists the caller for the resource at `now`
//!
//! Direct reads check the feed identifier; alias reads check the alias
//! name hash, since a grant is given on the name rather than on whatever it
//! currently points at.

use beacon_types::record::FeedRecord;
use beacon_types::{AccountId, FeedId, Int224, ZERO_ID};

use crate::access::{AccessGate, RoleGate};
use crate::state::OracleState;
use crate::{ids, OracleError, Result};

/// Read-only view of the oracle behind an access gate.
pub struct ReaderFacade<'a, G, R> {
    state: &'a OracleState,
    gate: &'a G,
    roles: &'a R,
}

impl<'a, G: AccessGate, R: RoleGate> ReaderFacade<'a, G, R> {
    pub fn new(state: &'a OracleState, gate: &'a G, roles: &'a R) -> Self {
        Self { state, gate, roles }
    }

    /// Whether `caller` may read `resource` at `now`.
    pub fn can_read(&self, resource: &[u8; 32], caller: &AccountId, now: u64) -> bool {
        *caller == ZERO_ID
            || self.roles.is_unlimited_reader(caller)
            || self.gate.is_whitelisted(resource, caller, now)
    }

    fn authorize(&self, resource: &[u8; 32], caller: &AccountId, now: u64) -> Result<()> {
        if self.can_read(resource, caller, now) {
            return Ok(());
        }
        tracing::debug!(
            resource = %hex::encode(resource),
            caller = %hex::encode(caller),
            "read denied"
        );
        Err(OracleError::AccessDenied(format!(
            "{} may not read {}",
            hex::encode(caller),
            hex::encode(resource)
        )))
    }

    /// The stored record of `feed_id`, or the zero record if it was never
    /// written.
    ///
    /// # Errors
    ///
    /// [`OracleError::AccessDenied`] if `caller` may not read the feed.
    pub fn read(&self, feed_id: &FeedId, caller: &AccountId, now: u64) -> Result<FeedRecord> {
        self.authorize(feed_id, caller, now)?;
        Ok(self.state.feed(feed_id))
    }

    /// The stored value of `feed_id`.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), plus [`OracleError::NoData`] if the feed was
    /// never written.
    pub fn read_value(&self, feed_id: &FeedId, caller: &AccountId, now: u64) -> Result<Int224> {
        let record = self.read(feed_id, caller, now)?;
        if record.is_empty() {
            return Err(OracleError::NoData(hex::encode(feed_id)));
        }
        Ok(record.value)
    }

    /// The record of the feed `name` points at. An unset alias reads as the
    /// zero record.
    pub fn read_by_alias(&self, name: &str, caller: &AccountId, now: u64) -> Result<FeedRecord> {
        let name_hash = ids::alias_name_hash(name);
        self.authorize(&name_hash, caller, now)?;
        Ok(self
            .state
            .alias(&name_hash)
            .map(|feed_id| self.state.feed(&feed_id))
            .unwrap_or_default())
    }

    /// The value of the feed `name` points at.
    ///
    /// # Errors
    ///
    /// [`OracleError::NoData`] if the alias is unset or its feed was never
    /// written.
    pub fn read_value_by_alias(&self, name: &str, caller: &AccountId, now: u64) -> Result<Int224> {
        let record = self.read_by_alias(name, caller, now)?;
        if record.is_empty() {
            return Err(OracleError::NoData(format!("alias {name}")));
        }
        Ok(record.value)
    }
}

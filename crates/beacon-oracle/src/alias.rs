//! Alias registry: human-readable names for feeds.
//!
//! Aliases are keyed by the hash of the name. They can be re-pointed at any
//! time and may point at a feed that was never written.

use beacon_types::events::OracleEvent;
use beacon_types::{AccountId, FeedId, NameHash};

use crate::access::RoleGate;
use crate::state::{Changeset, OracleState};
use crate::{ids, OracleError, Result};

/// Point `name` at `feed_id`.
///
/// # Errors
///
/// - [`OracleError::EmptyAliasName`] if `name` is empty
/// - [`OracleError::AccessDenied`] unless `setter` is the manager or holds
///   the alias-setter role
pub fn set_alias(
    state: &mut OracleState,
    roles: &impl RoleGate,
    setter: AccountId,
    name: &str,
    feed_id: FeedId,
) -> Result<NameHash> {
    if name.is_empty() {
        return Err(OracleError::EmptyAliasName);
    }
    let is_manager = roles.manager() == Some(setter);
    if !is_manager && !roles.is_alias_setter(&setter) {
        tracing::warn!(setter = %hex::encode(setter), name, "alias change denied");
        return Err(OracleError::AccessDenied(format!(
            "{} may not set aliases",
            hex::encode(setter)
        )));
    }

    let name_hash = ids::alias_name_hash(name);
    let mut changes = Changeset::new();
    changes.write_alias(name_hash, feed_id).emit(OracleEvent::AliasSet {
        name_hash,
        feed_id,
        setter,
    });
    state.commit(changes);

    tracing::info!(name, feed_id = %hex::encode(feed_id), "alias set");
    Ok(name_hash)
}

/// The feed `name` points at, if it was ever set.
pub fn resolve_alias(state: &OracleState, name: &str) -> Option<FeedId> {
    state.alias(&ids::alias_name_hash(name))
}

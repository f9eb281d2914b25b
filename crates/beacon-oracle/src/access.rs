//! Access and role gates.
//!
//! The oracle only ever queries these; granting and revoking belong to
//! whoever owns the tables. [`Whitelist`] and [`RoleTable`] are the
//! in-memory implementations used by the node and in tests.

use std::collections::{HashMap, HashSet};

use beacon_types::record::WhitelistStatus;
use beacon_types::AccountId;

/// Per-resource read permissions.
///
/// A resource is a feed identifier or an alias name hash.
pub trait AccessGate {
    /// Whether `reader` may read `resource` at `now`.
    fn is_whitelisted(&self, resource: &[u8; 32], reader: &AccountId, now: u64) -> bool {
        self.whitelist_status(resource, reader).is_active(now)
    }

    /// The raw grant state of `reader` on `resource`.
    fn whitelist_status(&self, resource: &[u8; 32], reader: &AccountId) -> WhitelistStatus;

    /// Whether `granter` holds an indefinite grant of `resource` for `reader`.
    fn is_indefinitely_whitelisted_by(
        &self,
        resource: &[u8; 32],
        reader: &AccountId,
        granter: &AccountId,
    ) -> bool;
}

/// System-wide roles.
pub trait RoleGate {
    /// Readers that bypass the whitelist entirely.
    fn is_unlimited_reader(&self, account: &AccountId) -> bool;

    /// Accounts allowed to set aliases.
    fn is_alias_setter(&self, account: &AccountId) -> bool;

    /// The designated manager, if one is configured.
    fn manager(&self) -> Option<AccountId>;
}

/// In-memory whitelist keyed by `(resource, reader)`.
#[derive(Debug, Default, Clone)]
pub struct Whitelist {
    expirations: HashMap<([u8; 32], AccountId), u64>,
    indefinite: HashSet<([u8; 32], AccountId, AccountId)>,
}

impl Whitelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-bounded grant of `reader` on `resource`.
    pub fn set_expiration(&mut self, resource: [u8; 32], reader: AccountId, expires_at: u64) {
        self.expirations.insert((resource, reader), expires_at);
    }

    /// Record an indefinite grant by `granter`.
    pub fn grant_indefinite(&mut self, resource: [u8; 32], reader: AccountId, granter: AccountId) {
        self.indefinite.insert((resource, reader, granter));
    }

    /// Withdraw an indefinite grant. Returns whether one existed.
    pub fn revoke_indefinite(
        &mut self,
        resource: [u8; 32],
        reader: AccountId,
        granter: AccountId,
    ) -> bool {
        self.indefinite.remove(&(resource, reader, granter))
    }
}

impl AccessGate for Whitelist {
    fn whitelist_status(&self, resource: &[u8; 32], reader: &AccountId) -> WhitelistStatus {
        let expires_at = self
            .expirations
            .get(&(*resource, *reader))
            .copied()
            .unwrap_or(0);
        let count = self
            .indefinite
            .iter()
            .filter(|(r, who, _)| r == resource && who == reader)
            .count();
        WhitelistStatus {
            expires_at,
            indefinite_count: u32::try_from(count).unwrap_or(u32::MAX),
        }
    }

    fn is_indefinitely_whitelisted_by(
        &self,
        resource: &[u8; 32],
        reader: &AccountId,
        granter: &AccountId,
    ) -> bool {
        self.indefinite.contains(&(*resource, *reader, *granter))
    }
}

/// In-memory role assignments.
#[derive(Debug, Default, Clone)]
pub struct RoleTable {
    manager: Option<AccountId>,
    unlimited_readers: HashSet<AccountId>,
    alias_setters: HashSet<AccountId>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manager(manager: AccountId) -> Self {
        Self {
            manager: Some(manager),
            ..Self::default()
        }
    }

    pub fn add_unlimited_reader(&mut self, account: AccountId) {
        self.unlimited_readers.insert(account);
    }

    pub fn add_alias_setter(&mut self, account: AccountId) {
        self.alias_setters.insert(account);
    }
}

impl RoleGate for RoleTable {
    fn is_unlimited_reader(&self, account: &AccountId) -> bool {
        self.unlimited_readers.contains(account)
    }

    fn is_alias_setter(&self, account: &AccountId) -> bool {
        self.alias_setters.contains(account)
    }

    fn manager(&self) -> Option<AccountId> {
        self.manager
    }
}

//! Oracle state container.
//!
//! Holds the three keyed stores (feeds, templates, aliases), the freshness
//! policy, and the log of emitted events. Operations never write directly:
//! they read the state, validate everything, and only then hand a
//! [`Changeset`] to [`OracleState::commit`]. A rejected operation therefore
//! leaves the state exactly as it found it.

use std::collections::HashMap;

use beacon_types::events::OracleEvent;
use beacon_types::record::{FeedRecord, Template};
use beacon_types::{FeedId, NameHash, TemplateId};

use crate::freshness::FreshnessPolicy;

/// Writes staged by one operation, applied together by [`OracleState::commit`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Changeset {
    feeds: Vec<(FeedId, FeedRecord)>,
    templates: Vec<(TemplateId, Template)>,
    aliases: Vec<(NameHash, FeedId)>,
    events: Vec<OracleEvent>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a feed record write.
    pub fn write_feed(&mut self, feed_id: FeedId, record: FeedRecord) -> &mut Self {
        self.feeds.push((feed_id, record));
        self
    }

    /// Stage a template registration.
    pub fn write_template(&mut self, template_id: TemplateId, template: Template) -> &mut Self {
        self.templates.push((template_id, template));
        self
    }

    /// Stage an alias assignment.
    pub fn write_alias(&mut self, name_hash: NameHash, feed_id: FeedId) -> &mut Self {
        self.aliases.push((name_hash, feed_id));
        self
    }

    /// Stage an event for emission on commit.
    pub fn emit(&mut self, event: OracleEvent) -> &mut Self {
        self.events.push(event);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
            && self.templates.is_empty()
            && self.aliases.is_empty()
            && self.events.is_empty()
    }
}

/// All oracle state, passed explicitly to every operation.
#[derive(Debug, Default, Clone)]
pub struct OracleState {
    policy: FreshnessPolicy,
    feeds: HashMap<FeedId, FeedRecord>,
    templates: HashMap<TemplateId, Template>,
    aliases: HashMap<NameHash, FeedId>,
    events: Vec<OracleEvent>,
}

impl OracleState {
    /// Create an empty state with the default freshness policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty state with a custom freshness policy.
    pub fn with_policy(policy: FreshnessPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Rebuild a state from previously persisted stores.
    pub fn from_parts(
        policy: FreshnessPolicy,
        feeds: HashMap<FeedId, FeedRecord>,
        templates: HashMap<TemplateId, Template>,
        aliases: HashMap<NameHash, FeedId>,
    ) -> Self {
        Self {
            policy,
            feeds,
            templates,
            aliases,
            events: Vec::new(),
        }
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    /// The stored record of a feed; the zero record if it was never written.
    pub fn feed(&self, feed_id: &FeedId) -> FeedRecord {
        self.feeds.get(feed_id).copied().unwrap_or_default()
    }

    /// The template registered under `template_id`, if any.
    pub fn template(&self, template_id: &TemplateId) -> Option<&Template> {
        self.templates.get(template_id)
    }

    /// The feed an alias points at, if the alias was ever set.
    pub fn alias(&self, name_hash: &NameHash) -> Option<FeedId> {
        self.aliases.get(name_hash).copied()
    }

    pub fn feeds(&self) -> impl Iterator<Item = (&FeedId, &FeedRecord)> {
        self.feeds.iter()
    }

    pub fn templates(&self) -> impl Iterator<Item = (&TemplateId, &Template)> {
        self.templates.iter()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&NameHash, &FeedId)> {
        self.aliases.iter()
    }

    /// Events emitted since the last [`drain_events`](Self::drain_events).
    pub fn events(&self) -> &[OracleEvent] {
        &self.events
    }

    /// Take the pending events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<OracleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply every staged write of `changes` in one step.
    pub fn commit(&mut self, changes: Changeset) {
        let Changeset {
            feeds,
            templates,
            aliases,
            events,
        } = changes;
        self.feeds.extend(feeds);
        self.templates.extend(templates);
        self.aliases.extend(aliases);
        self.events.extend(events);
    }
}

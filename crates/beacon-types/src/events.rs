//! Audit events emitted by successful oracle operations.
//!
//! Update events carry the un-narrowed working value and timestamp, so an
//! indexer sees exactly what was aggregated or signed, independent of the
//! narrowed form kept in the feed store.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{AccountId, FeedId, NameHash, ReporterId, SignedWord, TemplateId};

/// One event per successful state-changing operation.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OracleEvent {
    /// A single-source feed accepted a timestamped signed observation.
    SingleSourceUpdated {
        #[serde_as(as = "Hex")]
        feed_id: FeedId,
        #[serde_as(as = "Hex")]
        template_id: TemplateId,
        value: SignedWord,
        timestamp: u64,
    },

    /// A parameterized feed accepted an observation carrying its own timestamp.
    ParameterizedUpdated {
        #[serde_as(as = "Hex")]
        feed_id: FeedId,
        #[serde_as(as = "Hex")]
        template_id: TemplateId,
        value: SignedWord,
        timestamp: u64,
    },

    /// An aggregate feed was recomputed from its members.
    AggregateUpdated {
        #[serde_as(as = "Hex")]
        aggregate_id: FeedId,
        #[serde_as(as = "Vec<Hex>")]
        members: Vec<FeedId>,
        value: SignedWord,
        timestamp: u64,
    },

    /// A template was registered (or re-registered).
    TemplateRegistered {
        #[serde_as(as = "Hex")]
        template_id: TemplateId,
        #[serde_as(as = "Hex")]
        reporter: ReporterId,
    },

    /// An alias was pointed at a feed.
    AliasSet {
        #[serde_as(as = "Hex")]
        name_hash: NameHash,
        #[serde_as(as = "Hex")]
        feed_id: FeedId,
        #[serde_as(as = "Hex")]
        setter: AccountId,
    },
}

impl OracleEvent {
    /// The identifier the event is about (feed, aggregate, template or alias).
    pub fn subject(&self) -> &[u8; 32] {
        match self {
            Self::SingleSourceUpdated { feed_id, .. } => feed_id,
            Self::ParameterizedUpdated { feed_id, .. } => feed_id,
            Self::AggregateUpdated { aggregate_id, .. } => aggregate_id,
            Self::TemplateRegistered { template_id, .. } => template_id,
            Self::AliasSet { name_hash, .. } => name_hash,
        }
    }

    /// Stable snake_case name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SingleSourceUpdated { .. } => "single_source_updated",
            Self::ParameterizedUpdated { .. } => "parameterized_updated",
            Self::AggregateUpdated { .. } => "aggregate_updated",
            Self::TemplateRegistered { .. } => "template_registered",
            Self::AliasSet { .. } => "alias_set",
        }
    }
}

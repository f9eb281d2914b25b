//! Wire forms of reporter-signed observations.
//!
//! These are what a reporter hands to a submitter: all byte fields travel
//! as lowercase hex in JSON.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{ReporterId, TemplateId};

/// An observation signed over `(template_id, timestamp, payload)`.
///
/// An empty `signature` marks a member that should be read from storage
/// instead of verified (batch aggregation only).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedObservation {
    #[serde_as(as = "Hex")]
    pub reporter: ReporterId,
    #[serde_as(as = "Hex")]
    pub template_id: TemplateId,
    pub timestamp: u64,
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub payload: Vec<u8>,
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub signature: Vec<u8>,
}

impl SignedObservation {
    /// Whether this entry carries a signature to verify.
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

/// An observation signed over `(template_id, parameters, payload)`, whose
/// payload carries the timestamp next to the value.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterizedObservation {
    #[serde_as(as = "Hex")]
    pub template_id: TemplateId,
    #[serde_as(as = "Hex")]
    pub parameters: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

//! Stored records: feeds, templates and whitelist status.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{EndpointId, Int224, ReporterId};

/// The latest accepted reading of a feed.
///
/// A feed that was never updated reads as the default (zero) record; a zero
/// `timestamp` is the "no data" sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub value: Int224,
    pub timestamp: u32,
}

impl FeedRecord {
    /// True when the feed has never been written.
    pub fn is_empty(&self) -> bool {
        self.timestamp == 0
    }
}

/// A registered template: which reporter may sign for which endpoint call.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde_as(as = "Hex")]
    pub reporter: ReporterId,
    #[serde_as(as = "Hex")]
    pub endpoint_id: EndpointId,
    #[serde_as(as = "Hex")]
    pub parameters: Vec<u8>,
}

/// Read-access grant state of one reader for one resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistStatus {
    /// Unix timestamp until which the time-bounded grant is valid.
    pub expires_at: u64,
    /// Number of granters currently holding an indefinite grant.
    pub indefinite_count: u32,
}

impl WhitelistStatus {
    /// Whether either kind of grant is in force at `now`.
    pub fn is_active(&self, now: u64) -> bool {
        self.indefinite_count > 0 || self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_empty() {
        let record = FeedRecord::default();
        assert!(record.is_empty());
        assert_eq!(record.value, Int224::ZERO);
    }

    #[test]
    fn test_whitelist_status_expiry() {
        let status = WhitelistStatus {
            expires_at: 1000,
            indefinite_count: 0,
        };
        assert!(status.is_active(999));
        assert!(!status.is_active(1000));

        let indefinite = WhitelistStatus {
            expires_at: 0,
            indefinite_count: 1,
        };
        assert!(indefinite.is_active(u64::MAX));
    }

    #[test]
    fn test_template_json_uses_hex() {
        let template = Template {
            reporter: [0xAB; 32],
            endpoint_id: [0x01; 32],
            parameters: vec![0xDE, 0xAD],
        };
        let json = serde_json::to_value(&template).expect("serialize");
        assert_eq!(json["parameters"], "dead");
        let back: Template = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, template);
    }
}

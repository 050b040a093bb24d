//! Height cache entries shared by the oracle and the store mirror.

use super::identifiers::BlockId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a cached height came from.
///
/// `Dom` always wins over `Estimated` for the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeightSource {
    /// Computed by the estimator from the manifest.
    Estimated,
    /// Measured from rendered layout.
    Dom,
}

/// One cached block height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightCacheEntry {
    /// Block the height belongs to.
    pub block_id: BlockId,
    /// Height in CSS pixels.
    pub height: f64,
    /// Estimated or measured.
    pub source: HeightSource,
    /// When the height was recorded.
    pub timestamp: DateTime<Utc>,
}

impl HeightCacheEntry {
    /// Estimated entry stamped now.
    pub fn estimated(block_id: BlockId, height: f64) -> Self {
        Self {
            block_id,
            height,
            source: HeightSource::Estimated,
            timestamp: Utc::now(),
        }
    }

    /// Measured entry stamped now.
    pub fn dom(block_id: BlockId, height: f64) -> Self {
        Self {
            block_id,
            height,
            source: HeightSource::Dom,
            timestamp: Utc::now(),
        }
    }

    /// True when this entry was measured.
    pub fn is_dom(&self) -> bool {
        self.source == HeightSource::Dom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_source() {
        let id = BlockId::new("b").unwrap();
        assert!(!HeightCacheEntry::estimated(id.clone(), 10.0).is_dom());
        assert!(HeightCacheEntry::dom(id, 10.0).is_dom());
    }

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HeightSource::Dom).unwrap(),
            "\"dom\""
        );
        assert_eq!(
            serde_json::to_string(&HeightSource::Estimated).unwrap(),
            "\"estimated\""
        );
    }

    #[test]
    fn entry_serializes_camel_case_fields() {
        let entry = HeightCacheEntry::dom(BlockId::new("b").unwrap(), 45.0);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["blockId"], "b");
        assert_eq!(json["height"], 45.0);
        assert_eq!(json["source"], "dom");
        assert!(json.get("timestamp").is_some());
    }
}

//! Storage accounting and cascade reporting models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// File count and byte total for one grouping bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageBucket {
    pub files: u64,
    pub bytes: u64,
}

impl UsageBucket {
    pub fn add(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }
}

/// Aggregate storage usage, computed by a live directory walk.
///
/// Entity-scoped scans group by file category; root-level scans group by
/// entity-type bucket. The unused map stays empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageUsage {
    pub total_files: u64,
    pub total_bytes: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub by_category: BTreeMap<String, UsageBucket>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub by_entity_type: BTreeMap<String, UsageBucket>,
}

impl StorageUsage {
    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Outcome of a cascading hard delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeStats {
    pub deleted_count: u64,
    pub failed_count: u64,
    pub bytes_freed: u64,
}

impl CascadeStats {
    pub fn absorb(&mut self, other: CascadeStats) {
        self.deleted_count += other.deleted_count;
        self.failed_count += other.failed_count;
        self.bytes_freed += other.bytes_freed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_bucket_accumulates() {
        let mut bucket = UsageBucket::default();
        bucket.add(100);
        bucket.add(400);
        assert_eq!(bucket.files, 2);
        assert_eq!(bucket.bytes, 500);
    }

    #[test]
    fn test_cascade_stats_absorb() {
        let mut total = CascadeStats::default();
        total.absorb(CascadeStats {
            deleted_count: 3,
            failed_count: 1,
            bytes_freed: 1024,
        });
        total.absorb(CascadeStats {
            deleted_count: 2,
            failed_count: 0,
            bytes_freed: 512,
        });
        assert_eq!(total.deleted_count, 5);
        assert_eq!(total.failed_count, 1);
        assert_eq!(total.bytes_freed, 1536);
    }

    #[test]
    fn test_empty_maps_not_serialized() {
        let usage = StorageUsage {
            total_files: 1,
            total_bytes: 10,
            ..Default::default()
        };
        let json = serde_json::to_string(&usage).unwrap();
        assert!(!json.contains("by_category"));
        assert!(!json.contains("by_entity_type"));
    }
}

//! Second-Bucket Index
//!
//! Derived in-memory index mapping (media, second) to candidate annotation
//! ids, so that per-frame "what is visible at time T" queries during
//! playback stay near O(1) instead of scanning every annotation.
//!
//! The index carries no information not already present in the persistent
//! store; it is always safe to discard and rebuild. Callers must re-check
//! every candidate against the authoritative record before surfacing it.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tracing::debug;

use super::models::Annotation;
use crate::{AnnotationId, MediaId, TimeMs};

/// Width of one bucket in milliseconds
const BUCKET_MS: TimeMs = 1000;

/// Per-media map from second bucket to the ids registered in it
type BucketMap = HashMap<i64, Vec<AnnotationId>>;

/// Rebuildable second-bucket index over annotation spans.
///
/// Owned by the store instance; writers drop a media's whole entry on any
/// mutation and readers rebuild lazily on the next query.
pub struct BucketIndex {
    buckets: Mutex<HashMap<MediaId, BucketMap>>,
}

impl BucketIndex {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if an index is currently materialized for this media
    pub fn contains(&self, media_id: &str) -> bool {
        self.buckets.lock().unwrap().contains_key(media_id)
    }

    /// Replaces the index for a media with one built from the given
    /// annotations.
    ///
    /// Every annotation registers in each second bucket its visible span
    /// touches, so multi-second ranges appear in all their buckets.
    pub fn rebuild(&self, media_id: &str, annotations: &[Annotation]) {
        let mut map = BucketMap::new();

        for annotation in annotations {
            let start_second = annotation.start_ms.div_euclid(BUCKET_MS);
            let end_second = match annotation.end_ms {
                Some(end_ms) if end_ms > annotation.start_ms => end_ms.div_euclid(BUCKET_MS),
                _ => start_second,
            };

            for second in start_second..=end_second {
                map.entry(second).or_default().push(annotation.id.clone());
            }
        }

        debug!(
            "rebuilt bucket index for media {}: {} annotations, {} buckets",
            media_id,
            annotations.len(),
            map.len()
        );

        self.buckets
            .lock()
            .unwrap()
            .insert(media_id.to_string(), map);
    }

    /// Drops the whole index for a media. No incremental patching: writes
    /// are rare relative to playback reads, so correctness wins.
    pub fn invalidate(&self, media_id: &str) {
        self.buckets.lock().unwrap().remove(media_id);
    }

    /// Returns the deduplicated candidate ids around the given time.
    ///
    /// Checks the bucket for the time's second plus both neighbors; the
    /// margin catches point annotations whose visibility window straddles a
    /// second boundary even though the event registered in only one bucket.
    pub fn candidates(&self, media_id: &str, time_ms: TimeMs) -> Vec<AnnotationId> {
        let second = time_ms.div_euclid(BUCKET_MS);

        let buckets = self.buckets.lock().unwrap();
        let Some(map) = buckets.get(media_id) else {
            return Vec::new();
        };

        let mut ids = HashSet::new();
        for s in second - 1..=second + 1 {
            if let Some(bucket) = map.get(&s) {
                ids.extend(bucket.iter().cloned());
            }
        }

        ids.into_iter().collect()
    }
}

impl Default for BucketIndex {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

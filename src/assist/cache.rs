use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Summary of one slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSummary {
    pub slide: u32,
    pub summary: String,
}

/// Identity of an uploaded document, derived from its bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey {
    hash: u64,
    len: usize,
}

impl ContentKey {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            len: bytes.len(),
        }
    }
}

/// Per-document slide summaries, keyed by document content
#[derive(Debug, Default)]
pub struct SummaryCache {
    entries: HashMap<ContentKey, Vec<SlideSummary>>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ContentKey) -> Option<&[SlideSummary]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Store summaries for `key`, returning any previous entry
    pub fn insert(&mut self, key: ContentKey, summaries: Vec<SlideSummary>) -> Option<Vec<SlideSummary>> {
        debug!("Caching {} summaries for {:?}", summaries.len(), key);
        self.entries.insert(key, summaries)
    }

    pub fn invalidate(&mut self, key: &ContentKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summaries(count: u32) -> Vec<SlideSummary> {
        (1..=count)
            .map(|slide| SlideSummary {
                slide,
                summary: format!("point {}", slide),
            })
            .collect()
    }

    #[test]
    fn test_same_bytes_same_key() {
        assert_eq!(ContentKey::of(b"%PDF-1.7 deck"), ContentKey::of(b"%PDF-1.7 deck"));
        assert_ne!(ContentKey::of(b"%PDF-1.7 deck"), ContentKey::of(b"%PDF-1.7 deck2"));
    }

    #[test]
    fn test_documents_do_not_share_entries() {
        let mut cache = SummaryCache::new();
        let first = ContentKey::of(b"first deck");
        let second = ContentKey::of(b"second deck");

        cache.insert(first, summaries(2));
        assert_eq!(cache.get(&first).map(<[_]>::len), Some(2));
        assert!(cache.get(&second).is_none());

        cache.insert(second, summaries(5));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&first).map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = SummaryCache::new();
        let key = ContentKey::of(b"deck");

        assert!(cache.insert(key, summaries(1)).is_none());
        assert!(cache.insert(key, summaries(3)).is_some());
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));

        cache.insert(key, summaries(1));
        cache.clear();
        assert!(cache.is_empty());
    }
}

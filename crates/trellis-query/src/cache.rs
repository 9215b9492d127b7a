//! Bounded LRU of ordered result indices.
//!
//! Keyed by a fingerprint of everything that decides which records are kept
//! and in what order (filters, search, sorts). Layout and page are not part of
//! the key, so paging through a result reuses the cached ordering.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use trellis_model::{FilterEntry, SortKey};

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    capacity: usize,
    entries: HashMap<String, Rc<[usize]>>,
    /// Least recently used first.
    order: VecDeque<String>,
    stats: CacheStats,
}

impl ResultCache {
    /// A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn get(&mut self, key: &str) -> Option<Rc<[usize]>> {
        match self.entries.get(key) {
            Some(indices) => {
                let indices = Rc::clone(indices);
                self.touch(key);
                self.stats.hits += 1;
                Some(indices)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: String, indices: Rc<[usize]>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), indices).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
            tracing::debug!(capacity = self.capacity, "evicted cached ordering");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|existing| existing == key)
            && let Some(key) = self.order.remove(pos)
        {
            self.order.push_back(key);
        }
    }
}

/// Cache key for a query. `None` if the query cannot be serialized.
pub fn fingerprint(filters: &[FilterEntry], search: &str, sorts: &[SortKey]) -> Option<String> {
    serde_json::to_string(&(filters, search.trim().to_lowercase(), sorts)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(values: &[usize]) -> Rc<[usize]> {
        Rc::from(values)
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let mut cache = ResultCache::new(2);
        cache.insert("a".to_string(), entry(&[1]));
        cache.insert("b".to_string(), entry(&[2]));
        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), entry(&[3]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a").as_deref(), Some(&[1][..]));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = ResultCache::new(0);
        cache.insert("a".to_string(), entry(&[1]));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 0);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_fingerprint_ignores_search_case() {
        assert_eq!(fingerprint(&[], "Den", &[]), fingerprint(&[], " den", &[]));
    }
}

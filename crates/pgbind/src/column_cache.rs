//! Per-table column list cache.
//!
//! [`crate::Db`] filters write payloads against the columns a table actually has.
//! Looking those up costs a catalog round trip, so results are kept here with LRU
//! eviction. A capacity of `0` disables caching.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// Column names keyed by (possibly schema-qualified) table name.
#[derive(Debug)]
pub struct ColumnCache {
    inner: Mutex<ColumnCacheInner>,
}

#[derive(Debug)]
struct ColumnCacheInner {
    capacity: usize,
    map: HashMap<String, Arc<[String]>>,
    order: VecDeque<String>,
}

impl ColumnCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ColumnCacheInner {
                capacity,
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ColumnCacheInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a table, marking it most recently used.
    pub fn get(&self, table: &str) -> Option<Arc<[String]>> {
        let mut inner = self.lock();
        let columns = inner.map.get(table).cloned()?;
        inner.touch(table);
        Some(columns)
    }

    /// Store the columns of `table`, replacing any previous entry.
    pub fn insert(&self, table: impl Into<String>, columns: Vec<String>) -> Arc<[String]> {
        let table = table.into();
        let columns: Arc<[String]> = columns.into();
        let mut inner = self.lock();

        if inner.map.insert(table.clone(), Arc::clone(&columns)).is_some() {
            inner.touch(&table);
        } else {
            inner.order.push_back(table);
        }
        inner.evict_if_needed();
        columns
    }

    /// Forget one table, e.g. after `ALTER TABLE`.
    pub fn remove(&self, table: &str) -> Option<Arc<[String]>> {
        let mut inner = self.lock();
        let removed = inner.map.remove(table);
        if removed.is_some() {
            inner.remove_from_order(table);
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.order.clear();
    }
}

impl Default for ColumnCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COLUMN_CACHE_CAPACITY)
    }
}

impl ColumnCacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn remove_from_order(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key) {
            let _ = self.order.remove(pos);
        }
    }

    fn evict_if_needed(&mut self) {
        if self.capacity == 0 {
            self.map.clear();
            self.order.clear();
            return;
        }

        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            let _ = self.map.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ColumnCache::new(2);
        cache.insert("a", cols(&["id"]));
        cache.insert("b", cols(&["id"]));
        assert!(cache.get("a").is_some());
        cache.insert("c", cols(&["id"]));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let cache = ColumnCache::new(2);
        cache.insert("users", cols(&["id"]));
        cache.insert("users", cols(&["id", "email"]));
        assert_eq!(cache.len(), 1);
        assert_eq!(&*cache.get("users").unwrap(), ["id", "email"]);
    }

    #[test]
    fn zero_capacity_disables() {
        let cache = ColumnCache::new(0);
        let stored = cache.insert("users", cols(&["id"]));
        assert_eq!(&*stored, ["id"]);
        assert!(cache.get("users").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let cache = ColumnCache::default();
        cache.insert("a", cols(&["x"]));
        cache.insert("b", cols(&["y"]));
        assert!(cache.remove("a").is_some());
        assert!(cache.remove("a").is_none());
        cache.clear();
        assert!(cache.is_empty());
    }
}

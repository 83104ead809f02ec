//! Bounded Index Store Module
//!
//! Main store engine: keeps at most `max_items` entries in a flat key/value
//! mechanism, tracking their insertion order in an index that lives in the
//! same mechanism under a reserved key.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::store::envelope::Envelope;
use crate::store::rebuild::rebuild_index;
use crate::store::size::trim_to_size;
use crate::store::subsequence::remove_subsequence;
use crate::store::{
    Clock, ExpiringStore, KeyIndex, Mechanism, StoreStats, INDEX_KEY, MAX_KEY_LENGTH,
};

// == Bounded Index Store ==
/// Key/value store bounded to `max_items` entries, evicting expired entries
/// first and then the oldest ones.
///
/// Every mutating operation reads the index (rebuilding it from a scan when
/// it is missing or unreadable), mutates the data, and writes the index back.
/// Index and data are not updated atomically; a failure between the two
/// leaves a stale index that the next rebuild repairs.
#[derive(Debug)]
pub struct BoundedIndexStore {
    /// Envelope-level access to the mechanism
    inner: ExpiringStore,
    /// Operation counters
    stats: StoreStats,
    /// Hard cap on live entries
    max_items: usize,
}

impl BoundedIndexStore {
    // == Constructor ==
    /// Creates a store over `mechanism` holding at most `max_items` entries.
    pub fn new(
        mechanism: Box<dyn Mechanism>,
        clock: Arc<dyn Clock>,
        max_items: usize,
    ) -> Result<Self> {
        if max_items == 0 {
            return Err(StoreError::InvalidConfig(
                "max_items must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            inner: ExpiringStore::new(mechanism, clock),
            stats: StoreStats::new(),
            max_items,
        })
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.now_ms()
    }

    pub fn mechanism(&self) -> &dyn Mechanism {
        self.inner.mechanism()
    }

    // == Set ==
    /// Stores `value` under `key` as the youngest entry.
    ///
    /// A `None` value deletes the key. Once the index reaches `max_items`,
    /// expired entries are collected and then the oldest entries are evicted
    /// until the bound holds.
    pub fn set(&mut self, key: &str, value: Option<Value>, expires_at: Option<u64>) -> Result<()> {
        validate_key(key)?;

        let live = value.is_some();
        self.inner.set(key, value, expires_at)?;

        let mut index = self.fetch_index()?;
        index.remove(key);
        if live {
            index.touch(key);
        }

        let mut keys = index.into_keys();
        if keys.len() >= self.max_items {
            keys = self.prune_expired(keys, false)?;
            keys = self.prune_oversize(keys)?;
        }

        self.persist_index(&KeyIndex::from_keys(keys))
    }

    // == Get ==
    /// Returns the live envelope under `key`.
    pub fn get_envelope(&mut self, key: &str) -> Result<Option<Envelope>> {
        validate_key(key)?;

        let envelope = self.inner.get_envelope(key)?;
        if envelope.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        Ok(envelope)
    }

    /// Returns the live value under `key`. Expired entries read as absent.
    pub fn get(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.get_envelope(key)?.map(|env| env.value))
    }

    // == Remove ==
    /// Removes `key` from the mechanism and, if an index exists, from the index.
    ///
    /// A missing index is left missing rather than rebuilt.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;

        self.inner.remove(key)?;

        if let Some(mut index) = self.load_index()? {
            index.remove(key);
            self.persist_index(&index)?;
        }
        Ok(())
    }

    // == Collect Expired ==
    /// Removes expired entries (and, with `strict`, malformed ones).
    ///
    /// Returns the number of entries dropped from the index.
    pub fn collect_expired(&mut self, strict: bool) -> Result<usize> {
        let keys = self.fetch_index()?.into_keys();
        let before = keys.len();

        let keys = self.prune_expired(keys, strict)?;
        let removed = before - keys.len();

        self.persist_index(&KeyIndex::from_keys(keys))?;
        Ok(removed)
    }

    // == Collect Oversize ==
    /// Evicts the oldest entries until at most `max_items` remain, collecting
    /// expired entries first unless `skip_expired` is set.
    ///
    /// Returns the number of entries dropped from the index.
    pub fn collect_oversize(&mut self, skip_expired: bool, strict: bool) -> Result<usize> {
        let mut keys = self.fetch_index()?.into_keys();
        let before = keys.len();

        if !skip_expired {
            keys = self.prune_expired(keys, strict)?;
        }
        keys = self.prune_oversize(keys)?;
        let removed = before - keys.len();

        self.persist_index(&KeyIndex::from_keys(keys))?;
        Ok(removed)
    }

    // == Keys ==
    /// Returns the live keys, oldest first.
    ///
    /// A missing or unreadable index is rebuilt and written back, so the
    /// next call reads it instead of scanning again.
    pub fn keys(&mut self) -> Result<Vec<String>> {
        if let Some(index) = self.load_index()? {
            return Ok(index.into_keys());
        }

        let index = self.rebuild()?;
        self.persist_index(&index)?;
        Ok(index.into_keys())
    }

    // == Rebuild ==
    /// Discards the persisted index and writes a freshly scanned one.
    ///
    /// Returns the number of keys in the new index.
    pub fn rebuild_index(&mut self) -> Result<usize> {
        let index = self.rebuild()?;
        let count = index.len();
        self.persist_index(&index)?;
        Ok(count)
    }

    // == Stats ==
    pub fn stats(&self) -> StoreStats {
        self.stats.clone()
    }

    // == Index Plumbing ==
    /// Reads the persisted index. Absent and unreadable indexes both yield
    /// `None`; mechanism failures propagate.
    fn load_index(&self) -> Result<Option<KeyIndex>> {
        let Some(raw) = self.inner.mechanism().get(INDEX_KEY)? else {
            return Ok(None);
        };

        match KeyIndex::decode(&raw) {
            Ok(index) => Ok(Some(index)),
            Err(StoreError::InvalidValue { reason, .. }) => {
                warn!("Discarding unreadable index: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reads the persisted index, rebuilding it when unusable.
    fn fetch_index(&mut self) -> Result<KeyIndex> {
        match self.load_index()? {
            Some(index) => Ok(index),
            None => self.rebuild(),
        }
    }

    fn rebuild(&mut self) -> Result<KeyIndex> {
        let keys = rebuild_index(&self.inner)?;
        self.stats.record_rebuild();
        info!("Index rebuilt from scan: {} keys", keys.len());
        Ok(KeyIndex::from_keys(keys))
    }

    fn persist_index(&mut self, index: &KeyIndex) -> Result<()> {
        let raw = index.encode()?;
        self.inner.mechanism_mut().set(INDEX_KEY, raw)?;
        self.stats.set_total_entries(index.len());
        Ok(())
    }

    // == Eviction Passes ==
    fn prune_expired(&mut self, keys: Vec<String>, strict: bool) -> Result<Vec<String>> {
        let due = self.inner.find_expired_or_invalid(&keys, strict)?;
        if due.is_empty() {
            return Ok(keys);
        }

        for key in &due {
            self.inner.remove(key)?;
        }
        let survivors = remove_subsequence(&keys, &due)?;

        self.stats.record_expirations(due.len());
        info!("Collected {} expired entries", due.len());
        Ok(survivors)
    }

    fn prune_oversize(&mut self, keys: Vec<String>) -> Result<Vec<String>> {
        let before = keys.len();
        let survivors = trim_to_size(&mut self.inner, keys, self.max_items)?;

        let evicted = before - survivors.len();
        if evicted > 0 {
            self.stats.record_evictions(evicted);
            info!("Evicted {} entries over the {} item bound", evicted, self.max_items);
        } else {
            debug!("No eviction needed at {} entries", before);
        }
        Ok(survivors)
    }
}

// == Key Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if key == INDEX_KEY {
        return Err(StoreError::InvalidKey(format!(
            "'{}' is reserved for the index",
            INDEX_KEY
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ManualClock, MemoryMechanism};
    use serde_json::json;

    fn new_store(max_items: usize) -> (BoundedIndexStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let store =
            BoundedIndexStore::new(Box::new(MemoryMechanism::new()), clock.clone(), max_items)
                .unwrap();
        (store, clock)
    }

    /// Sets each key one millisecond apart so creation order is unambiguous.
    fn set_all(store: &mut BoundedIndexStore, clock: &ManualClock, keys: &[&str]) {
        for (i, key) in keys.iter().enumerate() {
            clock.advance(1);
            store.set(key, Some(json!(i)), None).unwrap();
        }
    }

    fn persisted_index(store: &BoundedIndexStore) -> Option<Vec<String>> {
        store
            .mechanism()
            .get(INDEX_KEY)
            .unwrap()
            .map(|raw| KeyIndex::decode(&raw).unwrap().into_keys())
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BoundedIndexStore::new(
            Box::new(MemoryMechanism::new()),
            Arc::new(ManualClock::new(0)),
            0,
        );
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_set_and_get() {
        let (mut store, _clock) = new_store(10);

        store.set("key1", Some(json!({"n": 1})), None).unwrap();

        assert_eq!(store.get("key1").unwrap(), Some(json!({"n": 1})));
        assert_eq!(persisted_index(&store), Some(vec!["key1".to_string()]));
    }

    #[test]
    fn test_evicts_oldest_over_capacity() {
        let (mut store, clock) = new_store(3);
        set_all(&mut store, &clock, &["a", "b", "c", "d"]);

        assert_eq!(store.keys().unwrap(), vec!["b", "c", "d"]);
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("d").unwrap(), Some(json!(3)));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_reset_moves_to_youngest() {
        let (mut store, clock) = new_store(3);
        set_all(&mut store, &clock, &["a", "b", "c"]);

        store.set("a", Some(json!("again")), None).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b", "c", "a"]);

        store.set("d", Some(json!("new")), None).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["c", "a", "d"]);
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_tombstone_set_deletes() {
        let (mut store, clock) = new_store(5);
        set_all(&mut store, &clock, &["a", "b"]);

        store.set("a", None, None).unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(persisted_index(&store), Some(vec!["b".to_string()]));
    }

    #[test]
    fn test_remove() {
        let (mut store, clock) = new_store(5);
        set_all(&mut store, &clock, &["a", "b", "c"]);

        store.remove("b").unwrap();

        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.keys().unwrap(), vec!["a", "c"]);
        assert_eq!(store.rebuild_index().unwrap(), 2);
        assert_eq!(store.keys().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_without_index_does_not_rebuild() {
        let (mut store, _clock) = new_store(5);
        store.inner.set("a", Some(json!(1)), None).unwrap();

        store.remove("a").unwrap();

        assert_eq!(persisted_index(&store), None);
        assert_eq!(store.stats().rebuilds, 0);
    }

    #[test]
    fn test_missing_index_is_rebuilt_in_creation_order() {
        let (mut store, clock) = new_store(10);
        set_all(&mut store, &clock, &["zeta", "alpha", "mid"]);
        store.inner.mechanism_mut().remove(INDEX_KEY).unwrap();

        store.set("last", Some(json!(0)), None).unwrap();

        assert_eq!(
            persisted_index(&store).unwrap(),
            vec!["zeta", "alpha", "mid", "last"]
        );
        assert_eq!(store.stats().rebuilds, 1);
    }

    #[test]
    fn test_corrupted_index_is_rebuilt() {
        let (mut store, clock) = new_store(10);
        set_all(&mut store, &clock, &["a", "b"]);
        store
            .inner
            .mechanism_mut()
            .set(INDEX_KEY, "{garbage".to_string())
            .unwrap();

        assert_eq!(store.collect_expired(false).unwrap(), 0);
        assert_eq!(persisted_index(&store).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_leaves_corrupted_index_alone() {
        let (mut store, clock) = new_store(5);
        set_all(&mut store, &clock, &["a", "b"]);
        store
            .inner
            .mechanism_mut()
            .set(INDEX_KEY, "{garbage".to_string())
            .unwrap();

        store.remove("a").unwrap();

        assert_eq!(store.mechanism().get("a").unwrap(), None);
        assert_eq!(
            store.mechanism().get(INDEX_KEY).unwrap(),
            Some("{garbage".to_string())
        );
        assert_eq!(store.stats().rebuilds, 0);
    }

    #[test]
    fn test_index_with_duplicates_or_reserved_key_is_rebuilt() {
        for bad in [r#"["a","a"]"#, r#"["a","__bounded_store_index__"]"#] {
            let (mut store, clock) = new_store(10);
            set_all(&mut store, &clock, &["b", "a", "c"]);
            store
                .inner
                .mechanism_mut()
                .set(INDEX_KEY, bad.to_string())
                .unwrap();

            assert_eq!(store.collect_expired(false).unwrap(), 0);

            assert_eq!(persisted_index(&store).unwrap(), vec!["b", "a", "c"], "{bad}");
            assert_eq!(store.stats().rebuilds, 1, "{bad}");
        }
    }

    #[test]
    fn test_tombstone_at_capacity_removes_only_that_key() {
        let (mut store, clock) = new_store(3);
        set_all(&mut store, &clock, &["a", "b", "c"]);

        store.set("b", None, None).unwrap();

        assert_eq!(persisted_index(&store).unwrap(), vec!["a", "c"]);
        assert_eq!(store.get("a").unwrap(), Some(json!(0)));
        assert_eq!(store.get("c").unwrap(), Some(json!(2)));
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_tombstone_over_capacity_trims_to_bound() {
        let (mut store, clock) = new_store(2);
        for key in ["a", "b", "c", "d"] {
            clock.advance(1);
            store.inner.set(key, Some(json!(key)), None).unwrap();
        }

        store.set("b", None, None).unwrap();

        assert_eq!(persisted_index(&store).unwrap(), vec!["c", "d"]);
        assert_eq!(store.mechanism().get("a").unwrap(), None);
        assert_eq!(store.mechanism().get("b").unwrap(), None);
        assert_eq!(store.get("d").unwrap(), Some(json!("d")));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_keys_persists_rebuilt_index() {
        let (mut store, clock) = new_store(10);
        set_all(&mut store, &clock, &["b", "a"]);
        store.inner.mechanism_mut().remove(INDEX_KEY).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["b", "a"]);
        assert_eq!(persisted_index(&store).unwrap(), vec!["b", "a"]);

        assert_eq!(store.keys().unwrap(), vec!["b", "a"]);
        assert_eq!(store.stats().rebuilds, 1);
    }

    #[test]
    fn test_collect_expired() {
        let (mut store, clock) = new_store(10);
        store.set("a", Some(json!(1)), Some(100)).unwrap();
        clock.advance(1);
        store.set("b", Some(json!(2)), Some(200)).unwrap();
        clock.advance(1);
        store.set("c", Some(json!(3)), None).unwrap();

        clock.set(150);
        assert_eq!(store.collect_expired(false).unwrap(), 1);

        assert_eq!(persisted_index(&store).unwrap(), vec!["b", "c"]);
        assert!(store.mechanism().get("a").unwrap().is_none());
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_collect_expired_strict_drops_malformed() {
        let (mut store, clock) = new_store(10);
        set_all(&mut store, &clock, &["a", "b", "c"]);
        store
            .inner
            .mechanism_mut()
            .set("b", "not an envelope".to_string())
            .unwrap();

        assert_eq!(store.collect_expired(false).unwrap(), 0);
        assert_eq!(store.collect_expired(true).unwrap(), 1);
        assert_eq!(persisted_index(&store).unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn test_set_at_capacity_prefers_expired_over_oldest() {
        let (mut store, clock) = new_store(3);
        clock.set(10);
        store.set("a", Some(json!(1)), None).unwrap();
        clock.set(20);
        store.set("b", Some(json!(2)), Some(100)).unwrap();
        clock.set(30);
        store.set("c", Some(json!(3)), None).unwrap();

        clock.set(150);
        store.set("d", Some(json!(4)), None).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a", "c", "d"]);
        assert_eq!(store.stats().evictions, 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_collect_oversize_after_external_writes() {
        let (mut store, clock) = new_store(2);
        for key in ["a", "b", "c", "d"] {
            clock.advance(1);
            store.inner.set(key, Some(json!(key)), None).unwrap();
        }

        assert_eq!(store.collect_oversize(true, false).unwrap(), 2);
        assert_eq!(persisted_index(&store).unwrap(), vec!["c", "d"]);
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_collect_oversize_runs_expired_pass_first() {
        let (mut store, clock) = new_store(2);
        clock.set(1);
        store.inner.set("a", Some(json!(1)), None).unwrap();
        clock.set(2);
        store.inner.set("b", Some(json!(2)), Some(50)).unwrap();
        clock.set(3);
        store.inner.set("c", Some(json!(3)), None).unwrap();

        clock.set(100);
        assert_eq!(store.collect_oversize(false, false).unwrap(), 1);
        assert_eq!(persisted_index(&store).unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn test_reserved_and_invalid_keys_rejected() {
        let (mut store, _clock) = new_store(5);

        for key in ["", INDEX_KEY] {
            assert!(matches!(
                store.set(key, Some(json!(1)), None),
                Err(StoreError::InvalidKey(_))
            ));
            assert!(matches!(store.remove(key), Err(StoreError::InvalidKey(_))));
        }

        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        assert!(matches!(
            store.get(&long_key),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_get_stats() {
        let (mut store, _clock) = new_store(5);
        store.set("key1", Some(json!(1)), None).unwrap();
        store.get("key1").unwrap();
        store.get("nonexistent").unwrap();

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[derive(Debug, Default)]
    struct ReadOnlyMechanism {
        inner: MemoryMechanism,
    }

    impl Mechanism for ReadOnlyMechanism {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys()
        }
    }

    #[test]
    fn test_mechanism_failure_propagates() {
        let mut store = BoundedIndexStore::new(
            Box::new(ReadOnlyMechanism::default()),
            Arc::new(ManualClock::new(0)),
            5,
        )
        .unwrap();

        assert!(matches!(
            store.set("a", Some(json!(1)), None),
            Err(StoreError::Mechanism(_))
        ));
        assert!(matches!(
            store.collect_expired(false),
            Err(StoreError::Mechanism(_))
        ));
    }
}

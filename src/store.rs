//! Lock-free config store.
//!
//! # Data Flow
//! ```text
//! writer (load task)
//!     → builds a per-name id index + list
//!     → rcu: copy current snapshot, replace that name's entries
//!     → compare-and-swap the snapshot pointer (retry on race)
//!
//! reader (any thread)
//!     → one atomic load of the snapshot pointer
//!     → plain map lookups, no locks
//! ```
//!
//! # Design Decisions
//! - One `ArcSwap` holds both indexes, so a name's id index and list can
//!   never come from different load passes.
//! - Copies are shallow: untouched names share their `Arc`'d indexes with
//!   the previous snapshot.
//! - Superseded snapshots stay alive while any reader holds them and are
//!   freed by reference counting.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::record::RawRecord;

/// Id → entry, for one config name.
pub type IdIndex = HashMap<String, Entry>;

/// Entries in source row order, for one config name.
pub type ListIndex = Vec<Entry>;

/// One stored record: a converted instance of a registered type, or the
/// raw record when no type is registered for the name.
#[derive(Clone)]
pub enum Entry {
    Typed(Arc<dyn Any + Send + Sync>),
    Raw(Arc<RawRecord>),
}

impl Entry {
    /// Recovers the concrete type of a typed entry.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self {
            Entry::Typed(instance) => instance.clone().downcast::<T>().ok(),
            Entry::Raw(_) => None,
        }
    }

    /// The raw record, for entries of unregistered names.
    pub fn as_raw(&self) -> Option<&Arc<RawRecord>> {
        match self {
            Entry::Typed(_) => None,
            Entry::Raw(record) => Some(record),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Typed(_) => f.write_str("Entry::Typed(..)"),
            Entry::Raw(record) => f.debug_tuple("Entry::Raw").field(record).finish(),
        }
    }
}

/// One immutable generation of the store.
///
/// Readers that hold a snapshot keep reading exactly what they loaded,
/// regardless of concurrent reloads.
#[derive(Default)]
pub struct StoreSnapshot {
    ids: HashMap<String, Arc<IdIndex>>,
    lists: HashMap<String, Arc<ListIndex>>,
}

impl StoreSnapshot {
    /// The id index of a config name.
    pub fn id_index(&self, name: &str) -> Option<&Arc<IdIndex>> {
        self.ids.get(name)
    }

    /// The ordered list of a config name.
    pub fn list(&self, name: &str) -> Option<&Arc<ListIndex>> {
        self.lists.get(name)
    }

    /// Point lookup by config name and record id.
    pub fn get(&self, name: &str, id: &str) -> Option<&Entry> {
        self.ids.get(name)?.get(id)
    }

    /// Whether this snapshot holds any data for a config name.
    pub fn contains(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    /// Number of records under a config name, counting list entries, so
    /// records without ids are included.
    pub fn count(&self, name: &str) -> usize {
        self.lists.get(name).map(|list| list.len()).unwrap_or(0)
    }

    /// Config names present in this snapshot, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }
}

/// The engine's shared store: one atomically swappable [`StoreSnapshot`].
pub struct ConfigStore {
    current: ArcSwap<StoreSnapshot>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(StoreSnapshot::default()),
        }
    }

    /// The current generation. Cheap; never blocks.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.current.load_full()
    }

    /// Publishes a freshly built id index and list for one config name.
    ///
    /// Both indexes land in the same snapshot under a single pointer swap.
    /// Concurrent writers to other names race on the swap and retry; their
    /// updates are never lost.
    pub fn install(&self, name: &str, ids: IdIndex, list: ListIndex) {
        let ids = Arc::new(ids);
        let list = Arc::new(list);
        self.current.rcu(|current| {
            let mut next = StoreSnapshot {
                ids: current.ids.clone(),
                lists: current.lists.clone(),
            };
            next.ids.insert(name.to_string(), ids.clone());
            next.lists.insert(name.to_string(), list.clone());
            next
        });
    }

    /// Drops both indexes of a config name from the current generation.
    pub fn remove(&self, name: &str) {
        self.current.rcu(|current| {
            let mut next = StoreSnapshot {
                ids: current.ids.clone(),
                lists: current.lists.clone(),
            };
            next.ids.remove(name);
            next.lists.remove(name);
            next
        });
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_entry(id: &str) -> Entry {
        let mut record = RawRecord::new();
        record.insert("id", id);
        Entry::Raw(Arc::new(record))
    }

    fn indexes(ids: &[&str]) -> (IdIndex, ListIndex) {
        let mut index = IdIndex::new();
        let mut list = ListIndex::new();
        for id in ids {
            let entry = raw_entry(id);
            index.insert(id.to_string(), entry.clone());
            list.push(entry);
        }
        (index, list)
    }

    #[test]
    fn install_then_lookup() {
        let store = ConfigStore::new();
        let (ids, list) = indexes(&["1", "2"]);
        store.install("Item", ids, list);

        let snapshot = store.snapshot();
        assert!(snapshot.contains("Item"));
        assert_eq!(snapshot.count("Item"), 2);
        assert!(snapshot.get("Item", "1").is_some());
        assert!(snapshot.get("Item", "404").is_none());
        assert!(!snapshot.contains("Skill"));
    }

    #[test]
    fn held_snapshots_are_isolated_from_reloads() {
        let store = ConfigStore::new();
        let (ids, list) = indexes(&["1"]);
        store.install("Item", ids, list);

        let before = store.snapshot();
        let (ids, list) = indexes(&["1", "2", "3"]);
        store.install("Item", ids, list);

        assert_eq!(before.count("Item"), 1);
        assert_eq!(store.snapshot().count("Item"), 3);
    }

    #[test]
    fn untouched_names_share_their_indexes() {
        let store = ConfigStore::new();
        let (ids, list) = indexes(&["1"]);
        store.install("Item", ids, list);
        let (ids, list) = indexes(&["7"]);
        store.install("Skill", ids, list);

        let before = store.snapshot();
        let (ids, list) = indexes(&["1", "2"]);
        store.install("Item", ids, list);
        let after = store.snapshot();

        assert!(Arc::ptr_eq(
            before.list("Skill").unwrap(),
            after.list("Skill").unwrap()
        ));
        assert!(!Arc::ptr_eq(
            before.list("Item").unwrap(),
            after.list("Item").unwrap()
        ));
    }

    #[test]
    fn remove_drops_both_indexes() {
        let store = ConfigStore::new();
        let (ids, list) = indexes(&["1"]);
        store.install("Item", ids, list);
        store.remove("Item");

        let snapshot = store.snapshot();
        assert!(!snapshot.contains("Item"));
        assert!(snapshot.id_index("Item").is_none());
    }

    #[test]
    fn concurrent_installs_to_different_names_all_land() {
        let store = Arc::new(ConfigStore::new());
        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let name = format!("Config{n}");
                let (ids, list) = {
                    let mut index = IdIndex::new();
                    let mut list = ListIndex::new();
                    for id in 0..50 {
                        let entry = raw_entry(&id.to_string());
                        index.insert(id.to_string(), entry.clone());
                        list.push(entry);
                    }
                    (index, list)
                };
                store.install(&name, ids, list);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = store.snapshot();
        for n in 0..8 {
            assert_eq!(snapshot.count(&format!("Config{n}")), 50);
        }
    }
}

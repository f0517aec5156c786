use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::store::EntityStore;

/// Anything a cache-backed repository can mirror.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

/// How `save` reaches the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Append one entity via the store's incremental `add`.
    Append,
    /// Replace the full persisted collection on every save.
    Rewrite,
}

/// Extracts the foreign key a secondary index groups by.
pub type KeyFn<T> = fn(&T) -> Uuid;

struct SecondaryIndex<T: Entity> {
    name: &'static str,
    key_of: KeyFn<T>,
    groups: HashMap<Uuid, Vec<T>>,
}

impl<T: Entity> SecondaryIndex<T> {
    fn insert(&mut self, entity: &T) {
        self.groups
            .entry((self.key_of)(entity))
            .or_default()
            .push(entity.clone());
    }

    fn remove(&mut self, entity: &T) {
        let key = (self.key_of)(entity);
        if let Some(group) = self.groups.get_mut(&key) {
            group.retain(|e| e.id() != entity.id());
            if group.is_empty() {
                self.groups.remove(&key);
            }
        }
    }
}

struct Indexes<T: Entity> {
    primary: HashMap<Uuid, T>,
    secondary: Vec<SecondaryIndex<T>>,
}

/// Read-optimized mirror of one bulk-persisted entity collection.
///
/// The full collection is loaded from the store once, at construction; every
/// read after that is served from the in-memory indices. Mutations write
/// through to the store first and only then touch the indices, all under one
/// write guard, so readers never observe an entity present in the primary
/// index but missing from a secondary group (or the reverse), and two writers
/// racing on the same id are serialized.
pub struct CachedRepository<T: Entity> {
    kind: &'static str,
    store: Arc<dyn EntityStore<T>>,
    write_policy: WritePolicy,
    snapshot_dir: Option<PathBuf>,
    inner: RwLock<Indexes<T>>,
}

impl<T: Entity> CachedRepository<T> {
    /// Builds the primary and secondary indices from a full store load.
    /// A load failure is fatal: no repository, no partial cache.
    pub fn new(
        kind: &'static str,
        store: Arc<dyn EntityStore<T>>,
        write_policy: WritePolicy,
        snapshot_dir: Option<PathBuf>,
        indices: &[(&'static str, KeyFn<T>)],
    ) -> Result<Self> {
        let mut inner = Indexes {
            primary: HashMap::new(),
            secondary: indices
                .iter()
                .map(|&(name, key_of)| SecondaryIndex {
                    name,
                    key_of,
                    groups: HashMap::new(),
                })
                .collect(),
        };

        let all = store.find_all()?;
        for entity in all {
            for index in &mut inner.secondary {
                index.insert(&entity);
            }
            inner.primary.insert(entity.id(), entity);
        }
        info!("{} cache refreshed ({} entries)", kind, inner.primary.len());

        Ok(Self {
            kind,
            store,
            write_policy,
            snapshot_dir,
            inner: RwLock::new(inner),
        })
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Indexes<T>> {
        self.inner.read().expect("repository lock poisoned")
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Indexes<T>> {
        self.inner.write().expect("repository lock poisoned")
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<T> {
        self.read_guard().primary.get(&id).cloned()
    }

    /// Snapshot of the cached values; insertion order is not preserved.
    pub fn find_all(&self) -> Vec<T> {
        self.read_guard().primary.values().cloned().collect()
    }

    /// Cached group for `key` under the named secondary index, or empty.
    pub fn find_by_key(&self, index: &'static str, key: Uuid) -> Vec<T> {
        let inner = self.read_guard();
        inner
            .secondary
            .iter()
            .find(|i| i.name == index)
            .and_then(|i| i.groups.get(&key).cloned())
            .unwrap_or_default()
    }

    pub fn exists(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.read_guard().primary.values().any(pred)
    }

    pub fn count(&self) -> usize {
        self.read_guard().primary.len()
    }

    /// Writes through to the store, then updates every index. If the store
    /// write fails the indices are untouched and the error surfaces as-is.
    /// Saving an existing id replaces it, moving it between secondary groups
    /// when a foreign key changed.
    pub fn save(&self, entity: T) -> Result<()> {
        let mut inner = self.write_guard();
        debug!("Saving {} with id: {}", self.kind, entity.id());

        match self.write_policy {
            WritePolicy::Append => self.store.add(&entity)?,
            WritePolicy::Rewrite => {
                let mut all: Vec<T> = inner
                    .primary
                    .values()
                    .filter(|e| e.id() != entity.id())
                    .cloned()
                    .collect();
                all.push(entity.clone());
                self.store.write_all(&all)?;
            }
        }

        if let Some(old) = inner.primary.insert(entity.id(), entity.clone()) {
            for index in &mut inner.secondary {
                index.remove(&old);
            }
        }
        for index in &mut inner.secondary {
            index.insert(&entity);
        }
        info!("{} with id: {} saved successfully", self.kind, entity.id());
        Ok(())
    }

    /// `save`, then a per-entity snapshot file keyed by the entity id.
    /// Requires the repository to have been built with a snapshot directory.
    pub fn save_with_snapshot(&self, entity: T) -> Result<()> {
        let dir = self.snapshot_dir.clone().ok_or_else(|| {
            Error::Storage(format!("{} repository has no snapshot directory", self.kind))
        })?;
        let key = entity.id().to_string();
        self.save(entity.clone())?;
        self.store.save_snapshot(&entity, &dir, &key)?;
        info!("{} {} saved to snapshot file", self.kind, key);
        Ok(())
    }

    /// Snapshot cleanup runs before the collection is touched: if it fails,
    /// the delete is aborted with the cache and store both unchanged. The
    /// persisted collection is rewritten before the indices are updated, so a
    /// failed rewrite also leaves the cache in its last-known-good state.
    pub fn delete_by_id(&self, id: Uuid) -> Result<()> {
        let mut inner = self.write_guard();

        let Some(existing) = inner.primary.get(&id).cloned() else {
            warn!("Attempted to delete a non-existent {} with id: {}", self.kind, id);
            return Err(Error::NotFound(format!(
                "{} with id {} does not exist",
                self.kind, id
            )));
        };

        if let Some(dir) = &self.snapshot_dir {
            if let Err(e) = self.store.delete_snapshot(dir, &id.to_string()) {
                error!(
                    "Failed to delete snapshot file for {} {}. Aborting delete operation: {}",
                    self.kind, id, e
                );
                return Err(e);
            }
        }

        let remaining: Vec<T> = inner
            .primary
            .values()
            .filter(|e| e.id() != id)
            .cloned()
            .collect();
        self.store.write_all(&remaining)?;

        inner.primary.remove(&id);
        for index in &mut inner.secondary {
            index.remove(&existing);
        }
        info!("{} {} deleted successfully", self.kind, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::storage::store::MockEntityStore;

    #[derive(Debug, Clone, PartialEq)]
    struct Doc {
        id: Uuid,
        owner_id: Uuid,
    }

    impl Entity for Doc {
        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn owner(d: &Doc) -> Uuid {
        d.owner_id
    }

    const OWNER_IDX: &str = "owner_id";

    fn repo_with(
        store: MockEntityStore<Doc>,
        policy: WritePolicy,
        snapshot_dir: Option<PathBuf>,
    ) -> Result<CachedRepository<Doc>> {
        CachedRepository::new(
            "docs",
            Arc::new(store),
            policy,
            snapshot_dir,
            &[(OWNER_IDX, owner as KeyFn<Doc>)],
        )
    }

    #[test]
    fn construction_fails_when_load_fails() {
        let mut store = MockEntityStore::<Doc>::new();
        store
            .expect_find_all()
            .returning(|| Err(Error::Storage("disk gone".into())));

        let err = repo_with(store, WritePolicy::Append, None).err().unwrap();
        assert!(err.is_storage());
    }

    #[test]
    fn failed_write_through_leaves_cache_unchanged() {
        let mut store = MockEntityStore::<Doc>::new();
        store.expect_find_all().returning(|| Ok(Vec::new()));
        store
            .expect_add()
            .returning(|_| Err(Error::Storage("write failed".into())));

        let repo = repo_with(store, WritePolicy::Append, None).unwrap();
        let doc = Doc {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        };

        assert!(repo.save(doc.clone()).is_err());
        assert_eq!(repo.count(), 0);
        assert!(repo.find_by_id(doc.id).is_none());
        assert!(repo.find_by_key(OWNER_IDX, doc.owner_id).is_empty());
    }

    #[test]
    fn resave_moves_entity_between_secondary_groups() {
        let mut store = MockEntityStore::<Doc>::new();
        store.expect_find_all().returning(|| Ok(Vec::new()));
        store.expect_write_all().returning(|_| Ok(()));

        let repo = repo_with(store, WritePolicy::Rewrite, None).unwrap();
        let id = Uuid::new_v4();
        let first_owner = Uuid::new_v4();
        let second_owner = Uuid::new_v4();

        repo.save(Doc { id, owner_id: first_owner }).unwrap();
        repo.save(Doc { id, owner_id: second_owner }).unwrap();

        assert_eq!(repo.count(), 1);
        assert!(repo.find_by_key(OWNER_IDX, first_owner).is_empty());
        let group = repo.find_by_key(OWNER_IDX, second_owner);
        assert_eq!(group.len(), 1);
        assert_eq!(group[0].id, id);
    }

    #[test]
    fn delete_of_unknown_id_is_not_found() {
        let mut store = MockEntityStore::<Doc>::new();
        store.expect_find_all().returning(|| Ok(Vec::new()));

        let repo = repo_with(store, WritePolicy::Rewrite, None).unwrap();
        let err = repo.delete_by_id(Uuid::new_v4()).err().unwrap();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(repo.count(), 0);
    }

    #[test]
    fn delete_aborts_when_snapshot_cleanup_fails() {
        let doc = Doc {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        };
        let seeded = vec![doc.clone()];

        let mut store = MockEntityStore::<Doc>::new();
        store
            .expect_find_all()
            .return_once(move || Ok(seeded));
        store
            .expect_delete_snapshot()
            .returning(|_, _| Err(Error::Storage("snapshot locked".into())));
        // No write_all expectation: reaching the collection rewrite would panic.

        let repo = repo_with(
            store,
            WritePolicy::Rewrite,
            Some(PathBuf::from("/tmp/unused")),
        )
        .unwrap();

        assert!(repo.delete_by_id(doc.id).is_err());
        assert_eq!(repo.count(), 1);
        assert!(repo.find_by_id(doc.id).is_some());
        assert_eq!(repo.find_by_key(OWNER_IDX, doc.owner_id).len(), 1);
    }

    #[test]
    fn concurrent_saves_keep_indices_consistent() {
        let mut store = MockEntityStore::<Doc>::new();
        store.expect_find_all().returning(|| Ok(Vec::new()));
        store.expect_add().returning(|_| Ok(()));

        let repo = Arc::new(repo_with(store, WritePolicy::Append, None).unwrap());
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = Arc::clone(&repo);
                let owner_id = if i % 2 == 0 { owner_a } else { owner_b };
                thread::spawn(move || {
                    let doc = Doc {
                        id: Uuid::new_v4(),
                        owner_id,
                    };
                    repo.save(doc.clone()).unwrap();
                    doc.id
                })
            })
            .collect();
        let ids: Vec<Uuid> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(repo.count(), 16);
        assert_eq!(repo.find_by_key(OWNER_IDX, owner_a).len(), 8);
        assert_eq!(repo.find_by_key(OWNER_IDX, owner_b).len(), 8);
        for id in ids {
            let doc = repo.find_by_id(id).unwrap();
            let group = repo.find_by_key(OWNER_IDX, doc.owner_id);
            assert_eq!(group.iter().filter(|d| d.id == id).count(), 1);
        }
    }
}

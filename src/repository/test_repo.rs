use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::models::test::Test;
use crate::repository::cached::{CachedRepository, Entity, WritePolicy};
use crate::storage::store::EntityStore;

impl Entity for Test {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Cache-backed repository for tests. Saves rewrite the full persisted
/// collection; each test also keeps a per-id snapshot file that must be
/// cleaned up on delete.
#[derive(Clone)]
pub struct TestRepository {
    repo: Arc<CachedRepository<Test>>,
}

impl TestRepository {
    pub fn new(store: Arc<dyn EntityStore<Test>>, snapshot_dir: PathBuf) -> Result<Self> {
        let repo = CachedRepository::new(
            "test",
            store,
            WritePolicy::Rewrite,
            Some(snapshot_dir),
            &[],
        )?;
        Ok(Self { repo: Arc::new(repo) })
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<Test> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<Test> {
        self.repo.find_all()
    }

    pub fn save(&self, test: Test) -> Result<()> {
        self.repo.save(test)
    }

    /// Save plus a per-test snapshot file, used by the authoring flow.
    pub fn save_with_snapshot(&self, test: Test) -> Result<()> {
        self.repo.save_with_snapshot(test)
    }

    pub fn delete_by_id(&self, id: Uuid) -> Result<()> {
        self.repo.delete_by_id(id)
    }

    /// Title-uniqueness check used before create.
    pub fn exists_by_title(&self, title: &str) -> bool {
        self.repo.exists(|t| t.title == title)
    }

    pub fn count(&self) -> usize {
        self.repo.count()
    }
}

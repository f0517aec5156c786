use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::models::result::TestResult;
use crate::repository::cached::{CachedRepository, Entity, KeyFn, WritePolicy};
use crate::storage::store::EntityStore;

impl Entity for TestResult {
    fn id(&self) -> Uuid {
        self.id
    }
}

const BY_USER_ID: &str = "user_id";
const BY_TEST_ID: &str = "test_id";

fn user_id_of(r: &TestResult) -> Uuid {
    r.user_id
}

fn test_id_of(r: &TestResult) -> Uuid {
    r.test_id
}

/// Cache-backed repository for finished results. Results are append-only and
/// never deleted; two secondary indices group them by owning user and by
/// taken test.
#[derive(Clone)]
pub struct ResultRepository {
    repo: Arc<CachedRepository<TestResult>>,
}

impl ResultRepository {
    pub fn new(store: Arc<dyn EntityStore<TestResult>>) -> Result<Self> {
        let repo = CachedRepository::new(
            "result",
            store,
            WritePolicy::Append,
            None,
            &[
                (BY_USER_ID, user_id_of as KeyFn<TestResult>),
                (BY_TEST_ID, test_id_of as KeyFn<TestResult>),
            ],
        )?;
        Ok(Self { repo: Arc::new(repo) })
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<TestResult> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<TestResult> {
        self.repo.find_all()
    }

    pub fn find_all_by_user_id(&self, user_id: Uuid) -> Vec<TestResult> {
        self.repo.find_by_key(BY_USER_ID, user_id)
    }

    pub fn find_all_by_test_id(&self, test_id: Uuid) -> Vec<TestResult> {
        self.repo.find_by_key(BY_TEST_ID, test_id)
    }

    pub fn save(&self, result: TestResult) -> Result<()> {
        self.repo.save(result)
    }

    pub fn count(&self) -> usize {
        self.repo.count()
    }
}

pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use crate::error::Result;
use crate::models::result::TestResult;
use crate::models::test::Test;
use crate::repository::result_repo::ResultRepository;
use crate::repository::test_repo::TestRepository;
use crate::services::runner_service::TestRunnerService;
use crate::services::scoring_service::ExactMatchScorer;
use crate::services::stats_service::StatsService;
use crate::storage::json_store::JsonFileStore;

#[derive(Clone)]
pub struct AppState {
    pub test_repo: TestRepository,
    pub result_repo: ResultRepository,
    pub runner_service: TestRunnerService,
    pub stats_service: StatsService,
}

impl AppState {
    /// Wires the repositories and services from the initialized config.
    /// Fails if either collection cannot be loaded from disk.
    pub fn new() -> Result<Self> {
        let config = crate::config::get_config();

        let test_store = Arc::new(JsonFileStore::<Test>::new(
            config.data_dir.join(&config.tests_file),
        ));
        let result_store = Arc::new(JsonFileStore::<TestResult>::new(
            config.data_dir.join(&config.results_file),
        ));

        let test_repo =
            TestRepository::new(test_store, config.data_dir.join(&config.test_snapshot_dir))?;
        let result_repo = ResultRepository::new(result_store)?;

        let runner_service = TestRunnerService::new(
            test_repo.clone(),
            result_repo.clone(),
            Arc::new(ExactMatchScorer),
            config.test_duration_minutes,
        );
        let stats_service = StatsService::new(test_repo.clone(), result_repo.clone());

        Ok(Self {
            test_repo,
            result_repo,
            runner_service,
            stats_service,
        })
    }
}

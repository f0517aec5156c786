use std::collections::HashMap;

use uuid::Uuid;

use crate::dto::session_dto::TestStats;
use crate::repository::result_repo::ResultRepository;
use crate::repository::test_repo::TestRepository;

/// Aggregates a user's finished results into one row per taken test, served
/// entirely from the results-by-user secondary index. Results referencing a
/// deleted test keep their row with no title.
#[derive(Clone)]
pub struct StatsService {
    tests: TestRepository,
    results: ResultRepository,
}

impl StatsService {
    pub fn new(tests: TestRepository, results: ResultRepository) -> Self {
        Self { tests, results }
    }

    pub fn stats_for_user(&self, user_id: Uuid) -> Vec<TestStats> {
        let mut latest_per_test: HashMap<Uuid, TestStats> = HashMap::new();

        for result in self.results.find_all_by_user_id(user_id) {
            if !result.is_scored() {
                continue;
            }
            let keep = match latest_per_test.get(&result.test_id) {
                Some(existing) => result.start_time > existing.last_passed,
                None => true,
            };
            if keep {
                let test_title = self.tests.find_by_id(result.test_id).map(|t| t.title);
                latest_per_test.insert(
                    result.test_id,
                    TestStats {
                        test_title,
                        total_passed: result.total_passed.unwrap_or(0),
                        total_questions: result.total_questions.unwrap_or(0),
                        max_score: result.max_score.unwrap_or(0),
                        last_passed: result.start_time,
                    },
                );
            }
        }

        let mut stats: Vec<TestStats> = latest_per_test.into_values().collect();
        stats.sort_by(|a, b| b.last_passed.cmp(&a.last_passed));
        stats
    }
}

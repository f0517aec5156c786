use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::dto::session_dto::{SessionProgress, SessionStart};
use crate::error::{Error, Result};
use crate::models::result::{ResultAnswer, TestResult};
use crate::models::test::{Answer, Question};
use crate::repository::result_repo::ResultRepository;
use crate::repository::test_repo::TestRepository;
use crate::services::scoring_service::Scorer;
use crate::utils::time;

/// Drives one user's attempt at one test: start, answer-by-answer
/// progression, scored finish. Holds no per-session state; everything a
/// session needs travels in the exchanged `SessionStart`/`SessionProgress`
/// values, so concurrent sessions never contend here.
#[derive(Clone)]
pub struct TestRunnerService {
    tests: TestRepository,
    results: ResultRepository,
    scorer: Arc<dyn Scorer>,
    duration_minutes: i64,
}

impl TestRunnerService {
    pub fn new(
        tests: TestRepository,
        results: ResultRepository,
        scorer: Arc<dyn Scorer>,
        duration_minutes: i64,
    ) -> Self {
        Self {
            tests,
            results,
            scorer,
            duration_minutes,
        }
    }

    /// Opens a session: resolves the test, computes the rounded deadline and
    /// hands back the first question together with a fresh, not yet
    /// persisted result.
    pub fn start_test(&self, test_id: Uuid, user_id: Uuid) -> Result<SessionStart> {
        let test = self.tests.find_by_id(test_id).ok_or_else(|| {
            Error::Validation(format!("Test with id {} does not exist", test_id))
        })?;
        let first_question = test.first_question().cloned().ok_or_else(|| {
            Error::Validation(format!("Test {} has no questions", test.title))
        })?;

        let start_time = time::now();
        let deadline = time::session_deadline(start_time, self.duration_minutes);
        let result = TestResult::new(test.id, user_id, start_time, deadline);
        info!(
            "Started test {} for user {} (deadline {})",
            test.id,
            user_id,
            time::to_rfc3339(deadline)
        );

        Ok(SessionStart {
            current_question: first_question,
            session_deadline: time::to_rfc3339(deadline),
            result,
            timed_out: false,
        })
    }

    /// Advisory deadline check. The caller decides what to do with an
    /// expired session; nothing here enforces it.
    pub fn is_expired(&self, deadline: &str) -> Result<bool> {
        let deadline = time::from_rfc3339(deadline)
            .map_err(|e| Error::Validation(format!("Malformed session deadline: {}", e)))?;
        Ok(time::now() > deadline)
    }

    /// Records the answers for the current question and either hands back
    /// the next question or, on the last one, scores and persists the result.
    pub fn submit_answer(&self, progress: SessionProgress) -> Result<SessionProgress> {
        progress.validate()?;
        let question = progress
            .question
            .ok_or_else(|| Error::Validation("Session progress is missing a question".to_string()))?;
        let mut result = progress.result;

        let test = self.tests.find_by_id(result.test_id).ok_or_else(|| {
            Error::Validation(format!("Test with id {} no longer exists", result.test_id))
        })?;

        let selected = Self::match_selected_answers(&question, &progress.selected_answer_ids);
        debug!(
            "Question {} of test {}: {} of {} selected ids matched",
            question.question_number,
            test.id,
            selected.len(),
            progress.selected_answer_ids.len()
        );
        result.result_answers.push(ResultAnswer {
            question: question.clone(),
            selected_answers: selected,
        });

        match test.question_by_number(question.question_number + 1) {
            Some(next) => Ok(SessionProgress {
                question: Some(next.clone()),
                result,
                selected_answer_ids: Vec::new(),
                is_finished: false,
            }),
            None => {
                let scored = self.scorer.score(result);
                self.results.save(scored.clone())?;
                info!(
                    "Finished test {} for user {}: {}/{} passed",
                    test.id,
                    scored.user_id,
                    scored.total_passed.unwrap_or(0),
                    scored.total_questions.unwrap_or(0)
                );
                Ok(SessionProgress {
                    question: None,
                    result: scored,
                    selected_answer_ids: Vec::new(),
                    is_finished: true,
                })
            }
        }
    }

    /// Ids that do not parse or do not belong to the current question are
    /// silently dropped; only matched answers are recorded.
    fn match_selected_answers(question: &Question, selected_ids: &[String]) -> Vec<Answer> {
        selected_ids
            .iter()
            .filter_map(|raw| Uuid::parse_str(raw).ok())
            .filter_map(|id| question.answer_by_id(id).cloned())
            .collect()
    }
}

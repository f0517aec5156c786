use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::result::TestResult;
use crate::models::test::Question;

/// Everything the caller needs to render the first question of a session.
/// The result inside has not been persisted yet; it travels with the caller
/// until the finishing transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStart {
    pub current_question: Question,
    pub session_deadline: String,
    pub result: TestResult,
    pub timed_out: bool,
}

/// One session step, used in both directions: the caller sends the question
/// just answered with its selections, the service returns the next question
/// (or none) with the updated result and the finished flag.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionProgress {
    #[validate(required)]
    pub question: Option<Question>,
    pub result: TestResult,
    #[serde(default)]
    pub selected_answer_ids: Vec<String>,
    #[serde(default)]
    pub is_finished: bool,
}

/// Per-test summary of one user's finished results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestStats {
    pub test_title: Option<String>,
    pub total_passed: u32,
    pub total_questions: u32,
    pub max_score: u32,
    pub last_passed: chrono::DateTime<chrono::Utc>,
}

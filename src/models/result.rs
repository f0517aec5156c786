use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::test::{Answer, Question};

/// One user's attempt at one test. Built at session start, grows one
/// `ResultAnswer` per answered question, scored and persisted exactly once
/// at the finishing transition. The scoring fields stay `None` until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub result_answers: Vec<ResultAnswer>,
    pub total_passed: Option<u32>,
    pub total_questions: Option<u32>,
    pub max_score: Option<u32>,
}

impl TestResult {
    pub fn new(
        test_id: Uuid,
        user_id: Uuid,
        start_time: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            test_id,
            start_time,
            deadline,
            result_answers: Vec::new(),
            total_passed: None,
            total_questions: None,
            max_score: None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.total_questions.is_some()
    }
}

/// Snapshot of one answered question: the question as presented plus the
/// answers the user selected (possibly none).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultAnswer {
    pub question: Question,
    pub selected_answers: Vec<Answer>,
}

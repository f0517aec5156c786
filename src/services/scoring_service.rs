use std::collections::HashSet;

use uuid::Uuid;

use crate::models::result::TestResult;

/// Narrow contract between the session state machine and whatever grades a
/// completed answer set.
pub trait Scorer: Send + Sync {
    /// Populates `total_passed`, `total_questions` and `max_score` on a
    /// completed result.
    fn score(&self, result: TestResult) -> TestResult;
}

/// All-or-nothing grading: a question earns its single point only when the
/// selected answers match the correct answers exactly, as sets.
pub struct ExactMatchScorer;

impl ExactMatchScorer {
    fn is_passed(selected: &HashSet<Uuid>, correct: &HashSet<Uuid>) -> bool {
        selected == correct
    }
}

impl Scorer for ExactMatchScorer {
    fn score(&self, mut result: TestResult) -> TestResult {
        let mut total_passed = 0u32;
        for answer in &result.result_answers {
            let selected: HashSet<Uuid> = answer.selected_answers.iter().map(|a| a.id).collect();
            let correct: HashSet<Uuid> = answer
                .question
                .answers
                .iter()
                .filter(|a| a.is_correct)
                .map(|a| a.id)
                .collect();
            if Self::is_passed(&selected, &correct) {
                total_passed += 1;
            }
        }

        let total_questions = result.result_answers.len() as u32;
        result.total_passed = Some(total_passed);
        result.total_questions = Some(total_questions);
        result.max_score = Some(total_questions);
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::result::ResultAnswer;
    use crate::models::test::{Answer, Question};

    fn answer(is_correct: bool) -> Answer {
        Answer {
            id: Uuid::new_v4(),
            answer_text: "x".to_string(),
            is_correct,
        }
    }

    fn question(answers: Vec<Answer>) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_number: 1,
            question_text: "q".to_string(),
            answers,
        }
    }

    fn result_with(answers: Vec<ResultAnswer>) -> TestResult {
        let now = Utc::now();
        let mut result = TestResult::new(Uuid::new_v4(), Uuid::new_v4(), now, now);
        result.result_answers = answers;
        result
    }

    #[test]
    fn exact_selection_earns_the_point() {
        let right = answer(true);
        let wrong = answer(false);
        let q = question(vec![right.clone(), wrong]);

        let scored = ExactMatchScorer.score(result_with(vec![ResultAnswer {
            question: q,
            selected_answers: vec![right],
        }]));

        assert_eq!(scored.total_passed, Some(1));
        assert_eq!(scored.total_questions, Some(1));
        assert_eq!(scored.max_score, Some(1));
    }

    #[test]
    fn partial_selection_earns_nothing() {
        let right_a = answer(true);
        let right_b = answer(true);
        let q = question(vec![right_a.clone(), right_b]);

        let scored = ExactMatchScorer.score(result_with(vec![ResultAnswer {
            question: q,
            selected_answers: vec![right_a],
        }]));

        assert_eq!(scored.total_passed, Some(0));
        assert_eq!(scored.total_questions, Some(1));
    }

    #[test]
    fn extra_wrong_selection_spoils_a_correct_one() {
        let right = answer(true);
        let wrong = answer(false);
        let q = question(vec![right.clone(), wrong.clone()]);

        let scored = ExactMatchScorer.score(result_with(vec![ResultAnswer {
            question: q,
            selected_answers: vec![right, wrong],
        }]));

        assert_eq!(scored.total_passed, Some(0));
    }

    #[test]
    fn empty_selection_counts_as_wrong_not_skipped() {
        let right = answer(true);
        let q = question(vec![right]);

        let scored = ExactMatchScorer.score(result_with(vec![ResultAnswer {
            question: q,
            selected_answers: Vec::new(),
        }]));

        assert_eq!(scored.total_passed, Some(0));
        assert_eq!(scored.total_questions, Some(1));
    }
}

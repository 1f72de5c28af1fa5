use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::mistakes::is_mistake;
use crate::engine::progress::UserProgress;
use crate::model::{Question, QuestionType};

/// What happened when one answer was submitted, for display after the fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub question_type: QuestionType,
    pub correct: bool,
    pub expected: String,
    pub attempt_number: usize,
    pub streak: u32,
    pub still_in_mistakes: bool,
    pub timestamp: DateTime<Utc>,
}

impl AnswerOutcome {
    /// Build from progress that already includes this attempt.
    pub fn after_attempt(question: &Question, correct: bool, progress: &UserProgress) -> Self {
        let attempt_number = progress
            .record(&question.id)
            .map(|r| r.attempts.len())
            .unwrap_or(0);
        Self {
            question_id: question.id.clone(),
            question_type: question.question_type(),
            correct,
            expected: question.answer_text(),
            attempt_number,
            streak: progress.streak,
            still_in_mistakes: is_mistake(&question.id, progress),
            timestamp: progress.last_practiced.unwrap_or_else(Utc::now),
        }
    }
}

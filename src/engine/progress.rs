use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chronological outcome log for one question. Append-only until a full reset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    #[serde(default)]
    pub attempts: Vec<bool>,
}

impl AttemptRecord {
    pub fn has_attempted(&self) -> bool {
        !self.attempts.is_empty()
    }

    /// Outcome of the most recent attempt, `None` if never attempted.
    pub fn last_outcome(&self) -> Option<bool> {
        self.attempts.last().copied()
    }

    /// Outcome of the very first attempt. Later attempts never change it.
    pub fn first_outcome(&self) -> Option<bool> {
        self.attempts.first().copied()
    }

    pub fn is_mastered(&self) -> bool {
        self.last_outcome() == Some(true)
    }

    pub fn is_missed(&self) -> bool {
        self.last_outcome() == Some(false)
    }

    pub fn failure_count(&self) -> usize {
        self.attempts.iter().filter(|&&ok| !ok).count()
    }

    pub fn correct_count(&self) -> usize {
        self.attempts.iter().filter(|&&ok| ok).count()
    }
}

/// Everything the learner has done. Owned by the caller and passed explicitly
/// to every engine function; there is no shared instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub question_stats: BTreeMap<String, AttemptRecord>,
    pub streak: u32,
    pub best_streak: u32,
    pub pinned_mistakes: BTreeSet<String>,
    pub total_answered: u32,
    pub correct_count: u32,
    pub last_practiced: Option<DateTime<Utc>>,
}

impl UserProgress {
    pub fn record(&self, question_id: &str) -> Option<&AttemptRecord> {
        self.question_stats.get(question_id)
    }

    pub fn has_attempted(&self, question_id: &str) -> bool {
        self.record(question_id).is_some_and(AttemptRecord::has_attempted)
    }

    pub fn last_outcome(&self, question_id: &str) -> Option<bool> {
        self.record(question_id).and_then(AttemptRecord::last_outcome)
    }

    pub fn is_pinned(&self, question_id: &str) -> bool {
        self.pinned_mistakes.contains(question_id)
    }

    /// Append one outcome and update the aggregate counters.
    ///
    /// The id is not checked against any question bank: history for deleted
    /// questions is kept.
    pub fn record_attempt(&mut self, question_id: &str, is_correct: bool) {
        self.record_attempt_at(question_id, is_correct, Utc::now());
    }

    pub fn record_attempt_at(&mut self, question_id: &str, is_correct: bool, at: DateTime<Utc>) {
        self.question_stats
            .entry(question_id.to_string())
            .or_default()
            .attempts
            .push(is_correct);

        self.total_answered = self.total_answered.saturating_add(1);
        if is_correct {
            self.correct_count = self.correct_count.saturating_add(1);
            self.streak = self.streak.saturating_add(1);
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        self.last_practiced = Some(at);
    }

    /// Flip the pin on a question and return whether it is now pinned.
    pub fn toggle_pin(&mut self, question_id: &str) -> bool {
        if self.pinned_mistakes.remove(question_id) {
            false
        } else {
            self.pinned_mistakes.insert(question_id.to_string());
            true
        }
    }

    /// Discard all history. Irreversible.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

use serde::Serialize;

use crate::engine::mistakes::get_mistakes;
use crate::engine::progress::UserProgress;
use crate::model::{Question, QuestionType};

pub const DEFAULT_HARDEST_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeAccuracy {
    pub question_type: QuestionType,
    pub correct: usize,
    pub total: usize,
    pub percent: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HardQuestion {
    pub id: String,
    pub content: String,
    pub failure_count: usize,
}

/// Everything the stats view shows, derived from progress and the bank alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_questions: usize,
    pub attempted: usize,
    pub mastered: usize,
    pub mastery_percent: u32,
    pub coverage_percent: u32,
    pub first_try_percent: u32,
    pub overall_accuracy: u32,
    pub type_accuracy: Vec<TypeAccuracy>,
    pub hardest: Vec<HardQuestion>,
    pub mistake_count: usize,
    pub total_answered: u32,
    pub correct_count: u32,
    pub streak: u32,
    pub best_streak: u32,
}

/// Half-up rounded percentage; 0 when there is nothing to divide by.
pub fn percent(numerator: usize, denominator: usize) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let (n, d) = (numerator as u64, denominator as u64);
    ((200 * n + d) / (2 * d)) as u32
}

pub fn mastered_count(progress: &UserProgress, questions: &[Question]) -> usize {
    questions
        .iter()
        .filter(|q| progress.last_outcome(&q.id) == Some(true))
        .count()
}

pub fn attempted_count(progress: &UserProgress, questions: &[Question]) -> usize {
    questions.iter().filter(|q| progress.has_attempted(&q.id)).count()
}

pub fn mastery_percent(progress: &UserProgress, questions: &[Question]) -> u32 {
    percent(mastered_count(progress, questions), questions.len())
}

/// Share of the bank with at least one recorded attempt. History for ids no
/// longer in the bank does not count.
pub fn coverage_percent(progress: &UserProgress, questions: &[Question]) -> u32 {
    percent(attempted_count(progress, questions), questions.len())
}

/// Share of attempted questions whose very first attempt was correct.
pub fn first_try_percent(progress: &UserProgress, questions: &[Question]) -> u32 {
    let (first_right, attempted) = questions
        .iter()
        .filter_map(|q| progress.record(&q.id).and_then(|r| r.first_outcome()))
        .fold((0, 0), |(right, total), first| (right + first as usize, total + 1));
    percent(first_right, attempted)
}

/// Accuracy over every attempt (not just the last) on questions of one type.
pub fn type_accuracy(
    progress: &UserProgress,
    questions: &[Question],
    question_type: QuestionType,
) -> TypeAccuracy {
    let (correct, total) = questions
        .iter()
        .filter(|q| q.question_type() == question_type)
        .filter_map(|q| progress.record(&q.id))
        .fold((0, 0), |(correct, total), r| {
            (correct + r.correct_count(), total + r.attempts.len())
        });
    TypeAccuracy {
        question_type,
        correct,
        total,
        percent: percent(correct, total),
    }
}

/// Questions with at least one failure, most failures first. Ties keep bank order.
pub fn hardest_questions(
    progress: &UserProgress,
    questions: &[Question],
    limit: usize,
) -> Vec<HardQuestion> {
    let mut ranked: Vec<HardQuestion> = questions
        .iter()
        .filter_map(|q| {
            let failure_count = progress.record(&q.id)?.failure_count();
            (failure_count > 0).then(|| HardQuestion {
                id: q.id.clone(),
                content: q.content.clone(),
                failure_count,
            })
        })
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.failure_count.cmp(&a.failure_count));
    ranked.truncate(limit);
    ranked
}

pub fn compute_statistics(
    progress: &UserProgress,
    questions: &[Question],
    hardest_limit: usize,
) -> Stats {
    Stats {
        total_questions: questions.len(),
        attempted: attempted_count(progress, questions),
        mastered: mastered_count(progress, questions),
        mastery_percent: mastery_percent(progress, questions),
        coverage_percent: coverage_percent(progress, questions),
        first_try_percent: first_try_percent(progress, questions),
        overall_accuracy: percent(
            progress.correct_count as usize,
            progress.total_answered as usize,
        ),
        type_accuracy: QuestionType::ALL
            .iter()
            .map(|&t| type_accuracy(progress, questions, t))
            .collect(),
        hardest: hardest_questions(progress, questions, hardest_limit),
        mistake_count: get_mistakes(questions, progress).len(),
        total_answered: progress.total_answered,
        correct_count: progress.correct_count,
        streak: progress.streak,
        best_streak: progress.best_streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> (Vec<Question>, UserProgress) {
        let questions = vec![
            Question::judge("Q1", "Judge me", true),
            Question::choice("Q2", "Choose", &["a", "b", "c"], "B"),
        ];
        let mut progress = UserProgress::default();
        progress.record_attempt("Q1", true);
        progress.record_attempt("Q2", false);
        (questions, progress)
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn test_two_question_scenario() {
        let (questions, progress) = scenario();
        let stats = compute_statistics(&progress, &questions, DEFAULT_HARDEST_LIMIT);
        assert_eq!(stats.mastery_percent, 50);
        assert_eq!(stats.first_try_percent, 50);
        assert_eq!(stats.coverage_percent, 100);
        assert_eq!(stats.mistake_count, 1);
        let mistake_ids: Vec<&str> = get_mistakes(&questions, &progress)
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(mistake_ids, vec!["Q2"]);
        assert_eq!(stats.hardest.len(), 1);
        assert_eq!(stats.hardest[0].id, "Q2");
    }

    #[test]
    fn test_empty_bank_gives_zeros() {
        let stats = compute_statistics(&UserProgress::default(), &[], DEFAULT_HARDEST_LIMIT);
        assert_eq!(stats.mastery_percent, 0);
        assert_eq!(stats.coverage_percent, 0);
        assert_eq!(stats.first_try_percent, 0);
        assert_eq!(stats.overall_accuracy, 0);
        assert!(stats.type_accuracy.iter().all(|t| t.percent == 0 && t.total == 0));
        assert!(stats.hardest.is_empty());
    }

    #[test]
    fn test_mastery_and_first_try_diverge() {
        let questions = vec![Question::judge("q", "x", true)];
        let mut progress = UserProgress::default();
        progress.record_attempt("q", false);
        progress.record_attempt("q", true);

        assert_eq!(mastery_percent(&progress, &questions), 100);
        assert_eq!(first_try_percent(&progress, &questions), 0);
    }

    #[test]
    fn test_type_accuracy_counts_every_attempt() {
        let questions = vec![
            Question::judge("j1", "x", true),
            Question::judge("j2", "y", false),
            Question::choice("c1", "z", &["a", "b"], "A"),
        ];
        let mut progress = UserProgress::default();
        progress.record_attempt("j1", false);
        progress.record_attempt("j1", true);
        progress.record_attempt("j2", true);
        progress.record_attempt("c1", false);

        let judge = type_accuracy(&progress, &questions, QuestionType::Judge);
        assert_eq!((judge.correct, judge.total, judge.percent), (2, 3, 67));
        let choice = type_accuracy(&progress, &questions, QuestionType::Choice);
        assert_eq!((choice.correct, choice.total, choice.percent), (0, 1, 0));
        let essay = type_accuracy(&progress, &questions, QuestionType::Essay);
        assert_eq!((essay.total, essay.percent), (0, 0));
    }

    #[test]
    fn test_hardest_ranking_is_stable() {
        let questions: Vec<Question> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Question::judge(*id, "x", true))
            .collect();
        let mut progress = UserProgress::default();
        progress.record_attempt("a", false);
        progress.record_attempt("b", false);
        progress.record_attempt("b", false);
        progress.record_attempt("c", true);
        progress.record_attempt("d", false);

        let hardest: Vec<(String, usize)> = hardest_questions(&progress, &questions, 5)
            .into_iter()
            .map(|h| (h.id, h.failure_count))
            .collect();
        assert_eq!(
            hardest,
            vec![("b".to_string(), 2), ("a".to_string(), 1), ("d".to_string(), 1)]
        );

        assert_eq!(hardest_questions(&progress, &questions, 2).len(), 2);
    }

    #[test]
    fn test_history_for_removed_questions_is_ignored() {
        let questions = vec![Question::judge("kept", "x", true)];
        let mut progress = UserProgress::default();
        progress.record_attempt("gone", true);
        progress.record_attempt("kept", false);

        assert_eq!(coverage_percent(&progress, &questions), 100);
        assert_eq!(mastery_percent(&progress, &questions), 0);
        assert_eq!(first_try_percent(&progress, &questions), 0);
    }

    #[test]
    fn test_statistics_are_idempotent() {
        let (questions, progress) = scenario();
        let first = compute_statistics(&progress, &questions, 3);
        let second = compute_statistics(&progress, &questions, 3);
        assert_eq!(first, second);
    }
}

use crate::engine::progress::UserProgress;
use crate::model::Question;

/// Whether a question belongs in the review deck: last attempt wrong, or pinned.
pub fn is_mistake(question_id: &str, progress: &UserProgress) -> bool {
    progress.last_outcome(question_id) == Some(false) || progress.is_pinned(question_id)
}

/// The mistake deck, in pool order.
pub fn get_mistakes<'a>(pool: &'a [Question], progress: &UserProgress) -> Vec<&'a Question> {
    pool.iter().filter(|q| is_mistake(&q.id, progress)).collect()
}

use std::borrow::Borrow;

use rand::Rng;
use rand::rngs::SmallRng;

use crate::engine::progress::UserProgress;
use crate::model::Question;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    Normal,
    MistakesOnly,
}

impl SelectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMode::Normal => "normal",
            SelectionMode::MistakesOnly => "mistakes",
        }
    }
}

/// Which stage of the cascade produced the pick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionTier {
    /// Never attempted (normal mode only).
    Unseen,
    /// Most recent attempt was wrong.
    Missed,
    /// Fallback: anything in the pool.
    Any,
}

#[derive(Clone, Copy, Debug)]
pub struct Selection<'a> {
    pub question: &'a Question,
    pub tier: SelectionTier,
}

/// Pick the next question to ask.
///
/// Cascade: unseen questions first (normal mode), then questions whose last
/// attempt was wrong, then the whole pool. Within a tier the pick is uniform.
/// `pool` is the full bank in normal mode and the mistake subset in
/// mistakes-only mode.
pub fn select_next<'a, Q: Borrow<Question>>(
    pool: &'a [Q],
    progress: &UserProgress,
    mode: SelectionMode,
    rng: &mut SmallRng,
) -> Option<Selection<'a>> {
    if pool.is_empty() {
        return None;
    }

    if mode == SelectionMode::Normal {
        let unseen: Vec<&Question> = pool
            .iter()
            .map(Borrow::<Question>::borrow)
            .filter(|q| !progress.has_attempted(&q.id))
            .collect();
        if let Some(question) = pick(&unseen, rng) {
            return Some(Selection {
                question,
                tier: SelectionTier::Unseen,
            });
        }
    }

    let missed: Vec<&Question> = pool
        .iter()
        .map(Borrow::<Question>::borrow)
        .filter(|q| progress.last_outcome(&q.id) == Some(false))
        .collect();
    if let Some(question) = pick(&missed, rng) {
        return Some(Selection {
            question,
            tier: SelectionTier::Missed,
        });
    }

    let question = Borrow::<Question>::borrow(&pool[rng.gen_range(0..pool.len())]);
    Some(Selection {
        question,
        tier: SelectionTier::Any,
    })
}

fn pick<'a>(candidates: &[&'a Question], rng: &mut SmallRng) -> Option<&'a Question> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

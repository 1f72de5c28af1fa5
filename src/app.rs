use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::Config;
use crate::engine::mistakes::get_mistakes;
use crate::engine::progress::UserProgress;
use crate::engine::selection::{SelectionMode, select_next};
use crate::engine::stats::{Stats, compute_statistics};
use crate::model::{Question, QuizError, Response};
use crate::session::outcome::AnswerOutcome;
use crate::store::json_store::{ImportRecovery, JsonStore};

/// One learner's study session: the loaded bank, their progress and the
/// store both are written back to after every change.
pub struct App {
    pub config: Config,
    pub questions: Vec<Question>,
    pub progress: UserProgress,
    pub store: Option<JsonStore>,
    pub mode: SelectionMode,
    pub current: Option<String>,
    pub last_outcome: Option<AnswerOutcome>,
    rng: SmallRng,
}

impl App {
    pub fn new(config: Config) -> Self {
        let store = match JsonStore::with_base_dir(config.data_dir()) {
            Ok(store) => Some(store),
            Err(e) => {
                log::warn!("Running without persistence: {e:#}");
                None
            }
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Option<JsonStore>) -> Self {
        let (questions, progress) = match store {
            Some(ref s) => {
                match s.recover_interrupted_import() {
                    ImportRecovery::Clean => {}
                    ImportRecovery::StaleBackups => {
                        log::info!("Removed backups left by a finished import")
                    }
                    ImportRecovery::Restored => {
                        log::warn!("Import was interrupted; restored the previous records")
                    }
                }
                (s.load_questions(), s.load_progress())
            }
            None => (Vec::new(), UserProgress::default()),
        };
        log::debug!(
            "Loaded {} questions, {} with history",
            questions.len(),
            progress.question_stats.len()
        );

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Self {
            mode: config.initial_mode(),
            config,
            questions,
            progress,
            store,
            current: None,
            last_outcome: None,
            rng,
        }
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_deref().and_then(|id| self.question(id))
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    pub fn mistakes(&self) -> Vec<&Question> {
        get_mistakes(&self.questions, &self.progress)
    }

    /// Choose the next question for the current mode and make it current.
    /// `None` means the pool (or the mistake deck) is empty.
    pub fn next_question(&mut self) -> Option<&Question> {
        let picked = match self.mode {
            SelectionMode::Normal => {
                select_next(&self.questions, &self.progress, self.mode, &mut self.rng)
                    .map(|s| (s.question.id.clone(), s.tier))
            }
            SelectionMode::MistakesOnly => {
                let mistakes = get_mistakes(&self.questions, &self.progress);
                select_next(&mistakes, &self.progress, self.mode, &mut self.rng)
                    .map(|s| (s.question.id.clone(), s.tier))
            }
        };

        match picked {
            Some((id, tier)) => {
                log::debug!("Selected {id} from {tier:?} tier ({} mode)", self.mode.as_str());
                self.current = Some(id);
                self.current_question()
            }
            None => {
                self.current = None;
                None
            }
        }
    }

    /// Jump straight to a specific question, e.g. from the hardest-questions list.
    pub fn review(&mut self, id: &str) -> Result<&Question, QuizError> {
        if self.question(id).is_none() {
            return Err(QuizError::QuestionNotFound(id.to_string()));
        }
        self.current = Some(id.to_string());
        self.current_question()
            .ok_or_else(|| QuizError::QuestionNotFound(id.to_string()))
    }

    /// Grade a response to the current question and record it.
    pub fn submit(&mut self, response: &Response) -> Result<AnswerOutcome, QuizError> {
        let id = self.current.clone().ok_or(QuizError::NoCurrentQuestion)?;
        let outcome = self.answer(&id, response)?;
        self.current = None;
        Ok(outcome)
    }

    /// Grade a response to the given question and record it.
    pub fn answer(&mut self, id: &str, response: &Response) -> Result<AnswerOutcome, QuizError> {
        let question = self
            .question(id)
            .ok_or_else(|| QuizError::QuestionNotFound(id.to_string()))?;
        let correct = question.grade(response)?;
        let question = question.clone();

        self.progress.record_attempt(id, correct);
        self.persist_progress();

        let outcome = AnswerOutcome::after_attempt(&question, correct, &self.progress);
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Record an outcome without grading. Works for ids not in the bank.
    pub fn record(&mut self, id: &str, correct: bool) {
        self.progress.record_attempt(id, correct);
        self.persist_progress();
    }

    pub fn toggle_pin(&mut self, id: &str) -> bool {
        let pinned = self.progress.toggle_pin(id);
        self.persist_progress();
        pinned
    }

    /// Throw away all history. There is no undo.
    pub fn reset_progress(&mut self) {
        self.progress.reset();
        self.current = None;
        self.last_outcome = None;
        self.persist_progress();
        log::info!("Progress reset");
    }

    pub fn stats(&self) -> Stats {
        compute_statistics(&self.progress, &self.questions, self.config.hardest_limit)
    }

    pub fn add_question(&mut self, question: Question) -> Result<(), QuizError> {
        self.add_questions(vec![question]).map(|_| ())
    }

    /// Add a batch of questions. Nothing is added unless every one is valid
    /// and no id collides with the bank or another in the batch.
    pub fn add_questions(&mut self, incoming: Vec<Question>) -> Result<usize, QuizError> {
        let mut ids: HashSet<&str> = self.questions.iter().map(|q| q.id.as_str()).collect();
        for question in &incoming {
            question.validate()?;
            if !ids.insert(question.id.as_str()) {
                return Err(QuizError::DuplicateQuestion(question.id.clone()));
            }
        }

        let added = incoming.len();
        self.questions.extend(incoming);
        self.persist_questions();
        log::info!("Added {added} questions");
        Ok(added)
    }

    /// Replace the question with the same id, keeping its place in the bank.
    pub fn update_question(&mut self, question: Question) -> Result<(), QuizError> {
        question.validate()?;
        let slot = self
            .questions
            .iter_mut()
            .find(|q| q.id == question.id)
            .ok_or_else(|| QuizError::QuestionNotFound(question.id.clone()))?;
        *slot = question;
        self.persist_questions();
        Ok(())
    }

    /// Remove a question from the bank. Its attempt history stays in progress.
    pub fn delete_question(&mut self, id: &str) -> Result<Question, QuizError> {
        let index = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| QuizError::QuestionNotFound(id.to_string()))?;
        let removed = self.questions.remove(index);
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        self.persist_questions();
        Ok(removed)
    }

    // Write-through; a failed write is logged and the in-memory state stays authoritative.
    fn persist_progress(&self) {
        if let Some(ref store) = self.store
            && let Err(e) = store.save_progress(&self.progress)
        {
            log::warn!("Failed to save progress: {e:#}");
        }
    }

    fn persist_questions(&self) {
        if let Some(ref store) = self.store
            && let Err(e) = store.save_questions(&self.questions)
        {
            log::warn!("Failed to save questions: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::model::QuestionType;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().to_string_lossy().to_string(),
            seed: Some(17),
            ..Config::default()
        }
    }

    fn bank() -> Vec<Question> {
        vec![
            Question::judge("Q1", "Rust has a garbage collector", false),
            Question::choice("Q2", "Which are integer types?", &["i32", "f64", "u8"], "AC"),
            Question::essay("Q3", "Explain ownership", "Each value has one owner"),
        ]
    }

    fn make_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(test_config(&dir));
        app.add_questions(bank()).unwrap();
        (dir, app)
    }

    fn choice(letters: &str) -> Response {
        Response::parse(QuestionType::Choice, letters).unwrap()
    }

    #[test]
    fn test_state_survives_restart() {
        let (dir, mut app) = make_app();
        app.answer("Q1", &Response::Judge(false)).unwrap();
        app.answer("Q2", &choice("A")).unwrap();
        app.toggle_pin("Q1");
        drop(app);

        let reloaded = App::new(test_config(&dir));
        assert_eq!(reloaded.questions, bank());
        assert_eq!(reloaded.progress.total_answered, 2);
        assert_eq!(reloaded.progress.last_outcome("Q2"), Some(false));
        assert!(reloaded.progress.is_pinned("Q1"));
    }

    #[test]
    fn test_submit_grades_current_question() {
        let (_dir, mut app) = make_app();
        app.review("Q2").unwrap();
        let outcome = app.submit(&choice("ca")).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.question_id, "Q2");
        assert_eq!(app.current, None);
        assert_eq!(app.last_outcome, Some(outcome));

        assert_eq!(app.submit(&choice("a")), Err(QuizError::NoCurrentQuestion));
    }

    #[test]
    fn test_wrong_response_kind_records_nothing() {
        let (_dir, mut app) = make_app();
        let err = app.answer("Q1", &choice("A")).unwrap_err();
        assert!(matches!(err, QuizError::ResponseMismatch { .. }));
        assert_eq!(app.progress.total_answered, 0);
    }

    #[test]
    fn test_letter_past_last_option_records_nothing() {
        let (_dir, mut app) = make_app();
        app.answer("Q1", &Response::Judge(false)).unwrap();

        let err = app.answer("Q2", &choice("x")).unwrap_err();
        assert!(matches!(err, QuizError::InvalidResponse { .. }));
        assert_eq!(app.progress.total_answered, 1);
        assert_eq!(app.progress.streak, 1);
        assert!(!app.progress.has_attempted("Q2"));
        assert_eq!(app.last_outcome.as_ref().map(|o| o.question_id.as_str()), Some("Q1"));
    }

    #[test]
    fn test_normal_mode_covers_bank_before_repeating() {
        let (_dir, mut app) = make_app();
        let mut asked = Vec::new();
        for _ in 0..3 {
            let id = app.next_question().unwrap().id.clone();
            assert!(!asked.contains(&id));
            app.record(&id, false);
            asked.push(id);
        }
        assert_eq!(asked.len(), 3);
    }

    #[test]
    fn test_mistakes_mode_draws_from_mistake_deck() {
        let (_dir, mut app) = make_app();
        app.set_mode(SelectionMode::MistakesOnly);
        assert!(app.next_question().is_none());
        assert_eq!(app.current, None);

        app.record("Q1", true);
        app.record("Q3", false);
        for _ in 0..20 {
            assert_eq!(app.next_question().unwrap().id, "Q3");
        }
    }

    #[test]
    fn test_delete_keeps_history() {
        let (_dir, mut app) = make_app();
        app.record("Q3", false);
        let removed = app.delete_question("Q3").unwrap();
        assert_eq!(removed.id, "Q3");
        assert!(app.question("Q3").is_none());
        assert_eq!(app.progress.last_outcome("Q3"), Some(false));
        assert!(app.mistakes().is_empty());
        assert_eq!(app.delete_question("Q3"), Err(QuizError::QuestionNotFound("Q3".into())));
    }

    #[test]
    fn test_add_rejects_duplicates_and_invalid_batches() {
        let (_dir, mut app) = make_app();
        assert_eq!(
            app.add_question(Question::judge("Q1", "again", true)),
            Err(QuizError::DuplicateQuestion("Q1".into()))
        );

        let batch = vec![
            Question::judge("N1", "fine", true),
            Question::choice("N2", "broken", &["only"], "A"),
        ];
        assert!(app.add_questions(batch).is_err());
        assert!(app.question("N1").is_none());
        assert_eq!(app.questions.len(), 3);
    }

    #[test]
    fn test_update_question_in_place() {
        let (_dir, mut app) = make_app();
        app.update_question(Question::judge("Q1", "Rust has no GC", true)).unwrap();
        assert_eq!(app.questions[0].content, "Rust has no GC");
        assert_eq!(
            app.update_question(Question::judge("nope", "x", true)),
            Err(QuizError::QuestionNotFound("nope".into()))
        );
    }

    #[test]
    fn test_reset_progress_is_complete() {
        let (dir, mut app) = make_app();
        app.record("Q1", false);
        app.record("Q2", true);
        app.toggle_pin("Q2");

        app.reset_progress();
        assert_eq!(app.progress, UserProgress::default());
        assert!(app.mistakes().is_empty());

        let reloaded = App::new(test_config(&dir));
        assert_eq!(reloaded.progress, UserProgress::default());
    }

    #[test]
    fn test_failed_persist_keeps_memory_state() {
        let (dir, mut app) = make_app();
        fs::remove_dir_all(dir.path()).unwrap();

        app.record("Q1", true);
        assert_eq!(app.progress.total_answered, 1);
        assert_eq!(app.stats().mastered, 1);
    }

    #[test]
    fn test_runs_without_store() {
        let mut app = App::with_store(Config::default(), None);
        assert!(app.next_question().is_none());
        app.add_question(Question::judge("only", "x", true)).unwrap();
        assert_eq!(app.next_question().unwrap().id, "only");
    }
}

use thiserror::Error;

use crate::model::question::QuestionType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("question id must not be blank")]
    BlankId,
    #[error("question {id} has no content")]
    BlankContent { id: String },
    #[error("choice question {id} needs at least 2 options, got {found}")]
    TooFewOptions { id: String, found: usize },
    #[error("choice question {id} has {found} options, more than the 26 letters A to Z")]
    TooManyOptions { id: String, found: usize },
    #[error("choice question {id} has no correct option")]
    NoCorrectOption { id: String },
    #[error("choice question {id} marks option {letter} correct but only has {options} options")]
    OptionOutOfRange {
        id: String,
        letter: char,
        options: usize,
    },
    #[error("cannot read {input:?} as a {expected} answer")]
    InvalidResponse {
        expected: QuestionType,
        input: String,
    },
    #[error("{expected} question cannot be graded with a {found} response")]
    ResponseMismatch {
        expected: QuestionType,
        found: &'static str,
    },
    #[error("a question with id {0} already exists")]
    DuplicateQuestion(String),
    #[error("no question with id {0}")]
    QuestionNotFound(String),
    #[error("no question is currently being asked")]
    NoCurrentQuestion,
}

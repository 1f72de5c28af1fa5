use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::error::QuizError;
use crate::model::response::Response;

const MIN_CHOICE_OPTIONS: usize = 2;
/// One letter per option, `A` to `Z`.
pub const MAX_CHOICE_OPTIONS: usize = 26;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionType {
    Choice,
    Judge,
    Essay,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::Choice,
        QuestionType::Judge,
        QuestionType::Essay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Choice => "CHOICE",
            QuestionType::Judge => "JUDGE",
            QuestionType::Essay => "ESSAY",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The gradeable part of a question, keyed by its type.
///
/// Each variant carries only what makes sense for it, so a judge question
/// can never hold a letter set and a choice question always has options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Answer {
    Choice {
        options: Vec<String>,
        #[serde(rename = "correct_answer", deserialize_with = "deserialize_letters")]
        correct: BTreeSet<char>,
    },
    Judge {
        #[serde(rename = "correct_answer")]
        correct: bool,
    },
    /// Self-graded: the reference text is shown after answering, never compared.
    Essay {
        #[serde(rename = "correct_answer", default)]
        reference: String,
    },
}

impl Answer {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Answer::Choice { .. } => QuestionType::Choice,
            Answer::Judge { .. } => QuestionType::Judge,
            Answer::Essay { .. } => QuestionType::Essay,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub content: String,
    #[serde(flatten)]
    pub answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Question {
    pub fn new(id: impl Into<String>, content: impl Into<String>, answer: Answer) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            answer,
            mnemonic: None,
            analysis: None,
            key_points: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn judge(id: impl Into<String>, content: impl Into<String>, correct: bool) -> Self {
        Self::new(id, content, Answer::Judge { correct })
    }

    pub fn choice(
        id: impl Into<String>,
        content: impl Into<String>,
        options: &[&str],
        correct: &str,
    ) -> Self {
        Self::new(
            id,
            content,
            Answer::Choice {
                options: options.iter().map(|o| o.to_string()).collect(),
                correct: parse_letters(correct),
            },
        )
    }

    pub fn essay(
        id: impl Into<String>,
        content: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            content,
            Answer::Essay {
                reference: reference.into(),
            },
        )
    }

    pub fn question_type(&self) -> QuestionType {
        self.answer.question_type()
    }

    /// Options paired with their letters. Empty for non-choice questions.
    pub fn lettered_options(&self) -> Vec<(char, &str)> {
        match &self.answer {
            Answer::Choice { options, .. } => options
                .iter()
                .enumerate()
                .map(|(i, opt)| (option_letter(i), opt.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Human-readable correct answer, e.g. `"AC"`, `"true"` or the essay reference.
    pub fn answer_text(&self) -> String {
        match &self.answer {
            Answer::Choice { correct, .. } => correct.iter().collect(),
            Answer::Judge { correct } => correct.to_string(),
            Answer::Essay { reference } => reference.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        if self.id.trim().is_empty() {
            return Err(QuizError::BlankId);
        }
        if self.content.trim().is_empty() {
            return Err(QuizError::BlankContent {
                id: self.id.clone(),
            });
        }
        if let Answer::Choice { options, correct } = &self.answer {
            if options.len() < MIN_CHOICE_OPTIONS {
                return Err(QuizError::TooFewOptions {
                    id: self.id.clone(),
                    found: options.len(),
                });
            }
            if options.len() > MAX_CHOICE_OPTIONS {
                return Err(QuizError::TooManyOptions {
                    id: self.id.clone(),
                    found: options.len(),
                });
            }
            if correct.is_empty() {
                return Err(QuizError::NoCorrectOption {
                    id: self.id.clone(),
                });
            }
            if let Some(&letter) = correct
                .iter()
                .find(|&&l| letter_index(l).is_none_or(|i| i >= options.len()))
            {
                return Err(QuizError::OptionOutOfRange {
                    id: self.id.clone(),
                    letter,
                    options: options.len(),
                });
            }
        }
        Ok(())
    }

    /// Grade a response. Choice questions need the exact set of correct
    /// letters; essays take the learner's own verdict. A letter past the last
    /// option cannot be graded at all.
    pub fn grade(&self, response: &Response) -> Result<bool, QuizError> {
        match (&self.answer, response) {
            (Answer::Choice { options, correct }, Response::Choice(picked)) => {
                if picked
                    .iter()
                    .any(|&l| letter_index(l).is_none_or(|i| i >= options.len()))
                {
                    return Err(QuizError::InvalidResponse {
                        expected: QuestionType::Choice,
                        input: picked.iter().collect(),
                    });
                }
                Ok(correct == picked)
            }
            (Answer::Judge { correct }, Response::Judge(said)) => Ok(correct == said),
            (Answer::Essay { .. }, Response::SelfGraded(verdict)) => Ok(*verdict),
            (answer, other) => Err(QuizError::ResponseMismatch {
                expected: answer.question_type(),
                found: other.kind(),
            }),
        }
    }
}

/// Letter for an option index. Only meaningful below `MAX_CHOICE_OPTIONS`,
/// which `validate` enforces.
pub fn option_letter(index: usize) -> char {
    (b'A' + index.min(MAX_CHOICE_OPTIONS - 1) as u8) as char
}

pub fn letter_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| (upper as u8 - b'A') as usize)
}

/// Collect option letters from free text: `"ac"`, `"A, C"` and `"CA"` all give `{A, C}`.
pub fn parse_letters(text: &str) -> BTreeSet<char> {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LettersRepr {
    One(String),
    Many(Vec<String>),
}

// Older banks store the answer as a plain string ("B" or "AC"); newer ones as a list.
fn deserialize_letters<'de, D>(deserializer: D) -> Result<BTreeSet<char>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LettersRepr::deserialize(deserializer)? {
        LettersRepr::One(s) => parse_letters(&s),
        LettersRepr::Many(items) => items.iter().flat_map(|s| parse_letters(s)).collect(),
    })
}

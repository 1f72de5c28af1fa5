use std::collections::BTreeSet;

use crate::model::error::QuizError;
use crate::model::question::{QuestionType, parse_letters};

/// A learner's submitted answer, already parsed for a question type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Choice(BTreeSet<char>),
    Judge(bool),
    SelfGraded(bool),
}

impl Response {
    pub fn parse(question_type: QuestionType, input: &str) -> Result<Self, QuizError> {
        let invalid = || QuizError::InvalidResponse {
            expected: question_type,
            input: input.to_string(),
        };

        match question_type {
            QuestionType::Choice => {
                // Separators are fine, anything else alphanumeric is not a letter we can use.
                if input
                    .chars()
                    .any(|c| c.is_alphanumeric() && !c.is_ascii_alphabetic())
                {
                    return Err(invalid());
                }
                let letters = parse_letters(input);
                if letters.is_empty() {
                    return Err(invalid());
                }
                Ok(Response::Choice(letters))
            }
            QuestionType::Judge => parse_bool(input).map(Response::Judge).ok_or_else(invalid),
            QuestionType::Essay => {
                let verdict = match input.trim().to_ascii_lowercase().as_str() {
                    "right" | "correct" => Some(true),
                    "wrong" | "incorrect" => Some(false),
                    _ => parse_bool(input),
                };
                verdict.map(Response::SelfGraded).ok_or_else(invalid)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Response::Choice(_) => "choice",
            Response::Judge(_) => "judge",
            Response::SelfGraded(_) => "self-graded",
        }
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice_letters() {
        let expected: BTreeSet<char> = ['A', 'C'].into_iter().collect();
        assert_eq!(
            Response::parse(QuestionType::Choice, "ca").unwrap(),
            Response::Choice(expected.clone())
        );
        assert_eq!(
            Response::parse(QuestionType::Choice, "A, C").unwrap(),
            Response::Choice(expected)
        );
    }

    #[test]
    fn test_parse_choice_rejects_empty_and_digits() {
        assert!(Response::parse(QuestionType::Choice, "  ").is_err());
        assert!(Response::parse(QuestionType::Choice, "1").is_err());
    }

    #[test]
    fn test_parse_judge_vocabulary() {
        for word in ["true", "T", "yes", "Y", "1"] {
            assert_eq!(Response::parse(QuestionType::Judge, word).unwrap(), Response::Judge(true));
        }
        for word in ["false", "F", "no", "n", "0"] {
            assert_eq!(Response::parse(QuestionType::Judge, word).unwrap(), Response::Judge(false));
        }
        assert_eq!(
            Response::parse(QuestionType::Judge, "maybe"),
            Err(QuizError::InvalidResponse {
                expected: QuestionType::Judge,
                input: "maybe".into(),
            })
        );
    }

    #[test]
    fn test_parse_essay_self_grade() {
        assert_eq!(
            Response::parse(QuestionType::Essay, "right").unwrap(),
            Response::SelfGraded(true)
        );
        assert_eq!(
            Response::parse(QuestionType::Essay, "Wrong").unwrap(),
            Response::SelfGraded(false)
        );
        assert_eq!(Response::parse(QuestionType::Essay, "y").unwrap(), Response::SelfGraded(true));
        assert!(Response::parse(QuestionType::Essay, "my essay text").is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::progress::UserProgress;
use crate::model::Question;

pub const SCHEMA_VERSION: u32 = 1;

/// A stored record that carries the schema version it was written with.
pub trait Versioned {
    fn schema_version(&self) -> u32;

    /// Written by a newer build whose layout this one cannot trust.
    fn needs_reset(&self) -> bool {
        self.schema_version() > SCHEMA_VERSION
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionBankData {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Default for QuestionBankData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            questions: Vec::new(),
        }
    }
}

impl Versioned for QuestionBankData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub progress: UserProgress,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            progress: UserProgress::default(),
        }
    }
}

impl Versioned for ProgressData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Input accepted by `add`: either a full bank file or a bare list of questions.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum QuestionImport {
    Bank(QuestionBankData),
    List(Vec<Question>),
}

impl QuestionImport {
    pub fn into_questions(self) -> Vec<Question> {
        match self {
            QuestionImport::Bank(bank) => bank.questions,
            QuestionImport::List(questions) => questions,
        }
    }
}

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub quizdeck_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub questions: QuestionBankData,
    pub progress: ProgressData,
}

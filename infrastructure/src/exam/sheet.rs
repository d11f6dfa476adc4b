//! Exam sheet I/O.
//!
//! An exam sheet is a JSON file listing the questions of one exam, as
//! produced by the upstream extraction collaborator. Solving it yields a
//! `*_solved.json` companion carrying the finalized decisions alongside
//! the original questions, plus an agreed/unresolved summary.

use ensemble_domain::{
    ConsensusDecision, DecisionStatus, DomainError, Question, QuestionKind,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while reading or writing exam sheets
#[derive(Error, Debug)]
pub enum ExamError {
    #[error("Exam file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid exam JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid exam: {0}")]
    Invalid(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// One question as recorded on the sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestion {
    /// Defaults to the question's position when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    /// Present only for multiple-choice questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
}

/// A whole exam sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSheet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub total_points: f64,
    pub total_time_min: u32,
    pub questions: Vec<ExamQuestion>,
}

impl ExamSheet {
    /// Load and validate an exam sheet
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExamError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ExamError::NotFound(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path)?;
        let sheet: ExamSheet = serde_json::from_str(&raw)?;

        if sheet.questions.is_empty() {
            return Err(ExamError::Invalid("exam has no questions".to_string()));
        }

        info!(
            "Loaded exam with {} questions, {} points",
            sheet.questions.len(),
            sheet.total_points
        );
        Ok(sheet)
    }

    /// Convert the sheet entries into domain questions
    pub fn to_questions(&self) -> Result<Vec<Question>, ExamError> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let id = entry
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("q{}", index + 1));
                let kind = if entry.options.is_empty() {
                    QuestionKind::FreeForm
                } else {
                    QuestionKind::multiple_choice(entry.options.clone())
                };

                let mut question = Question::new(id, entry.text.clone(), kind, entry.points)?;
                if let Some(rubric) = &entry.rubric {
                    question = question.with_rubric(rubric);
                }
                Ok(question)
            })
            .collect()
    }
}

/// Per-exam outcome counts, mirrored into the solved sheet for a quick
/// agreement-rate read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveSummary {
    pub total_questions: usize,
    pub accepted: usize,
    pub unresolved: usize,
}

/// An exam sheet with its finalized decisions
#[derive(Debug, Clone, Serialize)]
pub struct SolvedSheet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub total_points: f64,
    pub total_time_min: u32,
    pub summary: SolveSummary,
    pub decisions: Vec<ConsensusDecision>,
}

impl SolvedSheet {
    /// Pair a sheet with its decisions (one per question, same order)
    pub fn new(sheet: &ExamSheet, decisions: Vec<ConsensusDecision>) -> Self {
        let accepted = decisions
            .iter()
            .filter(|d| d.status == DecisionStatus::Accepted)
            .count();

        Self {
            title: sheet.title.clone(),
            total_points: sheet.total_points,
            total_time_min: sheet.total_time_min,
            summary: SolveSummary {
                total_questions: decisions.len(),
                accepted,
                unresolved: decisions.len() - accepted,
            },
            decisions,
        }
    }

    /// Write the solved sheet as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ExamError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!("Saved solved exam to {}", path.as_ref().display());
        Ok(())
    }
}

/// Companion output path: `exam.json` becomes `exam_solved.json`
pub fn solved_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("exam");
    let ext = input.extension().and_then(|s| s.to_str()).unwrap_or("json");
    input.with_file_name(format!("{}_solved.{}", stem, ext))
}

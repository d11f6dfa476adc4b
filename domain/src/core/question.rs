//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Identifier of a question within an exam
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        QuestionId::new(s)
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        QuestionId::new(s)
    }
}

/// The kind of answer a question expects.
///
/// The option set exists only for multiple-choice questions, so it lives
/// inside the variant rather than as a separate nullable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    FreeForm,
    MultipleChoice { options: Vec<String> },
}

impl QuestionKind {
    /// Create a multiple-choice kind from an option list
    pub fn multiple_choice(options: Vec<String>) -> Self {
        QuestionKind::MultipleChoice { options }
    }

    pub fn is_multiple_choice(&self) -> bool {
        matches!(self, QuestionKind::MultipleChoice { .. })
    }

    /// The option set, empty for free-form questions
    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::FreeForm => &[],
            QuestionKind::MultipleChoice { options } => options,
        }
    }
}

/// A question to be answered by the ensemble (Value Object)
///
/// Immutable once handed to the consensus core: the rubric reference and
/// point value never change across rephrase attempts, only the wording of
/// the prompt may be restated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    kind: QuestionKind,
    points: f64,
    rubric: Option<String>,
}

impl Question {
    /// Create a new question.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidQuestion`] if the prompt is empty or
    /// a multiple-choice question carries no options.
    pub fn new(
        id: impl Into<QuestionId>,
        prompt: impl Into<String>,
        kind: QuestionKind,
        points: f64,
    ) -> Result<Self, DomainError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "prompt cannot be empty".to_string(),
            ));
        }
        if let QuestionKind::MultipleChoice { options } = &kind
            && options.is_empty()
        {
            return Err(DomainError::InvalidQuestion(
                "multiple-choice question has no options".to_string(),
            ));
        }
        if !points.is_finite() || points < 0.0 {
            return Err(DomainError::InvalidQuestion(format!(
                "invalid point value: {}",
                points
            )));
        }

        Ok(Self {
            id: id.into(),
            prompt,
            kind,
            points,
            rubric: None,
        })
    }

    /// Create a free-form question (the common case)
    pub fn free_form(
        id: impl Into<QuestionId>,
        prompt: impl Into<String>,
        points: f64,
    ) -> Result<Self, DomainError> {
        Self::new(id, prompt, QuestionKind::FreeForm, points)
    }

    /// Attach a grading rubric reference
    pub fn with_rubric(mut self, rubric: impl Into<String>) -> Self {
        self.rubric = Some(rubric.into());
        self
    }

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn rubric(&self) -> Option<&str> {
        self.rubric.as_deref()
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prompt)
    }
}

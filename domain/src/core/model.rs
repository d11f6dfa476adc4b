//! Model value object representing a backing LLM

use serde::{Deserialize, Serialize};

/// Identifier of the LLM backing a solver or arbiter slot (Value Object)
///
/// The consensus core is agnostic to which concrete service backs each
/// slot — any chat-completions endpoint satisfies the solver capability —
/// so the model is carried as an opaque identifier rather than a closed
/// enum of known deployments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Model(String);

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default solver roster: two cost-effective models plus one with a
    /// different reasoning profile for diversity
    pub fn default_solvers() -> Vec<Model> {
        vec![
            Model::new("gpt-4o-mini"),
            Model::new("gpt-3.5-turbo"),
            Model::new("gpt-4o-mini"),
        ]
    }

    /// Default arbiter model for equivalence rulings and rephrasing
    pub fn default_arbiter() -> Model {
        Model::new("gpt-4o-mini")
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Model::new(s)
    }
}

impl From<String> for Model {
    fn from(s: String) -> Self {
        Model::new(s)
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Model::new(s))
    }
}

//! Configuration file schema (`ensemble.toml`)
//!
//! Example configuration:
//!
//! ```toml
//! [solvers]
//! models = ["gpt-4o-mini", "gpt-3.5-turbo", "gpt-4o-mini"]
//! trusted = 1
//!
//! [arbiter]
//! model = "gpt-4o-mini"
//!
//! [limits]
//! max_rephrase_attempts = 2
//! per_call_timeout_secs = 60
//!
//! [api]
//! base_url = "https://api.openai.com/v1"
//! temperature = 0.3
//! ```

use crate::providers::openai::DEFAULT_BASE_URL;
use ensemble_application::SessionParams;
use ensemble_domain::Model;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub solvers: SolversConfig,
    pub arbiter: ArbiterConfig,
    pub limits: LimitsConfig,
    pub api: ApiConfig,
}

/// Solver roster configuration (`[solvers]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolversConfig {
    /// One model per slot; when empty, the default roster is cycled to
    /// `num_solvers` entries
    pub models: Vec<String>,
    /// Roster size used when `models` is empty
    pub num_solvers: usize,
    /// Slot (1-based) whose answer wins frequency ties
    pub trusted: Option<usize>,
}

impl Default for SolversConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            num_solvers: 3,
            trusted: None,
        }
    }
}

/// Arbiter configuration (`[arbiter]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Model used for equivalence rulings and rephrasing
    pub model: String,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            model: Model::default_arbiter().as_str().to_string(),
        }
    }
}

/// Attempt-loop limits (`[limits]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Rephrase retries after the initial attempt
    pub max_rephrase_attempts: usize,
    /// Per-invocation timeout in seconds; 0 disables the bound
    pub per_call_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_rephrase_attempts: 2,
            per_call_timeout_secs: 60,
        }
    }
}

/// Endpoint settings (`[api]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Credential; usually left out of the file and supplied by the
    /// caller instead
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.3,
        }
    }
}

impl FileConfig {
    /// Materialize session parameters from the file values.
    pub fn to_session_params(&self) -> SessionParams {
        let solvers: Vec<Model> = if self.solvers.models.is_empty() {
            Model::default_solvers()
                .into_iter()
                .cycle()
                .take(self.solvers.num_solvers)
                .collect()
        } else {
            self.solvers.models.iter().map(|m| Model::new(m.as_str())).collect()
        };

        let timeout = match self.limits.per_call_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let mut params = SessionParams::default()
            .with_solvers(solvers)
            .with_arbiter(Model::new(self.arbiter.model.as_str()))
            .with_max_rephrase_attempts(self.limits.max_rephrase_attempts)
            .with_per_call_timeout(timeout);

        if let Some(slot) = self.solvers.trusted
            && slot >= 1
            && slot <= params.num_solvers()
        {
            params = params.with_trusted_solver(slot);
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileConfig::default();
        assert!(config.solvers.models.is_empty());
        assert_eq!(config.solvers.num_solvers, 3);
        assert_eq!(config.limits.max_rephrase_attempts, 2);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_default_params_cycle_roster() {
        let mut config = FileConfig::default();
        config.solvers.num_solvers = 5;

        let params = config.to_session_params();
        assert_eq!(params.num_solvers(), 5);
    }

    #[test]
    fn test_explicit_models_win() {
        let mut config = FileConfig::default();
        config.solvers.models = vec!["m1".to_string(), "m2".to_string()];
        config.solvers.num_solvers = 7;

        let params = config.to_session_params();
        assert_eq!(params.num_solvers(), 2);
        assert_eq!(params.solvers[0].as_str(), "m1");
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let mut config = FileConfig::default();
        config.limits.per_call_timeout_secs = 0;

        let params = config.to_session_params();
        assert!(params.per_call_timeout.is_none());
    }

    #[test]
    fn test_out_of_range_trusted_slot_ignored() {
        let mut config = FileConfig::default();
        config.solvers.trusted = Some(9);

        let params = config.to_session_params();
        assert!(params.trusted_solver.is_none());
    }
}

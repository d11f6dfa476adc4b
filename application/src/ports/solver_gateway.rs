//! Solver gateway port
//!
//! Defines the interface for invoking the external solving agents. The
//! same capability backs the arbiter's equivalence rulings and the
//! rephrase calls — all three are plain prompt-in/answer-out
//! invocations of some language-model service.

use async_trait::async_trait;
use ensemble_domain::Model;
use thiserror::Error;

/// Errors that can occur during solver gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for solver invocations
///
/// This port defines how the application layer reaches the external
/// language-model services. Implementations (adapters) live in the
/// infrastructure layer; tests substitute deterministic mocks with
/// canned outputs so the consensus logic never needs a live call.
///
/// Implementations must be stateless across invocations: concurrent
/// calls with the same prompt must not influence each other.
#[async_trait]
pub trait SolverGateway: Send + Sync {
    /// Invoke a model once with a system prompt and a user prompt,
    /// returning its full text response.
    async fn invoke(
        &self,
        model: &Model,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError>;
}

//! Application layer for exam-ensemble
//!
//! Use cases and ports. The [`ConsensusSession`] use case drives the
//! consensus loop against the [`SolverGateway`] port; adapters for the
//! port live in the infrastructure layer, and deterministic mocks stand
//! in for it in tests.

pub mod config;
pub mod ports;
pub mod use_cases;

pub use config::SessionParams;
pub use ports::{GatewayError, SolverGateway};
pub use use_cases::{ConsensusSession, SolveQuestionError};

//! Infrastructure layer for exam-ensemble
//!
//! External adapters and implementations: the chat-completions provider
//! behind the solver gateway port, configuration loading, exam sheet
//! input/output, and the JSONL decision audit log.

pub mod config;
pub mod exam;
pub mod logging;
pub mod providers;

pub use config::{ConfigLoader, FileConfig};
pub use exam::{ExamError, ExamSheet, SolvedSheet, solved_path};
pub use logging::DecisionLog;
pub use providers::OpenAiGateway;

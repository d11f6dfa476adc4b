//! Use cases orchestrating the domain logic

pub mod solve_question;

pub use solve_question::{ConsensusSession, SolveQuestionError};

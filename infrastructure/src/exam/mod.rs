//! Exam sheet input/output

pub mod sheet;

pub use sheet::{ExamError, ExamQuestion, ExamSheet, SolveSummary, SolvedSheet, solved_path};

//! Command-line argument definitions

use clap::Parser;
use std::path::PathBuf;

/// Ensemble consensus solver for exam questions.
///
/// Solves a single question given on the command line, or a whole exam
/// sheet with `--exam` (questions run in parallel, one consensus session
/// each).
#[derive(Parser, Debug)]
#[command(name = "exam-ensemble", version, about)]
pub struct Cli {
    /// Question to solve (omit when using --exam)
    pub question: Option<String>,

    /// Solve every question in an exam sheet (JSON)
    #[arg(long, value_name = "FILE", conflicts_with = "question")]
    pub exam: Option<PathBuf>,

    /// Comma-separated options turning the single question into
    /// multiple-choice
    #[arg(long, value_delimiter = ',', value_name = "OPTIONS")]
    pub options: Vec<String>,

    /// Point value of the single question
    #[arg(long, default_value_t = 1.0)]
    pub points: f64,

    /// Configuration file path (defaults to ./ensemble.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Solver models, one per slot (overrides the configured roster)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Arbiter model (overrides the configured one)
    #[arg(long, value_name = "MODEL")]
    pub arbiter: Option<String>,

    /// Maximum rephrase retries after the initial attempt
    #[arg(long, value_name = "N")]
    pub max_rephrase: Option<usize>,

    /// API key (falls back to the config file, then $OPENAI_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Append finalized decisions to a JSONL audit log
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Suppress the banner, print only the decision JSON
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_question_args() {
        let cli = Cli::parse_from(["exam-ensemble", "What is 2+2?", "--points", "4"]);
        assert_eq!(cli.question.as_deref(), Some("What is 2+2?"));
        assert_eq!(cli.points, 4.0);
        assert!(cli.exam.is_none());
    }

    #[test]
    fn test_exam_mode_args() {
        let cli = Cli::parse_from(["exam-ensemble", "--exam", "midterm.json", "-vv"]);
        assert_eq!(cli.exam, Some(PathBuf::from("midterm.json")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_options_split_on_commas() {
        let cli = Cli::parse_from(["exam-ensemble", "Pick one", "--options", "2,4,6"]);
        assert_eq!(cli.options, vec!["2", "4", "6"]);
    }
}

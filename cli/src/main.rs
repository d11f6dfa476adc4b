//! CLI entrypoint for Exam Ensemble
//!
//! This is the main binary that wires together all layers using
//! dependency injection: configuration is resolved at the edge and
//! passed explicitly into the sessions, never read from ambient state
//! by the core.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::Cli;
use ensemble_application::{ConsensusSession, SessionParams, SolveQuestionError};
use ensemble_domain::{Model, Question, QuestionKind};
use ensemble_infrastructure::{
    ConfigLoader, DecisionLog, ExamSheet, OpenAiGateway, SolvedSheet, solved_path,
};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting Exam Ensemble");

    let config = ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Build session parameters: config file, then CLI overrides
    let mut params = config.to_session_params();
    if !cli.model.is_empty() {
        params = params.with_solvers(cli.model.iter().map(|m| Model::new(m.as_str())).collect());
    }
    if let Some(arbiter) = &cli.arbiter {
        params = params.with_arbiter(Model::new(arbiter.as_str()));
    }
    if let Some(max) = cli.max_rephrase {
        params = params.with_max_rephrase_attempts(max);
    }

    // Credentials resolve here at the edge; the core only ever sees the
    // constructed gateway
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| config.api.api_key.clone())
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .context("No API key: pass --api-key, set [api].api_key, or export OPENAI_API_KEY")?;

    // === Dependency Injection ===
    let gateway = Arc::new(
        OpenAiGateway::new(config.api.base_url.as_str(), api_key)?
            .with_temperature(config.api.temperature),
    );

    let log = cli.log.as_ref().and_then(DecisionLog::new);

    // Ctrl-C cancels in-flight solver calls; a cancelled session
    // finalizes no decision
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
    }

    if let Some(exam_path) = cli.exam.clone() {
        return run_exam(&cli, gateway, params, token, log.as_ref(), &exam_path).await;
    }

    let Some(text) = cli.question.clone() else {
        bail!("Question is required. Pass question text or --exam <file>.");
    };

    run_single(&cli, gateway, params, token, log.as_ref(), text).await
}

/// Solve a single question given on the command line and print the
/// finalized decision as JSON.
async fn run_single(
    cli: &Cli,
    gateway: Arc<OpenAiGateway>,
    params: SessionParams,
    token: CancellationToken,
    log: Option<&DecisionLog>,
    text: String,
) -> Result<()> {
    let kind = if cli.options.is_empty() {
        QuestionKind::FreeForm
    } else {
        QuestionKind::multiple_choice(cli.options.clone())
    };
    let question = Question::new("q1", text, kind, cli.points)?;

    if !cli.quiet {
        println!("Question: {}", question.prompt());
        println!(
            "Solvers:  {}",
            params
                .solvers
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    let session = ConsensusSession::new(gateway, params).with_cancellation(token);

    let decision = match session.run(&question).await {
        Ok(decision) => decision,
        Err(SolveQuestionError::Cancelled) => bail!("Cancelled"),
        Err(e) => return Err(e.into()),
    };

    if let Some(log) = log {
        log.record(&decision);
    }

    println!("{}", serde_json::to_string_pretty(&decision)?);

    if !cli.quiet {
        println!();
        println!(
            "Status: {} ({}), {} attempt(s)",
            decision.status, decision.confidence, decision.attempts_used
        );
    }

    Ok(())
}

/// Solve every question of an exam sheet.
///
/// Sessions share nothing, so all questions run fully in parallel; the
/// decisions are written back in question order as a `*_solved.json`
/// companion file.
async fn run_exam(
    cli: &Cli,
    gateway: Arc<OpenAiGateway>,
    params: SessionParams,
    token: CancellationToken,
    log: Option<&DecisionLog>,
    exam_path: &Path,
) -> Result<()> {
    let sheet = ExamSheet::load(exam_path)?;
    let questions = sheet.to_questions()?;
    let total = questions.len();

    if !cli.quiet {
        println!(
            "Solving {} questions ({} points, {} min limit)",
            total, sheet.total_points, sheet.total_time_min
        );
    }

    let mut join_set = JoinSet::new();
    for (index, question) in questions.into_iter().enumerate() {
        let gateway = Arc::clone(&gateway);
        let params = params.clone();
        let token = token.clone();

        join_set.spawn(async move {
            let session = ConsensusSession::new(gateway, params).with_cancellation(token);
            (index, session.run(&question).await)
        });
    }

    let mut decisions: Vec<Option<_>> = (0..total).map(|_| None).collect();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, Ok(decision))) => {
                if let Some(log) = log {
                    log.record(&decision);
                }
                info!(
                    "Question {}/{} finalized: {}",
                    index + 1,
                    total,
                    decision.status
                );
                decisions[index] = Some(decision);
            }
            Ok((_, Err(SolveQuestionError::Cancelled))) => {
                join_set.abort_all();
                bail!("Cancelled");
            }
            Ok((_, Err(e))) => {
                join_set.abort_all();
                return Err(e.into());
            }
            Err(e) => {
                join_set.abort_all();
                bail!("Session task failed: {}", e);
            }
        }
    }

    let decisions: Vec<_> = decisions.into_iter().flatten().collect();
    let solved = SolvedSheet::new(&sheet, decisions);

    let output = solved_path(exam_path);
    solved.save(&output)?;

    if !cli.quiet {
        println!();
        println!("Saved to: {}", output.display());
        println!(
            "Accepted: {}/{} ({} unresolved)",
            solved.summary.accepted, solved.summary.total_questions, solved.summary.unresolved
        );
    }

    Ok(())
}

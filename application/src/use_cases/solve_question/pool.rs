//! Solver pool: concurrent fan-out of one phrasing to N solvers.
//!
//! All slots are invoked concurrently with the same phrasing and no
//! shared state; each call is bounded by the per-call timeout. A
//! timed-out or erroring slot becomes an abstention rather than aborting
//! the attempt, and every invocation, success or failure, lands in its
//! slot of the returned candidate list, so the same solver's output is
//! always reported in the same position regardless of completion order.

use super::PoolError;
use crate::config::SessionParams;
use crate::ports::solver_gateway::{GatewayError, SolverGateway};
use ensemble_domain::{CandidateAnswer, PromptTemplate, QuestionKind, SolverId};
use ensemble_domain::{extract_final_answer, normalize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fan one phrasing out to every solver slot and collect candidates.
///
/// Returns [`PoolError::AllSolversFailed`] (carrying the abstention
/// records) when not a single slot produced an answer, and
/// [`PoolError::Cancelled`] when the session's token fires: in-flight
/// calls are aborted and nothing is finalized.
pub(super) async fn solve<G: SolverGateway + 'static>(
    gateway: &Arc<G>,
    params: &SessionParams,
    phrasing: &str,
    kind: &QuestionKind,
    cancellation_token: &Option<CancellationToken>,
) -> Result<Vec<CandidateAnswer>, PoolError> {
    let prompt = PromptTemplate::solver_query(phrasing, kind);
    let timeout = params.per_call_timeout;

    let mut join_set = JoinSet::new();

    for (index, model) in params.solvers.iter().enumerate() {
        let gateway = Arc::clone(gateway);
        let model = model.clone();
        let prompt = prompt.clone();
        let kind = kind.clone();
        let solver = SolverId::new(index + 1);

        join_set.spawn(async move {
            let call = gateway.invoke(&model, PromptTemplate::solver_system(), &prompt);

            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(r) => r,
                    Err(_) => Err(GatewayError::Timeout),
                },
                None => call.await,
            };

            let candidate = match result {
                Ok(response) => {
                    let answer = extract_final_answer(&response);
                    let key = normalize(&answer, &kind);
                    debug!("{} answered {:?} (key {})", solver, answer, key);
                    CandidateAnswer::success(solver, model.as_str(), answer, response, key)
                }
                Err(e) => {
                    warn!("{} ({}) abstained: {}", solver, model, e);
                    CandidateAnswer::abstention(solver, model.as_str(), e.to_string())
                }
            };

            (index, candidate)
        });
    }

    let mut by_slot: Vec<Option<CandidateAnswer>> = vec![None; params.num_solvers()];

    loop {
        let joined = if let Some(token) = cancellation_token {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    join_set.abort_all();
                    return Err(PoolError::Cancelled);
                }
                joined = join_set.join_next() => joined,
            }
        } else {
            join_set.join_next().await
        };

        let Some(joined) = joined else {
            break;
        };

        match joined {
            Ok((index, candidate)) => by_slot[index] = Some(candidate),
            Err(e) => warn!("Solver task join error: {}", e),
        }
    }

    // Fill any slot lost to a task failure so no invocation disappears
    // from the attempt record
    let candidates: Vec<CandidateAnswer> = by_slot
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            candidate.unwrap_or_else(|| {
                CandidateAnswer::abstention(
                    SolverId::new(index + 1),
                    params.solvers[index].as_str(),
                    "solver task failed",
                )
            })
        })
        .collect();

    let successes = candidates.iter().filter(|c| c.success).count();
    info!(
        "Pool gathered {}/{} answers",
        successes,
        candidates.len()
    );

    if successes == 0 {
        return Err(PoolError::AllSolversFailed(candidates));
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::super::testing::MockGateway;
    use super::*;
    use ensemble_domain::Model;

    fn params() -> SessionParams {
        SessionParams::default().with_solvers(vec![
            Model::new("alpha"),
            Model::new("beta"),
            Model::new("gamma"),
        ])
    }

    #[tokio::test]
    async fn test_candidates_reported_in_slot_order() {
        let gateway = Arc::new(
            MockGateway::new()
                .respond("alpha", "Final Answer: 4")
                .respond("beta", "Final Answer: 5")
                .respond("gamma", "Final Answer: 6"),
        );

        let candidates = solve(&gateway, &params(), "q", &QuestionKind::FreeForm, &None)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 3);
        for (i, candidate) in candidates.iter().enumerate() {
            assert_eq!(candidate.solver, SolverId::new(i + 1));
        }
        assert_eq!(candidates[1].answer, "5");
    }

    #[tokio::test]
    async fn test_failed_solver_becomes_abstention() {
        let gateway = Arc::new(
            MockGateway::new()
                .respond("alpha", "Final Answer: 4")
                .fail("beta", GatewayError::RequestFailed("boom".to_string()))
                .respond("gamma", "Final Answer: 4"),
        );

        let candidates = solve(&gateway, &params(), "q", &QuestionKind::FreeForm, &None)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 3);
        assert!(!candidates[1].success);
        assert!(candidates[1].error.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_solver_times_out() {
        let gateway = Arc::new(
            MockGateway::new()
                .respond("alpha", "Final Answer: 4")
                .stall("beta")
                .respond("gamma", "Final Answer: 4"),
        );

        let candidates = solve(&gateway, &params(), "q", &QuestionKind::FreeForm, &None)
            .await
            .unwrap();

        assert!(!candidates[1].success);
        assert_eq!(candidates[1].error.as_deref(), Some("Timeout"));
        assert_eq!(candidates.iter().filter(|c| c.success).count(), 2);
    }

    #[tokio::test]
    async fn test_zero_successes_is_pool_failure() {
        let gateway = Arc::new(
            MockGateway::new()
                .fail("alpha", GatewayError::Timeout)
                .fail("beta", GatewayError::Timeout)
                .fail("gamma", GatewayError::Timeout),
        );

        let err = solve(&gateway, &params(), "q", &QuestionKind::FreeForm, &None)
            .await
            .unwrap_err();

        match err {
            PoolError::AllSolversFailed(candidates) => {
                // the abstentions are preserved for the attempt record
                assert_eq!(candidates.len(), 3);
                assert!(candidates.iter().all(|c| !c.success));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_fanout() {
        let gateway = Arc::new(
            MockGateway::new().stall("alpha").stall("beta").stall("gamma"),
        );

        let token = CancellationToken::new();
        token.cancel();

        let err = solve(
            &gateway,
            &params(),
            "q",
            &QuestionKind::FreeForm,
            &Some(token),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PoolError::Cancelled));
    }
}

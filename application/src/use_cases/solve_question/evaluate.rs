//! Arbiter evaluation of one attempt's candidates.
//!
//! Decision order: unanimity, then strict majority, then semantic
//! arbitration through the arbiter capability. Only the third rule
//! suspends; the first two are pure tallying. An unavailable or
//! unparseable arbiter degrades to majority-only arbitration — the
//! verdict falls through to `rephrase` instead of failing the session.

use crate::config::SessionParams;
use crate::ports::solver_gateway::SolverGateway;
use ensemble_domain::{
    CandidateAnswer, Confidence, PromptTemplate, SelectedAnswer, Tally, Verdict,
    parse_equivalence_ruling, representative,
};
use tracing::{debug, info, warn};

/// Evaluate an attempt's candidates into a verdict.
pub(super) async fn evaluate<G: SolverGateway>(
    gateway: &G,
    params: &SessionParams,
    phrasing: &str,
    candidates: &[CandidateAnswer],
) -> Verdict {
    let tally = Tally::count(candidates);

    if let Some(key) = tally.unanimous_key() {
        info!("Unanimous agreement on {:?}", key);
        return accept(candidates, key, Confidence::Unanimous);
    }

    if let Some(key) = tally.majority_key() {
        info!(
            "Majority agreement on {:?} ({}/{})",
            key,
            tally.votes_for(key),
            tally.successful_count()
        );
        return accept(candidates, key, Confidence::Majority);
    }

    debug!(
        "No majority among {} successful candidates, consulting arbiter",
        tally.successful_count()
    );

    match arbitrate(gateway, params, phrasing, candidates).await {
        Some(verdict) => verdict,
        None => Verdict::rephrase(),
    }
}

fn accept(candidates: &[CandidateAnswer], key: &str, confidence: Confidence) -> Verdict {
    let text = representative(candidates, key)
        .map(|c| c.answer.clone())
        .unwrap_or_else(|| key.to_string());
    Verdict::accept(SelectedAnswer::new(key, text), confidence)
}

/// Rule 3: ask the arbiter whether any two disagreeing candidates are
/// substantively the same answer.
///
/// Returns `None` when no pair is judged equivalent or the arbiter is
/// unavailable; the caller falls through to `rephrase`.
async fn arbitrate<G: SolverGateway>(
    gateway: &G,
    params: &SessionParams,
    phrasing: &str,
    candidates: &[CandidateAnswer],
) -> Option<Verdict> {
    let answers: Vec<(usize, String)> = candidates
        .iter()
        .filter(|c| c.success && !c.key.is_unknown())
        .map(|c| (c.solver.slot(), c.answer.clone()))
        .collect();

    if answers.len() < 2 {
        return None;
    }

    let prompt = PromptTemplate::equivalence_prompt(phrasing, &answers);
    let call = gateway.invoke(&params.arbiter, PromptTemplate::arbiter_system(), &prompt);

    let response = match params.per_call_timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(r) => r,
            Err(_) => {
                warn!("Arbiter timed out, degrading to majority-only arbitration");
                return None;
            }
        },
        None => call.await,
    };

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            warn!("Arbiter unavailable ({}), degrading to majority-only arbitration", e);
            return None;
        }
    };

    let ruling = parse_equivalence_ruling(&response)?;
    let (low, high) = ruling.matched_pair()?;

    // Both slots must name real, successful candidates; the lower slot's
    // answer is the one accepted, keeping the selection deterministic.
    let chosen = candidates
        .iter()
        .find(|c| c.solver.slot() == low && c.success && !c.key.is_unknown())?;
    candidates
        .iter()
        .find(|c| c.solver.slot() == high && c.success && !c.key.is_unknown())?;

    info!(
        "Arbiter judged solvers {} and {} equivalent, accepting {:?}",
        low, high, chosen.answer
    );

    let key = chosen.key.value()?;
    Some(Verdict::accept(
        SelectedAnswer::new(key, chosen.answer.clone()),
        Confidence::Arbitrated,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::testing::MockGateway;
    use super::*;
    use crate::ports::solver_gateway::GatewayError;
    use ensemble_domain::{CanonicalKey, Model, QuestionKind, SolverId, VerdictStatus, normalize};

    fn candidate(slot: usize, answer: &str) -> CandidateAnswer {
        CandidateAnswer::success(
            SolverId::new(slot),
            "test-model",
            answer,
            format!("Final Answer: {}", answer),
            normalize(answer, &QuestionKind::FreeForm),
        )
    }

    fn params() -> SessionParams {
        SessionParams::default().with_arbiter(Model::new("arbiter"))
    }

    #[tokio::test]
    async fn test_unanimous_accept() {
        let gateway = MockGateway::new();
        let candidates = vec![candidate(1, "4"), candidate(2, "4"), candidate(3, "four")];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert!(verdict.is_accept());
        assert_eq!(verdict.confidence, Some(Confidence::Unanimous));
        assert_eq!(verdict.selected.unwrap().key, "4");
    }

    #[tokio::test]
    async fn test_majority_accept_independent_of_dissenter() {
        let gateway = MockGateway::new();
        let candidates = vec![candidate(1, "4"), candidate(2, "4"), candidate(3, "17")];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert!(verdict.is_accept());
        assert_eq!(verdict.confidence, Some(Confidence::Majority));
        assert_eq!(verdict.selected.unwrap().key, "4");
    }

    #[tokio::test]
    async fn test_arbitrated_accept() {
        let gateway = MockGateway::new().respond(
            "arbiter",
            r#"{"equivalent": true, "solver_a": 3, "solver_b": 2}"#,
        );
        let candidates = vec![candidate(1, "4"), candidate(2, "0.5"), candidate(3, "1/2")];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert!(verdict.is_accept());
        assert_eq!(verdict.confidence, Some(Confidence::Arbitrated));
        // lower slot of the pair wins
        assert_eq!(verdict.selected.unwrap().text, "0.5");
    }

    #[tokio::test]
    async fn test_no_equivalent_pair_is_rephrase() {
        let gateway = MockGateway::new().respond("arbiter", r#"{"equivalent": false}"#);
        let candidates = vec![candidate(1, "4"), candidate(2, "5"), candidate(3, "6")];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert_eq!(verdict.status, VerdictStatus::Rephrase);
    }

    #[tokio::test]
    async fn test_arbiter_failure_degrades_to_rephrase() {
        let gateway = MockGateway::new().fail(
            "arbiter",
            GatewayError::RequestFailed("service down".to_string()),
        );
        let candidates = vec![candidate(1, "4"), candidate(2, "5"), candidate(3, "6")];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert_eq!(verdict.status, VerdictStatus::Rephrase);
    }

    #[tokio::test]
    async fn test_arbiter_garbage_degrades_to_rephrase() {
        let gateway = MockGateway::new().respond("arbiter", "I cannot decide, sorry.");
        let candidates = vec![candidate(1, "4"), candidate(2, "5"), candidate(3, "6")];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert_eq!(verdict.status, VerdictStatus::Rephrase);
    }

    #[tokio::test]
    async fn test_arbiter_naming_invalid_slot_degrades() {
        let gateway = MockGateway::new().respond(
            "arbiter",
            r#"{"equivalent": true, "solver_a": 7, "solver_b": 2}"#,
        );
        let candidates = vec![candidate(1, "4"), candidate(2, "5"), candidate(3, "6")];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert_eq!(verdict.status, VerdictStatus::Rephrase);
    }

    #[tokio::test]
    async fn test_lone_parseable_candidate_skips_arbitration() {
        // one parseable answer and one garbage answer: no pair to judge
        let garbage = CandidateAnswer::success(
            SolverId::new(2),
            "test-model",
            "",
            "",
            CanonicalKey::Unknown,
        );
        let gateway = MockGateway::new();
        let candidates = vec![candidate(1, "4"), garbage];

        let verdict = evaluate(&gateway, &params(), "q", &candidates).await;

        assert_eq!(verdict.status, VerdictStatus::Rephrase);
    }

    #[tokio::test]
    async fn test_identical_candidate_set_yields_identical_verdict() {
        let candidates = vec![candidate(1, "4"), candidate(2, "4"), candidate(3, "17")];
        let gateway = MockGateway::new();

        let first = evaluate(&gateway, &params(), "q", &candidates).await;
        for _ in 0..5 {
            let again = evaluate(&gateway, &params(), "q", &candidates).await;
            assert_eq!(again.status, first.status);
            assert_eq!(again.confidence, first.confidence);
            assert_eq!(
                again.selected.as_ref().map(|s| s.key.clone()),
                first.selected.as_ref().map(|s| s.key.clone())
            );
        }
    }
}

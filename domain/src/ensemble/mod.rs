//! Ensemble consensus domain.
//!
//! Core concepts for reconciling disagreement between independent
//! solvers:
//!
//! - **Normalization** ([`normalize`]) defines the equality relation used
//!   for voting: answers that are textually different but mean the same
//!   thing collapse to one [`CanonicalKey`].
//! - **Tallying** ([`Tally`]) aggregates [`CandidateAnswer`]s into
//!   per-key counts and applies the unanimity/majority rules with a
//!   deterministic tie-break.
//! - **Verdicts** ([`Verdict`]) record the evaluation outcome of one
//!   attempt; [`ConsensusDecision`] is the immutable terminal record of
//!   a whole session.
//! - **Parsing** extracts final answers and arbiter rulings from
//!   free-form LLM responses.

pub mod candidate;
pub mod decision;
pub mod normalize;
pub mod parsing;
pub mod verdict;

pub use candidate::{CandidateAnswer, SolverId, Tally, representative};
pub use decision::{Attempt, ConsensusDecision, DecisionStatus};
pub use normalize::{CanonicalKey, normalize};
pub use parsing::{
    EquivalenceRuling, extract_final_answer, parse_equivalence_ruling, parse_rephrasing,
};
pub use verdict::{Confidence, SelectedAnswer, Verdict, VerdictStatus};

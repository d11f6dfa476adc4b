//! Response parsing for solver and arbiter output.
//!
//! These functions extract structure from free-form LLM responses. They
//! are pure domain logic — no I/O, just defensive text handling: solver
//! answers follow the `Final Answer:` convention with a last-line
//! fallback, and arbiter rulings arrive as JSON that may be wrapped in
//! markdown fences or prose.

use serde::Deserialize;

/// Extract the final answer line from a solver's worked solution.
///
/// Looks for the last `Final Answer:` marker (case-insensitive) and takes
/// the rest of that line; falls back to the last non-empty line when the
/// solver ignored the format.
pub fn extract_final_answer(response: &str) -> String {
    for line in response.lines().rev() {
        let lower = line.to_lowercase();
        if let Some(pos) = lower.find("final answer") {
            let rest = &line[pos + "final answer".len()..];
            let answer = rest.trim_start_matches([':', ' ', '*']).trim();
            if !answer.is_empty() {
                return answer.to_string();
            }
        }
    }

    response
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

/// The arbiter's semantic-equivalence ruling for a disagreeing candidate
/// set: whether any two candidates are substantively the same answer,
/// and which solver slots hold them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EquivalenceRuling {
    #[serde(default)]
    pub equivalent: bool,
    #[serde(default)]
    pub solver_a: Option<usize>,
    #[serde(default)]
    pub solver_b: Option<usize>,
}

impl EquivalenceRuling {
    /// The matched pair, present only on a positive ruling
    pub fn matched_pair(&self) -> Option<(usize, usize)> {
        if !self.equivalent {
            return None;
        }
        match (self.solver_a, self.solver_b) {
            (Some(a), Some(b)) if a != b => Some((a.min(b), a.max(b))),
            _ => None,
        }
    }
}

/// Parse the arbiter's JSON ruling out of a free-form response.
///
/// Strips markdown code fences, then takes the outermost `{...}` span.
/// Returns `None` when no valid JSON object can be recovered; callers
/// degrade to majority-only arbitration.
pub fn parse_equivalence_ruling(response: &str) -> Option<EquivalenceRuling> {
    let cleaned = strip_code_fences(response);
    let json = extract_json_object(&cleaned)?;
    serde_json::from_str(json).ok()
}

/// Extract a rephrased question from the rephrase capability's response.
///
/// Returns `None` for an empty restatement, which callers treat as a
/// failed rephrase (the previous phrasing is reused).
pub fn parse_rephrasing(response: &str) -> Option<String> {
    let cleaned = strip_code_fences(response);
    let mut text = cleaned.trim();

    let lower = text.to_lowercase();
    for label in ["rephrased question:", "rephrased:", "restatement:"] {
        if lower.starts_with(label) {
            text = text[label.len()..].trim_start();
            break;
        }
    }
    let text = text.trim_matches('"').trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn strip_code_fences(response: &str) -> String {
    response.replace("```json", "").replace("```", "")
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_final_answer_marker() {
        let response = "We solve step by step.\n2x = 8, so x = 4.\nFinal Answer: x = 4";
        assert_eq!(extract_final_answer(response), "x = 4");
    }

    #[test]
    fn test_extract_final_answer_case_insensitive() {
        assert_eq!(extract_final_answer("FINAL ANSWER:  0.5 "), "0.5");
    }

    #[test]
    fn test_extract_final_answer_takes_last_marker() {
        let response = "Final Answer: 3 (wrong, revising)\nActually:\nFinal Answer: 4";
        assert_eq!(extract_final_answer(response), "4");
    }

    #[test]
    fn test_extract_falls_back_to_last_line() {
        let response = "Some working.\nThe result is 42\n\n";
        assert_eq!(extract_final_answer(response), "The result is 42");
    }

    #[test]
    fn test_extract_empty_response() {
        assert_eq!(extract_final_answer(""), "");
    }

    #[test]
    fn test_parse_ruling_plain_json() {
        let ruling =
            parse_equivalence_ruling(r#"{"equivalent": true, "solver_a": 3, "solver_b": 1}"#)
                .unwrap();
        assert!(ruling.equivalent);
        assert_eq!(ruling.matched_pair(), Some((1, 3)));
    }

    #[test]
    fn test_parse_ruling_fenced_with_prose() {
        let response = "Here is my ruling:\n```json\n{\"equivalent\": false}\n```\nDone.";
        let ruling = parse_equivalence_ruling(response).unwrap();
        assert!(!ruling.equivalent);
        assert_eq!(ruling.matched_pair(), None);
    }

    #[test]
    fn test_parse_ruling_garbage_is_none() {
        assert!(parse_equivalence_ruling("no json here").is_none());
        assert!(parse_equivalence_ruling("{not valid json}").is_none());
    }

    #[test]
    fn test_ruling_without_pair_has_no_match() {
        let ruling = parse_equivalence_ruling(r#"{"equivalent": true}"#).unwrap();
        assert_eq!(ruling.matched_pair(), None);

        let same_slot =
            parse_equivalence_ruling(r#"{"equivalent": true, "solver_a": 2, "solver_b": 2}"#)
                .unwrap();
        assert_eq!(same_slot.matched_pair(), None);
    }

    #[test]
    fn test_parse_rephrasing() {
        assert_eq!(
            parse_rephrasing("Rephrased question: What is the sum of 2 and 2?"),
            Some("What is the sum of 2 and 2?".to_string())
        );
        assert_eq!(
            parse_rephrasing("\"Compute 2 + 2.\""),
            Some("Compute 2 + 2.".to_string())
        );
        assert_eq!(parse_rephrasing("   "), None);
    }
}

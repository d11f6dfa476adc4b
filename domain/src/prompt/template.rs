//! Prompt templates for solver, arbiter and rephrase calls

use crate::core::question::QuestionKind;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for solver invocations
    pub fn solver_system() -> &'static str {
        "You are an exam-specialist model. Provide clear, concise solutions."
    }

    /// User prompt for a solver invocation.
    ///
    /// Asks for a short worked solution with the final answer on a
    /// `Final Answer:` line so it can be extracted reliably. For
    /// multiple-choice questions the option set is listed and the solver
    /// is asked to answer with the option letter.
    pub fn solver_query(phrasing: &str, kind: &QuestionKind) -> String {
        let latex_note = if phrasing.contains('\\') || phrasing.contains('$') {
            "\nNote: The problem may contain LaTeX formatting. Interpret it correctly."
        } else {
            ""
        };

        let mut prompt = format!(
            r#"Solve the following problem.

Show only a short explanation. Final answer at the bottom in the format:

Final Answer: <answer>
{}
Problem:
{}"#,
            latex_note, phrasing
        );

        if let QuestionKind::MultipleChoice { options } = kind {
            prompt.push_str("\n\nOptions:\n");
            for (index, option) in options.iter().enumerate() {
                let letter = (b'a' + (index as u8).min(25)) as char;
                prompt.push_str(&format!("({}) {}\n", letter, option));
            }
            prompt.push_str("\nAnswer with the letter of the correct option.");
        }

        prompt
    }

    /// System prompt for the arbiter's equivalence ruling
    pub fn arbiter_system() -> &'static str {
        "You are an arbiter that compares exam answers. You must respond with valid JSON only, starting with { and ending with }."
    }

    /// User prompt asking whether any two disagreeing candidates are
    /// substantively the same answer (differing precision, equivalent
    /// derivations)
    pub fn equivalence_prompt(phrasing: &str, answers: &[(usize, String)]) -> String {
        let mut prompt = format!(
            r#"The following solvers answered the same problem and their answers differ textually.

Problem:
{}

Answers:
"#,
            phrasing
        );

        for (slot, answer) in answers {
            prompt.push_str(&format!("Solver {}: {}\n", slot, answer));
        }

        prompt.push_str(
            r#"
Decide whether any two of these answers are substantively the same
(e.g., differing precision or notation, equivalent derivations).

Return your decision in JSON format. Start your response with { and end with }:

{
  "equivalent": true/false,
  "solver_a": <slot number>,
  "solver_b": <slot number>
}

Rules:
- Set "equivalent" to true only if two answers genuinely mean the same thing
- "solver_a" and "solver_b" must be two different slot numbers from the list above
- If no pair is equivalent, set "equivalent" to false and omit the slots"#,
        );

        prompt
    }

    /// System prompt for generating a rephrased restatement
    pub fn rephrase_system() -> &'static str {
        "You rewrite exam questions to remove ambiguity without changing their content."
    }

    /// User prompt for the rephrase capability.
    ///
    /// The restatement must preserve all numbers, variables and
    /// relationships — only the wording may change. Rubric and point
    /// value are never sent for rewriting.
    pub fn rephrase_prompt(phrasing: &str) -> String {
        format!(
            r#"Independent solvers disagreed on the question below, which suggests its wording may be ambiguous.

Reword the question to be as clear as possible.

Rules:
- Preserve ALL numbers, variables, and mathematical relationships
- Do NOT change any content, only clarify wording
- Reply with the reworded question and nothing else

Question:
{}"#,
            phrasing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_query_free_form() {
        let prompt = PromptTemplate::solver_query("What is 2+2?", &QuestionKind::FreeForm);
        assert!(prompt.contains("Final Answer:"));
        assert!(prompt.contains("What is 2+2?"));
        assert!(!prompt.contains("LaTeX"));
        assert!(!prompt.contains("Options:"));
    }

    #[test]
    fn test_solver_query_latex_note() {
        let prompt =
            PromptTemplate::solver_query("Evaluate $\\frac{1}{2}$", &QuestionKind::FreeForm);
        assert!(prompt.contains("LaTeX"));
    }

    #[test]
    fn test_solver_query_lists_options() {
        let kind = QuestionKind::multiple_choice(vec!["2".into(), "4".into()]);
        let prompt = PromptTemplate::solver_query("What is 2+2?", &kind);
        assert!(prompt.contains("(a) 2"));
        assert!(prompt.contains("(b) 4"));
        assert!(prompt.contains("letter"));
    }

    #[test]
    fn test_equivalence_prompt_lists_slots() {
        let answers = vec![(1, "0.5".to_string()), (3, "1/2".to_string())];
        let prompt = PromptTemplate::equivalence_prompt("Halve 1.", &answers);
        assert!(prompt.contains("Solver 1: 0.5"));
        assert!(prompt.contains("Solver 3: 1/2"));
        assert!(prompt.contains("\"equivalent\""));
    }

    #[test]
    fn test_rephrase_prompt_preserves_content_rule() {
        let prompt = PromptTemplate::rephrase_prompt("Solve for x: 2x + 5 = 13");
        assert!(prompt.contains("Preserve ALL numbers"));
        assert!(prompt.contains("Solve for x: 2x + 5 = 13"));
    }
}

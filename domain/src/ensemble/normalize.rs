//! Answer normalization for equivalence comparison.
//!
//! [`normalize`] canonicalizes a raw answer string into the comparison key
//! that defines the equality relation used for voting. It is deterministic
//! and idempotent, and it never fails: unparseable input maps to
//! [`CanonicalKey::Unknown`], which agrees with nothing (not even another
//! unknown), so garbage contributes to disagreement instead of crashing
//! the pipeline.

use crate::core::question::QuestionKind;
use serde::{Deserialize, Serialize};

/// Canonical comparison key produced by normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalKey {
    /// A canonicalized answer, usable for voting
    Value(String),
    /// Sentinel for unparseable input. Tallying never counts two unknowns
    /// as agreeing.
    Unknown,
}

impl CanonicalKey {
    pub fn value(&self) -> Option<&str> {
        match self {
            CanonicalKey::Value(s) => Some(s),
            CanonicalKey::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CanonicalKey::Unknown)
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalKey::Value(s) => write!(f, "{}", s),
            CanonicalKey::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Normalize a raw answer into its canonical comparison key.
///
/// Free-form answers are stripped of presentation-level differences
/// (whitespace, LaTeX wrappers, case, spacing around `=` and `,`) and
/// numerals are collapsed to one canonical form ("four", "4", "4.0" and
/// "8/2" all yield "4"). Multiple-choice answers collapse to the option
/// letter, whether the solver named the letter ("(a)", "a)", "option a")
/// or spelled out the option's content.
pub fn normalize(raw: &str, kind: &QuestionKind) -> CanonicalKey {
    let text = canonical_text(raw);
    if text.is_empty() {
        return CanonicalKey::Unknown;
    }

    match kind {
        QuestionKind::FreeForm => {
            CanonicalKey::Value(canonical_number(&text).unwrap_or(text))
        }
        QuestionKind::MultipleChoice { options } => match option_letter(&text, options) {
            Some(letter) => CanonicalKey::Value(letter),
            None => CanonicalKey::Unknown,
        },
    }
}

/// Presentation-level cleanup shared by both question kinds.
///
/// Mirrors the cleanup applied to solver output before comparison: LaTeX
/// delimiters and backslashes dropped (content kept), whitespace
/// collapsed, lowercased, spacing around `=` and `,` removed, trailing
/// sentence punctuation trimmed.
fn canonical_text(raw: &str) -> String {
    let mut text = raw
        .replace("\\(", " ")
        .replace("\\)", " ")
        .replace("\\[", " ")
        .replace("\\]", " ");
    text.retain(|c| c != '$' && c != '\\');

    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        if c == '=' || c == ',' {
            while out.ends_with(' ') {
                out.pop();
            }
            out.push(c);
        } else if c == ' ' && (out.ends_with('=') || out.ends_with(',')) {
            // skip the space after a tightened separator
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim().trim_end_matches(['.', '!', '?']).trim_end();

    trimmed
        .split(' ')
        .map(|token| number_word(token).unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse a numeric answer to one canonical rendering.
///
/// Accepts plain numbers and simple `a/b` fractions; returns `None` when
/// the text is not a number, in which case the cleaned text itself is the
/// key.
fn canonical_number(text: &str) -> Option<String> {
    if let Ok(v) = text.parse::<f64>()
        && v.is_finite()
    {
        return Some(format_number(v));
    }

    if let Some((num, den)) = text.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den != 0.0 && (num / den).is_finite() {
            return Some(format_number(num / den));
        }
    }

    None
}

/// Shortest round-trip rendering, with whole numbers printed as integers
/// so "4", "4.0" and "8/2" agree.
fn format_number(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Map English number words onto digits, token by token
fn number_word(token: &str) -> Option<&'static str> {
    let digits = match token {
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "ten" => "10",
        "eleven" => "11",
        "twelve" => "12",
        "thirteen" => "13",
        "fourteen" => "14",
        "fifteen" => "15",
        "sixteen" => "16",
        "seventeen" => "17",
        "eighteen" => "18",
        "nineteen" => "19",
        "twenty" => "20",
        _ => return None,
    };
    Some(digits)
}

/// Resolve a multiple-choice answer to its option letter.
///
/// Tries the letter forms first ("a", "(a)", "a)", "a.", "option a"),
/// then falls back to matching the answer text against the option
/// contents. Returns `None` when the answer names no known option.
fn option_letter(text: &str, options: &[String]) -> Option<String> {
    let stripped = strip_option_decorations(text);

    if let Some(c) = single_letter(stripped)
        && ((c as usize) - ('a' as usize)) < options.len()
    {
        return Some(c.to_string());
    }

    let answer_key = canonical_number(text).unwrap_or_else(|| text.to_string());
    for (index, option) in options.iter().enumerate() {
        let cleaned = canonical_text(option);
        if cleaned.is_empty() {
            continue;
        }
        let option_key = canonical_number(&cleaned).unwrap_or(cleaned);
        if option_key == answer_key {
            return index_letter(index);
        }
    }

    None
}

/// Drop "option"/"choice"/"answer" prefixes and bracket/period decoration
/// around a bare option letter
fn strip_option_decorations(text: &str) -> &str {
    let mut s = text;
    for prefix in ["option", "choice", "answer"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start_matches([' ', ':']);
            break;
        }
    }
    s.trim_matches(['(', ')', '[', ']', '.', ':', ' '])
}

fn single_letter(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c),
        _ => None,
    }
}

fn index_letter(index: usize) -> Option<String> {
    if index < 26 {
        Some(((b'a' + index as u8) as char).to_string())
    } else {
        None
    }
}

//! Input and output guardrails.
//!
//! Every question passes through [`Gateway::process_input`] before it reaches
//! the knowledge base or an LLM prompt, and every answer passes through
//! [`Gateway::process_output`] before it is returned. Both directions strip
//! chat-template control tokens and redact personal data; the input side also
//! rejects empty, oversized, profane or non-mathematical questions.

use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt::Write;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::GatewayConfig;

static CONTROL_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|>]{1,32}\|>").expect("control token regex is valid"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("email regex is valid")
});
static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn regex is valid"));
// Contiguous digits or four-digit groups with one consistent separator;
// candidates must also pass the Luhn check.
static CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{13,16}|\d{4}(?: \d{4}){2} \d{1,4}|\d{4}(?:-\d{4}){2}-\d{1,4})\b")
        .expect("card regex is valid")
});
// Only numbers marked as phone numbers by a `+` country code or a
// parenthesised area code; bare `ddd-ddd-dddd` is indistinguishable from
// arithmetic.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[ .-]?\(?\d{3}\)?|\(\d{3}\))[ .-]?\d{3}[ .-]\d{4}\b")
        .expect("phone regex is valid")
});
static PROFANITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:damn|shit\w*|fuck\w*|bitch\w*|bastard|asshole|crap|dick|piss)\b")
        .expect("profanity regex is valid")
});

const MATH_SYMBOLS: &[char] = &[
    '+', '-', '*', '/', '=', '^', '√', 'π', '∫', '∑', 'θ', 'α', 'β', '<', '>', '≤', '≥', '%',
];

const MATH_KEYWORDS: &[&str] = &[
    "math", "solve", "equation", "derivative", "differentiate", "integral", "integrate",
    "limit", "area", "volume", "angle", "triangle", "circle", "radius", "probability",
    "matrix", "vector", "sum", "product", "factor", "simplify", "prove", "calculate",
    "compute", "function", "graph", "sin", "cos", "tan", "log", "root", "fraction",
    "percent", "algebra", "geometry", "calculus", "trigonometry", "polynomial",
    "quadratic", "theorem", "statistics", "mean", "median",
];

/// Why a question was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayRejection {
    #[error("Question is required")]
    Empty,
    #[error("Question is too long ({len} characters, maximum {max})")]
    TooLong { len: usize, max: usize },
    #[error("Question contains inappropriate language")]
    Inappropriate,
    #[error("Please ask a mathematics-related question")]
    NotMathematical,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    Email,
    Ssn,
    Card,
    Phone,
}

impl PiiKind {
    fn placeholder(&self) -> &'static str {
        match self {
            Self::Email => "[EMAIL]",
            Self::Ssn => "[SSN]",
            Self::Card => "[CARD]",
            Self::Phone => "[PHONE]",
        }
    }

    /// Second-stage check on a regex hit at `start` in `text`.
    fn confirms(&self, text: &str, start: usize, matched: &str) -> bool {
        match self {
            Self::Card => luhn_valid(matched),
            Self::Phone => !follows_operand(text, start, matched),
            Self::Email | Self::Ssn => true,
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Email => &*EMAIL_RE,
            Self::Ssn => &*SSN_RE,
            Self::Card => &*CARD_RE,
            Self::Phone => &*PHONE_RE,
        }
    }
}

// SSN before card and phone, otherwise its digits get swallowed as a phone number.
const REDACTION_ORDER: [PiiKind; 4] = [PiiKind::Email, PiiKind::Ssn, PiiKind::Card, PiiKind::Phone];

#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedInput {
    pub query: String,
    pub redactions: Vec<PiiKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormattedOutput {
    pub formatted_solution: String,
    pub redactions: Vec<PiiKind>,
}

pub struct Gateway {
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub fn process_input(&self, raw: &str) -> Result<SanitizedInput, GatewayRejection> {
        let cleaned = sanitize_for_prompt(raw);
        if cleaned.is_empty() {
            return Err(GatewayRejection::Empty);
        }

        let len = cleaned.chars().count();
        if len > self.config.max_question_chars {
            return Err(GatewayRejection::TooLong {
                len,
                max: self.config.max_question_chars,
            });
        }

        if PROFANITY_RE.is_match(&cleaned) {
            return Err(GatewayRejection::Inappropriate);
        }

        let (query, redactions) = redact_pii(&cleaned);
        if !redactions.is_empty() {
            tracing::info!("Redacted personal data from question: {:?}", redactions);
        }

        if self.config.require_math_content && !has_math_signal(&query) {
            return Err(GatewayRejection::NotMathematical);
        }

        Ok(SanitizedInput { query, redactions })
    }

    pub fn process_output(&self, final_answer: &str, steps: &[String]) -> FormattedOutput {
        let mut redactions = Vec::new();
        let mut clean = |text: &str| {
            let (redacted, kinds) = redact_pii(&strip_control_tokens(text));
            for kind in kinds {
                if !redactions.contains(&kind) {
                    redactions.push(kind);
                }
            }
            redacted.trim().to_string()
        };

        let mut formatted = String::new();
        let mut number = 0;
        for step in steps {
            let step = clean(step);
            if step.is_empty() {
                continue;
            }
            number += 1;
            // Writing to a String cannot fail.
            let _ = writeln!(formatted, "Step {number}: {step}");
        }
        if !formatted.is_empty() {
            formatted.push('\n');
        }

        let answer = clean(final_answer);
        if answer.is_empty() {
            formatted.push_str("Final Answer: Not available");
        } else {
            let _ = write!(formatted, "Final Answer: {answer}");
        }

        FormattedOutput {
            formatted_solution: formatted,
            redactions,
        }
    }
}

/// Remove chat-template control tokens and control characters, and collapse
/// runs of whitespace to single spaces.
pub fn sanitize_for_prompt(text: &str) -> String {
    let stripped = strip_control_tokens(text);
    stripped
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_control_tokens(text: &str) -> String {
    CONTROL_TOKEN_RE.replace_all(text, "").into_owned()
}

/// Replace personal data with placeholders, returning the kinds found.
pub fn redact_pii(text: &str) -> (String, Vec<PiiKind>) {
    let mut out = text.to_string();
    let mut found = Vec::new();
    for kind in REDACTION_ORDER {
        let mut hit = false;
        let replaced = kind
            .pattern()
            .replace_all(&out, |caps: &Captures| {
                let matched = &caps[0];
                let start = caps.get(0).map_or(0, |m| m.start());
                if kind.confirms(&out, start, matched) {
                    hit = true;
                    kind.placeholder().to_string()
                } else {
                    matched.to_string()
                }
            })
            .into_owned();
        out = replaced;
        if hit {
            found.push(kind);
        }
    }
    (out, found)
}

fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=16).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// A `+` right after a number, a closing paren or a single-letter variable
/// is addition, and `(` glued to a name is a function call.
fn follows_operand(text: &str, start: usize, matched: &str) -> bool {
    let before = &text[..start];
    if matched.starts_with('(') {
        return before
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
    }
    let Some(last_word) = before.split_whitespace().next_back() else {
        return false;
    };
    match last_word.chars().next_back() {
        Some(c) if c.is_ascii_digit() || c == ')' => true,
        Some(c) if c.is_alphabetic() => last_word.chars().count() == 1,
        _ => false,
    }
}

fn has_math_signal(text: &str) -> bool {
    if text.chars().any(|c| c.is_ascii_digit() || MATH_SYMBOLS.contains(&c)) {
        return true;
    }
    let lower = text.to_lowercase();
    MATH_KEYWORDS.iter().any(|k| lower.contains(k))
}

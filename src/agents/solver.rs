use regex::Regex;
use std::sync::LazyLock;

use crate::config::LlmConfig;
use crate::llm::chat::{complete, CompletionOptions};
use crate::models::{ChatMessage, Confidence, KbMatch, Solution, SolutionSource};
use crate::web::WebSearchResult;

static STEP_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[.)]|\*|-)\s*").expect("step marker regex is valid"));

const SOLVER_SYSTEM_PROMPT: &str = "You are a mathematics professor. Provide clear, educational \
     step-by-step solutions. Always explain each step and simplify complex concepts for students.";

/// Steps shorter than this are treated as noise ("Step 1:", "Solution:").
const MIN_STEP_CHARS: usize = 10;
const MAX_CONTEXT_SOURCES: usize = 2;
const FINAL_ANSWER_WINDOW: usize = 3;
const FINAL_ANSWER_MARKERS: &[&str] = &["answer", "therefore", "thus", "="];

pub struct MathSolver {
    client: reqwest::Client,
    llm: LlmConfig,
}

impl MathSolver {
    pub fn new(client: reqwest::Client, llm: LlmConfig) -> Self {
        Self { client, llm }
    }

    /// Present a stored knowledge base solution.
    pub fn from_knowledge_base(&self, kb_match: &KbMatch) -> Solution {
        Solution {
            source: SolutionSource::KnowledgeBase,
            steps: kb_match.solution.steps.clone(),
            final_answer: kb_match.solution.final_answer.clone(),
            confidence: Confidence::High,
            similar_question: Some(kb_match.question.clone()),
            similarity_score: Some(kb_match.similarity_score),
            sources: Vec::new(),
        }
    }

    /// Ask the LLM for a worked solution, grounded on web research when
    /// available. Falls back to a canned reply if the LLM call fails.
    pub async fn from_web(&self, question: &str, web_context: Option<&WebSearchResult>) -> Solution {
        let context = prepare_web_context(web_context);
        let messages = vec![
            ChatMessage::system(SOLVER_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Solve this math problem: {question}\n\nContext from research: {context}"
            )),
        ];

        match complete(&self.client, &self.llm, messages, CompletionOptions::default()).await {
            Ok(text) => {
                let steps = parse_solution_steps(&text);
                Solution {
                    source: SolutionSource::WebSearch,
                    final_answer: extract_final_answer(&steps),
                    steps,
                    confidence: Confidence::Medium,
                    similar_question: None,
                    similarity_score: None,
                    sources: web_context.map(|w| w.sources.clone()).unwrap_or_default(),
                }
            }
            Err(e) => {
                tracing::warn!("Solution generation failed: {e:#}");
                fallback_solution(question)
            }
        }
    }
}

fn prepare_web_context(web_context: Option<&WebSearchResult>) -> String {
    let Some(web) = web_context else {
        return "No additional context".to_string();
    };

    let mut parts = Vec::new();
    if let Some(answer) = &web.answer {
        parts.push(format!("Research findings: {answer}"));
    }
    for (i, source) in web.sources.iter().take(MAX_CONTEXT_SOURCES).enumerate() {
        parts.push(format!("Source {}: {}", i + 1, source.content));
    }

    if parts.is_empty() {
        "No additional context".to_string()
    } else {
        parts.join("\n")
    }
}

/// Split a free-text LLM reply into presentable steps.
pub fn parse_solution_steps(text: &str) -> Vec<String> {
    let steps: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .map(|line| STEP_MARKER_RE.replace(line, "").into_owned())
        .filter(|step| step.chars().count() > MIN_STEP_CHARS)
        .collect();

    if steps.is_empty() {
        vec![text.to_string()]
    } else {
        steps
    }
}

/// Pick the concluding step, preferring one that states the result.
pub fn extract_final_answer(steps: &[String]) -> String {
    let Some(last) = steps.last() else {
        return "Solution not available".to_string();
    };

    steps
        .iter()
        .rev()
        .take(FINAL_ANSWER_WINDOW)
        .find(|step| {
            let lower = step.to_lowercase();
            FINAL_ANSWER_MARKERS.iter().any(|m| lower.contains(m))
        })
        .unwrap_or(last)
        .clone()
}

fn fallback_solution(question: &str) -> Solution {
    Solution {
        source: SolutionSource::Fallback,
        steps: vec![
            format!("Working on solution for: {question}"),
            "Please try rephrasing your question.".to_string(),
        ],
        final_answer: "Solution generation in progress".to_string(),
        confidence: Confidence::Low,
        similar_question: None,
        similarity_score: None,
        sources: Vec::new(),
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Solve request
#[derive(Debug, Clone, Deserialize)]
pub struct MathQuestion {
    pub question: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A stored worked solution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KbSolution {
    pub steps: Vec<String>,
    pub final_answer: String,
}

/// A knowledge base record as it appears in dataset files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbEntry {
    pub question: String,
    pub solution: KbSolution,
    pub topic: String,
}

/// Dataset file layout: `{"questions": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct KbDataset {
    pub questions: Vec<KbEntry>,
}

/// A knowledge base hit that cleared the similarity threshold
#[derive(Debug, Clone, Serialize)]
pub struct KbMatch {
    pub question: String,
    pub solution: KbSolution,
    pub similarity_score: f32,
    pub topic: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolutionSource {
    KnowledgeBase,
    WebSearch,
    Fallback,
}

impl SolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::WebSearch => "web_search",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A web page returned by the search API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebSource {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Generated or retrieved solution
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub source: SolutionSource,
    pub steps: Vec<String>,
    pub final_answer: String,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<WebSource>,
}

/// Outcome of the routing agent
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    pub use_knowledge_base: bool,
    pub reasoning: String,
    pub kb_match_count: usize,
    pub confidence: Confidence,
    pub classifier_used: bool,
}

/// Solve response
#[derive(Debug, Clone, Serialize)]
pub struct SolveResponse {
    pub question: String,
    pub solution: Solution,
    pub routing_decision: RoutingDecision,
    pub formatted_solution: String,
    pub kb_matches_found: usize,
    pub system_architecture: String,
}

/// Feedback request
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    #[serde(default)]
    pub original_solution: serde_json::Value,
    pub feedback: String,
    #[serde(default)]
    pub improved_solution: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// A stored feedback entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub question: String,
    pub original_solution: serde_json::Value,
    pub feedback: String,
    pub improved_solution: Option<String>,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

/// Returned from /provide-feedback
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReceipt {
    pub status: String,
    pub feedback_id: Uuid,
    pub sentiment: Sentiment,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub improvements_suggested: usize,
    pub satisfaction_rate: f32,
    /// Counts keyed by the `source` field of the rated solution
    pub by_source: BTreeMap<String, usize>,
}

/// A single chat turn sent to the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_source_serializes_to_snake_case() {
        let json = serde_json::to_value(SolutionSource::KnowledgeBase).unwrap();
        assert_eq!(json, "knowledge_base");
        assert_eq!(SolutionSource::WebSearch.as_str(), "web_search");
    }

    #[test]
    fn test_solution_omits_empty_optional_fields() {
        let solution = Solution {
            source: SolutionSource::Fallback,
            steps: vec!["a".into()],
            final_answer: "b".into(),
            confidence: Confidence::Low,
            similar_question: None,
            similarity_score: None,
            sources: vec![],
        };
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["confidence"], "low");
        assert!(json.get("similar_question").is_none());
        assert!(json.get("sources").is_none());
    }

    #[test]
    fn test_feedback_request_defaults() {
        let req: FeedbackRequest =
            serde_json::from_str(r#"{"question": "q", "feedback": "great"}"#).unwrap();
        assert!(req.original_solution.is_null());
        assert!(req.improved_solution.is_none());
    }
}

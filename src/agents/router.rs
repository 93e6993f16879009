use anyhow::Result;

use crate::config::LlmConfig;
use crate::llm::chat::{complete, CompletionOptions};
use crate::models::{ChatMessage, Confidence, KbMatch, RoutingDecision};

const CLASSIFIER_SYSTEM_PROMPT: &str = "You route student math questions. Given a question and a \
     summary of matching entries in a curated knowledge base, decide whether the question should \
     be answered from the knowledge base or by researching it with web search. Reply with \
     \"knowledge base\" or \"web search\", followed by one short sentence of reasoning.";

pub struct RoutingAgent {
    client: reqwest::Client,
    llm: LlmConfig,
    use_classifier: bool,
}

impl RoutingAgent {
    pub fn new(client: reqwest::Client, llm: LlmConfig, use_classifier: bool) -> Self {
        Self {
            client,
            llm,
            use_classifier,
        }
    }

    /// Decide whether to answer from the knowledge base. Never fails: a
    /// disabled or failing classifier falls back to "any KB match found".
    pub async fn route(&self, question: &str, kb_matches: &[KbMatch]) -> RoutingDecision {
        if !self.use_classifier {
            return fallback_decision(kb_matches.len());
        }

        match self.classify(question, kb_matches.len()).await {
            Ok(reply) => {
                let decision = decision_from_classifier(&reply, kb_matches.len());
                tracing::info!(
                    "Classifier routed to {}",
                    if decision.use_knowledge_base { "knowledge base" } else { "web search" }
                );
                decision
            }
            Err(e) => {
                tracing::warn!("Routing classifier failed, using fallback: {e:#}");
                fallback_decision(kb_matches.len())
            }
        }
    }

    async fn classify(&self, question: &str, match_count: usize) -> Result<String> {
        let messages = vec![
            ChatMessage::system(CLASSIFIER_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Question: {question}\nKnowledge Base Results: {}\nUse Knowledge Base:",
                kb_summary(match_count)
            )),
        ];
        complete(
            &self.client,
            &self.llm,
            messages,
            CompletionOptions {
                temperature: 0.0,
                max_tokens: 60,
            },
        )
        .await
    }
}

fn kb_summary(match_count: usize) -> String {
    if match_count > 0 {
        format!("Found {match_count} similar questions")
    } else {
        "No similar questions found".to_string()
    }
}

fn decision_from_classifier(reply: &str, match_count: usize) -> RoutingDecision {
    RoutingDecision {
        use_knowledge_base: reply.to_lowercase().contains("knowledge base"),
        reasoning: reply.trim().to_string(),
        kb_match_count: match_count,
        confidence: Confidence::High,
        classifier_used: true,
    }
}

fn fallback_decision(match_count: usize) -> RoutingDecision {
    RoutingDecision {
        use_knowledge_base: match_count > 0,
        reasoning: format!("Found {match_count} similar questions in knowledge base"),
        kb_match_count: match_count,
        confidence: Confidence::Medium,
        classifier_used: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KbSolution;

    fn kb_match() -> KbMatch {
        KbMatch {
            question: "q".into(),
            solution: KbSolution {
                steps: vec![],
                final_answer: "a".into(),
            },
            similarity_score: 0.9,
            topic: "algebra".into(),
        }
    }

    fn unreachable_llm() -> LlmConfig {
        LlmConfig {
            provider: "openai".into(),
            base_url: "http://127.0.0.1:1".into(),
            chat_model: "test".into(),
            api_key: None,
        }
    }

    #[test]
    fn test_classifier_reply_knowledge_base() {
        let d = decision_from_classifier("  Knowledge Base - a near-identical question exists ", 2);
        assert!(d.use_knowledge_base);
        assert!(d.classifier_used);
        assert_eq!(d.confidence, Confidence::High);
        assert_eq!(d.kb_match_count, 2);
        assert_eq!(d.reasoning, "Knowledge Base - a near-identical question exists");
    }

    #[test]
    fn test_classifier_reply_web_search() {
        let d = decision_from_classifier("web search: the question needs fresh research", 1);
        assert!(!d.use_knowledge_base);
        assert_eq!(d.kb_match_count, 1);
    }

    #[test]
    fn test_fallback_uses_match_presence() {
        let with = fallback_decision(3);
        assert!(with.use_knowledge_base);
        assert_eq!(with.reasoning, "Found 3 similar questions in knowledge base");
        assert_eq!(with.confidence, Confidence::Medium);
        assert!(!with.classifier_used);

        assert!(!fallback_decision(0).use_knowledge_base);
    }

    #[test]
    fn test_kb_summary_wording() {
        assert_eq!(kb_summary(0), "No similar questions found");
        assert_eq!(kb_summary(2), "Found 2 similar questions");
    }

    #[tokio::test]
    async fn test_disabled_classifier_skips_llm() {
        let agent = RoutingAgent::new(reqwest::Client::new(), unreachable_llm(), false);
        let d = agent.route("Solve 2x = 4", &[kb_match()]).await;
        assert!(d.use_knowledge_base);
        assert!(!d.classifier_used);
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back() {
        let agent = RoutingAgent::new(reqwest::Client::new(), unreachable_llm(), true);
        let d = agent.route("Solve 2x = 4", &[]).await;
        assert!(!d.use_knowledge_base);
        assert!(!d.classifier_used);
        assert_eq!(d.kb_match_count, 0);
    }
}

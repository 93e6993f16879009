use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Web search API configuration
    pub search: SearchConfig,
    /// Knowledge base retrieval settings
    pub knowledge: KnowledgeConfig,
    /// Routing agent settings
    pub routing: RoutingConfig,
    /// Input/output guardrail settings
    pub gateway: GatewayConfig,
    /// Where feedback records are persisted (None = memory only)
    pub feedback_path: Option<PathBuf>,
    /// Maximum concurrent /solve-math pipelines
    pub max_concurrent_solves: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for solving and routing
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

/// Configuration for the Tavily-compatible web search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL for the search API (e.g. "https://api.tavily.com").
    pub base_url: String,
    /// API key. If None, web search is reported as unavailable and the
    /// solver answers without research context.
    pub api_key: Option<String>,
    /// Number of sources requested per search.
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Minimum cosine similarity for a KB hit to count as a match
    pub similarity_threshold: f32,
    /// Number of nearest neighbours fetched per query
    pub top_k: usize,
    /// Extra dataset in `{"questions": [...]}` format loaded after the seeds
    pub dataset_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Ask the LLM to classify KB vs web. When false, or when the call
    /// fails, routing falls back to "any KB match found".
    pub use_classifier: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub max_question_chars: usize,
    /// Reject questions with no digits, math symbols or math vocabulary
    pub require_math_content: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            knowledge: KnowledgeConfig::default(),
            routing: RoutingConfig::default(),
            gateway: GatewayConfig::default(),
            feedback_path: None,
            max_concurrent_solves: 8,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            api_key: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: None,
            max_results: 3,
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            top_k: 3,
            dataset_path: None,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            use_classifier: true,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_question_chars: 1000,
            require_math_content: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("MATH_ROUTER_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(path) = std::env::var("MATH_ROUTER_FEEDBACK_PATH") {
            config.feedback_path = Some(PathBuf::from(path));
        }
        if let Ok(val) = std::env::var("MATH_ROUTER_MAX_CONCURRENT_SOLVES") {
            if let Ok(v) = val.parse::<usize>() {
                config.max_concurrent_solves = v.max(1);
            }
        }

        // LLM
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            config.llm.api_key = Some(key);
        }

        // Web search
        if let Ok(url) = std::env::var("TAVILY_BASE_URL") {
            config.search.base_url = url;
        }
        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            if !key.trim().is_empty() {
                config.search.api_key = Some(key);
            }
        }
        if let Ok(val) = std::env::var("WEB_SEARCH_MAX_RESULTS") {
            if let Ok(v) = val.parse() {
                config.search.max_results = v;
            }
        }

        // Knowledge base
        if let Ok(val) = std::env::var("KB_SIMILARITY_THRESHOLD") {
            if let Ok(v) = val.parse() {
                config.knowledge.similarity_threshold = v;
            }
        }
        if let Ok(val) = std::env::var("KB_TOP_K") {
            if let Ok(v) = val.parse() {
                config.knowledge.top_k = v;
            }
        }
        if let Ok(path) = std::env::var("KB_DATASET_PATH") {
            config.knowledge.dataset_path = Some(PathBuf::from(path));
        }

        // Routing
        if let Ok(val) = std::env::var("ROUTING_USE_CLASSIFIER") {
            if let Some(v) = parse_bool(&val) {
                config.routing.use_classifier = v;
            }
        }

        // Gateway
        if let Ok(val) = std::env::var("GATEWAY_MAX_QUESTION_CHARS") {
            if let Ok(v) = val.parse() {
                config.gateway.max_question_chars = v;
            }
        }
        if let Ok(val) = std::env::var("GATEWAY_REQUIRE_MATH") {
            if let Some(v) = parse_bool(&val) {
                config.gateway.require_math_content = v;
            }
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.knowledge.top_k, 3);
        assert!((config.knowledge.similarity_threshold - 0.6).abs() < f32::EPSILON);
        assert!(config.routing.use_classifier);
        assert_eq!(config.gateway.max_question_chars, 1000);
        assert!(config.search.api_key.is_none());
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" ON "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}

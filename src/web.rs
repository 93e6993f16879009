use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::models::WebSource;

const MATH_CONTENT_KEYWORDS: &[&str] = &[
    "equation", "solve", "solution", "formula", "derivative", "integral", "theorem",
    "calculate", "step", "answer", "proof", "function", "=",
];

/// Outcome of a web search. Failures are reported in-band, never as `Err`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebSearchResult {
    pub success: bool,
    pub answer: Option<String>,
    pub sources: Vec<WebSource>,
    pub has_mathematical_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebSearchResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct TavilySearchRequest<'a> {
    query: String,
    search_depth: &'a str,
    include_answer: bool,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

pub struct WebSearcher {
    client: reqwest::Client,
    config: SearchConfig,
}

impl WebSearcher {
    pub fn new(client: reqwest::Client, config: SearchConfig) -> Self {
        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Search the web for worked solutions to `question`.
    pub async fn search_math_solution(&self, question: &str) -> WebSearchResult {
        if !self.is_configured() {
            return WebSearchResult::failed("Web search API key not configured");
        }

        match self.call_search(question).await {
            Ok(response) => {
                let sources: Vec<WebSource> = response
                    .results
                    .into_iter()
                    .map(|r| WebSource {
                        title: r.title,
                        url: r.url,
                        content: r.content,
                    })
                    .collect();
                let answer = response.answer.filter(|a| !a.trim().is_empty());
                let has_math = answer
                    .iter()
                    .map(String::as_str)
                    .chain(sources.iter().map(|s| s.content.as_str()))
                    .any(has_mathematical_content);

                tracing::info!(
                    "Web search returned {} sources (math content: {has_math})",
                    sources.len()
                );

                WebSearchResult {
                    success: true,
                    answer,
                    sources,
                    has_mathematical_content: has_math,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Web search failed: {e:#}");
                WebSearchResult::failed(format!("{e:#}"))
            }
        }
    }

    async fn call_search(&self, question: &str) -> Result<TavilySearchResponse> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let req = TavilySearchRequest {
            query: format!("{question} step by step solution"),
            search_depth: "basic",
            include_answer: true,
            max_results: self.config.max_results,
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .context("Failed to call web search API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Web search API returned {status}: {body}");
        }

        resp.json()
            .await
            .context("Failed to parse web search response")
    }
}

/// Whether text looks like it carries mathematical working.
pub fn has_mathematical_content(text: &str) -> bool {
    let lower = text.to_lowercase();
    MATH_CONTENT_KEYWORDS.iter().any(|k| lower.contains(k))
}

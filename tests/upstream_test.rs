//! Success paths against live upstream APIs.
//!
//! A local axum server stands in for the OpenAI, Ollama and Tavily endpoints
//! and records every request it receives.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use math_router::agents::router::RoutingAgent;
use math_router::api::solve::run_solve;
use math_router::config::{Config, LlmConfig, SearchConfig};
use math_router::llm::chat::{complete, CompletionOptions};
use math_router::models::{ChatMessage, Confidence, KbMatch, KbSolution, SolutionSource};
use math_router::state::AppState;
use math_router::web::WebSearcher;

const LLM_KEY: &str = "llm-key";
const SEARCH_KEY: &str = "search-key";

const SOLVER_REPLY: &str = "Solution:\n\
    1. Integrate each term separately\n\
    2. The integral of x is x²/2\n\
    3. Therefore the answer is x²/2 + C";

#[derive(Clone, Default)]
struct Upstream {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Upstream {
    fn bodies(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Classifier calls get a routing verdict, everything else a worked solution.
fn assistant_reply(body: &Value) -> String {
    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let user = body["messages"][1]["content"].as_str().unwrap_or_default();
    if system.contains("You route") {
        if user.contains("No similar questions found") {
            "Web search: nothing similar is stored".to_string()
        } else {
            "  Knowledge base: a matching worked example exists  ".to_string()
        }
    } else {
        SOLVER_REPLY.to_string()
    }
}

async fn openai_chat(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if bearer(&headers) != Some(LLM_KEY) {
        return Err((StatusCode::UNAUTHORIZED, "bad key".to_string()));
    }
    let reply = assistant_reply(&body);
    upstream.requests.lock().push(("openai".to_string(), body));
    Ok(Json(json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": reply } }]
    })))
}

async fn ollama_chat(State(upstream): State<Upstream>, Json(body): Json<Value>) -> Json<Value> {
    let reply = assistant_reply(&body);
    upstream.requests.lock().push(("ollama".to_string(), body));
    Json(json!({
        "model": "llama3.2",
        "message": { "role": "assistant", "content": reply },
        "done": true
    }))
}

async fn rate_limited() -> (StatusCode, &'static str) {
    (StatusCode::TOO_MANY_REQUESTS, "slow down please")
}

async fn search(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if bearer(&headers) != Some(SEARCH_KEY) {
        return Err((StatusCode::UNAUTHORIZED, "bad key".to_string()));
    }
    upstream.requests.lock().push(("search".to_string(), body));
    Ok(Json(json!({
        "answer": "Use the power rule: the integral of x is x²/2 + C",
        "results": [
            {
                "title": "Power rule",
                "url": "https://example.com/power-rule",
                "content": "Using the power rule, ∫x dx = x²/2 + C"
            },
            {
                "title": "Integration basics",
                "url": "https://example.com/basics",
                "content": "Each step of integration reverses differentiation"
            }
        ]
    })))
}

async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(openai_chat))
        .route("/api/chat", post(ollama_chat))
        .route("/search", post(search))
        .route("/limited/v1/chat/completions", post(rate_limited))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), upstream)
}

fn llm_config(provider: &str, base_url: &str) -> LlmConfig {
    LlmConfig {
        provider: provider.to_string(),
        base_url: base_url.to_string(),
        chat_model: "test-model".to_string(),
        api_key: Some(LLM_KEY.to_string()),
    }
}

fn connected_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.llm = llm_config("openai", base_url);
    config.search = SearchConfig {
        base_url: base_url.to_string(),
        api_key: Some(SEARCH_KEY.to_string()),
        max_results: 2,
    };
    config
}

// ─── LLM ─────────────────────────────────────────────────

#[tokio::test]
async fn test_openai_completion_returns_message_content() {
    let (base_url, upstream) = spawn_upstream().await;
    let text = complete(
        &reqwest::Client::new(),
        &llm_config("openai", &base_url),
        vec![ChatMessage::system("You are a mathematics professor"), ChatMessage::user("2+2")],
        CompletionOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(text, SOLVER_REPLY);
    let sent = upstream.bodies("openai");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["model"], "test-model");
    assert_eq!(sent[0]["max_tokens"], 800);
}

#[tokio::test]
async fn test_ollama_completion_returns_message_content() {
    let (base_url, upstream) = spawn_upstream().await;
    let text = complete(
        &reqwest::Client::new(),
        &llm_config("ollama", &base_url),
        vec![ChatMessage::system("You are a mathematics professor"), ChatMessage::user("2+2")],
        CompletionOptions {
            temperature: 0.0,
            max_tokens: 60,
        },
    )
    .await
    .unwrap();

    assert_eq!(text, SOLVER_REPLY);
    let sent = upstream.bodies("ollama");
    assert_eq!(sent[0]["stream"], false);
    assert_eq!(sent[0]["options"]["num_predict"], 60);
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let (base_url, _) = spawn_upstream().await;
    let err = complete(
        &reqwest::Client::new(),
        &llm_config("openai", &format!("{base_url}/limited")),
        vec![ChatMessage::user("2+2")],
        CompletionOptions::default(),
    )
    .await
    .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("429"), "{message}");
    assert!(message.contains("slow down please"), "{message}");
}

// ─── Web search ──────────────────────────────────────────

#[tokio::test]
async fn test_web_search_success_with_math_content() {
    let (base_url, upstream) = spawn_upstream().await;
    let searcher = WebSearcher::new(
        reqwest::Client::new(),
        SearchConfig {
            base_url,
            api_key: Some(SEARCH_KEY.to_string()),
            max_results: 2,
        },
    );

    let result = searcher.search_math_solution("Integrate x dx").await;
    assert!(result.success);
    assert!(result.has_mathematical_content);
    assert!(result.error.is_none());
    assert_eq!(result.sources.len(), 2);
    assert_eq!(result.sources[0].url, "https://example.com/power-rule");
    assert!(result.answer.unwrap().contains("power rule"));

    let sent = upstream.bodies("search");
    assert_eq!(sent[0]["query"], "Integrate x dx step by step solution");
    assert_eq!(sent[0]["include_answer"], true);
    assert_eq!(sent[0]["max_results"], 2);
}

// ─── Routing ─────────────────────────────────────────────

#[tokio::test]
async fn test_classifier_reply_drives_routing() {
    let (base_url, _) = spawn_upstream().await;
    let agent = RoutingAgent::new(reqwest::Client::new(), llm_config("openai", &base_url), true);
    let kb_match = KbMatch {
        question: "Solve 2x = 4".to_string(),
        solution: KbSolution {
            steps: vec!["Divide both sides by 2".to_string()],
            final_answer: "x = 2".to_string(),
        },
        similarity_score: 0.9,
        topic: "algebra".to_string(),
    };

    let decision = agent.route("Solve 2x = 6", &[kb_match]).await;
    assert!(decision.classifier_used);
    assert!(decision.use_knowledge_base);
    assert_eq!(decision.confidence, Confidence::High);
    assert_eq!(decision.reasoning, "Knowledge base: a matching worked example exists");
    assert_eq!(decision.kb_match_count, 1);
}

// ─── Pipeline ────────────────────────────────────────────

#[tokio::test]
async fn test_web_backed_solution_end_to_end() {
    let (base_url, upstream) = spawn_upstream().await;
    let state = AppState::new(connected_config(&base_url)).unwrap();

    let resp = run_solve(&state, "Integrate x dx").await.unwrap();

    assert_eq!(resp.kb_matches_found, 0);
    assert!(resp.routing_decision.classifier_used);
    assert!(!resp.routing_decision.use_knowledge_base);
    assert_eq!(resp.routing_decision.reasoning, "Web search: nothing similar is stored");

    assert_eq!(resp.solution.source, SolutionSource::WebSearch);
    assert_eq!(resp.solution.confidence, Confidence::Medium);
    assert_eq!(
        resp.solution.steps,
        vec![
            "Integrate each term separately",
            "The integral of x is x²/2",
            "Therefore the answer is x²/2 + C",
        ]
    );
    assert_eq!(resp.solution.final_answer, "Therefore the answer is x²/2 + C");
    assert_eq!(resp.solution.sources.len(), 2);
    assert!(resp
        .formatted_solution
        .ends_with("Step 3: Therefore the answer is x²/2 + C\n\nFinal Answer: Therefore the answer is x²/2 + C"));

    // Classifier call, then the solver call grounded on the search results.
    let llm_calls = upstream.bodies("openai");
    assert_eq!(llm_calls.len(), 2);
    let solver_prompt = llm_calls[1]["messages"][1]["content"].as_str().unwrap();
    assert!(solver_prompt.starts_with("Solve this math problem: Integrate x dx"));
    assert!(solver_prompt.contains("Research findings: Use the power rule"));
    assert!(solver_prompt.contains("Source 2: Each step of integration"));
    assert_eq!(upstream.bodies("search").len(), 1);
}

#[tokio::test]
async fn test_classifier_routes_known_question_to_knowledge_base() {
    let (base_url, upstream) = spawn_upstream().await;
    let state = AppState::new(connected_config(&base_url)).unwrap();

    let resp = run_solve(&state, "Solve x^2 - 5x + 6 = 0").await.unwrap();

    assert!(resp.routing_decision.classifier_used);
    assert_eq!(resp.routing_decision.kb_match_count, 3);
    assert_eq!(resp.solution.source, SolutionSource::KnowledgeBase);
    assert_eq!(resp.solution.final_answer, "x = 2, 3");
    let classifier_prompt = upstream.bodies("openai")[0]["messages"][1]["content"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(classifier_prompt.contains("Knowledge Base Results: Found 3 similar questions"));
    assert!(upstream.bodies("search").is_empty());
}

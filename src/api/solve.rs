use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{MathQuestion, SolveResponse};
use crate::state::AppState;

const SYSTEM_ARCHITECTURE: &str = "Agentic-RAG with web search";

/// POST /solve-math - Full answering pipeline:
///   1. Input guardrails (sanitize, redact, reject)
///   2. Knowledge base similarity search
///   3. Routing decision (classifier or KB-hit fallback)
///   4. KB solution, or web search + LLM solution
///   5. Output guardrails and formatting
pub async fn solve_math(
    State(state): State<AppState>,
    Json(req): Json<MathQuestion>,
) -> Result<Json<SolveResponse>, (StatusCode, String)> {
    let _permit = state.solve_semaphore.acquire().await.map_err(|_| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Solver is shutting down".to_string(),
        )
    })?;

    if let Some(user_id) = &req.user_id {
        tracing::debug!("Solve request from user {user_id}");
    }

    run_solve(&state, &req.question).await.map(Json)
}

/// The pipeline behind `/solve-math`, callable without the HTTP layer.
pub async fn run_solve(
    state: &AppState,
    question: &str,
) -> Result<SolveResponse, (StatusCode, String)> {
    // ── Step 1: Input guardrails ─────────────────────────
    let input = state
        .gateway
        .process_input(question)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let query = input.query.as_str();

    // ── Step 2: Knowledge base search ────────────────────
    let kb_matches = state.knowledge.search_similar(query);

    // ── Step 3: Routing ──────────────────────────────────
    let routing_decision = state.router.route(query, &kb_matches).await;

    // ── Step 4: Solve ────────────────────────────────────
    let solution = match kb_matches.first() {
        Some(best) if routing_decision.use_knowledge_base => {
            tracing::info!(
                "Answering from knowledge base (similarity {:.3})",
                best.similarity_score
            );
            state.solver.from_knowledge_base(best)
        }
        _ => {
            let web_results = state.web.search_math_solution(query).await;
            if web_results.success && web_results.has_mathematical_content {
                state.solver.from_web(query, Some(&web_results)).await
            } else {
                tracing::info!("No usable web research, solving without context");
                state.solver.from_web(query, None).await
            }
        }
    };

    tracing::info!(
        "Solved via {} (confidence {:?})",
        solution.source.as_str(),
        solution.confidence
    );

    // ── Step 5: Output guardrails ────────────────────────
    let output = state
        .gateway
        .process_output(&solution.final_answer, &solution.steps);

    Ok(SolveResponse {
        question: question.to_string(),
        solution,
        routing_decision,
        formatted_solution: output.formatted_solution,
        kb_matches_found: kb_matches.len(),
        system_architecture: SYSTEM_ARCHITECTURE.to_string(),
    })
}

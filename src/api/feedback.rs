use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::gateway::sanitize_for_prompt;
use crate::models::{FeedbackReceipt, FeedbackRequest, FeedbackStats};
use crate::state::AppState;

const MAX_FEEDBACK_CHARS: usize = 5000;

/// POST /provide-feedback - Record human feedback on a solution
pub async fn provide_feedback(
    State(state): State<AppState>,
    Json(mut req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackReceipt>, (StatusCode, String)> {
    req.feedback = sanitize_for_prompt(&req.feedback);
    if req.feedback.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Feedback is required".to_string()));
    }
    if req.feedback.chars().count() > MAX_FEEDBACK_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Feedback exceeds {MAX_FEEDBACK_CHARS} characters"),
        ));
    }

    let feedback = state.feedback.clone();
    // Persisting touches the filesystem.
    let receipt = tokio::task::spawn_blocking(move || feedback.process_feedback(req))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Feedback processing failed: {e}"),
            )
        })?;

    Ok(Json(receipt))
}

/// GET /feedback-stats - Aggregate feedback statistics
pub async fn feedback_stats(State(state): State<AppState>) -> Json<FeedbackStats> {
    Json(state.feedback.stats())
}

pub mod feedback;
pub mod info;
pub mod solve;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Build the HTTP router. All origins, methods and headers are allowed so
/// browser front-ends on other origins can call the API.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(info::root))
        .route("/health", get(info::health))
        .route("/system-info", get(info::system_info))
        .route("/solve-math", post(solve::solve_math))
        .route("/provide-feedback", post(feedback::provide_feedback))
        .route("/feedback-stats", get(feedback::feedback_stats))
        .layer(cors)
        .with_state(state)
}

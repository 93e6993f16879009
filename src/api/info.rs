use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Liveness banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Math Routing Agent API is running!",
        "status": "operational",
    }))
}

/// GET /health - Component status
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let web_search = if state.web.is_configured() {
        "active"
    } else {
        "unconfigured"
    };
    let routing = if state.config.routing.use_classifier {
        "classifier"
    } else {
        "fallback"
    };

    Json(json!({
        "status": "healthy",
        "service": "Math Agent",
        "components": {
            "knowledge_base": "active",
            "web_search": web_search,
            "routing": routing,
            "feedback_system": "active",
        },
        "knowledge_base_entries": state.knowledge.len(),
        "feedback_records": state.feedback.len(),
    }))
}

/// GET /system-info - Architecture overview
pub async fn system_info() -> Json<Value> {
    Json(json!({
        "architecture": "Agentic-RAG with Human-in-the-Loop",
        "components": [
            "AI Gateway with Input/Output Guardrails",
            "Vector Database Knowledge Base",
            "LLM Routing Classifier",
            "Web Search Integration",
            "Human Feedback Collection",
        ],
        "features": [
            "Privacy-protected input processing",
            "Educational content validation",
            "Intelligent KB vs Web routing",
            "Feedback statistics",
            "Step-by-step mathematical solutions",
        ],
    }))
}

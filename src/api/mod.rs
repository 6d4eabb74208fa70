use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::chatbot::{calculate_wage, ChatbotService, Language};
use crate::knowledge::RestKnowledgeStore;

#[derive(Clone)]
pub struct AppState {
    chatbot: Arc<ChatbotService>,
    store: Arc<RestKnowledgeStore>,
}

#[derive(Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 1000))]
    message: String,
    #[serde(default = "default_language")]
    language: Language,
    session_id: Option<String>,
}

fn default_language() -> Language {
    Language::En
}

#[derive(Deserialize, Validate)]
pub struct WageRequest {
    #[validate(range(min = 0.01))]
    monthly_salary: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    overtime_hours: f64,
}

#[derive(Deserialize)]
pub struct InsightsQuery {
    search: Option<String>,
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
}

/// Create and configure the API router
pub fn create_api(chatbot: Arc<ChatbotService>, store: Arc<RestKnowledgeStore>) -> Router {
    let state = AppState { chatbot, store };

    // Fully permissive CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/wage", post(wage_handler))
        .route("/api/insights", get(insights_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse {
                status: format!("Invalid request: {}", e),
            }),
        )
            .into_response();
    }

    log::info!(
        "chat request ({}): {} chars",
        request.language.code(),
        request.message.len()
    );

    let reply = state
        .chatbot
        .chat(&request.message, request.language, request.session_id)
        .await;
    Json(reply).into_response()
}

async fn wage_handler(Json(request): Json<WageRequest>) -> Response {
    if let Err(e) = request.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse {
                status: format!("Invalid request: {}", e),
            }),
        )
            .into_response();
    }

    Json(calculate_wage(request.monthly_salary, request.overtime_hours)).into_response()
}

async fn insights_handler(
    State(state): State<AppState>,
    Query(query): Query<InsightsQuery>,
) -> Response {
    match state
        .store
        .fetch_statistics_rows(query.search.as_deref(), 50)
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            log::error!("insights query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse {
                    status: "Statistics temporarily unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn health_check() -> Response {
    Json(ApiResponse {
        status: "Server is running and healthy".to_string(),
    })
    .into_response()
}

//! REST endpoints a rendering layer drives the application through.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::error::{CollaboratorError, Error, TransitionError};

use super::buffer::FieldValue;
use super::manager::ApplicationManager;
use super::suggestion::{ReviewDecision, SuggestionCategory};

/// Shared state for application routes.
#[derive(Clone)]
pub struct ApplicationRouteState {
    pub manager: Arc<ApplicationManager>,
}

/// Status code and JSON body for a failed operation.
fn error_response(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        Error::Transition(TransitionError::Validation(errors)) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": err.to_string(), "fields": errors })),
            );
        }
        Error::Collaborator(CollaboratorError::Rejected {
            service,
            status_code,
            message,
        }) => {
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": message,
                    "service": service,
                    "upstream_status": status_code,
                })),
            );
        }
        Error::Transition(TransitionError::Busy | TransitionError::NotAllowed { .. }) => {
            StatusCode::CONFLICT
        }
        Error::Transition(TransitionError::UnknownField { .. }) => StatusCode::BAD_REQUEST,
        Error::Transition(TransitionError::NoPendingSuggestion { .. }) => StatusCode::NOT_FOUND,
        Error::Collaborator(CollaboratorError::EmptyResponse { .. }) => StatusCode::BAD_GATEWAY,
        Error::Collaborator(CollaboratorError::Discarded { .. }) => StatusCode::CONFLICT,
        Error::Config(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

fn respond<T: serde::Serialize>(result: Result<T, impl Into<Error>>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /api/application
async fn get_status(State(state): State<ApplicationRouteState>) -> impl IntoResponse {
    Json(state.manager.status().await)
}

/// POST /api/application/start
async fn start(State(state): State<ApplicationRouteState>) -> Response {
    match state.manager.start().await {
        Ok(_) => Json(state.manager.status().await).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// PUT /api/application/fields
///
/// Body is an object of field name → value for the active step. Fields are
/// written in name order; the first unknown name stops the batch.
async fn set_fields(
    State(state): State<ApplicationRouteState>,
    Json(fields): Json<BTreeMap<String, FieldValue>>,
) -> Response {
    match state.manager.set_fields(fields).await {
        Ok(()) => Json(state.manager.status().await).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// POST /api/application/advance
///
/// 422 with per-field messages when the active step does not validate.
async fn advance(State(state): State<ApplicationRouteState>) -> Response {
    match state.manager.advance().await {
        Ok(_) => Json(state.manager.status().await).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// POST /api/application/retreat
async fn retreat(State(state): State<ApplicationRouteState>) -> Response {
    match state.manager.retreat().await {
        Ok(_) => Json(state.manager.status().await).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// POST /api/application/reset
async fn reset(State(state): State<ApplicationRouteState>) -> impl IntoResponse {
    state.manager.reset().await;
    Json(state.manager.status().await)
}

/// POST /api/application/submit
async fn submit(State(state): State<ApplicationRouteState>) -> Response {
    respond(state.manager.submit().await)
}

#[derive(Deserialize)]
struct SuggestionRequest {
    category: SuggestionCategory,
    #[serde(default)]
    prompt: Option<String>,
}

/// POST /api/application/suggestions
async fn request_suggestion(
    State(state): State<ApplicationRouteState>,
    Json(body): Json<SuggestionRequest>,
) -> Response {
    respond(
        state
            .manager
            .request_suggestion(body.category, body.prompt)
            .await,
    )
}

/// POST /api/application/suggestions/{category}/decision
async fn resolve_suggestion(
    State(state): State<ApplicationRouteState>,
    Path(category): Path<String>,
    Json(decision): Json<ReviewDecision>,
) -> Response {
    let Some(category) = SuggestionCategory::from_field(&category) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Unknown suggestion category" })),
        )
            .into_response();
    };

    match state.manager.resolve_suggestion(category, decision).await {
        Ok(applied) => Json(json!({
            "applied": applied,
            "status": state.manager.status().await,
        }))
        .into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// Build the application REST routes.
pub fn application_routes(state: ApplicationRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/application", get(get_status))
        .route("/api/application/start", post(start))
        .route("/api/application/fields", put(set_fields))
        .route("/api/application/advance", post(advance))
        .route("/api/application/retreat", post(retreat))
        .route("/api/application/reset", post(reset))
        .route("/api/application/submit", post(submit))
        .route("/api/application/suggestions", post(request_suggestion))
        .route(
            "/api/application/suggestions/{category}/decision",
            post(resolve_suggestion),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

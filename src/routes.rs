//! REST endpoints for driving the wizard from a rendering surface.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::error::WizardError;
use crate::wizard::engine::StepForm;
use crate::wizard::session::WizardSession;

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub session: Arc<WizardSession>,
}

/// GET /api/wizard/status
///
/// Current step, completion flag, errors from the last failed advance, and
/// a read-only record snapshot.
async fn get_status(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.session.status().await)
}

/// GET /api/wizard/fields
///
/// The fields that apply to the current step given the answers so far.
async fn get_fields(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.session.fields().await)
}

/// POST /api/wizard/advance
///
/// Submit the current step's form. Answers 422 with the full error list
/// when validation fails, 409 when the form does not belong to the current
/// step or the wizard is already done.
async fn post_advance(
    State(state): State<WizardRouteState>,
    Json(form): Json<StepForm>,
) -> impl IntoResponse {
    match state.session.advance(form).await {
        Ok(step) => (StatusCode::OK, Json(serde_json::json!({ "step": step }))).into_response(),
        Err(WizardError::Invalid(errors)) => {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "errors": messages })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// POST /api/wizard/back
///
/// Go back one step; collected answers are kept for review and editing.
async fn post_back(State(state): State<WizardRouteState>) -> impl IntoResponse {
    match state.session.retreat().await {
        Some(step) => (StatusCode::OK, Json(serde_json::json!({ "step": step }))).into_response(),
        None => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "Already at the first step" })),
        )
            .into_response(),
    }
}

/// GET /api/wizard/document
///
/// The formatted pricing-request text, once the final step is reached.
async fn get_document(State(state): State<WizardRouteState>) -> impl IntoResponse {
    match state.session.document().await {
        Some(text) => (StatusCode::OK, text).into_response(),
        None => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "The wizard has not reached the final step" })),
        )
            .into_response(),
    }
}

/// GET /api/wizard/record
///
/// Raw structured record (internal/debug view).
async fn get_record(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.session.record().await)
}

/// Build the wizard REST routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/api/wizard/status", get(get_status))
        .route("/api/wizard/fields", get(get_fields))
        .route("/api/wizard/advance", post(post_advance))
        .route("/api/wizard/back", post(post_back))
        .route("/api/wizard/document", get(get_document))
        .route("/api/wizard/record", get(get_record))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

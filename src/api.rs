// src/api.rs
//! HTTP surface: complaint submission plus liveness. Rejections map to an
//! `{"error":{"code","message"}}` envelope with a machine-readable code.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::complaint::Complaint;
use crate::intake::{IntakeError, IntakePipeline, NewComplaint};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IntakePipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/complaints", post(submit_complaint))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SubmitRequest {
    reporter: String,
    category: String,
    description: String,
    #[serde(default)]
    photo: String,
    latitude: f64,
    longitude: f64,
}

async fn submit_complaint(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Complaint>), ApiError> {
    let outcome = state
        .pipeline
        .submit(NewComplaint {
            reporter: body.reporter,
            category: body.category,
            description: body.description,
            photo: body.photo,
            latitude: body.latitude,
            longitude: body.longitude,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(outcome.complaint)))
}

/// Boundary error: one variant per user-visible outcome of the pipeline.
pub struct ApiError(IntakeError);

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::AiGenerated { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            IntakeError::DuplicateActive { .. } => StatusCode::CONFLICT,
            IntakeError::Spam { .. } => StatusCode::BAD_REQUEST,
            IntakeError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match &self.0 {
            IntakeError::Validation(_) => "validation_error",
            IntakeError::AiGenerated { .. } => "rejected_ai_generated",
            IntakeError::DuplicateActive { .. } => "duplicate_active",
            IntakeError::Spam { .. } => "rejected_spam",
            IntakeError::Store(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            // Store internals stay out of citizen-facing responses.
            IntakeError::Store(_) => "failed to record the complaint, please retry".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message: self.message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

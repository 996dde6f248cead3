//! HTTP surface for askdocs.
//!
//! # Endpoints
//!
//! - `POST /question` - answer a question (`?question=...` or JSON `{"question": ...}`)
//! - `GET /health` - index and backend readiness

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::{
    application::{AnswerResponse, AnswerService, ErrorResponse, QuestionRequest},
    domain::DomainError,
};

#[derive(Clone)]
pub struct AppState {
    service: Arc<AnswerService>,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<AnswerService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/question", post(ask_question))
        .with_state(state)
}

/// Serve `router(state)` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn ask_question(
    State(state): State<AppState>,
    query: Option<Query<QuestionRequest>>,
    body: Bytes,
) -> Result<Json<AnswerResponse>, ApiError> {
    let question = match query {
        Some(Query(params)) => params.question,
        None => serde_json::from_slice::<QuestionRequest>(&body)
            .map(|payload| payload.question)
            .map_err(|_| {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ErrorResponse::new(
                        "missing `question` parameter",
                        "MISSING_QUESTION",
                    )),
                )
            })?,
    };

    let service = Arc::clone(&state.service);
    let outcome = tokio::task::spawn_blocking(move || service.ask(&question))
        .await
        .map_err(|err| {
            error!("answer task failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(err.to_string(), "INTERNAL_ERROR")),
            )
        })?;

    match outcome {
        Ok(result) => Ok(Json(AnswerResponse::from(result))),
        Err(err) => Err(domain_error_response(err)),
    }
}

async fn health_check(State(state): State<AppState>) -> Response {
    let service = Arc::clone(&state.service);
    let uptime_seconds = state.started_at.elapsed().as_secs();

    match tokio::task::spawn_blocking(move || service.health()).await {
        Ok(Ok(mut status)) => {
            status.uptime_seconds = uptime_seconds;
            Json(status).into_response()
        }
        Ok(Err(err)) => {
            warn!("health check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::from(&err))).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(err.to_string(), "INTERNAL_ERROR")),
        )
            .into_response(),
    }
}

fn domain_error_response(err: DomainError) -> ApiError {
    let status = match err {
        DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("question failed: {}", err);
    } else {
        info!("question rejected: {}", err);
    }

    (status, Json(ErrorResponse::from(&err)))
}

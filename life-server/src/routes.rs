//! HTTP route handlers for the boards API.

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use life::core::types::BoardId;
use life::error::{FormatError, NotFoundError, ValidationError};
use life::service::{BoardSummary, FinalState};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;

use crate::state::{AppState, Service};

const UNSTABLE_MESSAGE: &str = "Board did not reach a stable state";

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/boards", get(list_boards).post(create_board))
        .route("/v1/boards/{id}", get(show_board).delete(delete_board))
        .route("/v1/boards/{id}/next_state", get(next_state))
        .route("/v1/boards/{id}/state_at_step/{step}", get(state_at_step))
        .route("/v1/boards/{id}/final_state", get(final_state))
        .route("/v1/boards/{id}/summary", get(summary))
}

/// Failure responses, shaped like the original boards API.
#[derive(Debug)]
pub enum ApiError {
    NotFound(NotFoundError),
    Unprocessable(Vec<String>),
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(not_found) = err.downcast_ref::<NotFoundError>() {
            return ApiError::NotFound(not_found.clone());
        }
        if let Some(validation) = err.downcast_ref::<ValidationError>() {
            return ApiError::Unprocessable(validation.messages.clone());
        }
        if let Some(format) = err.downcast_ref::<FormatError>() {
            return ApiError::Unprocessable(vec![format.to_string()]);
        }
        ApiError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(NotFoundError::Board(_)) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Board not found" })))
                    .into_response()
            }
            ApiError::NotFound(NotFoundError::Step { .. }) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Step not found" })))
                    .into_response()
            }
            ApiError::Unprocessable(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            ApiError::Internal(message) => {
                error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}

/// Run a service call off the async runtime; storage and convergence block.
async fn with_service<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Service) -> anyhow::Result<T> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| ApiError::Internal(format!("service task failed: {}", err)))?
        .map_err(ApiError::from)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    board: BoardParams,
}

#[derive(Debug, Deserialize)]
struct BoardParams {
    initial_state: String,
    rows: usize,
    cols: usize,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    id: BoardId,
}

/// POST /api/v1/boards - create a board with its generation 0.
///
/// Unreadable bodies get the same `422 {"errors": [..]}` shape as invalid boards.
async fn create_board(
    State(state): State<AppState>,
    body: Result<Json<CreateBoardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(request) =
        body.map_err(|rejection| ApiError::Unprocessable(vec![rejection.body_text()]))?;
    let BoardParams {
        initial_state,
        rows,
        cols,
    } = request.board;
    let id = with_service(&state, move |service| {
        service.create(&initial_state, rows, cols)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[derive(Debug, Serialize)]
pub struct BoardsResponse {
    boards: Vec<BoardId>,
}

/// GET /api/v1/boards - list board ids.
async fn list_boards(State(state): State<AppState>) -> Result<Json<BoardsResponse>, ApiError> {
    let boards = with_service(&state, |service| service.board_ids()).await?;
    Ok(Json(BoardsResponse { boards }))
}

/// GET /api/v1/boards/:id - initial state (generation 0).
async fn show_board(
    State(state): State<AppState>,
    Path(id): Path<BoardId>,
) -> Result<Json<String>, ApiError> {
    let grid = with_service(&state, move |service| service.initial_state(id)).await?;
    Ok(Json(grid))
}

/// DELETE /api/v1/boards/:id - delete a board and its generations.
async fn delete_board(
    State(state): State<AppState>,
    Path(id): Path<BoardId>,
) -> Result<StatusCode, ApiError> {
    let removed = with_service(&state, move |service| service.delete(id)).await?;
    if !removed {
        return Err(ApiError::NotFound(NotFoundError::Board(id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/boards/:id/next_state - advance one generation.
async fn next_state(
    State(state): State<AppState>,
    Path(id): Path<BoardId>,
) -> Result<Json<String>, ApiError> {
    let grid = with_service(&state, move |service| service.advance_and_get(id)).await?;
    Ok(Json(grid))
}

/// GET /api/v1/boards/:id/state_at_step/:step - materialized generation lookup.
async fn state_at_step(
    State(state): State<AppState>,
    Path((id, step)): Path<(BoardId, u64)>,
) -> Result<Json<String>, ApiError> {
    let grid = with_service(&state, move |service| service.state_at_step(id, step)).await?;
    Ok(Json(grid))
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalStateQuery {
    max_steps: Option<u64>,
}

/// GET /api/v1/boards/:id/final_state?max_steps=N - run to convergence.
///
/// An exhausted budget is a normal outcome: 200 with an `error` object
/// instead of a grid string.
async fn final_state(
    State(state): State<AppState>,
    Path(id): Path<BoardId>,
    Query(query): Query<FinalStateQuery>,
) -> Result<Json<Value>, ApiError> {
    let max_steps = query.max_steps;
    let outcome = with_service(&state, move |service| service.final_state(id, max_steps)).await?;
    Ok(Json(match outcome {
        FinalState::Stable { state, .. } => Value::String(state),
        FinalState::Unstable { .. } => json!({ "error": UNSTABLE_MESSAGE }),
    }))
}

/// GET /api/v1/boards/:id/summary - dimensions and generation count.
async fn summary(
    State(state): State<AppState>,
    Path(id): Path<BoardId>,
) -> Result<Json<BoardSummary>, ApiError> {
    let summary = with_service(&state, move |service| service.summary(id)).await?;
    Ok(Json(summary))
}

use crate::allocator::Allocation;
use crate::catalog::TopicSpec;
use crate::error::AppError;
use crate::models::QuizItem;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use tracing::info;

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn parse_count(raw: &str, req_id: &str) -> Result<i64, AppError> {
    raw.trim().parse::<i64>().map_err(|_| {
        AppError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_INPUT",
            format!("question count must be an integer, got `{raw}`"),
            req_id,
        )
    })
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub status: &'static str,
    pub data: Vec<QuizItem>,
}

pub async fn generate_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_count): Path<String>,
) -> Result<Json<QuizResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let count = parse_count(&raw_count, &req_id)?;

    let data = state
        .generate_quiz(count)
        .await
        .map_err(|e| AppError::from_assembly(e, req_id.clone()))?;
    info!(request_id = %req_id, requested = count, returned = data.len(), "quiz generated");

    Ok(Json(QuizResponse { status: "success", data }))
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub status: &'static str,
    pub topics: Vec<TopicSpec>,
    pub priority: Vec<String>,
}

pub async fn list_topics(State(state): State<AppState>) -> Json<TopicsResponse> {
    Json(TopicsResponse {
        status: "success",
        topics: state.catalog.topics().to_vec(),
        priority: state.catalog.priority().to_vec(),
    })
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub status: &'static str,
    pub data: Allocation,
}

pub async fn preview_allocation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_count): Path<String>,
) -> Result<Json<AllocationResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let count = parse_count(&raw_count, &req_id)?;
    let max = state.config.max_question_count;
    if count > max {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_INPUT",
            format!("question count must not exceed {max}, got {count}"),
            req_id,
        ));
    }
    let data = state
        .catalog
        .allocate(count)
        .map_err(|e| AppError::from_quiz(e, req_id))?;
    Ok(Json(AllocationResponse { status: "success", data }))
}

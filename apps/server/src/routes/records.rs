use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    ApiError, AppJson, AppState,
    auth::AuthUser,
    routes::users::MessageResponse,
    state::{Record, RecordInput},
};

fn not_found() -> ApiError {
    ApiError::NotFound("Record not found".to_string())
}

// Ids that are not numbers cannot match any record.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| not_found())
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    AppJson(input): AppJson<RecordInput>,
) -> Result<(StatusCode, AppJson<Record>), ApiError> {
    let record = state.db.write().await.insert_record(user.id, input);
    tracing::info!(record_id = record.id, user_id = user.id, "record_created");
    Ok((StatusCode::CREATED, AppJson(record)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> AppJson<Vec<Record>> {
    AppJson(state.db.read().await.records_for(user.id))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<AppJson<Record>, ApiError> {
    let id = parse_id(&id)?;
    let db = state.db.read().await;
    let record = db.record(user.id, id).cloned().ok_or_else(not_found)?;
    Ok(AppJson(record))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    AppJson(input): AppJson<RecordInput>,
) -> Result<AppJson<Record>, ApiError> {
    let id = parse_id(&id)?;
    let record = state
        .db
        .write()
        .await
        .update_record(user.id, id, input)
        .ok_or_else(not_found)?;
    Ok(AppJson(record))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<AppJson<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if !state.db.write().await.delete_record(user.id, id) {
        return Err(not_found());
    }

    tracing::info!(record_id = id, user_id = user.id, "record_deleted");
    Ok(AppJson(MessageResponse::new("Record deleted successfully")))
}

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::presenter::{decorate, NotificationView};

#[derive(Debug, Serialize)]
pub struct ModifiedResponse {
    pub modified_count: u64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

/// GET /notifications — everything, newest first, decorated for the client.
#[instrument(skip(state))]
pub async fn list_notifications(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<NotificationView>>> {
    let notifications = state.repos.notifications.list_desc().await?;
    Ok(Json(notifications.into_iter().map(decorate).collect()))
}

/// POST /notifications/{id}/mark_read
#[instrument(skip(state))]
pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ModifiedResponse>> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::invalid("Invalid notification ID"))?;
    let modified = state.repos.notifications.mark_read(id).await?;
    if !modified {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(Json(ModifiedResponse { modified_count: 1 }))
}

/// POST /notifications/mark_all_read
#[instrument(skip(state))]
pub async fn mark_all_read(State(state): State<AppState>) -> ApiResult<Json<ModifiedResponse>> {
    let modified_count = state.repos.notifications.mark_all_read().await?;
    Ok(Json(ModifiedResponse { modified_count }))
}

/// GET /notifications/unread_count
#[instrument(skip(state))]
pub async fn unread_count(State(state): State<AppState>) -> ApiResult<Json<UnreadCountResponse>> {
    let unread_count = state.repos.notifications.unread_count().await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

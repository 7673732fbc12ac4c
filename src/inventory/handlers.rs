use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::mealplan::dto::default_user;
use crate::mealplan::week;
use crate::repo::{kinds, FoodItem, FoodItemPatch, Notification};
use crate::state::AppState;

use super::status::food_status;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct FoodItemView {
    #[serde(flatten)]
    pub item: FoodItem,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodItemRequest {
    #[serde(default = "default_user", alias = "user_id")]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub storage: String,
    #[serde(default, alias = "expiry_date")]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFoodItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default, alias = "expiry_date")]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn parse_item_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid("Invalid item ID format"))
}

/// GET /inventory?userId — the user's items with their freshness status.
#[instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<Json<Vec<FoodItemView>>> {
    let today = OffsetDateTime::now_utc().date();
    let items = state.repos.inventory.list(&query.user_id).await?;
    let views = items
        .into_iter()
        .map(|item| FoodItemView {
            status: food_status(item.expiry_date, today),
            item,
        })
        .collect();
    Ok(Json(views))
}

/// POST /inventory/item
#[instrument(skip(state, body), fields(user_id = %body.user_id))]
pub async fn add_food_item(
    State(state): State<AppState>,
    Json(body): Json<NewFoodItemRequest>,
) -> ApiResult<Json<StatusResponse>> {
    if body.name.trim().is_empty() {
        return Err(ApiError::invalid("Item name is required"));
    }
    let expiry_date = body.expiry_date.as_deref().map(week::parse_date).transpose()?;

    let now = OffsetDateTime::now_utc();
    let item = FoodItem {
        id: Uuid::new_v4(),
        user_id: body.user_id,
        name: body.name,
        quantity: body.quantity,
        category: body.category,
        storage: body.storage,
        expiry_date,
        source: body.source.unwrap_or_else(|| "manual".to_string()),
        created_at: now,
        updated_at: now,
    };
    state.repos.inventory.insert(&item).await?;
    notify_inventory(
        &state,
        &item.user_id,
        format!("Item added: {}", item.name),
        format!("{} is now tracked in your inventory.", item.name),
        now,
    )
    .await?;

    info!(item_id = %item.id, name = %item.name, "inventory item added");
    Ok(Json(StatusResponse {
        status: "success",
        id: Some(item.id.to_string()),
    }))
}

/// PUT /inventory/item/{id} — partial update (mark used, adjust quantity, …).
#[instrument(skip(state, body))]
pub async fn update_food_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateFoodItemRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let id = parse_item_id(&id)?;
    let patch = FoodItemPatch {
        name: body.name,
        quantity: body.quantity,
        category: body.category,
        storage: body.storage,
        expiry_date: body.expiry_date.as_deref().map(week::parse_date).transpose()?,
        source: body.source,
    };

    let updated = state.repos.inventory.update(id, &patch).await?;
    if !updated {
        return Err(ApiError::not_found("Food item not found"));
    }
    Ok(Json(StatusResponse {
        status: "updated",
        id: None,
    }))
}

/// DELETE /inventory/item/{id}
#[instrument(skip(state))]
pub async fn delete_food_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let id = parse_item_id(&id)?;
    let item = state.repos.inventory.find(id).await?;
    let deleted = state.repos.inventory.delete(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Food item not found"));
    }
    if let Some(item) = item {
        notify_inventory(
            &state,
            &item.user_id,
            format!("Item removed: {}", item.name),
            format!("{} was removed from your inventory.", item.name),
            OffsetDateTime::now_utc(),
        )
        .await?;
    }
    Ok(Json(StatusResponse {
        status: "deleted",
        id: None,
    }))
}

async fn notify_inventory(
    state: &AppState,
    user_id: &str,
    title: String,
    message: String,
    now: OffsetDateTime,
) -> ApiResult<()> {
    state
        .repos
        .notifications
        .insert(&Notification {
            id: Uuid::new_v4(),
            user_id: Some(user_id.to_string()),
            kind: kinds::INVENTORY.to_string(),
            title,
            message,
            created_at: now,
            send_at: None,
            meal_entry_id: None,
            notif_label: None,
            is_read: false,
            show_action: false,
        })
        .await?;
    Ok(())
}

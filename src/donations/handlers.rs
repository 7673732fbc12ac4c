use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::repo::{kinds, Notification};
use crate::state::AppState;

use super::repo::{self, Donation};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    #[serde(default, alias = "pickup_date")]
    pub pickup_date: Option<String>,
    #[serde(default, alias = "pickup_location")]
    pub pickup_location: Option<String>,
}

fn parse_donation_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid("Invalid donation ID format"))
}

/// POST /donations/{item_id} — convert an inventory item into a donation and
/// drop the item from the inventory.
#[instrument(skip(state, body))]
pub async fn convert_to_donation(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(body): Json<DonationRequest>,
) -> ApiResult<(StatusCode, Json<Donation>)> {
    let item_id =
        Uuid::parse_str(&item_id).map_err(|_| ApiError::invalid("Invalid item ID format"))?;

    let item = state
        .repos
        .inventory
        .find(item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Inventory item not found"))?;

    let donation = repo::insert_from_item(
        &state.db,
        &item,
        body.pickup_location.as_deref(),
        body.pickup_date.as_deref(),
    )
    .await?;
    state.repos.inventory.delete(item_id).await?;

    state
        .repos
        .notifications
        .insert(&Notification {
            id: Uuid::new_v4(),
            user_id: Some(item.user_id.clone()),
            kind: kinds::DONATION.to_string(),
            title: format!("Item donated: {}", item.name),
            message: format!("{} is listed for donation.", item.name),
            created_at: OffsetDateTime::now_utc(),
            send_at: None,
            meal_entry_id: None,
            notif_label: None,
            is_read: false,
            show_action: false,
        })
        .await?;

    info!(donation_id = %donation.id, item_id = %item_id, "inventory item donated");
    Ok((StatusCode::CREATED, Json(donation)))
}

/// GET /donations
#[instrument(skip(state))]
pub async fn list_donations(State(state): State<AppState>) -> ApiResult<Json<Vec<Donation>>> {
    let donations = repo::list_all(&state.db).await?;
    Ok(Json(donations))
}

/// GET /donations/{id}
#[instrument(skip(state))]
pub async fn get_donation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Donation>> {
    let id = parse_donation_id(&id)?;
    let donation = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Donation not found"))?;
    Ok(Json(donation))
}

/// DELETE /donations/{id}
#[instrument(skip(state))]
pub async fn delete_donation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_donation_id(&id)?;
    let deleted = repo::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::not_found("Donation not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

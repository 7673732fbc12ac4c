use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::repo::FoodItem;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub inventory_id: Option<Uuid>,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub storage: String,
    pub expiry_date: Option<Date>,
    pub notes: Option<String>,
    pub status: String,
    pub pickup_location: Option<String>,
    pub pickup_date: Option<String>,
    pub donated_at: OffsetDateTime,
}

const DONATION_COLUMNS: &str = "id, inventory_id, user_id, name, category, quantity, \
     storage, expiry_date, notes, status, pickup_location, pickup_date, donated_at";

/// Turn an inventory item into a donation record.
pub async fn insert_from_item(
    db: &PgPool,
    item: &FoodItem,
    pickup_location: Option<&str>,
    pickup_date: Option<&str>,
) -> anyhow::Result<Donation> {
    let donation = sqlx::query_as::<_, Donation>(&format!(
        r#"
        INSERT INTO donations
            (inventory_id, user_id, name, category, quantity, storage,
             expiry_date, status, pickup_location, pickup_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'Donated', $8, $9)
        RETURNING {DONATION_COLUMNS}
        "#
    ))
    .bind(item.id)
    .bind(&item.user_id)
    .bind(&item.name)
    .bind(&item.category)
    .bind(item.quantity)
    .bind(&item.storage)
    .bind(item.expiry_date)
    .bind(pickup_location)
    .bind(pickup_date)
    .fetch_one(db)
    .await
    .context("insert donation")?;
    Ok(donation)
}

/// All donations, most recent first.
pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Donation>> {
    let rows = sqlx::query_as::<_, Donation>(&format!(
        r#"SELECT {DONATION_COLUMNS} FROM donations ORDER BY donated_at DESC"#
    ))
    .fetch_all(db)
    .await
    .context("list donations")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Donation>> {
    let row = sqlx::query_as::<_, Donation>(&format!(
        r#"SELECT {DONATION_COLUMNS} FROM donations WHERE id = $1"#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find donation")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(r#"DELETE FROM donations WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await
        .context("delete donation")?;
    Ok(result.rows_affected() > 0)
}

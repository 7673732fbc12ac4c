use anyhow::Context;
use axum::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{
    FoodItem, FoodItemPatch, Ingredient, InventoryRepo, MealEntry, MealEntryRepo, MealSlot,
    MealTemplate, NotificationRepo, Notification, Recipe, RecipeRepo, TemplateRepo, WeekMeals,
    WeekPlan, WeekPlanRepo,
};
use crate::mealplan::week;

// ---- meal plans ----

pub struct PgWeekPlanRepo {
    db: PgPool,
}

impl PgWeekPlanRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct PlanRow {
    id: Uuid,
    user_id: String,
    week_start: Date,
    meals: Json<WeekMeals>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PlanRow> for WeekPlan {
    fn from(r: PlanRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            week_start: r.week_start,
            meals: r.meals.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl WeekPlanRepo for PgWeekPlanRepo {
    async fn get_or_create(&self, user_id: &str, week_start: Date) -> anyhow::Result<WeekPlan> {
        // Upsert-shaped create: two concurrent first reads race on the insert,
        // the conflict clause makes the loser a no-op.
        sqlx::query(
            r#"
            INSERT INTO meal_plans (user_id, week_start, meals)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, week_start) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(week_start)
        .bind(Json(week::empty_week()))
        .execute(&self.db)
        .await
        .context("create empty meal plan")?;

        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, user_id, week_start, meals, created_at, updated_at
            FROM meal_plans
            WHERE user_id = $1 AND week_start = $2
            "#,
        )
        .bind(user_id)
        .bind(week_start)
        .fetch_one(&self.db)
        .await
        .context("load meal plan")?;

        Ok(row.into())
    }

    async fn find(&self, user_id: &str, week_start: Date) -> anyhow::Result<Option<WeekPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, user_id, week_start, meals, created_at, updated_at
            FROM meal_plans
            WHERE user_id = $1 AND week_start = $2
            "#,
        )
        .bind(user_id)
        .bind(week_start)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn upsert_meals(
        &self,
        user_id: &str,
        week_start: Date,
        meals: &WeekMeals,
    ) -> anyhow::Result<bool> {
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO meal_plans (user_id, week_start, meals)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, week_start)
            DO UPDATE SET meals = EXCLUDED.meals, updated_at = now()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(user_id)
        .bind(week_start)
        .bind(Json(meals))
        .fetch_one(&self.db)
        .await
        .context("upsert meal plan")?;
        Ok(!inserted)
    }

    async fn delete(&self, user_id: &str, week_start: Date) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"DELETE FROM meal_plans WHERE user_id = $1 AND week_start = $2"#,
        )
        .bind(user_id)
        .bind(week_start)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---- meal entries ----

pub struct PgMealEntryRepo {
    db: PgPool,
}

impl PgMealEntryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct EntryRow {
    id: Uuid,
    user_id: String,
    week_start: Date,
    day: String,
    slot: String,
    entry_date: Date,
    meal: Json<MealSlot>,
    created_at: OffsetDateTime,
}

impl From<EntryRow> for MealEntry {
    fn from(r: EntryRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            week_start: r.week_start,
            day: r.day,
            slot: r.slot,
            date: r.entry_date,
            meal: r.meal.0,
            created_at: r.created_at,
        }
    }
}

const ENTRY_COLUMNS: &str =
    "id, user_id, week_start, day, slot, entry_date, meal, created_at";

#[async_trait]
impl MealEntryRepo for PgMealEntryRepo {
    async fn insert_many(&self, entries: &[MealEntry]) -> anyhow::Result<()> {
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO meal_entries
                    (id, user_id, week_start, day, slot, entry_date, meal, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(entry.id)
            .bind(&entry.user_id)
            .bind(entry.week_start)
            .bind(&entry.day)
            .bind(&entry.slot)
            .bind(entry.date)
            .bind(Json(&entry.meal))
            .bind(entry.created_at)
            .execute(&self.db)
            .await
            .context("insert meal entry")?;
        }
        Ok(())
    }

    async fn delete_week(&self, user_id: &str, week_start: Date) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"DELETE FROM meal_entries WHERE user_id = $1 AND week_start = $2"#,
        )
        .bind(user_id)
        .bind(week_start)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_week(&self, user_id: &str, week_start: Date) -> anyhow::Result<Vec<MealEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM meal_entries
            WHERE user_id = $1 AND week_start = $2
            ORDER BY entry_date, slot
            "#
        ))
        .bind(user_id)
        .bind(week_start)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_from(&self, date: Date) -> anyhow::Result<Vec<MealEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM meal_entries
            WHERE entry_date >= $1
            ORDER BY entry_date, slot
            "#
        ))
        .bind(date)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM meal_entries WHERE id = $1)"#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }
}

// ---- notifications ----

pub struct PgNotificationRepo {
    db: PgPool,
}

impl PgNotificationRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Option<String>,
    kind: String,
    title: String,
    message: String,
    created_at: OffsetDateTime,
    send_at: Option<OffsetDateTime>,
    meal_entry_id: Option<Uuid>,
    notif_label: Option<String>,
    is_read: bool,
    show_action: bool,
}

impl From<NotificationRow> for Notification {
    fn from(r: NotificationRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            kind: r.kind,
            title: r.title,
            message: r.message,
            created_at: r.created_at,
            send_at: r.send_at,
            meal_entry_id: r.meal_entry_id,
            notif_label: r.notif_label,
            is_read: r.is_read,
            show_action: r.show_action,
        }
    }
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, created_at, \
     send_at, meal_entry_id, notif_label, is_read, show_action";

const INSERT_NOTIFICATION: &str = r#"
    INSERT INTO notifications
        (id, user_id, kind, title, message, created_at, send_at,
         meal_entry_id, notif_label, is_read, show_action)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
"#;

fn bind_notification<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    n: &'q Notification,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(n.id)
        .bind(&n.user_id)
        .bind(&n.kind)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.created_at)
        .bind(n.send_at)
        .bind(n.meal_entry_id)
        .bind(&n.notif_label)
        .bind(n.is_read)
        .bind(n.show_action)
}

#[async_trait]
impl NotificationRepo for PgNotificationRepo {
    async fn insert_reminder(&self, notification: &Notification) -> anyhow::Result<bool> {
        // The partial unique index is the real uniqueness guarantee; the
        // conflict clause turns a lost race into a no-op.
        let sql = format!(
            "{INSERT_NOTIFICATION}
             ON CONFLICT (meal_entry_id, notif_label, user_id)
             WHERE kind = 'meal_reminder'
               AND meal_entry_id IS NOT NULL
               AND notif_label IS NOT NULL
             DO NOTHING"
        );
        let result = bind_notification(sqlx::query(&sql), notification)
            .execute(&self.db)
            .await
            .context("insert meal reminder")?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert(&self, notification: &Notification) -> anyhow::Result<()> {
        bind_notification(sqlx::query(INSERT_NOTIFICATION), notification)
            .execute(&self.db)
            .await
            .context("insert notification")?;
        Ok(())
    }

    async fn list_desc(&self) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_entry_linked(&self) -> anyhow::Result<Vec<(Uuid, Uuid)>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"SELECT id, meal_entry_id FROM notifications WHERE meal_entry_id IS NOT NULL"#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM notifications WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"UPDATE notifications SET is_read = true WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self) -> anyhow::Result<u64> {
        let result =
            sqlx::query(r#"UPDATE notifications SET is_read = true WHERE is_read = false"#)
                .execute(&self.db)
                .await?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM notifications WHERE is_read = false"#,
        )
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }
}

// ---- templates ----

pub struct PgTemplateRepo {
    db: PgPool,
}

impl PgTemplateRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct TemplateRow {
    id: Uuid,
    user_id: String,
    name: String,
    meals: Json<WeekMeals>,
    created_at: OffsetDateTime,
}

impl From<TemplateRow> for MealTemplate {
    fn from(r: TemplateRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            meals: r.meals.0,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl TemplateRepo for PgTemplateRepo {
    async fn insert(&self, template: &MealTemplate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meal_templates (id, user_id, name, meals, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(template.id)
        .bind(&template.user_id)
        .bind(&template.name)
        .bind(Json(&template.meals))
        .bind(template.created_at)
        .execute(&self.db)
        .await
        .context("insert template")?;
        Ok(())
    }

    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<MealTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, user_id, name, meals, created_at
            FROM meal_templates
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<MealTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, user_id, name, meals, created_at
            FROM meal_templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM meal_templates WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---- inventory ----

pub struct PgInventoryRepo {
    db: PgPool,
}

impl PgInventoryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct FoodItemRow {
    id: Uuid,
    user_id: String,
    name: String,
    quantity: i32,
    category: String,
    storage: String,
    expiry_date: Option<Date>,
    source: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<FoodItemRow> for FoodItem {
    fn from(r: FoodItemRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            quantity: r.quantity,
            category: r.category,
            storage: r.storage,
            expiry_date: r.expiry_date,
            source: r.source,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const FOOD_ITEM_COLUMNS: &str = "id, user_id, name, quantity, category, storage, \
     expiry_date, source, created_at, updated_at";

#[async_trait]
impl InventoryRepo for PgInventoryRepo {
    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<FoodItem>> {
        let rows = sqlx::query_as::<_, FoodItemRow>(&format!(
            r#"
            SELECT {FOOD_ITEM_COLUMNS}
            FROM food_items
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn names(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"SELECT lower(name) FROM food_items WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(names)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<FoodItem>> {
        let row = sqlx::query_as::<_, FoodItemRow>(&format!(
            r#"SELECT {FOOD_ITEM_COLUMNS} FROM food_items WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn insert(&self, item: &FoodItem) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO food_items
                (id, user_id, name, quantity, category, storage,
                 expiry_date, source, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(&item.user_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.category)
        .bind(&item.storage)
        .bind(item.expiry_date)
        .bind(&item.source)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.db)
        .await
        .context("insert food item")?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &FoodItemPatch) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE food_items SET
                name        = COALESCE($2, name),
                quantity    = COALESCE($3, quantity),
                category    = COALESCE($4, category),
                storage     = COALESCE($5, storage),
                expiry_date = COALESCE($6, expiry_date),
                source      = COALESCE($7, source),
                updated_at  = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.quantity)
        .bind(&patch.category)
        .bind(&patch.storage)
        .bind(patch.expiry_date)
        .bind(&patch.source)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM food_items WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---- recipes ----

pub struct PgRecipeRepo {
    db: PgPool,
}

impl PgRecipeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct RecipeRow {
    id: Uuid,
    user_id: Option<String>,
    name: String,
    ingredients: Json<Vec<Ingredient>>,
    instructions: Option<String>,
    image: Option<String>,
    category: Option<String>,
    created_at: OffsetDateTime,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            ingredients: r.ingredients.0,
            instructions: r.instructions,
            image: r.image,
            category: r.category,
            created_at: r.created_at,
        }
    }
}

impl PgRecipeRepo {
    async fn list_catalog(&self, table: &str) -> anyhow::Result<Vec<Recipe>> {
        // `table` is one of two compile-time constants, never client input.
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT id, NULL::text AS user_id, name, ingredients,
                   instructions, image, category, created_at
            FROM {table}
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn list_generic(&self) -> anyhow::Result<Vec<Recipe>> {
        self.list_catalog("generic_recipes").await
    }

    async fn list_suggested(&self) -> anyhow::Result<Vec<Recipe>> {
        self.list_catalog("suggested_recipes").await
    }

    async fn list_custom(&self, user_id: &str) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, user_id, name, ingredients, instructions, image, category, created_at
            FROM custom_recipes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_custom(&self, recipe: &Recipe) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO custom_recipes
                (id, user_id, name, ingredients, instructions, image, category, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(recipe.id)
        .bind(recipe.user_id.as_deref().unwrap_or("me"))
        .bind(&recipe.name)
        .bind(Json(&recipe.ingredients))
        .bind(&recipe.instructions)
        .bind(&recipe.image)
        .bind(&recipe.category)
        .bind(recipe.created_at)
        .execute(&self.db)
        .await
        .context("insert custom recipe")?;
        Ok(())
    }
}

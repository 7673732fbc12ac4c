use std::collections::BTreeMap;
use std::sync::Arc;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub mod memory;
pub mod pg;

/// Notification kinds stored in the `kind` column (serialized as `type`).
pub mod kinds {
    pub const MEAL_REMINDER: &str = "meal_reminder";
    pub const INVENTORY: &str = "inventory";
    pub const DONATION: &str = "donation";
    pub const SYSTEM: &str = "system";
}

// ---- document shapes ----

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub used_qty: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MealSlot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub image: Option<String>,
    /// Wall-clock meal time as "HH:MM"; reminders fall back to 12:00.
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DayMeals {
    pub breakfast: Option<MealSlot>,
    pub lunch: Option<MealSlot>,
    pub dinner: Option<MealSlot>,
    pub snacks: Option<MealSlot>,
}

impl DayMeals {
    pub fn slots(&self) -> [(&'static str, Option<&MealSlot>); 4] {
        [
            ("breakfast", self.breakfast.as_ref()),
            ("lunch", self.lunch.as_ref()),
            ("dinner", self.dinner.as_ref()),
            ("snacks", self.snacks.as_ref()),
        ]
    }
}

/// A week's meals keyed by lowercase day name (monday..sunday).
pub type WeekMeals = BTreeMap<String, DayMeals>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekPlan {
    pub id: Uuid,
    pub user_id: String,
    pub week_start: Date,
    pub meals: WeekMeals,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Uuid,
    pub user_id: String,
    pub week_start: Date,
    pub day: String,
    pub slot: String,
    pub date: Date,
    pub meal: MealSlot,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub created_at: OffsetDateTime,
    pub send_at: Option<OffsetDateTime>,
    pub meal_entry_id: Option<Uuid>,
    pub notif_label: Option<String>,
    pub is_read: bool,
    pub show_action: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealTemplate {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub meals: WeekMeals,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub quantity: i32,
    pub category: String,
    pub storage: String,
    pub expiry_date: Option<Date>,
    pub source: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodItemPatch {
    pub name: Option<String>,
    pub quantity: Option<i32>,
    pub category: Option<String>,
    pub storage: Option<String>,
    pub expiry_date: Option<Date>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub created_at: OffsetDateTime,
}

// ---- repository contracts ----
//
// Per-document atomicity is all the store guarantees; any multi-step operation
// built on these methods (projection, template apply) is non-atomic.

#[async_trait]
pub trait WeekPlanRepo: Send + Sync {
    /// Returns the plan, atomically creating the empty skeleton when absent.
    /// Concurrent first reads must not produce duplicate skeletons.
    async fn get_or_create(&self, user_id: &str, week_start: Date) -> anyhow::Result<WeekPlan>;

    async fn find(&self, user_id: &str, week_start: Date) -> anyhow::Result<Option<WeekPlan>>;

    /// Upserts `meals` and `updated_at`. Returns true when an existing plan was
    /// overwritten, false when the plan was created.
    async fn upsert_meals(
        &self,
        user_id: &str,
        week_start: Date,
        meals: &WeekMeals,
    ) -> anyhow::Result<bool>;

    /// Returns false when no plan existed.
    async fn delete(&self, user_id: &str, week_start: Date) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait MealEntryRepo: Send + Sync {
    async fn insert_many(&self, entries: &[MealEntry]) -> anyhow::Result<()>;
    async fn delete_week(&self, user_id: &str, week_start: Date) -> anyhow::Result<u64>;
    async fn list_week(&self, user_id: &str, week_start: Date) -> anyhow::Result<Vec<MealEntry>>;
    /// All entries dated `date` or later, across users.
    async fn list_from(&self, date: Date) -> anyhow::Result<Vec<MealEntry>>;
    async fn exists(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait NotificationRepo: Send + Sync {
    /// Idempotent insert keyed on (meal_entry_id, notif_label, user_id) for
    /// kind = meal_reminder. Returns true when a row was actually inserted.
    async fn insert_reminder(&self, notification: &Notification) -> anyhow::Result<bool>;

    async fn insert(&self, notification: &Notification) -> anyhow::Result<()>;

    /// Newest first.
    async fn list_desc(&self) -> anyhow::Result<Vec<Notification>>;

    /// (notification id, meal entry id) for every notification that references
    /// a meal entry; the reconciler's GC input.
    async fn list_entry_linked(&self) -> anyhow::Result<Vec<(Uuid, Uuid)>>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;
    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn mark_all_read(&self) -> anyhow::Result<u64>;
    async fn unread_count(&self) -> anyhow::Result<i64>;
}

#[async_trait]
pub trait TemplateRepo: Send + Sync {
    async fn insert(&self, template: &MealTemplate) -> anyhow::Result<()>;
    /// Newest first.
    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<MealTemplate>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<MealTemplate>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait InventoryRepo: Send + Sync {
    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<FoodItem>>;
    /// Lowercased item names, the matcher's view of the inventory.
    async fn names(&self, user_id: &str) -> anyhow::Result<Vec<String>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<FoodItem>>;
    async fn insert(&self, item: &FoodItem) -> anyhow::Result<()>;
    async fn update(&self, id: Uuid, patch: &FoodItemPatch) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    async fn list_generic(&self) -> anyhow::Result<Vec<Recipe>>;
    async fn list_suggested(&self) -> anyhow::Result<Vec<Recipe>>;
    async fn list_custom(&self, user_id: &str) -> anyhow::Result<Vec<Recipe>>;
    async fn insert_custom(&self, recipe: &Recipe) -> anyhow::Result<()>;
}

/// The repository bundle injected into handlers and the reconciler.
#[derive(Clone)]
pub struct Repos {
    pub plans: Arc<dyn WeekPlanRepo>,
    pub entries: Arc<dyn MealEntryRepo>,
    pub notifications: Arc<dyn NotificationRepo>,
    pub templates: Arc<dyn TemplateRepo>,
    pub inventory: Arc<dyn InventoryRepo>,
    pub recipes: Arc<dyn RecipeRepo>,
}

impl Repos {
    pub fn postgres(db: &sqlx::PgPool) -> Self {
        Self {
            plans: Arc::new(pg::PgWeekPlanRepo::new(db.clone())),
            entries: Arc::new(pg::PgMealEntryRepo::new(db.clone())),
            notifications: Arc::new(pg::PgNotificationRepo::new(db.clone())),
            templates: Arc::new(pg::PgTemplateRepo::new(db.clone())),
            inventory: Arc::new(pg::PgInventoryRepo::new(db.clone())),
            recipes: Arc::new(pg::PgRecipeRepo::new(db.clone())),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            plans: Arc::new(memory::MemWeekPlanRepo::default()),
            entries: Arc::new(memory::MemMealEntryRepo::default()),
            notifications: Arc::new(memory::MemNotificationRepo::default()),
            templates: Arc::new(memory::MemTemplateRepo::default()),
            inventory: Arc::new(memory::MemInventoryRepo::default()),
            recipes: Arc::new(memory::MemRecipeRepo::default()),
        }
    }
}

//! In-memory repositories backing `AppState::fake()` and the test suite.
//! Each repo hides one lock; methods never await while holding it, so the
//! per-call atomicity mirrors the per-document atomicity of the real store.

use std::sync::RwLock;

use axum::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{
    kinds, FoodItem, FoodItemPatch, InventoryRepo, MealEntry, MealEntryRepo, MealTemplate,
    Notification, NotificationRepo, Recipe, RecipeRepo, TemplateRepo, WeekMeals, WeekPlan,
    WeekPlanRepo,
};
use crate::mealplan::week;

#[derive(Default)]
pub struct MemWeekPlanRepo {
    plans: RwLock<Vec<WeekPlan>>,
}

#[async_trait]
impl WeekPlanRepo for MemWeekPlanRepo {
    async fn get_or_create(&self, user_id: &str, week_start: Date) -> anyhow::Result<WeekPlan> {
        let mut plans = self.plans.write().unwrap();
        if let Some(plan) = plans
            .iter()
            .find(|p| p.user_id == user_id && p.week_start == week_start)
        {
            return Ok(plan.clone());
        }
        let now = OffsetDateTime::now_utc();
        let plan = WeekPlan {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            week_start,
            meals: week::empty_week(),
            created_at: now,
            updated_at: now,
        };
        plans.push(plan.clone());
        Ok(plan)
    }

    async fn find(&self, user_id: &str, week_start: Date) -> anyhow::Result<Option<WeekPlan>> {
        let plans = self.plans.read().unwrap();
        Ok(plans
            .iter()
            .find(|p| p.user_id == user_id && p.week_start == week_start)
            .cloned())
    }

    async fn upsert_meals(
        &self,
        user_id: &str,
        week_start: Date,
        meals: &WeekMeals,
    ) -> anyhow::Result<bool> {
        let mut plans = self.plans.write().unwrap();
        let now = OffsetDateTime::now_utc();
        if let Some(plan) = plans
            .iter_mut()
            .find(|p| p.user_id == user_id && p.week_start == week_start)
        {
            plan.meals = meals.clone();
            plan.updated_at = now;
            return Ok(true);
        }
        plans.push(WeekPlan {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            week_start,
            meals: meals.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(false)
    }

    async fn delete(&self, user_id: &str, week_start: Date) -> anyhow::Result<bool> {
        let mut plans = self.plans.write().unwrap();
        let before = plans.len();
        plans.retain(|p| !(p.user_id == user_id && p.week_start == week_start));
        Ok(plans.len() < before)
    }
}

#[derive(Default)]
pub struct MemMealEntryRepo {
    entries: RwLock<Vec<MealEntry>>,
}

#[async_trait]
impl MealEntryRepo for MemMealEntryRepo {
    async fn insert_many(&self, entries: &[MealEntry]) -> anyhow::Result<()> {
        self.entries.write().unwrap().extend_from_slice(entries);
        Ok(())
    }

    async fn delete_week(&self, user_id: &str, week_start: Date) -> anyhow::Result<u64> {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.week_start == week_start));
        Ok((before - entries.len()) as u64)
    }

    async fn list_week(&self, user_id: &str, week_start: Date) -> anyhow::Result<Vec<MealEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.user_id == user_id && e.week_start == week_start)
            .cloned()
            .collect())
    }

    async fn list_from(&self, date: Date) -> anyhow::Result<Vec<MealEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries.iter().filter(|e| e.date >= date).cloned().collect())
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        let entries = self.entries.read().unwrap();
        Ok(entries.iter().any(|e| e.id == id))
    }
}

#[derive(Default)]
pub struct MemNotificationRepo {
    notifications: RwLock<Vec<Notification>>,
}

#[async_trait]
impl NotificationRepo for MemNotificationRepo {
    async fn insert_reminder(&self, notification: &Notification) -> anyhow::Result<bool> {
        // Check-and-insert under the write lock stands in for the partial
        // unique index of the real store.
        let mut notifications = self.notifications.write().unwrap();
        let duplicate = notifications.iter().any(|n| {
            n.kind == kinds::MEAL_REMINDER
                && n.meal_entry_id == notification.meal_entry_id
                && n.notif_label == notification.notif_label
                && n.user_id == notification.user_id
        });
        if duplicate {
            return Ok(false);
        }
        notifications.push(notification.clone());
        Ok(true)
    }

    async fn insert(&self, notification: &Notification) -> anyhow::Result<()> {
        self.notifications.write().unwrap().push(notification.clone());
        Ok(())
    }

    async fn list_desc(&self) -> anyhow::Result<Vec<Notification>> {
        let mut all: Vec<Notification> =
            self.notifications.read().unwrap().iter().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_entry_linked(&self) -> anyhow::Result<Vec<(Uuid, Uuid)>> {
        let notifications = self.notifications.read().unwrap();
        Ok(notifications
            .iter()
            .filter_map(|n| n.meal_entry_id.map(|entry_id| (n.id, entry_id)))
            .collect())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        self.notifications.write().unwrap().retain(|n| n.id != id);
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut notifications = self.notifications.write().unwrap();
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self) -> anyhow::Result<u64> {
        let mut notifications = self.notifications.write().unwrap();
        let mut modified = 0;
        for n in notifications.iter_mut().filter(|n| !n.is_read) {
            n.is_read = true;
            modified += 1;
        }
        Ok(modified)
    }

    async fn unread_count(&self) -> anyhow::Result<i64> {
        let notifications = self.notifications.read().unwrap();
        Ok(notifications.iter().filter(|n| !n.is_read).count() as i64)
    }
}

#[derive(Default)]
pub struct MemTemplateRepo {
    templates: RwLock<Vec<MealTemplate>>,
}

#[async_trait]
impl TemplateRepo for MemTemplateRepo {
    async fn insert(&self, template: &MealTemplate) -> anyhow::Result<()> {
        self.templates.write().unwrap().push(template.clone());
        Ok(())
    }

    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<MealTemplate>> {
        let mut rows: Vec<MealTemplate> = self
            .templates
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<MealTemplate>> {
        let templates = self.templates.read().unwrap();
        Ok(templates.iter().find(|t| t.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut templates = self.templates.write().unwrap();
        let before = templates.len();
        templates.retain(|t| t.id != id);
        Ok(templates.len() < before)
    }
}

#[derive(Default)]
pub struct MemInventoryRepo {
    items: RwLock<Vec<FoodItem>>,
}

#[async_trait]
impl InventoryRepo for MemInventoryRepo {
    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<FoodItem>> {
        let items = self.items.read().unwrap();
        Ok(items.iter().filter(|i| i.user_id == user_id).cloned().collect())
    }

    async fn names(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let items = self.items.read().unwrap();
        Ok(items
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| i.name.to_lowercase())
            .collect())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<FoodItem>> {
        let items = self.items.read().unwrap();
        Ok(items.iter().find(|i| i.id == id).cloned())
    }

    async fn insert(&self, item: &FoodItem) -> anyhow::Result<()> {
        self.items.write().unwrap().push(item.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &FoodItemPatch) -> anyhow::Result<bool> {
        let mut items = self.items.write().unwrap();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        if let Some(name) = &patch.name {
            item.name = name.clone();
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(category) = &patch.category {
            item.category = category.clone();
        }
        if let Some(storage) = &patch.storage {
            item.storage = storage.clone();
        }
        if let Some(expiry_date) = patch.expiry_date {
            item.expiry_date = Some(expiry_date);
        }
        if let Some(source) = &patch.source {
            item.source = source.clone();
        }
        item.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut items = self.items.write().unwrap();
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() < before)
    }
}

#[derive(Default)]
pub struct MemRecipeRepo {
    generic: RwLock<Vec<Recipe>>,
    suggested: RwLock<Vec<Recipe>>,
    custom: RwLock<Vec<Recipe>>,
}

impl MemRecipeRepo {
    pub fn seed_generic(&self, recipes: Vec<Recipe>) {
        self.generic.write().unwrap().extend(recipes);
    }

    pub fn seed_suggested(&self, recipes: Vec<Recipe>) {
        self.suggested.write().unwrap().extend(recipes);
    }
}

#[async_trait]
impl RecipeRepo for MemRecipeRepo {
    async fn list_generic(&self) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.generic.read().unwrap().clone())
    }

    async fn list_suggested(&self) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.suggested.read().unwrap().clone())
    }

    async fn list_custom(&self, user_id: &str) -> anyhow::Result<Vec<Recipe>> {
        let custom = self.custom.read().unwrap();
        Ok(custom
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn insert_custom(&self, recipe: &Recipe) -> anyhow::Result<()> {
        self.custom.write().unwrap().push(recipe.clone());
        Ok(())
    }
}

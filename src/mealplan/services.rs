use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::mealplan::week;
use crate::repo::{
    kinds, Ingredient, InventoryRepo, MealEntry, MealEntryRepo, Notification, NotificationRepo,
    Recipe, WeekMeals,
};

// ---- recipe matching ----

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub match_pct: f64,
}

/// Ingredient-overlap between a recipe and the inventory. An ingredient counts
/// as matched when its name and any inventory name contain each other
/// case-insensitively in either direction, so "egg" matches "eggs".
/// `inventory_names` are expected lowercased (`InventoryRepo::names`).
pub fn match_recipe(ingredients: &[Ingredient], inventory_names: &[String]) -> RecipeMatch {
    if ingredients.is_empty() {
        return RecipeMatch {
            matched: Vec::new(),
            missing: Vec::new(),
            match_pct: 0.0,
        };
    }

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for ingredient in ingredients {
        let name = ingredient.name.to_lowercase();
        let found = inventory_names
            .iter()
            .any(|have| name.contains(have.as_str()) || have.contains(&name));
        if found {
            matched.push(name);
        } else {
            missing.push(name);
        }
    }

    let match_pct = (matched.len() as f64 / ingredients.len() as f64) * 100.0;
    RecipeMatch {
        matched,
        missing,
        match_pct,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recipes from the suggested catalog whose match percentage reaches the
/// configured threshold, paired with their match detail.
pub async fn suggest_recipes(
    recipes: &dyn crate::repo::RecipeRepo,
    inventory: &dyn InventoryRepo,
    user_id: &str,
    threshold: f64,
) -> anyhow::Result<Vec<(Recipe, RecipeMatch)>> {
    let names = inventory.names(user_id).await?;
    let catalog = recipes.list_suggested().await?;

    let mut suggested = Vec::new();
    for recipe in catalog {
        let m = match_recipe(&recipe.ingredients, &names);
        if m.match_pct >= threshold {
            suggested.push((recipe, m));
        }
    }
    Ok(suggested)
}

// ---- entry projection ----

/// One dated entry per non-null (day, slot) cell. Days that are not real day
/// names contribute nothing.
pub fn expand_week(
    user_id: &str,
    week_start: Date,
    meals: &WeekMeals,
    now: OffsetDateTime,
) -> Vec<MealEntry> {
    let mut entries = Vec::new();
    for (day, day_meals) in meals {
        let Some(date) = week::date_for_day(week_start, day) else {
            continue;
        };
        for (slot, meal) in day_meals.slots() {
            let Some(meal) = meal else { continue };
            entries.push(MealEntry {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                week_start,
                day: day.clone(),
                slot: slot.to_string(),
                date,
                meal: meal.clone(),
                created_at: now,
            });
        }
    }
    entries
}

/// Replace-all projection: drop the week's entries, insert the fresh set.
/// The two steps are not atomic; a failure in between leaves the week with no
/// entries until the next save re-runs this.
pub async fn project_week(
    entries_repo: &dyn MealEntryRepo,
    user_id: &str,
    week_start: Date,
    meals: &WeekMeals,
    now: OffsetDateTime,
) -> anyhow::Result<Vec<MealEntry>> {
    let fresh = expand_week(user_id, week_start, meals, now);
    entries_repo.delete_week(user_id, week_start).await?;
    if !fresh.is_empty() {
        entries_repo.insert_many(&fresh).await?;
    }
    Ok(fresh)
}

/// "Planned meal" announcements for freshly saved entries. These carry no
/// `meal_entry_id` and no `send_at`; the timed reminders are the reconciler's.
pub async fn announce_planned_meals(
    notifications: &dyn NotificationRepo,
    entries: &[MealEntry],
    now: OffsetDateTime,
) -> anyhow::Result<()> {
    for entry in entries {
        let meal_name = entry.meal.name.as_deref().unwrap_or("Meal");
        notifications
            .insert(&Notification {
                id: Uuid::new_v4(),
                user_id: Some(entry.user_id.clone()),
                kind: kinds::MEAL_REMINDER.to_string(),
                title: format!("Upcoming meal: {meal_name}"),
                message: format!(
                    "{} on {} is planned.",
                    week::title_case(&entry.slot),
                    entry.day
                ),
                created_at: now,
                send_at: None,
                meal_entry_id: None,
                notif_label: None,
                is_read: false,
                show_action: false,
            })
            .await?;
    }
    Ok(())
}

// ---- inventory shortage warnings ----

/// Advisory warnings for applied meals: ingredients that reference an
/// inventory item which is gone or has nothing left. Never fails the apply.
pub async fn shortage_warnings(
    inventory: &dyn InventoryRepo,
    meals: &WeekMeals,
) -> anyhow::Result<Vec<String>> {
    let mut warnings = Vec::new();
    for day_meals in meals.values() {
        for (_, meal) in day_meals.slots() {
            let Some(meal) = meal else { continue };
            for ingredient in &meal.ingredients {
                let Some(raw_id) = ingredient.id.as_deref() else {
                    continue;
                };
                let item = match Uuid::parse_str(raw_id) {
                    Ok(id) => inventory.find(id).await?,
                    Err(_) => None,
                };
                let warning = match item {
                    None => format!("{} is no longer in your inventory", ingredient.name),
                    Some(item) if item.quantity <= 0 => {
                        format!("{} is out of stock", ingredient.name)
                    }
                    Some(_) => continue,
                };
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::{
        MemInventoryRepo, MemMealEntryRepo, MemNotificationRepo, MemRecipeRepo,
    };
    use crate::repo::{DayMeals, FoodItem, MealSlot};
    use time::macros::{date, datetime};

    fn ingredient(name: &str) -> Ingredient {
        Ingredient {
            id: None,
            name: name.to_string(),
            used_qty: None,
        }
    }

    fn slot(name: &str) -> MealSlot {
        MealSlot {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn lower(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_lowercase()).collect()
    }

    #[test]
    fn half_matching_recipe_scores_fifty() {
        let ingredients = vec![
            ingredient("Eggs"),
            ingredient("Milk"),
            ingredient("Saffron"),
            ingredient("Truffle"),
        ];
        let m = match_recipe(&ingredients, &lower(&["eggs", "milk", "rice"]));
        assert_eq!(m.match_pct, 50.0);
        assert_eq!(m.matched, vec!["eggs", "milk"]);
        assert_eq!(m.missing, vec!["saffron", "truffle"]);
    }

    #[test]
    fn empty_ingredient_list_scores_zero() {
        let m = match_recipe(&[], &lower(&["eggs"]));
        assert_eq!(m.match_pct, 0.0);
        assert!(m.matched.is_empty());
    }

    #[test]
    fn matching_is_bidirectional_substring_and_case_insensitive() {
        // "egg" ⊂ "eggs" one way, "chicken breasts" ⊃ "chicken" the other.
        let ingredients = vec![ingredient("Egg"), ingredient("Chicken Breasts")];
        let m = match_recipe(&ingredients, &lower(&["Eggs", "chicken"]));
        assert_eq!(m.match_pct, 100.0);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(100.0 / 3.0), 33.33);
        assert_eq!(round2(50.0), 50.0);
    }

    fn two_meal_week() -> WeekMeals {
        let mut meals = WeekMeals::new();
        meals.insert(
            "monday".to_string(),
            DayMeals {
                breakfast: Some(slot("Oats")),
                ..Default::default()
            },
        );
        meals.insert(
            "wednesday".to_string(),
            DayMeals {
                dinner: Some(slot("Stew")),
                ..Default::default()
            },
        );
        meals
    }

    #[test]
    fn expand_derives_dates_from_day_offsets() {
        let week_start = date!(2025 - 06 - 09);
        let entries = expand_week("me", week_start, &two_meal_week(), datetime!(2025-06-01 00:00 UTC));
        assert_eq!(entries.len(), 2);

        let monday = entries.iter().find(|e| e.day == "monday").unwrap();
        assert_eq!(monday.date, date!(2025 - 06 - 09));
        assert_eq!(monday.slot, "breakfast");

        let wednesday = entries.iter().find(|e| e.day == "wednesday").unwrap();
        assert_eq!(wednesday.date, date!(2025 - 06 - 11));
        assert_eq!(wednesday.slot, "dinner");
    }

    #[test]
    fn expand_skips_unknown_days_and_null_slots() {
        let mut meals = two_meal_week();
        meals.insert(
            "blursday".to_string(),
            DayMeals {
                lunch: Some(slot("Nothing")),
                ..Default::default()
            },
        );
        meals.insert("friday".to_string(), DayMeals::default());

        let entries = expand_week("me", date!(2025 - 06 - 09), &meals, datetime!(2025-06-01 00:00 UTC));
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.day != "blursday" && e.day != "friday"));
    }

    #[tokio::test]
    async fn projection_is_idempotent() {
        let repo = MemMealEntryRepo::default();
        let week_start = date!(2025 - 06 - 09);
        let meals = two_meal_week();
        let now = datetime!(2025-06-01 00:00 UTC);

        project_week(&repo, "me", week_start, &meals, now).await.unwrap();
        let first = repo.list_week("me", week_start).await.unwrap();
        project_week(&repo, "me", week_start, &meals, now).await.unwrap();
        let second = repo.list_week("me", week_start).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        let key = |e: &MealEntry| (e.day.clone(), e.slot.clone(), e.date, e.meal.clone());
        let mut first_keys: Vec<_> = first.iter().map(key).collect();
        let mut second_keys: Vec<_> = second.iter().map(key).collect();
        first_keys.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        second_keys.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        assert_eq!(first_keys, second_keys);
    }

    #[tokio::test]
    async fn projection_replaces_the_previous_entry_set() {
        let repo = MemMealEntryRepo::default();
        let week_start = date!(2025 - 06 - 09);
        let now = datetime!(2025-06-01 00:00 UTC);

        project_week(&repo, "me", week_start, &two_meal_week(), now).await.unwrap();

        let mut replacement = WeekMeals::new();
        replacement.insert(
            "sunday".to_string(),
            DayMeals {
                lunch: Some(slot("Roast")),
                ..Default::default()
            },
        );
        project_week(&repo, "me", week_start, &replacement, now).await.unwrap();

        let entries = repo.list_week("me", week_start).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].day, "sunday");
        assert_eq!(entries[0].date, date!(2025 - 06 - 15));
    }

    #[tokio::test]
    async fn projection_leaves_other_weeks_alone() {
        let repo = MemMealEntryRepo::default();
        let now = datetime!(2025-06-01 00:00 UTC);
        project_week(&repo, "me", date!(2025 - 06 - 09), &two_meal_week(), now).await.unwrap();
        project_week(&repo, "me", date!(2025 - 06 - 16), &two_meal_week(), now).await.unwrap();

        project_week(&repo, "me", date!(2025 - 06 - 09), &WeekMeals::new(), now).await.unwrap();

        assert!(repo.list_week("me", date!(2025 - 06 - 09)).await.unwrap().is_empty());
        assert_eq!(repo.list_week("me", date!(2025 - 06 - 16)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn planned_meal_announcements_are_one_per_entry() {
        let notifications = MemNotificationRepo::default();
        let now = datetime!(2025-06-01 00:00 UTC);
        let entries = expand_week("me", date!(2025 - 06 - 09), &two_meal_week(), now);

        announce_planned_meals(&notifications, &entries, now).await.unwrap();

        let all = notifications.list_desc().await.unwrap();
        assert_eq!(all.len(), 2);
        let breakfast = all.iter().find(|n| n.title == "Upcoming meal: Oats").unwrap();
        assert_eq!(breakfast.message, "Breakfast on monday is planned.");
        assert!(breakfast.meal_entry_id.is_none());
        assert!(breakfast.send_at.is_none());
        assert!(!breakfast.is_read);
    }

    fn item(name: &str, quantity: i32) -> FoodItem {
        let now = datetime!(2025-06-01 00:00 UTC);
        FoodItem {
            id: Uuid::new_v4(),
            user_id: "me".to_string(),
            name: name.to_string(),
            quantity,
            category: String::new(),
            storage: String::new(),
            expiry_date: None,
            source: "manual".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog_recipe(name: &str, ingredient_names: &[&str]) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            user_id: None,
            name: name.to_string(),
            ingredients: ingredient_names.iter().map(|n| ingredient(n)).collect(),
            instructions: None,
            image: None,
            category: None,
            created_at: datetime!(2025-06-01 00:00 UTC),
        }
    }

    #[tokio::test]
    async fn suggestions_respect_the_threshold() {
        let recipes = MemRecipeRepo::default();
        let inventory = MemInventoryRepo::default();
        inventory.insert(&item("Eggs", 6)).await.unwrap();
        inventory.insert(&item("Rice", 2)).await.unwrap();
        recipes.seed_suggested(vec![
            catalog_recipe("Egg Fried Rice", &["Eggs", "Rice"]),
            catalog_recipe("Cheese Omelette", &["Eggs", "Cheese"]),
        ]);

        let suggested = suggest_recipes(&recipes, &inventory, "me", 80.0).await.unwrap();
        assert_eq!(suggested.len(), 1);
        assert_eq!(suggested[0].0.name, "Egg Fried Rice");
        assert_eq!(suggested[0].1.match_pct, 100.0);

        let at_fifty = suggest_recipes(&recipes, &inventory, "me", 50.0).await.unwrap();
        assert_eq!(at_fifty.len(), 2);
    }

    #[tokio::test]
    async fn shortage_pass_flags_missing_and_depleted_items() {
        let inventory = MemInventoryRepo::default();
        let eggs = item("Eggs", 6);
        let milk = item("Milk", 0);
        inventory.insert(&eggs).await.unwrap();
        inventory.insert(&milk).await.unwrap();

        let meal = MealSlot {
            name: Some("Pancakes".to_string()),
            ingredients: vec![
                Ingredient {
                    id: Some(eggs.id.to_string()),
                    name: "Eggs".to_string(),
                    used_qty: Some(2),
                },
                Ingredient {
                    id: Some(milk.id.to_string()),
                    name: "Milk".to_string(),
                    used_qty: Some(1),
                },
                Ingredient {
                    id: Some(Uuid::new_v4().to_string()),
                    name: "Flour".to_string(),
                    used_qty: None,
                },
                // No inventory reference at all: nothing to check.
                Ingredient {
                    id: None,
                    name: "Syrup".to_string(),
                    used_qty: None,
                },
            ],
            ..Default::default()
        };
        let mut meals = WeekMeals::new();
        meals.insert(
            "monday".to_string(),
            DayMeals {
                breakfast: Some(meal),
                ..Default::default()
            },
        );

        let warnings = shortage_warnings(&inventory, &meals).await.unwrap();
        assert_eq!(
            warnings,
            vec![
                "Milk is out of stock".to_string(),
                "Flour is no longer in your inventory".to_string(),
            ]
        );
    }
}

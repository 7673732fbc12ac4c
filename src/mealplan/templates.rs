use axum::{
    extract::{Path, Query, State},
    Json,
};
use time::{Date, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::repo::{MealTemplate, Repos};
use crate::state::AppState;

use super::dto::{
    ApplyTemplateRequest, ApplyTemplateResponse, DeleteTemplateResponse, SaveTemplateRequest,
    SaveTemplateResponse, TemplateQuery,
};
use super::{services, week};

/// POST /mealplan/templates — snapshot a week's meals under a name.
#[instrument(skip(state, body), fields(user_id = %body.user_id))]
pub async fn save_template(
    State(state): State<AppState>,
    Json(body): Json<SaveTemplateRequest>,
) -> ApiResult<Json<SaveTemplateResponse>> {
    let name = body.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err(ApiError::invalid("Template name is required"));
    }
    let meals = match body.meals {
        Some(meals) if !meals.is_empty() => meals,
        _ => return Err(ApiError::invalid("Meals payload is required")),
    };

    let template = MealTemplate {
        id: Uuid::new_v4(),
        user_id: body.user_id,
        name,
        meals,
        created_at: OffsetDateTime::now_utc(),
    };
    state.repos.templates.insert(&template).await?;
    Ok(Json(SaveTemplateResponse {
        id: template.id.to_string(),
        status: "saved",
    }))
}

/// GET /mealplan/templates?userId
#[instrument(skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> ApiResult<Json<Vec<MealTemplate>>> {
    let templates = state.repos.templates.list(&query.user_id).await?;
    Ok(Json(templates))
}

/// DELETE /mealplan/templates/id/{id}
#[instrument(skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteTemplateResponse>> {
    let template_id =
        Uuid::parse_str(&id).map_err(|_| ApiError::invalid("Invalid template id"))?;
    let deleted = state.repos.templates.delete(template_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Template not found"));
    }
    Ok(Json(DeleteTemplateResponse {
        status: "deleted",
        id,
    }))
}

/// POST /mealplan/templates/apply
#[instrument(skip(state, body), fields(user_id = %body.user_id))]
pub async fn apply_template(
    State(state): State<AppState>,
    Json(body): Json<ApplyTemplateRequest>,
) -> ApiResult<Json<ApplyTemplateResponse>> {
    let template_id =
        Uuid::parse_str(&body.template_id).map_err(|_| ApiError::invalid("Invalid template id"))?;

    let (week_start, warnings) = apply(
        &state.repos,
        template_id,
        &body.user_id,
        &body.week_start,
        OffsetDateTime::now_utc(),
    )
    .await?;

    info!(
        user_id = %body.user_id,
        template_id = %template_id,
        week_start = %week::format_date(week_start),
        warnings = warnings.len(),
        "template applied"
    );
    Ok(Json(ApplyTemplateResponse {
        status: "applied",
        message: format!("Template applied to week of {}", week::format_date(week_start)),
        warnings,
    }))
}

/// Apply a template onto the week containing `week_start_raw`: the target is
/// normalized to that week's Monday, the plan is upserted, the week is
/// re-projected (without planned-meal announcements), and the shortage pass
/// collects advisory warnings.
pub async fn apply(
    repos: &Repos,
    template_id: Uuid,
    user_id: &str,
    week_start_raw: &str,
    now: OffsetDateTime,
) -> ApiResult<(Date, Vec<String>)> {
    let week_start = week::monday_of(week::parse_week_start(week_start_raw)?);

    let template = repos
        .templates
        .find(template_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Template not found"))?;

    repos
        .plans
        .upsert_meals(user_id, week_start, &template.meals)
        .await?;
    services::project_week(repos.entries.as_ref(), user_id, week_start, &template.meals, now)
        .await?;

    let warnings = services::shortage_warnings(repos.inventory.as_ref(), &template.meals).await?;
    Ok((week_start, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{DayMeals, MealSlot, WeekMeals};
    use time::macros::{date, datetime};

    fn slot(name: &str) -> MealSlot {
        MealSlot {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn template_meals() -> WeekMeals {
        let mut meals = WeekMeals::new();
        meals.insert(
            "monday".to_string(),
            DayMeals {
                breakfast: Some(slot("Oats")),
                dinner: Some(slot("Stew")),
                ..Default::default()
            },
        );
        meals.insert(
            "friday".to_string(),
            DayMeals {
                lunch: Some(slot("Soup")),
                ..Default::default()
            },
        );
        meals
    }

    async fn saved_template(repos: &Repos) -> Uuid {
        let template = MealTemplate {
            id: Uuid::new_v4(),
            user_id: "me".to_string(),
            name: "Usual week".to_string(),
            meals: template_meals(),
            created_at: datetime!(2025-06-01 00:00 UTC),
        };
        repos.templates.insert(&template).await.unwrap();
        template.id
    }

    #[tokio::test]
    async fn apply_round_trips_meals_onto_the_target_week() {
        let repos = Repos::in_memory();
        let template_id = saved_template(&repos).await;
        let now = datetime!(2025-06-01 00:00 UTC);

        // 2025-06-11 is a Wednesday; the plan must land on Monday 2025-06-09.
        let (week_start, warnings) =
            apply(&repos, template_id, "me", "2025-06-11", now).await.unwrap();
        assert_eq!(week_start, date!(2025 - 06 - 09));
        assert!(warnings.is_empty());

        let plan = repos.plans.find("me", week_start).await.unwrap().unwrap();
        assert_eq!(plan.meals, template_meals());

        let mut entries = repos.entries.list_week("me", week_start).await.unwrap();
        entries.sort_by_key(|e| (e.date, e.slot.clone()));
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries
                .iter()
                .map(|e| (e.day.as_str(), e.slot.as_str(), e.date))
                .collect::<Vec<_>>(),
            vec![
                ("monday", "breakfast", date!(2025 - 06 - 09)),
                ("monday", "dinner", date!(2025 - 06 - 09)),
                ("friday", "lunch", date!(2025 - 06 - 13)),
            ]
        );
    }

    #[tokio::test]
    async fn apply_normalizes_timestamps_with_time_of_day() {
        let repos = Repos::in_memory();
        let template_id = saved_template(&repos).await;
        let now = datetime!(2025-06-01 00:00 UTC);

        let (week_start, _) =
            apply(&repos, template_id, "me", "2025-06-14T23:15:00.000Z", now).await.unwrap();
        // 2025-06-14 is a Saturday.
        assert_eq!(week_start, date!(2025 - 06 - 09));
    }

    #[tokio::test]
    async fn apply_replaces_whatever_the_week_held_before() {
        let repos = Repos::in_memory();
        let template_id = saved_template(&repos).await;
        let now = datetime!(2025-06-01 00:00 UTC);

        let mut previous = WeekMeals::new();
        previous.insert(
            "sunday".to_string(),
            DayMeals {
                snacks: Some(slot("Crisps")),
                ..Default::default()
            },
        );
        repos.plans.upsert_meals("me", date!(2025 - 06 - 09), &previous).await.unwrap();
        services::project_week(repos.entries.as_ref(), "me", date!(2025 - 06 - 09), &previous, now)
            .await
            .unwrap();

        apply(&repos, template_id, "me", "2025-06-09", now).await.unwrap();

        let entries = repos.entries.list_week("me", date!(2025 - 06 - 09)).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.day != "sunday"));
    }

    #[tokio::test]
    async fn apply_unknown_template_is_not_found() {
        let repos = Repos::in_memory();
        let err = apply(
            &repos,
            Uuid::new_v4(),
            "me",
            "2025-06-09",
            datetime!(2025-06-01 00:00 UTC),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn apply_emits_no_planned_meal_announcements() {
        let repos = Repos::in_memory();
        let template_id = saved_template(&repos).await;

        apply(&repos, template_id, "me", "2025-06-09", datetime!(2025-06-01 00:00 UTC))
            .await
            .unwrap();

        assert!(repos.notifications.list_desc().await.unwrap().is_empty());
    }
}

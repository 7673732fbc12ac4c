use axum::{
    extract::{Path, Query, State},
    Json,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::repo::{MealEntry, Recipe, WeekPlan};
use crate::state::AppState;

use super::dto::{
    CopyPlanRequest, CopyPlanResponse, CustomRecipeRequest, InsertedResponse, MessageResponse,
    SavePlanRequest, SavePlanResponse, SuggestedRecipeView, WeekQuery,
};
use super::{services, week};

/// GET /mealplan?weekStart&userId — fetch the week, creating the empty
/// skeleton on first access.
#[instrument(skip(state))]
pub async fn get_mealplan(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> ApiResult<Json<WeekPlan>> {
    let week_start = week::parse_week_start(&query.week_start)?;
    let plan = state.repos.plans.get_or_create(&query.user_id, week_start).await?;
    Ok(Json(plan))
}

/// PUT /mealplan — save the week, re-project its entries, announce each
/// planned meal.
#[instrument(skip(state, body), fields(user_id = %body.user_id))]
pub async fn save_mealplan(
    State(state): State<AppState>,
    Json(body): Json<SavePlanRequest>,
) -> ApiResult<Json<SavePlanResponse>> {
    let week_start = week::parse_week_start(&body.week_start)?;
    let now = OffsetDateTime::now_utc();

    let updated = state
        .repos
        .plans
        .upsert_meals(&body.user_id, week_start, &body.meals)
        .await?;

    let entries = services::project_week(
        state.repos.entries.as_ref(),
        &body.user_id,
        week_start,
        &body.meals,
        now,
    )
    .await?;
    services::announce_planned_meals(state.repos.notifications.as_ref(), &entries, now).await?;

    info!(
        user_id = %body.user_id,
        week_start = %week::format_date(week_start),
        entries = entries.len(),
        "meal plan saved"
    );
    Ok(Json(SavePlanResponse {
        status: "saved",
        modified: u64::from(updated),
        entries_saved: entries.len(),
    }))
}

/// GET /mealplan/entries/{user_id}/{week_start}
#[instrument(skip(state))]
pub async fn get_entries(
    State(state): State<AppState>,
    Path((user_id, week_start)): Path<(String, String)>,
) -> ApiResult<Json<Vec<MealEntry>>> {
    let week_start = week::parse_week_start(&week_start)?;
    let entries = state.repos.entries.list_week(&user_id, week_start).await?;
    Ok(Json(entries))
}

/// DELETE /mealplan/{user_id}/{week_start} — drops the plan and its projected
/// entries; the reconciler reclaims any reminders on its next cycle.
#[instrument(skip(state))]
pub async fn delete_mealplan(
    State(state): State<AppState>,
    Path((user_id, week_start)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let week_start = week::parse_week_start(&week_start)?;
    let deleted = state.repos.plans.delete(&user_id, week_start).await?;
    if !deleted {
        return Err(ApiError::not_found("Plan not found"));
    }
    state.repos.entries.delete_week(&user_id, week_start).await?;
    Ok(Json(MessageResponse {
        message: "Meal plan deleted",
    }))
}

/// POST /mealplan/copy — duplicate a week's meals into another week and
/// re-project the destination.
#[instrument(skip(state, body), fields(user_id = %body.user_id))]
pub async fn copy_mealplan(
    State(state): State<AppState>,
    Json(body): Json<CopyPlanRequest>,
) -> ApiResult<Json<CopyPlanResponse>> {
    let from = week::parse_week_start(&body.from_week_start)?;
    let to = week::parse_week_start(&body.to_week_start)?;

    let source = state
        .repos
        .plans
        .find(&body.user_id, from)
        .await?
        .ok_or_else(|| ApiError::not_found("Source week not found"))?;

    state
        .repos
        .plans
        .upsert_meals(&body.user_id, to, &source.meals)
        .await?;
    services::project_week(
        state.repos.entries.as_ref(),
        &body.user_id,
        to,
        &source.meals,
        OffsetDateTime::now_utc(),
    )
    .await?;

    let destination = state
        .repos
        .plans
        .find(&body.user_id, to)
        .await?
        .ok_or_else(|| ApiError::not_found("Destination week not found"))?;

    info!(
        user_id = %body.user_id,
        from = %week::format_date(from),
        to = %week::format_date(to),
        "meal plan copied"
    );
    Ok(Json(CopyPlanResponse {
        user_id: body.user_id,
        week_start: week::format_date(to),
        meals: source.meals,
        id: destination.id,
        status: "copied_and_saved",
    }))
}

/// GET /mealplan/generic — the curated catalog.
#[instrument(skip(state))]
pub async fn generic_recipes(State(state): State<AppState>) -> ApiResult<Json<Vec<Recipe>>> {
    let recipes = state.repos.recipes.list_generic().await?;
    Ok(Json(recipes))
}

/// GET /mealplan/suggested/{user_id} — catalog recipes the user can mostly
/// cook from what is on hand.
#[instrument(skip(state))]
pub async fn suggested_recipes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<SuggestedRecipeView>>> {
    let suggested = services::suggest_recipes(
        state.repos.recipes.as_ref(),
        state.repos.inventory.as_ref(),
        &user_id,
        state.config.suggestion_match_pct,
    )
    .await?;

    let views = suggested
        .into_iter()
        .map(|(recipe, m)| SuggestedRecipeView {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            ingredients: recipe.ingredients,
            matched_items: m.matched,
            missing_items: m.missing,
            match_pct: services::round2(m.match_pct),
        })
        .collect();
    Ok(Json(views))
}

/// POST /mealplan/custom
#[instrument(skip(state, body), fields(user_id = %body.user_id))]
pub async fn create_custom_recipe(
    State(state): State<AppState>,
    Json(body): Json<CustomRecipeRequest>,
) -> ApiResult<Json<InsertedResponse>> {
    let recipe = Recipe {
        id: Uuid::new_v4(),
        user_id: Some(body.user_id),
        name: body.name,
        ingredients: body.ingredients,
        instructions: body.instructions,
        image: body.image,
        category: body.category,
        created_at: OffsetDateTime::now_utc(),
    };
    state.repos.recipes.insert_custom(&recipe).await?;
    Ok(Json(InsertedResponse {
        inserted_id: recipe.id.to_string(),
    }))
}

/// GET /mealplan/custom/{user_id}
#[instrument(skip(state))]
pub async fn custom_recipes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Recipe>>> {
    let recipes = state.repos.recipes.list_custom(&user_id).await?;
    Ok(Json(recipes))
}

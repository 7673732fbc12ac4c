pub mod dto;
pub mod handlers;
pub mod services;
pub mod templates;
pub mod week;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/mealplan",
            get(handlers::get_mealplan).put(handlers::save_mealplan),
        )
        .route(
            "/mealplan/entries/:user_id/:week_start",
            get(handlers::get_entries),
        )
        .route("/mealplan/copy", post(handlers::copy_mealplan))
        .route(
            "/mealplan/:user_id/:week_start",
            delete(handlers::delete_mealplan),
        )
        .route("/mealplan/generic", get(handlers::generic_recipes))
        .route(
            "/mealplan/suggested/:user_id",
            get(handlers::suggested_recipes),
        )
        .route("/mealplan/custom", post(handlers::create_custom_recipe))
        .route("/mealplan/custom/:user_id", get(handlers::custom_recipes))
        .route(
            "/mealplan/templates",
            post(templates::save_template).get(templates::list_templates),
        )
        .route(
            "/mealplan/templates/id/:id",
            delete(templates::delete_template),
        )
        .route("/mealplan/templates/apply", post(templates::apply_template))
}

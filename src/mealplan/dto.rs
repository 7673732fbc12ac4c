use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repo::{Ingredient, WeekMeals};

pub fn default_user() -> String {
    "me".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekQuery {
    pub week_start: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

/// PUT /mealplan body. The frontend sends camelCase, older clients snake_case.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePlanRequest {
    #[serde(default = "default_user", alias = "user_id")]
    pub user_id: String,
    #[serde(alias = "week_start")]
    pub week_start: String,
    #[serde(default)]
    pub meals: WeekMeals,
}

#[derive(Debug, Serialize)]
pub struct SavePlanResponse {
    pub status: &'static str,
    pub modified: u64,
    pub entries_saved: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPlanRequest {
    #[serde(default = "default_user", alias = "user_id")]
    pub user_id: String,
    #[serde(alias = "from_week_start")]
    pub from_week_start: String,
    #[serde(alias = "to_week_start")]
    pub to_week_start: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPlanResponse {
    pub user_id: String,
    pub week_start: String,
    pub meals: WeekMeals,
    pub id: Uuid,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRecipeRequest {
    #[serde(default = "default_user", alias = "user_id")]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InsertedResponse {
    pub inserted_id: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestedRecipeView {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub matched_items: Vec<String>,
    pub missing_items: Vec<String>,
    pub match_pct: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateRequest {
    #[serde(default = "default_user", alias = "user_id")]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub meals: Option<WeekMeals>,
}

#[derive(Debug, Serialize)]
pub struct SaveTemplateResponse {
    pub id: String,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyTemplateRequest {
    #[serde(alias = "template_id")]
    pub template_id: String,
    #[serde(default = "default_user", alias = "user_id")]
    pub user_id: String,
    #[serde(alias = "week_start")]
    pub week_start: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyTemplateResponse {
    pub status: &'static str,
    pub message: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteTemplateResponse {
    pub status: &'static str,
    pub id: String,
}

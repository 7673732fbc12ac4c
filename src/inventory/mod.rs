pub mod handlers;
pub mod status;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(handlers::list_inventory))
        .route("/inventory/item", post(handlers::add_food_item))
        .route(
            "/inventory/item/:id",
            put(handlers::update_food_item).delete(handlers::delete_food_item),
        )
}

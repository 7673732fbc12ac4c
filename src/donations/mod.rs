pub mod handlers;
pub mod repo;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/donations", get(handlers::list_donations))
        // POST converts the inventory item whose id is in the path.
        .route(
            "/donations/:id",
            post(handlers::convert_to_donation)
                .get(handlers::get_donation)
                .delete(handlers::delete_donation),
        )
}

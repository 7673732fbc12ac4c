pub mod handlers;
pub mod presenter;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/:id/mark_read", post(handlers::mark_as_read))
        .route("/notifications/mark_all_read", post(handlers::mark_all_read))
        .route("/notifications/unread_count", get(handlers::unread_count))
}

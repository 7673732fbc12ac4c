mod app;
mod auth;
mod config;
mod donations;
mod error;
mod inventory;
mod mealplan;
mod notifications;
mod reminders;
mod repo;
mod state;

use crate::reminders::ReminderReconciler;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "ecoeats=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    // One reconciler per process, alive for the process lifetime.
    let _reconciler = ReminderReconciler::new(&state.repos, state.config.reminder_poll_secs).spawn();

    let app = app::build_app(state);
    app::serve(app).await
}

// Router wiring for the presentation layer
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    dashboard, dashboard_action, delete_dashboard_item, delete_view, duplicates, edit_dashboard_item, edit_view,
    find_duplicates, health_check, index, list_views, refresh_view, run_sandbox, sandbox, save_view,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(index))
        .route("/views", get(list_views).post(save_view))
        .route("/views/:name/delete", post(delete_view))
        .route("/views/:name/refresh", post(refresh_view))
        .route("/views/:name/edit", get(edit_view))
        .route("/duplicates", get(duplicates).post(find_duplicates))
        .route("/dashboard", get(dashboard).post(dashboard_action))
        .route("/dashboard/:id/delete", post(delete_dashboard_item))
        .route("/dashboard/:id/edit", get(edit_dashboard_item))
        .route("/sandbox", get(sandbox).post(run_sandbox))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/tabs/:id", get(handlers::tab_fragment))
        .route("/operations/transactions", post(handlers::add_transaction_form))
        .route("/operations/refresh", post(handlers::refresh_form))
        .route("/savings/records", post(handlers::savings_submit_form))
        .route("/savings/records/:id/edit", post(handlers::savings_edit_form))
        .route("/savings/records/:id/delete", post(handlers::savings_delete_form))
        .route("/savings/cancel-edit", post(handlers::savings_cancel_edit_form))
        .route("/savings/planner", post(handlers::planner_form))
        .route("/api/status", get(handlers::get_status))
        .route("/api/categories", get(handlers::get_categories))
        .route(
            "/api/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/api/refresh", post(handlers::refresh_transactions))
        .route("/api/operations", get(handlers::get_operations))
        .route("/api/analytics", get(handlers::get_analytics))
        .route("/api/savings", get(handlers::get_savings).post(handlers::create_savings))
        .route("/api/savings/:id", delete(handlers::delete_savings))
        .route("/api/savings/planner", post(handlers::plan_savings))
        .with_state(state)
}

pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::coach;
use crate::insights;
use crate::state::AppState;
use crate::store;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/session", post(store::handlers::handle_sign_in))
        .route(
            "/api/v1/session/:user_id",
            delete(store::handlers::handle_sign_out),
        )
        // Journal
        .route(
            "/api/v1/journal",
            get(store::handlers::handle_list_entries).post(store::handlers::handle_create_entry),
        )
        .route(
            "/api/v1/journal/:id",
            patch(store::handlers::handle_update_entry)
                .delete(store::handlers::handle_delete_entry),
        )
        // Reminders
        .route(
            "/api/v1/reminders",
            get(store::handlers::handle_list_reminders)
                .post(store::handlers::handle_create_reminder),
        )
        .route(
            "/api/v1/reminders/:id",
            patch(store::handlers::handle_update_reminder)
                .delete(store::handlers::handle_delete_reminder),
        )
        // Insights
        .route(
            "/api/v1/insights",
            get(insights::handlers::handle_list_insights),
        )
        .route(
            "/api/v1/insights/generate",
            post(insights::handlers::handle_generate_insight),
        )
        .route(
            "/api/v1/insights/recommend",
            post(insights::handlers::handle_recommend_actions),
        )
        // Coach chat
        .route("/api/v1/chat", post(coach::handlers::handle_chat))
        .with_state(state)
}

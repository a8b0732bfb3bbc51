pub mod auth;
pub mod callables;
pub mod codes;
pub mod companies;
pub mod entries;
pub mod extract;
pub mod middleware;
pub mod progress;
pub mod rest;
pub mod state;
pub mod users;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
use state::AppState;

/// Builds the API router with every route wired to the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required). The callables check the session themselves.
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/code-login", post(auth::code_login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/functions/createTrainer", post(callables::create_trainer_handler))
        .route("/functions/createApprentice", post(callables::create_apprentice_handler))
        .route("/functions/deleteUser", post(callables::delete_user_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/companies",
            get(companies::list_companies_handler).post(companies::create_company_handler),
        )
        .route(
            "/companies/{id}",
            put(companies::update_company_handler).delete(companies::delete_company_handler),
        )
        .route("/users", get(users::list_users_handler))
        .route("/trainers/{id}/apprentices", get(users::trainer_apprentices_handler))
        .route("/codes", get(codes::list_codes_handler).post(codes::issue_code_handler))
        .route("/codes/{code}", delete(codes::revoke_code_handler))
        .route(
            "/entries",
            get(entries::list_entries_handler).put(entries::submit_entry_handler),
        )
        .route("/entries/{id}", delete(entries::delete_entry_handler))
        .route("/entries/{id}/note", put(entries::set_note_handler))
        .route("/apprentices/{id}/statistics", get(progress::statistics_handler))
        .route("/apprentices/{id}/report", get(progress::report_handler))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

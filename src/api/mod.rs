pub mod auth;
pub mod error;
mod exercises;
mod lessons;
pub mod validation;

pub use error::ApiError;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Protected routes; auth is enforced by the User extractor on every
    // handler, so an invalid token never reaches a query
    let api_routes = Router::new()
        .route("/userdetail", get(auth::user_details))
        .route("/logout", post(auth::logout))
        // Lessons
        .route("/lessons", get(lessons::list_lessons))
        .route("/lessons", post(lessons::create_lesson))
        .route("/lessons/search/by", get(lessons::search_lessons))
        .route("/lessons/:id", get(lessons::get_lesson))
        .route("/lessons/:id", put(lessons::update_lesson))
        .route("/lessons/:id", delete(lessons::delete_lesson))
        // Exercises (no update/delete routes by design)
        .route("/exercises", get(exercises::list_exercises))
        .route("/exercises", post(exercises::create_exercise))
        .route("/exercises/search/by", get(exercises::search_exercises))
        .route("/exercises/assign-points", post(exercises::assign_points))
        .route("/exercises/:id", get(exercises::get_exercise));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", auth_routes.merge(api_routes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

//! HTTP surface.

mod auth;
mod error;
mod extract;
mod leads;
mod state;
mod users;

use axum::Router;
use axum::routing::{get, post, put};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, FieldError};
pub use extract::{AdminUser, ApiJson, ApiPath, ApiQuery, AuthUser};
pub use state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/leads", post(leads::create).get(leads::list))
        .route("/leads/:id", get(leads::get).put(leads::update))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/users", get(users::list))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/pending-count", get(users::pending_count))
        .route("/users/:id/approve", put(users::approve))
        .route("/users/:id/reject", put(users::reject));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
}

async fn healthz() -> axum::Json<Health> {
    axum::Json(Health { status: "ok" })
}

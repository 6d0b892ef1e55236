use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{error::ErrorBody, state::AppState};

pub mod admin;
pub mod auth;
pub mod doc;
pub mod extract;
pub mod health;
pub mod menu;
pub mod orders;
pub mod params;
pub mod staff;
pub mod user;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", user::router())
        .nest("/orders", orders::router())
        .nest("/staff", staff::router())
        .nest("/menu", menu::router())
        .nest("/admin", admin::router())
}

/// Every route with state bound; HTTP edge layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("Route {} not found", uri.path()),
        }),
    )
}

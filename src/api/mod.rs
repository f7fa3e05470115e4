use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenIssuer;
use crate::config::{Config, SecurityConfig};
use crate::db::Store;

pub mod auth;
mod calculations;
mod error;
mod extract;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub store: Store,

    pub tokens: TokenIssuer,

    pub security: SecurityConfig,
}

pub async fn create_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let tokens = TokenIssuer::new(&config.auth.token_secret, config.auth.token_ttl_minutes);

    Ok(Arc::new(AppState {
        store,
        tokens,
        security: config.security.clone(),
    }))
}

pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let protected_routes = create_protected_router(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(protected_routes)
        .route("/users/register", post(users::register))
        .route("/users/login", post(auth::login))
        .route("/users/{id}", get(users::get_user))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", put(users::update_me))
        .route("/users/me/password", post(auth::change_password))
        .route("/calculations", post(calculations::create_calculation))
        .route("/calculations", get(calculations::list_calculations))
        .route("/calculations/{id}", get(calculations::get_calculation))
        .route("/calculations/{id}", put(calculations::update_calculation))
        .route(
            "/calculations/{id}",
            delete(calculations::delete_calculation),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<MessageResponse>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::internal(format!("Database unreachable: {e}")))?;

    Ok(Json(MessageResponse {
        message: "ok".to_string(),
    }))
}

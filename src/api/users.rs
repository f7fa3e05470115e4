use axum::{Extension, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::{Json, Path};
use super::{ApiError, AppState, UserDto, validation};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// POST /users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let username = validation::validate_username(&payload.username)?;
    let email = validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;

    let user = state
        .store
        .register_user(username, email, &payload.password, &state.security)
        .await?;

    tracing::info!("User registered: {}", user.username);

    Ok(Json(UserDto::from(user)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .store
        .get_user_by_id(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(UserDto::from(user)))
}

/// PUT /users/me
/// Update the authenticated user's profile fields
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserDto>, ApiError> {
    if payload.username.is_none() && payload.email.is_none() {
        return Err(ApiError::validation("No fields to update"));
    }

    let username = payload
        .username
        .as_deref()
        .map(validation::validate_username)
        .transpose()?;

    let email = payload
        .email
        .as_deref()
        .map(validation::validate_email)
        .transpose()?;

    let user = state
        .store
        .update_user_profile(current_user.id, username, email)
        .await?;

    tracing::info!("Profile updated for user: {}", user.username);

    Ok(Json(UserDto::from(user)))
}

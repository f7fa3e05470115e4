use axum::{Extension, extract::State};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::{Json, Path, Query};
use super::{ApiError, AppState, CalculationDto, MessageResponse, validation};
use crate::operations::Operation;

#[derive(Deserialize)]
pub struct CalculationRequest {
    /// Operation tag, e.g. "Add". Accepted as a plain string so an unknown
    /// tag gets the normal validation error body instead of a decode failure.
    #[serde(rename = "type")]
    pub operation: String,
    pub a: i64,
    pub b: i64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    100
}

fn parse_operation(tag: &str) -> Result<Operation, ApiError> {
    Operation::from_str(tag)
        .map_err(|_| ApiError::validation(format!("Invalid calculation type: {}", tag)))
}

/// POST /calculations
pub async fn create_calculation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CalculationRequest>,
) -> Result<Json<CalculationDto>, ApiError> {
    let operation = parse_operation(&payload.operation)?;

    let calc = state
        .store
        .create_calculation(current_user.id, payload.a, payload.b, operation)
        .await?;

    tracing::debug!(
        "Calculation {} created for user {}",
        calc.id,
        current_user.id
    );

    Ok(Json(CalculationDto::from(calc)))
}

/// GET /calculations
pub async fn list_calculations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CalculationDto>>, ApiError> {
    let limit = validation::validate_limit(query.limit)?;

    let calcs = state
        .store
        .list_calculations(current_user.id, query.skip, limit)
        .await?;

    Ok(Json(calcs.into_iter().map(CalculationDto::from).collect()))
}

/// GET /calculations/{id}
pub async fn get_calculation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<CalculationDto>, ApiError> {
    let calc = state.store.get_calculation(current_user.id, id).await?;

    Ok(Json(CalculationDto::from(calc)))
}

/// PUT /calculations/{id}
pub async fn update_calculation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<CalculationRequest>,
) -> Result<Json<CalculationDto>, ApiError> {
    let operation = parse_operation(&payload.operation)?;

    let calc = state
        .store
        .update_calculation(current_user.id, id, payload.a, payload.b, operation)
        .await?;

    Ok(Json(CalculationDto::from(calc)))
}

/// DELETE /calculations/{id}
pub async fn delete_calculation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete_calculation(current_user.id, id).await?;

    tracing::debug!("Calculation {} deleted by user {}", id, current_user.id);

    Ok(Json(MessageResponse {
        message: format!("Calculation {id} deleted"),
    }))
}

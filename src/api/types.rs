use serde::Serialize;

use crate::db::{Calculation, User};

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i32,
}

#[derive(Debug, Serialize)]
pub struct CalculationDto {
    pub id: i32,
    #[serde(rename = "type")]
    pub operation: String,
    pub a: i64,
    pub b: i64,
    pub result: i64,
    pub user_id: i32,
    pub created_at: String,
}

impl From<Calculation> for CalculationDto {
    fn from(calc: Calculation) -> Self {
        Self {
            id: calc.id,
            operation: calc.operation.as_str().to_string(),
            a: calc.a,
            b: calc.b,
            result: calc.result,
            user_id: calc.user_id,
            created_at: calc.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

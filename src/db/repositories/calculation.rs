use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use thiserror::Error;

use crate::entities::calculations;
use crate::operations::{Operation, OperationError};

#[derive(Debug, Error)]
pub enum CalculationStoreError {
    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error("Calculation not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct Calculation {
    pub id: i32,
    pub a: i64,
    pub b: i64,
    pub operation: Operation,
    pub result: i64,
    pub user_id: i32,
    pub created_at: String,
}

impl TryFrom<calculations::Model> for Calculation {
    type Error = anyhow::Error;

    fn try_from(model: calculations::Model) -> Result<Self> {
        let operation = model
            .operation
            .parse::<Operation>()
            .with_context(|| format!("Corrupt operation tag in row {}", model.id))?;

        Ok(Self {
            id: model.id,
            a: model.a,
            b: model.b,
            operation,
            result: model.result,
            user_id: model.user_id,
            created_at: model.created_at,
        })
    }
}

/// Owner-scoped CRUD over calculation rows.
///
/// Every lookup filters on `user_id`, so a row belonging to another user is
/// indistinguishable from one that does not exist.
pub struct CalculationRepository {
    conn: DatabaseConnection,
}

impl CalculationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a calculation. The result is computed here, before persistence,
    /// so an invalid operation (divide by zero, overflow) never reaches a row.
    pub async fn create(
        &self,
        user_id: i32,
        a: i64,
        b: i64,
        operation: Operation,
    ) -> Result<Calculation, CalculationStoreError> {
        let result = operation.evaluate(a, b)?;
        let now = chrono::Utc::now().to_rfc3339();

        let active = calculations::ActiveModel {
            a: Set(a),
            b: Set(b),
            operation: Set(operation.as_str().to_string()),
            result: Set(result),
            user_id: Set(user_id),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert calculation")?;

        Ok(Calculation::try_from(model)?)
    }

    pub async fn get_for_user(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Calculation, CalculationStoreError> {
        let model = calculations::Entity::find_by_id(id)
            .filter(calculations::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query calculation")?
            .ok_or(CalculationStoreError::NotFound)?;

        Ok(Calculation::try_from(model)?)
    }

    /// List the user's calculations in creation (id) order.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Calculation>, CalculationStoreError> {
        let models = calculations::Entity::find()
            .filter(calculations::Column::UserId.eq(user_id))
            .order_by_asc(calculations::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list calculations")?;

        let mut rows = Vec::with_capacity(models.len());
        for model in models {
            rows.push(Calculation::try_from(model)?);
        }

        Ok(rows)
    }

    /// Replace operands and operation, recomputing the result.
    pub async fn update_for_user(
        &self,
        user_id: i32,
        id: i32,
        a: i64,
        b: i64,
        operation: Operation,
    ) -> Result<Calculation, CalculationStoreError> {
        let model = calculations::Entity::find_by_id(id)
            .filter(calculations::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query calculation for update")?
            .ok_or(CalculationStoreError::NotFound)?;

        let result = operation.evaluate(a, b)?;

        let mut active: calculations::ActiveModel = model.into();
        active.a = Set(a);
        active.b = Set(b);
        active.operation = Set(operation.as_str().to_string());
        active.result = Set(result);

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update calculation")?;

        Ok(Calculation::try_from(updated)?)
    }

    pub async fn delete_for_user(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<(), CalculationStoreError> {
        let outcome = calculations::Entity::delete_many()
            .filter(calculations::Column::Id.eq(id))
            .filter(calculations::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete calculation")?;

        if outcome.rows_affected == 0 {
            return Err(CalculationStoreError::NotFound);
        }

        Ok(())
    }
}

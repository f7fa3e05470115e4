use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::operations::Operation;

pub mod migrator;
pub mod repositories;

pub use repositories::calculation::{Calculation, CalculationStoreError};
pub use repositories::user::{User, UserStoreError};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn calculation_repo(&self) -> repositories::calculation::CalculationRepository {
        repositories::calculation::CalculationRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn register_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User, UserStoreError> {
        self.user_repo()
            .create(username, email, password, security)
            .await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_login(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn verify_user_password(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(id, password).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, UserStoreError> {
        self.user_repo().update_profile(id, username, email).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    // ========== Calculations ==========

    pub async fn create_calculation(
        &self,
        user_id: i32,
        a: i64,
        b: i64,
        operation: Operation,
    ) -> Result<Calculation, CalculationStoreError> {
        self.calculation_repo().create(user_id, a, b, operation).await
    }

    pub async fn get_calculation(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Calculation, CalculationStoreError> {
        self.calculation_repo().get_for_user(user_id, id).await
    }

    pub async fn list_calculations(
        &self,
        user_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Calculation>, CalculationStoreError> {
        self.calculation_repo()
            .list_for_user(user_id, skip, limit)
            .await
    }

    pub async fn update_calculation(
        &self,
        user_id: i32,
        id: i32,
        a: i64,
        b: i64,
        operation: Operation,
    ) -> Result<Calculation, CalculationStoreError> {
        self.calculation_repo()
            .update_for_user(user_id, id, a, b, operation)
            .await
    }

    pub async fn delete_calculation(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<(), CalculationStoreError> {
        self.calculation_repo().delete_for_user(user_id, id).await
    }
}

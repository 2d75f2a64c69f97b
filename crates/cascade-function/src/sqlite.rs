use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{FunctionError, FunctionLifecycle, ServerlessFunction};

/// SQLite-based function lifecycle service.
#[derive(Clone)]
pub struct SqliteFunctionStore {
  pool: SqlitePool,
}

impl SqliteFunctionStore {
  /// Create a new function store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), FunctionError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }

  /// Insert a function.
  pub async fn create_function(&self, function: &ServerlessFunction) -> Result<(), FunctionError> {
    sqlx::query(
      r#"
            INSERT INTO serverless_functions (id, workspace_id, name, created_at, deleted_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
    )
    .bind(&function.id)
    .bind(&function.workspace_id)
    .bind(&function.name)
    .bind(function.created_at)
    .bind(function.deleted_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  /// Get a function of a workspace, optionally including a soft-deleted one.
  pub async fn get_function(
    &self,
    function_id: &str,
    workspace_id: &str,
    with_deleted: bool,
  ) -> Result<Option<ServerlessFunction>, FunctionError> {
    let function: Option<ServerlessFunction> = sqlx::query_as(
      r#"
            SELECT id, workspace_id, name, created_at, deleted_at
            FROM serverless_functions
            WHERE id = ? AND workspace_id = ?
            "#,
    )
    .bind(function_id)
    .bind(workspace_id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(function.filter(|f| with_deleted || !f.is_soft_deleted()))
  }

  async fn exists(&self, function_id: &str) -> Result<bool, FunctionError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM serverless_functions WHERE id = ?")
      .bind(function_id)
      .fetch_optional(&self.pool)
      .await?;

    Ok(row.is_some())
  }
}

#[async_trait]
impl FunctionLifecycle for SqliteFunctionStore {
  async fn soft_delete(&self, function_id: &str, workspace_id: &str) -> Result<(), FunctionError> {
    let function = self
      .get_function(function_id, workspace_id, true)
      .await?
      .ok_or_else(|| FunctionError::NotFound {
        function_id: function_id.to_string(),
      })?;

    if function.is_soft_deleted() {
      debug!(function_id = %function_id, "function_already_soft_deleted");
      return Ok(());
    }

    sqlx::query(
      r#"
            UPDATE serverless_functions
            SET deleted_at = ?
            WHERE id = ? AND workspace_id = ? AND deleted_at IS NULL
            "#,
    )
    .bind(Utc::now())
    .bind(function_id)
    .bind(workspace_id)
    .execute(&self.pool)
    .await?;

    info!(function_id = %function_id, workspace_id = %workspace_id, "function_soft_deleted");
    Ok(())
  }

  async fn restore(&self, function_id: &str) -> Result<(), FunctionError> {
    let result = sqlx::query(
      r#"
            UPDATE serverless_functions
            SET deleted_at = NULL
            WHERE id = ? AND deleted_at IS NOT NULL
            "#,
    )
    .bind(function_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 && !self.exists(function_id).await? {
      return Err(FunctionError::NotFound {
        function_id: function_id.to_string(),
      });
    }

    info!(function_id = %function_id, "function_restored");
    Ok(())
  }

  async fn permanent_delete(
    &self,
    function_id: &str,
    workspace_id: &str,
  ) -> Result<(), FunctionError> {
    let result = sqlx::query("DELETE FROM serverless_functions WHERE id = ? AND workspace_id = ?")
      .bind(function_id)
      .bind(workspace_id)
      .execute(&self.pool)
      .await?;

    if result.rows_affected() == 0 {
      return Err(FunctionError::NotFound {
        function_id: function_id.to_string(),
      });
    }

    info!(function_id = %function_id, workspace_id = %workspace_id, "function_destroyed");
    Ok(())
  }
}

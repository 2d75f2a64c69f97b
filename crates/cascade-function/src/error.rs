use thiserror::Error;

/// Errors returned by the function lifecycle service.
#[derive(Debug, Error)]
pub enum FunctionError {
  /// No function with this id exists in the addressed scope.
  #[error("serverless function not found: {function_id}")]
  NotFound { function_id: String },

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Applying the embedded migrations failed.
  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

impl FunctionError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, FunctionError::NotFound { .. })
  }
}

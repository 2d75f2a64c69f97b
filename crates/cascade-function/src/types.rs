use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A serverless function as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ServerlessFunction {
  pub id: String,
  pub workspace_id: String,
  pub name: String,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl ServerlessFunction {
  pub fn is_soft_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }
}

//! Cascade Function
//!
//! Serverless functions are owned outside the workflow tables: a code step
//! only stores the function id. This crate provides the lifecycle service the
//! cascade uses to soft-delete, restore and permanently delete those functions.

mod error;
mod sqlite;
mod types;

pub use error::FunctionError;
pub use sqlite::SqliteFunctionStore;
pub use types::ServerlessFunction;

use async_trait::async_trait;

/// Lifecycle service for serverless functions.
#[async_trait]
pub trait FunctionLifecycle: Send + Sync {
  /// Soft-delete a function of the workspace.
  ///
  /// Fails with [`FunctionError::NotFound`] when the workspace has no function
  /// with that id, soft-deleted or not. Soft-deleting a function twice is not
  /// an error.
  async fn soft_delete(&self, function_id: &str, workspace_id: &str) -> Result<(), FunctionError>;

  /// Restore a soft-deleted function.
  ///
  /// The function is addressed by id only; the service resolves its
  /// workspace itself.
  async fn restore(&self, function_id: &str) -> Result<(), FunctionError>;

  /// Permanently delete a function of the workspace, soft-deleted or not.
  async fn permanent_delete(
    &self,
    function_id: &str,
    workspace_id: &str,
  ) -> Result<(), FunctionError>;
}

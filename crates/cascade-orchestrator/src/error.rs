//! Cascade error types.

use cascade_function::FunctionError;
use cascade_store::StoreError;

use crate::operation::CascadeOperation;

/// Errors that can occur while cascading a lifecycle operation.
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
  /// Required identifying context was missing or empty.
  #[error("invalid input: {message}")]
  Validation { message: String },

  /// A dependent collection accessor failed.
  #[error("store error: {0}")]
  Store(#[from] StoreError),

  /// The function lifecycle service failed for one function.
  #[error("failed to {operation} serverless function '{function_id}': {source}")]
  Function {
    function_id: String,
    operation: CascadeOperation,
    #[source]
    source: FunctionError,
  },

  /// The requested workflow version does not exist or is soft-deleted.
  #[error("workflow version not found: {version_id}")]
  VersionNotFound { version_id: String },
}

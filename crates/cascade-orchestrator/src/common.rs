use std::sync::Arc;

use cascade_store::{CollectionProvider, WorkflowVersion};

use crate::error::CascadeError;

/// Lookups shared by the workflow entry points.
pub struct WorkflowCommon {
  collections: Arc<dyn CollectionProvider>,
}

impl WorkflowCommon {
  pub fn new(collections: Arc<dyn CollectionProvider>) -> Self {
    Self { collections }
  }

  /// Fetch an active workflow version, failing if the id is empty or the
  /// version is missing or soft-deleted.
  pub async fn get_version_or_fail(
    &self,
    workspace_id: &str,
    version_id: &str,
  ) -> Result<WorkflowVersion, CascadeError> {
    if version_id.is_empty() {
      return Err(CascadeError::Validation {
        message: "workflow version id is required".to_string(),
      });
    }

    let collections = self.collections.collections(workspace_id).await?;

    collections
      .versions
      .find_one(version_id)
      .await?
      .ok_or_else(|| CascadeError::VersionNotFound {
        version_id: version_id.to_string(),
      })
  }
}

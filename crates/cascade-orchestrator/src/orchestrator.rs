//! Cascade orchestrator.
//!
//! The [`CascadeOrchestrator`] is the main entry point for propagating a
//! workflow lifecycle event. It owns its dependencies explicitly (a collection
//! provider and a function lifecycle service) and provides
//! `handle_sub_entities(workflow_ids, workspace_id, operation)`.

use std::sync::Arc;

use cascade_config::{CascadeOptions, DestroyPolicy};
use cascade_function::FunctionLifecycle;
use cascade_store::{CollectionProvider, Collections, EntityKind, ParentFilter};
use tracing::{debug, error, info, instrument};

use crate::error::CascadeError;
use crate::nested::NestedCascade;
use crate::operation::CascadeOperation;

/// Services the orchestrator drives.
#[derive(Clone)]
pub struct CascadeDeps {
  /// Workspace-scoped accessors for triggers, runs and versions.
  pub collections: Arc<dyn CollectionProvider>,
  /// Lifecycle service for functions referenced from code steps.
  pub functions: Arc<dyn FunctionLifecycle>,
}

/// Propagates workflow lifecycle events to dependent entities.
///
/// Workflows are processed one after another. All effects for one workflow
/// are applied before the next one starts; a failure stops the cascade and
/// leaves already processed workflows as they are.
pub struct CascadeOrchestrator {
  deps: CascadeDeps,
  options: CascadeOptions,
}

impl CascadeOrchestrator {
  pub fn new(deps: CascadeDeps, options: CascadeOptions) -> Self {
    Self { deps, options }
  }

  /// Apply `operation` to everything the given workflows own.
  ///
  /// - Delete: soft-delete automated triggers, runs, versions, then the
  ///   referenced functions.
  /// - Restore: restore the same, in the same order.
  /// - Destroy: permanently delete the referenced functions. Rows are only
  ///   removed as well under [`DestroyPolicy::FunctionsAndRows`].
  ///
  /// An empty `workflow_ids` is a no-op. The first failure is returned and
  /// the cascade may then be partially applied.
  #[instrument(
    name = "cascade",
    skip(self, workflow_ids),
    fields(
      workspace_id = %workspace_id,
      operation = %operation,
      workflows = workflow_ids.len(),
    )
  )]
  pub async fn handle_sub_entities(
    &self,
    workflow_ids: &[String],
    workspace_id: &str,
    operation: CascadeOperation,
  ) -> Result<(), CascadeError> {
    if workflow_ids.is_empty() {
      debug!("cascade_skipped");
      return Ok(());
    }

    let collections = self.deps.collections.collections(workspace_id).await?;

    for workflow_id in workflow_ids {
      info!(workflow_id = %workflow_id, "cascade_started");

      let result = self
        .cascade_workflow(&collections, workflow_id, workspace_id, operation)
        .await;

      match &result {
        Ok(functions) => {
          info!(workflow_id = %workflow_id, functions, "cascade_completed");
        }
        Err(e) => {
          error!(workflow_id = %workflow_id, error = %e, "cascade_failed");
        }
      }

      result?;
    }

    Ok(())
  }

  /// Cascade one workflow. Returns the number of functions touched.
  async fn cascade_workflow(
    &self,
    collections: &Collections,
    workflow_id: &str,
    workspace_id: &str,
    operation: CascadeOperation,
  ) -> Result<usize, CascadeError> {
    let filter = ParentFilter::new(workflow_id);
    let nested = NestedCascade {
      functions: self.deps.functions.as_ref(),
      dispatch: self.options.nested_dispatch,
    };

    match operation {
      CascadeOperation::Delete | CascadeOperation::Restore => {
        self
          .apply_to_collections(collections, &filter, operation)
          .await?;

        nested
          .apply(collections.versions.as_ref(), &filter, workspace_id, operation)
          .await
      }
      CascadeOperation::Destroy => {
        // Functions first: once versions are erased their steps are gone.
        let functions = nested
          .apply(collections.versions.as_ref(), &filter, workspace_id, operation)
          .await?;

        if self.options.destroy_policy == DestroyPolicy::FunctionsAndRows {
          self
            .apply_to_collections(collections, &filter, operation)
            .await?;
        }

        Ok(functions)
      }
    }
  }

  async fn apply_to_collections(
    &self,
    collections: &Collections,
    filter: &ParentFilter,
    operation: CascadeOperation,
  ) -> Result<(), CascadeError> {
    for kind in EntityKind::CASCADE_ORDER {
      let collection = collections.get(kind);

      let affected = match operation {
        CascadeOperation::Delete => collection.soft_delete(filter).await?,
        CascadeOperation::Restore => collection.restore(filter).await?,
        CascadeOperation::Destroy => collection.permanent_delete(filter).await?,
      };

      debug!(
        kind = %kind,
        workflow_id = %filter.workflow_id,
        affected,
        "collection_cascaded"
      );
    }

    Ok(())
  }
}

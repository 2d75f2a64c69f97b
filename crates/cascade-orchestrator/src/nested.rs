//! Nested function sub-cascade.
//!
//! Code steps reference serverless functions by id. When a workflow changes
//! lifecycle state, every function referenced from any of its versions
//! (soft-deleted versions included) follows it.

use std::collections::HashSet;

use cascade_config::NestedDispatch;
use cascade_function::FunctionLifecycle;
use cascade_store::{ParentFilter, VersionCollection, WorkflowVersion};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::CascadeError;
use crate::operation::CascadeOperation;

/// Applies an operation to the functions referenced by a workflow's versions.
pub(crate) struct NestedCascade<'a> {
  pub functions: &'a dyn FunctionLifecycle,
  pub dispatch: NestedDispatch,
}

impl NestedCascade<'_> {
  /// Run the sub-cascade for one workflow.
  ///
  /// Returns the number of functions the operation was applied to.
  pub async fn apply(
    &self,
    versions: &dyn VersionCollection,
    filter: &ParentFilter,
    workspace_id: &str,
    operation: CascadeOperation,
  ) -> Result<usize, CascadeError> {
    let found = versions.find(filter, true).await?;
    let function_ids = referenced_functions(&found);

    debug!(
      workflow_id = %filter.workflow_id,
      versions = found.len(),
      functions = function_ids.len(),
      "nested_cascade_started"
    );

    if function_ids.is_empty() {
      return Ok(0);
    }

    match self.dispatch {
      NestedDispatch::Sequential => {
        for function_id in &function_ids {
          self.apply_one(function_id, workspace_id, operation).await?;
        }
      }
      NestedDispatch::Concurrent { .. } => {
        let calls: Vec<_> = function_ids
          .iter()
          .map(|function_id| self.apply_one(function_id, workspace_id, operation))
          .collect();
        let results: Vec<Result<(), CascadeError>> = stream::iter(calls)
          .buffer_unordered(self.dispatch.max_in_flight())
          .collect()
          .await;

        let failures = results.iter().filter(|r| r.is_err()).count();
        if let Some(first) = results.into_iter().find_map(Result::err) {
          if failures > 1 {
            warn!(
              workflow_id = %filter.workflow_id,
              failures,
              "nested_cascade_multiple_failures"
            );
          }
          return Err(first);
        }
      }
    }

    Ok(function_ids.len())
  }

  async fn apply_one(
    &self,
    function_id: &str,
    workspace_id: &str,
    operation: CascadeOperation,
  ) -> Result<(), CascadeError> {
    let result = match operation {
      CascadeOperation::Delete => self.functions.soft_delete(function_id, workspace_id).await,
      CascadeOperation::Restore => self.functions.restore(function_id).await,
      CascadeOperation::Destroy => {
        self
          .functions
          .permanent_delete(function_id, workspace_id)
          .await
      }
    };

    match result {
      Ok(()) => Ok(()),
      // Already gone: the goal state of a destroy.
      Err(e) if operation == CascadeOperation::Destroy && e.is_not_found() => {
        debug!(function_id = %function_id, "function_already_destroyed");
        Ok(())
      }
      Err(source) => Err(CascadeError::Function {
        function_id: function_id.to_string(),
        operation,
        source,
      }),
    }
  }
}

/// Function ids referenced by code steps, in version then step order, each
/// listed once.
pub(crate) fn referenced_functions(versions: &[WorkflowVersion]) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut function_ids = Vec::new();

  for version in versions {
    for step in version.steps().iter().filter(|s| s.is_code()) {
      match step.function_id() {
        Some(function_id) => {
          if seen.insert(function_id) {
            function_ids.push(function_id.to_string());
          }
        }
        None => {
          warn!(
            version_id = %version.id,
            step_id = %step.id,
            "code_step_without_function"
          );
        }
      }
    }
  }

  function_ids
}

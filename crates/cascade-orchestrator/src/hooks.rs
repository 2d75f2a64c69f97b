//! Entry-point hooks.
//!
//! The query layer calls these around workflow mutations. Each hook checks
//! that the request carries a workspace and hands the affected workflow ids to
//! the [`CascadeOrchestrator`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CascadeError;
use crate::operation::CascadeOperation;
use crate::orchestrator::CascadeOrchestrator;

/// The workspace a request runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
  pub id: String,
}

/// Identity attached to a request. Authorization happens upstream; hooks only
/// need the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
  pub workspace: Option<Workspace>,
}

impl AuthContext {
  pub fn for_workspace(workspace_id: impl Into<String>) -> Self {
    Self {
      workspace: Some(Workspace {
        id: workspace_id.into(),
      }),
    }
  }
}

/// Fail with a validation error unless the request carries a workspace.
pub fn require_workspace(auth: &AuthContext) -> Result<&Workspace, CascadeError> {
  auth
    .workspace
    .as_ref()
    .filter(|w| !w.id.is_empty())
    .ok_or_else(|| CascadeError::Validation {
      message: "workspace is required".to_string(),
    })
}

/// Whether a hook runs before or after the query it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
  PreHook,
  PostHook,
}

/// A workflow record returned by a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
  pub id: String,
}

/// Arguments of a destroy-one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyOneArgs {
  pub id: String,
}

/// A hook attached to a workflow query.
#[async_trait]
pub trait WorkflowQueryHook: Send + Sync {
  type Payload: Send + 'static;
  type Output: Send;

  /// Query key, e.g. `workflow.deleteMany`.
  const KEY: &'static str;
  const HOOK_TYPE: HookType;

  async fn execute(
    &self,
    auth: &AuthContext,
    payload: Self::Payload,
  ) -> Result<Self::Output, CascadeError>;
}

/// Soft-deletes what deleted workflows own.
pub struct WorkflowDeleteManyPostHook {
  orchestrator: Arc<CascadeOrchestrator>,
}

impl WorkflowDeleteManyPostHook {
  pub fn new(orchestrator: Arc<CascadeOrchestrator>) -> Self {
    Self { orchestrator }
  }
}

#[async_trait]
impl WorkflowQueryHook for WorkflowDeleteManyPostHook {
  type Payload = Vec<WorkflowRecord>;
  type Output = ();

  const KEY: &'static str = "workflow.deleteMany";
  const HOOK_TYPE: HookType = HookType::PostHook;

  async fn execute(
    &self,
    auth: &AuthContext,
    payload: Vec<WorkflowRecord>,
  ) -> Result<(), CascadeError> {
    let workspace = require_workspace(auth)?;
    let workflow_ids: Vec<String> = payload.into_iter().map(|w| w.id).collect();

    self
      .orchestrator
      .handle_sub_entities(&workflow_ids, &workspace.id, CascadeOperation::Delete)
      .await
  }
}

/// Restores what restored workflows own.
pub struct WorkflowRestoreManyPostHook {
  orchestrator: Arc<CascadeOrchestrator>,
}

impl WorkflowRestoreManyPostHook {
  pub fn new(orchestrator: Arc<CascadeOrchestrator>) -> Self {
    Self { orchestrator }
  }
}

#[async_trait]
impl WorkflowQueryHook for WorkflowRestoreManyPostHook {
  type Payload = Vec<WorkflowRecord>;
  type Output = ();

  const KEY: &'static str = "workflow.restoreMany";
  const HOOK_TYPE: HookType = HookType::PostHook;

  async fn execute(
    &self,
    auth: &AuthContext,
    payload: Vec<WorkflowRecord>,
  ) -> Result<(), CascadeError> {
    let workspace = require_workspace(auth)?;
    let workflow_ids: Vec<String> = payload.into_iter().map(|w| w.id).collect();

    self
      .orchestrator
      .handle_sub_entities(&workflow_ids, &workspace.id, CascadeOperation::Restore)
      .await
  }
}

/// Destroys the functions of a workflow before the workflow itself is
/// destroyed, then lets the query proceed with unchanged arguments.
pub struct WorkflowDestroyOnePreHook {
  orchestrator: Arc<CascadeOrchestrator>,
}

impl WorkflowDestroyOnePreHook {
  pub fn new(orchestrator: Arc<CascadeOrchestrator>) -> Self {
    Self { orchestrator }
  }
}

#[async_trait]
impl WorkflowQueryHook for WorkflowDestroyOnePreHook {
  type Payload = DestroyOneArgs;
  type Output = DestroyOneArgs;

  const KEY: &'static str = "workflow.destroyOne";
  const HOOK_TYPE: HookType = HookType::PreHook;

  async fn execute(
    &self,
    auth: &AuthContext,
    payload: DestroyOneArgs,
  ) -> Result<DestroyOneArgs, CascadeError> {
    let workspace = require_workspace(auth)?;

    self
      .orchestrator
      .handle_sub_entities(
        std::slice::from_ref(&payload.id),
        &workspace.id,
        CascadeOperation::Destroy,
      )
      .await?;

    Ok(payload)
  }
}

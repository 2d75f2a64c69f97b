//! Recording mocks for the collection provider and the function service.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cascade_function::{FunctionError, FunctionLifecycle};
use cascade_store::{
  CollectionProvider, Collections, DependentCollection, EntityKind, ParentFilter, Step, StepType,
  StoreError, VersionCollection, VersionStatus, WorkflowVersion,
};
use chrono::Utc;
use serde_json::json;
use sqlx::types::Json;

use crate::orchestrator::CascadeDeps;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
  SoftDelete,
  Restore,
  PermanentDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Collection {
    kind: EntityKind,
    action: Action,
    workflow_id: String,
  },
  Find {
    workflow_id: String,
    include_soft_deleted: bool,
  },
  Function {
    action: Action,
    function_id: String,
    workspace_id: Option<String>,
  },
}

#[derive(Default)]
struct State {
  calls: Vec<Call>,
  workspaces: Vec<String>,
  versions: Vec<WorkflowVersion>,
  failing_collection: Option<(EntityKind, String)>,
  failing_functions: HashSet<String>,
  missing_functions: HashSet<String>,
  delays: HashMap<String, Duration>,
}

/// Shared state behind every mock; clones observe the same calls.
#[derive(Clone, Default)]
pub struct MockWorld {
  state: Arc<Mutex<State>>,
}

impl MockWorld {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn deps(&self) -> CascadeDeps {
    CascadeDeps {
      collections: Arc::new(self.clone()),
      functions: Arc::new(MockFunctions {
        world: self.clone(),
      }),
    }
  }

  pub fn add_version(&self, version: WorkflowVersion) {
    self.state.lock().unwrap().versions.push(version);
  }

  pub fn fail_collection(&self, kind: EntityKind, workflow_id: &str) {
    self.state.lock().unwrap().failing_collection = Some((kind, workflow_id.to_string()));
  }

  pub fn fail_function(&self, function_id: &str) {
    self
      .state
      .lock()
      .unwrap()
      .failing_functions
      .insert(function_id.to_string());
  }

  pub fn mark_missing(&self, function_id: &str) {
    self
      .state
      .lock()
      .unwrap()
      .missing_functions
      .insert(function_id.to_string());
  }

  /// Function calls for `function_id` complete only after `delay`.
  pub fn delay_function(&self, function_id: &str, delay: Duration) {
    self
      .state
      .lock()
      .unwrap()
      .delays
      .insert(function_id.to_string(), delay);
  }

  pub fn calls(&self) -> Vec<Call> {
    self.state.lock().unwrap().calls.clone()
  }

  /// Workspaces collections were requested for.
  pub fn workspaces(&self) -> Vec<String> {
    self.state.lock().unwrap().workspaces.clone()
  }

  fn record_collection(
    &self,
    kind: EntityKind,
    action: Action,
    filter: &ParentFilter,
  ) -> Result<u64, StoreError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push(Call::Collection {
      kind,
      action,
      workflow_id: filter.workflow_id.clone(),
    });

    if state.failing_collection == Some((kind, filter.workflow_id.clone())) {
      return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
    }
    Ok(1)
  }

  /// Waits out any configured delay, then records the call on completion.
  async fn call_function(
    &self,
    action: Action,
    function_id: &str,
    workspace_id: Option<&str>,
  ) -> Result<(), FunctionError> {
    let delay = self.state.lock().unwrap().delays.get(function_id).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    self.record_function(action, function_id, workspace_id)
  }

  fn record_function(
    &self,
    action: Action,
    function_id: &str,
    workspace_id: Option<&str>,
  ) -> Result<(), FunctionError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push(Call::Function {
      action,
      function_id: function_id.to_string(),
      workspace_id: workspace_id.map(str::to_string),
    });

    if state.missing_functions.contains(function_id) {
      return Err(FunctionError::NotFound {
        function_id: function_id.to_string(),
      });
    }
    if state.failing_functions.contains(function_id) {
      return Err(FunctionError::Database(sqlx::Error::PoolTimedOut));
    }
    Ok(())
  }
}

#[async_trait]
impl CollectionProvider for MockWorld {
  async fn collections(&self, workspace_id: &str) -> Result<Collections, StoreError> {
    self
      .state
      .lock()
      .unwrap()
      .workspaces
      .push(workspace_id.to_string());

    let collection = |kind| MockCollection {
      world: self.clone(),
      kind,
    };

    Ok(Collections {
      automated_triggers: Box::new(collection(EntityKind::AutomatedTrigger)),
      runs: Box::new(collection(EntityKind::Run)),
      versions: Box::new(collection(EntityKind::Version)),
    })
  }
}

struct MockCollection {
  world: MockWorld,
  kind: EntityKind,
}

#[async_trait]
impl DependentCollection for MockCollection {
  fn kind(&self) -> EntityKind {
    self.kind
  }

  async fn soft_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    self
      .world
      .record_collection(self.kind, Action::SoftDelete, filter)
  }

  async fn restore(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    self.world.record_collection(self.kind, Action::Restore, filter)
  }

  async fn permanent_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    self
      .world
      .record_collection(self.kind, Action::PermanentDelete, filter)
  }
}

#[async_trait]
impl VersionCollection for MockCollection {
  fn as_dependent(&self) -> &dyn DependentCollection {
    self
  }

  async fn find(
    &self,
    filter: &ParentFilter,
    include_soft_deleted: bool,
  ) -> Result<Vec<WorkflowVersion>, StoreError> {
    let mut state = self.world.state.lock().unwrap();
    state.calls.push(Call::Find {
      workflow_id: filter.workflow_id.clone(),
      include_soft_deleted,
    });

    Ok(
      state
        .versions
        .iter()
        .filter(|v| v.workflow_id == filter.workflow_id)
        .filter(|v| include_soft_deleted || !v.is_soft_deleted())
        .cloned()
        .collect(),
    )
  }

  async fn find_one(&self, version_id: &str) -> Result<Option<WorkflowVersion>, StoreError> {
    let state = self.world.state.lock().unwrap();
    Ok(
      state
        .versions
        .iter()
        .find(|v| v.id == version_id && !v.is_soft_deleted())
        .cloned(),
    )
  }
}

struct MockFunctions {
  world: MockWorld,
}

#[async_trait]
impl FunctionLifecycle for MockFunctions {
  async fn soft_delete(&self, function_id: &str, workspace_id: &str) -> Result<(), FunctionError> {
    self
      .world
      .call_function(Action::SoftDelete, function_id, Some(workspace_id))
      .await
  }

  async fn restore(&self, function_id: &str) -> Result<(), FunctionError> {
    self
      .world
      .call_function(Action::Restore, function_id, None)
      .await
  }

  async fn permanent_delete(
    &self,
    function_id: &str,
    workspace_id: &str,
  ) -> Result<(), FunctionError> {
    self
      .world
      .call_function(Action::PermanentDelete, function_id, Some(workspace_id))
      .await
  }
}

pub fn version(id: &str, workflow_id: &str, soft_deleted: bool, steps: Vec<Step>) -> WorkflowVersion {
  WorkflowVersion {
    id: id.to_string(),
    workspace_id: "ws-1".to_string(),
    workflow_id: workflow_id.to_string(),
    name: id.to_string(),
    status: VersionStatus::Active,
    steps: Some(Json(steps)),
    created_at: Utc::now(),
    deleted_at: soft_deleted.then(Utc::now),
  }
}

pub fn code_step(id: &str, function_id: &str) -> Step {
  Step {
    id: id.to_string(),
    name: id.to_string(),
    step_type: StepType::Code,
    settings: json!({ "input": { "serverlessFunctionId": function_id } }),
  }
}

pub fn step(id: &str, step_type: StepType) -> Step {
  Step {
    id: id.to_string(),
    name: id.to_string(),
    step_type,
    settings: json!({}),
  }
}

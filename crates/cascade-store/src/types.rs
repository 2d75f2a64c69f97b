use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// The dependent collections owned by a workflow, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  AutomatedTrigger,
  Run,
  Version,
}

impl EntityKind {
  /// Order in which soft-delete, restore and permanent delete are applied.
  pub const CASCADE_ORDER: [EntityKind; 3] = [
    EntityKind::AutomatedTrigger,
    EntityKind::Run,
    EntityKind::Version,
  ];

  pub(crate) fn table(&self) -> &'static str {
    match self {
      EntityKind::AutomatedTrigger => "workflow_automated_triggers",
      EntityKind::Run => "workflow_runs",
      EntityKind::Version => "workflow_versions",
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EntityKind::AutomatedTrigger => f.write_str("workflowAutomatedTrigger"),
      EntityKind::Run => f.write_str("workflowRun"),
      EntityKind::Version => f.write_str("workflowVersion"),
    }
  }
}

/// Selects every row that belongs to one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentFilter {
  pub workflow_id: String,
}

impl ParentFilter {
  pub fn new(workflow_id: impl Into<String>) -> Self {
    Self {
      workflow_id: workflow_id.into(),
    }
  }
}

/// Status of a workflow version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VersionStatus {
  Draft,
  Active,
  Deactivated,
  Archived,
}

/// Status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RunStatus {
  NotStarted,
  Running,
  Completed,
  Failed,
}

/// Kind of automation that starts a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AutomatedTriggerType {
  DatabaseEvent,
  Cron,
}

/// Action tag of a step embedded in a workflow version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
  Code,
  SendEmail,
  CreateRecord,
  UpdateRecord,
  DeleteRecord,
  FindRecords,
  Form,
  HttpRequest,
  #[serde(other)]
  Unknown,
}

/// A step of a workflow version. Steps are stored inline with the version
/// and have no lifecycle of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(rename = "type")]
  pub step_type: StepType,
  #[serde(default)]
  pub settings: serde_json::Value,
}

impl Step {
  pub fn is_code(&self) -> bool {
    self.step_type == StepType::Code
  }

  /// The serverless function referenced by a code step.
  ///
  /// Returns `None` for non-code steps and for code steps whose settings
  /// carry no `input.serverlessFunctionId`.
  pub fn function_id(&self) -> Option<&str> {
    if !self.is_code() {
      return None;
    }

    self
      .settings
      .get("input")?
      .get("serverlessFunctionId")?
      .as_str()
  }
}

/// A workflow version as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowVersion {
  pub id: String,
  pub workspace_id: String,
  pub workflow_id: String,
  pub name: String,
  pub status: VersionStatus,
  pub steps: Option<Json<Vec<Step>>>,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl WorkflowVersion {
  /// Steps in declaration order (empty when the version has none).
  pub fn steps(&self) -> &[Step] {
    self.steps.as_ref().map(|s| s.0.as_slice()).unwrap_or(&[])
  }

  pub fn is_soft_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }
}

/// A workflow run as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowRun {
  pub id: String,
  pub workspace_id: String,
  pub workflow_id: String,
  pub name: String,
  pub status: RunStatus,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

/// An automated trigger as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowAutomatedTrigger {
  pub id: String,
  pub workspace_id: String,
  pub workflow_id: String,
  pub trigger_type: AutomatedTriggerType,
  pub settings: Json<serde_json::Value>,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

/// Active and soft-deleted row counts of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
  pub active: i64,
  pub soft_deleted: i64,
}

/// Lifecycle state of everything a workflow owns in one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleSummary {
  pub workflow_id: String,
  pub automated_triggers: RowCounts,
  pub runs: RowCounts,
  pub versions: RowCounts,
}

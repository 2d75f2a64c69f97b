//! Cascade Store
//!
//! This crate provides the accessors for the collections a workflow owns:
//! automated triggers, runs and versions. Each collection has a soft-delete
//! lifecycle (active, soft-deleted, gone) and is addressed by its parent
//! workflow id, never by guessing membership another way.
//!
//! The traits here are the seam the cascade orchestrator drives:
//! - [`DependentCollection`] soft-deletes, restores and permanently deletes
//!   every row of one workflow
//! - [`VersionCollection`] additionally reads versions (optionally including
//!   soft-deleted ones) so their steps can be scanned
//! - [`CollectionProvider`] hands out the accessors for one workspace
//!
//! [`SqliteStore`] implements all three on top of a SQLite pool.

mod sqlite;
mod types;

pub use sqlite::{SqliteCollection, SqliteStore, SqliteVersions, connect, connect_in_memory};
pub use types::{
  AutomatedTriggerType, EntityKind, LifecycleSummary, ParentFilter, RowCounts, RunStatus, Step,
  StepType, VersionStatus, WorkflowAutomatedTrigger, WorkflowRun, WorkflowVersion,
};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Applying the embedded migrations failed.
  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Lifecycle operations on one dependent collection, scoped to one workspace.
///
/// Every method returns the number of rows it changed. Repeating an operation
/// on rows that are already in the target state changes nothing and returns 0.
#[async_trait]
pub trait DependentCollection: Send + Sync {
  /// The entity type this accessor manages.
  fn kind(&self) -> EntityKind;

  /// Mark every active row of the workflow as deleted.
  async fn soft_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError>;

  /// Clear the deleted marker on every soft-deleted row of the workflow.
  async fn restore(&self, filter: &ParentFilter) -> Result<u64, StoreError>;

  /// Erase every row of the workflow, soft-deleted or not.
  async fn permanent_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError>;
}

/// Accessor for workflow versions.
#[async_trait]
pub trait VersionCollection: DependentCollection {
  /// View this accessor through its lifecycle operations only.
  fn as_dependent(&self) -> &dyn DependentCollection;

  /// Versions of a workflow. Soft-deleted versions are only returned when
  /// `include_soft_deleted` is set.
  async fn find(
    &self,
    filter: &ParentFilter,
    include_soft_deleted: bool,
  ) -> Result<Vec<WorkflowVersion>, StoreError>;

  /// An active version by id.
  async fn find_one(&self, version_id: &str) -> Result<Option<WorkflowVersion>, StoreError>;
}

/// The accessors of one workspace.
pub struct Collections {
  pub automated_triggers: Box<dyn DependentCollection>,
  pub runs: Box<dyn DependentCollection>,
  pub versions: Box<dyn VersionCollection>,
}

impl Collections {
  /// The accessor for an entity type.
  pub fn get(&self, kind: EntityKind) -> &dyn DependentCollection {
    match kind {
      EntityKind::AutomatedTrigger => self.automated_triggers.as_ref(),
      EntityKind::Run => self.runs.as_ref(),
      EntityKind::Version => self.versions.as_dependent(),
    }
  }
}

/// Hands out workspace-scoped accessors.
#[async_trait]
pub trait CollectionProvider: Send + Sync {
  /// Build the accessors for a workspace.
  async fn collections(&self, workspace_id: &str) -> Result<Collections, StoreError>;
}

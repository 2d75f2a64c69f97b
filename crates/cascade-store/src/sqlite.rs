use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::{
  CollectionProvider, Collections, DependentCollection, EntityKind, LifecycleSummary, ParentFilter,
  RowCounts, StoreError, VersionCollection, WorkflowAutomatedTrigger, WorkflowRun, WorkflowVersion,
};

/// Open (creating if missing) a SQLite database file.
pub async fn connect(path: &Path) -> Result<SqlitePool, StoreError> {
  let options = SqliteConnectOptions::new()
    .filename(path)
    .create_if_missing(true);

  Ok(SqlitePoolOptions::new().connect_with(options).await?)
}

/// Open a private in-memory database.
///
/// The pool is pinned to a single connection that is never recycled, since
/// every SQLite in-memory connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
  Ok(
    SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect("sqlite::memory:")
      .await?,
  )
}

/// SQLite-based store implementation.
#[derive(Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }

  /// Insert a workflow version.
  pub async fn create_version(&self, version: &WorkflowVersion) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflow_versions (id, workspace_id, workflow_id, name, status, steps, created_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&version.id)
    .bind(&version.workspace_id)
    .bind(&version.workflow_id)
    .bind(&version.name)
    .bind(version.status)
    .bind(&version.steps)
    .bind(version.created_at)
    .bind(version.deleted_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  /// Insert a workflow run.
  pub async fn create_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflow_runs (id, workspace_id, workflow_id, name, status, created_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&run.id)
    .bind(&run.workspace_id)
    .bind(&run.workflow_id)
    .bind(&run.name)
    .bind(run.status)
    .bind(run.created_at)
    .bind(run.deleted_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  /// Insert an automated trigger.
  pub async fn create_trigger(&self, trigger: &WorkflowAutomatedTrigger) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflow_automated_triggers (id, workspace_id, workflow_id, trigger_type, settings, created_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&trigger.id)
    .bind(&trigger.workspace_id)
    .bind(&trigger.workflow_id)
    .bind(trigger.trigger_type)
    .bind(&trigger.settings)
    .bind(trigger.created_at)
    .bind(trigger.deleted_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  /// Count active and soft-deleted rows per collection for one workflow.
  pub async fn lifecycle_summary(
    &self,
    workspace_id: &str,
    workflow_id: &str,
  ) -> Result<LifecycleSummary, StoreError> {
    Ok(LifecycleSummary {
      workflow_id: workflow_id.to_string(),
      automated_triggers: self
        .row_counts(EntityKind::AutomatedTrigger, workspace_id, workflow_id)
        .await?,
      runs: self
        .row_counts(EntityKind::Run, workspace_id, workflow_id)
        .await?,
      versions: self
        .row_counts(EntityKind::Version, workspace_id, workflow_id)
        .await?,
    })
  }

  async fn row_counts(
    &self,
    kind: EntityKind,
    workspace_id: &str,
    workflow_id: &str,
  ) -> Result<RowCounts, StoreError> {
    let (active, soft_deleted): (i64, i64) = sqlx::query_as(&format!(
      r#"
            SELECT COALESCE(SUM(deleted_at IS NULL), 0), COALESCE(SUM(deleted_at IS NOT NULL), 0)
            FROM {}
            WHERE workspace_id = ? AND workflow_id = ?
            "#,
      kind.table()
    ))
    .bind(workspace_id)
    .bind(workflow_id)
    .fetch_one(&self.pool)
    .await?;

    Ok(RowCounts {
      active,
      soft_deleted,
    })
  }

  fn collection(&self, workspace_id: &str, kind: EntityKind) -> SqliteCollection {
    SqliteCollection {
      pool: self.pool.clone(),
      workspace_id: workspace_id.to_string(),
      kind,
    }
  }
}

#[async_trait]
impl CollectionProvider for SqliteStore {
  async fn collections(&self, workspace_id: &str) -> Result<Collections, StoreError> {
    Ok(Collections {
      automated_triggers: Box::new(self.collection(workspace_id, EntityKind::AutomatedTrigger)),
      runs: Box::new(self.collection(workspace_id, EntityKind::Run)),
      versions: Box::new(SqliteVersions {
        inner: self.collection(workspace_id, EntityKind::Version),
      }),
    })
  }
}

/// One table of one workspace.
pub struct SqliteCollection {
  pool: SqlitePool,
  workspace_id: String,
  kind: EntityKind,
}

#[async_trait]
impl DependentCollection for SqliteCollection {
  fn kind(&self) -> EntityKind {
    self.kind
  }

  async fn soft_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    let result = sqlx::query(&format!(
      r#"
            UPDATE {}
            SET deleted_at = ?
            WHERE workspace_id = ? AND workflow_id = ? AND deleted_at IS NULL
            "#,
      self.kind.table()
    ))
    .bind(Utc::now())
    .bind(&self.workspace_id)
    .bind(&filter.workflow_id)
    .execute(&self.pool)
    .await?;

    debug!(
      kind = %self.kind,
      workflow_id = %filter.workflow_id,
      affected = result.rows_affected(),
      "rows_soft_deleted"
    );

    Ok(result.rows_affected())
  }

  async fn restore(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    let result = sqlx::query(&format!(
      r#"
            UPDATE {}
            SET deleted_at = NULL
            WHERE workspace_id = ? AND workflow_id = ? AND deleted_at IS NOT NULL
            "#,
      self.kind.table()
    ))
    .bind(&self.workspace_id)
    .bind(&filter.workflow_id)
    .execute(&self.pool)
    .await?;

    debug!(
      kind = %self.kind,
      workflow_id = %filter.workflow_id,
      affected = result.rows_affected(),
      "rows_restored"
    );

    Ok(result.rows_affected())
  }

  async fn permanent_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    let result = sqlx::query(&format!(
      r#"
            DELETE FROM {}
            WHERE workspace_id = ? AND workflow_id = ?
            "#,
      self.kind.table()
    ))
    .bind(&self.workspace_id)
    .bind(&filter.workflow_id)
    .execute(&self.pool)
    .await?;

    debug!(
      kind = %self.kind,
      workflow_id = %filter.workflow_id,
      affected = result.rows_affected(),
      "rows_destroyed"
    );

    Ok(result.rows_affected())
  }
}

/// The versions table of one workspace.
pub struct SqliteVersions {
  inner: SqliteCollection,
}

#[async_trait]
impl DependentCollection for SqliteVersions {
  fn kind(&self) -> EntityKind {
    EntityKind::Version
  }

  async fn soft_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    self.inner.soft_delete(filter).await
  }

  async fn restore(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    self.inner.restore(filter).await
  }

  async fn permanent_delete(&self, filter: &ParentFilter) -> Result<u64, StoreError> {
    self.inner.permanent_delete(filter).await
  }
}

#[async_trait]
impl VersionCollection for SqliteVersions {
  fn as_dependent(&self) -> &dyn DependentCollection {
    self
  }

  async fn find(
    &self,
    filter: &ParentFilter,
    include_soft_deleted: bool,
  ) -> Result<Vec<WorkflowVersion>, StoreError> {
    let deleted_clause = if include_soft_deleted {
      ""
    } else {
      "AND deleted_at IS NULL"
    };

    let versions = sqlx::query_as(&format!(
      r#"
            SELECT id, workspace_id, workflow_id, name, status, steps, created_at, deleted_at
            FROM workflow_versions
            WHERE workspace_id = ? AND workflow_id = ? {}
            ORDER BY created_at ASC
            "#,
      deleted_clause
    ))
    .bind(&self.inner.workspace_id)
    .bind(&filter.workflow_id)
    .fetch_all(&self.inner.pool)
    .await?;

    Ok(versions)
  }

  async fn find_one(&self, version_id: &str) -> Result<Option<WorkflowVersion>, StoreError> {
    let version = sqlx::query_as(
      r#"
            SELECT id, workspace_id, workflow_id, name, status, steps, created_at, deleted_at
            FROM workflow_versions
            WHERE workspace_id = ? AND id = ? AND deleted_at IS NULL
            "#,
    )
    .bind(&self.inner.workspace_id)
    .bind(version_id)
    .fetch_optional(&self.inner.pool)
    .await?;

    Ok(version)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};
  use serde_json::json;
  use sqlx::types::Json;

  use super::*;
  use crate::{AutomatedTriggerType, RunStatus, Step, VersionStatus};

  const WS: &str = "ws-1";

  async fn store() -> SqliteStore {
    let store = SqliteStore::new(connect_in_memory().await.unwrap());
    store.migrate().await.unwrap();
    store
  }

  fn version(id: &str, workspace_id: &str, workflow_id: &str, steps: Vec<Step>) -> WorkflowVersion {
    WorkflowVersion {
      id: id.to_string(),
      workspace_id: workspace_id.to_string(),
      workflow_id: workflow_id.to_string(),
      name: format!("{} v", workflow_id),
      status: VersionStatus::Draft,
      steps: Some(Json(steps)),
      created_at: Utc::now(),
      deleted_at: None,
    }
  }

  fn run(id: &str, workflow_id: &str) -> WorkflowRun {
    WorkflowRun {
      id: id.to_string(),
      workspace_id: WS.to_string(),
      workflow_id: workflow_id.to_string(),
      name: format!("run {}", id),
      status: RunStatus::Completed,
      created_at: Utc::now(),
      deleted_at: None,
    }
  }

  fn trigger(id: &str, workflow_id: &str) -> WorkflowAutomatedTrigger {
    WorkflowAutomatedTrigger {
      id: id.to_string(),
      workspace_id: WS.to_string(),
      workflow_id: workflow_id.to_string(),
      trigger_type: AutomatedTriggerType::Cron,
      settings: Json(json!({ "pattern": "0 * * * *" })),
      created_at: Utc::now(),
      deleted_at: None,
    }
  }

  fn code_step(id: &str, function_id: &str) -> Step {
    serde_json::from_value(json!({
      "id": id,
      "name": id,
      "type": "CODE",
      "settings": { "input": { "serverlessFunctionId": function_id } }
    }))
    .unwrap()
  }

  #[tokio::test]
  async fn test_soft_delete_only_touches_filtered_workflow() {
    let store = store().await;
    store.create_run(&run("r1", "wf-a")).await.unwrap();
    store.create_run(&run("r2", "wf-a")).await.unwrap();
    store.create_run(&run("r3", "wf-b")).await.unwrap();

    let collections = store.collections(WS).await.unwrap();
    let affected = collections
      .runs
      .soft_delete(&ParentFilter::new("wf-a"))
      .await
      .unwrap();
    assert_eq!(affected, 2);

    let a = store.lifecycle_summary(WS, "wf-a").await.unwrap();
    let b = store.lifecycle_summary(WS, "wf-b").await.unwrap();
    assert_eq!(a.runs, RowCounts { active: 0, soft_deleted: 2 });
    assert_eq!(b.runs, RowCounts { active: 1, soft_deleted: 0 });
  }

  #[tokio::test]
  async fn test_soft_delete_twice_affects_nothing_the_second_time() {
    let store = store().await;
    store.create_trigger(&trigger("t1", "wf-a")).await.unwrap();

    let collections = store.collections(WS).await.unwrap();
    let filter = ParentFilter::new("wf-a");
    assert_eq!(collections.automated_triggers.soft_delete(&filter).await.unwrap(), 1);
    assert_eq!(collections.automated_triggers.soft_delete(&filter).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_restore_clears_deleted_marker() {
    let store = store().await;
    store.create_trigger(&trigger("t1", "wf-a")).await.unwrap();
    let collections = store.collections(WS).await.unwrap();
    let filter = ParentFilter::new("wf-a");

    collections.automated_triggers.soft_delete(&filter).await.unwrap();
    assert_eq!(collections.automated_triggers.restore(&filter).await.unwrap(), 1);
    assert_eq!(collections.automated_triggers.restore(&filter).await.unwrap(), 0);

    let summary = store.lifecycle_summary(WS, "wf-a").await.unwrap();
    assert_eq!(summary.automated_triggers, RowCounts { active: 1, soft_deleted: 0 });
  }

  #[tokio::test]
  async fn test_workspace_scope_is_respected() {
    let store = store().await;
    store
      .create_version(&version("v1", WS, "wf-a", vec![]))
      .await
      .unwrap();
    store
      .create_version(&version("v2", "ws-other", "wf-a", vec![]))
      .await
      .unwrap();

    let collections = store.collections(WS).await.unwrap();
    let affected = collections
      .versions
      .soft_delete(&ParentFilter::new("wf-a"))
      .await
      .unwrap();
    assert_eq!(affected, 1);

    let other = store.lifecycle_summary("ws-other", "wf-a").await.unwrap();
    assert_eq!(other.versions, RowCounts { active: 1, soft_deleted: 0 });
  }

  #[tokio::test]
  async fn test_find_with_and_without_soft_deleted() {
    let store = store().await;
    let mut deleted = version("v1", WS, "wf-a", vec![code_step("s1", "fn-1")]);
    deleted.created_at = Utc::now() - Duration::hours(1);
    deleted.deleted_at = Some(Utc::now());
    store.create_version(&deleted).await.unwrap();
    store
      .create_version(&version("v2", WS, "wf-a", vec![code_step("s2", "fn-2")]))
      .await
      .unwrap();

    let collections = store.collections(WS).await.unwrap();
    let filter = ParentFilter::new("wf-a");

    let all = collections.versions.find(&filter, true).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "v1");
    assert!(all[0].is_soft_deleted());
    assert_eq!(all[0].steps()[0].function_id(), Some("fn-1"));

    let active = collections.versions.find(&filter, false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "v2");
  }

  #[tokio::test]
  async fn test_find_one_skips_soft_deleted_versions() {
    let store = store().await;
    let mut deleted = version("v1", WS, "wf-a", vec![]);
    deleted.deleted_at = Some(Utc::now());
    store.create_version(&deleted).await.unwrap();
    store
      .create_version(&version("v2", WS, "wf-a", vec![]))
      .await
      .unwrap();

    let collections = store.collections(WS).await.unwrap();
    assert!(collections.versions.find_one("v1").await.unwrap().is_none());
    assert_eq!(
      collections.versions.find_one("v2").await.unwrap().unwrap().id,
      "v2"
    );
  }

  #[tokio::test]
  async fn test_find_decodes_steps_without_id_or_name() {
    let store = store().await;
    sqlx::query(
      r#"
            INSERT INTO workflow_versions (id, workspace_id, workflow_id, name, status, steps, created_at)
            VALUES ('v1', ?, 'wf-a', 'v1', 'active', ?, ?)
            "#,
    )
    .bind(WS)
    .bind(r#"[{"type":"SEND_EMAIL","settings":{}},{"type":"CODE","settings":{"input":{"serverlessFunctionId":"fn-1"}}}]"#)
    .bind(Utc::now())
    .execute(&store.pool)
    .await
    .unwrap();

    let collections = store.collections(WS).await.unwrap();
    let found = collections
      .versions
      .find(&ParentFilter::new("wf-a"), true)
      .await
      .unwrap();

    assert_eq!(found.len(), 1);
    let steps = found[0].steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].function_id(), Some("fn-1"));
  }

  #[tokio::test]
  async fn test_version_without_steps_round_trips_as_empty() {
    let store = store().await;
    let mut v = version("v1", WS, "wf-a", vec![]);
    v.steps = None;
    store.create_version(&v).await.unwrap();

    let collections = store.collections(WS).await.unwrap();
    let found = collections.versions.find_one("v1").await.unwrap().unwrap();
    assert!(found.steps.is_none());
    assert!(found.steps().is_empty());
  }

  #[tokio::test]
  async fn test_permanent_delete_removes_soft_deleted_rows_too() {
    let store = store().await;
    let mut deleted = run("r1", "wf-a");
    deleted.deleted_at = Some(Utc::now());
    store.create_run(&deleted).await.unwrap();
    store.create_run(&run("r2", "wf-a")).await.unwrap();

    let collections = store.collections(WS).await.unwrap();
    let affected = collections
      .get(EntityKind::Run)
      .permanent_delete(&ParentFilter::new("wf-a"))
      .await
      .unwrap();
    assert_eq!(affected, 2);

    let summary = store.lifecycle_summary(WS, "wf-a").await.unwrap();
    assert_eq!(summary.runs, RowCounts::default());
  }

  #[tokio::test]
  async fn test_collections_get_returns_matching_kind() {
    let store = store().await;
    let collections = store.collections(WS).await.unwrap();

    for kind in EntityKind::CASCADE_ORDER {
      assert_eq!(collections.get(kind).kind(), kind);
    }
  }
}

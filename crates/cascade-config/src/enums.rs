use serde::{Deserialize, Serialize};

/// Default number of nested function calls allowed in flight at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// How nested function lifecycle calls are dispatched for one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NestedDispatch {
  /// Await each call before issuing the next; stop at the first failure.
  Sequential,
  /// Bounded fan-out. All calls run to completion, then the first failure is
  /// reported.
  Concurrent {
    #[serde(default = "default_max_in_flight")]
    max_in_flight: usize,
  },
}

impl NestedDispatch {
  /// Effective concurrency limit (always at least 1).
  pub fn max_in_flight(&self) -> usize {
    match self {
      NestedDispatch::Sequential => 1,
      NestedDispatch::Concurrent { max_in_flight } => (*max_in_flight).max(1),
    }
  }
}

impl Default for NestedDispatch {
  fn default() -> Self {
    NestedDispatch::Concurrent {
      max_in_flight: DEFAULT_MAX_IN_FLIGHT,
    }
  }
}

fn default_max_in_flight() -> usize {
  DEFAULT_MAX_IN_FLIGHT
}

/// What a permanent destroy of a workflow does to its dependent rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyPolicy {
  /// Only the functions referenced by code steps are destroyed. Versions,
  /// runs and automated triggers are left in place.
  #[default]
  FunctionsOnly,
  /// Functions are destroyed first, then triggers, runs and versions are
  /// permanently deleted.
  FunctionsAndRows,
}

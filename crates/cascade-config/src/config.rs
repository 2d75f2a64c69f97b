use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::enums::{DestroyPolicy, NestedDispatch};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
  /// SQLite database file. Relative paths are resolved against the data
  /// directory; `None` means `<data_dir>/cascade.db`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub database_path: Option<PathBuf>,

  /// Orchestrator behaviour.
  #[serde(flatten)]
  pub options: CascadeOptions,
}

impl CascadeConfig {
  /// Parse a configuration from JSON text.
  pub fn from_json_str(input: &str) -> serde_json::Result<Self> {
    serde_json::from_str(input)
  }

  /// Resolve the database file against the given data directory.
  pub fn database_file(&self, data_dir: &std::path::Path) -> PathBuf {
    match &self.database_path {
      Some(path) if path.is_absolute() => path.clone(),
      Some(path) => data_dir.join(path),
      None => data_dir.join("cascade.db"),
    }
  }
}

/// Options consumed by the cascade orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeOptions {
  pub nested_dispatch: NestedDispatch,
  pub destroy_policy: DestroyPolicy,
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// A lifecycle event applied to a workflow and propagated to what it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeOperation {
  /// Soft-delete: reversible with [`CascadeOperation::Restore`].
  Delete,
  Restore,
  /// Permanent, irreversible removal.
  Destroy,
}

impl fmt::Display for CascadeOperation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CascadeOperation::Delete => f.write_str("delete"),
      CascadeOperation::Restore => f.write_str("restore"),
      CascadeOperation::Destroy => f.write_str("destroy"),
    }
  }
}

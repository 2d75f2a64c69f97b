//! Cascade Orchestrator
//!
//! This crate propagates workflow lifecycle events (soft-delete, restore,
//! permanent destroy) to everything a workflow owns:
//!
//! - automated triggers, runs and versions, filtered by workflow id and
//!   applied in that order
//! - serverless functions referenced from code steps of any version,
//!   including versions that are already soft-deleted
//!
//! [`CascadeOrchestrator`] is the core. The hooks in [`hooks`] are the entry
//! points the query layer calls; they validate the request context and then
//! delegate to the orchestrator.

mod common;
mod error;
pub mod hooks;
mod nested;
mod operation;
mod orchestrator;

#[cfg(test)]
mod test_support;

pub use common::WorkflowCommon;
pub use error::CascadeError;
pub use hooks::{
  AuthContext, DestroyOneArgs, HookType, Workspace, WorkflowDeleteManyPostHook,
  WorkflowDestroyOnePreHook, WorkflowQueryHook, WorkflowRecord, WorkflowRestoreManyPostHook,
  require_workspace,
};
pub use operation::CascadeOperation;
pub use orchestrator::{CascadeDeps, CascadeOrchestrator};

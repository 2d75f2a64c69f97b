//! Cascade Config
//!
//! This crate contains the serializable configuration types for the cascade
//! orchestrator. Configuration is read from an optional JSON file (via CLI with
//! `--config=cascade.json`); every field has a default so an empty object is a
//! valid configuration.

mod config;
mod enums;

pub use config::{CascadeConfig, CascadeOptions};
pub use enums::{DestroyPolicy, NestedDispatch};

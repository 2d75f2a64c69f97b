use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cascade_config::CascadeConfig;
use cascade_function::SqliteFunctionStore;
use cascade_orchestrator::{
  AuthContext, CascadeDeps, CascadeOrchestrator, DestroyOneArgs, WorkflowCommon,
  WorkflowDeleteManyPostHook, WorkflowDestroyOnePreHook, WorkflowQueryHook, WorkflowRecord,
  WorkflowRestoreManyPostHook, Workspace, require_workspace,
};
use cascade_store::SqliteStore;

/// Cascade - propagate workflow lifecycle events to the entities a workflow owns
#[derive(Parser)]
#[command(name = "cascade")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.cascade)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Path to a JSON configuration file (default: <data-dir>/config.json if present)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// SQLite database file, overriding the configuration
  #[arg(long, global = true)]
  database: Option<PathBuf>,

  /// Workspace the workflows belong to
  #[arg(long, global = true)]
  workspace: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Soft-delete everything the given workflows own
  Delete {
    #[arg(required = true)]
    workflow_ids: Vec<String>,
  },

  /// Restore everything the given workflows own
  Restore {
    #[arg(required = true)]
    workflow_ids: Vec<String>,
  },

  /// Permanently destroy the functions a workflow references
  Destroy { workflow_id: String },

  /// Print the lifecycle state of a workflow's dependent rows
  Status { workflow_id: String },

  /// Print an active workflow version
  Version { version_id: String },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let mut cli = Cli::parse();

  let data_dir = match cli.data_dir.clone() {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".cascade"),
  };

  match cli.command.take() {
    Some(command) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run(command, &cli, &data_dir))
    }
    None => {
      println!("cascade - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run(command: Commands, cli: &Cli, data_dir: &Path) -> Result<()> {
  let mut config = load_config(cli.config.as_deref(), data_dir).await?;
  if let Some(database) = &cli.database {
    config.database_path = Some(database.clone());
  }

  let database_file = config.database_file(data_dir);
  if let Some(parent) = database_file.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create directory: {}", parent.display()))?;
  }

  let pool = cascade_store::connect(&database_file)
    .await
    .with_context(|| format!("failed to open database: {}", database_file.display()))?;

  let store = SqliteStore::new(pool.clone());
  store
    .migrate()
    .await
    .context("failed to migrate database")?;

  let deps = CascadeDeps {
    collections: Arc::new(store.clone()),
    functions: Arc::new(SqliteFunctionStore::new(pool)),
  };
  let orchestrator = Arc::new(CascadeOrchestrator::new(deps.clone(), config.options));
  let auth = AuthContext {
    workspace: cli.workspace.clone().map(|id| Workspace { id }),
  };

  match command {
    Commands::Delete { workflow_ids } => {
      WorkflowDeleteManyPostHook::new(orchestrator)
        .execute(&auth, records(workflow_ids))
        .await
        .context("delete cascade failed")?;
      eprintln!("Delete cascade completed");
    }
    Commands::Restore { workflow_ids } => {
      WorkflowRestoreManyPostHook::new(orchestrator)
        .execute(&auth, records(workflow_ids))
        .await
        .context("restore cascade failed")?;
      eprintln!("Restore cascade completed");
    }
    Commands::Destroy { workflow_id } => {
      WorkflowDestroyOnePreHook::new(orchestrator)
        .execute(&auth, DestroyOneArgs { id: workflow_id })
        .await
        .context("destroy cascade failed")?;
      eprintln!("Destroy cascade completed");
    }
    Commands::Status { workflow_id } => {
      let workspace = require_workspace(&auth)?;
      let summary = store
        .lifecycle_summary(&workspace.id, &workflow_id)
        .await
        .context("failed to read lifecycle state")?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Commands::Version { version_id } => {
      let workspace = require_workspace(&auth)?;
      let version = WorkflowCommon::new(deps.collections)
        .get_version_or_fail(&workspace.id, &version_id)
        .await?;
      println!("{}", serde_json::to_string_pretty(&version)?);
    }
  }

  Ok(())
}

async fn load_config(path: Option<&Path>, data_dir: &Path) -> Result<CascadeConfig> {
  let (path, required) = match path {
    Some(path) => (path.to_path_buf(), true),
    None => (data_dir.join("config.json"), false),
  };

  if !required && !path.exists() {
    return Ok(CascadeConfig::default());
  }

  let content = tokio::fs::read_to_string(&path)
    .await
    .with_context(|| format!("failed to read config file: {}", path.display()))?;

  CascadeConfig::from_json_str(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

fn records(workflow_ids: Vec<String>) -> Vec<WorkflowRecord> {
  workflow_ids
    .into_iter()
    .map(|id| WorkflowRecord { id })
    .collect()
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use tcms_bridge_core::runner::{RunnerPlugin, RunnerStartArgs};

use crate::runner::WorkerRunnerPlugin;

pub const WORKER_INTERPRETER: &str = "/usr/bin/python3";
pub const WORKER_SCRIPT: &str = "tcms_script.py";

pub fn build_runner() -> Arc<dyn RunnerPlugin> {
    Arc::new(WorkerRunnerPlugin::new())
}

/// The worker script lives next to the running executable.
pub fn worker_start_args() -> Result<RunnerStartArgs> {
    let exe = std::env::current_exe().context("cannot resolve current executable")?;
    let dir = exe
        .parent()
        .with_context(|| format!("executable has no parent dir: {}", exe.display()))?;
    Ok(worker_start_args_in(dir))
}

pub fn worker_start_args_in(dir: &Path) -> RunnerStartArgs {
    let script: PathBuf = dir.join(WORKER_SCRIPT);
    RunnerStartArgs::new(WORKER_INTERPRETER).arg(script.to_string_lossy())
}

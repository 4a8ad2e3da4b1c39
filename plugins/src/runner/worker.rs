use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

use tcms_bridge_core::runner::{ExitOutcome, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};

/// Runs the worker as a child process with all three standard streams piped.
#[derive(Debug, Default)]
pub struct WorkerRunnerPlugin {}

impl WorkerRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl RunnerPlugin for WorkerRunnerPlugin {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        let mut cmd = Command::new(&args.cmd);
        cmd.args(&args.args)
            .envs(&args.envs)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &args.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("spawn {} {}", args.cmd, args.args.join(" ")))?;
        tracing::debug!(pid = child.id(), cmd = %args.cmd, "worker process spawned");

        Ok(Box::new(WorkerRunnerSession { child }))
    }
}

struct WorkerRunnerSession {
    child: Child,
}

#[async_trait]
impl RunnerSession for WorkerRunnerSession {
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
        self.child
            .stdin
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncWrite + Unpin + Send>)
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> Result<()> {
        // tokio only exposes SIGKILL; Term is treated the same
        tracing::debug!(pid = self.child.id(), ?signal, "killing worker");
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // already exited and reaped
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn wait(&mut self) -> Result<ExitOutcome> {
        let status = self.child.wait().await?;
        Ok(ExitOutcome {
            exit_code: normalize_exit(status),
        })
    }
}

/// Exit code of a finished process; death by signal `n` maps to `128 + n`.
pub fn normalize_exit(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            128 + sig
        } else {
            1
        }
    }
    #[cfg(windows)]
    {
        status.code().unwrap_or(1)
    }
}

//! One worker transaction: start the process, write the request, close
//! stdin, collect stdout and stderr, classify the exit.
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::envelope::RequestEnvelope;
use crate::error::TransportError;
use crate::runner::{
    collect_stderr, collect_stdout, spawn_request_writer, RunnerPlugin, RunnerSession,
    RunnerStartArgs, Signal,
};
use crate::util::excerpt;

pub const DEFAULT_OUTPUT_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Wall-clock bound for one transaction. `None` waits forever.
    pub timeout: Option<Duration>,
    pub output_excerpt_chars: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            output_excerpt_chars: DEFAULT_OUTPUT_EXCERPT_CHARS,
        }
    }
}

enum Interrupt {
    Timeout,
    Cancelled(String),
}

async fn recv_abort(rx: &mut Option<&mut mpsc::Receiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn deadline(at: Option<tokio::time::Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn join_stream(
    task: &mut JoinHandle<Result<Vec<u8>, TransportError>>,
    stream: &'static str,
) -> Result<Vec<u8>, TransportError> {
    task.await.map_err(|e| TransportError::StreamIo {
        stream,
        source: std::io::Error::other(e.to_string()),
    })?
}

async fn kill_and_reap(session: &mut dyn RunnerSession) {
    if let Err(e) = session.signal(Signal::Kill).await {
        tracing::warn!(error.message = %e, "failed to kill worker");
    }
    if let Err(e) = session.wait().await {
        tracing::warn!(error.message = %e, "failed to reap worker");
    }
}

fn interrupted(interrupt: Interrupt, started_at: Instant) -> TransportError {
    let elapsed_ms = started_at.elapsed().as_millis() as u64;
    match interrupt {
        Interrupt::Timeout => {
            tracing::error!(error.kind = "worker.timeout", elapsed_ms, "worker killed");
            TransportError::Timeout { elapsed_ms }
        }
        Interrupt::Cancelled(reason) => {
            tracing::warn!(error.kind = "worker.cancelled", reason = %reason, "worker killed");
            TransportError::Cancelled { reason }
        }
    }
}

/// Run one request against the worker and decode its answer.
///
/// The child is always reaped before this returns. The timeout and
/// `abort_rx` cover the whole transaction, including draining the output
/// pipes after the child has exited.
pub async fn execute(
    runner: &dyn RunnerPlugin,
    worker: &RunnerStartArgs,
    envelope: &RequestEnvelope,
    opts: &TransportOptions,
    mut abort_rx: Option<&mut mpsc::Receiver<String>>,
) -> Result<Value, TransportError> {
    let payload = envelope.to_wire()?;

    let started_at = Instant::now();
    let deadline_at = opts.timeout.map(|t| tokio::time::Instant::now() + t);
    let mut session = runner
        .start_session(worker)
        .await
        .map_err(|e| TransportError::Spawn(format!("{}: {e:#}", worker.cmd)))?;

    tracing::debug!(
        runner = runner.name(),
        action = %envelope.operation,
        request_bytes = payload.len(),
        "worker started"
    );

    let pipes = (session.stdout(), session.stderr(), session.stdin());
    let (Some(stdout), Some(stderr), Some(stdin)) = pipes else {
        kill_and_reap(session.as_mut()).await;
        return Err(TransportError::Spawn(format!(
            "{}: worker session is missing a standard stream",
            worker.cmd
        )));
    };

    let mut out_task = collect_stdout(stdout);
    let mut err_task = collect_stderr(stderr);
    let writer = spawn_request_writer(stdin, payload);

    let waited = {
        let wait_fut = session.wait();
        tokio::pin!(wait_fut);

        tokio::select! {
            res = &mut wait_fut => Ok(res),
            _ = deadline(deadline_at) => Err(Interrupt::Timeout),
            Some(reason) = recv_abort(&mut abort_rx) => Err(Interrupt::Cancelled(reason)),
        }
    };

    let status = match waited {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            writer.abort();
            out_task.abort();
            err_task.abort();
            return Err(TransportError::StreamIo {
                stream: "wait",
                source: std::io::Error::other(format!("{e:#}")),
            });
        }
        Err(interrupt) => {
            kill_and_reap(session.as_mut()).await;
            writer.abort();
            out_task.abort();
            err_task.abort();
            return Err(interrupted(interrupt, started_at));
        }
    };

    // the worker is gone; a writer still blocked on the pipe has nobody to talk to
    if !writer.is_finished() {
        writer.abort();
    }
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(error.message = %e, "worker closed stdin early"),
        Err(e) if e.is_cancelled() => tracing::debug!("request writer dropped after worker exit"),
        Err(e) => tracing::warn!(error.message = %e, "request writer panicked"),
    }

    // a descendant of the worker can keep the pipes open after it exits
    let collected = {
        let both = futures::future::join(
            join_stream(&mut out_task, "stdout"),
            join_stream(&mut err_task, "stderr"),
        );

        tokio::select! {
            res = both => Ok(res),
            _ = deadline(deadline_at) => Err(Interrupt::Timeout),
            Some(reason) = recv_abort(&mut abort_rx) => Err(Interrupt::Cancelled(reason)),
        }
    };

    let (stdout, stderr) = match collected {
        Ok(streams) => streams,
        Err(interrupt) => {
            out_task.abort();
            err_task.abort();
            tracing::warn!(
                exit_code = status.exit_code,
                "worker exited but its output pipes are still open"
            );
            return Err(interrupted(interrupt, started_at));
        }
    };

    tracing::info!(
        action = %envelope.operation,
        exit_code = status.exit_code,
        stdout_bytes = stdout.as_ref().map_or(0, Vec::len),
        stderr_bytes = stderr.as_ref().map_or(0, Vec::len),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "worker finished"
    );

    if !status.success() {
        let stderr = match stderr {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(error.message = %e, "stderr of failed worker unreadable");
                String::new()
            }
        };
        return Err(TransportError::NonZeroExit {
            code: status.exit_code,
            stderr,
        });
    }

    if let Err(e) = &stderr {
        tracing::warn!(error.message = %e, "stderr of worker unreadable");
    }
    decode_output(&stdout?, opts.output_excerpt_chars)
}

/// Decode the worker's stdout. Empty (or whitespace-only) output means `{}`.
pub fn decode_output(stdout: &[u8], excerpt_chars: usize) -> Result<Value, TransportError> {
    let text = match std::str::from_utf8(stdout) {
        Ok(text) => text,
        Err(e) => {
            return Err(TransportError::OutputDecode {
                message: format!("output is not valid UTF-8: {e}"),
                excerpt: excerpt(&String::from_utf8_lossy(stdout), excerpt_chars),
            })
        }
    };

    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_str(text).map_err(|e| TransportError::OutputDecode {
        message: e.to_string(),
        excerpt: excerpt(text, excerpt_chars),
    })
}

//! In-memory worker used by the transport and engine tests.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{ExitOutcome, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};

const KILLED: i32 = 128 + 9;

#[derive(Debug, Clone)]
pub(crate) struct FakeReply {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub delay: Duration,
    /// Keep stdout open this long after exiting, like a leftover child
    /// process that inherited the pipe.
    pub linger: Duration,
}

impl FakeReply {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            delay: Duration::ZERO,
            linger: Duration::ZERO,
        }
    }

    pub fn fail(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
            delay: Duration::ZERO,
            linger: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn lingering(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }
}

/// Lifetime of one fake transaction, from session start to exit.
#[derive(Debug, Clone)]
pub(crate) struct Span {
    pub action: String,
    pub started: Instant,
    pub ended: Instant,
}

type Respond = dyn Fn(&Value) -> FakeReply + Send + Sync;

#[derive(Clone)]
pub(crate) struct FakeWorker {
    respond: Arc<Respond>,
    spans: Arc<Mutex<Vec<Span>>>,
    kills: Arc<AtomicUsize>,
}

impl FakeWorker {
    /// Start args with this command fail like a missing executable.
    pub const MISSING: &'static str = "/nonexistent/worker";
    /// Start args with this command yield a session without a stdout pipe.
    pub const NO_STDOUT: &'static str = "/fake/no-stdout";
    /// Start args with this command yield a stderr pipe that fails to read.
    pub const BROKEN_STDERR: &'static str = "/fake/broken-stderr";

    pub fn new(respond: impl Fn(&Value) -> FakeReply + Send + Sync + 'static) -> Self {
        Self {
            respond: Arc::new(respond),
            spans: Arc::new(Mutex::new(Vec::new())),
            kills: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn spans(&self) -> Vec<Span> {
        self.spans.lock().unwrap().clone()
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunnerPlugin for FakeWorker {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> anyhow::Result<Box<dyn RunnerSession>> {
        if args.cmd == Self::MISSING {
            anyhow::bail!("No such file or directory (os error 2)");
        }

        let started = Instant::now();
        let (stdin_w, mut stdin_r) = tokio::io::duplex(64 * 1024);
        let (mut out_w, out_r) = tokio::io::duplex(64 * 1024);
        let (mut err_w, err_r) = tokio::io::duplex(64 * 1024);
        let (exit_tx, exit_rx) = oneshot::channel::<i32>();

        let respond = self.respond.clone();
        let spans = self.spans.clone();
        let task = tokio::spawn(async move {
            let mut request = Vec::new();
            let _ = stdin_r.read_to_end(&mut request).await;
            let request: Value = serde_json::from_slice(&request).unwrap_or(Value::Null);
            let action = request["action"].as_str().unwrap_or_default().to_string();

            let reply = respond(&request);
            tokio::time::sleep(reply.delay).await;
            let _ = out_w.write_all(reply.stdout.as_bytes()).await;
            let _ = err_w.write_all(reply.stderr.as_bytes()).await;
            drop(err_w);

            spans.lock().unwrap().push(Span {
                action,
                started,
                ended: Instant::now(),
            });
            let _ = exit_tx.send(reply.exit_code);
            tokio::time::sleep(reply.linger).await;
            drop(out_w);
        });

        let stdout: Option<Box<dyn AsyncRead + Unpin + Send>> = match args.cmd.as_str() {
            Self::NO_STDOUT => None,
            _ => Some(Box::new(out_r)),
        };
        let stderr: Box<dyn AsyncRead + Unpin + Send> = match args.cmd.as_str() {
            Self::BROKEN_STDERR => Box::new(
                tokio_test::io::Builder::new()
                    .read_error(std::io::Error::other("stderr pipe broke"))
                    .build(),
            ),
            _ => Box::new(err_r),
        };

        Ok(Box::new(FakeSession {
            stdin: Some(Box::new(stdin_w)),
            stdout,
            stderr: Some(stderr),
            exit_rx: Some(exit_rx),
            task,
            kills: self.kills.clone(),
        }))
    }
}

struct FakeSession {
    stdin: Option<Box<dyn AsyncWrite + Unpin + Send>>,
    stdout: Option<Box<dyn AsyncRead + Unpin + Send>>,
    stderr: Option<Box<dyn AsyncRead + Unpin + Send>>,
    exit_rx: Option<oneshot::Receiver<i32>>,
    task: JoinHandle<()>,
    kills: Arc<AtomicUsize>,
}

#[async_trait]
impl RunnerSession for FakeSession {
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
        self.stdin.take()
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout.take()
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stderr.take()
    }

    async fn signal(&mut self, _signal: Signal) -> anyhow::Result<()> {
        self.task.abort();
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<ExitOutcome> {
        let exit_code = match self.exit_rx.as_mut() {
            Some(rx) => rx.await.unwrap_or(KILLED),
            None => KILLED,
        };
        self.exit_rx = None;
        Ok(ExitOutcome { exit_code })
    }
}

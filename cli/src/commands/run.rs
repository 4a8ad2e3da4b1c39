use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use tcms_bridge_core::config::BridgeConfig;
use tcms_bridge_core::engine::ErrorPolicy;
use tcms_bridge_core::item::WorkItem;
use tcms_bridge_core::{Bridge, BridgeError, BridgeOptions, ItemError, ShapePolicy};
use tcms_bridge_plugins::factory::{build_runner, worker_start_args};

use super::cli::RunArgs;
use super::read_input;

/// One line on stderr per failed item.
#[derive(Debug, Serialize)]
struct FailureRecord<'a> {
    ts: String,
    item: usize,
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
}

impl<'a> FailureRecord<'a> {
    fn new(err: &ItemError, items: &'a [WorkItem]) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            item: err.index,
            kind: err.kind.label(),
            message: err.kind.to_string(),
            action: items.get(err.index).map(|i| i.action.as_str()),
        }
    }
}

/// The stderr line for one failed item, whichever policy produced it.
fn failure_line(err: &ItemError, items: &[WorkItem]) -> String {
    serde_json::to_string(&FailureRecord::new(err, items)).unwrap_or_else(|_| err.to_string())
}

/// Parse a JSONL stream of work items. Blank lines are skipped.
pub fn read_items(text: &str) -> Result<Vec<WorkItem>, BridgeError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<WorkItem>(line)
                .map_err(|e| BridgeError::Input(format!("line {}: {e}", n + 1)))
        })
        .collect()
}

/// Build the one item described by `--action`, `--params` and `--field`.
pub fn item_from_flags(args: &RunArgs) -> Result<Option<WorkItem>, BridgeError> {
    let Some(action) = &args.action else {
        return Ok(None);
    };
    let mut item = WorkItem::new(action.clone());
    if let Some(params) = &args.params {
        item = item.with_params(params.clone());
    }
    for pair in &args.fields {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| BridgeError::Input(format!("--field expects NAME=VALUE, got '{pair}'")))?;
        item = item.with_field(name.trim(), Value::String(value.to_string()));
    }
    Ok(Some(item))
}

fn apply_flags(cfg: &mut BridgeConfig, args: &RunArgs) {
    if let Some(v) = &args.url {
        cfg.credentials.url = v.clone();
    }
    if let Some(v) = &args.username {
        cfg.credentials.username = v.clone();
    }
    if let Some(v) = &args.password {
        cfg.credentials.password = v.clone();
    }
    if let Some(ms) = args.timeout_ms {
        cfg.worker.timeout_ms = ms;
    }
    if args.continue_on_error {
        cfg.batch.error_policy = ErrorPolicy::Continue;
    }
    if args.strict_shape {
        cfg.batch.shape_policy = ShapePolicy::Strict;
    }
}

fn spawn_ctrl_c(tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("ctrl-c received, cancelling batch");
            let _ = tx.send("interrupted by ctrl-c".to_string()).await;
        }
    });
}

pub async fn run_batch(args: RunArgs, mut cfg: BridgeConfig) -> Result<i32, BridgeError> {
    apply_flags(&mut cfg, &args);
    let credentials = cfg
        .credentials
        .to_credentials()
        .map_err(BridgeError::Config)?;

    let items = match item_from_flags(&args)? {
        Some(item) => vec![item],
        None => read_items(&read_input(args.input.as_deref()).await?)?,
    };

    let worker = worker_start_args().map_err(|e| BridgeError::Config(format!("{e:#}")))?;
    let bridge = Bridge::new(
        build_runner(),
        worker,
        credentials,
        BridgeOptions {
            transport: cfg.worker.transport_options(),
            shape: cfg.batch.shape_policy,
            error_policy: cfg.batch.error_policy,
        },
    );

    let (abort_tx, mut abort_rx) = mpsc::channel::<String>(1);
    spawn_ctrl_c(abort_tx);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_err: Option<std::io::Error> = None;

    let outcome = bridge
        .run_batch_with(&items, Some(&mut abort_rx), |record| {
            if write_err.is_some() {
                return;
            }
            let line = match serde_json::to_string(&record) {
                Ok(line) => line,
                Err(e) => {
                    write_err = Some(std::io::Error::other(e));
                    return;
                }
            };
            if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
                write_err = Some(e);
            }
        })
        .await;

    if let Some(e) = write_err {
        return Err(BridgeError::Io(e));
    }

    let failures = match outcome {
        Ok(failures) => failures,
        Err(stopped) => {
            eprintln!("{}", failure_line(&stopped, &items));
            return Ok(stopped.kind.exit_code());
        }
    };
    for failure in &failures {
        eprintln!("{}", failure_line(failure, &items));
    }

    Ok(failures.first().map(|f| f.kind.exit_code()).unwrap_or(0))
}

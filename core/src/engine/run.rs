use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::envelope::{Credentials, RequestEnvelope};
use crate::error::{ItemError, ItemErrorKind, TransportError};
use crate::item::WorkItem;
use crate::runner::{RunnerPlugin, RunnerStartArgs};
use crate::shape::{shape_result, OutputRecord};
use crate::transport;

use super::types::{BatchReport, BridgeOptions, ErrorPolicy};

/// Drives work items through the worker, one transaction at a time.
pub struct Bridge {
    runner: Arc<dyn RunnerPlugin>,
    worker: RunnerStartArgs,
    credentials: Credentials,
    options: BridgeOptions,
}

impl Bridge {
    pub fn new(
        runner: Arc<dyn RunnerPlugin>,
        worker: RunnerStartArgs,
        credentials: Credentials,
        options: BridgeOptions,
    ) -> Self {
        Self {
            runner,
            worker,
            credentials,
            options,
        }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Assemble, send and shape a single item.
    pub async fn run_item(
        &self,
        index: usize,
        item: &WorkItem,
        abort_rx: Option<&mut mpsc::Receiver<String>>,
    ) -> Result<Vec<OutputRecord>, ItemErrorKind> {
        let params = item.assemble_parameters()?;
        let envelope = RequestEnvelope::new(&self.credentials, item.action.clone(), params);

        let result = transport::execute(
            self.runner.as_ref(),
            &self.worker,
            &envelope,
            &self.options.transport,
            abort_rx,
        )
        .await?;

        shape_result(index, result, self.options.shape)
    }

    /// Run every item in order and collect the records.
    pub async fn run_batch(
        &self,
        items: &[WorkItem],
        abort_rx: Option<&mut mpsc::Receiver<String>>,
    ) -> Result<BatchReport, ItemError> {
        let mut records = Vec::new();
        let failures = self
            .run_batch_with(items, abort_rx, |record| records.push(record))
            .await?;
        Ok(BatchReport { records, failures })
    }

    /// Like [`Bridge::run_batch`], handing each record to `emit` as soon as
    /// its item finishes. Returns the failures kept under
    /// [`ErrorPolicy::Continue`].
    pub async fn run_batch_with(
        &self,
        items: &[WorkItem],
        mut abort_rx: Option<&mut mpsc::Receiver<String>>,
        mut emit: impl FnMut(OutputRecord),
    ) -> Result<Vec<ItemError>, ItemError> {
        let batch_id = uuid::Uuid::new_v4().to_string();
        let mut failures = Vec::new();

        tracing::info!(
            batch_id = %batch_id,
            items = items.len(),
            runner = self.runner.name(),
            policy = ?self.options.error_policy,
            "batch started"
        );

        for (index, item) in items.iter().enumerate() {
            if let Some(rx) = abort_rx.as_deref_mut() {
                if let Ok(reason) = rx.try_recv() {
                    tracing::warn!(batch_id = %batch_id, index, reason = %reason, "batch cancelled");
                    return Err(ItemError::new(index, TransportError::Cancelled { reason }));
                }
            }

            let span = tracing::info_span!("item", batch_id = %batch_id, index, action = %item.action);
            let outcome = self
                .run_item(index, item, abort_rx.as_deref_mut())
                .instrument(span)
                .await;

            match outcome {
                Ok(records) => {
                    tracing::debug!(index, records = records.len(), "item done");
                    records.into_iter().for_each(&mut emit);
                }
                Err(kind) => {
                    let err = ItemError::new(index, kind);
                    tracing::error!(
                        batch_id = %batch_id,
                        index,
                        error.kind = err.kind.label(),
                        error.message = %err.kind,
                        "item failed"
                    );
                    if err.is_cancelled() || self.options.error_policy == ErrorPolicy::Stop {
                        return Err(err);
                    }
                    failures.push(err);
                }
            }
        }

        tracing::info!(
            batch_id = %batch_id,
            items = items.len(),
            failures = failures.len(),
            "batch finished"
        );
        Ok(failures)
    }
}

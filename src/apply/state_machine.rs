//! Cell State Machine
//!
//! Applies committed entries to one cell, strictly in order. Each mutating
//! entry gets its own [`ApplyContext`]; once the handler returns, the entry's
//! metrics are folded into the batch totals and into the pending totals that
//! the [`MetricsReporter`](super::MetricsReporter) drains.

use super::{ApplyContext, ApplyMetrics};
use crate::commands::{lookup, Command, CommandExecutor, CommandKind};
use crate::response::{Response, ResponseResult};
use crate::storage::EngineResolver;
use tracing::{debug, trace};

/// The outcome of applying a batch of entries.
#[derive(Debug)]
pub struct AppliedBatch {
    /// One response per entry, in entry order
    pub responses: Vec<Response>,
    /// Metrics accumulated over the whole batch
    pub metrics: ApplyMetrics,
}

/// The apply path of a single cell.
///
/// Takes `&mut self` for every apply, so two entries of the same cell can
/// never run concurrently.
pub struct CellStateMachine<R> {
    cell_id: u64,
    executor: CommandExecutor<R>,
    pending: ApplyMetrics,
    applied: u64,
}

impl<R: EngineResolver> CellStateMachine<R> {
    pub fn new(cell_id: u64, executor: CommandExecutor<R>) -> Self {
        Self {
            cell_id,
            executor,
            pending: ApplyMetrics::default(),
            applied: 0,
        }
    }

    pub fn cell_id(&self) -> u64 {
        self.cell_id
    }

    /// Total number of entries applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Metrics accumulated since the last [`take_metrics`](Self::take_metrics).
    pub fn pending_metrics(&self) -> &ApplyMetrics {
        &self.pending
    }

    pub fn take_metrics(&mut self) -> ApplyMetrics {
        self.pending.take()
    }

    /// Applies one entry and returns its response.
    pub fn apply(&mut self, cmd: &Command) -> Response {
        let (rsp, metrics) = self.apply_entry(cmd);
        self.pending.merge(&metrics);
        rsp
    }

    /// Applies entries in order. A failing entry produces an error response
    /// and does not stop the rest of the batch.
    pub fn apply_batch(&mut self, cmds: &[Command]) -> AppliedBatch {
        let mut batch = AppliedBatch {
            responses: Vec::with_capacity(cmds.len()),
            metrics: ApplyMetrics::default(),
        };

        for cmd in cmds {
            let (rsp, metrics) = self.apply_entry(cmd);
            batch.metrics.merge(&metrics);
            batch.responses.push(rsp);
        }
        self.pending.merge(&batch.metrics);

        debug!(
            cell_id = self.cell_id,
            entries = cmds.len(),
            errors = batch.responses.iter().filter(|r| r.is_error()).count(),
            metrics = %batch.metrics,
            "Applied batch"
        );
        batch
    }

    fn apply_entry(&mut self, cmd: &Command) -> (Response, ApplyMetrics) {
        self.applied += 1;
        trace!(cell_id = self.cell_id, command = cmd.name(), "Applying entry");

        let (rsp, metrics) = match lookup(cmd.name()) {
            Some(CommandKind::Read(op)) => (
                self.executor.execute_read(self.cell_id, op, cmd),
                ApplyMetrics::default(),
            ),
            Some(CommandKind::Write(op)) => {
                let mut ctx = ApplyContext::new(self.cell_id);
                let rsp = self.executor.execute_write(&mut ctx, op, cmd);
                (rsp, ctx.into_metrics())
            }
            None => {
                let mut rsp = self.executor.pool().acquire();
                rsp.set_result(ResponseResult::error(format!(
                    "ERR unknown command '{}'",
                    cmd.name()
                )));
                (rsp, ApplyMetrics::default())
            }
        };

        if let Some(message) = rsp.error() {
            debug!(
                cell_id = self.cell_id,
                command = cmd.name(),
                error = %String::from_utf8_lossy(message),
                "Entry failed"
            );
        }
        (rsp, metrics)
    }
}

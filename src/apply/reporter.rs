//! Background Metrics Reporter
//!
//! Apply metrics are only useful once they reach the shard-lifecycle logic
//! that decides on splits and compactions. The reporter is the hand-off
//! point: a Tokio task that periodically drains the pending metrics of every
//! cell, logs them, and optionally forwards them to a channel.
//!
//! ## Design
//!
//! The reporter runs as a Tokio task and:
//! 1. Sleeps for a configurable interval (default: 1s)
//! 2. Drains the pending metrics of every cell from a [`MetricsSource`]
//! 3. Logs and forwards every cell whose metrics are non-zero
//!
//! Draining resets the cell's pending totals, so each applied entry is
//! reported exactly once.

use super::ApplyMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};

/// Anything that can hand over the pending metrics of its cells.
pub trait MetricsSource: Send + Sync + 'static {
    /// Returns and resets the pending metrics of every cell.
    fn drain_metrics(&self) -> Vec<CellReport>;
}

/// Metrics drained from one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReport {
    pub cell_id: u64,
    pub metrics: ApplyMetrics,
}

/// Configuration for the metrics reporter.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Interval between drains (default: 1s)
    pub interval: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// A handle to the running reporter.
///
/// When this handle is dropped, the reporter task will be stopped.
#[derive(Debug)]
pub struct MetricsReporter {
    shutdown_tx: watch::Sender<bool>,
}

impl MetricsReporter {
    /// Starts a reporter that only logs what it drains.
    pub fn start<S: MetricsSource>(source: Arc<S>, config: ReporterConfig) -> Self {
        Self::spawn(source, config, None)
    }

    /// Starts a reporter that also forwards every non-empty report to `sink`.
    ///
    /// ```ignore
    /// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    /// let _reporter = MetricsReporter::start_with_sink(node, ReporterConfig::default(), tx);
    ///
    /// while let Some(report) = rx.recv().await {
    ///     split_checker.observe(report.cell_id, report.metrics);
    /// }
    /// ```
    pub fn start_with_sink<S: MetricsSource>(
        source: Arc<S>,
        config: ReporterConfig,
        sink: mpsc::UnboundedSender<CellReport>,
    ) -> Self {
        Self::spawn(source, config, Some(sink))
    }

    fn spawn<S: MetricsSource>(
        source: Arc<S>,
        config: ReporterConfig,
        sink: Option<mpsc::UnboundedSender<CellReport>>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(reporter_loop(source, config.clone(), sink, shutdown_rx));

        info!(
            interval_ms = config.interval.as_millis(),
            "Metrics reporter started"
        );

        Self { shutdown_tx }
    }

    /// Stops the reporter.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        info!("Metrics reporter stopped");
    }
}

impl Drop for MetricsReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn reporter_loop<S: MetricsSource>(
    source: Arc<S>,
    config: ReporterConfig,
    mut sink: Option<mpsc::UnboundedSender<CellReport>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Metrics reporter received shutdown signal");
                    return;
                }
            }
        }

        let reports: Vec<_> = source
            .drain_metrics()
            .into_iter()
            .filter(|r| !r.metrics.is_zero())
            .collect();

        if reports.is_empty() {
            trace!("No cell metrics to report");
            continue;
        }

        let mut total = ApplyMetrics::default();
        for report in &reports {
            total.merge(&report.metrics);
            debug!(
                cell_id = report.cell_id,
                written_keys = report.metrics.written_keys,
                written_bytes = report.metrics.written_bytes,
                size_diff_hint = report.metrics.size_diff_hint,
                delete_keys_hint = report.metrics.delete_keys_hint,
                "Cell metrics"
            );

            if let Some(tx) = &sink {
                if tx.send(*report).is_err() {
                    debug!("Metrics sink closed, reporting to log only");
                    sink = None;
                }
            }
        }

        debug!(cells = reports.len(), metrics = %total, "Reported apply metrics");
    }
}

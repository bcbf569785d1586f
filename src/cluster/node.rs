//! Node
//!
//! A node hosts a fixed set of cells. Each cell owns a contiguous key range
//! and a [`CellStateMachine`] behind its own lock, so entries of one cell
//! apply strictly in order while different cells apply in parallel.

use super::range::CellRange;
use crate::apply::{AppliedBatch, CellReport, CellStateMachine, MetricsSource};
use crate::commands::{Command, CommandExecutor};
use crate::response::{Response, ResponsePool};
use crate::storage::EngineResolver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// One hosted cell.
pub struct Cell<R> {
    id: u64,
    range: CellRange,
    machine: Mutex<CellStateMachine<R>>,
}

impl<R: EngineResolver> Cell<R> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn range(&self) -> &CellRange {
        &self.range
    }

    /// Number of entries this cell has applied.
    pub fn applied(&self) -> u64 {
        self.lock().applied()
    }

    fn lock(&self) -> MutexGuard<'_, CellStateMachine<R>> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A set of cells sharing one engine resolver and one response pool.
pub struct Node<R> {
    cells: Vec<Cell<R>>,
    pool: Arc<ResponsePool>,
}

impl<R: EngineResolver> Node<R> {
    /// Creates a node with `cell_count` cells that split the keyspace evenly
    /// by first key byte. Cells are numbered from 1.
    pub fn new(resolver: Arc<R>, pool: Arc<ResponsePool>, cell_count: usize) -> Self {
        Self::with_ranges(resolver, pool, CellRange::split_keyspace(cell_count))
    }

    /// Creates a node from explicit ranges, which must be sorted, contiguous
    /// and cover the keyspace. Cell `i` gets id `i + 1`. An empty list is
    /// replaced by a single cell covering every key.
    pub fn with_ranges(
        resolver: Arc<R>,
        pool: Arc<ResponsePool>,
        mut ranges: Vec<CellRange>,
    ) -> Self {
        if ranges.is_empty() {
            warn!("No cell ranges given, hosting one cell for the whole keyspace");
            ranges.push(CellRange::full());
        }

        let executor = CommandExecutor::new(resolver, Arc::clone(&pool));

        let cells: Vec<_> = ranges
            .into_iter()
            .enumerate()
            .map(|(i, range)| {
                let id = i as u64 + 1;
                debug!(cell_id = id, range = %range, "Cell created");
                Cell {
                    id,
                    range,
                    machine: Mutex::new(CellStateMachine::new(id, executor.clone())),
                }
            })
            .collect();

        info!(cells = cells.len(), "Node initialized");
        Self { cells, pool }
    }

    pub fn pool(&self) -> &Arc<ResponsePool> {
        &self.pool
    }

    pub fn cells(&self) -> &[Cell<R>] {
        &self.cells
    }

    pub fn cell(&self, cell_id: u64) -> Option<&Cell<R>> {
        self.cells.iter().find(|c| c.id == cell_id)
    }

    /// The cell that owns `key`.
    ///
    /// Ranges are sorted, so this is the last cell whose start is <= `key`.
    pub fn route(&self, key: &[u8]) -> &Cell<R> {
        let idx = self
            .cells
            .partition_point(|c| &c.range.start[..] <= key)
            .saturating_sub(1);
        &self.cells[idx]
    }

    /// Routes a command by its key and applies it. Commands without a key
    /// land in the first cell, whose handler rejects them.
    pub fn apply(&self, cmd: &Command) -> Response {
        let key = cmd.key().map_or(&[][..], |k| &k[..]);
        self.route(key).lock().apply(cmd)
    }

    /// Applies a batch of entries to one cell. Returns `None` when the cell
    /// is not hosted here.
    pub fn apply_batch(&self, cell_id: u64, cmds: &[Command]) -> Option<AppliedBatch> {
        self.cell(cell_id).map(|cell| cell.lock().apply_batch(cmds))
    }
}

impl<R: EngineResolver + 'static> MetricsSource for Node<R> {
    fn drain_metrics(&self) -> Vec<CellReport> {
        self.cells
            .iter()
            .map(|cell| CellReport {
                cell_id: cell.id,
                metrics: cell.lock().take_metrics(),
            })
            .collect()
    }
}

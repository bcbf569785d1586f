//! # cellkv - Deterministic Command Application for a Cell-Partitioned KV Store
//!
//! cellkv is the apply layer of a replicated, Redis-style key-value store.
//! The keyspace is split into cells; every replica of a cell receives the same
//! committed command sequence and must produce byte-identical responses and
//! byte-identical usage metrics.
//!
//! ## Features
//!
//! - **Hash, list and set commands** dispatched through a static command table
//! - **Typed engine capabilities**: one trait per data type, resolved per cell
//! - **Apply metrics**: written keys, written bytes, size-diff and delete-key
//!   hints, computed from argument sizes and engine results only
//! - **Response pooling**: responses are acquired from and released to a
//!   shared pool
//! - **RESP front-end**: a Tokio server that routes commands to cells
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                cellkv                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│    Node     │                  │
//! │  │ (Listener)  │    │  Handler    │    │  (routing)  │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │ by key range            │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │  Command    │    │            CellStateMachine × N              │   │
//! │  │  Decoder    │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  └─────────────┘    │  │Cell 1  │ │Cell 2  │ │Cell 3  │ │...N    │ │   │
//! │                     │  │Mutex   │ │Mutex   │ │Mutex   │ │cells   │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────┬───────────────────────┘   │
//! │                                            │ CommandExecutor            │
//! │                                            ▼                            │
//! │                     ┌─────────────────────────────────────────────────┐ │
//! │                     │   EngineResolver: Hash / List / Set engines     │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! │                                                                         │
//! │                     ┌─────────────────────────────────────────────────┐ │
//! │                     │   MetricsReporter (Background Tokio Task)       │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use cellkv::apply::CellStateMachine;
//! use cellkv::commands::{Command, CommandExecutor};
//! use cellkv::response::ResponsePool;
//! use cellkv::storage::MemoryEngine;
//! use std::sync::Arc;
//!
//! let executor = CommandExecutor::new(Arc::new(MemoryEngine::new()), Arc::new(ResponsePool::new()));
//! let mut cell = CellStateMachine::new(1, executor);
//!
//! let rsp = cell.apply(&Command::from_parts("HSET", ["user:1", "name", "demo"]));
//! assert_eq!(rsp.integer(), Some(1));
//!
//! let metrics = cell.take_metrics();
//! assert_eq!(metrics.written_keys, 1);
//! assert_eq!(metrics.written_bytes, 8);
//! ```
//!
//! ## Module Overview
//!
//! - [`commands`]: Command model, argument validation, command table and handlers
//! - [`apply`]: Apply context, metrics, the per-cell state machine and reporter
//! - [`response`]: Response shapes and the response pool
//! - [`storage`]: Engine capability traits and the in-memory engine
//! - [`cluster`]: Cells, key ranges and routing
//! - [`protocol`]: RESP decoding and encoding
//! - [`connection`]: Client connection management
//!
//! ## Design Highlights
//!
//! ### Determinism
//!
//! Handlers never re-read engine state to compute metrics, and the in-memory
//! engine iterates in key order, so two replicas applying the same entries
//! agree on every byte.
//!
//! ### Failures are data
//!
//! Bad arity, unparseable numbers and engine errors all become error
//! responses. A failed entry never updates metrics and never stops a batch.

pub mod apply;
pub mod cluster;
pub mod commands;
pub mod connection;
pub mod protocol;
pub mod response;
pub mod storage;

// Re-export commonly used types for convenience
pub use apply::{ApplyContext, ApplyMetrics, CellStateMachine, MetricsReporter, ReporterConfig};
pub use cluster::Node;
pub use commands::{Command, CommandExecutor};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{CommandDecoder, DecodeError, RespValue};
pub use response::{Response, ResponsePool, ResponseResult};
pub use storage::{EngineError, EngineResolver, MemoryEngine};

/// The default port cellkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host cellkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default number of cells hosted by one node
pub const DEFAULT_CELLS: usize = 16;

/// Version of cellkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Command Application Module
//!
//! This module turns a decoded [`Command`] into a typed engine call for one
//! cell, shapes the outcome into a [`Response`](crate::response::Response),
//! and accounts mutating commands in an
//! [`ApplyContext`](crate::apply::ApplyContext).
//!
//! ## Architecture
//!
//! ```text
//! Committed entry
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ table::lookup   │  name → Read(op) | Write(op)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandExecutor │  (this module)
//! │                 │
//! │  - Validate     │  args.rs
//! │  - Execute      │  hash.rs / list.rs / set.rs
//! │  - Account      │  ApplyMetrics
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ EngineResolver  │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! ### Hash Commands
//! - `HSET`, `HGET`, `HDEL`, `HEXISTS`, `HMSET`, `HMGET`, `HSETNX`
//! - `HKEYS`, `HVALS`, `HGETALL`, `HSCANGET`, `HLEN`, `HSTRLEN`, `HINCRBY`
//!
//! ### List Commands
//! - `LPUSH`, `RPUSH`, `LPUSHX`, `RPUSHX`, `LPOP`, `RPOP`
//! - `LINDEX`, `LLEN`, `LRANGE`, `LINSERT`, `LREM`, `LSET`, `LTRIM`
//!
//! ### Set Commands
//! - `SADD`, `SREM`, `SCARD`, `SMEMBERS`, `SISMEMBER`, `SPOP`

pub mod args;
pub mod command;
pub mod executor;
mod hash;
mod list;
mod set;
pub mod table;

pub use args::{CommandError, CommandResult};
pub use command::Command;
pub use executor::CommandExecutor;
pub use table::{lookup, CommandKind, ReadCommand, WriteCommand, COMMAND_TABLE};

//! Connection Handler Module
//!
//! This module manages individual client connections to a cellkv node.
//! Each client connection is handled by its own async task; commands are
//! routed to the owning cell of the shared [`Node`](crate::cluster::Node).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (main.rs)                                │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│ Decode cmd  │───>│ Node::apply │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────────┐    │
//! │                                      │ Encode, release │    │
//! │                                      └─────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Uses Tokio for non-blocking network operations
//! - **Pipelining**: All commands decoded from one read are answered in one write
//! - **Statistics**: Tracks connection, command and error counts
//!
//! ## Example
//!
//! ```ignore
//! use cellkv::cluster::Node;
//! use cellkv::connection::{handle_connection, ConnectionStats};
//! use cellkv::response::ResponsePool;
//! use cellkv::storage::MemoryEngine;
//! use std::sync::Arc;
//!
//! let node = Arc::new(Node::new(
//!     Arc::new(MemoryEngine::new()),
//!     Arc::new(ResponsePool::new()),
//!     16,
//! ));
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, Arc::clone(&node), Arc::clone(&stats)));
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};

//! Storage Engine Module
//!
//! This module defines how the apply layer reaches the per-cell storage
//! engines, and ships a deterministic in-memory engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  EngineResolver (cell_id)                   │
//! │                                                             │
//! │   ┌────────────┐     ┌────────────┐     ┌────────────┐      │
//! │   │ HashEngine │     │ ListEngine │     │ SetEngine  │      │
//! │   └─────┬──────┘     └─────┬──────┘     └─────┬──────┘      │
//! │         └──────────────────┼──────────────────┘             │
//! │                            ▼                                │
//! │                 MemoryCell (one per cell)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use cellkv::storage::{EngineResolver, HashEngine, MemoryEngine};
//! use bytes::Bytes;
//!
//! let engine = MemoryEngine::new();
//! let hash = engine.hash_engine(1);
//!
//! let key = Bytes::from("user:1");
//! assert_eq!(hash.hset(&key, &Bytes::from("name"), &Bytes::from("demo")), Ok(1));
//! assert_eq!(hash.hget(&key, &Bytes::from("name")), Ok(Some(Bytes::from("demo"))));
//! ```

pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use memory::{MemoryCell, MemoryEngine, INSERT_AFTER, INSERT_BEFORE};
pub use traits::{
    EngineError, EngineResolver, EngineResult, FieldValue, HashEngine, ListEngine, PartialError,
    SetEngine,
};

//! Cluster Module
//!
//! Hosting and routing for cells. A [`Node`] owns a set of cells with
//! contiguous key ranges and routes each command to the cell that owns its
//! key.

pub mod node;
pub mod range;

pub use node::{Cell, Node};
pub use range::CellRange;

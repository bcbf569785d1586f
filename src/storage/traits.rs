//! Engine Capability Traits
//!
//! The apply layer never talks to a concrete storage engine. It talks to one
//! capability trait per data type, resolved per call from a cell id:
//!
//! - [`HashEngine`]: `HSET`, `HGET`, `HDEL`, `HMSET`, ...
//! - [`ListEngine`]: `LPUSH`, `LPOP`, `LRANGE`, `LINSERT`, ...
//! - [`SetEngine`]: `SADD`, `SREM`, `SMEMBERS`, `SPOP`, ...
//!
//! Integer-returning operations keep the engine convention of returning `i64`
//! so that the caller can distinguish "first write" (`1`) from other outcomes
//! without re-reading engine state.
//!
//! All operations take `&self`: an engine handle is a cheap, cloneable view
//! over cell-scoped state, and the state machine guarantees that a cell is
//! never mutated from two places at once.

use bytes::Bytes;
use thiserror::Error;

/// Errors a storage engine can report for a single operation.
///
/// The `Display` text of each variant is what ends up on the wire, so the
/// messages follow Redis conventions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The key exists but holds a different data type
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// The key does not exist and the operation requires it
    #[error("ERR no such key")]
    NoSuchKey,

    /// A list index is outside the list
    #[error("ERR index out of range")]
    IndexOutOfRange,

    /// A stored hash value is not an integer
    #[error("ERR hash value is not an integer")]
    NotAnInteger,

    /// An increment would overflow a signed 64-bit integer
    #[error("ERR increment or decrement would overflow")]
    Overflow,

    /// A positional or enumerated argument has an unsupported value
    #[error("ERR syntax error")]
    Syntax,

    /// Any other engine failure
    #[error("ERR {0}")]
    Internal(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Per-field failures reported by [`HashEngine::hmget`].
///
/// `errors` has exactly one slot per requested field, in request order;
/// `None` marks a field that was read successfully.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{} of {} fields failed", count_failed(.errors), .errors.len())]
pub struct PartialError {
    pub errors: Vec<Option<EngineError>>,
}

fn count_failed(errors: &[Option<EngineError>]) -> usize {
    errors.iter().filter(|e| e.is_some()).count()
}

/// A hash field together with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub field: Bytes,
    pub value: Bytes,
}

impl FieldValue {
    pub fn new(field: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Hash data structure operations for one cell.
pub trait HashEngine {
    /// Sets `field` to `value`. Returns 1 when the field was created, 0 when
    /// an existing field was overwritten.
    fn hset(&self, key: &Bytes, field: &Bytes, value: &Bytes) -> EngineResult<i64>;

    /// Returns the value of `field`, or `None` when the key or field is absent.
    fn hget(&self, key: &Bytes, field: &Bytes) -> EngineResult<Option<Bytes>>;

    /// Removes the given fields. Returns the number of fields removed.
    fn hdel(&self, key: &Bytes, fields: &[Bytes]) -> EngineResult<i64>;

    /// Sets every `fields[i]` to `values[i]`.
    fn hmset(&self, key: &Bytes, fields: &[Bytes], values: &[Bytes]) -> EngineResult<()>;

    /// Sets `field` only when it does not exist yet. Returns 1 when set.
    fn hsetnx(&self, key: &Bytes, field: &Bytes, value: &Bytes) -> EngineResult<i64>;

    /// Adds `increment` to the integer stored at `field` and returns the new
    /// value in its stored textual form.
    fn hincrby(&self, key: &Bytes, field: &Bytes, increment: i64) -> EngineResult<Bytes>;

    fn hexists(&self, key: &Bytes, field: &Bytes) -> EngineResult<bool>;

    fn hkeys(&self, key: &Bytes) -> EngineResult<Vec<Bytes>>;

    fn hvals(&self, key: &Bytes) -> EngineResult<Vec<Bytes>>;

    fn hgetall(&self, key: &Bytes) -> EngineResult<Vec<FieldValue>>;

    /// Returns at most `count` pairs whose field sorts at or after `start`.
    fn hscan_get(&self, key: &Bytes, start: &Bytes, count: i64) -> EngineResult<Vec<FieldValue>>;

    fn hlen(&self, key: &Bytes) -> EngineResult<i64>;

    /// Reads several fields at once. Missing fields read as `None`; fields
    /// that fail are reported slot by slot through [`PartialError`].
    fn hmget(&self, key: &Bytes, fields: &[Bytes]) -> Result<Vec<Option<Bytes>>, PartialError>;

    fn hstrlen(&self, key: &Bytes, field: &Bytes) -> EngineResult<i64>;
}

/// List data structure operations for one cell.
pub trait ListEngine {
    fn lindex(&self, key: &Bytes, index: i64) -> EngineResult<Option<Bytes>>;

    fn llen(&self, key: &Bytes) -> EngineResult<i64>;

    /// Inclusive range; negative indices count from the tail.
    fn lrange(&self, key: &Bytes, start: i64, stop: i64) -> EngineResult<Vec<Bytes>>;

    /// Inserts `value` before (`position == 0`) or after (`position == 1`)
    /// the first occurrence of `pivot`. Returns the new length, 0 when the
    /// key does not exist, or -1 when the pivot was not found.
    fn linsert(&self, key: &Bytes, position: i64, pivot: &Bytes, value: &Bytes)
        -> EngineResult<i64>;

    fn lpop(&self, key: &Bytes) -> EngineResult<Option<Bytes>>;

    /// Pushes each value to the head in argument order. Returns the new length.
    fn lpush(&self, key: &Bytes, values: &[Bytes]) -> EngineResult<i64>;

    /// Pushes to the head only when the list exists. Returns the new length,
    /// or 0 when nothing was pushed.
    fn lpushx(&self, key: &Bytes, value: &Bytes) -> EngineResult<i64>;

    /// Removes up to `count` occurrences of `value` (all when 0, from the
    /// tail when negative). Returns the number removed.
    fn lrem(&self, key: &Bytes, count: i64, value: &Bytes) -> EngineResult<i64>;

    fn lset(&self, key: &Bytes, index: i64, value: &Bytes) -> EngineResult<()>;

    fn ltrim(&self, key: &Bytes, start: i64, stop: i64) -> EngineResult<()>;

    fn rpop(&self, key: &Bytes) -> EngineResult<Option<Bytes>>;

    fn rpush(&self, key: &Bytes, values: &[Bytes]) -> EngineResult<i64>;

    fn rpushx(&self, key: &Bytes, value: &Bytes) -> EngineResult<i64>;
}

/// Set data structure operations for one cell.
pub trait SetEngine {
    /// Returns the number of members that were not already present.
    fn sadd(&self, key: &Bytes, members: &[Bytes]) -> EngineResult<i64>;

    /// Returns the number of members removed.
    fn srem(&self, key: &Bytes, members: &[Bytes]) -> EngineResult<i64>;

    fn scard(&self, key: &Bytes) -> EngineResult<i64>;

    fn smembers(&self, key: &Bytes) -> EngineResult<Vec<Bytes>>;

    /// Returns 1 when `member` belongs to the set, 0 otherwise.
    fn sismember(&self, key: &Bytes, member: &Bytes) -> EngineResult<i64>;

    fn spop(&self, key: &Bytes) -> EngineResult<Option<Bytes>>;
}

/// Resolves the engines that own a cell.
///
/// Resolution is total: routing guarantees that only hosted cells reach the
/// apply layer. The associated types keep dispatch static.
pub trait EngineResolver: Send + Sync {
    type Hash: HashEngine;
    type List: ListEngine;
    type Set: SetEngine;

    fn hash_engine(&self, cell_id: u64) -> Self::Hash;

    fn list_engine(&self, cell_id: u64) -> Self::List;

    fn set_engine(&self, cell_id: u64) -> Self::Set;
}

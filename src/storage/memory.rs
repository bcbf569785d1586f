//! In-Memory Cell Engine
//!
//! A deterministic, in-memory implementation of the hash, list and set
//! capability traits. Each cell owns one keyspace; a key holds exactly one
//! data type and any attempt to use it as another type fails with `WRONGTYPE`.
//!
//! ## Determinism
//!
//! Replicas of a cell must produce byte-identical responses, so nothing here
//! depends on hashing order or randomness:
//!
//! - hashes are `BTreeMap`s (HKEYS/HVALS/HGETALL come back in field order)
//! - sets are `BTreeSet`s (SMEMBERS is sorted, SPOP removes the smallest member)
//! - lists are `VecDeque`s for O(1) push/pop on both ends
//!
//! Containers that become empty are removed from the keyspace.

use crate::storage::traits::{
    EngineError, EngineResolver, EngineResult, FieldValue, HashEngine, ListEngine, PartialError,
    SetEngine,
};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

/// LINSERT position selecting "before the pivot".
pub const INSERT_BEFORE: i64 = 0;

/// LINSERT position selecting "after the pivot".
pub const INSERT_AFTER: i64 = 1;

/// A value stored under a key.
#[derive(Debug, Clone)]
enum Value {
    Hash(BTreeMap<Bytes, Bytes>),
    List(VecDeque<Bytes>),
    Set(BTreeSet<Bytes>),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Value::Hash(h) => h.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Set(s) => s.is_empty(),
        }
    }
}

type Keyspace = HashMap<Bytes, Value>;

/// The engine handle for a single cell.
///
/// Cloning is cheap; all clones share the same keyspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryCell {
    keyspace: Arc<RwLock<Keyspace>>,
}

impl MemoryCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored in this cell.
    pub fn len(&self) -> usize {
        self.read(|ks| ks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<T>(&self, f: impl FnOnce(&Keyspace) -> T) -> T {
        let ks = self.keyspace.read().unwrap_or_else(PoisonError::into_inner);
        f(&*ks)
    }

    /// Runs `f` under the write lock and drops `key` afterwards if its
    /// container ended up empty.
    fn write<T>(&self, key: &Bytes, f: impl FnOnce(&mut Keyspace) -> T) -> T {
        let mut ks = self.keyspace.write().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut *ks);
        if ks.get(key).is_some_and(Value::is_empty) {
            ks.remove(key);
        }
        out
    }
}

// ============================================================================
// Typed keyspace access
// ============================================================================

fn hash_ref<'a>(ks: &'a Keyspace, key: &Bytes) -> EngineResult<Option<&'a BTreeMap<Bytes, Bytes>>> {
    match ks.get(key) {
        None => Ok(None),
        Some(Value::Hash(h)) => Ok(Some(h)),
        Some(_) => Err(EngineError::WrongType),
    }
}

fn hash_mut<'a>(ks: &'a mut Keyspace, key: &Bytes) -> EngineResult<Option<&'a mut BTreeMap<Bytes, Bytes>>> {
    match ks.get_mut(key) {
        None => Ok(None),
        Some(Value::Hash(h)) => Ok(Some(h)),
        Some(_) => Err(EngineError::WrongType),
    }
}

fn hash_entry<'a>(ks: &'a mut Keyspace, key: &Bytes) -> EngineResult<&'a mut BTreeMap<Bytes, Bytes>> {
    match ks
        .entry(key.clone())
        .or_insert_with(|| Value::Hash(BTreeMap::new()))
    {
        Value::Hash(h) => Ok(h),
        _ => Err(EngineError::WrongType),
    }
}

fn list_ref<'a>(ks: &'a Keyspace, key: &Bytes) -> EngineResult<Option<&'a VecDeque<Bytes>>> {
    match ks.get(key) {
        None => Ok(None),
        Some(Value::List(l)) => Ok(Some(l)),
        Some(_) => Err(EngineError::WrongType),
    }
}

fn list_mut<'a>(ks: &'a mut Keyspace, key: &Bytes) -> EngineResult<Option<&'a mut VecDeque<Bytes>>> {
    match ks.get_mut(key) {
        None => Ok(None),
        Some(Value::List(l)) => Ok(Some(l)),
        Some(_) => Err(EngineError::WrongType),
    }
}

fn list_entry<'a>(ks: &'a mut Keyspace, key: &Bytes) -> EngineResult<&'a mut VecDeque<Bytes>> {
    match ks
        .entry(key.clone())
        .or_insert_with(|| Value::List(VecDeque::new()))
    {
        Value::List(l) => Ok(l),
        _ => Err(EngineError::WrongType),
    }
}

fn set_ref<'a>(ks: &'a Keyspace, key: &Bytes) -> EngineResult<Option<&'a BTreeSet<Bytes>>> {
    match ks.get(key) {
        None => Ok(None),
        Some(Value::Set(s)) => Ok(Some(s)),
        Some(_) => Err(EngineError::WrongType),
    }
}

fn set_mut<'a>(ks: &'a mut Keyspace, key: &Bytes) -> EngineResult<Option<&'a mut BTreeSet<Bytes>>> {
    match ks.get_mut(key) {
        None => Ok(None),
        Some(Value::Set(s)) => Ok(Some(s)),
        Some(_) => Err(EngineError::WrongType),
    }
}

fn set_entry<'a>(ks: &'a mut Keyspace, key: &Bytes) -> EngineResult<&'a mut BTreeSet<Bytes>> {
    match ks
        .entry(key.clone())
        .or_insert_with(|| Value::Set(BTreeSet::new()))
    {
        Value::Set(s) => Ok(s),
        _ => Err(EngineError::WrongType),
    }
}

/// Converts a possibly negative list index into an offset, if in range.
fn list_offset(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let actual = if index < 0 { len + index } else { index };
    (0..len).contains(&actual).then_some(actual as usize)
}

/// Normalises an inclusive `start..=stop` range against a list length.
/// Returns `None` when the range selects nothing.
fn list_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

fn parse_stored_integer(value: &[u8]) -> EngineResult<i64> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(EngineError::NotAnInteger)
}

// ============================================================================
// Hash operations
// ============================================================================

impl HashEngine for MemoryCell {
    fn hset(&self, key: &Bytes, field: &Bytes, value: &Bytes) -> EngineResult<i64> {
        self.write(key, |ks| {
            let hash = hash_entry(ks, key)?;
            Ok(i64::from(hash.insert(field.clone(), value.clone()).is_none()))
        })
    }

    fn hget(&self, key: &Bytes, field: &Bytes) -> EngineResult<Option<Bytes>> {
        self.read(|ks| Ok(hash_ref(ks, key)?.and_then(|h| h.get(field).cloned())))
    }

    fn hdel(&self, key: &Bytes, fields: &[Bytes]) -> EngineResult<i64> {
        self.write(key, |ks| {
            let Some(hash) = hash_mut(ks, key)? else {
                return Ok(0);
            };
            Ok(fields.iter().filter(|f| hash.remove(*f).is_some()).count() as i64)
        })
    }

    fn hmset(&self, key: &Bytes, fields: &[Bytes], values: &[Bytes]) -> EngineResult<()> {
        if fields.len() != values.len() {
            return Err(EngineError::Internal(
                "fields and values differ in length".to_string(),
            ));
        }

        self.write(key, |ks| {
            let hash = hash_entry(ks, key)?;
            for (field, value) in fields.iter().zip(values) {
                hash.insert(field.clone(), value.clone());
            }
            Ok(())
        })
    }

    fn hsetnx(&self, key: &Bytes, field: &Bytes, value: &Bytes) -> EngineResult<i64> {
        self.write(key, |ks| {
            let hash = hash_entry(ks, key)?;
            if hash.contains_key(field) {
                return Ok(0);
            }
            hash.insert(field.clone(), value.clone());
            Ok(1)
        })
    }

    fn hincrby(&self, key: &Bytes, field: &Bytes, increment: i64) -> EngineResult<Bytes> {
        self.write(key, |ks| {
            let hash = hash_entry(ks, key)?;
            let current = match hash.get(field) {
                Some(v) => parse_stored_integer(v)?,
                None => 0,
            };
            let next = current
                .checked_add(increment)
                .ok_or(EngineError::Overflow)?;

            let stored = Bytes::from(next.to_string());
            hash.insert(field.clone(), stored.clone());
            Ok(stored)
        })
    }

    fn hexists(&self, key: &Bytes, field: &Bytes) -> EngineResult<bool> {
        self.read(|ks| Ok(hash_ref(ks, key)?.is_some_and(|h| h.contains_key(field))))
    }

    fn hkeys(&self, key: &Bytes) -> EngineResult<Vec<Bytes>> {
        self.read(|ks| {
            Ok(hash_ref(ks, key)?
                .map(|h| h.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn hvals(&self, key: &Bytes) -> EngineResult<Vec<Bytes>> {
        self.read(|ks| {
            Ok(hash_ref(ks, key)?
                .map(|h| h.values().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn hgetall(&self, key: &Bytes) -> EngineResult<Vec<FieldValue>> {
        self.read(|ks| {
            Ok(hash_ref(ks, key)?
                .map(|h| {
                    h.iter()
                        .map(|(f, v)| FieldValue::new(f.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn hscan_get(&self, key: &Bytes, start: &Bytes, count: i64) -> EngineResult<Vec<FieldValue>> {
        self.read(|ks| {
            let Some(hash) = hash_ref(ks, key)? else {
                return Ok(Vec::new());
            };
            let count = usize::try_from(count).unwrap_or(0);

            Ok(hash
                .range(start.clone()..)
                .take(count)
                .map(|(f, v)| FieldValue::new(f.clone(), v.clone()))
                .collect())
        })
    }

    fn hlen(&self, key: &Bytes) -> EngineResult<i64> {
        self.read(|ks| Ok(hash_ref(ks, key)?.map_or(0, |h| h.len() as i64)))
    }

    fn hmget(&self, key: &Bytes, fields: &[Bytes]) -> Result<Vec<Option<Bytes>>, PartialError> {
        self.read(|ks| match hash_ref(ks, key) {
            Ok(hash) => Ok(fields
                .iter()
                .map(|f| hash.and_then(|h| h.get(f).cloned()))
                .collect()),
            // The whole key is unusable, so every requested field fails.
            Err(e) => Err(PartialError {
                errors: vec![Some(e); fields.len()],
            }),
        })
    }

    fn hstrlen(&self, key: &Bytes, field: &Bytes) -> EngineResult<i64> {
        self.read(|ks| {
            Ok(hash_ref(ks, key)?
                .and_then(|h| h.get(field))
                .map_or(0, |v| v.len() as i64))
        })
    }
}

// ============================================================================
// List operations
// ============================================================================

impl ListEngine for MemoryCell {
    fn lindex(&self, key: &Bytes, index: i64) -> EngineResult<Option<Bytes>> {
        self.read(|ks| {
            Ok(list_ref(ks, key)?
                .and_then(|l| list_offset(l.len(), index).and_then(|i| l.get(i).cloned())))
        })
    }

    fn llen(&self, key: &Bytes) -> EngineResult<i64> {
        self.read(|ks| Ok(list_ref(ks, key)?.map_or(0, |l| l.len() as i64)))
    }

    fn lrange(&self, key: &Bytes, start: i64, stop: i64) -> EngineResult<Vec<Bytes>> {
        self.read(|ks| {
            let Some(list) = list_ref(ks, key)? else {
                return Ok(Vec::new());
            };
            Ok(match list_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            })
        })
    }

    fn linsert(
        &self,
        key: &Bytes,
        position: i64,
        pivot: &Bytes,
        value: &Bytes,
    ) -> EngineResult<i64> {
        if position != INSERT_BEFORE && position != INSERT_AFTER {
            return Err(EngineError::Syntax);
        }

        self.write(key, |ks| {
            let Some(list) = list_mut(ks, key)? else {
                return Ok(0);
            };
            let Some(at) = list.iter().position(|v| v == pivot) else {
                return Ok(-1);
            };

            let at = if position == INSERT_AFTER { at + 1 } else { at };
            list.insert(at, value.clone());
            Ok(list.len() as i64)
        })
    }

    fn lpop(&self, key: &Bytes) -> EngineResult<Option<Bytes>> {
        self.write(key, |ks| Ok(list_mut(ks, key)?.and_then(|l| l.pop_front())))
    }

    fn lpush(&self, key: &Bytes, values: &[Bytes]) -> EngineResult<i64> {
        self.write(key, |ks| {
            let list = list_entry(ks, key)?;
            // LPUSH key a b c leaves c at the head
            for value in values {
                list.push_front(value.clone());
            }
            Ok(list.len() as i64)
        })
    }

    fn lpushx(&self, key: &Bytes, value: &Bytes) -> EngineResult<i64> {
        self.write(key, |ks| {
            let Some(list) = list_mut(ks, key)? else {
                return Ok(0);
            };
            list.push_front(value.clone());
            Ok(list.len() as i64)
        })
    }

    fn lrem(&self, key: &Bytes, count: i64, value: &Bytes) -> EngineResult<i64> {
        self.write(key, |ks| {
            let Some(list) = list_mut(ks, key)? else {
                return Ok(0);
            };

            let max_remove = if count == 0 {
                usize::MAX
            } else {
                count.unsigned_abs() as usize
            };
            let mut removed = 0usize;

            if count >= 0 {
                let mut i = 0;
                while i < list.len() && removed < max_remove {
                    if &list[i] == value {
                        list.remove(i);
                        removed += 1;
                    } else {
                        i += 1;
                    }
                }
            } else {
                let mut i = list.len();
                while i > 0 && removed < max_remove {
                    i -= 1;
                    if &list[i] == value {
                        list.remove(i);
                        removed += 1;
                    }
                }
            }

            Ok(removed as i64)
        })
    }

    fn lset(&self, key: &Bytes, index: i64, value: &Bytes) -> EngineResult<()> {
        self.write(key, |ks| {
            let list = list_mut(ks, key)?.ok_or(EngineError::NoSuchKey)?;
            let at = list_offset(list.len(), index).ok_or(EngineError::IndexOutOfRange)?;
            list[at] = value.clone();
            Ok(())
        })
    }

    fn ltrim(&self, key: &Bytes, start: i64, stop: i64) -> EngineResult<()> {
        self.write(key, |ks| {
            let Some(list) = list_mut(ks, key)? else {
                return Ok(());
            };
            match list_range(list.len(), start, stop) {
                Some((from, to)) => {
                    list.truncate(to + 1);
                    list.drain(..from);
                }
                None => list.clear(),
            }
            Ok(())
        })
    }

    fn rpop(&self, key: &Bytes) -> EngineResult<Option<Bytes>> {
        self.write(key, |ks| Ok(list_mut(ks, key)?.and_then(|l| l.pop_back())))
    }

    fn rpush(&self, key: &Bytes, values: &[Bytes]) -> EngineResult<i64> {
        self.write(key, |ks| {
            let list = list_entry(ks, key)?;
            list.extend(values.iter().cloned());
            Ok(list.len() as i64)
        })
    }

    fn rpushx(&self, key: &Bytes, value: &Bytes) -> EngineResult<i64> {
        self.write(key, |ks| {
            let Some(list) = list_mut(ks, key)? else {
                return Ok(0);
            };
            list.push_back(value.clone());
            Ok(list.len() as i64)
        })
    }
}

// ============================================================================
// Set operations
// ============================================================================

impl SetEngine for MemoryCell {
    fn sadd(&self, key: &Bytes, members: &[Bytes]) -> EngineResult<i64> {
        self.write(key, |ks| {
            let set = set_entry(ks, key)?;
            Ok(members.iter().filter(|m| set.insert((*m).clone())).count() as i64)
        })
    }

    fn srem(&self, key: &Bytes, members: &[Bytes]) -> EngineResult<i64> {
        self.write(key, |ks| {
            let Some(set) = set_mut(ks, key)? else {
                return Ok(0);
            };
            Ok(members.iter().filter(|m| set.remove(*m)).count() as i64)
        })
    }

    fn scard(&self, key: &Bytes) -> EngineResult<i64> {
        self.read(|ks| Ok(set_ref(ks, key)?.map_or(0, |s| s.len() as i64)))
    }

    fn smembers(&self, key: &Bytes) -> EngineResult<Vec<Bytes>> {
        self.read(|ks| {
            Ok(set_ref(ks, key)?
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn sismember(&self, key: &Bytes, member: &Bytes) -> EngineResult<i64> {
        self.read(|ks| Ok(i64::from(set_ref(ks, key)?.is_some_and(|s| s.contains(member)))))
    }

    fn spop(&self, key: &Bytes) -> EngineResult<Option<Bytes>> {
        self.write(key, |ks| Ok(set_mut(ks, key)?.and_then(|s| s.pop_first())))
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Hosts one [`MemoryCell`] per cell id, created on first use.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    cells: RwLock<HashMap<u64, MemoryCell>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `cell_id`, creating an empty cell if needed.
    pub fn cell(&self, cell_id: u64) -> MemoryCell {
        if let Some(cell) = self
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&cell_id)
        {
            return cell.clone();
        }

        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(cell_id)
            .or_default()
            .clone()
    }

    /// Number of cells that have been touched so far.
    pub fn cell_count(&self) -> usize {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EngineResolver for MemoryEngine {
    type Hash = MemoryCell;
    type List = MemoryCell;
    type Set = MemoryCell;

    fn hash_engine(&self, cell_id: u64) -> MemoryCell {
        self.cell(cell_id)
    }

    fn list_engine(&self, cell_id: u64) -> MemoryCell {
        self.cell(cell_id)
    }

    fn set_engine(&self, cell_id: u64) -> MemoryCell {
        self.cell(cell_id)
    }
}

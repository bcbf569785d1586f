//! Command Executor
//!
//! Owns the engine resolver and the response pool, and exposes one handler per
//! supported command. The handlers themselves live next to their data type in
//! `hash.rs`, `list.rs` and `set.rs`.

use super::args::CommandResult;
use super::table::{ReadCommand, WriteCommand};
use super::Command;
use crate::apply::ApplyContext;
use crate::response::{Response, ResponsePool, ResponseResult};
use crate::storage::EngineResolver;
use std::sync::Arc;

/// Applies decoded commands to the engines of a cell.
///
/// Every handler acquires exactly one [`Response`] from the pool and fills it
/// with either a result or an error. Failures never update metrics: handlers
/// only touch the [`ApplyContext`] after the engine call has succeeded.
pub struct CommandExecutor<R> {
    resolver: Arc<R>,
    pool: Arc<ResponsePool>,
}

impl<R> Clone for CommandExecutor<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<R: EngineResolver> CommandExecutor<R> {
    pub fn new(resolver: Arc<R>, pool: Arc<ResponsePool>) -> Self {
        Self { resolver, pool }
    }

    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    pub fn pool(&self) -> &Arc<ResponsePool> {
        &self.pool
    }

    /// Runs a read-only command against `cell_id`.
    pub fn execute_read(&self, cell_id: u64, op: ReadCommand, cmd: &Command) -> Response {
        match op {
            ReadCommand::HGet => self.hget(cell_id, cmd),
            ReadCommand::HExists => self.hexists(cell_id, cmd),
            ReadCommand::HKeys => self.hkeys(cell_id, cmd),
            ReadCommand::HVals => self.hvals(cell_id, cmd),
            ReadCommand::HGetAll => self.hgetall(cell_id, cmd),
            ReadCommand::HScanGet => self.hscan_get(cell_id, cmd),
            ReadCommand::HLen => self.hlen(cell_id, cmd),
            ReadCommand::HMGet => self.hmget(cell_id, cmd),
            ReadCommand::HStrLen => self.hstrlen(cell_id, cmd),
            ReadCommand::LIndex => self.lindex(cell_id, cmd),
            ReadCommand::LLen => self.llen(cell_id, cmd),
            ReadCommand::LRange => self.lrange(cell_id, cmd),
            ReadCommand::SCard => self.scard(cell_id, cmd),
            ReadCommand::SMembers => self.smembers(cell_id, cmd),
            ReadCommand::SIsMember => self.sismember(cell_id, cmd),
        }
    }

    /// Runs a mutating command, recording its metrics in `ctx`.
    pub fn execute_write(
        &self,
        ctx: &mut ApplyContext,
        op: WriteCommand,
        cmd: &Command,
    ) -> Response {
        match op {
            WriteCommand::HSet => self.hset(ctx, cmd),
            WriteCommand::HDel => self.hdel(ctx, cmd),
            WriteCommand::HMSet => self.hmset(ctx, cmd),
            WriteCommand::HSetNX => self.hsetnx(ctx, cmd),
            WriteCommand::HIncrBy => self.hincrby(ctx, cmd),
            WriteCommand::LInsert => self.linsert(ctx, cmd),
            WriteCommand::LPop => self.lpop(ctx, cmd),
            WriteCommand::LPush => self.lpush(ctx, cmd),
            WriteCommand::LPushX => self.lpushx(ctx, cmd),
            WriteCommand::LRem => self.lrem(ctx, cmd),
            WriteCommand::LSet => self.lset(ctx, cmd),
            WriteCommand::LTrim => self.ltrim(ctx, cmd),
            WriteCommand::RPop => self.rpop(ctx, cmd),
            WriteCommand::RPush => self.rpush(ctx, cmd),
            WriteCommand::RPushX => self.rpushx(ctx, cmd),
            WriteCommand::SAdd => self.sadd(ctx, cmd),
            WriteCommand::SRem => self.srem(ctx, cmd),
            WriteCommand::SPop => self.spop(ctx, cmd),
        }
    }

    /// Acquires a response and fills it with the outcome of `f`.
    pub(super) fn respond(&self, f: impl FnOnce() -> CommandResult<ResponseResult>) -> Response {
        let mut rsp = self.pool.acquire();
        rsp.set_result(f().unwrap_or_else(|e| e.into_result()));
        rsp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::ApplyMetrics;
    use crate::commands::table::{lookup, CommandKind};
    use crate::response::INVALID_COMMAND;
    use crate::storage::{
        EngineError, EngineResult, FieldValue, HashEngine, MemoryCell, MemoryEngine, PartialError,
    };
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CELL: u64 = 1;

    /// A field name that makes HMGET fail for that slot.
    const POISON: &str = "poison";

    /// Hash engine that fails HMGET on poisoned fields and delegates
    /// everything else.
    struct FaultyHash(MemoryCell);

    impl HashEngine for FaultyHash {
        fn hset(&self, key: &Bytes, field: &Bytes, value: &Bytes) -> EngineResult<i64> {
            self.0.hset(key, field, value)
        }
        fn hget(&self, key: &Bytes, field: &Bytes) -> EngineResult<Option<Bytes>> {
            self.0.hget(key, field)
        }
        fn hdel(&self, key: &Bytes, fields: &[Bytes]) -> EngineResult<i64> {
            self.0.hdel(key, fields)
        }
        fn hmset(&self, key: &Bytes, fields: &[Bytes], values: &[Bytes]) -> EngineResult<()> {
            self.0.hmset(key, fields, values)
        }
        fn hsetnx(&self, key: &Bytes, field: &Bytes, value: &Bytes) -> EngineResult<i64> {
            self.0.hsetnx(key, field, value)
        }
        fn hincrby(&self, key: &Bytes, field: &Bytes, increment: i64) -> EngineResult<Bytes> {
            self.0.hincrby(key, field, increment)
        }
        fn hexists(&self, key: &Bytes, field: &Bytes) -> EngineResult<bool> {
            self.0.hexists(key, field)
        }
        fn hkeys(&self, key: &Bytes) -> EngineResult<Vec<Bytes>> {
            self.0.hkeys(key)
        }
        fn hvals(&self, key: &Bytes) -> EngineResult<Vec<Bytes>> {
            self.0.hvals(key)
        }
        fn hgetall(&self, key: &Bytes) -> EngineResult<Vec<FieldValue>> {
            self.0.hgetall(key)
        }
        fn hscan_get(
            &self,
            key: &Bytes,
            start: &Bytes,
            count: i64,
        ) -> EngineResult<Vec<FieldValue>> {
            self.0.hscan_get(key, start, count)
        }
        fn hlen(&self, key: &Bytes) -> EngineResult<i64> {
            self.0.hlen(key)
        }
        fn hmget(
            &self,
            key: &Bytes,
            fields: &[Bytes],
        ) -> Result<Vec<Option<Bytes>>, PartialError> {
            let values = self.0.hmget(key, fields)?;
            let errors: Vec<_> = fields
                .iter()
                .map(|f| {
                    (f == POISON.as_bytes())
                        .then(|| EngineError::Internal("poisoned field".to_string()))
                })
                .collect();

            if errors.iter().any(Option::is_some) {
                return Err(PartialError { errors });
            }
            Ok(values)
        }
        fn hstrlen(&self, key: &Bytes, field: &Bytes) -> EngineResult<i64> {
            self.0.hstrlen(key, field)
        }
    }

    /// Resolver that counts how often an engine was resolved.
    #[derive(Default)]
    struct CountingResolver {
        engine: MemoryEngine,
        resolved: AtomicUsize,
    }

    impl CountingResolver {
        fn cell(&self, cell_id: u64) -> MemoryCell {
            self.resolved.fetch_add(1, Ordering::SeqCst);
            self.engine.cell(cell_id)
        }
    }

    impl EngineResolver for CountingResolver {
        type Hash = FaultyHash;
        type List = MemoryCell;
        type Set = MemoryCell;

        fn hash_engine(&self, cell_id: u64) -> FaultyHash {
            FaultyHash(self.cell(cell_id))
        }
        fn list_engine(&self, cell_id: u64) -> MemoryCell {
            self.cell(cell_id)
        }
        fn set_engine(&self, cell_id: u64) -> MemoryCell {
            self.cell(cell_id)
        }
    }

    struct Harness {
        executor: CommandExecutor<CountingResolver>,
        ctx: ApplyContext,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                executor: CommandExecutor::new(
                    Arc::new(CountingResolver::default()),
                    Arc::new(ResponsePool::new()),
                ),
                ctx: ApplyContext::new(CELL),
            }
        }

        /// Dispatches through the command table.
        fn run(&mut self, name: &str, args: &[&str]) -> Response {
            let cmd = Command::from_parts(name, args.iter().copied());
            match lookup(name).expect("known command") {
                CommandKind::Read(op) => self.executor.execute_read(CELL, op, &cmd),
                CommandKind::Write(op) => self.executor.execute_write(&mut self.ctx, op, &cmd),
            }
        }

        /// Runs a command and returns the metrics it produced on its own.
        fn run_measured(&mut self, name: &str, args: &[&str]) -> (Response, ApplyMetrics) {
            let before = *self.ctx.metrics();
            let rsp = self.run(name, args);
            let after = *self.ctx.metrics();
            (rsp, diff(&before, &after))
        }

        fn resolved(&self) -> usize {
            self.executor.resolver().resolved.load(Ordering::SeqCst)
        }
    }

    fn diff(before: &ApplyMetrics, after: &ApplyMetrics) -> ApplyMetrics {
        ApplyMetrics {
            written_keys: after.written_keys - before.written_keys,
            written_bytes: after.written_bytes - before.written_bytes,
            size_diff_hint: after.size_diff_hint - before.size_diff_hint,
            delete_keys_hint: after.delete_keys_hint - before.delete_keys_hint,
        }
    }

    fn metrics(keys: u64, bytes: u64, size: i64, deletes: u64) -> ApplyMetrics {
        ApplyMetrics {
            written_keys: keys,
            written_bytes: bytes,
            size_diff_hint: size,
            delete_keys_hint: deletes,
        }
    }

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    fn some(items: &[&str]) -> Vec<Option<Bytes>> {
        items.iter().map(|s| Some(b(s))).collect()
    }

    // ========================================================================
    // Argument validation
    // ========================================================================

    /// Argument counts each command must reject.
    const BAD_ARITIES: &[(&str, &[usize])] = &[
        ("HSET", &[0, 2, 4]),
        ("HGET", &[0, 1, 3]),
        ("HDEL", &[0, 1]),
        ("HEXISTS", &[0, 1, 3]),
        ("HKEYS", &[0, 2]),
        ("HVALS", &[0, 2]),
        ("HGETALL", &[0, 2]),
        ("HSCANGET", &[0, 2, 4]),
        ("HLEN", &[0, 2]),
        ("HMGET", &[0, 1]),
        ("HMSET", &[0, 1, 2, 4, 6]),
        ("HSETNX", &[0, 2, 4]),
        ("HSTRLEN", &[0, 1, 3]),
        ("HINCRBY", &[0, 2, 4]),
        ("LINDEX", &[0, 1, 3]),
        ("LINSERT", &[0, 3, 5]),
        ("LLEN", &[0, 2]),
        ("LPOP", &[0, 2]),
        ("LPUSH", &[0, 1]),
        ("LPUSHX", &[0, 1, 3]),
        ("LRANGE", &[0, 2, 4]),
        ("LREM", &[0, 2, 4]),
        ("LSET", &[0, 2, 4]),
        ("LTRIM", &[0, 2, 4]),
        ("RPOP", &[0, 2]),
        ("RPUSH", &[0, 1]),
        ("RPUSHX", &[0, 1, 3]),
        ("SADD", &[0, 1]),
        ("SREM", &[0, 1]),
        ("SCARD", &[0, 2]),
        ("SMEMBERS", &[0, 2]),
        ("SISMEMBER", &[0, 1, 3]),
        ("SPOP", &[0, 2]),
    ];

    #[test]
    fn test_bad_arity_is_invalid_command() {
        assert_eq!(BAD_ARITIES.len(), crate::commands::COMMAND_TABLE.len());

        let mut h = Harness::new();
        let args = ["1"; 8];

        for (name, counts) in BAD_ARITIES {
            for &count in *counts {
                let rsp = h.run(name, &args[..count]);
                assert_eq!(
                    rsp.error(),
                    Some(INVALID_COMMAND.as_bytes()),
                    "{} with {} args",
                    name,
                    count
                );
            }
        }

        assert_eq!(h.resolved(), 0);
        assert!(h.ctx.metrics().is_zero());
    }

    #[test]
    fn test_parse_failure_keeps_parser_message() {
        let mut h = Harness::new();

        for (name, args) in [
            ("LINDEX", &["l", "x"][..]),
            ("LRANGE", &["l", "0", "end"][..]),
            ("LTRIM", &["l", "zero", "1"][..]),
            ("LSET", &["l", "1.5", "v"][..]),
            ("LREM", &["l", "", "v"][..]),
            ("LINSERT", &["l", "before", "p", "v"][..]),
            ("HINCRBY", &["h", "f", "ten"][..]),
            ("HSCANGET", &["h", "", "many"][..]),
        ] {
            let rsp = h.run(name, args);
            let message = rsp.error().expect("error response");
            assert_ne!(message, INVALID_COMMAND.as_bytes(), "{}", name);
            assert!(
                message == b"invalid digit found in string"
                    || message == b"cannot parse integer from empty string",
                "{}: {}",
                name,
                String::from_utf8_lossy(message)
            );
        }

        assert_eq!(h.resolved(), 0);
        assert!(h.ctx.metrics().is_zero());
    }

    // ========================================================================
    // Hash commands
    // ========================================================================

    #[test]
    fn test_hset_new_then_overwrite() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("HSET", &["k", "f", "v"]);
        assert_eq!(rsp.integer(), Some(1));
        assert_eq!(m, metrics(1, 2, 2, 0));

        let (rsp, m) = h.run_measured("HSET", &["k", "f", "v2"]);
        assert_eq!(rsp.integer(), Some(0));
        assert!(m.is_zero());
    }

    #[test]
    fn test_hget_empty_vs_absent() {
        let mut h = Harness::new();
        h.run("HSET", &["k", "empty", ""]);

        let rsp = h.run("HGET", &["k", "empty"]);
        assert!(rsp.has_empty_bulk_result());
        assert!(!rsp.is_nil());

        for args in [["k", "missing"], ["nokey", "f"]] {
            let rsp = h.run("HGET", &args);
            assert!(rsp.is_nil());
            assert!(!rsp.has_empty_bulk_result());
        }
    }

    #[test]
    fn test_hdel_counts_every_requested_field() {
        let mut h = Harness::new();
        h.run("HMSET", &["k", "a", "1", "b", "2"]);

        let (rsp, m) = h.run_measured("HDEL", &["k", "a", "zzz"]);
        assert_eq!(rsp.integer(), Some(1));
        assert_eq!(m, metrics(0, 0, -4, 0));

        let (rsp, m) = h.run_measured("HDEL", &["k", "nope"]);
        assert_eq!(rsp.integer(), Some(0));
        assert!(m.is_zero());
    }

    #[test]
    fn test_hmset_always_credits() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("HMSET", &["k", "f1", "v1", "f2", "v22"]);
        assert_eq!(rsp.status(), Some("OK"));
        assert_eq!(m, metrics(1, 9, 9, 0));

        // Overwrites are credited again.
        let (_, m) = h.run_measured("HMSET", &["k", "f1", "v1"]);
        assert_eq!(m, metrics(1, 4, 4, 0));
    }

    #[test]
    fn test_hsetnx_credits_bytes_only() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("HSETNX", &["k", "f", "vv"]);
        assert_eq!(rsp.integer(), Some(1));
        assert_eq!(m, metrics(0, 3, 3, 0));

        let (rsp, m) = h.run_measured("HSETNX", &["k", "f", "other"]);
        assert_eq!(rsp.integer(), Some(0));
        assert!(m.is_zero());
    }

    #[test]
    fn test_hincrby() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("HINCRBY", &["k", "n", "5"]);
        assert_eq!(rsp.integer(), Some(5));
        assert!(m.is_zero());
        assert_eq!(h.run("HINCRBY", &["k", "n", "-8"]).integer(), Some(-3));

        h.run("HSET", &["k", "s", "text"]);
        let rsp = h.run("HINCRBY", &["k", "s", "1"]);
        assert_eq!(
            rsp.error(),
            Some(EngineError::NotAnInteger.to_string().as_bytes())
        );
    }

    #[test]
    fn test_hash_reads() {
        let mut h = Harness::new();
        h.run("HMSET", &["k", "b", "2", "a", "1", "c", "333"]);

        assert_eq!(h.run("HEXISTS", &["k", "a"]).integer(), Some(1));
        assert_eq!(h.run("HEXISTS", &["k", "z"]).integer(), Some(0));
        assert_eq!(h.run("HLEN", &["k"]).integer(), Some(3));
        assert_eq!(h.run("HSTRLEN", &["k", "c"]).integer(), Some(3));
        assert_eq!(
            h.run("HKEYS", &["k"]).array(),
            Some(&some(&["a", "b", "c"])[..])
        );
        assert_eq!(
            h.run("HVALS", &["k"]).array(),
            Some(&some(&["1", "2", "333"])[..])
        );
        assert_eq!(
            h.run("HGETALL", &["k"]).field_values().map(<[_]>::len),
            Some(3)
        );
        assert!(h.run("HKEYS", &["none"]).has_empty_array_result());
        assert!(h.run("HGETALL", &["none"]).has_empty_field_value_result());

        let rsp = h.run("HMGET", &["k", "a", "missing", "c"]);
        assert_eq!(rsp.array(), Some(&[Some(b("1")), None, Some(b("333"))][..]));

        // Reads never touch the context.
        assert_eq!(*h.ctx.metrics(), metrics(1, 8, 8, 0));
    }

    #[test]
    fn test_hscan_get() {
        let mut h = Harness::new();
        h.run("HMSET", &["k", "a", "1", "b", "2", "c", "3"]);

        let rsp = h.run("HSCANGET", &["k", "b", "10"]);
        assert_eq!(
            rsp.field_values(),
            Some(&[FieldValue::new("b", "2"), FieldValue::new("c", "3")][..])
        );

        let rsp = h.run("HSCANGET", &["k", "", "1"]);
        assert_eq!(rsp.field_values(), Some(&[FieldValue::new("a", "1")][..]));

        assert!(h
            .run("HSCANGET", &["k", "a", "0"])
            .has_empty_field_value_result());
    }

    #[test]
    fn test_hmget_partial_errors() {
        let mut h = Harness::new();
        h.run("HMSET", &["k", "f1", "v1", "f3", "v3"]);

        let rsp = h.run("HMGET", &["k", "f1", POISON, "f3"]);
        let errors = rsp.errors().expect("per-field errors");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], None);
        assert_eq!(errors[1], Some(b("ERR poisoned field")));
        assert_eq!(errors[2], None);
        assert_eq!(rsp.error(), None);
        assert!(rsp.is_error());
    }

    #[test]
    fn test_hmget_wrong_type_fails_every_slot() {
        let mut h = Harness::new();
        h.run("LPUSH", &["l", "a"]);

        let rsp = h.run("HMGET", &["l", "f1", "f2"]);
        let wrong = Bytes::from(EngineError::WrongType.to_string());
        assert_eq!(rsp.errors(), Some(&[Some(wrong.clone()), Some(wrong)][..]));
    }

    // ========================================================================
    // List commands
    // ========================================================================

    #[test]
    fn test_lpush_new_key() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("LPUSH", &["k", "a", "b"]);
        assert_eq!(rsp.integer(), Some(2));
        assert_eq!(m, metrics(1, 3, 3, 0));

        let (rsp, m) = h.run_measured("RPUSH", &["k", "cc"]);
        assert_eq!(rsp.integer(), Some(3));
        assert_eq!(m, metrics(0, 2, 2, 0));

        let rsp = h.run("LRANGE", &["k", "0", "-1"]);
        assert_eq!(rsp.array(), Some(&some(&["b", "a", "cc"])[..]));
    }

    #[test]
    fn test_lrange_existing_list() {
        let mut h = Harness::new();
        h.run("RPUSH", &["k", "a", "b", "c"]);

        let (rsp, m) = h.run_measured("LRANGE", &["k", "0", "-1"]);
        assert_eq!(rsp.array(), Some(&some(&["a", "b", "c"])[..]));
        assert!(m.is_zero());

        assert!(h.run("LRANGE", &["k", "5", "9"]).has_empty_array_result());
    }

    #[test]
    fn test_pushx_only_on_existing_list() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("LPUSHX", &["k", "a"]);
        assert_eq!(rsp.integer(), Some(0));
        assert!(m.is_zero());

        h.run("RPUSH", &["k", "x"]);
        let (rsp, m) = h.run_measured("RPUSHX", &["k", "yy"]);
        assert_eq!(rsp.integer(), Some(2));
        assert_eq!(m, metrics(0, 2, 2, 0));
        assert_eq!(h.run("LPUSHX", &["k", "z"]).integer(), Some(3));
    }

    #[test]
    fn test_pop_shrinks_hint() {
        let mut h = Harness::new();
        h.run("RPUSH", &["k", "abc", "", "de"]);

        let (rsp, m) = h.run_measured("LPOP", &["k"]);
        assert_eq!(rsp.bulk(), Some(&b("abc")));
        assert_eq!(m, metrics(0, 0, -3, 0));

        let (rsp, m) = h.run_measured("RPOP", &["k"]);
        assert_eq!(rsp.bulk(), Some(&b("de")));
        assert_eq!(m, metrics(0, 0, -2, 0));

        let (rsp, _) = h.run_measured("RPOP", &["k"]);
        assert!(rsp.has_empty_bulk_result());

        let (rsp, m) = h.run_measured("LPOP", &["k"]);
        assert!(rsp.is_nil());
        assert!(m.is_zero());
    }

    #[test]
    fn test_lrem_grows_hint() {
        let mut h = Harness::new();
        h.run("RPUSH", &["k", "x", "yy", "x", "yy", "yy"]);

        let (rsp, m) = h.run_measured("LREM", &["k", "0", "yy"]);
        assert_eq!(rsp.integer(), Some(3));
        assert_eq!(m, metrics(0, 0, 6, 0));

        let (rsp, m) = h.run_measured("LREM", &["k", "-1", "missing"]);
        assert_eq!(rsp.integer(), Some(0));
        assert!(m.is_zero());
    }

    #[test]
    fn test_linsert() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("LINSERT", &["k", "0", "p", "v"]);
        assert_eq!(rsp.integer(), Some(0));
        assert!(m.is_zero());

        h.run("RPUSH", &["k", "p"]);
        let (rsp, m) = h.run_measured("LINSERT", &["k", "0", "p", "vvv"]);
        assert_eq!(rsp.integer(), Some(2));
        assert_eq!(m, metrics(0, 3, 3, 0));

        assert_eq!(h.run("LINSERT", &["k", "1", "nope", "v"]).integer(), Some(-1));
        assert_eq!(
            h.run("LINSERT", &["k", "2", "p", "v"]).error(),
            Some(&b"ERR syntax error"[..])
        );
        assert_eq!(
            h.run("LRANGE", &["k", "0", "-1"]).array(),
            Some(&some(&["vvv", "p"])[..])
        );
    }

    #[test]
    fn test_lset_ltrim_lindex_llen() {
        let mut h = Harness::new();
        h.run("RPUSH", &["k", "a", "b", "c", "d"]);

        let (rsp, m) = h.run_measured("LSET", &["k", "-1", "z"]);
        assert_eq!(rsp.status(), Some("OK"));
        assert!(m.is_zero());
        assert_eq!(h.run("LINDEX", &["k", "3"]).bulk(), Some(&b("z")));
        assert!(h.run("LINDEX", &["k", "10"]).is_nil());

        assert_eq!(
            h.run("LSET", &["k", "9", "v"]).error(),
            Some(EngineError::IndexOutOfRange.to_string().as_bytes())
        );
        assert_eq!(
            h.run("LSET", &["none", "0", "v"]).error(),
            Some(EngineError::NoSuchKey.to_string().as_bytes())
        );

        let (rsp, m) = h.run_measured("LTRIM", &["k", "1", "2"]);
        assert_eq!(rsp.status(), Some("OK"));
        assert!(m.is_zero());
        assert_eq!(h.run("LLEN", &["k"]).integer(), Some(2));
    }

    // ========================================================================
    // Set commands
    // ========================================================================

    #[test]
    fn test_sadd_twice() {
        let mut h = Harness::new();

        let (rsp, m) = h.run_measured("SADD", &["k", "m1", "m2"]);
        assert_eq!(rsp.integer(), Some(2));
        assert_eq!(m, metrics(1, 5, 5, 0));

        let (rsp, m) = h.run_measured("SADD", &["k", "m1"]);
        assert_eq!(rsp.integer(), Some(0));
        assert!(m.is_zero());
    }

    #[test]
    fn test_sadd_existing_set_all_new_members() {
        let mut h = Harness::new();
        h.run("SADD", &["k", "x"]);

        // Every requested member was added, so the key is credited even
        // though the set already existed.
        let (rsp, m) = h.run_measured("SADD", &["k", "a", "b"]);
        assert_eq!(rsp.integer(), Some(2));
        assert_eq!(m, metrics(1, 3, 3, 0));
    }

    #[test]
    fn test_sadd_duplicate_members_on_new_key() {
        let mut h = Harness::new();

        // Only one member lands, which is fewer than requested, so the new
        // key is not credited.
        let (rsp, m) = h.run_measured("SADD", &["k", "a", "a"]);
        assert_eq!(rsp.integer(), Some(1));
        assert_eq!(m, metrics(0, 2, 2, 0));
    }

    #[test]
    fn test_srem_always_shrinks() {
        let mut h = Harness::new();
        h.run("SADD", &["k", "a", "b"]);

        let (rsp, m) = h.run_measured("SREM", &["k", "a", "zz"]);
        assert_eq!(rsp.integer(), Some(1));
        assert_eq!(m, metrics(0, 0, -3, 0));

        let (rsp, m) = h.run_measured("SREM", &["k", "nope"]);
        assert_eq!(rsp.integer(), Some(0));
        assert_eq!(m, metrics(0, 0, -4, 1));
    }

    #[test]
    fn test_spop_has_no_metrics() {
        let mut h = Harness::new();
        h.run("SADD", &["k", "c", "a", "b"]);

        let (rsp, m) = h.run_measured("SPOP", &["k"]);
        assert_eq!(rsp.bulk(), Some(&b("a")));
        assert!(m.is_zero());

        assert_eq!(h.run("SCARD", &["k"]).integer(), Some(2));
        assert_eq!(h.run("SISMEMBER", &["k", "a"]).integer(), Some(0));
        assert_eq!(h.run("SISMEMBER", &["k", "b"]).integer(), Some(1));
        assert_eq!(
            h.run("SMEMBERS", &["k"]).array(),
            Some(&some(&["b", "c"])[..])
        );
        assert!(h.run("SPOP", &["none"]).is_nil());
    }

    // ========================================================================
    // Cross-cutting properties
    // ========================================================================

    #[test]
    fn test_engine_error_leaves_metrics_untouched() {
        let mut h = Harness::new();
        h.run("SADD", &["set", "m"]);
        h.run("HSET", &["hash", "f", "v"]);
        let before = *h.ctx.metrics();

        let wrong = EngineError::WrongType.to_string();
        for (name, args) in [
            ("HSET", &["set", "f", "v"][..]),
            ("HMSET", &["set", "f", "v"][..]),
            ("HSETNX", &["set", "f", "v"][..]),
            ("HDEL", &["set", "f"][..]),
            ("LPUSH", &["hash", "v"][..]),
            ("RPUSHX", &["hash", "v"][..]),
            ("LPOP", &["hash"][..]),
            ("LREM", &["hash", "0", "v"][..]),
            ("LINSERT", &["hash", "0", "p", "v"][..]),
            ("SADD", &["hash", "m"][..]),
            ("SREM", &["hash", "m"][..]),
            ("SPOP", &["hash"][..]),
        ] {
            let rsp = h.run(name, args);
            assert_eq!(rsp.error(), Some(wrong.as_bytes()), "{}", name);
        }

        assert_eq!(*h.ctx.metrics(), before);
    }

    #[test]
    fn test_replicas_agree() {
        let script: &[(&str, &[&str])] = &[
            ("HMSET", &["h", "b", "2", "a", "1"][..]),
            ("HINCRBY", &["h", "a", "41"][..]),
            ("RPUSH", &["l", "x", "y", "x"][..]),
            ("LREM", &["l", "1", "x"][..]),
            ("SADD", &["s", "q", "p", "r"][..]),
            ("SPOP", &["s"][..]),
            ("SREM", &["s", "r", "zz"][..]),
            ("HSET", &["l", "f", "v"][..]),
            ("HGETALL", &["h"][..]),
            ("SMEMBERS", &["s"][..]),
            ("LRANGE", &["l", "0", "-1"][..]),
        ];

        let replay = || {
            let mut h = Harness::new();
            let wire: Vec<Vec<u8>> = script
                .iter()
                .map(|(name, args)| h.run(name, args).to_resp().serialize())
                .collect();
            (wire, *h.ctx.metrics())
        };

        assert_eq!(replay(), replay());
    }

    #[test]
    fn test_every_handler_acquires_from_pool() {
        let mut h = Harness::new();
        h.run("HSET", &["k", "f", "v"]);
        h.run("HGET", &["k"]);
        h.run("SCARD", &["s"]);

        assert_eq!(h.executor.pool().stats().acquired, 3);
    }
}

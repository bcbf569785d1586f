//! List command handlers.

use super::args;
use super::executor::CommandExecutor;
use super::Command;
use crate::apply::{payload_len, ApplyContext};
use crate::response::{Response, ResponseResult};
use crate::storage::{EngineResolver, ListEngine};
use bytes::Bytes;

/// Credits a successful push of `values` that left the list with `len`
/// elements. A length equal to the number of pushed values means the push
/// created the key.
fn credit_push(ctx: &mut ApplyContext, key: &Bytes, values: &[Bytes], len: i64) {
    if len <= 0 {
        return;
    }

    let metrics = ctx.metrics_mut();
    metrics.record_write(payload_len(values));
    if len == values.len() as i64 {
        metrics.record_new_key(key.len() as u64);
    }
}

impl<R: EngineResolver> CommandExecutor<R> {
    /// LINDEX key index
    pub fn lindex(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, index] = args::exact::<2>(cmd)?;
            let index = args::parse_i64(index)?;
            let value = self.resolver().list_engine(cell_id).lindex(key, index)?;
            Ok(ResponseResult::Bulk(value))
        })
    }

    /// LLEN key
    pub fn llen(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let len = self.resolver().list_engine(cell_id).llen(key)?;
            Ok(ResponseResult::Integer(len))
        })
    }

    /// LRANGE key start stop
    pub fn lrange(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, start, stop] = args::exact::<3>(cmd)?;
            let start = args::parse_i64(start)?;
            let stop = args::parse_i64(stop)?;
            let values = self
                .resolver()
                .list_engine(cell_id)
                .lrange(key, start, stop)?;
            Ok(ResponseResult::values(values))
        })
    }

    /// LINSERT key position pivot value
    ///
    /// `position` is numeric: 0 inserts before the pivot, 1 after it.
    pub fn linsert(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, position, pivot, value] = args::exact::<4>(cmd)?;
            let position = args::parse_i64(position)?;
            let len = self
                .resolver()
                .list_engine(ctx.cell_id())
                .linsert(key, position, pivot, value)?;

            // An insert always lands in an existing list, so no key is credited.
            if len > 0 {
                ctx.metrics_mut().record_write(value.len() as u64);
            }
            Ok(ResponseResult::Integer(len))
        })
    }

    /// LPOP key
    pub fn lpop(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let value = self.resolver().list_engine(ctx.cell_id()).lpop(key)?;
            ctx.metrics_mut().shrink(value.as_ref().map_or(0, |v| v.len() as u64));
            Ok(ResponseResult::Bulk(value))
        })
    }

    /// LPUSH key value [value ...]
    pub fn lpush(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let (key, values) = args::key_and_elements(cmd)?;
            let len = self.resolver().list_engine(ctx.cell_id()).lpush(key, values)?;
            credit_push(ctx, key, values, len);
            Ok(ResponseResult::Integer(len))
        })
    }

    /// LPUSHX key value
    pub fn lpushx(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, value] = args::exact::<2>(cmd)?;
            let len = self.resolver().list_engine(ctx.cell_id()).lpushx(key, value)?;
            credit_push(ctx, key, std::slice::from_ref(value), len);
            Ok(ResponseResult::Integer(len))
        })
    }

    /// LREM key count value
    pub fn lrem(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, count, value] = args::exact::<3>(cmd)?;
            let count = args::parse_i64(count)?;
            let removed = self
                .resolver()
                .list_engine(ctx.cell_id())
                .lrem(key, count, value)?;

            // Removal grows the hint.
            if removed > 0 {
                ctx.metrics_mut()
                    .grow((value.len() as u64).saturating_mul(removed as u64));
            }
            Ok(ResponseResult::Integer(removed))
        })
    }

    /// LSET key index value
    pub fn lset(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, index, value] = args::exact::<3>(cmd)?;
            let index = args::parse_i64(index)?;
            self.resolver()
                .list_engine(ctx.cell_id())
                .lset(key, index, value)?;
            Ok(ResponseResult::ok())
        })
    }

    /// LTRIM key start stop
    pub fn ltrim(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, start, stop] = args::exact::<3>(cmd)?;
            let start = args::parse_i64(start)?;
            let stop = args::parse_i64(stop)?;
            self.resolver()
                .list_engine(ctx.cell_id())
                .ltrim(key, start, stop)?;
            Ok(ResponseResult::ok())
        })
    }

    /// RPOP key
    pub fn rpop(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let value = self.resolver().list_engine(ctx.cell_id()).rpop(key)?;
            ctx.metrics_mut().shrink(value.as_ref().map_or(0, |v| v.len() as u64));
            Ok(ResponseResult::Bulk(value))
        })
    }

    /// RPUSH key value [value ...]
    pub fn rpush(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let (key, values) = args::key_and_elements(cmd)?;
            let len = self.resolver().list_engine(ctx.cell_id()).rpush(key, values)?;
            credit_push(ctx, key, values, len);
            Ok(ResponseResult::Integer(len))
        })
    }

    /// RPUSHX key value
    pub fn rpushx(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, value] = args::exact::<2>(cmd)?;
            let len = self.resolver().list_engine(ctx.cell_id()).rpushx(key, value)?;
            credit_push(ctx, key, std::slice::from_ref(value), len);
            Ok(ResponseResult::Integer(len))
        })
    }
}

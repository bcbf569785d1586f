//! Hash command handlers.

use super::args;
use super::executor::CommandExecutor;
use super::Command;
use crate::apply::{payload_len, ApplyContext};
use crate::response::{Response, ResponseResult};
use crate::storage::{EngineResolver, HashEngine};

impl<R: EngineResolver> CommandExecutor<R> {
    /// HSET key field value
    pub fn hset(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, field, value] = args::exact::<3>(cmd)?;
            let created = self
                .resolver()
                .hash_engine(ctx.cell_id())
                .hset(key, field, value)?;

            if created > 0 {
                let metrics = ctx.metrics_mut();
                metrics.written_keys += 1;
                metrics.record_write(payload_len([field, value]));
            }
            Ok(ResponseResult::Integer(created))
        })
    }

    /// HGET key field
    pub fn hget(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, field] = args::exact::<2>(cmd)?;
            let value = self.resolver().hash_engine(cell_id).hget(key, field)?;
            Ok(ResponseResult::Bulk(value))
        })
    }

    /// HDEL key field [field ...]
    pub fn hdel(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let (key, fields) = args::key_and_elements(cmd)?;
            let removed = self.resolver().hash_engine(ctx.cell_id()).hdel(key, fields)?;

            // Every requested name counts, whether or not it existed.
            if removed > 0 {
                ctx.metrics_mut().shrink(payload_len(fields));
            }
            Ok(ResponseResult::Integer(removed))
        })
    }

    /// HEXISTS key field
    pub fn hexists(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, field] = args::exact::<2>(cmd)?;
            let exists = self.resolver().hash_engine(cell_id).hexists(key, field)?;
            Ok(ResponseResult::Integer(i64::from(exists)))
        })
    }

    /// HKEYS key
    pub fn hkeys(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let keys = self.resolver().hash_engine(cell_id).hkeys(key)?;
            Ok(ResponseResult::values(keys))
        })
    }

    /// HVALS key
    pub fn hvals(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let values = self.resolver().hash_engine(cell_id).hvals(key)?;
            Ok(ResponseResult::values(values))
        })
    }

    /// HGETALL key
    pub fn hgetall(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let pairs = self.resolver().hash_engine(cell_id).hgetall(key)?;
            Ok(ResponseResult::FieldValues(pairs))
        })
    }

    /// HSCANGET key start count
    pub fn hscan_get(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, start, count] = args::exact::<3>(cmd)?;
            let count = args::parse_i64(count)?;
            let pairs = self
                .resolver()
                .hash_engine(cell_id)
                .hscan_get(key, start, count)?;
            Ok(ResponseResult::FieldValues(pairs))
        })
    }

    /// HLEN key
    pub fn hlen(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let len = self.resolver().hash_engine(cell_id).hlen(key)?;
            Ok(ResponseResult::Integer(len))
        })
    }

    /// HMGET key field [field ...]
    ///
    /// Per-field engine failures come back as an array of errors with one slot
    /// per requested field, rather than as a single error.
    pub fn hmget(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let (key, fields) = args::key_and_elements(cmd)?;
            let values = self.resolver().hash_engine(cell_id).hmget(key, fields)?;
            Ok(ResponseResult::Array(values))
        })
    }

    /// HMSET key field value [field value ...]
    pub fn hmset(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let (key, fields, values) = args::key_and_pairs(cmd)?;
            self.resolver()
                .hash_engine(ctx.cell_id())
                .hmset(key, &fields, &values)?;

            let metrics = ctx.metrics_mut();
            metrics.written_keys += 1;
            metrics.record_write(payload_len(&fields) + payload_len(&values));
            Ok(ResponseResult::ok())
        })
    }

    /// HSETNX key field value
    pub fn hsetnx(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, field, value] = args::exact::<3>(cmd)?;
            let set = self
                .resolver()
                .hash_engine(ctx.cell_id())
                .hsetnx(key, field, value)?;

            if set > 0 {
                ctx.metrics_mut().record_write(payload_len([field, value]));
            }
            Ok(ResponseResult::Integer(set))
        })
    }

    /// HSTRLEN key field
    pub fn hstrlen(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, field] = args::exact::<2>(cmd)?;
            let len = self.resolver().hash_engine(cell_id).hstrlen(key, field)?;
            Ok(ResponseResult::Integer(len))
        })
    }

    /// HINCRBY key field increment
    pub fn hincrby(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, field, increment] = args::exact::<3>(cmd)?;
            let increment = args::parse_i64(increment)?;
            let stored = self
                .resolver()
                .hash_engine(ctx.cell_id())
                .hincrby(key, field, increment)?;
            let value = args::parse_i64(&stored)?;
            Ok(ResponseResult::Integer(value))
        })
    }
}

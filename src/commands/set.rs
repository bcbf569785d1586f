//! Set command handlers.

use super::args;
use super::executor::CommandExecutor;
use super::Command;
use crate::apply::{payload_len, ApplyContext};
use crate::response::{Response, ResponseResult};
use crate::storage::{EngineResolver, SetEngine};

impl<R: EngineResolver> CommandExecutor<R> {
    /// SADD key member [member ...]
    pub fn sadd(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let (key, members) = args::key_and_elements(cmd)?;
            let added = self.resolver().set_engine(ctx.cell_id()).sadd(key, members)?;

            if added > 0 {
                let metrics = ctx.metrics_mut();
                metrics.record_write(payload_len(members));
                if added == members.len() as i64 {
                    metrics.record_new_key(key.len() as u64);
                }
            }
            Ok(ResponseResult::Integer(added))
        })
    }

    /// SREM key member [member ...]
    pub fn srem(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let (key, members) = args::key_and_elements(cmd)?;
            let removed = self.resolver().set_engine(ctx.cell_id()).srem(key, members)?;

            let metrics = ctx.metrics_mut();
            if removed == 0 {
                metrics.hint_deleted_key();
            }
            metrics.shrink(payload_len(members));
            Ok(ResponseResult::Integer(removed))
        })
    }

    /// SCARD key
    pub fn scard(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let len = self.resolver().set_engine(cell_id).scard(key)?;
            Ok(ResponseResult::Integer(len))
        })
    }

    /// SMEMBERS key
    pub fn smembers(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let members = self.resolver().set_engine(cell_id).smembers(key)?;
            Ok(ResponseResult::values(members))
        })
    }

    /// SISMEMBER key member
    pub fn sismember(&self, cell_id: u64, cmd: &Command) -> Response {
        self.respond(|| {
            let [key, member] = args::exact::<2>(cmd)?;
            let found = self.resolver().set_engine(cell_id).sismember(key, member)?;
            Ok(ResponseResult::Integer(found))
        })
    }

    /// SPOP key
    ///
    /// Pops are not accounted in the apply metrics.
    pub fn spop(&self, ctx: &mut ApplyContext, cmd: &Command) -> Response {
        self.respond(|| {
            let [key] = args::exact::<1>(cmd)?;
            let value = self.resolver().set_engine(ctx.cell_id()).spop(key)?;
            Ok(ResponseResult::Bulk(value))
        })
    }
}

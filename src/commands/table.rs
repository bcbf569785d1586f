//! Command Table
//!
//! The immutable mapping from command name to handler. Read-only commands are
//! applied against a bare cell id, mutating commands against an
//! [`ApplyContext`](crate::apply::ApplyContext).

/// Commands that never touch apply metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadCommand {
    HGet,
    HExists,
    HKeys,
    HVals,
    HGetAll,
    HScanGet,
    HLen,
    HMGet,
    HStrLen,
    LIndex,
    LLen,
    LRange,
    SCard,
    SMembers,
    SIsMember,
}

/// Commands that mutate a cell and account for it in the apply metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteCommand {
    HSet,
    HDel,
    HMSet,
    HSetNX,
    HIncrBy,
    LInsert,
    LPop,
    LPush,
    LPushX,
    LRem,
    LSet,
    LTrim,
    RPop,
    RPush,
    RPushX,
    SAdd,
    SRem,
    SPop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Read(ReadCommand),
    Write(WriteCommand),
}

impl CommandKind {
    pub fn is_write(&self) -> bool {
        matches!(self, CommandKind::Write(_))
    }
}

/// Every supported command, by upper-case name.
pub static COMMAND_TABLE: &[(&str, CommandKind)] = &[
    // Hash
    ("HSET", CommandKind::Write(WriteCommand::HSet)),
    ("HGET", CommandKind::Read(ReadCommand::HGet)),
    ("HDEL", CommandKind::Write(WriteCommand::HDel)),
    ("HEXISTS", CommandKind::Read(ReadCommand::HExists)),
    ("HKEYS", CommandKind::Read(ReadCommand::HKeys)),
    ("HVALS", CommandKind::Read(ReadCommand::HVals)),
    ("HGETALL", CommandKind::Read(ReadCommand::HGetAll)),
    ("HSCANGET", CommandKind::Read(ReadCommand::HScanGet)),
    ("HLEN", CommandKind::Read(ReadCommand::HLen)),
    ("HMGET", CommandKind::Read(ReadCommand::HMGet)),
    ("HMSET", CommandKind::Write(WriteCommand::HMSet)),
    ("HSETNX", CommandKind::Write(WriteCommand::HSetNX)),
    ("HSTRLEN", CommandKind::Read(ReadCommand::HStrLen)),
    ("HINCRBY", CommandKind::Write(WriteCommand::HIncrBy)),
    // List
    ("LINDEX", CommandKind::Read(ReadCommand::LIndex)),
    ("LINSERT", CommandKind::Write(WriteCommand::LInsert)),
    ("LLEN", CommandKind::Read(ReadCommand::LLen)),
    ("LPOP", CommandKind::Write(WriteCommand::LPop)),
    ("LPUSH", CommandKind::Write(WriteCommand::LPush)),
    ("LPUSHX", CommandKind::Write(WriteCommand::LPushX)),
    ("LRANGE", CommandKind::Read(ReadCommand::LRange)),
    ("LREM", CommandKind::Write(WriteCommand::LRem)),
    ("LSET", CommandKind::Write(WriteCommand::LSet)),
    ("LTRIM", CommandKind::Write(WriteCommand::LTrim)),
    ("RPOP", CommandKind::Write(WriteCommand::RPop)),
    ("RPUSH", CommandKind::Write(WriteCommand::RPush)),
    ("RPUSHX", CommandKind::Write(WriteCommand::RPushX)),
    // Set
    ("SADD", CommandKind::Write(WriteCommand::SAdd)),
    ("SREM", CommandKind::Write(WriteCommand::SRem)),
    ("SCARD", CommandKind::Read(ReadCommand::SCard)),
    ("SMEMBERS", CommandKind::Read(ReadCommand::SMembers)),
    ("SISMEMBER", CommandKind::Read(ReadCommand::SIsMember)),
    ("SPOP", CommandKind::Write(WriteCommand::SPop)),
];

/// Looks up a command by name, ignoring ASCII case.
pub fn lookup(name: &str) -> Option<CommandKind> {
    COMMAND_TABLE
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|&(_, kind)| kind)
}

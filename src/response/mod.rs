//! Response Module
//!
//! Every applied command produces exactly one [`Response`]. A response holds a
//! single result slot, [`ResponseResult`], which is one of:
//!
//! | Variant | Used by |
//! |---------|---------|
//! | `Integer` | HSET, HDEL, LPUSH, SADD, HLEN, ... |
//! | `Bulk` | HGET, LINDEX, LPOP, SPOP |
//! | `Status` | HMSET, LSET, LTRIM |
//! | `Array` | HKEYS, HVALS, HMGET, LRANGE, SMEMBERS |
//! | `FieldValues` | HGETALL, HSCANGET |
//! | `Error` | any command that failed |
//! | `Errors` | HMGET with per-field failures |
//!
//! ## Empty vs. absent
//!
//! `Bulk(Some(b""))` is a value that exists and is empty; `Bulk(None)` is a
//! value that does not exist. The two encode differently on the wire (`$0`
//! versus `$-1`) and are reported separately by
//! [`Response::has_empty_bulk_result`] and [`Response::is_nil`].
//!
//! Responses are handed out by a [`ResponsePool`] and should be released back
//! to it once they have been encoded.

pub mod pool;

pub use pool::{PoolStats, ResponsePool, DEFAULT_POOL_CAPACITY};

use crate::protocol::RespValue;
use crate::storage::FieldValue;
use bytes::Bytes;

/// Status text for successful commands without a payload.
pub const OK_STATUS: &str = "OK";

/// The fixed error returned for any malformed command.
pub const INVALID_COMMAND: &str = "ERR invalid command";

/// The populated result slot of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseResult {
    Integer(i64),

    /// `None` means the value is absent
    Bulk(Option<Bytes>),

    Status(&'static str),

    /// Members may be absent (HMGET on a missing field)
    Array(Vec<Option<Bytes>>),

    FieldValues(Vec<FieldValue>),

    Error(Bytes),

    /// One slot per requested element; `None` marks an element that did not fail
    Errors(Vec<Option<Bytes>>),
}

impl ResponseResult {
    pub fn error(message: impl Into<Bytes>) -> Self {
        ResponseResult::Error(message.into())
    }

    /// Wraps values that are always present into an array result.
    pub fn values(values: Vec<Bytes>) -> Self {
        ResponseResult::Array(values.into_iter().map(Some).collect())
    }

    pub fn ok() -> Self {
        ResponseResult::Status(OK_STATUS)
    }
}

/// The outcome of applying one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    result: Option<ResponseResult>,
}

impl Response {
    /// A response with no populated slot. Handlers never return one of these.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(result: ResponseResult) -> Self {
        Self {
            result: Some(result),
        }
    }

    pub fn set_result(&mut self, result: ResponseResult) {
        self.result = Some(result);
    }

    pub fn result(&self) -> Option<&ResponseResult> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<ResponseResult> {
        self.result
    }

    /// Clears the result slot so the response can be reused.
    pub fn reset(&mut self) {
        self.result = None;
    }

    /// True when no slot is populated.
    pub fn is_unset(&self) -> bool {
        self.result.is_none()
    }

    pub fn integer(&self) -> Option<i64> {
        match self.result {
            Some(ResponseResult::Integer(n)) => Some(n),
            _ => None,
        }
    }

    /// The bulk value, if the result is a bulk that exists.
    pub fn bulk(&self) -> Option<&Bytes> {
        match &self.result {
            Some(ResponseResult::Bulk(value)) => value.as_ref(),
            _ => None,
        }
    }

    /// True for a bulk result that exists and is empty.
    pub fn has_empty_bulk_result(&self) -> bool {
        matches!(&self.result, Some(ResponseResult::Bulk(Some(v))) if v.is_empty())
    }

    /// True for a bulk result that is absent.
    pub fn is_nil(&self) -> bool {
        matches!(self.result, Some(ResponseResult::Bulk(None)))
    }

    pub fn has_empty_array_result(&self) -> bool {
        matches!(&self.result, Some(ResponseResult::Array(values)) if values.is_empty())
    }

    pub fn has_empty_field_value_result(&self) -> bool {
        matches!(&self.result, Some(ResponseResult::FieldValues(pairs)) if pairs.is_empty())
    }

    pub fn status(&self) -> Option<&'static str> {
        match self.result {
            Some(ResponseResult::Status(s)) => Some(s),
            _ => None,
        }
    }

    pub fn array(&self) -> Option<&[Option<Bytes>]> {
        match &self.result {
            Some(ResponseResult::Array(values)) => Some(values),
            _ => None,
        }
    }

    pub fn field_values(&self) -> Option<&[FieldValue]> {
        match &self.result {
            Some(ResponseResult::FieldValues(pairs)) => Some(pairs),
            _ => None,
        }
    }

    /// The single error payload, if this response is an error.
    pub fn error(&self) -> Option<&[u8]> {
        match &self.result {
            Some(ResponseResult::Error(message)) => Some(message),
            _ => None,
        }
    }

    /// The per-element error slots, if this is a partial failure.
    pub fn errors(&self) -> Option<&[Option<Bytes>]> {
        match &self.result {
            Some(ResponseResult::Errors(errors)) => Some(errors),
            _ => None,
        }
    }

    /// True for both the single-error and the per-element error shapes.
    pub fn is_error(&self) -> bool {
        matches!(
            self.result,
            Some(ResponseResult::Error(_)) | Some(ResponseResult::Errors(_))
        )
    }

    /// Converts the response into its RESP wire representation.
    pub fn to_resp(&self) -> RespValue {
        let Some(result) = &self.result else {
            return RespValue::Null;
        };

        match result {
            ResponseResult::Integer(n) => RespValue::Integer(*n),
            ResponseResult::Bulk(Some(value)) => RespValue::Bulk(value.clone()),
            ResponseResult::Bulk(None) => RespValue::Null,
            ResponseResult::Status(status) => RespValue::simple(*status),
            ResponseResult::Array(values) => RespValue::Array(
                values
                    .iter()
                    .map(|v| v.clone().map_or(RespValue::Null, RespValue::Bulk))
                    .collect(),
            ),
            ResponseResult::FieldValues(pairs) => RespValue::Array(
                pairs
                    .iter()
                    .flat_map(|p| [RespValue::Bulk(p.field.clone()), RespValue::Bulk(p.value.clone())])
                    .collect(),
            ),
            ResponseResult::Error(message) => RespValue::Error(message.clone()),
            ResponseResult::Errors(errors) => RespValue::Array(
                errors
                    .iter()
                    .map(|e| e.clone().map_or(RespValue::Null, RespValue::Error))
                    .collect(),
            ),
        }
    }
}

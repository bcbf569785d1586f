//! RESP Reply Encoding
//!
//! Responses leave the process as RESP (Redis Serialization Protocol) values.
//! Each type starts with a prefix byte and ends with CRLF:
//!
//! - `+` Simple String: `+OK\r\n`
//! - `-` Error: `-ERR invalid command\r\n`
//! - `:` Integer: `:1000\r\n`
//! - `$` Bulk String: `$5\r\nhello\r\n`, absent value `$-1\r\n`
//! - `*` Array: `*2\r\n$1\r\na\r\n$1\r\nb\r\n`

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A RESP value ready to be written to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Status reply; must not contain CRLF
    Simple(String),

    /// Error reply; binary payload copied verbatim from the engine
    Error(Bytes),

    Integer(i64),

    /// Binary-safe string, possibly empty
    Bulk(Bytes),

    /// Absent value, encoded as a null bulk string
    Null,

    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn simple(s: impl Into<String>) -> Self {
        RespValue::Simple(s.into())
    }

    pub fn error(message: impl Into<Bytes>) -> Self {
        RespValue::Error(message.into())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::Bulk(data.into())
    }

    /// Serializes the value into a freshly allocated buffer.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.to_vec()
    }

    /// Appends the wire form of the value to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            RespValue::Simple(s) => {
                buf.put_u8(prefix::SIMPLE_STRING);
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Error(message) => {
                buf.put_u8(prefix::ERROR);
                buf.put_slice(message);
                buf.put_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.put_u8(prefix::INTEGER);
                buf.put_slice(n.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Bulk(data) => {
                buf.put_u8(prefix::BULK_STRING);
                buf.put_slice(data.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(data);
                buf.put_slice(CRLF);
            }
            RespValue::Null => {
                buf.put_u8(prefix::BULK_STRING);
                buf.put_slice(b"-1");
                buf.put_slice(CRLF);
            }
            RespValue::Array(values) => {
                buf.put_u8(prefix::ARRAY);
                buf.put_slice(values.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                for value in values {
                    value.encode(buf);
                }
            }
        }
    }

    /// Upper bound on the encoded size, used to size buffers.
    pub fn encoded_len(&self) -> usize {
        // prefix + up to 20 digits + CRLF
        const HEADER: usize = 1 + 20 + 2;
        match self {
            RespValue::Simple(s) => 1 + s.len() + 2,
            RespValue::Error(message) => 1 + message.len() + 2,
            RespValue::Integer(_) | RespValue::Null => HEADER,
            RespValue::Bulk(data) => HEADER + data.len() + 2,
            RespValue::Array(values) => {
                HEADER + values.iter().map(RespValue::encoded_len).sum::<usize>()
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::Simple(s) => write!(f, "{}", s),
            RespValue::Error(message) => {
                write!(f, "(error) {}", String::from_utf8_lossy(message))
            }
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::Bulk(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            RespValue::Null => write!(f, "(nil)"),
            RespValue::Array(values) if values.is_empty() => write!(f, "(empty array)"),
            RespValue::Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, v)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_serialize() {
        assert_eq!(RespValue::simple("OK").serialize(), b"+OK\r\n");
        assert_eq!(
            RespValue::error("ERR invalid command").serialize(),
            b"-ERR invalid command\r\n"
        );
        assert_eq!(RespValue::Integer(-42).serialize(), b":-42\r\n");
    }

    #[test]
    fn test_bulk_empty_and_null_differ() {
        assert_eq!(RespValue::bulk("hello").serialize(), b"$5\r\nhello\r\n");
        assert_eq!(RespValue::bulk(Bytes::new()).serialize(), b"$0\r\n\r\n");
        assert_eq!(RespValue::Null.serialize(), b"$-1\r\n");
    }

    #[test]
    fn test_array_with_null_member() {
        let value = RespValue::Array(vec![RespValue::bulk("a"), RespValue::Null]);
        assert_eq!(value.serialize(), b"*2\r\n$1\r\na\r\n$-1\r\n");
    }

    #[test]
    fn test_encoded_len_is_upper_bound() {
        let value = RespValue::Array(vec![
            RespValue::Integer(i64::MIN),
            RespValue::bulk("x".repeat(100)),
            RespValue::simple("OK"),
        ]);
        assert!(value.serialize().len() <= value.encoded_len());
    }

    #[test]
    fn test_display() {
        assert_eq!(RespValue::Null.to_string(), "(nil)");
        assert_eq!(RespValue::Integer(2).to_string(), "(integer) 2");
        assert_eq!(
            RespValue::Array(vec![RespValue::bulk("a"), RespValue::bulk("b")]).to_string(),
            "1) \"a\"\n2) \"b\""
        );
    }
}

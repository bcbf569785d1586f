//! Command Frame Decoder
//!
//! Turns raw client bytes into [`Command`]s. Two request forms are accepted,
//! the same ones `redis-cli` produces:
//!
//! - multibulk: `*<n>\r\n` followed by `n` bulk strings (`$<len>\r\n<data>\r\n`)
//! - inline: a single line of whitespace-separated words ending in CRLF
//!
//! The decoder is incremental. `decode` either consumes one complete command
//! from the front of the buffer, or leaves the buffer untouched and returns
//! `Ok(None)` so the caller can read more data.

use crate::commands::Command;
use crate::protocol::types::{prefix, CRLF};
use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Errors that can occur while decoding a request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// A length or count field is not an integer
    #[error("invalid length: {0}")]
    InvalidLength(String),

    /// The command name is not valid UTF-8
    #[error("invalid UTF-8 in command name")]
    InvalidUtf8,

    /// The request contains no command name
    #[error("empty command")]
    EmptyCommand,

    /// An array member is not a bulk string
    #[error("expected bulk string, found {0:#04x}")]
    ExpectedBulk(u8),

    /// Protocol violation (missing CRLF, etc.)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The request exceeds a size limit
    #[error("request too large: {size} (max: {max})")]
    TooLarge { size: usize, max: usize },
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Maximum size for a single bulk argument (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of arguments in one request
pub const MAX_ARGS: usize = 1024 * 1024;

/// Upper bound on the argument vector allocated before any argument arrives
const PREALLOC_ARGS: usize = 64;

/// An incremental RESP request decoder.
///
/// ```
/// use cellkv::protocol::CommandDecoder;
/// use bytes::BytesMut;
///
/// let mut buf = BytesMut::from(&b"*3\r\n$4\r\nHGET\r\n$1\r\nh\r\n$1\r\nf\r\n"[..]);
/// let cmd = CommandDecoder::new().decode(&mut buf).unwrap().unwrap();
///
/// assert_eq!(cmd.name(), "HGET");
/// assert_eq!(cmd.args().len(), 2);
/// assert!(buf.is_empty());
/// ```
#[derive(Debug)]
pub struct CommandDecoder {
    max_bulk: usize,
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self {
            max_bulk: MAX_BULK_SIZE,
        }
    }

    /// Creates a decoder that rejects bulk arguments larger than `max_bulk`.
    pub fn with_max_bulk(max_bulk: usize) -> Self {
        Self { max_bulk }
    }

    /// Decodes one command from the front of `buf`.
    pub fn decode(&self, buf: &mut BytesMut) -> DecodeResult<Option<Command>> {
        if buf.is_empty() {
            return Ok(None);
        }

        let parsed = if buf[0] == prefix::ARRAY {
            self.parse_multibulk(buf)?
        } else {
            parse_inline(buf)?
        };

        let Some((mut words, consumed)) = parsed else {
            return Ok(None);
        };
        buf.advance(consumed);

        if words.is_empty() {
            return Err(DecodeError::EmptyCommand);
        }
        let args = words.split_off(1);
        let name = String::from_utf8(words.remove(0).to_vec())
            .map_err(|_| DecodeError::InvalidUtf8)?;

        Ok(Some(Command::new(name, args)))
    }

    /// Parses `*<n>\r\n` followed by `n` bulk strings.
    fn parse_multibulk(&self, buf: &[u8]) -> DecodeResult<Option<(Vec<Bytes>, usize)>> {
        let Some((count, mut pos)) = parse_length_line(buf, prefix::ARRAY)? else {
            return Ok(None);
        };
        if count < 0 {
            return Err(DecodeError::EmptyCommand);
        }
        let count = count as usize;
        if count > MAX_ARGS {
            return Err(DecodeError::TooLarge {
                size: count,
                max: MAX_ARGS,
            });
        }

        let mut words = Vec::with_capacity(count.min(PREALLOC_ARGS));
        for _ in 0..count {
            let rest = &buf[pos..];
            if rest.is_empty() {
                return Ok(None);
            }
            if rest[0] != prefix::BULK_STRING {
                return Err(DecodeError::ExpectedBulk(rest[0]));
            }

            let Some((len, header)) = parse_length_line(rest, prefix::BULK_STRING)? else {
                return Ok(None);
            };
            if len < 0 {
                return Err(DecodeError::InvalidLength(len.to_string()));
            }
            let len = len as usize;
            if len > self.max_bulk {
                return Err(DecodeError::TooLarge {
                    size: len,
                    max: self.max_bulk,
                });
            }

            let end = header + len;
            if rest.len() < end + CRLF.len() {
                return Ok(None);
            }
            if &rest[end..end + CRLF.len()] != CRLF {
                return Err(DecodeError::Protocol(
                    "bulk string missing trailing CRLF".to_string(),
                ));
            }

            words.push(Bytes::copy_from_slice(&rest[header..end]));
            pos += end + CRLF.len();
        }

        Ok(Some((words, pos)))
    }
}

/// Parses a `<prefix><integer>\r\n` line. Returns the integer and the number
/// of bytes the line occupies.
fn parse_length_line(buf: &[u8], expected: u8) -> DecodeResult<Option<(i64, usize)>> {
    debug_assert!(buf.first() == Some(&expected));

    let Some(end) = find_crlf(&buf[1..]) else {
        return Ok(None);
    };
    let digits = &buf[1..1 + end];
    let text = std::str::from_utf8(digits)
        .map_err(|_| DecodeError::InvalidLength(String::from_utf8_lossy(digits).into_owned()))?;
    let n = text
        .parse::<i64>()
        .map_err(|e| DecodeError::InvalidLength(format!("{}: {}", text, e)))?;

    Ok(Some((n, 1 + end + CRLF.len())))
}

fn parse_inline(buf: &[u8]) -> DecodeResult<Option<(Vec<Bytes>, usize)>> {
    let Some(end) = find_crlf(buf) else {
        return Ok(None);
    };

    let words = buf[..end]
        .split(|b| b.is_ascii_whitespace())
        .filter(|w| !w.is_empty())
        .map(Bytes::copy_from_slice)
        .collect();

    Ok(Some((words, end + CRLF.len())))
}

/// Finds the position of CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

//! RESP Protocol Implementation
//!
//! The wire layer between clients and the apply path.
//!
//! ## Overview
//!
//! Requests arrive as RESP arrays of bulk strings (or inline lines) and are
//! decoded straight into [`Command`](crate::commands::Command)s. Responses are
//! converted to [`RespValue`] and encoded back onto the socket.
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` enum and its encoding
//! - `parser`: Incremental decoder for incoming command frames
//!
//! ## Example
//!
//! ```ignore
//! use cellkv::protocol::{CommandDecoder, RespValue};
//! use bytes::BytesMut;
//!
//! // Decoding incoming data
//! let mut buf = BytesMut::from(&b"*2\r\n$4\r\nLLEN\r\n$4\r\nlist\r\n"[..]);
//! let cmd = CommandDecoder::new().decode(&mut buf)?.unwrap();
//!
//! // Encoding responses
//! let mut out = BytesMut::new();
//! RespValue::Integer(3).encode(&mut out);
//! ```

pub mod parser;
pub mod types;

pub use parser::{CommandDecoder, DecodeError, DecodeResult, MAX_BULK_SIZE};
pub use types::RespValue;

//! Connection Handler Module
//!
//! This module handles individual client connections to a cellkv node.
//! Each client gets its own handler task that runs in a loop,
//! reading command frames and sending responses.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read bytes from socket  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Decode every complete   │ │
//!    │  │ command in the buffer   │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Route to cell, apply,   │ │
//!    │  │ encode, release to pool │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Flush responses         │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Client disconnects / protocol error
//! ```
//!
//! ## Buffer Management
//!
//! Incoming data accumulates in a `BytesMut`. TCP is a stream protocol, so a
//! read may hold half a command or several pipelined ones. Responses for all
//! commands decoded from one read are encoded into a single write buffer and
//! flushed together.

use crate::cluster::Node;
use crate::protocol::{CommandDecoder, DecodeError, RespValue};
use crate::storage::EngineResolver;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Maximum size for the read buffer (64 MB)
const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands applied
    pub commands_processed: AtomicU64,
    /// Commands that produced an error response
    pub error_responses: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self, failed: bool) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.error_responses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// Generic over the stream so tests can drive it with an in-memory mock.
pub struct ConnectionHandler<S, R> {
    stream: S,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Incoming data not yet decoded
    buffer: BytesMut,

    /// Encoded responses waiting to be flushed
    out: BytesMut,

    node: Arc<Node<R>>,

    decoder: CommandDecoder,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S, R> ConnectionHandler<S, R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: EngineResolver,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The byte stream for this connection
    /// * `addr` - The client's socket address
    /// * `node` - The node whose cells apply the client's commands
    /// * `stats` - Shared connection statistics
    pub fn new(stream: S, addr: SocketAddr, node: Arc<Node<R>>, stats: Arc<ConnectionStats>) -> Self {
        stats.connection_opened();

        Self {
            stream,
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            out: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            node,
            decoder: CommandDecoder::new(),
            stats,
        }
    }

    /// Runs the main connection loop until the client disconnects or an
    /// error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-apply-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let decoded = self.apply_buffered();

            if !self.out.is_empty() {
                self.flush_responses().await?;
            }

            if let Err(e) = decoded {
                warn!(client = %self.addr, error = %e, "Protocol error");
                self.send_protocol_error(&e).await?;
                return Err(e.into());
            }

            self.read_more_data().await?;
        }
    }

    /// Applies every complete command in the read buffer, encoding each
    /// response into the write buffer.
    ///
    /// Responses are encoded before a decode error is reported, so commands
    /// that preceded a bad frame are still answered.
    fn apply_buffered(&mut self) -> Result<(), DecodeError> {
        while let Some(cmd) = self.decoder.decode(&mut self.buffer)? {
            trace!(
                client = %self.addr,
                command = %cmd,
                remaining = self.buffer.len(),
                "Decoded command"
            );

            let rsp = self.node.apply(&cmd);
            self.stats.command_processed(rsp.is_error());
            rsp.to_resp().encode(&mut self.out);
            self.node.pool().release(rsp);
        }
        Ok(())
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.read_buf(&mut self.buffer).await?;

        if n == 0 {
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Writes all pending responses to the client.
    async fn flush_responses(&mut self) -> Result<(), ConnectionError> {
        let bytes = self.out.split();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.addr,
            bytes = bytes.len(),
            "Sent responses"
        );
        Ok(())
    }

    async fn send_protocol_error(&mut self, err: &DecodeError) -> Result<(), ConnectionError> {
        RespValue::error(format!("ERR Protocol error: {}", err)).encode(&mut self.out);
        self.flush_responses().await
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The client sent a frame that could not be decoded
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial command)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a TCP client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
pub async fn handle_connection<R: EngineResolver>(
    stream: TcpStream,
    addr: SocketAddr,
    node: Arc<Node<R>>,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, node, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use crate::codec::ReceiveBuffer;
use crate::connection::message_writer::MessageWriter;
use crate::connection::{ConnectionInfo, Observer};
use crate::protocol::{ConnectionError, Error};

/// Spare room guaranteed in the receive buffer before each read
const READ_RESERVE: usize = 4 * 1024;

const WRITE_BUFFER_SIZE: usize = 8 * 1024;

/// Lifecycle of a [`Connection`].
///
/// `Open -> HalfClosed -> Closed`, or `Open -> Closed` directly on error or
/// local close. No transition leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Both directions usable
    Open,
    /// The peer finished sending, writing may still be possible
    HalfClosed,
    /// Nothing more can happen on this connection
    Closed,
}

/// One established byte-stream connection.
///
/// Reading is pulled: [`recv`](Connection::recv) returns the next complete
/// message, `None` once the peer half-closed cleanly, or the error that tore
/// the connection down. Lifecycle events are pushed to the [`Observer`].
///
/// # Type Parameters
///
/// * `R`: The async readable half
/// * `W`: The async writable half
/// * `D`: The decoder for inbound messages
pub struct Connection<R, W, D> {
    info: ConnectionInfo,
    state: ConnectionState,
    reader: Option<R>,
    writer: Option<MessageWriter<W>>,
    receive: Option<ReceiveBuffer<D>>,
    // peer sent EOF, only buffered bytes are left to decode
    read_closed: bool,
    write_closed: bool,
    observer: Arc<dyn Observer>,
}

/// A [`Connection`] over the two halves of a TCP stream.
pub type TcpConnection<D> = Connection<OwnedReadHalf, OwnedWriteHalf, D>;

impl<R, W, D> Connection<R, W, D>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    D: Decoder<Error = Error>,
{
    pub fn new(reader: R, writer: W, decoder: D, info: ConnectionInfo, observer: Arc<dyn Observer>) -> Self {
        observer.on_open(&info);
        Self {
            info,
            state: ConnectionState::Open,
            reader: Some(reader),
            writer: Some(MessageWriter::with_capacity(writer, WRITE_BUFFER_SIZE)),
            receive: Some(ReceiveBuffer::new(decoder)),
            read_closed: false,
            write_closed: false,
            observer,
        }
    }

    /// Waits for the next complete message.
    ///
    /// Returns `Ok(None)` when the peer half-closed and every message it sent
    /// has been returned; later calls keep returning `Ok(None)`. A decode or
    /// transport failure closes the connection and is returned once, after
    /// that every call fails with [`ConnectionError::Closed`].
    pub async fn recv(&mut self) -> Result<Option<D::Item>, Error> {
        match self.state {
            ConnectionState::Open => {}
            ConnectionState::HalfClosed => return Ok(None),
            ConnectionState::Closed => return Err(ConnectionError::Closed.into()),
        }

        loop {
            let (Some(reader), Some(receive)) = (self.reader.as_mut(), self.receive.as_mut()) else {
                return Err(ConnectionError::Closed.into());
            };

            let decoded = if self.read_closed { receive.finish() } else { receive.next_message() };
            match decoded {
                Ok(Some(message)) => {
                    self.observer.on_message(&self.info);
                    return Ok(Some(message));
                }
                Ok(None) if self.read_closed => {
                    self.end();
                    return Ok(None);
                }
                Ok(None) => {}
                Err(e) => return Err(self.fail(e)),
            }

            let buffer = receive.read_buf();
            buffer.reserve(READ_RESERVE);
            match reader.read_buf(buffer).await {
                Ok(0) => {
                    trace!(conn_id = self.info.id(), buffered = receive.len(), "peer sent eof");
                    self.read_closed = true;
                }
                Ok(len) => self.observer.on_data(&self.info, len),
                Err(e) => return Err(self.fail(e.into())),
            }
        }
    }

    /// Writes `bytes` completely and flushes them.
    ///
    /// The transport may split them into any number of segments.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let writer = self.writable()?;
        match writer.write_all(bytes).await {
            Ok(()) => {
                self.observer.on_sent(&self.info, bytes.len());
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Encodes `item` into one buffer, then writes and flushes it.
    ///
    /// An encoding failure writes nothing and leaves the connection usable.
    pub async fn send_message<E, I>(&mut self, encoder: &mut E, item: I) -> Result<(), Error>
    where
        E: Encoder<I, Error = Error>,
    {
        let writer = self.writable()?;
        let len = writer.write(encoder, item)?;
        match writer.flush().await {
            Ok(()) => {
                self.observer.on_sent(&self.info, len);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Half-closes the outbound direction, reading stays possible.
    ///
    /// Calling it again is a no-op. Once the peer has half-closed too the
    /// connection is closed.
    pub async fn shutdown_write(&mut self) -> Result<(), Error> {
        if self.write_closed {
            return Ok(());
        }

        let writer = self.writable()?;
        if let Err(e) = writer.shutdown().await {
            return Err(self.fail(e.into()));
        }
        debug!(conn_id = self.info.id(), "write direction shut down");
        self.write_closed = true;
        self.settle();
        Ok(())
    }

    /// Closes the connection locally.
    ///
    /// Pending output is flushed on a best-effort basis. Closing twice is a
    /// no-op, and a local close never reports `on_end` or `on_error`.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        if let (Some(writer), false) = (self.writer.as_mut(), self.write_closed) {
            if let Err(e) = writer.shutdown().await {
                debug!(conn_id = self.info.id(), cause = %e, "shutdown failed while closing");
            }
        }

        self.state = ConnectionState::Closed;
        self.release();
        self.observer.on_close(&self.info);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// Bytes received but not yet returned as part of a message.
    pub fn buffered(&self) -> usize {
        self.receive.as_ref().map_or(0, ReceiveBuffer::len)
    }

    /// Tears the connection down because of `error`, which is reported to the
    /// observer and handed back.
    pub(crate) fn abort(&mut self, error: Error) -> Error {
        self.fail(error)
    }

    fn writable(&mut self) -> Result<&mut MessageWriter<W>, Error> {
        if self.write_closed {
            return Err(ConnectionError::Closed.into());
        }
        self.writer.as_mut().ok_or_else(|| ConnectionError::Closed.into())
    }

    fn end(&mut self) {
        self.state = ConnectionState::HalfClosed;
        self.reader = None;
        self.receive = None;
        self.observer.on_end(&self.info);
        self.settle();
    }

    // both directions finished
    fn settle(&mut self) {
        if self.state == ConnectionState::HalfClosed && self.write_closed {
            self.state = ConnectionState::Closed;
            self.release();
            self.observer.on_close(&self.info);
        }
    }

    fn fail(&mut self, error: Error) -> Error {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Closed;
            self.observer.on_error(&self.info, &error);
            self.release();
        }
        error
    }

    fn release(&mut self) {
        self.reader = None;
        self.writer = None;
        self.receive = None;
    }
}

impl<R, W, D> fmt::Debug for Connection<R, W, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("info", &self.info)
            .field("state", &self.state)
            .field("read_closed", &self.read_closed)
            .field("write_closed", &self.write_closed)
            .finish_non_exhaustive()
    }
}

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;

use crate::protocol::Error;

/// Write half of a connection with an encode buffer in front of it.
///
/// A message is encoded completely before any of it reaches the transport, so
/// an encoding failure never leaves a partial message on the wire.
#[derive(Debug)]
pub(crate) struct MessageWriter<W> {
    writer: W,
    buffer: BytesMut,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub(crate) fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size) }
    }

    /// Encodes `item` into the buffer, returns the number of bytes it took.
    pub(crate) fn write<E, I>(&mut self, encoder: &mut E, item: I) -> Result<usize, Error>
    where
        E: Encoder<I, Error = Error>,
    {
        let start = self.buffer.len();
        match encoder.encode(item, &mut self.buffer) {
            Ok(()) => Ok(self.buffer.len() - start),
            Err(e) => {
                self.buffer.truncate(start);
                Err(e)
            }
        }
    }

    pub(crate) async fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all_buf(&mut self.buffer).await?;
        }
        self.writer.flush().await
    }

    /// Writes raw bytes after anything already buffered.
    pub(crate) async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all_buf(&mut self.buffer).await?;
        }
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }

    /// Flushes, then shuts the write direction down.
    pub(crate) async fn shutdown(&mut self) -> io::Result<()> {
        self.flush().await?;
        self.writer.shutdown().await
    }
}

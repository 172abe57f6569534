//! Per-connection accumulation of received bytes.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Initial capacity of the receive buffer
const INIT_BUFFER_SIZE: usize = 8 * 1024;

/// Bytes received but not yet assembled into a message, paired with the
/// decoder that assembles them.
///
/// This is the socket-free face of the decoding side: feeding a chunk yields
/// every message that chunk completes, whatever its size.
///
/// ```
/// use micro_wire::codec::{ReceiveBuffer, RequestDecoder};
///
/// let mut receive = ReceiveBuffer::new(RequestDecoder::new());
/// assert!(receive.feed(b"GET / HTTP/1.1\r\nHost: local").unwrap().is_empty());
/// let requests = receive.feed(b"host\r\n\r\n").unwrap();
/// assert_eq!(requests.len(), 1);
/// assert!(receive.finish().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct ReceiveBuffer<D> {
    buffer: BytesMut,
    decoder: D,
}

impl<D: Decoder> ReceiveBuffer<D> {
    pub fn new(decoder: D) -> Self {
        Self::with_capacity(decoder, INIT_BUFFER_SIZE)
    }

    pub fn with_capacity(decoder: D, capacity: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(capacity), decoder }
    }

    /// Appends a chunk and returns every message it completes, in order.
    ///
    /// After an error the buffered bytes are discarded; a stream that failed to
    /// decode is never resynchronized.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<D::Item>, D::Error> {
        self.buffer.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(message) = self.next_message()? {
            messages.push(message);
        }
        Ok(messages)
    }

    /// Decodes the next message from the bytes already buffered.
    pub fn next_message(&mut self) -> Result<Option<D::Item>, D::Error> {
        self.decoder.decode(&mut self.buffer).inspect_err(|_e| self.buffer.clear())
    }

    /// Signals that no more bytes will arrive.
    ///
    /// Returns the complete messages still buffered one call at a time, then
    /// `Ok(None)`, or a truncation error if a partial message remains.
    pub fn finish(&mut self) -> Result<Option<D::Item>, D::Error> {
        self.decoder.decode_eof(&mut self.buffer).inspect_err(|_e| self.buffer.clear())
    }

    /// Buffer the transport reads into.
    pub(crate) fn read_buf(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Number of bytes received but not yet part of a returned message.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

//! HTTP header encoder implementation for serializing the header section
//!
//! Fields are written in the order they were added, with their original name
//! spelling. When the message has a body, the encoder is the single source of
//! its `Content-Length`.

use crate::protocol::{Error, Headers};

use bytes::{BufMut, BytesMut};

use http::header;
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::debug;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for the header section of a message implementing the [`Encoder`] trait.
///
/// The item is the header list plus the length of the body, if there is one.
/// With a body the first `Content-Length` field is rewritten to the exact body
/// length and later duplicates are dropped; if the caller supplied none, one
/// is appended after the other fields. Without a body the fields are written
/// as given.
#[derive(Debug, Clone, Copy)]
pub struct HeaderEncoder;

impl Encoder<(&Headers, Option<usize>)> for HeaderEncoder {
    type Error = Error;

    fn encode(&mut self, item: (&Headers, Option<usize>), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (headers, body_length) = item;

        dst.reserve(INIT_HEADER_SIZE);

        let mut length_written = false;
        for field in headers {
            if let Some(length) = body_length {
                if field.is(header::CONTENT_LENGTH.as_str()) {
                    if !length_written {
                        if field.value().as_bytes() != length.to_string().as_bytes() {
                            debug!(supplied = ?field.value(), body_length = length, "rewrite content-length to body length");
                        }
                        write_content_length(dst, field.name(), length)?;
                        length_written = true;
                    }
                    continue;
                }
            }

            dst.put_slice(field.name().as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(field.value().as_bytes());
            dst.put_slice(b"\r\n");
        }

        if let (Some(length), false) = (body_length, length_written) {
            write_content_length(dst, "Content-Length", length)?;
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

fn write_content_length(dst: &mut BytesMut, name: &str, length: usize) -> io::Result<()> {
    write!(FastWrite(dst), "{name}: {length}\r\n")
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
pub(crate) struct FastWrite<'a>(pub(crate) &'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

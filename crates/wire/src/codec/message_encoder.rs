use std::fmt;
use std::marker::PhantomData;

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::StartLine;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Error, Message};

/// Serializes one complete message into a contiguous buffer.
///
/// Output is the start-line, the header fields in order, an empty line and the
/// body verbatim, every line ending in CRLF. See [`HeaderEncoder`] for the
/// `Content-Length` rules.
///
/// Header and start-line content is validated when the message is built, so
/// the only failure left here is a start-line version other than HTTP/1.0 or
/// HTTP/1.1, which is reported before anything is written to `dst`.
pub struct MessageEncoder<L> {
    header_encoder: HeaderEncoder,
    _line: PhantomData<fn(&L)>,
}

impl<L> MessageEncoder<L> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<L> Default for MessageEncoder<L> {
    fn default() -> Self {
        Self { header_encoder: HeaderEncoder, _line: PhantomData }
    }
}

impl<L> fmt::Debug for MessageEncoder<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageEncoder").finish_non_exhaustive()
    }
}

impl<L: StartLine> Encoder<&Message<L>> for MessageEncoder<L> {
    type Error = Error;

    fn encode(&mut self, item: &Message<L>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let start = dst.len();
        item.line().encode(dst)?;

        let body = item.body();
        self.header_encoder.encode((item.headers(), body.map(|body| body.len())), dst)?;

        if let Some(body) = body {
            dst.extend_from_slice(body);
        }

        trace!(message_size = dst.len() - start, "encoded message");
        Ok(())
    }
}

impl<L: StartLine> Encoder<Message<L>> for MessageEncoder<L> {
    type Error = Error;

    fn encode(&mut self, item: Message<L>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode(&item, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{RequestDecoder, RequestEncoder, ResponseEncoder};
    use crate::protocol::{Request, Response};
    use http::{Method, StatusCode, Version};
    use tokio_util::codec::Decoder;

    fn encode_request(request: &Request) -> BytesMut {
        let mut dst = BytesMut::new();
        RequestEncoder::new().encode(request, &mut dst).unwrap();
        dst
    }

    #[test]
    fn request_without_body() {
        let request = Request::get("/").unwrap().header("Host", "localhost:8124").unwrap();
        assert_eq!(&encode_request(&request)[..], b"GET / HTTP/1.1\r\nHost: localhost:8124\r\n\r\n");
    }

    #[test]
    fn request_with_body_gets_content_length() {
        let request = Request::post("/").unwrap().header("Host", "localhost:8124").unwrap().with_body("Hello");
        assert_eq!(&encode_request(&request)[..], b"POST / HTTP/1.1\r\nHost: localhost:8124\r\nContent-Length: 5\r\n\r\nHello");
    }

    #[test]
    fn hello_world_response() {
        let response = Response::with_status(StatusCode::OK).header("Content-Type", "text/plain").unwrap().with_body("Hello World!");

        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(response, &mut dst).unwrap();
        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 12\r\n\r\nHello World!");
    }

    #[test]
    fn unsupported_version_writes_nothing() {
        let (line, headers, body) = Request::get("/").unwrap().into_parts();
        let request = Request::from_parts(line.with_version(Version::HTTP_3), headers, body);

        let mut dst = BytesMut::from(&b"previous"[..]);
        let error = RequestEncoder::new().encode(&request, &mut dst).unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { .. }));
        assert_eq!(&dst[..], b"previous");
    }

    #[test]
    fn round_trip_one_byte_at_a_time() {
        let request = Request::new(Method::POST, "/submit?x=1")
            .unwrap()
            .header("Host", "localhost:8124")
            .unwrap()
            .header("X-Trace", "a")
            .unwrap()
            .header("x-trace", "b")
            .unwrap()
            .header("Content-Length", "5")
            .unwrap()
            .with_body("Hello");

        let bytes = encode_request(&request);
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::new();
        let mut decoded = vec![];
        for byte in bytes.iter() {
            buffer.extend_from_slice(&[*byte]);
            if let Some(message) = decoder.decode(&mut buffer).unwrap() {
                decoded.push(message);
            }
        }

        assert_eq!(decoded, vec![request]);
    }
}

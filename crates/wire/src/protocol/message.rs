use bytes::Bytes;

use crate::protocol::{Headers, MalformedHeaderError};

/// A complete HTTP/1.1 message.
///
/// The generic parameter `L` is the start-line, either a
/// [`RequestLine`](crate::protocol::RequestLine) or a
/// [`StatusLine`](crate::protocol::StatusLine).
///
/// The body is only ever framed by `Content-Length`: a message received with
/// that header carries `Some(body)` (possibly empty), one received without it
/// carries `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<L> {
    line: L,
    headers: Headers,
    body: Option<Bytes>,
}

impl<L> Message<L> {
    pub fn from_parts(line: L, headers: Headers, body: Option<Bytes>) -> Self {
        Self { line, headers, body }
    }

    pub fn into_parts(self) -> (L, Headers, Option<Bytes>) {
        (self.line, self.headers, self.body)
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Option<Bytes>) {
        self.body = body;
    }

    /// Appends a header field, builder style.
    pub fn header<N, V>(mut self, name: N, value: V) -> Result<Self, MalformedHeaderError>
    where
        N: Into<String>,
        V: AsRef<[u8]>,
    {
        self.headers.append(name, value)?;
        Ok(self)
    }

    /// Attaches a body, builder style.
    #[must_use]
    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }
}

//! Ordered header fields.
//!
//! `http::HeaderMap` groups values by name and lowercases names, which loses the
//! wire order and spelling of the fields. [`Headers`] keeps every field in the
//! order it was added and compares names case-insensitively, while still using
//! `http`'s [`HeaderName`] and [`HeaderValue`] to validate the content.

use http::{HeaderName, HeaderValue, header};

use crate::ensure;
use crate::protocol::{MalformedHeaderError, ProtocolError};

/// A single `name: value` header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: HeaderValue,
}

impl HeaderField {
    /// Builds a header field, rejecting names that are not HTTP tokens and values
    /// that contain control characters such as CR or LF.
    pub fn new<N, V>(name: N, value: V) -> Result<Self, MalformedHeaderError>
    where
        N: Into<String>,
        V: AsRef<[u8]>,
    {
        let name = name.into();
        HeaderName::from_bytes(name.as_bytes()).map_err(|_e| MalformedHeaderError::new(format!("invalid header name {name:?}")))?;
        let value = HeaderValue::from_bytes(value.as_ref())
            .map_err(|_e| MalformedHeaderError::new(format!("invalid value for header {name:?}")))?;
        Ok(Self { name, value })
    }

    /// Parses one header line received from the peer, without its CRLF.
    pub(crate) fn parse_line(line: &[u8]) -> Result<Self, ProtocolError> {
        let colon = line.iter().position(|b| *b == b':').ok_or_else(|| ProtocolError::invalid_header("missing colon"))?;
        let (name, value) = (&line[..colon], &line[colon + 1..]);

        // whitespace between name and colon is rejected, see RFC 9112 section 5.1
        ensure!(!name.is_empty(), ProtocolError::invalid_header("empty header name"));
        ensure!(!name.last().is_some_and(u8::is_ascii_whitespace), ProtocolError::invalid_header("whitespace before colon"));

        let header_name = HeaderName::from_bytes(name).map_err(|_e| ProtocolError::invalid_header("invalid header name"))?;
        let value = HeaderValue::from_bytes(value.trim_ascii())
            .map_err(|_e| ProtocolError::invalid_header(format!("invalid value for header {header_name}")))?;

        // HeaderName accepted the bytes, so they are visible ascii
        Ok(Self { name: String::from_utf8_lossy(name).into_owned(), value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }

    /// Case-insensitive name comparison.
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Fields built from `http` types need no further validation; the name is
/// written in its lowercase form.
impl From<(HeaderName, HeaderValue)> for HeaderField {
    fn from((name, value): (HeaderName, HeaderValue)) -> Self {
        Self { name: name.as_str().to_string(), value }
    }
}

/// Header fields in wire order, duplicates preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<HeaderField>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    /// Validates and appends a field after all existing ones.
    pub fn append<N, V>(&mut self, name: N, value: V) -> Result<(), MalformedHeaderError>
    where
        N: Into<String>,
        V: AsRef<[u8]>,
    {
        self.fields.push(HeaderField::new(name, value)?);
        Ok(())
    }

    pub fn push(&mut self, field: HeaderField) {
        self.fields.push(field);
    }

    /// Returns the value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.fields.iter().find(|field| field.is(name)).map(HeaderField::value)
    }

    /// Returns the values of every field called `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.fields.iter().filter(move |field| field.is(name)).map(HeaderField::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.is(name))
    }

    /// Removes every field called `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|field| !field.is(name));
        before - self.fields.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolves the declared body length.
    ///
    /// The first `Content-Length` is authoritative. Later duplicates must carry the
    /// same value, otherwise the length is ambiguous and
    /// [`ProtocolError::ConflictingContentLength`] is returned.
    pub fn content_length(&self) -> Result<Option<u64>, ProtocolError> {
        let mut lengths = self.get_all(header::CONTENT_LENGTH.as_str()).map(parse_content_length);

        let Some(first) = lengths.next().transpose()? else {
            return Ok(None);
        };

        for length in lengths {
            let second = length?;
            ensure!(second == first, ProtocolError::ConflictingContentLength { first, second });
        }

        Ok(Some(first))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a HeaderField;
    type IntoIter = std::slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn parse_content_length(value: &HeaderValue) -> Result<u64, ProtocolError> {
    let digits = value.as_bytes().trim_ascii();

    // u64::from_str would also accept a leading '+'
    ensure!(
        !digits.is_empty() && digits.iter().all(u8::is_ascii_digit),
        ProtocolError::invalid_content_length(format!("value {:?} is not a decimal length", String::from_utf8_lossy(digits)))
    );

    std::str::from_utf8(digits)
        .ok()
        .and_then(|str| str.parse::<u64>().ok())
        .ok_or_else(|| ProtocolError::invalid_content_length("value overflows u64"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_rejects_crlf_injection() {
        assert!(HeaderField::new("X-Evil", "a\r\nContent-Length: 0").is_err());
        assert!(HeaderField::new("X-Evil\r\nHost", "a").is_err());
        assert!(HeaderField::new("", "a").is_err());
        assert!(HeaderField::new("X-Tab", "a\tb").is_ok());
    }

    #[test]
    fn names_compare_case_insensitively_and_keep_spelling() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/plain").unwrap();

        assert_eq!(headers.get("content-type").unwrap().to_str().unwrap(), "text/plain");
        assert_eq!(headers.iter().next().unwrap().name(), "Content-Type");
    }

    #[test]
    fn duplicates_keep_their_order() {
        let mut headers = Headers::new();
        headers.append("Accept", "a").unwrap();
        headers.append("Host", "h").unwrap();
        headers.append("accept", "b").unwrap();

        let values: Vec<_> = headers.get_all("ACCEPT").map(|v| v.to_str().unwrap()).collect();
        assert_eq!(values, ["a", "b"]);
        assert_eq!(headers.iter().map(HeaderField::name).collect::<Vec<_>>(), ["Accept", "Host", "accept"]);

        assert_eq!(headers.remove("accept"), 2);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn content_length_resolution() {
        let mut headers = Headers::new();
        assert_eq!(headers.content_length(), Ok(None));

        headers.append("Content-Length", " 12 ").unwrap();
        assert_eq!(headers.content_length(), Ok(Some(12)));

        headers.append("content-length", "12").unwrap();
        assert_eq!(headers.content_length(), Ok(Some(12)));

        headers.append("CONTENT-LENGTH", "13").unwrap();
        assert_eq!(headers.content_length(), Err(ProtocolError::ConflictingContentLength { first: 12, second: 13 }));
    }

    #[test]
    fn content_length_must_be_digits() {
        for value in ["+5", "-1", "5, 5", "", "abc", "99999999999999999999999"] {
            let mut headers = Headers::new();
            headers.append("Content-Length", value).unwrap();
            assert!(
                matches!(headers.content_length(), Err(ProtocolError::InvalidContentLength { .. })),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_line_trims_value_and_rejects_bad_lines() {
        let field = HeaderField::parse_line(b"Host:   localhost:8124  ").unwrap();
        assert_eq!(field.name(), "Host");
        assert_eq!(field.value().to_str().unwrap(), "localhost:8124");

        let field = HeaderField::parse_line(b"X-Empty:").unwrap();
        assert!(field.value().is_empty());

        assert!(HeaderField::parse_line(b"no colon here").is_err());
        assert!(HeaderField::parse_line(b"Host : localhost").is_err());
        assert!(HeaderField::parse_line(b": value").is_err());
        assert!(HeaderField::parse_line(b"Bad Name: value").is_err());
    }
}

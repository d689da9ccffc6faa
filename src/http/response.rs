//! Response handling.
//!
//! # Responsibilities
//! - Hold the synthesized replies sent without consulting a backend
//! - Parse a backend response head into an owned structure for framing
//! - Hand a backend response back to the client unchanged
//!
//! # Design Decisions
//! - Heads and bodies are relayed as raw wire bytes: header case, order and
//!   spacing and chunk framing survive untouched
//! - Backend failures map to 502 Bad Gateway

use bytes::{BufMut, Bytes, BytesMut};

use crate::http::framing::{declared_body, BodyLength, FramingError};

/// Acknowledgement for `POST /payments`.
pub const ACK_PAYMENT: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}";
/// Acknowledgement for `POST /purge-payments`.
pub const ACK_EMPTY: &[u8] = b"HTTP/1.1 200 OK\r\n\r\n";
pub const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\n\r\n";
pub const NOT_FOUND: &[u8] = b"HTTP/1.1 404 Not Found\r\n\r\n";
pub const PAYLOAD_TOO_LARGE: &[u8] = b"HTTP/1.1 413 Payload Too Large\r\n\r\n";
pub const BAD_GATEWAY: &[u8] = b"HTTP/1.1 502 Bad Gateway\r\n\r\n";

/// Status code carried by one of the synthesized replies above.
pub fn synthesized_status(reply: &[u8]) -> u16 {
    reply
        .get(9..12)
        .and_then(|code| std::str::from_utf8(code).ok())
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

/// Status line and headers of a backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// Minor HTTP version (`1` for HTTP/1.1).
    pub version: u8,
    pub code: u16,
    pub reason: String,
    pub headers: Vec<(String, Vec<u8>)>,
}

impl ResponseHead {
    /// Parse a response head from the start of `buf`.
    ///
    /// Returns the head and its length in bytes, or `Ok(None)` while incomplete.
    pub fn parse(buf: &[u8], max_headers: usize) -> Result<Option<(Self, usize)>, FramingError> {
        let mut headers = vec![httparse::EMPTY_HEADER; max_headers];
        let mut response = httparse::Response::new(&mut headers);
        let head_len = match response.parse(buf)? {
            httparse::Status::Complete(len) => len,
            httparse::Status::Partial => return Ok(None),
        };

        let head = Self {
            version: response.version.unwrap_or(1),
            code: response.code.unwrap_or_default(),
            reason: response.reason.unwrap_or_default().to_string(),
            headers: response
                .headers
                .iter()
                .map(|h| (h.name.to_string(), h.value.to_vec()))
                .collect(),
        };
        Ok(Some((head, head_len)))
    }

    /// 1xx responses other than 101 precede the final response.
    pub fn is_interim(&self) -> bool {
        (100..200).contains(&self.code) && self.code != 101
    }

    /// How the body after this head is delimited.
    pub fn body_length(&self) -> Result<BodyLength, FramingError> {
        if (100..200).contains(&self.code) || self.code == 204 || self.code == 304 {
            return Ok(BodyLength::Fixed(0));
        }
        let headers: Vec<httparse::Header<'_>> = self
            .headers
            .iter()
            .map(|(name, value)| httparse::Header {
                name: name.as_str(),
                value: value.as_slice(),
            })
            .collect();
        Ok(declared_body(&headers)?.unwrap_or(BodyLength::UntilClose))
    }
}

/// A complete response read from a backend.
///
/// The parsed head only drives framing; the client receives `raw_head` and
/// `body` exactly as they came off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub head: ResponseHead,
    /// Status line and headers as received, terminating empty line included.
    pub raw_head: Bytes,
    /// Body exactly as it appeared on the wire.
    pub body: Bytes,
}

impl BackendResponse {
    pub fn status(&self) -> u16 {
        self.head.code
    }

    /// Head and body as one byte sequence.
    pub fn to_bytes(&self) -> Bytes {
        if self.body.is_empty() {
            return self.raw_head.clone();
        }
        let mut out = BytesMut::with_capacity(self.raw_head.len() + self.body.len());
        out.put_slice(&self.raw_head);
        out.put_slice(&self.body);
        out.freeze()
    }
}

//! HTTP/1.x message framing.
//!
//! # Responsibilities
//! - Decide where one message ends inside a stream of arbitrary-sized reads
//! - Interpret `Content-Length` and `Transfer-Encoding` the same way for
//!   inbound requests and backend responses
//!
//! # Design Decisions
//! - httparse does the head parsing; nothing here copies or rewrites bytes
//! - Transfer-Encoding wins over Content-Length
//! - Conflicting Content-Length values are a framing error
//! - Chunked bodies are measured, not decoded, so they can be relayed verbatim

use httparse::Status;
use thiserror::Error;

/// Trailer lines accepted after the last chunk.
const MAX_TRAILERS: usize = 32;

/// Reasons a byte stream cannot be framed as an HTTP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("invalid message head: {0}")]
    Head(#[from] httparse::Error),

    #[error("invalid Content-Length header")]
    InvalidContentLength,

    #[error("conflicting Content-Length headers")]
    ConflictingContentLength,

    #[error("request Transfer-Encoding is not chunked")]
    UnsupportedTransferEncoding,

    #[error("invalid chunked body")]
    InvalidChunk,

    #[error("message exceeds {0} bytes")]
    TooLarge(usize),
}

/// How the body following a message head is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLength {
    /// Exactly this many bytes.
    Fixed(usize),
    /// Chunked transfer-encoding, ends with the zero-size chunk and trailers.
    Chunked,
    /// Everything until the peer closes (responses only).
    UntilClose,
}

/// Inspect framing headers. `None` means neither header was present.
pub fn declared_body(headers: &[httparse::Header<'_>]) -> Result<Option<BodyLength>, FramingError> {
    let mut transfer_encoding: Option<bool> = None;
    let mut content_length: Option<usize> = None;

    for header in headers {
        if header.name.eq_ignore_ascii_case("transfer-encoding") {
            transfer_encoding = Some(ends_with_chunked(header.value));
        } else if header.name.eq_ignore_ascii_case("content-length") {
            let length = parse_content_length(header.value)?;
            match content_length {
                Some(previous) if previous != length => {
                    return Err(FramingError::ConflictingContentLength);
                }
                _ => content_length = Some(length),
            }
        }
    }

    Ok(match (transfer_encoding, content_length) {
        (Some(true), _) => Some(BodyLength::Chunked),
        (Some(false), _) => Some(BodyLength::UntilClose),
        (None, Some(length)) => Some(BodyLength::Fixed(length)),
        (None, None) => None,
    })
}

fn ends_with_chunked(value: &[u8]) -> bool {
    value
        .rsplit(|&b| b == b',')
        .next()
        .map(|coding| coding.trim_ascii().eq_ignore_ascii_case(b"chunked"))
        .unwrap_or(false)
}

fn parse_content_length(value: &[u8]) -> Result<usize, FramingError> {
    let value = value.trim_ascii();
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(FramingError::InvalidContentLength);
    }
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(FramingError::InvalidContentLength)
}

/// Length of a complete chunked body at the start of `buf`, trailers included.
///
/// Returns `Ok(None)` while more bytes are needed.
pub fn chunked_body_len(buf: &[u8]) -> Result<Option<usize>, FramingError> {
    let mut pos = 0;
    loop {
        let (consumed, size) = match httparse::parse_chunk_size(&buf[pos..]) {
            Ok(Status::Complete(parsed)) => parsed,
            Ok(Status::Partial) => return Ok(None),
            Err(_) => return Err(FramingError::InvalidChunk),
        };
        pos += consumed;

        if size == 0 {
            let mut trailers = [httparse::EMPTY_HEADER; MAX_TRAILERS];
            return match httparse::parse_headers(&buf[pos..], &mut trailers) {
                Ok(Status::Complete((len, _))) => Ok(Some(pos + len)),
                Ok(Status::Partial) => Ok(None),
                Err(_) => Err(FramingError::InvalidChunk),
            };
        }

        let size = usize::try_from(size).map_err(|_| FramingError::InvalidChunk)?;
        let data_end = pos.checked_add(size).ok_or(FramingError::InvalidChunk)?;
        if buf.len() < data_end {
            return Ok(None);
        }
        pos = match &buf[data_end..] {
            [b'\r', b'\n', ..] => data_end + 2,
            [b'\n', ..] => data_end + 1,
            [] | [b'\r'] => return Ok(None),
            _ => return Err(FramingError::InvalidChunk),
        };
    }
}

/// Length of a head up to and including its terminating empty line.
///
/// Used for heads httparse refuses; leading blank lines are skipped and both
/// `\r\n` and bare `\n` line endings are accepted. Returns `None` while the
/// terminator has not arrived.
pub fn head_end(buf: &[u8]) -> Option<usize> {
    let start = buf.iter().position(|b| !matches!(b, b'\r' | b'\n'))?;
    let mut line_start = start;
    for (i, &b) in buf.iter().enumerate().skip(start) {
        if b != b'\n' {
            continue;
        }
        let line = &buf[line_start..i];
        if line_start > start && (line.is_empty() || line == b"\r") {
            return Some(i + 1);
        }
        line_start = i + 1;
    }
    None
}

/// Incremental framer for one inbound request.
///
/// Feed it the whole accumulated buffer after every read; the head is parsed
/// once and remembered.
#[derive(Debug)]
pub struct RequestFramer {
    max_headers: usize,
    max_bytes: usize,
    head: Option<(usize, Option<BodyLength>)>,
}

impl RequestFramer {
    pub fn new(max_headers: usize, max_bytes: usize) -> Self {
        Self {
            max_headers,
            max_bytes,
            head: None,
        }
    }

    /// Total length of the request once it is complete, `Ok(None)` before that.
    pub fn poll(&mut self, buf: &[u8]) -> Result<Option<usize>, FramingError> {
        let (head_len, body) = match self.head {
            Some(head) => head,
            None => match self.parse_head(buf)? {
                Some(head) => {
                    self.head = Some(head);
                    head
                }
                None => return self.check_limit(buf.len()).map(|_| None),
            },
        };

        let total = match body {
            None => Some(head_len),
            Some(BodyLength::Fixed(length)) => {
                let total = head_len.saturating_add(length);
                self.check_limit(total)?;
                (buf.len() >= total).then_some(total)
            }
            Some(BodyLength::Chunked) => {
                chunked_body_len(&buf[head_len..])?.map(|len| head_len + len)
            }
            Some(BodyLength::UntilClose) => {
                return Err(FramingError::UnsupportedTransferEncoding);
            }
        };

        match total {
            Some(total) => Ok(Some(total)),
            None => self.check_limit(buf.len()).map(|_| None),
        }
    }

    fn parse_head(&self, buf: &[u8]) -> Result<Option<(usize, Option<BodyLength>)>, FramingError> {
        let mut headers = vec![httparse::EMPTY_HEADER; self.max_headers];
        let mut request = httparse::Request::new(&mut headers);
        match request.parse(buf)? {
            Status::Complete(head_len) => Ok(Some((head_len, declared_body(request.headers)?))),
            Status::Partial => Ok(None),
        }
    }

    fn check_limit(&self, len: usize) -> Result<(), FramingError> {
        if len > self.max_bytes {
            Err(FramingError::TooLarge(self.max_bytes))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framer() -> RequestFramer {
        RequestFramer::new(64, 1024)
    }

    #[test]
    fn bodyless_request_ends_at_head() {
        let req = b"GET /payments-summary HTTP/1.1\r\nHost: lb\r\n\r\n";
        assert_eq!(framer().poll(req), Ok(Some(req.len())));
    }

    #[test]
    fn waits_for_content_length_body() {
        let mut f = framer();
        let req = b"POST /payments HTTP/1.1\r\nContent-Length: 12\r\n\r\n{\"amount\":1}";
        let head = req.len() - 12;

        assert_eq!(f.poll(&req[..10]), Ok(None));
        assert_eq!(f.poll(&req[..head]), Ok(None));
        assert_eq!(f.poll(&req[..head + 5]), Ok(None));
        assert_eq!(f.poll(req), Ok(Some(req.len())));
    }

    #[test]
    fn chunked_request() {
        let mut f = framer();
        let req = b"POST /payments HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        assert_eq!(f.poll(&req[..req.len() - 2]), Ok(None));
        assert_eq!(f.poll(req), Ok(Some(req.len())));
    }

    #[test]
    fn transfer_encoding_beats_content_length() {
        let headers = [
            httparse::Header { name: "Content-Length", value: b"3" },
            httparse::Header { name: "Transfer-Encoding", value: b"gzip, chunked" },
        ];
        assert_eq!(declared_body(&headers), Ok(Some(BodyLength::Chunked)));
    }

    #[test]
    fn conflicting_lengths_rejected() {
        let headers = [
            httparse::Header { name: "content-length", value: b"3" },
            httparse::Header { name: "Content-Length", value: b"4" },
        ];
        assert_eq!(declared_body(&headers), Err(FramingError::ConflictingContentLength));

        let headers = [httparse::Header { name: "Content-Length", value: b"-1" }];
        assert_eq!(declared_body(&headers), Err(FramingError::InvalidContentLength));
    }

    #[test]
    fn malformed_request_line() {
        assert!(matches!(framer().poll(b"GET\r\n\r\n"), Err(FramingError::Head(_))));
    }

    #[test]
    fn head_end_for_unparseable_heads() {
        assert_eq!(head_end(b"DELETE /payments\r\n\r\n"), Some(20));
        assert_eq!(head_end(b"GET\n\nrest"), Some(5));
        assert_eq!(head_end(b"\r\nPOST /x\r\nbroken header\r\n\r\n"), Some(28));
        assert_eq!(head_end(b"POST /payments\r\n"), None);
        assert_eq!(head_end(b"\r\n\r\n"), None);
    }

    #[test]
    fn enforces_size_limit() {
        let mut f = RequestFramer::new(64, 64);
        let req = b"POST /payments HTTP/1.1\r\nContent-Length: 100\r\n\r\n";
        assert_eq!(f.poll(req), Err(FramingError::TooLarge(64)));

        let mut f = RequestFramer::new(64, 16);
        assert_eq!(f.poll(b"GET /a-very-long-path-without-end"), Err(FramingError::TooLarge(16)));
    }

    #[test]
    fn non_chunked_request_coding_rejected() {
        let req = b"POST /payments HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n";
        assert_eq!(framer().poll(req), Err(FramingError::UnsupportedTransferEncoding));
    }

    #[test]
    fn chunked_body_with_trailers() {
        let body = b"4\r\nWiki\r\n5;ext=1\r\npedia\r\n0\r\nExpires: never\r\n\r\nNEXT";
        assert_eq!(chunked_body_len(body), Ok(Some(body.len() - 4)));
        assert_eq!(chunked_body_len(&body[..7]), Ok(None));
        assert_eq!(chunked_body_len(b"zz\r\n"), Err(FramingError::InvalidChunk));
        assert_eq!(chunked_body_len(b"2\r\nabX"), Err(FramingError::InvalidChunk));
    }
}

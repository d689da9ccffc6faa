//! Request-line extraction.
//!
//! Only the first line of the raw request is looked at. Everything after it
//! stays opaque and is forwarded verbatim.

/// Method and path taken from the first line of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    /// Path with the query component removed.
    pub path: &'a str,
}

impl<'a> RequestLine<'a> {
    /// Split the first line of `buf` into method and path tokens.
    ///
    /// The line ends at the first `\n` (an optional preceding `\r` is
    /// trimmed) or at the end of the buffer. Returns `None` when fewer than two
    /// tokens are present or the line is not valid UTF-8.
    pub fn parse(buf: &'a [u8]) -> Option<Self> {
        let start = buf.iter().position(|b| !matches!(b, b'\r' | b'\n'))?;
        let rest = &buf[start..];
        let line = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => &rest[..end],
            None => rest,
        };
        let line = std::str::from_utf8(line).ok()?;

        let mut tokens = line.split_ascii_whitespace();
        let method = tokens.next()?;
        let target = tokens.next()?;

        Some(Self {
            method,
            path: strip_query(target),
        })
    }
}

/// Drop the first `?` and everything after it.
pub fn strip_query(target: &str) -> &str {
    match target.find('?') {
        Some(i) => &target[..i],
        None => target,
    }
}

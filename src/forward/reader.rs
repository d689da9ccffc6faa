//! HTTP-aware response reader.
//!
//! Reads exactly one response off a backend connection and stops, so a
//! backend that keeps its connection open after answering never stalls the
//! proxy. The body is delimited by Content-Length, chunked encoding, or the
//! backend closing the connection.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::forward::error::ForwardError;
use crate::http::framing::{chunked_body_len, BodyLength};
use crate::http::response::{BackendResponse, ResponseHead};

const READ_CHUNK: usize = 8 * 1024;

/// Limits applied while reading one response.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    pub max_headers: usize,
    pub max_bytes: usize,
}

/// Read one complete response from `reader`.
pub async fn read_response<R>(reader: &mut R, limits: ReadLimits) -> Result<BackendResponse, ForwardError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);

    loop {
        let (head, head_len) = loop {
            if let Some(parsed) = ResponseHead::parse(&buf, limits.max_headers)? {
                break parsed;
            }
            fill(reader, &mut buf, limits).await?;
        };

        if head.is_interim() {
            tracing::trace!(status = head.code, "Skipping interim response");
            buf.advance(head_len);
            continue;
        }

        let body_len = match head.body_length()? {
            BodyLength::Fixed(len) => {
                let total = head_len.saturating_add(len);
                if total > limits.max_bytes {
                    return Err(ForwardError::TooLarge(limits.max_bytes));
                }
                while buf.len() < total {
                    fill(reader, &mut buf, limits).await?;
                }
                len
            }
            BodyLength::Chunked => loop {
                if let Some(len) = chunked_body_len(&buf[head_len..])? {
                    break len;
                }
                fill(reader, &mut buf, limits).await?;
            },
            BodyLength::UntilClose => {
                while read_some(reader, &mut buf, limits).await? > 0 {}
                buf.len() - head_len
            }
        };

        let raw_head = buf.split_to(head_len).freeze();
        let body = buf.split_to(body_len).freeze();
        return Ok(BackendResponse { head, raw_head, body });
    }
}

/// Read more bytes; end-of-stream here means the response was cut short.
async fn fill<R>(reader: &mut R, buf: &mut BytesMut, limits: ReadLimits) -> Result<(), ForwardError>
where
    R: AsyncRead + Unpin,
{
    match read_some(reader, buf, limits).await? {
        0 => Err(ForwardError::PrematureClose),
        _ => Ok(()),
    }
}

async fn read_some<R>(reader: &mut R, buf: &mut BytesMut, limits: ReadLimits) -> Result<usize, ForwardError>
where
    R: AsyncRead + Unpin,
{
    if buf.len() >= limits.max_bytes {
        return Err(ForwardError::TooLarge(limits.max_bytes));
    }
    buf.reserve(READ_CHUNK);
    let n = reader.read_buf(buf).await.map_err(ForwardError::Read)?;
    if buf.len() > limits.max_bytes {
        return Err(ForwardError::TooLarge(limits.max_bytes));
    }
    Ok(n)
}

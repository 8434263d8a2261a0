//! Byte streams carried between the HTTP layer and backends.

use std::io;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::StoreError;

/// A lazily consumed object body.
///
/// Dropping the stream releases whatever it holds (an HTTP connection, a
/// backend response), whether or not it was fully read.
pub type ObjectStream = BoxStream<'static, io::Result<Bytes>>;

/// Wrap an in-memory buffer as a single-chunk stream.
pub fn stream_from_bytes(data: impl Into<Bytes>) -> ObjectStream {
    let data = data.into();
    if data.is_empty() {
        return stream::empty().boxed();
    }
    stream::once(async move { Ok(data) }).boxed()
}

/// Read `body` to the end, requiring exactly `size` bytes.
pub async fn collect_exact(mut body: ObjectStream, size: u64) -> Result<Bytes, StoreError> {
    let capacity = usize::try_from(size).unwrap_or(usize::MAX).min(64 * 1024 * 1024);
    let mut buf = BytesMut::with_capacity(capacity);

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        let total = buf.len() as u64 + chunk.len() as u64;
        if total > size {
            return Err(StoreError::SizeMismatch {
                expected: size,
                actual: total,
            });
        }
        buf.extend_from_slice(&chunk);
    }

    if (buf.len() as u64) < size {
        return Err(StoreError::SizeMismatch {
            expected: size,
            actual: buf.len() as u64,
        });
    }

    Ok(buf.freeze())
}

/// Pass `body` through, failing the stream if it yields more or fewer than
/// `size` bytes.
///
/// Used where the body is forwarded without buffering, so a lying
/// `Content-Length` surfaces as a stream error instead of a truncated object.
pub(crate) fn exact_length(body: ObjectStream, size: u64) -> ObjectStream {
    stream::unfold(
        (body, 0u64, false),
        move |(mut body, seen, done)| async move {
            if done {
                return None;
            }
            match body.next().await {
                Some(Ok(chunk)) => {
                    let seen = seen + chunk.len() as u64;
                    if seen > size {
                        Some((Err(length_error(size, seen)), (body, seen, true)))
                    } else {
                        Some((Ok(chunk), (body, seen, false)))
                    }
                }
                Some(Err(e)) => Some((Err(e), (body, seen, true))),
                None if seen < size => Some((Err(length_error(size, seen)), (body, seen, true))),
                None => None,
            }
        },
    )
    .boxed()
}

fn length_error(expected: u64, actual: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("body length mismatch: declared {expected} bytes, got {actual}"),
    )
}

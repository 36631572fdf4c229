//! Request body reading, independent of transport.
//!
//! Both responders buffer the whole payload in memory up to a size limit:
//! raw streams through [`read_to_end`], HTTP bodies through [`drain_http`].

use std::io::ErrorKind;
use std::time::Duration;

use axum::body::{Body, Bytes};
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 8192;

/// Error reading a body.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("no data received for {0:?}")]
    Timeout(Duration),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("body stream failed: {0}")]
    Http(#[from] axum::Error),
}

/// Read a byte stream until the peer signals end of input.
///
/// Each individual read may wait at most `idle`. An unexpected EOF (a TLS
/// peer closing without close_notify) counts as end of input.
pub async fn read_to_end<R>(reader: &mut R, limit: usize, idle: Duration) -> Result<Bytes, BodyError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK.min(limit));
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match tokio::time::timeout(idle, reader.read(&mut chunk)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                tracing::debug!(received = buf.len(), "Peer closed without close_notify");
                0
            }
            Ok(Err(e)) => return Err(BodyError::Io(e)),
            Err(_) => return Err(BodyError::Timeout(idle)),
        };

        if n == 0 {
            break;
        }
        if buf.len() + n > limit {
            return Err(BodyError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(Bytes::from(buf))
}

/// Consume an HTTP request body frame by frame.
///
/// Past `limit` the remaining frames are still read, then discarded, so the
/// rejection is only sent once the client has finished its request.
pub async fn drain_http(body: Body, limit: usize) -> Result<Bytes, BodyError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    let mut oversized = false;

    while let Some(frame) = stream.next().await {
        let frame = frame?;
        if oversized {
            continue;
        }
        if buf.len() + frame.len() > limit {
            oversized = true;
            buf = Vec::new();
            continue;
        }
        buf.extend_from_slice(&frame);
    }

    if oversized {
        return Err(BodyError::TooLarge { limit });
    }
    Ok(Bytes::from(buf))
}

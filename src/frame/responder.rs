//! Acknowledge one raw stream.

use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::body::{self, BodyError};
use crate::config::ServerConfig;

/// How a raw connection is read.
#[derive(Debug, Clone, Copy)]
pub struct FramePolicy {
    /// Largest payload accepted before the connection is refused.
    pub max_body_size: usize,
    /// Maximum wait for each read.
    pub read_timeout: Duration,
}

impl FramePolicy {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            max_body_size: config.limits.max_body_size,
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
        }
    }
}

/// Acknowledgment line written back to the peer.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StreamAck {
    Ok { received: usize },
    Error { error: String },
}

impl StreamAck {
    /// JSON followed by a single `\n`.
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = serde_json::to_vec(self).unwrap_or_else(|_| b"{\"status\":\"error\"}".to_vec());
        line.push(b'\n');
        line
    }
}

/// Error on a single raw connection. Never affects other connections.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("TLS handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("failed to write acknowledgment: {0}")]
    Write(#[source] std::io::Error),
}

impl FrameError {
    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            FrameError::Handshake(_) | FrameError::HandshakeTimeout(_) => "handshake_error",
            FrameError::Body(BodyError::TooLarge { .. }) => "too_large",
            FrameError::Body(BodyError::Timeout(_)) => "timeout",
            FrameError::Body(_) => "read_error",
            FrameError::Write(_) => "write_error",
        }
    }
}

/// Read the peer's payload to end of input, then acknowledge and close.
///
/// On success writes `{"status":"ok","received":N}` and returns N. An
/// oversized payload gets an error line before the connection closes. A
/// read timeout or I/O failure closes without writing.
pub async fn respond<S>(stream: &mut S, policy: &FramePolicy) -> Result<usize, FrameError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let body = match body::read_to_end(stream, policy.max_body_size, policy.read_timeout).await {
        Ok(body) => body,
        Err(e @ BodyError::TooLarge { .. }) => {
            let ack = StreamAck::Error { error: e.to_string() };
            // Best effort: the peer may still be writing.
            let _ = write_ack(stream, &ack).await;
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let received = body.len();
    write_ack(stream, &StreamAck::Ok { received })
        .await
        .map_err(FrameError::Write)?;
    Ok(received)
}

async fn write_ack<S>(stream: &mut S, ack: &StreamAck) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&ack.to_line()).await?;
    stream.flush().await?;
    stream.shutdown().await
}

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use crate::error::TransportError;

pub(crate) fn collect_stdout<R>(rd: R) -> JoinHandle<Result<Vec<u8>, TransportError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    collect(rd, "stdout")
}

pub(crate) fn collect_stderr<R>(rd: R) -> JoinHandle<Result<Vec<u8>, TransportError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    collect(rd, "stderr")
}

/// Accumulate a stream until EOF.
fn collect<R>(mut rd: R, label: &'static str) -> JoinHandle<Result<Vec<u8>, TransportError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut acc: Vec<u8> = Vec::new();

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| TransportError::StreamIo {
                stream: label,
                source: e,
            })?;
            if n == 0 {
                break;
            }
            acc.extend_from_slice(&buf[..n]);
        }

        tracing::trace!(stream = label, bytes = acc.len(), "worker stream closed");
        Ok(acc)
    })
}

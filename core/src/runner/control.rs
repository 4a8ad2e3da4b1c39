use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::error::TransportError;

/// Write the whole request, then close stdin. The worker reads until EOF,
/// so the close is what lets it start working.
pub(crate) fn spawn_request_writer(
    mut stdin: Box<dyn AsyncWrite + Unpin + Send>,
    payload: Vec<u8>,
) -> JoinHandle<Result<(), TransportError>> {
    tokio::spawn(async move {
        let io_err = |source| TransportError::StreamIo {
            stream: "stdin",
            source,
        };
        stdin.write_all(&payload).await.map_err(io_err)?;
        stdin.flush().await.map_err(io_err)?;
        stdin.shutdown().await.map_err(io_err)?;
        drop(stdin);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn writes_payload_and_signals_eof() {
        let (wr, mut rd) = tokio::io::duplex(8);
        let task = spawn_request_writer(Box::new(wr), b"{\"action\":\"x\"}".to_vec());

        let mut got = String::new();
        rd.read_to_string(&mut got).await.unwrap();
        assert_eq!(got, "{\"action\":\"x\"}");
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn write_failure_is_reported_as_stdin_error() {
        let wr = tokio_test::io::Builder::new()
            .write_error(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            .build();

        let err = spawn_request_writer(Box::new(wr), b"{}".to_vec())
            .await
            .unwrap()
            .unwrap_err();
        match err {
            TransportError::StreamIo { stream, source } => {
                assert_eq!(stream, "stdin");
                assert_eq!(source.kind(), std::io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

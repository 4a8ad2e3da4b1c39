use thiserror::Error;

/// Failures of a single worker transaction.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("worker spawn failed: {0}")]
    Spawn(String),

    #[error("worker exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("worker output parse failed: {message}\noutput starts with: {excerpt}")]
    OutputDecode { message: String, excerpt: String },

    #[error("worker timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("worker cancelled: {reason}")]
    Cancelled { reason: String },

    #[error("request encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    SpawnFailure,
    NonZeroExit,
    OutputDecodeFailure,
    Timeout,
    Cancelled,
    Encode,
    StreamIo,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpawnFailure => "spawn_failure",
            Self::NonZeroExit => "non_zero_exit",
            Self::OutputDecodeFailure => "output_decode_failure",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Encode => "encode",
            Self::StreamIo => "stream_io",
        }
    }
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Spawn(_) => TransportErrorKind::SpawnFailure,
            Self::NonZeroExit { .. } => TransportErrorKind::NonZeroExit,
            Self::OutputDecode { .. } => TransportErrorKind::OutputDecodeFailure,
            Self::Timeout { .. } => TransportErrorKind::Timeout,
            Self::Cancelled { .. } => TransportErrorKind::Cancelled,
            Self::Encode(_) => TransportErrorKind::Encode,
            Self::StreamIo { .. } => TransportErrorKind::StreamIo,
        }
    }
}

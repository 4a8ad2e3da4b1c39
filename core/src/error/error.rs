use thiserror::Error;

use super::parse::ParseError;
use super::transport::{TransportError, TransportErrorKind};

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("input error: {0}")]
    Input(String),
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Process exit code for the binary.
    ///
    /// 0: success
    /// 2: malformed work-item stream
    /// 11: config error
    /// 20: worker spawn / exit / output failure
    /// 30: parameter text could not be parsed
    /// 130: cancelled
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 11,
            Self::Input(_) => 2,
            Self::Io(_) => 20,
            Self::Item(item) => item.kind.exit_code(),
        }
    }
}

/// A failure attached to the work item that produced it.
#[derive(Error, Debug)]
#[error("processing failed for item {index}:\n{kind}")]
pub struct ItemError {
    pub index: usize,
    pub kind: ItemErrorKind,
}

impl ItemError {
    pub fn new(index: usize, kind: impl Into<ItemErrorKind>) -> Self {
        Self {
            index,
            kind: kind.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            &self.kind,
            ItemErrorKind::Transport(t) if t.kind() == TransportErrorKind::Cancelled
        )
    }
}

#[derive(Error, Debug)]
pub enum ItemErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid work item: {0}")]
    InvalidItem(String),
    #[error("unexpected result shape: expected an object or an array of objects, found {found}")]
    UnexpectedResultShape { found: &'static str },
}

impl ItemErrorKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse(_) => 30,
            Self::InvalidItem(_) => 2,
            Self::UnexpectedResultShape { .. } => 20,
            Self::Transport(t) => match t.kind() {
                TransportErrorKind::Cancelled => 130,
                _ => 20,
            },
        }
    }

    /// Short machine-readable label used in failure records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::InvalidItem(_) => "invalid_item",
            Self::UnexpectedResultShape { .. } => "unexpected_result_shape",
            Self::Transport(t) => t.kind().as_str(),
        }
    }
}

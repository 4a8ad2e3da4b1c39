#[allow(clippy::module_inception)]
pub mod error;
pub mod parse;
pub mod transport;

pub use error::{BridgeError, ItemError, ItemErrorKind};
pub use parse::ParseError;
pub use transport::{TransportError, TransportErrorKind};

//! Core of the TCMS bridge: lenient parameter parsing, the one-shot worker
//! transaction and the sequential batch engine that ties them together.
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod item;
pub mod operations;
pub mod parser;
pub mod runner;
pub mod shape;
pub mod transport;
pub mod util;

pub use engine::{BatchReport, Bridge, BridgeOptions};
pub use envelope::{Credentials, Principal, RequestEnvelope};
pub use error::{BridgeError, ItemError, ItemErrorKind, ParseError, TransportError};
pub use shape::{OutputRecord, ShapePolicy};

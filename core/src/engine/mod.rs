mod run;
mod types;

pub use run::Bridge;
pub use types::{BatchReport, BridgeOptions, ErrorPolicy};

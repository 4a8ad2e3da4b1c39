use serde::{Deserialize, Serialize};

use crate::error::ItemError;
use crate::shape::{OutputRecord, ShapePolicy};
use crate::transport::TransportOptions;

/// What the batch does when an item fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// The first failure ends the batch.
    #[default]
    Stop,
    /// Record the failure and go on with the next item. Cancellation still stops.
    Continue,
}

#[derive(Debug, Clone, Default)]
pub struct BridgeOptions {
    pub transport: TransportOptions,
    pub shape: ShapePolicy,
    pub error_policy: ErrorPolicy,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub records: Vec<OutputRecord>,
    /// Only filled under [`ErrorPolicy::Continue`].
    pub failures: Vec<ItemError>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

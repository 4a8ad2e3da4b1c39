mod worker;

pub use worker::{normalize_exit, WorkerRunnerPlugin};

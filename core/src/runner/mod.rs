mod control;
mod io_pump;
mod traits;
pub mod types;

pub(crate) use control::spawn_request_writer;
pub(crate) use io_pump::{collect_stderr, collect_stdout};
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{ExitOutcome, RunnerStartArgs, Signal};

#[cfg(test)]
pub(crate) mod fake;

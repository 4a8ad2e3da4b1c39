//! tcms-bridge command line: subcommands exposed for unit tests.

pub mod commands;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tcms-bridge", version, about = "Send Kiwi TCMS operations through the worker script")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run work items against the remote service.
    Run(RunArgs),
    /// Normalise parameter text with the lenient parser.
    Parse(ParseArgs),
    /// List the known operations and their dedicated fields.
    Operations(OperationsArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSONL file of work items, one object per line. `-` reads stdin.
    #[arg(long, conflicts_with = "action")]
    pub input: Option<PathBuf>,

    /// Run a single item instead of reading a stream.
    #[arg(long)]
    pub action: Option<String>,

    /// Free-text parameters for `--action`.
    #[arg(long, requires = "action")]
    pub params: Option<String>,

    /// Dedicated field for `--action` (NAME=VALUE). Can be repeated.
    #[arg(long = "field", requires = "action", action = clap::ArgAction::Append)]
    pub fields: Vec<String>,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Keep going after a failed item; failures are reported on stderr.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Reject results that are not an object or an array of objects.
    #[arg(long)]
    pub strict_shape: bool,

    /// Kill the worker after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ParseArgs {
    /// File with the parameter text. Reads stdin when absent.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct OperationsArgs {
    /// Emit the catalog as JSON.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item_flags_parse() {
        let args = Args::try_parse_from([
            "tcms-bridge",
            "run",
            "--action",
            "TestCase.create",
            "--field",
            "summary=Login",
            "--field",
            "priority=2",
            "--continue-on-error",
        ])
        .unwrap();

        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.action.as_deref(), Some("TestCase.create"));
        assert_eq!(run.fields, vec!["summary=Login", "priority=2"]);
        assert!(run.continue_on_error);
        assert!(!run.strict_shape);
    }

    #[test]
    fn input_and_action_conflict() {
        let res = Args::try_parse_from([
            "tcms-bridge",
            "run",
            "--input",
            "items.jsonl",
            "--action",
            "Tag.filter",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn params_need_an_action() {
        assert!(Args::try_parse_from(["tcms-bridge", "run", "--params", "{}"]).is_err());
    }
}

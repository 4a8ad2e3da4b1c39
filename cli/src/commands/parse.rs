use tcms_bridge_core::error::{ItemError, ParseError};
use tcms_bridge_core::{parser, BridgeError};

use super::cli::ParseArgs;
use super::read_input;

pub fn normalise(text: &str, compact: bool) -> Result<String, ParseError> {
    let value = parser::parse(text)?;
    let out = if compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    };
    // serializing a parsed Value cannot fail
    Ok(out.unwrap_or_default())
}

pub async fn run_parse(args: ParseArgs) -> Result<i32, BridgeError> {
    let text = read_input(args.input.as_deref()).await?;
    let out = normalise(&text, args.compact).map_err(|e| ItemError::new(0, e))?;
    println!("{out}");
    Ok(0)
}

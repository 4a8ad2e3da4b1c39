pub mod cli;
pub mod operations;
pub mod parse;
pub mod run;

use std::path::Path;

use tokio::io::AsyncReadExt;

use tcms_bridge_core::BridgeError;

/// Read a whole file, or stdin for `None` and `-`.
pub(crate) async fn read_input(path: Option<&Path>) -> Result<String, BridgeError> {
    match path {
        Some(p) if p != Path::new("-") => tokio::fs::read_to_string(p)
            .await
            .map_err(|e| BridgeError::Input(format!("read {} failed: {e}", p.display()))),
        _ => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            Ok(buf)
        }
    }
}

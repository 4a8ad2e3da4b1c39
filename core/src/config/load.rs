use std::path::{Path, PathBuf};

use super::types::BridgeConfig;

/// Default data directory: ~/.tcms-bridge
pub fn get_bridge_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".tcms-bridge"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<BridgeConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {} failed: {e}", path.display()))?;
    toml::from_str::<BridgeConfig>(&s)
        .map_err(|e| anyhow::anyhow!("parse {} failed: {e}", path.display()))
}

pub fn load_default() -> anyhow::Result<BridgeConfig> {
    // Priority 1: ~/.tcms-bridge/config.toml
    let user_config = get_bridge_data_dir()?.join("config.toml");

    // Priority 2: ./config.toml
    let local_config = Path::new("config.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        BridgeConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Environment variables win over the file. Blank values are ignored.
pub fn apply_env_overrides(cfg: &mut BridgeConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TCMS_BRIDGE_URL") {
        cfg.credentials.url = v;
    }
    if let Some(v) = get("TCMS_BRIDGE_USERNAME") {
        cfg.credentials.username = v;
    }
    if let Some(v) = get("TCMS_BRIDGE_PASSWORD") {
        cfg.credentials.password = v;
    }
    if let Some(v) = get("TCMS_BRIDGE_TIMEOUT_MS") {
        match v.trim().parse::<u64>() {
            Ok(ms) => cfg.worker.timeout_ms = ms,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid TCMS_BRIDGE_TIMEOUT_MS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorPolicy;
    use crate::shape::ShapePolicy;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: BridgeConfig = toml::from_str("").unwrap();
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.worker.timeout_ms, 0);
        assert!(cfg.worker.transport_options().timeout.is_none());
        assert_eq!(cfg.batch.error_policy, ErrorPolicy::Stop);
        assert_eq!(cfg.batch.shape_policy, ShapePolicy::Lenient);
    }

    #[test]
    fn file_sections_are_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[credentials]
url = "https://tcms.example/xml-rpc/"
username = "bot"
password = "pw"

[worker]
timeout_ms = 1500

[batch]
error_policy = "continue"
shape_policy = "strict"
"#
        )
        .unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.credentials.url, "https://tcms.example/xml-rpc/");
        assert_eq!(
            cfg.worker.transport_options().timeout,
            Some(std::time::Duration::from_millis(1500))
        );
        assert_eq!(cfg.batch.error_policy, ErrorPolicy::Continue);
        assert_eq!(cfg.batch.shape_policy, ShapePolicy::Strict);
        assert!(cfg.credentials.to_credentials().is_ok());
        assert!(!format!("{:?}", cfg.credentials).contains("pw\""));
    }

    #[test]
    fn env_overrides_win_and_blank_values_are_ignored() {
        let env: HashMap<&str, &str> = [
            ("TCMS_BRIDGE_URL", "https://other/xml-rpc/"),
            ("TCMS_BRIDGE_USERNAME", "  "),
            ("TCMS_BRIDGE_TIMEOUT_MS", "250"),
        ]
        .into_iter()
        .collect();

        let mut cfg = BridgeConfig::default();
        cfg.credentials.username = "kept".into();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.credentials.url, "https://other/xml-rpc/");
        assert_eq!(cfg.credentials.username, "kept");
        assert_eq!(cfg.worker.timeout_ms, 250);
    }

    #[test]
    fn missing_url_is_a_credentials_error() {
        let cfg = BridgeConfig::default();
        assert!(cfg.credentials.to_credentials().is_err());
    }
}

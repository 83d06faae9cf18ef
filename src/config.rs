use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "KEYBOARD_LOCK_CONFIG";
pub const RESERVED_KEYS_ENV: &str = "KEYBOARD_LOCK_RESERVED_KEYS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardLockConfig {
    pub control_thread_name: String,
    pub platform_thread_name: String,
    /// DOM key codes held by the browser window regardless of which tab is
    /// active.
    pub browser_reserved_keys: Vec<String>,
}

impl Default for KeyboardLockConfig {
    fn default() -> Self {
        Self {
            control_thread_name: "keyboard-lock-control".to_string(),
            platform_thread_name: "keyboard-lock-platform".to_string(),
            browser_reserved_keys: Vec::new(),
        }
    }
}

impl KeyboardLockConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse keyboard lock config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read keyboard lock config {path:?}"))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid config file {path:?}"))
    }

    /// Defaults, overlaid with the file named by `KEYBOARD_LOCK_CONFIG` and
    /// then the key list in `KEYBOARD_LOCK_RESERVED_KEYS`.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim())?,
            _ => Self::default(),
        };
        if let Ok(keys) = env::var(RESERVED_KEYS_ENV) {
            config.browser_reserved_keys = parse_key_list(&keys);
        }
        Ok(config)
    }
}

fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = KeyboardLockConfig::from_json_str(r#"{"browser_reserved_keys":["Escape"]}"#)
            .expect("valid config");
        assert_eq!(config.control_thread_name, "keyboard-lock-control");
        assert_eq!(config.platform_thread_name, "keyboard-lock-platform");
        assert_eq!(config.browser_reserved_keys, vec!["Escape".to_string()]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"control_thread_name":"ui","browser_reserved_keys":["F11","Escape"]}}"#
        )
        .expect("write config");

        let config = KeyboardLockConfig::load(file.path()).expect("load config");
        assert_eq!(config.control_thread_name, "ui");
        assert_eq!(config.browser_reserved_keys.len(), 2);
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{not json").expect("write config");

        let err = KeyboardLockConfig::load(file.path()).expect_err("invalid json");
        assert!(format!("{err:#}").contains("invalid config file"));
    }

    #[test]
    fn key_list_ignores_blanks() {
        assert_eq!(
            parse_key_list(" KeyA, ,Escape,"),
            vec!["KeyA".to_string(), "Escape".to_string()]
        );
        assert!(parse_key_list("").is_empty());
    }
}

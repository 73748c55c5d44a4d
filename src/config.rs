//! Configuration loaded from TOML.

use crate::error::ChatError;
use crate::stream::MAX_CHATTER;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for an [`AppContext`](crate::context::AppContext).
///
/// Every field is optional in the TOML document; missing fields take the
/// [`Default`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Executable name used at the start of facade prefixes.
    pub exec_name: String,
    /// Highest message chatter shown by info and warning output.
    pub max_chatter: u32,
    /// Whether debug output is shown.
    pub debug_mode: bool,
    /// Connect the standard streams to the process console.
    pub console: bool,
    /// Additionally copy all standard-stream output into this file.
    pub tee_file: Option<PathBuf>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            exec_name: String::new(),
            max_chatter: MAX_CHATTER,
            debug_mode: false,
            console: true,
            tee_file: None,
        }
    }
}

impl StreamConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ChatError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ChatError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = StreamConfig::from_toml_str("exec_name = \"demo\"").unwrap();
        assert_eq!(config.exec_name, "demo");
        assert_eq!(config.max_chatter, MAX_CHATTER);
        assert!(config.console);
        assert_eq!(config.tee_file, None);
    }

    #[test]
    fn full_document() {
        let config = StreamConfig::from_toml_str(
            r#"
            exec_name = "demo"
            max_chatter = 3
            debug_mode = true
            console = false
            tee_file = "demo.log"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_chatter, 3);
        assert!(config.debug_mode);
        assert!(!config.console);
        assert_eq!(config.tee_file, Some(PathBuf::from("demo.log")));
    }

    #[test]
    fn serialized_config_parses_back() {
        let config = StreamConfig {
            exec_name: "demo".into(),
            max_chatter: 4,
            tee_file: Some(PathBuf::from("out/demo.log")),
            ..StreamConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(StreamConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = StreamConfig::from_toml_str("max_chatter = \"loud\"").unwrap_err();
        assert!(matches!(err, ChatError::ParseConfig(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StreamConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ChatError::ReadConfig { .. }));
    }
}

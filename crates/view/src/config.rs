use chartspace_input::OrbitConfig;
use chartspace_render::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading a viewer configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Visual and interaction constants for a chart view. Every field is
/// optional in the file and falls back to the built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub layout: LayoutConfig,
    pub orbit: OrbitConfig,
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ViewerConfig::from_json_str("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn nested_overrides() {
        let config = ViewerConfig::from_json_str(
            r#"{"layout": {"height_scale": 8.0}, "orbit": {"zoom_sensitivity": 0.002}}"#,
        )
        .unwrap();
        assert_eq!(config.layout.height_scale, 8.0);
        assert_eq!(config.layout.bar_spacing, 1.5);
        assert_eq!(config.orbit.zoom_sensitivity, 0.002);
        assert_eq!(config.orbit.damping, 0.1);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"orbit": {{"sensitivity": 0.02}}}}"#).unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.orbit.sensitivity, 0.02);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ViewerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

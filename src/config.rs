use crate::error::Result;
use crate::style::LabelStyle;
use crate::sync::DEFAULT_TEXT_Z;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session-wide callout settings, loadable from JSON.
///
/// Every field is optional in the file; missing ones take the defaults.
///
/// ```json
/// {
///   "command_keyword": "SimpleText",
///   "text_z": 9,
///   "default_style": { "font_size": 16, "color": "#ff0000" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalloutConfig {
    /// Plugin command name that routes to callouts (matched case-insensitively)
    pub command_keyword: String,
    /// Draw order of text visuals
    pub text_z: i32,
    /// Style every entity starts with
    pub default_style: LabelStyle,
}

impl Default for CalloutConfig {
    fn default() -> Self {
        CalloutConfig {
            command_keyword: "SimpleText".to_string(),
            text_z: DEFAULT_TEXT_Z,
            default_style: LabelStyle::default(),
        }
    }
}

impl CalloutConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: CalloutConfig = serde_json::from_str(json)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalloutError;
    use crate::style::Lifetime;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(CalloutConfig::from_json("{}").unwrap(), CalloutConfig::default());
    }

    #[test]
    fn test_partial_style_keeps_other_defaults() {
        let config = CalloutConfig::from_json(
            r#"{ "text_z": 4, "default_style": { "font_size": 16, "duration": "Persistent" } }"#,
        )
        .unwrap();
        assert_eq!(config.text_z, 4);
        assert_eq!(config.default_style.font_size, 16.0);
        assert_eq!(config.default_style.duration, Lifetime::Persistent);
        assert_eq!(config.default_style.left, 0.5);
        assert_eq!(config.command_keyword, "SimpleText");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = CalloutConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, CalloutError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CalloutConfig::load_from_file("/nonexistent/callouts.json").unwrap_err();
        assert!(matches!(err, CalloutError::ConfigIo(_)));
    }
}

//! Postprocessor settings
//!
//! Every setting has a default matching the stock postprocessors, so an
//! empty TOML file (or no file at all) gives the standard output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PostError, Result};

/// Unit of the numbers written to the machine files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputUnit {
    #[default]
    Mm,
    Inch,
}

impl OutputUnit {
    pub fn label(&self) -> &'static str {
        match self {
            OutputUnit::Mm => "mm",
            OutputUnit::Inch => "inch",
        }
    }

    pub fn is_metric(&self) -> bool {
        matches!(self, OutputUnit::Mm)
    }
}

/// Settings specific to the G-code writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeSettings {
    /// Prefix every line with `N10`, `N20`, ...
    pub line_numbers: bool,
    /// Emit `G43 H<n>` after a tool change and `G49 H0` before a spindle stop.
    pub tool_length_correction: bool,
    /// Structural comments such as `( Contour )` and lead markers.
    pub additional_comments: bool,
    /// Separator placed between the words of a block.
    pub words_spacer: String,
}

impl Default for GcodeSettings {
    fn default() -> Self {
        Self {
            line_numbers: false,
            tool_length_correction: false,
            additional_comments: true,
            words_spacer: " ".to_string(),
        }
    }
}

/// Complete postprocessor configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PostConfig {
    pub unit: OutputUnit,
    pub gcode: GcodeSettings,
}

impl PostConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PostConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gcode.words_spacer.chars().any(|c| !c.is_whitespace()) {
            return Err(PostError::Config(format!(
                "words_spacer must be whitespace, got '{}'",
                self.gcode.words_spacer
            )));
        }
        if self.gcode.words_spacer.contains('\n') {
            return Err(PostError::Config(
                "words_spacer must not contain a line break".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PostConfig::default();
        assert_eq!(config.unit, OutputUnit::Mm);
        assert!(!config.gcode.line_numbers);
        assert!(!config.gcode.tool_length_correction);
        assert!(config.gcode.additional_comments);
        assert_eq!(config.gcode.words_spacer, " ");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = PostConfig::from_toml_str("").unwrap();
        assert_eq!(config.unit, OutputUnit::Mm);
        assert!(config.gcode.additional_comments);
    }

    #[test]
    fn test_toml_overrides() {
        let config = PostConfig::from_toml_str(
            r#"
unit = "inch"

[gcode]
line_numbers = true
additional_comments = false
"#,
        )
        .unwrap();
        assert_eq!(config.unit, OutputUnit::Inch);
        assert!(config.gcode.line_numbers);
        assert!(!config.gcode.additional_comments);
        assert!(!config.gcode.tool_length_correction);
    }

    #[test]
    fn test_invalid_spacer_rejected() {
        let result = PostConfig::from_toml_str("[gcode]\nwords_spacer = \"_\"\n");
        assert!(matches!(result, Err(PostError::Config(_))));
    }

    #[test]
    fn test_unknown_unit_is_parse_error() {
        let result = PostConfig::from_toml_str("unit = \"furlong\"\n");
        assert!(matches!(result, Err(PostError::Toml(_))));
    }
}

use serde::{Deserialize, Serialize};

/// How much detail `--help` renders by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HelpVerbosity {
    /// One row per argument: aliases and description.
    Basic,
    /// Aliases with value type, description on its own line.
    #[default]
    Detailed,
}

/// Application-wide parsing and dispatch settings.
///
/// Deserializes from camelCase JSON keys; every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// Treat everything after `--` as operand values.
    pub allow_argument_separator: bool,
    /// Report unknown options and surplus operands as errors.
    ///
    /// When `false` such tokens are handed to the handler as remaining tokens.
    pub throw_on_unexpected_argument: bool,
    /// Recognize `-v` / `--version` on the root command.
    pub show_version_option: bool,
    pub default_help_verbosity: HelpVerbosity,
    /// Name used in usage lines and version output (defaults to the root command name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            allow_argument_separator: false,
            throw_on_unexpected_argument: true,
            show_version_option: false,
            default_help_verbosity: HelpVerbosity::Detailed,
            app_name: None,
            version: None,
        }
    }
}

impl AppSettings {
    pub fn basic_help() -> Self {
        Self {
            default_help_verbosity: HelpVerbosity::Basic,
            ..Self::default()
        }
    }

    pub fn detailed_help() -> Self {
        Self {
            default_help_verbosity: HelpVerbosity::Detailed,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = AppSettings::default();
        assert!(!s.allow_argument_separator);
        assert!(s.throw_on_unexpected_argument);
        assert!(!s.show_version_option);
        assert_eq!(s.default_help_verbosity, HelpVerbosity::Detailed);
    }

    #[test]
    fn deserializes_partial_camel_case() {
        let json = r#"{ "allowArgumentSeparator": true, "defaultHelpVerbosity": "basic" }"#;
        let s: AppSettings = serde_json::from_str(json).unwrap();
        assert!(s.allow_argument_separator);
        assert!(s.throw_on_unexpected_argument);
        assert_eq!(s.default_help_verbosity, HelpVerbosity::Basic);
        assert_eq!(s.app_name, None);
    }
}

//! Serializable description of a command tree.
//!
//! A [`CommandMeta`] mirrors a command class: constructor options shared by
//! its commands, leaf commands ([`MethodMeta`]), an optional default command
//! and nested sub-command classes. Tools load it from JSON and turn it into
//! `cmdtree` declarations.

use serde::{Deserialize, Serialize};

/// Version of the JSON layout written by this crate.
pub const FORMAT_VERSION: u32 = 1;

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParamMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    /// Operand (matched by position) instead of option.
    #[serde(default, skip_serializing_if = "is_false")]
    pub positional: bool,
    /// Type tag such as `string`, `int` or `bool`; `string` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

/// A leaf command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MethodMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extended_help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamMeta>,
    /// Exit code reported when the command runs.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

/// A command class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommandMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extended_help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Constructor options, inherited by every command of the class.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ParamMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<MethodMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_command: Option<MethodMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandMeta>,
}

impl CommandMeta {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Classes and leaf commands in this tree, this class included.
    pub fn command_count(&self) -> usize {
        1 + self.commands.len()
            + self
                .subcommands
                .iter()
                .map(CommandMeta::command_count)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_nested_classes() {
        let json = r#"{
  "name": "App",
  "options": [ { "name": "verbose", "short": "v", "valueType": "bool" } ],
  "commands": [
    {
      "name": "Do1",
      "params": [
        { "name": "Opt1" },
        { "name": "Arg1", "positional": true, "required": true }
      ],
      "exitCode": 3
    }
  ],
  "subcommands": [
    { "name": "Second", "commands": [ { "name": "Do2" } ] }
  ]
}"#;
        let meta = CommandMeta::from_json(json).unwrap();
        assert_eq!(meta.options[0].short, Some('v'));
        assert_eq!(meta.options[0].value_type.as_deref(), Some("bool"));
        assert_eq!(meta.commands[0].exit_code, 3);
        assert!(meta.commands[0].params[1].positional);
        assert_eq!(meta.subcommands[0].commands[0].name, "Do2");
        assert_eq!(meta.command_count(), 4);
    }

    #[test]
    fn defaults_are_omitted_when_serialized() {
        let meta = CommandMeta {
            name: "app".to_string(),
            commands: vec![MethodMeta {
                name: "run".to_string(),
                ..MethodMeta::default()
            }],
            ..CommandMeta::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "app", "commands": [ { "name": "run" } ] })
        );
        let back = CommandMeta::from_json(&meta.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, meta);
    }
}

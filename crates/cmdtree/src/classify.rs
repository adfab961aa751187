//! Classification of declared parameters into options and operands.

use crate::declare::{Arity, ParamDecl};
use crate::error::ConfigurationError;
use crate::tree::CommandId;
use crate::types::{self, TypeRegistry};

/// Aliases reserved on every command for the help behavior.
pub const HELP_ALIASES: [&str; 3] = ["-h", "-?", "--help"];
/// Aliases reserved on the root command when the version option is enabled.
pub const VERSION_ALIASES: [&str; 2] = ["-v", "--version"];

/// Where a parameter was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// Bound into the owning object's constructor.
    Constructor,
    /// Passed to the handler.
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Addressed by alias; `flag` options take no value.
    Option { flag: bool },
    /// Addressed by position.
    Operand,
}

/// A classified argument of one command.
#[derive(Debug, Clone)]
pub struct ArgumentInfo {
    pub(crate) name: String,
    pub(crate) kind: ArgumentKind,
    pub(crate) aliases: Vec<String>,
    pub(crate) value_type: String,
    pub(crate) required: bool,
    pub(crate) default_value: Option<String>,
    pub(crate) allowed_values: Vec<String>,
    pub(crate) arity: Arity,
    pub(crate) description: String,
    pub(crate) show_in_help: bool,
    pub(crate) source: ParamSource,
    pub(crate) owner: CommandId,
}

impl ArgumentInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub fn is_option(&self) -> bool {
        matches!(self.kind, ArgumentKind::Option { .. })
    }

    pub fn is_operand(&self) -> bool {
        self.kind == ArgumentKind::Operand
    }

    pub fn is_flag(&self) -> bool {
        self.kind == ArgumentKind::Option { flag: true }
    }

    /// Option aliases with their prefixes (`-o`, `--opt`); an operand's only
    /// alias is its name.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn value_type(&self) -> &str {
        &self.value_type
    }

    /// Required and without a default to fall back on.
    pub fn is_required(&self) -> bool {
        self.required && self.default_value.is_none()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn show_in_help(&self) -> bool {
        self.show_in_help
    }

    pub fn source(&self) -> ParamSource {
        self.source
    }

    pub fn owner(&self) -> CommandId {
        self.owner
    }

    /// How errors refer to the argument: the long alias of an option, the
    /// name of an operand.
    pub fn display_name(&self) -> &str {
        match self.kind {
            ArgumentKind::Operand => &self.name,
            ArgumentKind::Option { .. } => self
                .aliases
                .iter()
                .max_by_key(|a| a.len())
                .map(|a| a.as_str())
                .unwrap_or(&self.name),
        }
    }
}

fn normalize_long(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('-');
    format!("--{trimmed}")
}

/// Classify `param` of `command`.
///
/// Positional parameters become operands, everything else options.
/// Constructor parameters may only be options.
pub fn classify(
    command: &str,
    owner: CommandId,
    param: &ParamDecl,
    source: ParamSource,
    types: &TypeRegistry,
) -> Result<ArgumentInfo, ConfigurationError> {
    if param.name.trim().is_empty() {
        return Err(ConfigurationError::EmptyName { what: "argument" });
    }
    if param.positional && source == ParamSource::Constructor {
        return Err(ConfigurationError::PositionalConstructorParameter {
            command: command.to_string(),
            param: param.name.clone(),
        });
    }
    if !types.contains(&param.value_type) {
        return Err(ConfigurationError::UnknownType {
            command: command.to_string(),
            argument: param.name.clone(),
            type_name: param.value_type.clone(),
        });
    }

    let flag = !param.positional && param.value_type == types::BOOL;
    if flag && param.arity == Arity::List {
        return Err(ConfigurationError::ListFlag {
            command: command.to_string(),
            argument: param.name.clone(),
        });
    }

    if let Some(default_value) = &param.default_value {
        let invalid = |reason: String| ConfigurationError::InvalidDefault {
            command: command.to_string(),
            argument: param.name.clone(),
            value: default_value.clone(),
            reason,
        };
        if let Some(Err(reason)) = types.convert(&param.value_type, default_value) {
            return Err(invalid(reason));
        }
        if !param.allowed_values.is_empty()
            && !param.allowed_values.iter().any(|v| v == default_value)
        {
            return Err(invalid("not an allowed value".to_string()));
        }
    }

    let invalid_alias = |alias: String, reason: &'static str| ConfigurationError::InvalidAlias {
        command: command.to_string(),
        argument: param.name.clone(),
        alias,
        reason,
    };
    let (kind, aliases) = if param.positional {
        if param.name.starts_with('-') {
            return Err(invalid_alias(param.name.clone(), "operand names cannot start with '-'"));
        }
        (ArgumentKind::Operand, vec![param.name.clone()])
    } else {
        let mut aliases = Vec::new();
        if let Some(c) = param.short {
            if c == '-' || c == '=' || c.is_whitespace() {
                return Err(invalid_alias(format!("-{c}"), "not a valid short name"));
            }
            aliases.push(format!("-{c}"));
        }
        let long = normalize_long(param.long.as_deref().unwrap_or(&param.name));
        if long == "--" {
            return Err(invalid_alias(long, "long name is empty"));
        }
        aliases.push(long);
        (ArgumentKind::Option { flag }, aliases)
    };

    Ok(ArgumentInfo {
        name: param.name.clone(),
        kind,
        aliases,
        value_type: param.value_type.clone(),
        required: param.required && !flag,
        default_value: param.default_value.clone(),
        allowed_values: param.allowed_values.clone(),
        arity: param.arity,
        description: param.description.clone(),
        show_in_help: param.show_in_help,
        source,
        owner,
    })
}

//! Error taxonomy.
//!
//! Build-time problems are [`ConfigurationError`]s and abort tree
//! construction. Everything detected while parsing or binding a token
//! sequence is an [`ArgumentError`]; those are collected into
//! [`ArgumentErrors`] and reported together.

use std::fmt;
use thiserror::Error;

/// A malformed command declaration. The application cannot start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("command '{command}': alias '{alias}' is declared by both '{first}' and '{second}'")]
    DuplicateAlias {
        command: String,
        alias: String,
        first: String,
        second: String,
    },

    #[error("command '{command}': alias '{alias}' of '{argument}' is reserved for {reserved_for}")]
    ReservedAlias {
        command: String,
        alias: String,
        argument: String,
        reserved_for: &'static str,
    },

    #[error("command '{command}': argument name '{argument}' is declared more than once")]
    DuplicateArgument { command: String, argument: String },

    #[error(
        "command '{command}': constructor parameter '{param}' cannot be positional; declare it as an option"
    )]
    PositionalConstructorParameter { command: String, param: String },

    #[error("command '{command}': default method '{method}' does not support parameters")]
    ParameterizedDefault { command: String, method: String },

    #[error(
        "command '{command}': has a default method, so argument '{argument}' cannot be required"
    )]
    RequiredArgumentWithDefault { command: String, argument: String },

    #[error("command '{parent}' declares more than one sub-command named '{name}'")]
    DuplicateCommand { parent: String, name: String },

    #[error("command '{command}': list operand '{operand}' must be the last operand")]
    ListOperandNotLast { command: String, operand: String },

    #[error("command '{command}': flag '{argument}' cannot accept a list of values")]
    ListFlag { command: String, argument: String },

    #[error("command '{command}': argument '{argument}' has unknown type '{type_name}'")]
    UnknownType {
        command: String,
        argument: String,
        type_name: String,
    },

    #[error("command '{command}': default value '{value}' of '{argument}' is invalid: {reason}")]
    InvalidDefault {
        command: String,
        argument: String,
        value: String,
        reason: String,
    },

    #[error("command '{command}': argument '{argument}' cannot use alias '{alias}': {reason}")]
    InvalidAlias {
        command: String,
        argument: String,
        alias: String,
        reason: &'static str,
    },

    #[error("command '{command}': method has no handler")]
    MissingHandler { command: String },

    #[error("{what} name cannot be empty")]
    EmptyName { what: &'static str },
}

/// Problems found in a token sequence for the resolved command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Unrecognized option '{0}'")]
    UnrecognizedOption(String),

    #[error("Unrecognized command or argument '{0}'")]
    UnexpectedArgument(String),

    #[error("Missing value for option '{0}'")]
    MissingOptionValue(String),

    #[error("Unexpected value '{value}' for option '{option}'")]
    RepeatedOption { option: String, value: String },

    #[error("Required {kind} '{name}' is missing")]
    MissingArgument { kind: &'static str, name: String },

    #[error("'{value}' is not a valid {type_name} for '{argument}'")]
    ValueConversion {
        argument: String,
        value: String,
        type_name: String,
    },

    #[error("'{value}' is not an allowed value for '{argument}'. Allowed values: {allowed}")]
    NotAllowed {
        argument: String,
        value: String,
        allowed: String,
    },
}

/// Every argument problem of one invocation, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentErrors(Vec<ArgumentError>);

impl ArgumentErrors {
    pub fn extend(&mut self, errs: impl IntoIterator<Item = ArgumentError>) {
        self.0.extend(errs);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArgumentError> {
        self.0.iter()
    }
}

impl fmt::Display for ArgumentErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ArgumentErrors {}

impl From<Vec<ArgumentError>> for ArgumentErrors {
    fn from(errs: Vec<ArgumentError>) -> Self {
        Self(errs)
    }
}

impl<'a> IntoIterator for &'a ArgumentErrors {
    type Item = &'a ArgumentError;
    type IntoIter = std::slice::Iter<'a, ArgumentError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

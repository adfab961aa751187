//! Typed argument values and the string-to-value conversion registry.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub const STRING: &str = "string";
pub const BOOL: &str = "bool";
pub const INT: &str = "int";
pub const UINT: &str = "uint";
pub const FLOAT: &str = "float";
pub const CHAR: &str = "char";
pub const PATH: &str = "path";

/// A converted argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    Path(PathBuf),
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Path(v) => write!(f, "{}", v.display()),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

type ParseFn = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Maps a declared type tag to its parse function.
///
/// Declarations referencing a tag that is not registered are rejected when
/// the command tree is built.
#[derive(Clone)]
pub struct TypeRegistry {
    parsers: HashMap<String, ParseFn>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.parsers.keys().map(|s| s.as_str()).collect();
        tags.sort_unstable();
        f.debug_struct("TypeRegistry").field("tags", &tags).finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut reg = Self {
            parsers: HashMap::new(),
        };
        reg.register(STRING, |s| Ok(Value::Str(s.to_string())));
        reg.register(BOOL, |s| parse_bool(s).map(Value::Bool));
        reg.register(INT, |s| {
            s.parse::<i64>().map(Value::Int).map_err(|e| e.to_string())
        });
        reg.register(UINT, |s| {
            s.parse::<u64>().map(Value::UInt).map_err(|e| e.to_string())
        });
        reg.register(FLOAT, |s| {
            s.parse::<f64>().map(Value::Float).map_err(|e| e.to_string())
        });
        reg.register(CHAR, |s| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err("expected exactly one character".to_string()),
            }
        });
        reg.register(PATH, |s| Ok(Value::Path(PathBuf::from(s))));
        reg
    }
}

impl TypeRegistry {
    /// Register (or replace) the parser for `tag`.
    pub fn register<F>(&mut self, tag: impl Into<String>, parse: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parsers.insert(tag.into(), Arc::new(parse));
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.parsers.contains_key(tag)
    }

    /// `None` when the tag is unknown.
    pub fn convert(&self, tag: &str, raw: &str) -> Option<Result<Value, String>> {
        self.parsers.get(tag).map(|parse| parse(raw))
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err("expected 'true' or 'false'".to_string()),
    }
}

/// Extraction of a Rust value from a bound [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(_) => None,
            Value::Str(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for char {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Path(p) => Some(p.clone()),
            Value::Str(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(v) => <$t>::try_from(*v).ok(),
                        Value::UInt(v) => <$t>::try_from(*v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            single => T::from_value(single).map(|v| vec![v]),
        }
    }
}

/// Converted values of one invocation, keyed by argument name, in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: IndexMap<String, Value>,
}

impl BoundArgs {
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// `None` when the argument is absent or has an incompatible type.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.values.get(name).and_then(T::from_value)
    }

    /// Like [`BoundArgs::get`], but an absent value is an error for handlers
    /// to propagate with `?`.
    pub fn require<T: FromValue>(&self, name: &str) -> anyhow::Result<T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' has no value"))?;
        T::from_value(value).ok_or_else(|| {
            anyhow::anyhow!(
                "argument '{name}' holds '{value}', which is not a {}",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

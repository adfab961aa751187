//! Binding of parsed strings to typed values, and handler invocation.

use tracing::debug;

use crate::classify::{ArgumentInfo, ParamSource};
use crate::console::Console;
use crate::declare::{Arity, Handler, Target};
use crate::error::ArgumentError;
use crate::parse::ArgumentValues;
use crate::tree::{CommandDescriptor, CommandTree};
use crate::types::{BoundArgs, TypeRegistry, Value};

/// Everything a handler receives for one run.
pub struct Invocation {
    path: Vec<String>,
    args: BoundArgs,
    remaining: Vec<String>,
    target: Option<Target>,
    console: Console,
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("path", &self.path)
            .field("args", &self.args)
            .field("remaining", &self.remaining)
            .field("has_target", &self.target.is_some())
            .finish()
    }
}

impl Invocation {
    /// Names of the commands from below the root down to the invoked one.
    pub fn command_path(&self) -> &[String] {
        &self.path
    }

    /// Constructor options and method parameters, converted.
    pub fn args(&self) -> &BoundArgs {
        &self.args
    }

    /// Tokens that matched nothing, when unexpected arguments are allowed.
    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// The object built by the class constructor, if it is a `T`.
    pub fn target<T: 'static>(&self) -> Option<&T> {
        self.target.as_ref().and_then(|t| t.downcast_ref::<T>())
    }

    pub fn target_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.target.as_mut().and_then(|t| t.downcast_mut::<T>())
    }

    pub fn take_target<T: 'static>(&mut self) -> Option<T> {
        match self.target.take()?.downcast::<T>() {
            Ok(t) => Some(*t),
            Err(other) => {
                self.target = Some(other);
                None
            }
        }
    }
}

/// Converted values of one command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    /// Constructor options only; what the class factory receives.
    pub constructor: BoundArgs,
    /// Every argument of the command.
    pub all: BoundArgs,
}

fn convert(
    arg: &ArgumentInfo,
    raw: &str,
    types: &TypeRegistry,
    errors: &mut Vec<ArgumentError>,
) -> Option<Value> {
    let allowed = arg.allowed_values();
    if !allowed.is_empty() && !allowed.iter().any(|v| v == raw) {
        errors.push(ArgumentError::NotAllowed {
            argument: arg.display_name().to_string(),
            value: raw.to_string(),
            allowed: allowed.join(", "),
        });
        return None;
    }
    match types.convert(arg.value_type(), raw) {
        Some(Ok(value)) => Some(value),
        _ => {
            errors.push(ArgumentError::ValueConversion {
                argument: arg.display_name().to_string(),
                value: raw.to_string(),
                type_name: arg.value_type().to_string(),
            });
            None
        }
    }
}

fn bind_one(
    arg: &ArgumentInfo,
    raw: Option<&[String]>,
    types: &TypeRegistry,
    errors: &mut Vec<ArgumentError>,
) -> Option<Value> {
    if arg.is_flag() {
        return match raw {
            Some([]) => Some(Value::Bool(true)),
            Some([.., last]) => convert(arg, last, types, errors),
            None => match arg.default_value() {
                Some(d) => convert(arg, d, types, errors),
                None => Some(Value::Bool(false)),
            },
        };
    }

    match (arg.arity(), raw) {
        (Arity::Single, Some([.., last])) => convert(arg, last, types, errors),
        (Arity::List, Some(items)) if !items.is_empty() => {
            let before = errors.len();
            let values: Vec<Value> = items
                .iter()
                .filter_map(|item| convert(arg, item, types, errors))
                .collect();
            (errors.len() == before).then_some(Value::List(values))
        }
        (arity, _) => match (arity, arg.default_value()) {
            (Arity::Single, Some(d)) => convert(arg, d, types, errors),
            (Arity::List, Some(d)) => convert(arg, d, types, errors).map(|v| Value::List(vec![v])),
            (Arity::List, None) => Some(Value::List(Vec::new())),
            (Arity::Single, None) => None,
        },
    }
}

/// Convert the collected strings of `command` into typed values.
///
/// Conversion and allowed-value errors are collected for every argument
/// before returning.
pub fn bind(
    command: &CommandDescriptor,
    values: &ArgumentValues,
    types: &TypeRegistry,
) -> Result<Bindings, Vec<ArgumentError>> {
    let mut errors = Vec::new();
    let mut bindings = Bindings::default();

    for (index, arg) in command.arguments().iter().enumerate() {
        let Some(value) = bind_one(arg, values.values(index), types, &mut errors) else {
            continue;
        };
        if arg.source() == ParamSource::Constructor {
            bindings.constructor.insert(arg.name(), value.clone());
        }
        bindings.all.insert(arg.name(), value);
    }

    if errors.is_empty() {
        Ok(bindings)
    } else {
        Err(errors)
    }
}

/// Build the owning object, then run `handler` to completion.
pub(crate) async fn invoke(
    tree: &CommandTree,
    command: &CommandDescriptor,
    handler: &Handler,
    bindings: Bindings,
    remaining: Vec<String>,
    console: &Console,
) -> anyhow::Result<i32> {
    let target = match &command.factory {
        Some(factory) => Some(factory.call(&bindings.constructor)?),
        None => None,
    };
    let path: Vec<String> = tree
        .path(command.id())
        .into_iter()
        .map(String::from)
        .collect();
    debug!(
        command = %path.join(" "),
        arguments = bindings.all.len(),
        remaining = remaining.len(),
        "invoking handler"
    );
    let invocation = Invocation {
        path,
        args: bindings.all,
        remaining,
        target,
        console: console.clone(),
    };
    handler.call(invocation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{ClassDecl, MethodDecl, ParamDecl};
    use crate::settings::AppSettings;
    use crate::types;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn tree() -> CommandTree {
        CommandTree::build(
            ClassDecl::new("app")
                .constructor_param(ParamDecl::new("verbose").flag())
                .method(
                    MethodDecl::new("run")
                        .param(ParamDecl::new("count").value_type(types::INT).default_value("1"))
                        .param(ParamDecl::new("format").allowed_values(["json", "text"]))
                        .param(ParamDecl::new("ids").value_type(types::UINT).list())
                        .param(ParamDecl::new("tags").list())
                        .param(ParamDecl::new("file").positional())
                        .handler(|_inv: Invocation| ()),
                ),
            AppSettings::default(),
            &TypeRegistry::default(),
        )
        .unwrap()
    }

    fn bind_tokens(tree: &CommandTree, argv: &str) -> Result<Bindings, Vec<ArgumentError>> {
        let parsed = tree.parse(&tokens(argv));
        assert!(parsed.arguments.errors.is_empty(), "{:?}", parsed.arguments.errors);
        bind(
            tree.get(parsed.command),
            &parsed.arguments.values,
            &TypeRegistry::default(),
        )
    }

    #[test]
    fn absent_arguments_take_defaults() {
        let tree = tree();
        let b = bind_tokens(&tree, "run").unwrap();
        assert_eq!(b.all.get::<bool>("verbose"), Some(false));
        assert_eq!(b.all.get::<i64>("count"), Some(1));
        assert_eq!(b.all.get::<Vec<u64>>("ids"), Some(vec![]));
        assert!(!b.all.contains("format"));
        assert!(!b.all.contains("file"));
        assert_eq!(b.constructor.len(), 1);
    }

    #[test]
    fn values_are_converted() {
        let tree = tree();
        let b = bind_tokens(&tree, "run --verbose --count 5 --ids 1 2 3 --format json f.txt").unwrap();
        assert_eq!(b.all.get::<bool>("verbose"), Some(true));
        assert_eq!(b.constructor.get::<bool>("verbose"), Some(true));
        assert_eq!(b.all.get::<i32>("count"), Some(5));
        assert_eq!(b.all.get::<Vec<u64>>("ids"), Some(vec![1, 2, 3]));
        assert_eq!(b.all.get::<String>("format").as_deref(), Some("json"));
        assert_eq!(b.all.get::<String>("file").as_deref(), Some("f.txt"));
    }

    #[test]
    fn flag_accepts_an_inline_bool() {
        let tree = tree();
        let b = bind_tokens(&tree, "run --verbose=false").unwrap();
        assert_eq!(b.all.get::<bool>("verbose"), Some(false));
    }

    #[test]
    fn conversion_errors_are_collected_for_all_arguments() {
        let tree = tree();
        let errors = bind_tokens(&tree, "run --count ten --ids 1 x --format xml").unwrap_err();
        assert_eq!(
            errors,
            vec![
                ArgumentError::ValueConversion {
                    argument: "--count".to_string(),
                    value: "ten".to_string(),
                    type_name: "int".to_string(),
                },
                ArgumentError::NotAllowed {
                    argument: "--format".to_string(),
                    value: "xml".to_string(),
                    allowed: "json, text".to_string(),
                },
                ArgumentError::ValueConversion {
                    argument: "--ids".to_string(),
                    value: "x".to_string(),
                    type_name: "uint".to_string(),
                },
            ]
        );
    }

    #[test]
    fn take_target_keeps_mismatched_types() {
        let (console, _capture) = Console::capture("");
        let mut inv = Invocation {
            path: vec!["run".to_string()],
            args: BoundArgs::default(),
            remaining: Vec::new(),
            target: Some(Box::new(42u32)),
            console,
        };
        assert!(inv.take_target::<String>().is_none());
        assert_eq!(inv.target::<u32>(), Some(&42));
        *inv.target_mut::<u32>().unwrap() += 1;
        assert_eq!(inv.take_target::<u32>(), Some(43));
        assert!(inv.target::<u32>().is_none());
    }
}

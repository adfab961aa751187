//! Command declarations.
//!
//! A [`ClassDecl`] groups commands the way a class groups methods: its
//! constructor parameters are options shared by all of its methods, each
//! [`MethodDecl`] is a leaf command, and nested classes are sub-commands.
//!
//! ```rust,ignore
//! let app = ClassDecl::new("app")
//!     .method(
//!         MethodDecl::new("greet")
//!             .param(ParamDecl::new("name").positional().required())
//!             .param(ParamDecl::new("loud").short('l').flag())
//!             .handler(|inv: Invocation| {
//!                 let name: String = inv.args().require("name")?;
//!                 inv.console().outln(&format!("hello {name}"));
//!                 anyhow::Ok(())
//!             }),
//!     );
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::invoke::Invocation;
use crate::types::{self, BoundArgs};

/// Single value vs. ordered list of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    #[default]
    Single,
    List,
}

/// A declared constructor or method parameter.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub(crate) name: String,
    pub(crate) positional: bool,
    pub(crate) short: Option<char>,
    pub(crate) long: Option<String>,
    pub(crate) value_type: String,
    pub(crate) required: bool,
    pub(crate) default_value: Option<String>,
    pub(crate) allowed_values: Vec<String>,
    pub(crate) arity: Arity,
    pub(crate) description: String,
    pub(crate) show_in_help: bool,
}

impl ParamDecl {
    /// A string-typed option addressed as `--<name>`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positional: false,
            short: None,
            long: None,
            value_type: types::STRING.to_string(),
            required: false,
            default_value: None,
            allowed_values: Vec::new(),
            arity: Arity::Single,
            description: String::new(),
            show_in_help: true,
        }
    }

    /// Mark as an operand (matched by position).
    pub fn positional(mut self) -> Self {
        self.positional = true;
        self
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    /// Override the long alias (defaults to the parameter name).
    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.long = Some(name.into());
        self
    }

    pub fn value_type(mut self, tag: impl Into<String>) -> Self {
        self.value_type = tag.into();
        self
    }

    /// A boolean option that takes no value.
    pub fn flag(self) -> Self {
        self.value_type(types::BOOL)
    }

    pub fn list(mut self) -> Self {
        self.arity = Arity::List;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Keep the parameter out of help output; it stays usable.
    pub fn hidden(mut self) -> Self {
        self.show_in_help = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }
}

/// What a handler may return.
///
/// `()` is exit code 0, an `i32` is passed through, and an `Err` of a
/// `Result` is a handler failure.
pub trait HandlerOutcome {
    fn into_exit_code(self) -> anyhow::Result<i32>;
}

impl HandlerOutcome for () {
    fn into_exit_code(self) -> anyhow::Result<i32> {
        Ok(0)
    }
}

impl HandlerOutcome for i32 {
    fn into_exit_code(self) -> anyhow::Result<i32> {
        Ok(self)
    }
}

impl<T, E> HandlerOutcome for Result<T, E>
where
    T: HandlerOutcome,
    E: Into<anyhow::Error>,
{
    fn into_exit_code(self) -> anyhow::Result<i32> {
        match self {
            Ok(value) => value.into_exit_code(),
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send>>;

/// A stored command handler, invoked uniformly regardless of its arity.
#[derive(Clone)]
pub(crate) struct Handler(Arc<dyn Fn(Invocation) -> HandlerFuture + Send + Sync>);

impl Handler {
    fn from_sync<F, R>(f: F) -> Self
    where
        F: Fn(Invocation) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        Self(Arc::new(move |inv: Invocation| -> HandlerFuture {
            let outcome = f(inv).into_exit_code();
            Box::pin(std::future::ready(outcome))
        }))
    }

    fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutcome,
    {
        Self(Arc::new(move |inv: Invocation| -> HandlerFuture {
            let fut = f(inv);
            Box::pin(async move { fut.await.into_exit_code() })
        }))
    }

    pub(crate) fn call(&self, inv: Invocation) -> HandlerFuture {
        (self.0)(inv)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

pub(crate) type Target = Box<dyn Any + Send>;

/// Builds the object owning a class's methods from its constructor options.
#[derive(Clone)]
pub(crate) struct Factory(Arc<dyn Fn(&BoundArgs) -> anyhow::Result<Target> + Send + Sync>);

impl Factory {
    pub(crate) fn call(&self, args: &BoundArgs) -> anyhow::Result<Target> {
        (self.0)(args)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Factory")
    }
}

/// Help-facing metadata shared by classes and methods.
#[derive(Debug, Clone)]
pub(crate) struct CommandText {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) extended_help: String,
    pub(crate) syntax: Option<String>,
    pub(crate) show_in_help: bool,
}

impl CommandText {
    fn new(name: String) -> Self {
        Self {
            name,
            description: String::new(),
            extended_help: String::new(),
            syntax: None,
            show_in_help: true,
        }
    }
}

/// A leaf command.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub(crate) text: CommandText,
    pub(crate) params: Vec<ParamDecl>,
    pub(crate) handler: Option<Handler>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            text: CommandText::new(name.into()),
            params: Vec::new(),
            handler: None,
        }
    }

    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ParamDecl>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.text.description = text.into();
        self
    }

    pub fn extended_help(mut self, text: impl Into<String>) -> Self {
        self.text.extended_help = text.into();
        self
    }

    /// Replace the generated usage line.
    pub fn syntax(mut self, text: impl Into<String>) -> Self {
        self.text.syntax = Some(text.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.text.show_in_help = false;
        self
    }

    pub fn handler<F, R>(mut self, f: F) -> Self
    where
        F: Fn(Invocation) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        self.handler = Some(Handler::from_sync(f));
        self
    }

    pub fn async_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutcome,
    {
        self.handler = Some(Handler::from_async(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.text.name
    }
}

/// A command container: constructor options, methods, a default method and
/// nested sub-command classes.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub(crate) text: CommandText,
    pub(crate) ctor_params: Vec<ParamDecl>,
    pub(crate) factory: Option<Factory>,
    pub(crate) methods: Vec<MethodDecl>,
    pub(crate) default_method: Option<MethodDecl>,
    pub(crate) subcommands: Vec<ClassDecl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            text: CommandText::new(name.into()),
            ctor_params: Vec::new(),
            factory: None,
            methods: Vec::new(),
            default_method: None,
            subcommands: Vec::new(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.text.description = text.into();
        self
    }

    pub fn extended_help(mut self, text: impl Into<String>) -> Self {
        self.text.extended_help = text.into();
        self
    }

    pub fn syntax(mut self, text: impl Into<String>) -> Self {
        self.text.syntax = Some(text.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.text.show_in_help = false;
        self
    }

    /// A constructor parameter. These must be options.
    pub fn constructor_param(mut self, param: ParamDecl) -> Self {
        self.ctor_params.push(param);
        self
    }

    /// Build the owning object of this class's methods from its constructor
    /// options. Handlers reach it through [`Invocation::target`].
    pub fn constructor<T, F>(mut self, f: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&BoundArgs) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.factory = Some(Factory(Arc::new(
            move |args: &BoundArgs| -> anyhow::Result<Target> { Ok(Box::new(f(args)?)) },
        )));
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Invoked when no sub-command is named. Must be parameterless.
    pub fn default_method(mut self, method: MethodDecl) -> Self {
        self.default_method = Some(method);
        self
    }

    pub fn subcommand(mut self, class: ClassDecl) -> Self {
        self.subcommands.push(class);
        self
    }

    pub fn name(&self) -> &str {
        &self.text.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_outcomes_map_to_exit_codes() {
        assert_eq!(().into_exit_code().unwrap(), 0);
        assert_eq!(7i32.into_exit_code().unwrap(), 7);
        assert_eq!(Ok::<i32, std::io::Error>(3).into_exit_code().unwrap(), 3);
        let failed: Result<(), anyhow::Error> = Err(anyhow::anyhow!("boom"));
        assert_eq!(failed.into_exit_code().unwrap_err().to_string(), "boom");
    }

    #[test]
    fn param_defaults_to_single_string_option() {
        let p = ParamDecl::new("name");
        assert!(!p.is_positional());
        assert_eq!(p.value_type, types::STRING);
        assert_eq!(p.arity, Arity::Single);
        assert!(p.show_in_help);
    }
}

//! Declarative command trees for command-line applications.
//!
//! Commands are declared as values ([`ClassDecl`], [`MethodDecl`],
//! [`ParamDecl`]) and built into an immutable [`CommandTree`]. An
//! [`AppRunner`] resolves the leading tokens to a command, parses the rest
//! into options and operands, binds them to typed values and invokes the
//! command's handler, producing a process exit code.
//!
//! ```rust,ignore
//! use cmdtree::{AppRunner, AppSettings, ClassDecl, Invocation, MethodDecl, ParamDecl};
//!
//! let app = ClassDecl::new("calc").method(
//!     MethodDecl::new("add")
//!         .param(ParamDecl::new("x").positional().value_type(cmdtree::types::INT))
//!         .param(ParamDecl::new("y").positional().value_type(cmdtree::types::INT))
//!         .handler(|inv: Invocation| {
//!             let (x, y): (i64, i64) = (inv.args().require("x")?, inv.args().require("y")?);
//!             inv.console().outln(&(x + y).to_string());
//!             anyhow::Ok(())
//!         }),
//! );
//! let code = AppRunner::new(app, AppSettings::default())?.run(std::env::args().skip(1));
//! std::process::exit(code);
//! ```

pub mod classify;
pub mod console;
pub mod declare;
pub mod error;
pub mod help;
pub mod invoke;
pub mod parse;
pub mod pipeline;
pub mod settings;
pub mod tree;
pub mod types;

pub use classify::{ArgumentInfo, ArgumentKind, ParamSource};
pub use console::{Capture, Console};
pub use declare::{Arity, ClassDecl, HandlerOutcome, MethodDecl, ParamDecl};
pub use error::{ArgumentError, ArgumentErrors, ConfigurationError};
pub use invoke::{Bindings, Invocation};
pub use parse::{ArgumentValues, ParseResult, ParsedArguments};
pub use pipeline::{AppRunner, RunOutput, run};
pub use settings::{AppSettings, HelpVerbosity};
pub use tree::{CommandDescriptor, CommandId, CommandTree};
pub use types::{BoundArgs, FromValue, TypeRegistry, Value};

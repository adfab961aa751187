//! The execution pipeline: a fixed chain of behaviors between parsing and
//! the handler call.

use tracing::debug;

use crate::console::{Capture, Console};
use crate::declare::ClassDecl;
use crate::error::{ArgumentErrors, ConfigurationError};
use crate::help;
use crate::invoke::{self, Bindings};
use crate::parse::ParsedArguments;
use crate::settings::AppSettings;
use crate::tree::{CommandId, CommandTree};
use crate::types::TypeRegistry;

/// State shared by the behaviors of one run.
pub(crate) struct Execution<'a> {
    tree: &'a CommandTree,
    types: &'a TypeRegistry,
    console: &'a Console,
    command: CommandId,
    parsed: ParsedArguments,
    bindings: Option<Bindings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Default,
    Handler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit(i32),
    Dispatch(Dispatch),
}

/// One link of the pipeline. The first behavior not returning
/// [`Flow::Continue`] decides the outcome.
pub(crate) trait Behavior: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, exec: &mut Execution<'_>) -> Flow;
}

fn render_help(exec: &Execution<'_>) {
    let verbosity = exec.tree.settings().default_help_verbosity;
    exec.console.out(&help::render(exec.tree, exec.command, verbosity));
}

struct Help;

impl Behavior for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn apply(&self, exec: &mut Execution<'_>) -> Flow {
        if !exec.parsed.help_requested {
            return Flow::Continue;
        }
        render_help(exec);
        Flow::Exit(0)
    }
}

struct Version;

impl Behavior for Version {
    fn name(&self) -> &'static str {
        "version"
    }

    fn apply(&self, exec: &mut Execution<'_>) -> Flow {
        if !exec.parsed.version_requested {
            return Flow::Continue;
        }
        let mut text = format!("{}\n", exec.tree.app_name());
        if let Some(version) = &exec.tree.settings().version {
            text.push_str(version);
            text.push('\n');
        }
        exec.console.out(&text);
        Flow::Exit(0)
    }
}

/// Reports parse errors and binding errors together.
struct Validation;

impl Behavior for Validation {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn apply(&self, exec: &mut Execution<'_>) -> Flow {
        let mut errors = ArgumentErrors::from(std::mem::take(&mut exec.parsed.errors));
        let command = exec.tree.get(exec.command);
        match invoke::bind(command, &exec.parsed.values, exec.types) {
            Ok(bindings) => exec.bindings = Some(bindings),
            Err(bind_errors) => errors.extend(bind_errors),
        }
        if errors.is_empty() {
            return Flow::Continue;
        }
        debug!(errors = errors.len(), "argument validation failed");
        exec.console.errln(&errors.to_string());
        Flow::Exit(1)
    }
}

struct DefaultCommand;

impl Behavior for DefaultCommand {
    fn name(&self) -> &'static str {
        "default-command"
    }

    fn apply(&self, exec: &mut Execution<'_>) -> Flow {
        let command = exec.tree.get(exec.command);
        if !command.has_handler() && command.has_default_handler() {
            Flow::Dispatch(Dispatch::Default)
        } else {
            Flow::Continue
        }
    }
}

/// Last link: dispatch to the handler, or show help when there is none.
struct Invoke;

impl Behavior for Invoke {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn apply(&self, exec: &mut Execution<'_>) -> Flow {
        if exec.tree.get(exec.command).has_handler() {
            Flow::Dispatch(Dispatch::Handler)
        } else {
            render_help(exec);
            Flow::Exit(0)
        }
    }
}

/// Text captured by [`AppRunner::run_in_mem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    pub out: String,
    pub err: String,
    /// Output and error text interleaved in write order.
    pub all: String,
}

/// A built command tree plus the pipeline that runs token sequences against
/// it. Reusable for any number of runs.
pub struct AppRunner {
    tree: CommandTree,
    types: TypeRegistry,
    behaviors: Vec<Box<dyn Behavior>>,
}

impl std::fmt::Debug for AppRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.behaviors.iter().map(|b| b.name()).collect();
        f.debug_struct("AppRunner")
            .field("tree", &self.tree)
            .field("types", &self.types)
            .field("behaviors", &names)
            .finish()
    }
}

impl AppRunner {
    pub fn new(root: ClassDecl, settings: AppSettings) -> Result<Self, ConfigurationError> {
        Self::with_types(root, settings, TypeRegistry::default())
    }

    /// Like [`AppRunner::new`] with additional conversions registered.
    pub fn with_types(
        root: ClassDecl,
        settings: AppSettings,
        types: TypeRegistry,
    ) -> Result<Self, ConfigurationError> {
        let tree = CommandTree::build(root, settings, &types)?;
        Ok(Self {
            tree,
            types,
            behaviors: vec![
                Box::new(Help),
                Box::new(Version),
                Box::new(Validation),
                Box::new(DefaultCommand),
                Box::new(Invoke),
            ],
        })
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Help text of the command at `path` below the root.
    pub fn help(&self, path: &[&str]) -> Option<String> {
        let id = self.tree.find(path)?;
        Some(help::render(
            &self.tree,
            id,
            self.tree.settings().default_help_verbosity,
        ))
    }

    /// Run against the process's standard streams.
    pub fn run<I, S>(&self, tokens: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with_console(tokens, &Console::stdio())
    }

    /// Run on a current-thread runtime created for this call.
    ///
    /// Must not be called from inside a tokio runtime; use
    /// [`AppRunner::run_async`] there.
    pub fn run_with_console<I, S>(&self, tokens: I, console: &Console) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(self.execute(&tokens, console)),
            Err(err) => {
                console.errln(&format!("failed to start async runtime: {err}"));
                1
            }
        }
    }

    pub async fn run_async<I, S>(&self, tokens: I, console: &Console) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        self.execute(&tokens, console).await
    }

    /// Run with captured output and `input` as the handlers' input channel.
    pub fn run_in_mem<I, S>(&self, tokens: I, input: &str) -> RunOutput
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (console, capture) = Console::capture(input);
        let exit_code = self.run_with_console(tokens, &console);
        output(exit_code, &capture)
    }

    async fn execute(&self, tokens: &[String], console: &Console) -> i32 {
        let parsed = self.tree.parse(tokens);
        let mut exec = Execution {
            tree: &self.tree,
            types: &self.types,
            console,
            command: parsed.command,
            parsed: parsed.arguments,
            bindings: None,
        };

        let mut dispatch = None;
        for behavior in &self.behaviors {
            match behavior.apply(&mut exec) {
                Flow::Continue => {}
                Flow::Exit(code) => {
                    debug!(behavior = behavior.name(), code, "pipeline finished early");
                    return code;
                }
                Flow::Dispatch(d) => {
                    dispatch = Some(d);
                    break;
                }
            }
        }

        let command = self.tree.get(exec.command);
        let handler = match dispatch {
            Some(Dispatch::Handler) => command.handler.as_ref(),
            Some(Dispatch::Default) => command.default_handler.as_ref(),
            None => None,
        };
        let Some(handler) = handler else {
            render_help(&exec);
            return 0;
        };

        let bindings = exec.bindings.take().unwrap_or_default();
        let remaining = std::mem::take(&mut exec.parsed.remaining);
        match invoke::invoke(&self.tree, command, handler, bindings, remaining, console).await {
            Ok(code) => {
                debug!(code, "handler finished");
                code
            }
            Err(err) => {
                debug!(error = %err, "handler failed");
                console.errln(&format!("{err:#}"));
                1
            }
        }
    }
}

fn output(exit_code: i32, capture: &Capture) -> RunOutput {
    RunOutput {
        exit_code,
        out: capture.out(),
        err: capture.err(),
        all: capture.all(),
    }
}

/// Build the tree for `root` and run `tokens` once against standard streams.
pub fn run<I, S>(
    root: ClassDecl,
    settings: AppSettings,
    tokens: I,
) -> Result<i32, ConfigurationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Ok(AppRunner::new(root, settings)?.run(tokens))
}

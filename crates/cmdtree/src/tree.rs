//! The command tree: descriptors built from declarations, and resolution of
//! leading name tokens to a command.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::classify::{self, ArgumentInfo, HELP_ALIASES, ParamSource, VERSION_ALIASES};
use crate::declare::{Arity, ClassDecl, CommandText, Factory, Handler, MethodDecl};
use crate::error::ConfigurationError;
use crate::settings::AppSettings;
use crate::types::TypeRegistry;

/// Index of a command in its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

impl CommandId {
    pub const ROOT: CommandId = CommandId(0);
}

/// One node of the tree: a class (container) or a method (leaf).
#[derive(Debug)]
pub struct CommandDescriptor {
    id: CommandId,
    parent: Option<CommandId>,
    text: CommandText,
    arguments: Vec<ArgumentInfo>,
    children: Vec<CommandId>,
    pub(crate) handler: Option<Handler>,
    pub(crate) default_handler: Option<Handler>,
    pub(crate) factory: Option<Factory>,
}

impl CommandDescriptor {
    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn name(&self) -> &str {
        &self.text.name
    }

    pub fn description(&self) -> &str {
        &self.text.description
    }

    pub fn extended_help(&self) -> &str {
        &self.text.extended_help
    }

    pub fn syntax(&self) -> Option<&str> {
        self.text.syntax.as_deref()
    }

    pub fn show_in_help(&self) -> bool {
        self.text.show_in_help
    }

    /// Options and operands; indices into this slice identify arguments.
    pub fn arguments(&self) -> &[ArgumentInfo] {
        &self.arguments
    }

    pub fn argument(&self, index: usize) -> Option<&ArgumentInfo> {
        self.arguments.get(index)
    }

    /// Operands in declaration order, with their argument index.
    pub fn operands(&self) -> impl Iterator<Item = (usize, &ArgumentInfo)> {
        self.arguments.iter().enumerate().filter(|(_, a)| a.is_operand())
    }

    pub fn options(&self) -> impl Iterator<Item = (usize, &ArgumentInfo)> {
        self.arguments.iter().enumerate().filter(|(_, a)| a.is_option())
    }

    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn has_default_handler(&self) -> bool {
        self.default_handler.is_some()
    }
}

/// Immutable graph of command descriptors rooted at the application.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandDescriptor>,
    settings: AppSettings,
}

impl CommandTree {
    /// Build the tree for `root`. Any malformed declaration aborts the build.
    pub fn build(
        root: ClassDecl,
        settings: AppSettings,
        types: &TypeRegistry,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = TreeBuilder {
            nodes: Vec::new(),
            types,
            reserve_version: settings.show_version_option,
        };
        builder.add_class(root, None)?;
        debug!(commands = builder.nodes.len(), "built command tree");
        Ok(Self {
            nodes: builder.nodes,
            settings,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Name shown in usage lines and version output.
    pub fn app_name(&self) -> &str {
        self.settings
            .app_name
            .as_deref()
            .unwrap_or_else(|| self.root().name())
    }

    pub fn root(&self) -> &CommandDescriptor {
        &self.nodes[CommandId::ROOT.0]
    }

    pub fn get(&self, id: CommandId) -> &CommandDescriptor {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Descriptors in build order (parents before their children).
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.nodes.iter()
    }

    pub fn child(&self, id: CommandId, name: &str) -> Option<CommandId> {
        self.get(id)
            .children
            .iter()
            .copied()
            .find(|c| self.get(*c).name() == name)
    }

    /// Command names from below the root down to `id`.
    pub fn path(&self, id: CommandId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.get(c);
            if node.parent.is_some() {
                names.push(node.name());
            }
            current = node.parent;
        }
        names.reverse();
        names
    }

    pub fn find(&self, path: &[&str]) -> Option<CommandId> {
        path.iter()
            .try_fold(CommandId::ROOT, |id, name| self.child(id, name))
    }

    /// Descend from the root while the next token names a child command.
    ///
    /// Returns the resolved command and the tokens left for its arguments.
    pub fn resolve<'t>(&self, tokens: &'t [String]) -> (CommandId, &'t [String]) {
        let mut current = CommandId::ROOT;
        let mut consumed = 0;
        while let Some(token) = tokens.get(consumed) {
            match self.child(current, token) {
                Some(child) => {
                    current = child;
                    consumed += 1;
                }
                None => break,
            }
        }
        debug!(
            command = %self.path(current).join(" "),
            consumed,
            "resolved command"
        );
        (current, &tokens[consumed..])
    }
}

struct TreeBuilder<'a> {
    nodes: Vec<CommandDescriptor>,
    types: &'a TypeRegistry,
    reserve_version: bool,
}

impl TreeBuilder<'_> {
    fn next_id(&self) -> CommandId {
        CommandId(self.nodes.len())
    }

    fn add_class(
        &mut self,
        class: ClassDecl,
        parent: Option<CommandId>,
    ) -> Result<CommandId, ConfigurationError> {
        let ClassDecl {
            text,
            ctor_params,
            factory,
            methods,
            default_method,
            subcommands,
        } = class;

        if parent.is_some() && text.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName { what: "command" });
        }

        let id = self.next_id();
        let ctor_args = ctor_params
            .iter()
            .map(|p| classify::classify(&text.name, id, p, ParamSource::Constructor, self.types))
            .collect::<Result<Vec<_>, _>>()?;
        validate_arguments(
            &text.name,
            &ctor_args,
            parent.is_none() && self.reserve_version,
        )?;

        let default_handler = match default_method {
            Some(method) => {
                if !method.params.is_empty() {
                    return Err(ConfigurationError::ParameterizedDefault {
                        command: text.name.clone(),
                        method: method.text.name.clone(),
                    });
                }
                if let Some(arg) = ctor_args.iter().find(|a| a.is_required()) {
                    return Err(ConfigurationError::RequiredArgumentWithDefault {
                        command: text.name.clone(),
                        argument: arg.name().to_string(),
                    });
                }
                let handler = method.handler.ok_or_else(|| ConfigurationError::MissingHandler {
                    command: method.text.name.clone(),
                })?;
                Some(handler)
            }
            None => None,
        };

        let name = text.name.clone();
        self.nodes.push(CommandDescriptor {
            id,
            parent,
            text,
            arguments: ctor_args.clone(),
            children: Vec::new(),
            handler: None,
            default_handler,
            factory: factory.clone(),
        });

        let mut seen: HashSet<String> = HashSet::new();
        let mut children = Vec::with_capacity(methods.len() + subcommands.len());
        for method in methods {
            check_unique_child(&mut seen, &name, &method.text.name)?;
            children.push(self.add_method(method, id, &ctor_args, factory.clone())?);
        }
        for sub in subcommands {
            check_unique_child(&mut seen, &name, &sub.text.name)?;
            children.push(self.add_class(sub, Some(id))?);
        }
        self.nodes[id.0].children = children;

        Ok(id)
    }

    fn add_method(
        &mut self,
        method: MethodDecl,
        parent: CommandId,
        ctor_args: &[ArgumentInfo],
        factory: Option<Factory>,
    ) -> Result<CommandId, ConfigurationError> {
        let MethodDecl {
            text,
            params,
            handler,
        } = method;

        if text.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName { what: "command" });
        }
        let handler = handler.ok_or_else(|| ConfigurationError::MissingHandler {
            command: text.name.clone(),
        })?;

        let id = self.next_id();
        let mut arguments: Vec<ArgumentInfo> = ctor_args
            .iter()
            .cloned()
            .map(|mut a| {
                a.owner = id;
                a
            })
            .collect();
        for param in &params {
            arguments.push(classify::classify(
                &text.name,
                id,
                param,
                ParamSource::Method,
                self.types,
            )?);
        }
        validate_arguments(&text.name, &arguments, false)?;

        self.nodes.push(CommandDescriptor {
            id,
            parent: Some(parent),
            text,
            arguments,
            children: Vec::new(),
            handler: Some(handler),
            default_handler: None,
            factory,
        });
        Ok(id)
    }
}

fn check_unique_child(
    seen: &mut HashSet<String>,
    parent: &str,
    name: &str,
) -> Result<(), ConfigurationError> {
    if !seen.insert(name.to_string()) {
        return Err(ConfigurationError::DuplicateCommand {
            parent: parent.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

fn validate_arguments(
    command: &str,
    arguments: &[ArgumentInfo],
    reserve_version: bool,
) -> Result<(), ConfigurationError> {
    let mut names: HashSet<&str> = HashSet::new();
    for arg in arguments {
        if !names.insert(arg.name()) {
            return Err(ConfigurationError::DuplicateArgument {
                command: command.to_string(),
                argument: arg.name().to_string(),
            });
        }
    }

    let mut aliases: HashMap<&str, &str> = HashMap::new();
    for arg in arguments.iter().filter(|a| a.is_option()) {
        for alias in arg.aliases() {
            let reserved_for = if HELP_ALIASES.contains(&alias.as_str()) {
                Some("help")
            } else if reserve_version && VERSION_ALIASES.contains(&alias.as_str()) {
                Some("version")
            } else {
                None
            };
            if let Some(reserved_for) = reserved_for {
                return Err(ConfigurationError::ReservedAlias {
                    command: command.to_string(),
                    alias: alias.clone(),
                    argument: arg.name().to_string(),
                    reserved_for,
                });
            }
            if let Some(first) = aliases.insert(alias.as_str(), arg.name()) {
                return Err(ConfigurationError::DuplicateAlias {
                    command: command.to_string(),
                    alias: alias.clone(),
                    first: first.to_string(),
                    second: arg.name().to_string(),
                });
            }
        }
    }

    let operands: Vec<&ArgumentInfo> = arguments.iter().filter(|a| a.is_operand()).collect();
    if let Some((_, init)) = operands.split_last() {
        if let Some(list) = init.iter().find(|a| a.arity() == Arity::List) {
            return Err(ConfigurationError::ListOperandNotLast {
                command: command.to_string(),
                operand: list.name().to_string(),
            });
        }
    }

    Ok(())
}

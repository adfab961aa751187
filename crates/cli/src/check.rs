use cmdtree::{AppRunner, ArgumentInfo, Arity, CommandDescriptor, CommandTree};
use serde::Serialize;
use std::path::Path;

use crate::declare::class_decl;
use crate::manifest::Manifest;

#[derive(Debug, Serialize)]
pub struct CommandEntry {
    pub path: String,
    /// `group` for classes, `command` for leaf commands.
    pub kind: &'static str,
    pub usage: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub manifest: String,
    pub app: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub commands: Vec<CommandEntry>,
}

fn argument_usage(arg: &ArgumentInfo) -> String {
    let ellipsis = if arg.arity() == Arity::List { "..." } else { "" };
    let text = if arg.is_operand() {
        format!("<{}>{ellipsis}", arg.name())
    } else if arg.is_flag() {
        arg.display_name().to_string()
    } else {
        format!(
            "{} <{}>{ellipsis}",
            arg.display_name(),
            arg.value_type().to_ascii_uppercase()
        )
    };
    if arg.is_required() {
        text
    } else {
        format!("[{text}]")
    }
}

/// One-line synopsis of a command's arguments.
pub fn command_usage(command: &CommandDescriptor) -> String {
    command
        .arguments()
        .iter()
        .map(argument_usage)
        .collect::<Vec<_>>()
        .join(" ")
}

fn entries(tree: &CommandTree) -> Vec<CommandEntry> {
    tree.iter()
        .filter(|c| !c.is_root())
        .map(|c| CommandEntry {
            path: tree.path(c.id()).join(" "),
            kind: if c.has_handler() { "command" } else { "group" },
            usage: command_usage(c),
            hidden: !c.show_in_help(),
        })
        .collect()
}

/// Build the manifest's command tree and describe the outcome.
pub fn check_manifest(manifest_path: &Path, manifest: &Manifest) -> CheckReport {
    let built = AppRunner::new(class_decl(&manifest.app), manifest.settings.clone());
    let (ok, error, commands) = match &built {
        Ok(runner) => (true, None, entries(runner.tree())),
        Err(err) => (false, Some(err.to_string()), Vec::new()),
    };
    CheckReport {
        manifest: manifest_path.display().to_string(),
        app: manifest.app.name.clone(),
        ok,
        error,
        commands,
    }
}

/// Indented outline of the tree, one command per line.
pub fn render_tree(tree: &CommandTree) -> String {
    fn walk(tree: &CommandTree, command: &CommandDescriptor, depth: usize, out: &mut String) {
        let usage = command_usage(command);
        let mut line = format!("{}{}", "  ".repeat(depth), command.name());
        if !usage.is_empty() {
            line.push_str("  ");
            line.push_str(&usage);
        }
        if !command.show_in_help() {
            line.push_str("  (hidden)");
        }
        out.push_str(&line);
        out.push('\n');
        for child in command.children() {
            walk(tree, tree.get(*child), depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(tree, tree.root(), 0, &mut out);
    out
}

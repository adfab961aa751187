//! Help text rendering.

use crate::classify::ArgumentInfo;
use crate::declare::Arity;
use crate::settings::HelpVerbosity;
use crate::tree::{CommandDescriptor, CommandId, CommandTree};

const VERSION_ALIASES_TEXT: &str = "-v | --version";
const VERSION_DESCRIPTION: &str = "Show version information";

struct Row {
    left: String,
    value_type: String,
    description: String,
    extra: Option<String>,
}

impl Row {
    fn command(name: &str, description: &str) -> Self {
        Self {
            left: name.to_string(),
            value_type: String::new(),
            description: description.trim().to_string(),
            extra: None,
        }
    }

    fn argument(arg: &ArgumentInfo) -> Self {
        let left = if arg.is_option() {
            arg.aliases().join(" | ")
        } else {
            arg.name().to_string()
        };
        let value_type = if arg.is_flag() {
            String::new()
        } else {
            let mut t = format!("<{}>", arg.value_type().to_ascii_uppercase());
            if arg.arity() == Arity::List {
                t.push_str(" (Multiple)");
            }
            if let Some(d) = arg.default_value() {
                t.push_str(&format!(" [{d}]"));
            }
            t
        };
        let extra = (!arg.allowed_values().is_empty())
            .then(|| format!("Allowed values: {}", arg.allowed_values().join(", ")));
        Self {
            left,
            value_type,
            description: arg.description().trim().to_string(),
            extra,
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn push_basic(out: &mut String, rows: &[Row]) {
    let width = rows.iter().map(|r| r.left.len()).max().unwrap_or(0);
    for r in rows {
        push_line(out, &format!("  {:width$}  {}", r.left, r.description));
    }
}

fn push_detailed(out: &mut String, rows: &[Row]) {
    let width = rows.iter().map(|r| r.left.len()).max().unwrap_or(0);
    for (i, r) in rows.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        push_line(out, &format!("  {:width$}  {}", r.left, r.value_type));
        if !r.description.is_empty() {
            push_line(out, &format!("  {}", r.description));
        }
        if let Some(extra) = &r.extra {
            push_line(out, &format!("  {extra}"));
        }
    }
}

fn push_section(out: &mut String, label: &str, rows: &[Row], verbosity: HelpVerbosity) {
    if rows.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(label);
    out.push_str(":\n\n");
    match verbosity {
        HelpVerbosity::Basic => push_basic(out, rows),
        HelpVerbosity::Detailed => push_detailed(out, rows),
    }
}

fn command_line(tree: &CommandTree, id: CommandId) -> String {
    let mut line = tree.app_name().to_string();
    for name in tree.path(id) {
        line.push(' ');
        line.push_str(name);
    }
    line
}

fn visible_children<'t>(tree: &'t CommandTree, cmd: &CommandDescriptor) -> Vec<&'t CommandDescriptor> {
    cmd.children()
        .iter()
        .map(|c| tree.get(*c))
        .filter(|c| c.show_in_help())
        .collect()
}

/// Render help for command `id`.
///
/// The help option itself is never listed. The version option is listed on
/// the root command when enabled.
pub fn render(tree: &CommandTree, id: CommandId, verbosity: HelpVerbosity) -> String {
    let cmd = tree.get(id);
    let line = command_line(tree, id);

    let operands: Vec<Row> = cmd
        .operands()
        .filter(|(_, a)| a.show_in_help())
        .map(|(_, a)| Row::argument(a))
        .collect();
    let mut options: Vec<Row> = cmd
        .options()
        .filter(|(_, a)| a.show_in_help())
        .map(|(_, a)| Row::argument(a))
        .collect();
    if cmd.is_root() && tree.settings().show_version_option {
        options.push(Row {
            left: VERSION_ALIASES_TEXT.to_string(),
            value_type: String::new(),
            description: VERSION_DESCRIPTION.to_string(),
            extra: None,
        });
    }
    let commands: Vec<Row> = visible_children(tree, cmd)
        .into_iter()
        .map(|c| Row::command(c.name(), c.description()))
        .collect();

    let mut out = String::new();
    if !cmd.description().trim().is_empty() {
        push_line(&mut out, cmd.description().trim());
        out.push('\n');
    }

    let usage = match cmd.syntax() {
        Some(syntax) => syntax.trim().to_string(),
        None => {
            let mut usage = line.clone();
            if !operands.is_empty() {
                usage.push_str(" [arguments]");
            }
            if !options.is_empty() {
                usage.push_str(" [options]");
            }
            if !commands.is_empty() {
                usage.push_str(" [command]");
            }
            usage
        }
    };
    push_line(&mut out, &format!("Usage: {usage}"));

    push_section(&mut out, "Arguments", &operands, verbosity);
    push_section(&mut out, "Options", &options, verbosity);
    push_section(&mut out, "Commands", &commands, HelpVerbosity::Basic);

    if !commands.is_empty() {
        out.push('\n');
        push_line(
            &mut out,
            &format!("Use \"{line} [command] --help\" for more information about a command."),
        );
    }

    if !cmd.extended_help().trim().is_empty() {
        out.push('\n');
        push_line(&mut out, cmd.extended_help().trim());
    }

    out
}

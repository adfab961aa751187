//! Turns manifest metadata into `cmdtree` declarations.
//!
//! Every leaf command gets an echo handler: it prints the bound arguments as
//! one JSON line and exits with the code configured in the manifest.

use cmdtree::types::Value;
use cmdtree::{ClassDecl, Invocation, MethodDecl, ParamDecl};
use cmdtree_metadata::{CommandMeta, MethodMeta, ParamMeta};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Serialize)]
struct Echo<'a> {
    command: String,
    args: IndexMap<&'a str, &'a Value>,
    #[serde(skip_serializing_if = "no_tokens")]
    remaining: &'a [String],
}

fn no_tokens(tokens: &&[String]) -> bool {
    tokens.is_empty()
}

fn echo(inv: &Invocation) -> anyhow::Result<String> {
    let record = Echo {
        command: inv.command_path().join(" "),
        args: inv.args().iter().collect(),
        remaining: inv.remaining(),
    };
    Ok(serde_json::to_string(&record)?)
}

fn param_decl(meta: &ParamMeta) -> ParamDecl {
    let mut p = ParamDecl::new(&meta.name).description(&meta.help);
    if meta.positional {
        p = p.positional();
    }
    if let Some(c) = meta.short {
        p = p.short(c);
    }
    if let Some(long) = &meta.long {
        p = p.long(long);
    }
    if let Some(tag) = &meta.value_type {
        p = p.value_type(tag);
    }
    if meta.required {
        p = p.required();
    }
    if let Some(d) = &meta.default_value {
        p = p.default_value(d);
    }
    if !meta.allowed_values.is_empty() {
        p = p.allowed_values(meta.allowed_values.iter().cloned());
    }
    if meta.multiple {
        p = p.list();
    }
    if meta.hidden {
        p = p.hidden();
    }
    p
}

fn method_decl(meta: &MethodMeta) -> MethodDecl {
    let exit_code = meta.exit_code;
    let mut m = MethodDecl::new(&meta.name)
        .description(&meta.description)
        .extended_help(&meta.extended_help)
        .params(meta.params.iter().map(param_decl))
        .handler(move |inv: Invocation| {
            inv.console().outln(&echo(&inv)?);
            anyhow::Ok(exit_code)
        });
    if let Some(syntax) = &meta.syntax {
        m = m.syntax(syntax);
    }
    if meta.hidden {
        m = m.hidden();
    }
    m
}

pub fn class_decl(meta: &CommandMeta) -> ClassDecl {
    let mut class = ClassDecl::new(&meta.name)
        .description(&meta.description)
        .extended_help(&meta.extended_help);
    if let Some(syntax) = &meta.syntax {
        class = class.syntax(syntax);
    }
    if meta.hidden {
        class = class.hidden();
    }
    for option in &meta.options {
        class = class.constructor_param(param_decl(option));
    }
    for method in &meta.commands {
        class = class.method(method_decl(method));
    }
    if let Some(default) = &meta.default_command {
        class = class.default_method(method_decl(default));
    }
    for sub in &meta.subcommands {
        class = class.subcommand(class_decl(sub));
    }
    class
}

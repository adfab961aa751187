//! Token parsing for a resolved command.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::classify::{HELP_ALIASES, VERSION_ALIASES};
use crate::declare::Arity;
use crate::error::ArgumentError;
use crate::settings::AppSettings;
use crate::tree::{CommandDescriptor, CommandId, CommandTree};

/// Raw string values collected per argument of one command.
///
/// Arguments are identified by their index in
/// [`CommandDescriptor::arguments`]. A flag that was present but given no
/// value has an entry with an empty value list.
#[derive(Debug, Clone, Default)]
pub struct ArgumentValues {
    values: IndexMap<usize, Vec<String>>,
    by_alias: HashMap<String, usize>,
}

impl ArgumentValues {
    pub fn new(command: &CommandDescriptor) -> Self {
        let mut by_alias = HashMap::new();
        for (index, arg) in command.arguments().iter().enumerate() {
            for alias in arg.aliases() {
                by_alias.insert(alias.clone(), index);
            }
        }
        Self {
            values: IndexMap::new(),
            by_alias,
        }
    }

    /// The value list of `index`, created empty on first access.
    pub fn get_or_add(&mut self, index: usize) -> &mut Vec<String> {
        self.values.entry(index).or_default()
    }

    pub fn values(&self, index: usize) -> Option<&[String]> {
        self.values.get(&index).map(|v| v.as_slice())
    }

    pub fn values_by_alias(&self, alias: &str) -> Option<&[String]> {
        self.by_alias.get(alias).and_then(|i| self.values(*i))
    }

    pub fn argument_for_alias(&self, alias: &str) -> Option<usize> {
        self.by_alias.get(alias).copied()
    }

    /// Whether `index` was given on the command line.
    pub fn contains(&self, index: usize) -> bool {
        self.values.contains_key(&index)
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.by_alias
            .get(alias)
            .is_some_and(|i| self.values.contains_key(i))
    }

    /// Arguments with collected values, in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.values.iter().map(|(i, v)| (*i, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of parsing the argument tokens of one command.
#[derive(Debug, Clone, Default)]
pub struct ParsedArguments {
    pub values: ArgumentValues,
    /// Unknown options and surplus operands kept when unexpected arguments
    /// are allowed.
    pub remaining: Vec<String>,
    pub errors: Vec<ArgumentError>,
    pub help_requested: bool,
    pub version_requested: bool,
}

/// Resolved command plus its parsed arguments.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub command: CommandId,
    pub arguments: ParsedArguments,
}

impl CommandTree {
    /// Resolve the command named by the leading tokens and parse the rest.
    pub fn parse(&self, tokens: &[String]) -> ParseResult {
        let (command, rest) = self.resolve(tokens);
        let descriptor = self.get(command);
        let version_enabled = descriptor.is_root() && self.settings().show_version_option;
        let arguments = parse(descriptor, rest, self.settings(), version_enabled);
        ParseResult { command, arguments }
    }
}

/// `-5`, `-1.5` or `-.5`. Words such as `-inf` or `-nan` stay option-like.
fn is_number(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') && token.parse::<f64>().is_ok()
}

/// A token with option syntax: a leading `-`, but not `-` alone and not a
/// negative number.
fn looks_like_option(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !is_number(token)
}

struct Parser<'a> {
    command: &'a CommandDescriptor,
    settings: &'a AppSettings,
    version_enabled: bool,
    operands: Vec<usize>,
    cursor: usize,
    /// Options already reported as given without a value.
    valueless: Vec<usize>,
    out: ParsedArguments,
}

impl<'a> Parser<'a> {
    fn option_index(&self, alias: &str) -> Option<usize> {
        self.out
            .values
            .argument_for_alias(alias)
            .filter(|i| self.command.arguments()[*i].is_option())
    }

    fn is_builtin(&self, token: &str) -> bool {
        HELP_ALIASES.contains(&token) || (self.version_enabled && VERSION_ALIASES.contains(&token))
    }

    fn is_recognized(&self, token: &str) -> bool {
        self.is_builtin(token) || self.option_index(token).is_some()
    }

    fn unexpected(&mut self, token: &str, err: ArgumentError) {
        if self.settings.throw_on_unexpected_argument {
            self.out.errors.push(err);
        } else {
            self.out.remaining.push(token.to_string());
        }
    }

    fn push_operand(&mut self, token: &str) {
        let Some(&index) = self.operands.get(self.cursor) else {
            self.unexpected(token, ArgumentError::UnexpectedArgument(token.to_string()));
            return;
        };
        trace!(token, operand = self.command.arguments()[index].name(), "operand value");
        self.out.values.get_or_add(index).push(token.to_string());
        if self.command.arguments()[index].arity() == Arity::Single {
            self.cursor += 1;
        }
    }

    /// Split `--name=value` when `--name` is a known option alias.
    fn split_inline<'t>(&self, token: &'t str) -> Option<(usize, &'t str, &'t str)> {
        let (alias, value) = token.split_once('=')?;
        self.option_index(alias).map(|i| (i, alias, value))
    }

    /// `-abc` where every letter is a known flag.
    fn short_cluster(&self, token: &str) -> Option<Vec<usize>> {
        let letters = token.strip_prefix('-')?;
        if letters.starts_with('-') || letters.chars().count() < 2 {
            return None;
        }
        letters
            .chars()
            .map(|c| {
                self.option_index(&format!("-{c}"))
                    .filter(|i| self.command.arguments()[*i].is_flag())
            })
            .collect()
    }

    /// Consume the value(s) of option `index` starting at `tokens[*i]`.
    fn take_option(
        &mut self,
        index: usize,
        alias: &str,
        inline: Option<&str>,
        tokens: &[String],
        i: &mut usize,
    ) {
        let command = self.command;
        let arg = &command.arguments()[index];
        trace!(alias, option = arg.name(), "option");

        if arg.is_flag() {
            let values = self.out.values.get_or_add(index);
            if let Some(v) = inline {
                values.push(v.to_string());
            }
            return;
        }

        match arg.arity() {
            Arity::Single => {
                let value = match inline {
                    Some(v) => Some(v.to_string()),
                    None => match tokens.get(*i) {
                        Some(next) if !self.is_recognized(next) && !self.is_separator(next) => {
                            *i += 1;
                            Some(next.clone())
                        }
                        _ => None,
                    },
                };
                let Some(value) = value else {
                    self.missing_value(index, alias);
                    return;
                };
                let values = self.out.values.get_or_add(index);
                if values.is_empty() {
                    values.push(value);
                } else {
                    self.out.errors.push(ArgumentError::RepeatedOption {
                        option: alias.to_string(),
                        value,
                    });
                }
            }
            Arity::List => {
                let mut taken = 0usize;
                if let Some(v) = inline {
                    self.out.values.get_or_add(index).push(v.to_string());
                    taken += 1;
                }
                while let Some(next) = tokens.get(*i) {
                    if looks_like_option(next) || self.is_separator(next) {
                        break;
                    }
                    self.out.values.get_or_add(index).push(next.clone());
                    taken += 1;
                    *i += 1;
                }
                if taken == 0 {
                    self.missing_value(index, alias);
                }
            }
        }
    }

    fn missing_value(&mut self, index: usize, alias: &str) {
        self.valueless.push(index);
        self.out
            .errors
            .push(ArgumentError::MissingOptionValue(alias.to_string()));
    }

    fn is_separator(&self, token: &str) -> bool {
        self.settings.allow_argument_separator && token == "--"
    }

    fn run(mut self, tokens: &[String]) -> ParsedArguments {
        let mut i = 0usize;
        let mut after_separator = false;

        while i < tokens.len() {
            let token = tokens[i].as_str();
            i += 1;

            if after_separator {
                self.push_operand(token);
                continue;
            }
            if self.is_separator(token) {
                after_separator = true;
                continue;
            }
            if HELP_ALIASES.contains(&token) {
                self.out.help_requested = true;
                continue;
            }
            if self.version_enabled && VERSION_ALIASES.contains(&token) {
                self.out.version_requested = true;
                continue;
            }
            if let Some(index) = self.option_index(token) {
                self.take_option(index, token, None, tokens, &mut i);
                continue;
            }
            if looks_like_option(token) {
                if let Some((index, alias, value)) = self.split_inline(token) {
                    self.take_option(index, alias, Some(value), tokens, &mut i);
                } else if let Some(flags) = self.short_cluster(token) {
                    for index in flags {
                        self.out.values.get_or_add(index);
                    }
                } else {
                    self.unexpected(token, ArgumentError::UnrecognizedOption(token.to_string()));
                }
                continue;
            }
            self.push_operand(token);
        }

        for (index, arg) in self.command.arguments().iter().enumerate() {
            if arg.is_required()
                && !self.out.values.contains(index)
                && !self.valueless.contains(&index)
            {
                self.out.errors.push(ArgumentError::MissingArgument {
                    kind: if arg.is_operand() { "operand" } else { "option" },
                    name: arg.display_name().to_string(),
                });
            }
        }

        self.out
    }
}

/// Parse `tokens` against the arguments of `command` in one left-to-right
/// pass.
///
/// Recognized option aliases always win over operand positions. Errors are
/// collected, never returned early, so every problem can be reported at once.
pub fn parse(
    command: &CommandDescriptor,
    tokens: &[String],
    settings: &AppSettings,
    version_enabled: bool,
) -> ParsedArguments {
    let parser = Parser {
        command,
        settings,
        version_enabled,
        operands: command.operands().map(|(i, _)| i).collect(),
        cursor: 0,
        valueless: Vec::new(),
        out: ParsedArguments {
            values: ArgumentValues::new(command),
            ..ParsedArguments::default()
        },
    };
    let parsed = parser.run(tokens);
    debug!(
        command = command.name(),
        arguments = parsed.values.iter().count(),
        remaining = parsed.remaining.len(),
        errors = parsed.errors.len(),
        help = parsed.help_requested,
        "parsed arguments"
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{ClassDecl, MethodDecl, ParamDecl};
    use crate::invoke::Invocation;
    use crate::types::{self, TypeRegistry};

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn tree_with(method: MethodDecl, settings: AppSettings) -> CommandTree {
        CommandTree::build(
            ClassDecl::new("app").method(method.handler(|_inv: Invocation| ())),
            settings,
            &TypeRegistry::default(),
        )
        .unwrap()
    }

    fn values_of(tree: &CommandTree, result: &ParseResult, name: &str) -> Option<Vec<String>> {
        let cmd = tree.get(result.command);
        let index = cmd.arguments().iter().position(|a| a.name() == name)?;
        result.arguments.values.values(index).map(|v| v.to_vec())
    }

    fn sample() -> MethodDecl {
        MethodDecl::new("run")
            .param(ParamDecl::new("opt").short('o'))
            .param(ParamDecl::new("names").short('n').list())
            .param(ParamDecl::new("verbose").short('v').flag())
            .param(ParamDecl::new("quiet").short('q').flag())
            .param(ParamDecl::new("first").positional())
            .param(ParamDecl::new("rest").positional().list())
    }

    #[test]
    fn options_and_operands_are_collected_in_order() {
        let tree = tree_with(sample(), AppSettings::default());
        let r = tree.parse(&tokens("run a -o x b --names n1 n2 n3 -v c"));
        assert!(r.arguments.errors.is_empty(), "{:?}", r.arguments.errors);
        assert_eq!(values_of(&tree, &r, "opt"), Some(vec!["x".into()]));
        assert_eq!(
            values_of(&tree, &r, "names"),
            Some(vec!["n1".into(), "n2".into(), "n3".into()])
        );
        assert_eq!(values_of(&tree, &r, "verbose"), Some(vec![]));
        assert_eq!(values_of(&tree, &r, "quiet"), None);
        assert_eq!(values_of(&tree, &r, "first"), Some(vec!["a".into()]));
        assert_eq!(
            values_of(&tree, &r, "rest"),
            Some(vec!["b".into(), "c".into()])
        );
    }

    #[test]
    fn alias_lookup_reaches_collected_values() {
        let tree = tree_with(sample(), AppSettings::default());
        let r = tree.parse(&tokens("run -o x"));
        let values = &r.arguments.values;
        assert_eq!(values.values_by_alias("--opt"), Some(&["x".to_string()][..]));
        assert!(values.contains_alias("-o"));
        assert!(!values.contains_alias("-n"));
        assert!(values.argument_for_alias("--names").is_some());
    }

    #[test]
    fn inline_values_and_short_clusters() {
        let tree = tree_with(sample(), AppSettings::default());
        let r = tree.parse(&tokens("run --opt=x -vq"));
        assert!(r.arguments.errors.is_empty(), "{:?}", r.arguments.errors);
        assert_eq!(values_of(&tree, &r, "opt"), Some(vec!["x".into()]));
        assert_eq!(values_of(&tree, &r, "verbose"), Some(vec![]));
        assert_eq!(values_of(&tree, &r, "quiet"), Some(vec![]));
    }

    #[test]
    fn recognized_alias_is_never_an_option_value() {
        let tree = tree_with(sample(), AppSettings::default());
        let r = tree.parse(&tokens("run --opt -v"));
        assert_eq!(
            r.arguments.errors,
            vec![ArgumentError::MissingOptionValue("--opt".to_string())]
        );
        assert_eq!(values_of(&tree, &r, "verbose"), Some(vec![]));
    }

    #[test]
    fn negative_numbers_are_values() {
        let tree = tree_with(
            MethodDecl::new("run")
                .param(ParamDecl::new("n").value_type(types::INT))
                .param(ParamDecl::new("x").positional().value_type(types::INT)),
            AppSettings::default(),
        );
        let r = tree.parse(&tokens("run --n -5 -7"));
        assert!(r.arguments.errors.is_empty(), "{:?}", r.arguments.errors);
        assert_eq!(values_of(&tree, &r, "n"), Some(vec!["-5".into()]));
        assert_eq!(values_of(&tree, &r, "x"), Some(vec!["-7".into()]));
    }

    #[test]
    fn number_words_are_not_negative_numbers() {
        let tree = tree_with(
            MethodDecl::new("run").param(ParamDecl::new("x").positional()),
            AppSettings::default(),
        );
        for word in ["-inf", "-nan", "-Infinity"] {
            let r = tree.parse(&tokens(&format!("run {word}")));
            assert_eq!(
                r.arguments.errors,
                vec![ArgumentError::UnrecognizedOption(word.to_string())]
            );
        }
        let r = tree.parse(&tokens("run -.5"));
        assert!(r.arguments.errors.is_empty(), "{:?}", r.arguments.errors);
        assert_eq!(values_of(&tree, &r, "x"), Some(vec!["-.5".into()]));
    }

    #[test]
    fn required_option_without_value_is_reported_once() {
        let tree = tree_with(
            MethodDecl::new("run")
                .param(ParamDecl::new("opt").required())
                .param(ParamDecl::new("tags").list().required()),
            AppSettings::default(),
        );
        let r = tree.parse(&tokens("run --tags --opt"));
        assert_eq!(
            r.arguments.errors,
            vec![
                ArgumentError::MissingOptionValue("--tags".to_string()),
                ArgumentError::MissingOptionValue("--opt".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_option_is_reported() {
        let tree = tree_with(sample(), AppSettings::default());
        let r = tree.parse(&tokens("run --nope"));
        assert_eq!(
            r.arguments.errors,
            vec![ArgumentError::UnrecognizedOption("--nope".to_string())]
        );
    }

    #[test]
    fn unexpected_tokens_are_kept_when_allowed() {
        let settings = AppSettings {
            throw_on_unexpected_argument: false,
            ..AppSettings::default()
        };
        let tree = tree_with(
            MethodDecl::new("run").param(ParamDecl::new("only").positional()),
            settings,
        );
        let r = tree.parse(&tokens("run a b --nope"));
        assert!(r.arguments.errors.is_empty());
        assert_eq!(r.arguments.remaining, tokens("b --nope"));
    }

    #[test]
    fn single_option_fed_two_tokens_spills_into_operands() {
        let tree = tree_with(
            MethodDecl::new("run").param(ParamDecl::new("opt")),
            AppSettings::default(),
        );
        let r = tree.parse(&tokens("run --opt a b"));
        assert_eq!(
            r.arguments.errors,
            vec![ArgumentError::UnexpectedArgument("b".to_string())]
        );
    }

    #[test]
    fn repeated_single_option_is_reported() {
        let tree = tree_with(
            MethodDecl::new("run").param(ParamDecl::new("opt")),
            AppSettings::default(),
        );
        let r = tree.parse(&tokens("run --opt a --opt b"));
        assert_eq!(
            r.arguments.errors,
            vec![ArgumentError::RepeatedOption {
                option: "--opt".to_string(),
                value: "b".to_string(),
            }]
        );
    }

    #[test]
    fn separator_makes_everything_an_operand() {
        let settings = AppSettings {
            allow_argument_separator: true,
            ..AppSettings::default()
        };
        let tree = tree_with(
            MethodDecl::new("cmd").param(ParamDecl::new("value").positional()),
            settings,
        );
        let r = tree.parse(&tokens("cmd -- --looks-like-option"));
        assert!(r.arguments.errors.is_empty(), "{:?}", r.arguments.errors);
        assert_eq!(
            values_of(&tree, &r, "value"),
            Some(vec!["--looks-like-option".into()])
        );
    }

    #[test]
    fn separator_is_an_unknown_option_when_disabled() {
        let tree = tree_with(
            MethodDecl::new("cmd").param(ParamDecl::new("value").positional()),
            AppSettings::default(),
        );
        let r = tree.parse(&tokens("cmd -- x"));
        assert_eq!(
            r.arguments.errors,
            vec![ArgumentError::UnrecognizedOption("--".to_string())]
        );
    }

    #[test]
    fn missing_required_arguments_are_all_reported() {
        let tree = tree_with(
            MethodDecl::new("Do1")
                .param(ParamDecl::new("Opt1").required())
                .param(ParamDecl::new("Arg1").positional().required()),
            AppSettings::default(),
        );
        let r = tree.parse(&tokens("Do1"));
        assert_eq!(
            r.arguments.errors,
            vec![
                ArgumentError::MissingArgument {
                    kind: "option",
                    name: "--Opt1".to_string(),
                },
                ArgumentError::MissingArgument {
                    kind: "operand",
                    name: "Arg1".to_string(),
                },
            ]
        );
    }

    #[test]
    fn help_alias_is_noted_anywhere() {
        let tree = tree_with(sample(), AppSettings::default());
        let r = tree.parse(&tokens("run a -o x -?"));
        assert!(r.arguments.help_requested);
    }

    #[test]
    fn version_alias_only_at_root_when_enabled() {
        let settings = AppSettings {
            show_version_option: true,
            ..AppSettings::default()
        };
        let tree = tree_with(MethodDecl::new("run"), settings);
        assert!(tree.parse(&tokens("--version")).arguments.version_requested);

        let r = tree.parse(&tokens("run --version"));
        assert!(!r.arguments.version_requested);
        assert_eq!(
            r.arguments.errors,
            vec![ArgumentError::UnrecognizedOption("--version".to_string())]
        );
    }
}

//! Basic structural checks that run before anything depends on symbols.

use std::collections::HashMap;

use crate::ast::{AstId, NodeKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::Grammar;

/// Options accepted at grammar level.
const GRAMMAR_OPTIONS: &[&str] = &[
    "superClass",
    "TokenLabelType",
    "tokenVocab",
    "language",
    "caseInsensitive",
    "contextSuperClass",
];

/// Options accepted on individual rules (lexer rules only).
const RULE_OPTIONS: &[&str] = &["caseInsensitive"];

/// Lexer commands that cannot be combined on one rule.
const INCOMPATIBLE_COMMAND_PAIRS: &[(&str, &str)] = &[
    ("skip", "more"),
    ("skip", "type"),
    ("skip", "channel"),
    ("more", "type"),
    ("more", "channel"),
];

pub fn check(g: &mut Grammar, diag: &mut Diagnostics) {
    check_prequel_repetition(g, diag);
    check_options(g, diag);
    check_token_names(g, diag);
    check_channels_placement(g, diag);
    check_lexer_commands(g, diag);
    check_modes_non_empty(g, diag);
    check_epsilon_tokens(g, diag);
}

/// Each prequel section type may appear once; every occurrence of a
/// repeated type is reported.
fn check_prequel_repetition(g: &Grammar, diag: &mut Diagnostics) {
    let mut by_kind: HashMap<&'static str, Vec<AstId>> = HashMap::new();
    for &child in g.ast.children(g.root) {
        let key = match g.ast.node(child).kind {
            NodeKind::Options => "options",
            NodeKind::Tokens => "tokens",
            NodeKind::Channels => "channels",
            NodeKind::Import => "import",
            _ => continue,
        };
        by_kind.entry(key).or_default().push(child);
    }
    for key in ["options", "tokens", "channels", "import"] {
        let Some(sections) = by_kind.get(key) else { continue };
        if sections.len() < 2 {
            continue;
        }
        for &section in sections {
            diag.report(DiagnosticKind::RepeatedPrequel, g.ast.node(section).span)
                .arg(key)
                .emit();
        }
    }
}

fn check_options(g: &Grammar, diag: &mut Diagnostics) {
    for n in g.ast.walk(g.root) {
        if g.ast.node(n).kind != NodeKind::Options {
            continue;
        }
        let owner = g.ast.node(n).parent;
        let owner_kind = owner.map(|p| g.ast.node(p).kind);
        for &def in g.ast.children(n) {
            let name = &g.ast.node(def).text;
            let legal = match owner_kind {
                Some(NodeKind::Grammar(_)) => GRAMMAR_OPTIONS.contains(&name.as_str()),
                Some(NodeKind::Rule { .. }) => {
                    let lexer_rule = owner.is_some_and(|p| is_lexer_rule(g, p));
                    lexer_rule && RULE_OPTIONS.contains(&name.as_str())
                }
                _ => false,
            };
            if !legal {
                diag.report(DiagnosticKind::IllegalOption, g.ast.node(def).span)
                    .arg(name)
                    .emit();
            }
        }
    }
}

fn check_token_names(g: &Grammar, diag: &mut Diagnostics) {
    for section in g.ast.children_where(g.root, |k| *k == NodeKind::Tokens) {
        for &entry in g.ast.children(section) {
            let node = g.ast.node(entry);
            if node.text.chars().next().is_some_and(char::is_lowercase) {
                diag.report(DiagnosticKind::TokenNamesMustStartUpper, node.span)
                    .arg(&node.text)
                    .emit();
            }
        }
    }
}

fn check_channels_placement(g: &Grammar, diag: &mut Diagnostics) {
    if g.is_lexer() {
        return;
    }
    for section in g.ast.children_where(g.root, |k| *k == NodeKind::Channels) {
        diag.report(DiagnosticKind::ChannelsOnlyInLexer, g.ast.node(section).span)
            .emit();
    }
}

fn check_lexer_commands(g: &Grammar, diag: &mut Diagnostics) {
    for rule in g.rules.values() {
        let commands: Vec<AstId> = g
            .ast
            .children_where(rule.ast, |k| *k == NodeKind::LexerCommand)
            .collect();
        for (i, &cmd) in commands.iter().enumerate() {
            let name = g.ast.node(cmd).text.as_str();
            for &earlier in &commands[..i] {
                let other = g.ast.node(earlier).text.as_str();
                if other == name {
                    diag.report(DiagnosticKind::DuplicatedCommand, g.ast.node(cmd).span)
                        .arg(name)
                        .emit();
                } else if INCOMPATIBLE_COMMAND_PAIRS
                    .iter()
                    .any(|&(a, b)| (a == name && b == other) || (a == other && b == name))
                {
                    diag.report(DiagnosticKind::IncompatibleCommands, g.ast.node(cmd).span)
                        .arg(name)
                        .arg(other)
                        .emit();
                }
            }
        }
    }
}

/// Every lexer mode must contain at least one non-fragment rule.
fn check_modes_non_empty(g: &Grammar, diag: &mut Diagnostics) {
    for mode in g.ast.children_where(g.root, |k| *k == NodeKind::Mode) {
        let has_token_rule = g
            .ast
            .children_where(mode, |k| matches!(k, NodeKind::Rule { is_fragment: false }))
            .next()
            .is_some();
        if !has_token_rule {
            let node = g.ast.node(mode);
            diag.report(DiagnosticKind::ModeWithoutRules, node.span)
                .arg(&node.text)
                .emit();
        }
    }
}

/// A non-fragment lexer rule that can match the empty string never
/// produces a token.
fn check_epsilon_tokens(g: &Grammar, diag: &mut Diagnostics) {
    if !g.is_lexer() {
        return;
    }
    for rule in g.rules.values() {
        if rule.is_fragment {
            continue;
        }
        let mut busy = Vec::new();
        if rule_matches_empty(g, &rule.name, &mut busy) {
            diag.report(DiagnosticKind::EpsilonToken, g.ast.node(rule.ast).span)
                .arg(&rule.name)
                .emit();
        }
    }
}

fn rule_matches_empty(g: &Grammar, name: &str, busy: &mut Vec<String>) -> bool {
    if busy.iter().any(|b| b == name) {
        // Recursive without consuming: treat as non-empty; the loop is
        // someone else's problem.
        return false;
    }
    let Some(rule) = g.rules.get(name) else {
        return false;
    };
    let Some(body) = g.ast.find_child(rule.ast, |k| *k == NodeKind::Block) else {
        return true;
    };
    busy.push(name.to_owned());
    let empty = block_matches_empty(g, body, busy);
    busy.pop();
    empty
}

fn block_matches_empty(g: &Grammar, block: AstId, busy: &mut Vec<String>) -> bool {
    g.ast
        .children(block)
        .iter()
        .any(|&alt| alt_matches_empty(g, alt, busy))
}

fn alt_matches_empty(g: &Grammar, alt: AstId, busy: &mut Vec<String>) -> bool {
    g.ast
        .children(alt)
        .iter()
        .all(|&el| element_matches_empty(g, el, busy))
}

fn element_matches_empty(g: &Grammar, el: AstId, busy: &mut Vec<String>) -> bool {
    let node = g.ast.node(el);
    match node.kind {
        NodeKind::Optional { .. } | NodeKind::Star { .. } => true,
        NodeKind::Action | NodeKind::Predicate | NodeKind::LexerCommand => true,
        NodeKind::Plus { .. } => g
            .ast
            .children(el)
            .iter()
            .all(|&c| element_matches_empty(g, c, busy)),
        NodeKind::Block => block_matches_empty(g, el, busy),
        NodeKind::TokenRef => {
            let name = node.text.clone();
            rule_matches_empty(g, &name, busy)
        }
        NodeKind::StringLit => crate::ast::unescape_literal(&node.text).is_empty(),
        _ => false,
    }
}

pub(super) fn is_lexer_rule(g: &Grammar, rule: AstId) -> bool {
    let node = g.ast.node(rule);
    matches!(node.kind, NodeKind::Rule { is_fragment: true })
        || node.text.chars().next().is_some_and(char::is_uppercase)
}

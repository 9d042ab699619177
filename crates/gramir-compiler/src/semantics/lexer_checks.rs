//! Lexer-specific analysis: unreachable literals, case-insensitivity
//! options, suspicious ranges, and command argument resolution.

use rowan::TextRange;

use crate::ast::{AstId, NodeKind, unescape_literal};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::{DEFAULT_MODE_NAME, Grammar};

pub fn check(g: &mut Grammar, diag: &mut Diagnostics) {
    if !g.is_lexer() {
        return;
    }
    check_unreachable_tokens(g, diag);
    check_case_insensitive_options(g, diag);
    check_ranges(g, diag);
    check_command_references(g, diag);
}

/// A literal a rule matches.
struct LiteralMatch {
    rule: String,
    literal: String,
    span: TextRange,
}

/// Within one mode, a literal string matched by an earlier rule (or an
/// earlier alternative of the same rule) shadows any later definition of
/// the same literal.
fn check_unreachable_tokens(g: &Grammar, diag: &mut Diagnostics) {
    let mut by_mode: indexmap::IndexMap<&str, Vec<LiteralMatch>> = indexmap::IndexMap::new();

    for rule in g.rules.values() {
        if rule.is_fragment {
            continue;
        }
        let mode = rule.mode.as_deref().unwrap_or(DEFAULT_MODE_NAME);
        let matches = by_mode.entry(mode).or_default();
        for (literal, span) in rule_literals(g, rule.ast) {
            matches.push(LiteralMatch {
                rule: rule.name.clone(),
                literal,
                span,
            });
        }
    }

    for matches in by_mode.values() {
        for (i, m) in matches.iter().enumerate() {
            let Some(earlier) = matches[..i].iter().find(|e| e.literal == m.literal) else {
                continue;
            };
            diag.report(DiagnosticKind::TokenUnreachable, m.span)
                .arg(&m.rule)
                .arg(format!("'{}'", m.literal))
                .arg(&earlier.rule)
                .emit();
        }
    }
}

/// The simple concatenated literal strings a rule's alternatives match.
/// Alternatives containing anything but string literals are ignored.
fn rule_literals(g: &Grammar, rule: AstId) -> Vec<(String, TextRange)> {
    let Some(body) = g.ast.find_child(rule, |k| *k == NodeKind::Block) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for &alt in g.ast.children(body) {
        let elements = g.ast.children(alt);
        if elements.is_empty() {
            continue;
        }
        let all_literals = elements
            .iter()
            .all(|&el| g.ast.node(el).kind == NodeKind::StringLit);
        if !all_literals {
            continue;
        }
        let text: String = elements
            .iter()
            .map(|&el| unescape_literal(&g.ast.node(el).text))
            .collect();
        out.push((text, g.ast.node(alt).span));
    }
    out
}

/// `caseInsensitive` takes `true` or `false`; a rule-level value equal to
/// the grammar-level value is redundant.
fn check_case_insensitive_options(g: &Grammar, diag: &mut Diagnostics) {
    let grammar_value = case_insensitive_value(g.ast.node(g.root).option("caseInsensitive"));
    if let Some(def) = option_def(g, g.root, "caseInsensitive") {
        if grammar_value.is_none() {
            report_bad_value(g, def, diag);
        }
    }

    for rule in g.rules.values() {
        let raw = g.ast.node(rule.ast).option("caseInsensitive");
        if raw.is_none() {
            continue;
        }
        let value = case_insensitive_value(raw);
        let Some(def) = option_def(g, rule.ast, "caseInsensitive") else {
            continue;
        };
        match value {
            None => report_bad_value(g, def, diag),
            Some(v) if Some(v) == grammar_value => {
                diag.report(
                    DiagnosticKind::RedundantCaseInsensitiveLexerRuleOption,
                    g.ast.node(def).span,
                )
                .arg(v)
                .emit();
            }
            Some(_) => {}
        }
    }
}

fn case_insensitive_value(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

/// The `OptionDef` node of `name` declared directly on `owner`.
fn option_def(g: &Grammar, owner: AstId, name: &str) -> Option<AstId> {
    g.ast
        .children_where(owner, |k| *k == NodeKind::Options)
        .flat_map(|opts| g.ast.children(opts).iter().copied().collect::<Vec<_>>())
        .find(|&def| g.ast.node(def).text == name)
}

fn report_bad_value(g: &Grammar, def: AstId, diag: &mut Diagnostics) {
    let value = g
        .ast
        .children(def)
        .first()
        .map(|&v| g.ast.node(v).text.clone())
        .unwrap_or_default();
    diag.report(DiagnosticKind::IllegalOptionValue, g.ast.node(def).span)
        .arg(&g.ast.node(def).text)
        .arg(value)
        .emit();
}

/// `'A'..'g'` mixes letter cases; the range covers punctuation between
/// the cases that the author probably did not intend.
fn check_ranges(g: &Grammar, diag: &mut Diagnostics) {
    for n in g.ast.walk(g.root) {
        if g.ast.node(n).kind != NodeKind::Range {
            continue;
        }
        let bounds = g.ast.children(n);
        let [lo, hi] = bounds else { continue };
        let lo_text = unescape_literal(&g.ast.node(*lo).text);
        let hi_text = unescape_literal(&g.ast.node(*hi).text);
        let (Some(lo_char), Some(hi_char)) = (single_char(&lo_text), single_char(&hi_text)) else {
            continue;
        };
        if lo_char.is_ascii_alphabetic()
            && hi_char.is_ascii_alphabetic()
            && lo_char.is_ascii_lowercase() != hi_char.is_ascii_lowercase()
        {
            diag.report(
                DiagnosticKind::RangeProbablyContainsNotImpliedCharacters,
                g.ast.node(n).span,
            )
            .arg(lo_char)
            .arg(hi_char)
            .emit();
        }
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

/// `type(X)`, `channel(X)`, and `mode(X)`/`pushMode(X)` arguments must
/// name a declared token, channel, or mode.
fn check_command_references(g: &Grammar, diag: &mut Diagnostics) {
    for rule in g.rules.values() {
        for cmd in g
            .ast
            .children_where(rule.ast, |k| *k == NodeKind::LexerCommand)
        {
            let name = g.ast.node(cmd).text.clone();
            let Some(arg) = g.ast.find_child(cmd, |k| *k == NodeKind::Name) else {
                continue;
            };
            let arg_node = g.ast.node(arg);
            let value = arg_node.text.clone();
            if value.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let known = match name.as_str() {
                "type" => g.token_name_to_type.contains_key(&value),
                "channel" => g.channel_value(&value).is_some(),
                "mode" | "pushMode" => {
                    g.modes.contains_key(&value) || value == DEFAULT_MODE_NAME
                }
                _ => true,
            };
            if !known {
                diag.report(DiagnosticKind::UnknownLexerConstant, arg_node.span)
                    .arg(&value)
                    .arg(&name)
                    .emit();
            }
        }
    }
}

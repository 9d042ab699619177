//! Token-type assignment.

use crate::ast::NodeKind;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::Grammar;
use crate::transform::literal_alias_of;

use super::collect::SymbolCollection;

pub fn assign(g: &mut Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    assign_declared_tokens(g, symbols, diag);
    if g.is_lexer() || g.is_combined() {
        assign_lexer_rules(g);
    }
    if !g.is_lexer() {
        assign_referenced_tokens(g, symbols, diag);
        assign_string_literals(g, symbols, diag);
    }
}

/// Every non-fragment lexer rule without a `type(...)` or `more` command
/// names a token; `X : 'lit' ;` rules also alias their literal.
fn assign_lexer_rules(g: &mut Grammar) {
    let rules: Vec<(String, crate::ast::AstId)> = g
        .rules
        .values()
        .filter(|r| !r.is_fragment)
        .filter(|r| r.name.chars().next().is_some_and(char::is_uppercase))
        .map(|r| (r.name.clone(), r.ast))
        .collect();

    for (name, ast_id) in rules {
        if has_retyping_command(g, ast_id) {
            continue;
        }
        g.define_token_name(&name);

        let Some(literal) = literal_alias_of(&g.ast, ast_id) else {
            continue;
        };
        let existing = g.string_literal_type(&literal);
        if existing != gramir_atn::TOKEN_INVALID_TYPE && existing != g.token_type(&name) {
            // The same literal already aliases another rule: drop the
            // alias and remember the ambiguity.
            let first = g.token_display_name(existing);
            g.undefine_string_literal(&literal);
            g.ambiguous_aliases.push((literal, first, name));
        } else {
            g.define_token_alias(&name, &literal);
        }
    }
}

fn has_retyping_command(g: &Grammar, rule: crate::ast::AstId) -> bool {
    g.ast
        .children_where(rule, |k| *k == NodeKind::LexerCommand)
        .any(|c| matches!(g.ast.node(c).text.as_str(), "type" | "more"))
}

fn assign_declared_tokens(g: &mut Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    for (name, node) in &symbols.token_defs {
        if g.token_name_to_type.contains_key(name) {
            diag.report(DiagnosticKind::TokenNameReassignment, g.ast.node(*node).span)
                .arg(name)
                .emit();
            continue;
        }
        g.define_token_name(name);
    }
}

/// Tokens referenced but never declared are defined implicitly, with a
/// warning.
fn assign_referenced_tokens(g: &mut Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    for (name, node) in &symbols.token_refs {
        if g.token_name_to_type.contains_key(name) {
            continue;
        }
        diag.report(
            DiagnosticKind::ImplicitTokenDefinition,
            g.ast.node(*node).span,
        )
        .arg(name)
        .emit();
        g.define_token_name(name);
    }
}

/// A literal in a combined grammar gets an implicit type; in a pure
/// parser grammar there is no lexer to supply one.
fn assign_string_literals(g: &mut Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    for (literal, node) in &symbols.string_refs {
        if g.string_literal_to_type.contains_key(literal) {
            continue;
        }
        if g.is_combined() {
            g.define_string_literal(literal);
        } else {
            diag.report(
                DiagnosticKind::ImplicitStringDefinition,
                g.ast.node(*node).span,
            )
            .arg(literal)
            .emit();
        }
    }
}

//! Rule collection: AST rules into the grammar's rule table.

use crate::ast::{AstId, NodeKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::{Grammar, Rule, parse_attribute_defs};

/// Build the rule map and per-rule structures. Duplicate names report
/// `RULE_REDEFINITION`; the first definition wins.
pub fn collect_rules(g: &mut Grammar, diag: &mut Diagnostics) {
    let top_rules: Vec<AstId> = g
        .ast
        .children_where(g.root, |k| matches!(k, NodeKind::Rule { .. }))
        .collect();
    for rule in top_rules {
        define(g, rule, None, diag);
    }

    let modes: Vec<AstId> = g
        .ast
        .children_where(g.root, |k| *k == NodeKind::Mode)
        .collect();
    for mode in modes {
        let mode_name = g.ast.node(mode).text.clone();
        g.modes.insert(mode_name.clone(), mode);
        let rules: Vec<AstId> = g
            .ast
            .children_where(mode, |k| matches!(k, NodeKind::Rule { .. }))
            .collect();
        for rule in rules {
            define(g, rule, Some(mode_name.clone()), diag);
        }
    }
}

fn define(g: &mut Grammar, ast_id: AstId, mode: Option<String>, diag: &mut Diagnostics) {
    let node = g.ast.node(ast_id);
    let name = node.text.clone();
    let span = node.span;
    let is_fragment = matches!(node.kind, NodeKind::Rule { is_fragment: true });

    if let Some(existing) = g.rules.get(&name) {
        // The same node re-collected is a re-run, not a redefinition.
        if existing.ast != ast_id {
            diag.report(DiagnosticKind::RuleRedefinition, span)
                .arg(&name)
                .emit();
        }
        return;
    }

    let mut rule = Rule::new(name, g.rules.len(), ast_id);
    rule.is_fragment = is_fragment;
    rule.mode = mode;

    if let Some(args) = g.ast.find_child(ast_id, |k| *k == NodeKind::Args) {
        rule.args = parse_attribute_defs(&g.ast.node(args).text);
    }
    if let Some(rets) = g.ast.find_child(ast_id, |k| *k == NodeKind::Returns) {
        rule.returns = parse_attribute_defs(&g.ast.node(rets).text);
    }
    if let Some(locals) = g.ast.find_child(ast_id, |k| *k == NodeKind::Locals) {
        rule.locals = parse_attribute_defs(&g.ast.node(locals).text);
    }

    if let Some(body) = g.ast.find_child(ast_id, |k| *k == NodeKind::Block) {
        let alts = g.ast.children(body);
        rule.num_alts = alts.len();
        for (i, &alt) in alts.iter().enumerate() {
            if let Some(label) = &g.ast.node(alt).label {
                rule.alt_labels
                    .entry(label.name.clone())
                    .or_default()
                    .push(i + 1);
            }
        }
    }

    g.define_rule(rule);
}

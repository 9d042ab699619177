//! Symbol conflict checks.

use std::collections::{HashMap, HashSet};

use crate::ast::NodeKind;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::{COMMON_CONSTANTS, Grammar};

use super::collect::SymbolCollection;

pub fn check(g: &Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    check_reserved_rule_names(g, diag);
    check_undefined_rule_refs(g, symbols, diag);
    check_rule_arg_usage(g, symbols, diag);
    check_labeled_blocks(g, symbols, diag);
    check_declaration_conflicts(g, diag);
    check_labels(g, symbols, diag);
}

fn check_reserved_rule_names(g: &Grammar, diag: &mut Diagnostics) {
    for rule in g.rules.values() {
        if COMMON_CONSTANTS.contains(&rule.name.as_str()) {
            diag.report(DiagnosticKind::ReservedRuleName, g.ast.node(rule.ast).span)
                .arg(&rule.name)
                .emit();
        }
    }
}

fn check_undefined_rule_refs(g: &Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    let mut seen: HashSet<&str> = HashSet::new();
    for (name, node) in &symbols.rule_refs {
        if g.resolve_rule(name).is_some() {
            continue;
        }
        if !seen.insert(name.as_str()) {
            continue;
        }
        diag.report(DiagnosticKind::UndefinedRuleRef, g.ast.node(*node).span)
            .arg(name)
            .emit();
    }
}

/// Calls must match the callee's parameter list: args passed to an
/// argless rule, or none passed to a parameterized one.
fn check_rule_arg_usage(g: &Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    for (name, node) in &symbols.rule_refs {
        let Some(callee) = g.resolve_rule(name) else {
            continue;
        };
        let has_args = g
            .ast
            .find_child(*node, |k| *k == NodeKind::Args)
            .is_some();
        if has_args && callee.args.is_empty() {
            diag.report(DiagnosticKind::RuleHasNoArgs, g.ast.node(*node).span)
                .arg(name)
                .emit();
        } else if !has_args && !callee.args.is_empty() {
            diag.report(DiagnosticKind::MissingRuleArgs, g.ast.node(*node).span)
                .arg(name)
                .emit();
        }
    }
}

/// A label may only name a block that reduced to a set.
fn check_labeled_blocks(g: &Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    for (label, node) in &symbols.labeled_blocks {
        let span = g
            .ast
            .node(*node)
            .label
            .as_ref()
            .map_or(g.ast.node(*node).span, |l| l.span);
        diag.report(DiagnosticKind::LabelBlockNotASet, span)
            .arg(label)
            .emit();
    }
}

/// Arg/retval/local names may not shadow rules or each other.
fn check_declaration_conflicts(g: &Grammar, diag: &mut Diagnostics) {
    for rule in g.rules.values() {
        let span = g.ast.node(rule.ast).span;
        for attr in rule.args.iter() {
            if g.rules.contains_key(&attr.name) {
                diag.report(DiagnosticKind::ArgConflictsWithRule, span)
                    .arg(&attr.name)
                    .emit();
            }
        }
        for attr in rule.returns.iter() {
            if g.rules.contains_key(&attr.name) {
                diag.report(DiagnosticKind::RetvalConflictsWithRule, span)
                    .arg(&attr.name)
                    .emit();
            }
            if rule.args.contains(&attr.name) {
                diag.report(DiagnosticKind::RetvalConflictsWithArg, span)
                    .arg(&attr.name)
                    .emit();
            }
        }
        for attr in rule.locals.iter() {
            if g.rules.contains_key(&attr.name) {
                diag.report(DiagnosticKind::LocalConflictsWithRule, span)
                    .arg(&attr.name)
                    .emit();
            }
            if rule.args.contains(&attr.name) {
                diag.report(DiagnosticKind::LocalConflictsWithArg, span)
                    .arg(&attr.name)
                    .emit();
            }
            if rule.returns.contains(&attr.name) {
                diag.report(DiagnosticKind::LocalConflictsWithRetval, span)
                    .arg(&attr.name)
                    .emit();
            }
        }
    }
}

/// Label conflicts with rules, tokens, declarations, and prior labels of
/// a different type. Rules with alternative labels scope their label
/// space per alt-label group; otherwise the space is rule-wide.
fn check_labels(g: &Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    let token_names: HashSet<&str> = symbols
        .token_defs
        .iter()
        .chain(&symbols.token_refs)
        .map(|(n, _)| n.as_str())
        .collect();

    for rule in g.rules.values() {
        let mut first_types: HashMap<(Option<&str>, &str), crate::grammar::LabelType> =
            HashMap::new();
        for label in &rule.labels {
            if g.rules.contains_key(&label.name) {
                diag.report(DiagnosticKind::LabelConflictsWithRule, label.span)
                    .arg(&label.name)
                    .emit();
            }
            if token_names.contains(label.name.as_str()) {
                diag.report(DiagnosticKind::LabelConflictsWithToken, label.span)
                    .arg(&label.name)
                    .emit();
            }
            if rule.args.contains(&label.name) {
                diag.report(DiagnosticKind::LabelConflictsWithArg, label.span)
                    .arg(&label.name)
                    .emit();
            }
            if rule.returns.contains(&label.name) {
                diag.report(DiagnosticKind::LabelConflictsWithRetval, label.span)
                    .arg(&label.name)
                    .emit();
            }
            if rule.locals.contains(&label.name) {
                diag.report(DiagnosticKind::LabelConflictsWithLocal, label.span)
                    .arg(&label.name)
                    .emit();
            }

            let scope = if rule.has_alt_labels() {
                label.alt_label.as_deref()
            } else {
                None
            };
            match first_types.entry((scope, label.name.as_str())) {
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(label.label_type);
                }
                std::collections::hash_map::Entry::Occupied(e) => {
                    if *e.get() != label.label_type {
                        diag.report(DiagnosticKind::LabelTypeConflict, label.span)
                            .arg(&label.name)
                            .arg(format!("{} vs {}", e.get(), label.label_type))
                            .emit();
                    }
                }
            }
        }
    }
}

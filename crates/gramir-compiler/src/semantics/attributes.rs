//! Attribute-expression checks inside actions and predicates.
//!
//! Validates `$x` and `$x.y` references against the enclosing rule's
//! parameters, return values, locals, labels, and the elements its
//! alternatives mention.

use std::collections::HashSet;

use crate::ast::{AstId, NodeKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::Grammar;

/// Properties every rule reference exposes.
const RULE_BUILTINS: &[&str] = &["text", "start", "stop", "ctx"];

/// Properties every token reference exposes.
const TOKEN_BUILTINS: &[&str] = &["text", "type", "line", "pos", "channel", "index", "int"];

/// Names valid bare in any action.
const SIMPLE_BUILTINS: &[&str] = &["text", "start", "stop", "ctx", "parser"];

pub fn check(g: &Grammar, diag: &mut Diagnostics) {
    for rule in g.rules.values() {
        let scope = RuleScope::build(g, rule);
        for action in g
            .ast
            .walk(rule.ast)
            .into_iter()
            .filter(|&n| matches!(g.ast.node(n).kind, NodeKind::Action | NodeKind::Predicate))
        {
            check_action_text(g, &scope, action, diag);
        }
    }
}

/// Everything `$name` can legally resolve to inside one rule.
struct RuleScope {
    rule_name: String,
    args: HashSet<String>,
    returns: HashSet<String>,
    locals: HashSet<String>,
    token_labels: HashSet<String>,
    rule_labels: HashSet<String>,
    token_refs: HashSet<String>,
    rule_refs: HashSet<String>,
    /// Rule label → the rule the labeled reference targets.
    rule_label_targets: std::collections::HashMap<String, String>,
}

impl RuleScope {
    fn build(g: &Grammar, rule: &crate::grammar::Rule) -> Self {
        let mut token_refs = HashSet::new();
        let mut rule_refs = HashSet::new();
        let mut rule_label_targets = std::collections::HashMap::new();
        for n in g.ast.walk(rule.ast) {
            match g.ast.node(n).kind {
                NodeKind::TokenRef => {
                    token_refs.insert(g.ast.node(n).text.clone());
                }
                NodeKind::RuleRef => {
                    let node = g.ast.node(n);
                    rule_refs.insert(node.text.clone());
                    // The label may sit on the reference itself or on a
                    // quantifier wrapping it.
                    let label = node.label.as_ref().or_else(|| {
                        node.parent
                            .and_then(|p| g.ast.node(p).label.as_ref())
                    });
                    if let Some(label) = label {
                        rule_label_targets.insert(label.name.clone(), node.text.clone());
                    }
                }
                _ => {}
            }
        }

        let mut token_labels = HashSet::new();
        let mut rule_labels = HashSet::new();
        for label in &rule.labels {
            use crate::grammar::LabelType::*;
            match label.label_type {
                TokenLabel | TokenListLabel => token_labels.insert(label.name.clone()),
                RuleLabel | RuleListLabel => rule_labels.insert(label.name.clone()),
            };
        }

        Self {
            rule_name: rule.name.clone(),
            args: rule.args.names().map(str::to_owned).collect(),
            returns: rule.returns.names().map(str::to_owned).collect(),
            locals: rule.locals.names().map(str::to_owned).collect(),
            token_labels,
            rule_labels,
            token_refs,
            rule_refs,
            rule_label_targets,
        }
    }

    fn knows_simple(&self, name: &str) -> bool {
        SIMPLE_BUILTINS.contains(&name)
            || name == self.rule_name
            || self.args.contains(name)
            || self.returns.contains(name)
            || self.locals.contains(name)
            || self.token_labels.contains(name)
            || self.rule_labels.contains(name)
            || self.token_refs.contains(name)
            || self.rule_refs.contains(name)
    }

    fn is_rule_like(&self, name: &str) -> bool {
        name == self.rule_name || self.rule_labels.contains(name) || self.rule_refs.contains(name)
    }

    fn is_token_like(&self, name: &str) -> bool {
        self.token_labels.contains(name) || self.token_refs.contains(name)
    }
}

fn check_action_text(g: &Grammar, scope: &RuleScope, action: AstId, diag: &mut Diagnostics) {
    let node = g.ast.node(action);
    let span = node.span;
    for (name, attr) in attribute_refs(&node.text) {
        match attr {
            None => {
                if !scope.knows_simple(&name) {
                    diag.report(DiagnosticKind::UnknownSimpleAttribute, span)
                        .arg(format!("${name}"))
                        .arg(&scope.rule_name)
                        .emit();
                }
            }
            Some(attr) => {
                if scope.is_rule_like(&name) {
                    let target = scope
                        .rule_label_targets
                        .get(&name)
                        .unwrap_or(&name);
                    let callee_returns_it = lookup_rule_for(g, target)
                        .is_some_and(|r| r.returns.contains(&attr) || r.args.contains(&attr));
                    if !callee_returns_it && !RULE_BUILTINS.contains(&attr.as_str()) {
                        diag.report(DiagnosticKind::UnknownRuleAttribute, span)
                            .arg(&attr)
                            .arg(&name)
                            .arg(format!("${name}.{attr}"))
                            .emit();
                    }
                } else if scope.is_token_like(&name) {
                    if !TOKEN_BUILTINS.contains(&attr.as_str()) {
                        diag.report(DiagnosticKind::UnknownSimpleAttribute, span)
                            .arg(format!("${name}.{attr}"))
                            .arg(&scope.rule_name)
                            .emit();
                    }
                } else if !scope.knows_simple(&name) {
                    diag.report(DiagnosticKind::UnknownSimpleAttribute, span)
                        .arg(format!("${name}"))
                        .arg(&scope.rule_name)
                        .emit();
                }
            }
        }
    }
}

/// The rule a dotted reference targets. A rule label aliases whatever
/// reference it was attached to; without tracking that edge, a rule of
/// the same name is the best resolution.
fn lookup_rule_for<'g>(g: &'g Grammar, name: &str) -> Option<&'g crate::grammar::Rule> {
    g.resolve_rule(name)
}

/// `$name` and `$name.attr` occurrences in an action body. Skips string
/// and character literals inside the action.
fn attribute_refs(text: &str) -> Vec<(String, Option<String>)> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'$' => {
                i += 1;
                let name = read_ident(text, &mut i);
                if name.is_empty() {
                    continue;
                }
                let mut attr = None;
                if i < bytes.len() && bytes[i] == b'.' {
                    let mut j = i + 1;
                    let a = read_ident(text, &mut j);
                    if !a.is_empty() {
                        attr = Some(a);
                        i = j;
                    }
                }
                out.push((name, attr));
            }
            _ => i += 1,
        }
    }
    out
}

fn read_ident(text: &str, i: &mut usize) -> String {
    let start = *i;
    let bytes = text.as_bytes();
    while *i < bytes.len() && (bytes[*i].is_ascii_alphanumeric() || bytes[*i] == b'_') {
        *i += 1;
    }
    text[start..*i].to_owned()
}

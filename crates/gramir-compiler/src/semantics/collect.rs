//! Symbol collection.
//!
//! Walks every rule body recording references, labels, predicates, and
//! actions. Named actions register on the grammar here; defining the same
//! scoped name twice in one grammar is `ACTION_REDEFINITION`.

use crate::ast::{AstId, NodeKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::{Grammar, LabelDef, LabelType};

/// Everything the collector records outside the grammar's own tables.
#[derive(Debug, Default)]
pub struct SymbolCollection {
    /// Token references from parser rules: `(name, node)`.
    pub token_refs: Vec<(String, AstId)>,
    /// String literal references from parser rules.
    pub string_refs: Vec<(String, AstId)>,
    /// Rule references (parser rules referencing parser rules, lexer
    /// rules referencing lexer rules).
    pub rule_refs: Vec<(String, AstId)>,
    /// `tokens {...}` declarations in order.
    pub token_defs: Vec<(String, AstId)>,
    /// `channels {...}` declarations in order.
    pub channel_defs: Vec<(String, AstId)>,
    /// Labels attached to `Block` nodes that survived set reduction.
    pub labeled_blocks: Vec<(String, AstId)>,
}

pub fn collect_symbols(g: &mut Grammar, diag: &mut Diagnostics) -> SymbolCollection {
    let mut symbols = SymbolCollection::default();

    for section in g
        .ast
        .children_where(g.root, |k| *k == NodeKind::Tokens)
        .collect::<Vec<_>>()
    {
        for &entry in g.ast.children(section) {
            symbols
                .token_defs
                .push((g.ast.node(entry).text.clone(), entry));
        }
    }
    for section in g
        .ast
        .children_where(g.root, |k| *k == NodeKind::Channels)
        .collect::<Vec<_>>()
    {
        for &entry in g.ast.children(section) {
            symbols
                .channel_defs
                .push((g.ast.node(entry).text.clone(), entry));
        }
    }

    collect_named_actions(g, diag);

    let rule_names: Vec<String> = g.rules.keys().cloned().collect();
    for name in rule_names {
        collect_in_rule(g, &name, &mut symbols);
    }

    // A rule nothing references is a start rule.
    let referenced: std::collections::HashSet<&str> = symbols
        .rule_refs
        .iter()
        .map(|(n, _)| n.as_str())
        .collect();
    for rule in g.rules.values_mut() {
        rule.is_start_rule = !referenced.contains(rule.name.as_str());
    }

    symbols
}

fn collect_named_actions(g: &mut Grammar, diag: &mut Diagnostics) {
    let actions: Vec<AstId> = g
        .ast
        .children_where(g.root, |k| *k == NodeKind::NamedAction)
        .collect();
    for action in actions {
        let name = g.ast.node(action).text.clone();
        let scope = g
            .ast
            .find_child(action, |k| *k == NodeKind::Name)
            .map(|s| g.ast.node(s).text.clone())
            .unwrap_or_else(|| g.default_action_scope().to_owned());
        let body = g.ast.find_child(action, |k| *k == NodeKind::Action);

        let key = (scope, name.clone());
        if let Some(&existing) = g.named_actions.get(&key) {
            // The same body re-collected is a re-run, not a redefinition.
            if Some(existing) != body {
                diag.report(DiagnosticKind::ActionRedefinition, g.ast.node(action).span)
                    .arg(&name)
                    .emit();
            }
            continue;
        }
        if let Some(body) = body {
            g.named_actions.insert(key, body);
        }
    }
}

fn collect_in_rule(g: &mut Grammar, rule_name: &str, symbols: &mut SymbolCollection) {
    let Some(rule) = g.rules.get(rule_name) else {
        return;
    };
    let rule_ast = rule.ast;
    let lexer_rule = super::basic_checks::is_lexer_rule(g, rule_ast);
    let Some(body) = g.ast.find_child(rule_ast, |k| *k == NodeKind::Block) else {
        return;
    };

    let mut labels: Vec<LabelDef> = Vec::new();
    let alts: Vec<AstId> = g.ast.children(body).to_vec();
    for &alt in &alts {
        let alt_label = g.ast.node(alt).label.as_ref().map(|l| l.name.clone());
        for n in g.ast.walk(alt) {
            let node = g.ast.node(n);
            match node.kind {
                NodeKind::TokenRef => {
                    if lexer_rule {
                        // In a lexer, an uppercase reference calls another
                        // lexer rule.
                        symbols.rule_refs.push((node.text.clone(), n));
                    } else if node.text != "EOF" {
                        symbols.token_refs.push((node.text.clone(), n));
                    }
                }
                NodeKind::RuleRef => {
                    symbols.rule_refs.push((node.text.clone(), n));
                }
                NodeKind::StringLit if !lexer_rule => {
                    symbols.string_refs.push((node.text.clone(), n));
                }
                NodeKind::Predicate => {
                    g.define_sempred(n);
                }
                NodeKind::Action if lexer_rule => {
                    g.define_lexer_action(n);
                }
                _ => {}
            }

            if let Some(label) = &g.ast.node(n).label {
                match label_type_for(g, n) {
                    Some(label_type) => labels.push(LabelDef {
                        name: label.name.clone(),
                        label_type,
                        span: label.span,
                        alt_label: alt_label.clone(),
                    }),
                    None => {
                        if g.ast.node(n).kind == NodeKind::Block {
                            symbols.labeled_blocks.push((label.name.clone(), n));
                        }
                    }
                }
            }
        }
    }

    if let Some(rule) = g.rules.get_mut(rule_name) {
        rule.labels = labels;
    }
}

/// The label type an element supports, or `None` for labels that cannot
/// attach (blocks that are not sets).
fn label_type_for(g: &Grammar, n: AstId) -> Option<LabelType> {
    let node = g.ast.node(n);
    let is_list = node.label.as_ref().is_some_and(|l| l.is_list);
    let mut target = n;
    // A label on a quantified element classifies by the inner element.
    if matches!(
        node.kind,
        NodeKind::Optional { .. } | NodeKind::Star { .. } | NodeKind::Plus { .. }
    ) {
        target = *g.ast.children(n).first()?;
    }
    match g.ast.node(target).kind {
        NodeKind::TokenRef
        | NodeKind::StringLit
        | NodeKind::Set
        | NodeKind::CharSet
        | NodeKind::Range
        | NodeKind::Wildcard
        | NodeKind::Not => Some(if is_list {
            LabelType::TokenListLabel
        } else {
            LabelType::TokenLabel
        }),
        NodeKind::RuleRef => Some(if is_list {
            LabelType::RuleListLabel
        } else {
            LabelType::RuleLabel
        }),
        NodeKind::Block => None,
        _ => None,
    }
}

//! Direct left-recursion elimination.
//!
//! A rule whose alternatives lead with a self-reference rewrites into a
//! precedence-climbing form: the non-recursive alternatives become a
//! primary block, the recursive ones become a greedy loop of operator
//! alternatives, each guarded by a precedence predicate. Remaining
//! self-references carry the operand's minimum precedence as a call
//! argument (`p + 1` for left-associative operators, `p` for right).
//!
//! Indirect cycles cannot be rewritten here and are reported as
//! `LEFT_RECURSION_CYCLES`.

use std::collections::HashMap;

use crate::ast::{AstId, NodeKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::{Assoc, Grammar, LeftRecursiveInfo, OpAlt};

/// Option key carrying precedence on rewritten alts and self-references.
pub(crate) const PRECEDENCE_OPTION: &str = "p";

/// Marker on the rewritten operator loop so the ATN factory builds its
/// star entry as a precedence decision.
pub(crate) const PRECEDENCE_LOOP_OPTION: &str = "precedenceLoop";

/// Rewrite every directly left-recursive parser rule, then report the
/// cycles that remain.
pub fn transform_left_recursion(g: &mut Grammar, diag: &mut Diagnostics) {
    let candidates: Vec<String> = g
        .rules
        .values()
        .filter(|r| r.name.chars().next().is_some_and(char::is_lowercase))
        .map(|r| r.name.clone())
        .collect();

    for name in candidates {
        rewrite_rule(g, &name, diag);
    }

    detect_recursion_cycles(g, diag);
}

fn rewrite_rule(g: &mut Grammar, name: &str, diag: &mut Diagnostics) {
    let Some(rule) = g.rules.get(name) else { return };
    let rule_ast = rule.ast;
    let Some(body) = g.ast.find_child(rule_ast, |k| *k == NodeKind::Block) else {
        return;
    };

    let alts = g.ast.children(body).to_vec();
    let total = alts.len();
    let mut primary_alts = Vec::new();
    let mut op_alts: Vec<(AstId, OpAlt)> = Vec::new();

    for (idx, &alt) in alts.iter().enumerate() {
        match leading_self_ref(g, alt, name) {
            Some(lead) => {
                let lead_node = g.ast.node(lead);
                let precedence = total - idx;
                let assoc = match g.ast.node(alt).option("assoc") {
                    Some("right") => Assoc::Right,
                    _ => Assoc::Left,
                };
                op_alts.push((
                    alt,
                    OpAlt {
                        alt: idx + 1,
                        assoc,
                        precedence,
                        recursed_label: lead_node.label.as_ref().map(|l| l.name.clone()),
                        is_list_label: lead_node.label.as_ref().is_some_and(|l| l.is_list),
                    },
                ));
            }
            None => primary_alts.push(idx + 1),
        }
    }

    if op_alts.is_empty() {
        return;
    }
    if primary_alts.is_empty() {
        // Every alternative recurses; there is nothing to seed the loop.
        diag.report(DiagnosticKind::LeftRecursionCycles, g.ast.node(rule_ast).span)
            .arg(format!("[{name}]"))
            .emit();
        return;
    }

    // Build the rewritten body:
    //   Block( Alt( primaryBlock, Star( opBlock ) ) )
    let primary_block = g.ast.synthesize(NodeKind::Block, "");
    for &idx in &primary_alts {
        let alt = alts[idx - 1];
        g.ast.detach(alt);
        g.ast.add_child(primary_block, alt);
    }

    let op_block = g.ast.synthesize(NodeKind::Block, "");
    for (alt, info) in &op_alts {
        let alt = *alt;
        // Drop the leading self-reference; its label was recorded above.
        let lead = leading_self_ref(g, alt, name).expect("op alt keeps its shape");
        g.ast.detach(lead);
        g.ast
            .set_option(alt, PRECEDENCE_OPTION, info.precedence.to_string());

        // Remaining self-references become precedence-bounded calls.
        let next_prec = match info.assoc {
            Assoc::Left => info.precedence + 1,
            Assoc::Right => info.precedence,
        };
        for n in g.ast.walk(alt) {
            if g.ast.node(n).kind == NodeKind::RuleRef && g.ast.node(n).text == name {
                g.ast
                    .set_option(n, PRECEDENCE_OPTION, next_prec.to_string());
            }
        }

        g.ast.detach(alt);
        g.ast.add_child(op_block, alt);
    }

    let star = g.ast.synthesize(NodeKind::Star { greedy: true }, "");
    g.ast.set_option(star, PRECEDENCE_LOOP_OPTION, "true");
    g.ast.add_child(star, op_block);

    let new_alt = g.ast.synthesize(NodeKind::Alt, "");
    g.ast.add_child(new_alt, primary_block);
    g.ast.add_child(new_alt, star);

    let new_body = g.ast.synthesize(NodeKind::Block, "");
    g.ast.add_child(new_body, new_alt);
    g.ast.replace_child(body, new_body);

    let info = LeftRecursiveInfo {
        primary_alts,
        op_alts: op_alts.into_iter().map(|(_, i)| i).collect(),
    };
    if let Some(rule) = g.rules.get_mut(name) {
        rule.left_recursive = Some(info);
    }
}

/// The leading self-reference of an alternative, skipping non-consuming
/// elements.
fn leading_self_ref(g: &Grammar, alt: AstId, rule_name: &str) -> Option<AstId> {
    for &el in g.ast.children(alt) {
        match g.ast.node(el).kind {
            NodeKind::Action | NodeKind::Predicate => continue,
            NodeKind::RuleRef if g.ast.node(el).text == rule_name => return Some(el),
            _ => return None,
        }
    }
    None
}

/// Detect remaining left-recursion cycles over the leftmost-reference
/// call graph and report each strongly connected cycle once.
pub fn detect_recursion_cycles(g: &Grammar, diag: &mut Diagnostics) {
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for rule in g.rules.values() {
        let mut targets = Vec::new();
        if let Some(body) = g.ast.find_child(rule.ast, |k| *k == NodeKind::Block) {
            for &alt in g.ast.children(body) {
                collect_leading_refs(g, alt, &mut targets);
            }
        }
        graph.insert(rule.name.as_str(), targets);
    }

    let mut reported: Vec<Vec<&str>> = Vec::new();
    for start in g.rules.keys() {
        let start = start.as_str();
        if reported.iter().any(|c| c.contains(&start)) {
            continue;
        }
        if let Some(cycle) = find_cycle(&graph, start) {
            diag.report(
                DiagnosticKind::LeftRecursionCycles,
                g.ast.node(g.rules[cycle[0]].ast).span,
            )
            .arg(format!("[{}]", cycle.join(", ")))
            .emit();
            reported.push(cycle);
        }
    }
}

/// Rules reachable in leftmost position from the start of `alt`.
fn collect_leading_refs<'g>(g: &'g Grammar, alt: AstId, out: &mut Vec<&'g str>) {
    for &el in g.ast.children(alt) {
        let node = g.ast.node(el);
        match node.kind {
            NodeKind::Action | NodeKind::Predicate => continue,
            NodeKind::RuleRef => {
                out.push(node.text.as_str());
                return;
            }
            // A leading sub-block exposes each alternative's own head.
            NodeKind::Block => {
                for &inner in g.ast.children(el) {
                    collect_leading_refs(g, inner, out);
                }
                return;
            }
            _ => return,
        }
    }
}

/// DFS from `start` looking for a path back to `start`.
fn find_cycle<'g>(graph: &HashMap<&'g str, Vec<&'g str>>, start: &'g str) -> Option<Vec<&'g str>> {
    let mut stack = vec![(start, 0usize)];
    let mut path = vec![start];
    let mut visited = std::collections::HashSet::new();
    visited.insert(start);

    while let Some(&(node, next)) = stack.last() {
        let targets = graph.get(node).map(Vec::as_slice).unwrap_or(&[]);
        if next >= targets.len() {
            stack.pop();
            path.pop();
            continue;
        }
        stack.last_mut().expect("stack non-empty").1 += 1;
        let target = targets[next];
        if target == start {
            return Some(path.clone());
        }
        if graph.contains_key(target) && visited.insert(target) {
            stack.push((target, 0));
            path.push(target);
        }
    }
    None
}

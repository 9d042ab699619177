//! Block-set reduction.
//!
//! A decision block whose alternatives are all single terminals (token
//! refs, literals, character ranges, character sets) decides nothing a
//! set transition cannot: collapse it into one `Set` node so the ATN
//! factory emits a single transition instead of a decision.

use gramir_atn::IntervalSet;

use crate::ast::{AstId, GrammarKind, NodeKind, unescape_literal};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::Grammar;

/// Collapse every eligible block in every rule. Reports
/// `CHARACTERS_COLLISION_IN_SET` when merging lexer alternatives whose
/// code points overlap.
pub fn reduce_block_sets(g: &mut Grammar, diag: &mut Diagnostics) {
    let rules: Vec<AstId> = g
        .ast
        .walk(g.root)
        .into_iter()
        .filter(|&n| matches!(g.ast.node(n).kind, NodeKind::Rule { .. }))
        .collect();

    for rule in rules {
        let lexer_rule = g.kind == GrammarKind::Lexer
            || g.ast
                .node(rule)
                .text
                .chars()
                .next()
                .is_some_and(char::is_uppercase);
        // Bottom-up so nested blocks reduce before their parents are
        // considered.
        let mut blocks: Vec<AstId> = g
            .ast
            .walk(rule)
            .into_iter()
            .filter(|&n| g.ast.node(n).kind == NodeKind::Block)
            .collect();
        blocks.reverse();
        for block in blocks {
            try_reduce(g, block, rule, lexer_rule, diag);
        }
    }
}

fn try_reduce(g: &mut Grammar, block: AstId, rule: AstId, lexer_rule: bool, diag: &mut Diagnostics) {
    // The rule's own body block stays: its alternatives number the rule.
    if g.ast.node(block).parent == Some(rule) {
        return;
    }

    let alts = g.ast.children(block).to_vec();
    if alts.len() < 2 {
        return;
    }

    let mut elements = Vec::with_capacity(alts.len());
    for &alt in &alts {
        let node = g.ast.node(alt);
        if node.label.is_some() || node.options.is_some() {
            return;
        }
        let [element] = g.ast.children(alt) else {
            return;
        };
        let el = g.ast.node(*element);
        if el.label.is_some() {
            return;
        }
        let ok = match el.kind {
            NodeKind::TokenRef => !lexer_rule || el.text == "EOF",
            NodeKind::StringLit => {
                // In a lexer, only single-character literals fold into a
                // character set.
                !lexer_rule || unescape_literal(&el.text).chars().count() == 1
            }
            NodeKind::Range | NodeKind::CharSet => lexer_rule,
            _ => false,
        };
        if !ok {
            return;
        }
        elements.push(*element);
    }

    if lexer_rule {
        check_char_collisions(g, block, &elements, diag);
    }

    let span = g.ast.node(block).span;
    let label = g.ast.node(block).label.clone();
    let set = g.ast.synthesize(NodeKind::Set, "");
    g.ast.node_mut(set).span = span;
    g.ast.node_mut(set).label = label;
    for element in elements {
        g.ast.detach(element);
        g.ast.add_child(set, element);
    }
    // The set replaces the block wherever it sat (directly in an
    // alternative or under a quantifier/negation).
    g.ast.replace_child(block, set);
}

/// Union the merged alternatives' code points, warning on overlap.
fn check_char_collisions(g: &Grammar, block: AstId, elements: &[AstId], diag: &mut Diagnostics) {
    let mut seen = IntervalSet::new();
    for &element in elements {
        let el = g.ast.node(element);
        let ranges: Vec<(i32, i32)> = match el.kind {
            NodeKind::StringLit => unescape_literal(&el.text)
                .chars()
                .take(1)
                .map(|c| (c as i32, c as i32))
                .collect(),
            NodeKind::Range => range_bounds(g, element)
                .map(|(a, b)| vec![(a, b)])
                .unwrap_or_default(),
            NodeKind::CharSet => crate::charset::parse_char_set(&el.text)
                .set
                .intervals()
                .iter()
                .map(|iv| (iv.a, iv.b))
                .collect(),
            _ => Vec::new(),
        };
        for (a, b) in ranges {
            if seen.overlap(a, b).is_some() {
                diag.report(
                    DiagnosticKind::CharactersCollisionInSet,
                    g.ast.node(element).span,
                )
                .arg(&el.text)
                .arg(block_text(g, block))
                .emit();
            }
            seen.add_range(a, b);
        }
    }
}

fn range_bounds(g: &Grammar, range: AstId) -> Option<(i32, i32)> {
    let children = g.ast.children(range);
    let [lo, hi] = children else { return None };
    let lo = unescape_literal(&g.ast.node(*lo).text).chars().next()?;
    let hi = unescape_literal(&g.ast.node(*hi).text).chars().next()?;
    Some((lo as i32, hi as i32))
}

fn block_text(g: &Grammar, block: AstId) -> String {
    let parts: Vec<String> = g
        .ast
        .children(block)
        .iter()
        .flat_map(|&alt| g.ast.children(alt))
        .map(|&el| g.ast.node(el).text.clone())
        .collect();
    parts.join(" | ")
}

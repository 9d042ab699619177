//! Tests for the arena AST.

use rowan::{TextRange, TextSize};

use super::{GrammarAst, GrammarKind, NodeKind, unescape_literal};

fn span(a: u32, b: u32) -> TextRange {
    TextRange::new(TextSize::from(a), TextSize::from(b))
}

fn small_tree() -> (GrammarAst, super::AstId, super::AstId) {
    let mut ast = GrammarAst::new();
    let root = ast.add_node(NodeKind::Grammar(GrammarKind::Lexer), span(0, 1), "L");
    let rule = ast.add_node(NodeKind::Rule { is_fragment: false }, span(2, 3), "A");
    let block = ast.add_node(NodeKind::Block, span(4, 5), "");
    ast.add_child(root, rule);
    ast.add_child(rule, block);
    (ast, root, rule)
}

#[test]
fn children_know_their_parent() {
    let (ast, root, rule) = small_tree();
    assert_eq!(ast.node(rule).parent, Some(root));
    assert_eq!(ast.child_index(rule), Some(0));
    assert_eq!(ast.children(root), &[rule]);
}

#[test]
fn detach_and_reattach() {
    let (mut ast, root, rule) = small_tree();
    ast.detach(rule);
    assert!(ast.children(root).is_empty());
    assert_eq!(ast.node(rule).parent, None);

    ast.add_child(root, rule);
    assert_eq!(ast.children(root), &[rule]);
    ast.sanity_check(root).unwrap();
}

#[test]
fn replace_child_keeps_position() {
    let (mut ast, root, rule) = small_tree();
    let other = ast.synthesize(NodeKind::Rule { is_fragment: false }, "B");
    let extra = ast.synthesize(NodeKind::Mode, "M");
    ast.add_child(root, extra);

    ast.replace_child(rule, other);
    assert_eq!(ast.children(root)[0], other);
    assert_eq!(ast.node(other).parent, Some(root));
    assert_eq!(ast.node(rule).parent, None);
    ast.sanity_check(root).unwrap();
}

#[test]
fn copy_subtree_carries_structure_not_atn_links() {
    let (mut src, _, rule) = small_tree();
    src.node_mut(rule).atn_state = Some(7);
    src.set_option(rule, "caseInsensitive", "true");

    let mut dst = GrammarAst::new();
    let copied = dst.copy_subtree(&src, rule);

    assert_eq!(dst.node(copied).text, "A");
    assert_eq!(dst.node(copied).option("caseInsensitive"), Some("true"));
    assert_eq!(dst.node(copied).atn_state, None);
    assert_eq!(dst.children(copied).len(), 1);
    assert_eq!(dst.node(dst.children(copied)[0]).kind, NodeKind::Block);
}

#[test]
fn sanity_check_repairs_parent_links() {
    let (mut ast, root, rule) = small_tree();
    // Corrupt a parent link; the check rebuilds it from child lists.
    ast.node_mut(rule).parent = None;
    ast.sanity_check(root).unwrap();
    assert_eq!(ast.node(rule).parent, Some(root));
}

#[test]
fn walk_is_preorder() {
    let (ast, root, rule) = small_tree();
    let order = ast.walk(root);
    assert_eq!(order[0], root);
    assert_eq!(order[1], rule);
    assert_eq!(order.len(), 3);
}

#[test]
fn ancestor_search() {
    let (ast, root, rule) = small_tree();
    let block = ast.children(rule)[0];
    let found = ast.ancestor(block, |k| matches!(k, NodeKind::Grammar(_)));
    assert_eq!(found, Some(root));
}

#[test]
fn literal_unescaping() {
    assert_eq!(unescape_literal("'if'"), "if");
    assert_eq!(unescape_literal(r"'\n\t'"), "\n\t");
    assert_eq!(unescape_literal(r"'\''"), "'");
    assert_eq!(unescape_literal(r"'A'"), "A");
    assert_eq!(unescape_literal("''"), "");
}

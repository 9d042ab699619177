//! Implicit-lexer extraction for combined grammars.
//!
//! Produces a new lexer grammar named `<Name>Lexer` holding the combined
//! grammar's lexer rules, lexer-scoped actions, eligible options, and a
//! synthesized `T__<n>` rule for every string literal the parser rules
//! reference that no lexer rule already aliases.

use indexmap::IndexSet;

use crate::ast::{AstId, GrammarAst, GrammarKind, NodeKind};
use crate::grammar::Grammar;

/// Options that never propagate from a combined grammar to its lexer.
const LEXER_OPTION_BLACKLIST: &[&str] = &["superClass", "TokenLabelType", "tokenVocab"];

/// Split the lexer out of a combined grammar.
///
/// Lexer rules are moved (removed from the combined AST); named actions
/// are copied. Returns `None` when the extracted rule list would be
/// empty.
pub fn extract_implicit_lexer(g: &mut Grammar) -> Option<Grammar> {
    if !g.is_combined() {
        return None;
    }

    let mut ast = GrammarAst::new();
    let name = format!("{}Lexer", g.name);
    let root = ast.synthesize(NodeKind::Grammar(GrammarKind::Lexer), name.clone());

    // Eligible options propagate; the blacklist stays behind.
    if let Some(options) = g.ast.node(g.root).options.clone() {
        for (key, value) in options {
            if !LEXER_OPTION_BLACKLIST.contains(&key.as_str()) {
                ast.set_option(root, key, value);
            }
        }
    }

    // All named actions are copied; lexer-scoped ones are moved.
    let actions: Vec<AstId> = g
        .ast
        .children_where(g.root, |k| *k == NodeKind::NamedAction)
        .collect();
    for action in actions {
        let copied = ast.copy_subtree(&g.ast, action);
        ast.add_child(root, copied);
        let scope = g
            .ast
            .find_child(action, |k| *k == NodeKind::Name)
            .map(|s| g.ast.node(s).text.clone());
        if scope.as_deref() == Some("lexer") {
            g.ast.detach(action);
        }
    }

    // Literals the parser rules reference, in order of appearance.
    let parser_literals = collect_parser_literals(&g.ast, g.root);

    // Lexer rules move wholesale.
    let lexer_rules: Vec<AstId> = g
        .ast
        .children_where(g.root, |k| matches!(k, NodeKind::Rule { .. }))
        .filter(|&r| is_lexer_rule(&g.ast, r))
        .collect();

    // A literal with an existing alias rule needs no synthesized rule.
    let mut aliased: IndexSet<String> = IndexSet::new();
    for &r in &lexer_rules {
        if let Some(lit) = literal_alias_of(&g.ast, r) {
            aliased.insert(lit);
        }
    }

    let mut rule_count = 0usize;
    for literal in parser_literals {
        if aliased.contains(&literal) {
            continue;
        }
        let rule_name = g.next_synthetic_rule_name();
        synthesize_literal_rule(&mut ast, root, &rule_name, &literal);
        aliased.insert(literal);
        rule_count += 1;
    }

    for r in lexer_rules {
        let copied = ast.copy_subtree(&g.ast, r);
        ast.add_child(root, copied);
        g.ast.detach(r);
        rule_count += 1;
    }

    if rule_count == 0 {
        return None;
    }

    let mut lexer = Grammar::new(name, GrammarKind::Lexer, ast, root);
    lexer.file_name = g.file_name.clone();
    Some(lexer)
}

/// `T__<n> : 'literal' ;`
fn synthesize_literal_rule(ast: &mut GrammarAst, root: AstId, name: &str, literal: &str) {
    let rule = ast.synthesize(NodeKind::Rule { is_fragment: false }, name);
    let block = ast.synthesize(NodeKind::Block, "");
    let alt = ast.synthesize(NodeKind::Alt, "");
    let lit = ast.synthesize(NodeKind::StringLit, literal);
    ast.add_child(alt, lit);
    ast.add_child(block, alt);
    ast.add_child(rule, block);
    ast.add_child(root, rule);
}

fn is_lexer_rule(ast: &GrammarAst, rule: AstId) -> bool {
    let node = ast.node(rule);
    matches!(node.kind, NodeKind::Rule { is_fragment: true })
        || node.text.chars().next().is_some_and(char::is_uppercase)
}

/// String literals referenced from parser rules, in order of appearance.
fn collect_parser_literals(ast: &GrammarAst, root: AstId) -> Vec<String> {
    let mut out: IndexSet<String> = IndexSet::new();
    for rule in ast.children_where(root, |k| matches!(k, NodeKind::Rule { .. })) {
        if is_lexer_rule(ast, rule) {
            continue;
        }
        for n in ast.walk(rule) {
            if ast.node(n).kind == NodeKind::StringLit {
                out.insert(ast.node(n).text.clone());
            }
        }
    }
    out.into_iter().collect()
}

/// If the rule is a literal alias (`X : 'lit' ;`), the aliased literal.
pub(crate) fn literal_alias_of(ast: &GrammarAst, rule: AstId) -> Option<String> {
    let block = ast.find_child(rule, |k| *k == NodeKind::Block)?;
    let [alt] = ast.children(block) else {
        return None;
    };
    let [lit] = ast.children(*alt) else {
        return None;
    };
    // A rule with commands is not a plain alias.
    if ast
        .find_child(rule, |k| *k == NodeKind::LexerCommand)
        .is_some()
    {
        return None;
    }
    (ast.node(*lit).kind == NodeKind::StringLit).then(|| ast.node(*lit).text.clone())
}

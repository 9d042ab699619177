//! Test utilities: pipeline shortcuts and dump helpers.

use std::fmt::Write;

use crate::ast::{AstId, GrammarAst, NodeKind};
use crate::{GrammarBuilder, ParsedGrammar, ProcessedGrammar};

/// Parse a grammar, panicking on fatal errors.
pub fn parse(src: &str) -> ParsedGrammar {
    GrammarBuilder::new(src).parse().expect("grammar parses")
}

/// Run the whole pipeline.
pub fn process(src: &str) -> ProcessedGrammar {
    parse(src).process()
}

/// Run the pipeline and dump the diagnostics, one line per issue.
pub fn diagnostics_of(src: &str) -> String {
    process(src).diagnostics().dump()
}

/// Indented kind/text dump of an AST subtree.
pub fn dump_ast(ast: &GrammarAst, root: AstId) -> String {
    let mut out = String::new();
    dump_node(ast, root, 0, &mut out);
    out
}

fn dump_node(ast: &GrammarAst, id: AstId, depth: usize, out: &mut String) {
    let node = ast.node(id);
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(kind_name(&node.kind));
    if !node.text.is_empty() {
        write!(out, " {}", node.text).unwrap();
    }
    if let Some(label) = &node.label {
        let op = if label.is_list { "+=" } else { "=" };
        write!(out, " [{}{}]", label.name, op).unwrap();
    }
    out.push('\n');
    for &child in ast.children(id) {
        dump_node(ast, child, depth + 1, out);
    }
}

fn kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Grammar(crate::ast::GrammarKind::Lexer) => "Grammar(lexer)",
        NodeKind::Grammar(crate::ast::GrammarKind::Parser) => "Grammar(parser)",
        NodeKind::Grammar(crate::ast::GrammarKind::Combined) => "Grammar(combined)",
        NodeKind::Options => "Options",
        NodeKind::OptionDef => "OptionDef",
        NodeKind::Tokens => "Tokens",
        NodeKind::Channels => "Channels",
        NodeKind::Import => "Import",
        NodeKind::NamedAction => "NamedAction",
        NodeKind::Mode => "Mode",
        NodeKind::Rule { is_fragment: true } => "FragmentRule",
        NodeKind::Rule { is_fragment: false } => "Rule",
        NodeKind::Args => "Args",
        NodeKind::Returns => "Returns",
        NodeKind::Locals => "Locals",
        NodeKind::Block => "Block",
        NodeKind::Alt => "Alt",
        NodeKind::TokenRef => "TokenRef",
        NodeKind::RuleRef => "RuleRef",
        NodeKind::StringLit => "StringLit",
        NodeKind::Range => "Range",
        NodeKind::CharSet => "CharSet",
        NodeKind::Set => "Set",
        NodeKind::Not => "Not",
        NodeKind::Wildcard => "Wildcard",
        NodeKind::Optional { greedy: true } => "Optional",
        NodeKind::Optional { greedy: false } => "Optional(lazy)",
        NodeKind::Star { greedy: true } => "Star",
        NodeKind::Star { greedy: false } => "Star(lazy)",
        NodeKind::Plus { greedy: true } => "Plus",
        NodeKind::Plus { greedy: false } => "Plus(lazy)",
        NodeKind::Action => "Action",
        NodeKind::Predicate => "Predicate",
        NodeKind::LexerCommand => "LexerCommand",
        NodeKind::Name => "Name",
    }
}

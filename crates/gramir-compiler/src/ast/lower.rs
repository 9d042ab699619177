//! CST → arena AST lowering.
//!
//! Keeps spans and raw text; structure normalizes into the `NodeKind`
//! shapes the transform and semantic pipelines expect. Error nodes in the
//! CST are dropped - the parser already reported them.

use rowan::TextRange;

use super::{AstId, GrammarAst, GrammarKind, Label, NodeKind};
use crate::parser::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Lower a parsed grammar file. Returns the arena and its root node.
pub fn lower(root: &SyntaxNode) -> (GrammarAst, AstId) {
    let mut ast = GrammarAst::new();

    let (kind, name, name_span) = grammar_header(root);
    let g = ast.add_node(NodeKind::Grammar(kind), name_span, name);

    for child in root.children() {
        match child.kind() {
            SyntaxKind::OptionsSpec => {
                let opts = lower_options(&mut ast, &child, g);
                ast.add_child(g, opts);
            }
            SyntaxKind::TokensSpec => {
                let n = lower_name_section(&mut ast, &child, NodeKind::Tokens, NodeKind::TokenRef);
                ast.add_child(g, n);
            }
            SyntaxKind::ChannelsSpec => {
                let n = lower_name_section(&mut ast, &child, NodeKind::Channels, NodeKind::Name);
                ast.add_child(g, n);
            }
            SyntaxKind::ImportSpec => {
                let n = lower_name_section(&mut ast, &child, NodeKind::Import, NodeKind::Name);
                ast.add_child(g, n);
            }
            SyntaxKind::NamedAction => {
                let n = lower_named_action(&mut ast, &child);
                ast.add_child(g, n);
            }
            SyntaxKind::ParserRule | SyntaxKind::LexerRule => {
                let n = lower_rule(&mut ast, &child);
                ast.add_child(g, n);
            }
            SyntaxKind::ModeSpec => {
                let n = lower_mode(&mut ast, &child);
                ast.add_child(g, n);
            }
            _ => {}
        }
    }

    (ast, g)
}

fn grammar_header(root: &SyntaxNode) -> (GrammarKind, String, TextRange) {
    let Some(decl) = root
        .children()
        .find(|c| c.kind() == SyntaxKind::GrammarDecl)
    else {
        return (GrammarKind::Combined, String::new(), root.text_range());
    };

    let mut kind = GrammarKind::Combined;
    let mut name = String::new();
    let mut span = decl.text_range();
    for el in decl.children_with_tokens() {
        let Some(tok) = el.into_token() else { continue };
        match tok.kind() {
            SyntaxKind::KwLexer => kind = GrammarKind::Lexer,
            SyntaxKind::KwParser => kind = GrammarKind::Parser,
            SyntaxKind::Ident => {
                name = tok.text().to_owned();
                span = tok.text_range();
            }
            _ => {}
        }
    }
    (kind, name, span)
}

/// Lower an `options {...}` section: builds an `Options` node with
/// `OptionDef` children and mirrors the pairs into `owner`'s option map.
fn lower_options(ast: &mut GrammarAst, cst: &SyntaxNode, owner: AstId) -> AstId {
    let opts = ast.add_node(NodeKind::Options, cst.text_range(), "");
    for def in cst.children() {
        if def.kind() != SyntaxKind::OptionDef {
            continue;
        }
        let mut name: Option<SyntaxToken> = None;
        let mut value: Option<SyntaxToken> = None;
        for el in def.children_with_tokens() {
            let Some(tok) = el.into_token() else { continue };
            match tok.kind() {
                k if k.is_ident_like() || k == SyntaxKind::StringLiteral || k == SyntaxKind::Int => {
                    if name.is_none() {
                        name = Some(tok);
                    } else if value.is_none() {
                        value = Some(tok);
                    }
                }
                _ => {}
            }
        }
        let Some(name) = name else { continue };
        let value_text = value.map(|t| t.text().to_owned()).unwrap_or_default();
        let def_id = ast.add_node(NodeKind::OptionDef, name.text_range(), name.text());
        let val_id = ast.synthesize(NodeKind::Name, value_text.clone());
        ast.add_child(def_id, val_id);
        ast.add_child(opts, def_id);
        ast.set_option(owner, name.text(), value_text);
    }
    opts
}

fn lower_name_section(
    ast: &mut GrammarAst,
    cst: &SyntaxNode,
    section: NodeKind,
    entry: NodeKind,
) -> AstId {
    let n = ast.add_node(section, cst.text_range(), "");
    for el in cst.children_with_tokens() {
        let Some(tok) = el.into_token() else { continue };
        if tok.kind() == SyntaxKind::Ident {
            let child = ast.add_node(entry, tok.text_range(), tok.text());
            ast.add_child(n, child);
        }
    }
    n
}

fn lower_named_action(ast: &mut GrammarAst, cst: &SyntaxNode) -> AstId {
    let mut idents: Vec<SyntaxToken> = Vec::new();
    let mut body: Option<SyntaxToken> = None;
    for el in cst.children_with_tokens() {
        let Some(tok) = el.into_token() else { continue };
        match tok.kind() {
            SyntaxKind::Action => body = Some(tok),
            k if k.is_ident_like() => idents.push(tok),
            _ => {}
        }
    }

    let (scope, name) = match idents.len() {
        0 => (None, None),
        1 => (None, Some(idents.remove(0))),
        _ => {
            let name = idents.pop();
            (Some(idents.remove(0)), name)
        }
    };

    let span = name
        .as_ref()
        .map_or(cst.text_range(), SyntaxToken::text_range);
    let n = ast.add_node(
        NodeKind::NamedAction,
        span,
        name.map(|t| t.text().to_owned()).unwrap_or_default(),
    );
    if let Some(scope) = scope {
        let s = ast.add_node(NodeKind::Name, scope.text_range(), scope.text());
        ast.add_child(n, s);
    }
    if let Some(body) = body {
        let b = ast.add_node(
            NodeKind::Action,
            body.text_range(),
            action_body(body.text()),
        );
        ast.add_child(n, b);
    }
    n
}

fn lower_mode(ast: &mut GrammarAst, cst: &SyntaxNode) -> AstId {
    let name = first_ident(cst);
    let span = name
        .as_ref()
        .map_or(cst.text_range(), SyntaxToken::text_range);
    let m = ast.add_node(
        NodeKind::Mode,
        span,
        name.map(|t| t.text().to_owned()).unwrap_or_default(),
    );
    for child in cst.children() {
        if matches!(child.kind(), SyntaxKind::LexerRule | SyntaxKind::ParserRule) {
            let r = lower_rule(ast, &child);
            ast.add_child(m, r);
        }
    }
    m
}

fn lower_rule(ast: &mut GrammarAst, cst: &SyntaxNode) -> AstId {
    let is_fragment = cst
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .any(|t| t.kind() == SyntaxKind::KwFragment);
    let name = first_ident(cst);
    let span = name
        .as_ref()
        .map_or(cst.text_range(), SyntaxToken::text_range);
    let rule = ast.add_node(
        NodeKind::Rule { is_fragment },
        span,
        name.map(|t| t.text().to_owned()).unwrap_or_default(),
    );

    let mut commands: Vec<AstId> = Vec::new();
    for child in cst.children() {
        match child.kind() {
            SyntaxKind::ArgsSpec => {
                let n = lower_bracket_decl(ast, &child, NodeKind::Args);
                ast.add_child(rule, n);
            }
            SyntaxKind::ReturnsSpec => {
                let n = lower_bracket_decl(ast, &child, NodeKind::Returns);
                ast.add_child(rule, n);
            }
            SyntaxKind::LocalsSpec => {
                let n = lower_bracket_decl(ast, &child, NodeKind::Locals);
                ast.add_child(rule, n);
            }
            SyntaxKind::OptionsSpec => {
                let n = lower_options(ast, &child, rule);
                ast.add_child(rule, n);
            }
            SyntaxKind::RuleBlock => {
                let n = lower_block(ast, &child, &mut commands);
                ast.add_child(rule, n);
            }
            _ => {}
        }
    }
    for c in commands {
        ast.add_child(rule, c);
    }
    rule
}

fn lower_bracket_decl(ast: &mut GrammarAst, cst: &SyntaxNode, kind: NodeKind) -> AstId {
    let text = cst
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .find(|t| t.kind() == SyntaxKind::BracketBlock)
        .map(|t| bracket_body(t.text()))
        .unwrap_or_default();
    ast.add_node(kind, cst.text_range(), text)
}

fn lower_block(ast: &mut GrammarAst, cst: &SyntaxNode, commands: &mut Vec<AstId>) -> AstId {
    let block = ast.add_node(NodeKind::Block, cst.text_range(), "");
    for alt in cst.children() {
        if alt.kind() != SyntaxKind::Alt {
            continue;
        }
        let a = lower_alt(ast, &alt, commands);
        ast.add_child(block, a);
    }
    block
}

fn lower_alt(ast: &mut GrammarAst, cst: &SyntaxNode, commands: &mut Vec<AstId>) -> AstId {
    let alt = ast.add_node(NodeKind::Alt, cst.text_range(), "");
    for el in cst.children() {
        match el.kind() {
            SyntaxKind::AltLabel => {
                if let Some(tok) = first_ident(&el) {
                    ast.node_mut(alt).label = Some(Label {
                        name: tok.text().to_owned(),
                        is_list: false,
                        span: tok.text_range(),
                    });
                }
            }
            SyntaxKind::LexerCommands => {
                for cmd in el.children() {
                    if cmd.kind() == SyntaxKind::LexerCommand {
                        let c = lower_lexer_command(ast, &cmd);
                        commands.push(c);
                    }
                }
            }
            SyntaxKind::ElementOptions => lower_element_options(ast, &el, alt),
            _ => {
                if let Some(n) = lower_element(ast, &el, commands) {
                    ast.add_child(alt, n);
                }
            }
        }
    }
    alt
}

fn lower_element(
    ast: &mut GrammarAst,
    cst: &SyntaxNode,
    commands: &mut Vec<AstId>,
) -> Option<AstId> {
    match cst.kind() {
        SyntaxKind::Labeled => {
            let label = first_ident(cst);
            let is_list = cst
                .children_with_tokens()
                .filter_map(|el| el.into_token())
                .any(|t| t.kind() == SyntaxKind::PlusEquals);
            let inner = cst
                .children()
                .find_map(|c| lower_element(ast, &c, commands))?;
            if let Some(tok) = label {
                ast.node_mut(inner).label = Some(Label {
                    name: tok.text().to_owned(),
                    is_list,
                    span: tok.text_range(),
                });
            }
            Some(inner)
        }
        SyntaxKind::Ebnf => {
            let quantifier = cst
                .children_with_tokens()
                .filter_map(|el| el.into_token())
                .find_map(|t| quantifier_kind(t.kind()))?;
            let n = ast.add_node(quantifier, cst.text_range(), "");
            if let Some(inner) = cst
                .children()
                .find_map(|c| lower_element(ast, &c, commands))
            {
                ast.add_child(n, inner);
            }
            Some(n)
        }
        SyntaxKind::Block => {
            let inner = cst
                .children()
                .find(|c| c.kind() == SyntaxKind::RuleBlock)?;
            Some(lower_block(ast, &inner, commands))
        }
        SyntaxKind::NotExpr => {
            let n = ast.add_node(NodeKind::Not, cst.text_range(), "");
            if let Some(inner) = cst
                .children()
                .find_map(|c| lower_element(ast, &c, commands))
            {
                ast.add_child(n, inner);
            }
            Some(n)
        }
        SyntaxKind::RangeExpr => {
            let n = ast.add_node(NodeKind::Range, cst.text_range(), "");
            for el in cst.children_with_tokens() {
                let Some(tok) = el.into_token() else { continue };
                if tok.kind() == SyntaxKind::StringLiteral {
                    let lit = ast.add_node(NodeKind::StringLit, tok.text_range(), tok.text());
                    ast.add_child(n, lit);
                }
            }
            Some(n)
        }
        SyntaxKind::Atom => lower_atom(ast, cst),
        SyntaxKind::ActionExpr | SyntaxKind::PredicateExpr => {
            let kind = if cst.kind() == SyntaxKind::PredicateExpr {
                NodeKind::Predicate
            } else {
                NodeKind::Action
            };
            let body = cst
                .children_with_tokens()
                .filter_map(|el| el.into_token())
                .find(|t| t.kind() == SyntaxKind::Action)
                .map(|t| action_body(t.text()))
                .unwrap_or_default();
            Some(ast.add_node(kind, cst.text_range(), body))
        }
        _ => None,
    }
}

fn lower_atom(ast: &mut GrammarAst, cst: &SyntaxNode) -> Option<AstId> {
    let mut produced: Option<AstId> = None;
    for el in cst.children_with_tokens() {
        match el {
            rowan::NodeOrToken::Token(tok) => match tok.kind() {
                SyntaxKind::Ident => {
                    let uppercase = tok.text().chars().next().is_some_and(char::is_uppercase);
                    let kind = if uppercase {
                        NodeKind::TokenRef
                    } else {
                        NodeKind::RuleRef
                    };
                    produced = Some(ast.add_node(kind, tok.text_range(), tok.text()));
                }
                SyntaxKind::StringLiteral => {
                    produced = Some(ast.add_node(
                        NodeKind::StringLit,
                        tok.text_range(),
                        tok.text(),
                    ));
                }
                SyntaxKind::BracketBlock => {
                    produced = Some(ast.add_node(NodeKind::CharSet, tok.text_range(), tok.text()));
                }
                SyntaxKind::Dot => {
                    produced = Some(ast.add_node(NodeKind::Wildcard, tok.text_range(), "."));
                }
                _ => {}
            },
            rowan::NodeOrToken::Node(node) => match node.kind() {
                SyntaxKind::ElementOptions => {
                    if let Some(p) = produced {
                        lower_element_options(ast, &node, p);
                    }
                }
                SyntaxKind::ArgsSpec => {
                    if let Some(p) = produced {
                        let args = lower_bracket_decl(ast, &node, NodeKind::Args);
                        ast.add_child(p, args);
                    }
                }
                _ => {}
            },
        }
    }
    produced
}

fn lower_element_options(ast: &mut GrammarAst, cst: &SyntaxNode, owner: AstId) {
    for opt in cst.children() {
        if opt.kind() != SyntaxKind::ElementOption {
            continue;
        }
        let mut name: Option<String> = None;
        let mut value = String::new();
        for el in opt.children_with_tokens() {
            let Some(tok) = el.into_token() else { continue };
            match tok.kind() {
                SyntaxKind::Equals => {}
                k if k.is_ident_like()
                    || k == SyntaxKind::StringLiteral
                    || k == SyntaxKind::Int =>
                {
                    if name.is_none() {
                        name = Some(tok.text().to_owned());
                    } else {
                        value = tok.text().to_owned();
                    }
                }
                _ => {}
            }
        }
        if let Some(name) = name {
            ast.set_option(owner, name, value);
        }
    }
}

fn lower_lexer_command(ast: &mut GrammarAst, cst: &SyntaxNode) -> AstId {
    let mut tokens = cst
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(|t| t.kind().is_ident_like() || t.kind() == SyntaxKind::Int);
    let name = tokens.next();
    let arg = tokens.next();

    let span = name
        .as_ref()
        .map_or(cst.text_range(), SyntaxToken::text_range);
    let cmd = ast.add_node(
        NodeKind::LexerCommand,
        span,
        name.map(|t| t.text().to_owned()).unwrap_or_default(),
    );
    if let Some(arg) = arg {
        let a = ast.add_node(NodeKind::Name, arg.text_range(), arg.text());
        ast.add_child(cmd, a);
    }
    cmd
}

fn quantifier_kind(kind: SyntaxKind) -> Option<NodeKind> {
    Some(match kind {
        SyntaxKind::Star => NodeKind::Star { greedy: true },
        SyntaxKind::StarQuestion => NodeKind::Star { greedy: false },
        SyntaxKind::Plus => NodeKind::Plus { greedy: true },
        SyntaxKind::PlusQuestion => NodeKind::Plus { greedy: false },
        SyntaxKind::Question => NodeKind::Optional { greedy: true },
        SyntaxKind::QuestionQuestion => NodeKind::Optional { greedy: false },
        _ => return None,
    })
}

fn first_ident(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|el| el.into_token())
        .find(|t| t.kind() == SyntaxKind::Ident)
}

fn action_body(text: &str) -> String {
    text.strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(text)
        .trim()
        .to_owned()
}

fn bracket_body(text: &str) -> String {
    text.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(text)
        .trim()
        .to_owned()
}

//! Mutable grammar AST.
//!
//! The CST produced by the parser is immutable; the transform pipeline
//! restructures trees (import merging, implicit-lexer extraction, set
//! reduction, left-recursion rewrites). This module provides the arena
//! form those passes work on: nodes stored in a flat vector, referenced by
//! `AstId`, with parent back-links kept consistent through the edit
//! helpers and re-checkable via [`GrammarAst::sanity_check`].

mod lower;

#[cfg(test)]
mod ast_tests;

use indexmap::IndexMap;
use rowan::{TextRange, TextSize};

pub use lower::lower;

/// Index into `GrammarAst::nodes`.
pub type AstId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarKind {
    Lexer,
    Parser,
    Combined,
}

impl std::fmt::Display for GrammarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GrammarKind::Lexer => "lexer",
            GrammarKind::Parser => "parser",
            GrammarKind::Combined => "combined",
        };
        f.write_str(s)
    }
}

/// Node kinds. Most payload lives in the node's `text` and children; the
/// few flags that distinguish construction variants ride on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Root; `text` is the grammar name.
    Grammar(GrammarKind),
    /// `options {...}` section; children are `OptionDef`s.
    Options,
    /// One option; `text` is the name, single child is the value.
    OptionDef,
    /// `tokens {...}` section; children are `TokenRef`s.
    Tokens,
    /// `channels {...}` section; children are `Name`s.
    Channels,
    /// `import a, b;` section; children are `Name`s.
    Import,
    /// `@scope::name {...}`; `text` is the name, children are an optional
    /// scope `Name` followed by the `Action` body.
    NamedAction,
    /// `mode M;` section; `text` is the mode name, children are rules.
    Mode,
    /// A rule; `text` is the rule name. Children: optional `Args`,
    /// `Returns`, `Locals`, then the body `Block`, then any
    /// `LexerCommand`s.
    Rule { is_fragment: bool },
    /// `[...]` parameter declarations (or call arguments on a `RuleRef`).
    Args,
    Returns,
    Locals,
    /// Alternative block; children are `Alt`s.
    Block,
    /// One alternative; children are elements.
    Alt,
    /// Uppercase reference; `text` is the token name.
    TokenRef,
    /// Lowercase reference; `text` is the rule name.
    RuleRef,
    /// `'...'` with quotes and escapes intact in `text`.
    StringLit,
    /// `'a'..'z'`; children are the two `StringLit` bounds.
    Range,
    /// `[...]` lexer character set; raw text in `text`.
    CharSet,
    /// Synthesized set of alternatives (block-set reduction); children
    /// are `TokenRef` / `StringLit` / `Range` / `CharSet` elements.
    Set,
    /// `~x`; single child.
    Not,
    /// `.`
    Wildcard,
    Optional { greedy: bool },
    Star { greedy: bool },
    Plus { greedy: bool },
    /// `{...}` action; body text without braces.
    Action,
    /// `{...}?` predicate; body text without braces.
    Predicate,
    /// `-> name(arg)`; `text` is the command name, optional `Name` child
    /// is the argument.
    LexerCommand,
    /// Bare identifier.
    Name,
}

/// Element or alternative label (`x=`, `x+=`, `# AltName`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub is_list: bool,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: NodeKind,
    pub span: TextRange,
    pub text: String,
    pub children: Vec<AstId>,
    pub parent: Option<AstId>,
    /// Options attached to this node (`options {...}` on grammars, rules,
    /// and blocks; `<k=v>` element options on references).
    pub options: Option<IndexMap<String, String>>,
    pub label: Option<Label>,
    /// Filled during ATN construction.
    pub atn_state: Option<gramir_atn::StateId>,
}

impl AstNode {
    fn new(kind: NodeKind, span: TextRange, text: String) -> Self {
        Self {
            kind,
            span,
            text,
            children: Vec::new(),
            parent: None,
            options: None,
            label: None,
            atn_state: None,
        }
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.as_ref()?.get(name).map(String::as_str)
    }
}

/// Arena of AST nodes for one grammar.
#[derive(Debug, Clone, Default)]
pub struct GrammarAst {
    nodes: Vec<AstNode>,
}

impl GrammarAst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, kind: NodeKind, span: TextRange, text: impl Into<String>) -> AstId {
        let id = self.nodes.len() as AstId;
        self.nodes.push(AstNode::new(kind, span, text.into()));
        id
    }

    /// Add a node with no source location (synthesized by transforms).
    pub fn synthesize(&mut self, kind: NodeKind, text: impl Into<String>) -> AstId {
        self.add_node(kind, TextRange::empty(TextSize::from(0)), text)
    }

    pub fn node(&self, id: AstId) -> &AstNode {
        &self.nodes[id as usize]
    }

    pub fn node_mut(&mut self, id: AstId) -> &mut AstNode {
        &mut self.nodes[id as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_child(&mut self, parent: AstId, child: AstId) {
        self.nodes[child as usize].parent = Some(parent);
        self.nodes[parent as usize].children.push(child);
    }

    pub fn insert_child(&mut self, parent: AstId, index: usize, child: AstId) {
        self.nodes[child as usize].parent = Some(parent);
        self.nodes[parent as usize].children.insert(index, child);
    }

    /// Detach `child` from its parent, keeping the subtree alive in the
    /// arena for re-attachment elsewhere.
    pub fn detach(&mut self, child: AstId) {
        if let Some(parent) = self.nodes[child as usize].parent.take() {
            self.nodes[parent as usize].children.retain(|&c| c != child);
        }
    }

    /// Replace `old` with `new` in `old`'s parent, preserving position.
    pub fn replace_child(&mut self, old: AstId, new: AstId) {
        let parent = self.nodes[old as usize]
            .parent
            .expect("replace_child on detached node");
        let idx = self.child_index(old).expect("child not under its parent");
        self.nodes[parent as usize].children[idx] = new;
        self.nodes[new as usize].parent = Some(parent);
        self.nodes[old as usize].parent = None;
    }

    /// Position of `child` in its parent's child list.
    pub fn child_index(&self, child: AstId) -> Option<usize> {
        let parent = self.nodes[child as usize].parent?;
        self.nodes[parent as usize]
            .children
            .iter()
            .position(|&c| c == child)
    }

    pub fn children(&self, id: AstId) -> &[AstId] {
        &self.nodes[id as usize].children
    }

    /// Children of `id` with the given kind predicate.
    pub fn children_where<'a>(
        &'a self,
        id: AstId,
        pred: impl Fn(&NodeKind) -> bool + 'a,
    ) -> impl Iterator<Item = AstId> + 'a {
        self.nodes[id as usize]
            .children
            .iter()
            .copied()
            .filter(move |&c| pred(&self.nodes[c as usize].kind))
    }

    /// First child with the given kind predicate.
    pub fn find_child(&self, id: AstId, pred: impl Fn(&NodeKind) -> bool) -> Option<AstId> {
        self.nodes[id as usize]
            .children
            .iter()
            .copied()
            .find(|&c| pred(&self.nodes[c as usize].kind))
    }

    pub fn set_option(&mut self, id: AstId, name: impl Into<String>, value: impl Into<String>) {
        self.nodes[id as usize]
            .options
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
    }

    /// Preorder walk of the subtree rooted at `id`.
    pub fn walk(&self, id: AstId) -> Vec<AstId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for &c in self.nodes[n as usize].children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Nearest ancestor (including `id`) satisfying the predicate.
    pub fn ancestor(&self, id: AstId, pred: impl Fn(&NodeKind) -> bool) -> Option<AstId> {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if pred(&self.nodes[n as usize].kind) {
                return Some(n);
            }
            cur = self.nodes[n as usize].parent;
        }
        None
    }

    /// Copy the subtree rooted at `src_id` in `src` into this arena,
    /// returning the new root. The copy is detached; spans, text, options,
    /// and labels carry over, ATN associations do not.
    pub fn copy_subtree(&mut self, src: &GrammarAst, src_id: AstId) -> AstId {
        let src_node = src.node(src_id);
        let id = self.add_node(src_node.kind, src_node.span, src_node.text.clone());
        self.nodes[id as usize].options = src_node.options.clone();
        self.nodes[id as usize].label = src_node.label.clone();
        for &child in &src_node.children {
            let copied = self.copy_subtree(src, child);
            self.add_child(id, copied);
        }
        id
    }

    /// Rebuild parent links from the child lists of the subtree under
    /// `root`, then verify global consistency: every reachable child knows
    /// its parent and sits at the index its parent believes.
    pub fn sanity_check(&mut self, root: AstId) -> Result<(), String> {
        for n in self.walk(root) {
            let children: Vec<AstId> = self.nodes[n as usize].children.clone();
            for c in children {
                self.nodes[c as usize].parent = Some(n);
            }
        }
        for n in self.walk(root) {
            if n == root {
                continue;
            }
            let Some(parent) = self.nodes[n as usize].parent else {
                return Err(format!("node {n} reachable but unparented"));
            };
            if !self.nodes[parent as usize].children.contains(&n) {
                return Err(format!("node {n} not listed under its parent {parent}"));
            }
        }
        Ok(())
    }
}

/// Decode a quoted literal (`'if'`) into its character sequence.
///
/// Handles `\n \r \t \f \b \\ \' \u{XXXX}`-less ANTLR-style `\uXXXX`
/// escapes. Unknown escapes keep the escaped character.
pub fn unescape_literal(raw: &str) -> String {
    let body = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\x0C'),
            Some('b') => out.push('\x08'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => out.push_str(&hex),
                }
            }
            Some(other) => out.push(other),
            None => break,
        }
    }
    out
}

//! The grammar object: rule table, token and channel symbol tables,
//! named actions, predicate/action side tables.
//!
//! Symbol tables mutate only during the semantic pipeline; afterwards
//! analysis and code generation read them.

mod attr;


use indexmap::IndexMap;

use gramir_atn::{Atn, IntervalSet, MIN_USER_TOKEN_TYPE, TOKEN_EOF, TOKEN_INVALID_TYPE};

use crate::ast::{AstId, GrammarAst, GrammarKind, NodeKind};

pub use attr::{Attribute, AttributeDict, LabelDef, LabelType, parse_attribute_defs};

/// Token channel every token lands on unless redirected.
pub const DEFAULT_TOKEN_CHANNEL: i32 = 0;

/// Predefined hidden channel.
pub const HIDDEN_CHANNEL: i32 = 1;

/// First channel number available to user-declared channels.
pub const MIN_USER_CHANNEL_VALUE: i32 = 2;

/// The implicit lexer mode every lexer grammar starts in.
pub const DEFAULT_MODE_NAME: &str = "DEFAULT_MODE";

/// Names reserved by the runtime; rules, channels, and modes may not
/// shadow them.
pub const COMMON_CONSTANTS: &[&str] = &[
    "HIDDEN",
    "SKIP",
    "MORE",
    "DEFAULT_TOKEN_CHANNEL",
    "DEFAULT_MODE",
    "EOF",
    "MAX_CHAR_VALUE",
    "MIN_CHAR_VALUE",
];

/// Prefix of token rules synthesized for parser string literals.
pub const SYNTHETIC_RULE_PREFIX: &str = "T__";

/// Operator associativity recorded for a rewritten left-recursive
/// alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    #[default]
    Left,
    Right,
}

/// One operator alternative of a rewritten left-recursive rule.
#[derive(Debug, Clone)]
pub struct OpAlt {
    /// Original 1-based alternative number.
    pub alt: usize,
    pub assoc: Assoc,
    pub precedence: usize,
    /// Label carried by the discarded leading self-reference, so later
    /// stages can reattach it.
    pub recursed_label: Option<String>,
    pub is_list_label: bool,
}

/// Precomputed alternative split for a left-recursive rule.
#[derive(Debug, Clone, Default)]
pub struct LeftRecursiveInfo {
    /// Original 1-based numbers of the non-recursive alternatives.
    pub primary_alts: Vec<usize>,
    pub op_alts: Vec<OpAlt>,
}

/// A rule of the grammar.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    /// Position in the rule map; kept equal to insertion order.
    pub index: usize,
    /// The rule's AST node.
    pub ast: AstId,
    pub num_alts: usize,
    pub args: AttributeDict,
    pub returns: AttributeDict,
    pub locals: AttributeDict,
    pub is_fragment: bool,
    pub is_start_rule: bool,
    /// Owning lexer mode; `None` for parser rules and default-mode rules.
    pub mode: Option<String>,
    /// Alternative label → 1-based alternative numbers carrying it.
    pub alt_labels: IndexMap<String, Vec<usize>>,
    /// Labels collected by the symbol collector.
    pub labels: Vec<LabelDef>,
    /// Set after left-recursion elimination.
    pub left_recursive: Option<LeftRecursiveInfo>,
}

impl Rule {
    pub fn new(name: impl Into<String>, index: usize, ast: AstId) -> Self {
        Self {
            name: name.into(),
            index,
            ast,
            num_alts: 0,
            args: AttributeDict::new(),
            returns: AttributeDict::new(),
            locals: AttributeDict::new(),
            is_fragment: false,
            is_start_rule: false,
            mode: None,
            alt_labels: IndexMap::new(),
            labels: Vec::new(),
            left_recursive: None,
        }
    }

    /// Whether the rule's labels are scoped per alt-label group.
    pub fn has_alt_labels(&self) -> bool {
        !self.alt_labels.is_empty()
    }
}

/// A grammar mid-compilation: AST, symbol tables, and (eventually) ATN.
#[derive(Debug)]
pub struct Grammar {
    pub name: String,
    pub kind: GrammarKind,
    pub file_name: String,
    pub ast: GrammarAst,
    pub root: AstId,

    pub rules: IndexMap<String, Rule>,

    pub token_name_to_type: IndexMap<String, i32>,
    pub string_literal_to_type: IndexMap<String, i32>,
    /// Reverse of `token_name_to_type`, indexed by type.
    pub type_to_token_name: Vec<Option<String>>,
    /// Reverse of `string_literal_to_type`, indexed by type.
    pub type_to_string_literal: Vec<Option<String>>,
    pub max_token_type: i32,

    pub channel_name_to_value: IndexMap<String, i32>,
    pub channel_value_to_name: Vec<String>,
    pub max_channel_value: i32,

    /// Lexer mode name → mode AST node (default mode excluded).
    pub modes: IndexMap<String, AstId>,

    /// `(scope, name)` → action body node.
    pub named_actions: IndexMap<(String, String), AstId>,

    /// Predicate AST node → index handed to the code generator.
    pub sempreds: IndexMap<AstId, u32>,
    /// Lexer action AST node → index handed to the code generator.
    pub lexer_actions: IndexMap<AstId, u32>,

    /// Imported grammars, in load order. The import relation is walked
    /// through the owner; children carry no back-pointer.
    pub imports: Vec<Grammar>,
    /// Extracted lexer of a combined grammar.
    pub implicit_lexer: Option<Box<Grammar>>,

    /// `(literal, kept rule, removed rule)` alias ambiguities recorded by
    /// token-type assignment.
    pub ambiguous_aliases: Vec<(String, String, String)>,

    /// Counter behind `T__<n>` synthesized literal rules.
    pub synthetic_rule_counter: u32,

    pub atn: Option<Atn>,
    /// `decision_lookahead[decision][alt]`, filled by analysis.
    pub decision_lookahead: Vec<Vec<IntervalSet>>,
    /// Whether each decision's alternative sets are pairwise disjoint.
    pub decision_ll1: Vec<bool>,
}

impl Grammar {
    pub fn new(name: impl Into<String>, kind: GrammarKind, ast: GrammarAst, root: AstId) -> Self {
        let name = name.into();
        let file_name = format!("{name}.g4");
        let mut g = Self {
            name,
            kind,
            file_name,
            ast,
            root,
            rules: IndexMap::new(),
            token_name_to_type: IndexMap::new(),
            string_literal_to_type: IndexMap::new(),
            type_to_token_name: vec![None; MIN_USER_TOKEN_TYPE as usize],
            type_to_string_literal: vec![None; MIN_USER_TOKEN_TYPE as usize],
            max_token_type: TOKEN_INVALID_TYPE,
            channel_name_to_value: IndexMap::new(),
            channel_value_to_name: Vec::new(),
            max_channel_value: MIN_USER_CHANNEL_VALUE - 1,
            modes: IndexMap::new(),
            named_actions: IndexMap::new(),
            sempreds: IndexMap::new(),
            lexer_actions: IndexMap::new(),
            imports: Vec::new(),
            implicit_lexer: None,
            ambiguous_aliases: Vec::new(),
            synthetic_rule_counter: 0,
            atn: None,
            decision_lookahead: Vec::new(),
            decision_ll1: Vec::new(),
        };
        // EOF is pre-registered with its sentinel type.
        g.token_name_to_type.insert("EOF".to_owned(), TOKEN_EOF);
        g
    }

    /// Build a grammar from freshly lowered source.
    pub fn from_ast(ast: GrammarAst, root: AstId) -> Self {
        let (kind, name) = match ast.node(root).kind {
            NodeKind::Grammar(kind) => (kind, ast.node(root).text.clone()),
            _ => (GrammarKind::Combined, String::new()),
        };
        Self::new(name, kind, ast, root)
    }

    pub fn is_lexer(&self) -> bool {
        self.kind == GrammarKind::Lexer
    }

    pub fn is_parser(&self) -> bool {
        self.kind == GrammarKind::Parser
    }

    pub fn is_combined(&self) -> bool {
        self.kind == GrammarKind::Combined
    }

    /// The default named-action scope for this grammar type.
    pub fn default_action_scope(&self) -> &'static str {
        if self.is_lexer() { "lexer" } else { "parser" }
    }

    // ─────────────────────────────────────────────────────────────────
    // Rules
    // ─────────────────────────────────────────────────────────────────

    pub fn define_rule(&mut self, mut rule: Rule) -> bool {
        if self.rules.contains_key(&rule.name) {
            return false;
        }
        rule.index = self.rules.len();
        self.rules.insert(rule.name.clone(), rule);
        true
    }

    /// Remove a rule, renumbering the rules after it.
    pub fn remove_rule(&mut self, name: &str) -> Option<Rule> {
        let removed = self.rules.shift_remove(name)?;
        for (i, rule) in self.rules.values_mut().enumerate() {
            rule.index = i;
        }
        Some(removed)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.get_mut(name)
    }

    pub fn rule_by_index(&self, index: usize) -> Option<&Rule> {
        self.rules.get_index(index).map(|(_, r)| r)
    }

    /// Resolve a rule here or in any imported grammar.
    pub fn resolve_rule(&self, name: &str) -> Option<&Rule> {
        self.rule(name)
            .or_else(|| self.imports.iter().find_map(|g| g.resolve_rule(name)))
    }

    // ─────────────────────────────────────────────────────────────────
    // Token types
    // ─────────────────────────────────────────────────────────────────

    fn new_token_type(&mut self) -> i32 {
        self.max_token_type += 1;
        self.ensure_type_capacity(self.max_token_type);
        self.max_token_type
    }

    fn ensure_type_capacity(&mut self, ttype: i32) {
        let needed = ttype as usize + 1;
        if self.type_to_token_name.len() < needed {
            self.type_to_token_name.resize(needed, None);
            self.type_to_string_literal.resize(needed, None);
        }
    }

    /// Define (or look up) a symbolic token name.
    pub fn define_token_name(&mut self, name: &str) -> i32 {
        if let Some(&t) = self.token_name_to_type.get(name) {
            return t;
        }
        let t = self.new_token_type();
        self.set_token_name_type(name, t);
        t
    }

    fn set_token_name_type(&mut self, name: &str, ttype: i32) {
        self.token_name_to_type.insert(name.to_owned(), ttype);
        if ttype >= MIN_USER_TOKEN_TYPE {
            self.ensure_type_capacity(ttype);
            self.type_to_token_name[ttype as usize] = Some(name.to_owned());
        }
    }

    /// Define (or look up) a string literal's token type.
    pub fn define_string_literal(&mut self, literal: &str) -> i32 {
        if let Some(&t) = self.string_literal_to_type.get(literal) {
            return t;
        }
        let t = self.new_token_type();
        self.set_string_literal_type(literal, t);
        t
    }

    fn set_string_literal_type(&mut self, literal: &str, ttype: i32) {
        self.string_literal_to_type.insert(literal.to_owned(), ttype);
        if ttype >= MIN_USER_TOKEN_TYPE {
            self.ensure_type_capacity(ttype);
            self.type_to_string_literal[ttype as usize] = Some(literal.to_owned());
        }
    }

    /// Alias a literal to an already-defined token name: both map to the
    /// same type.
    pub fn define_token_alias(&mut self, name: &str, literal: &str) -> i32 {
        let t = self.define_token_name(name);
        self.string_literal_to_type.insert(literal.to_owned(), t);
        if t >= MIN_USER_TOKEN_TYPE {
            self.ensure_type_capacity(t);
            self.type_to_string_literal[t as usize] = Some(literal.to_owned());
        }
        t
    }

    /// Adopt another grammar's token vocabulary wholesale, keeping its
    /// numbering. A combined grammar does this with its extracted lexer,
    /// the way a parser grammar consumes a `tokenVocab`.
    pub fn import_vocab(&mut self, other: &Grammar) {
        for t in MIN_USER_TOKEN_TYPE..=other.max_token_type {
            if let Some(name) = other
                .type_to_token_name
                .get(t as usize)
                .and_then(Option::as_deref)
            {
                self.set_token_name_type(name, t);
            }
            if let Some(lit) = other
                .type_to_string_literal
                .get(t as usize)
                .and_then(Option::as_deref)
            {
                self.set_string_literal_type(lit, t);
            }
        }
        self.max_token_type = self.max_token_type.max(other.max_token_type);
    }

    /// Drop a literal's alias entry (alias ambiguity resolution).
    pub fn undefine_string_literal(&mut self, literal: &str) {
        if let Some(t) = self.string_literal_to_type.shift_remove(literal) {
            if t >= MIN_USER_TOKEN_TYPE
                && self.type_to_string_literal[t as usize].as_deref() == Some(literal)
            {
                self.type_to_string_literal[t as usize] = None;
            }
        }
    }

    pub fn token_type(&self, name: &str) -> i32 {
        self.token_name_to_type
            .get(name)
            .copied()
            .unwrap_or(TOKEN_INVALID_TYPE)
    }

    pub fn string_literal_type(&self, literal: &str) -> i32 {
        self.string_literal_to_type
            .get(literal)
            .copied()
            .unwrap_or(TOKEN_INVALID_TYPE)
    }

    /// Display name for a token type: symbolic name, then literal, then
    /// the raw number.
    pub fn token_display_name(&self, ttype: i32) -> String {
        if ttype == TOKEN_EOF {
            return "EOF".to_owned();
        }
        if ttype >= MIN_USER_TOKEN_TYPE && (ttype as usize) < self.type_to_token_name.len() {
            if let Some(name) = &self.type_to_token_name[ttype as usize] {
                return name.clone();
            }
            if let Some(lit) = &self.type_to_string_literal[ttype as usize] {
                return lit.clone();
            }
        }
        ttype.to_string()
    }

    /// The set of all defined token types, EOF excluded.
    pub fn all_token_types(&self) -> IntervalSet {
        let mut set = IntervalSet::new();
        if self.max_token_type >= MIN_USER_TOKEN_TYPE {
            set.add_range(MIN_USER_TOKEN_TYPE, self.max_token_type);
        }
        set
    }

    // ─────────────────────────────────────────────────────────────────
    // Channels
    // ─────────────────────────────────────────────────────────────────

    /// Define (or look up) a custom channel, numbering after the
    /// predefined channels.
    pub fn define_channel(&mut self, name: &str) -> i32 {
        if let Some(&v) = self.channel_name_to_value.get(name) {
            return v;
        }
        self.max_channel_value += 1;
        let v = self.max_channel_value;
        self.channel_name_to_value.insert(name.to_owned(), v);
        self.channel_value_to_name.push(name.to_owned());
        v
    }

    pub fn channel_value(&self, name: &str) -> Option<i32> {
        match name {
            "DEFAULT_TOKEN_CHANNEL" => Some(DEFAULT_TOKEN_CHANNEL),
            "HIDDEN" => Some(HIDDEN_CHANNEL),
            _ => self.channel_name_to_value.get(name).copied(),
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Actions and predicates
    // ─────────────────────────────────────────────────────────────────

    pub fn define_sempred(&mut self, node: AstId) -> u32 {
        let next = self.sempreds.len() as u32;
        *self.sempreds.entry(node).or_insert(next)
    }

    pub fn define_lexer_action(&mut self, node: AstId) -> u32 {
        let next = self.lexer_actions.len() as u32;
        *self.lexer_actions.entry(node).or_insert(next)
    }

    /// Next `T__<n>` name for a synthesized literal rule.
    pub fn next_synthetic_rule_name(&mut self) -> String {
        self.synthetic_rule_counter += 1;
        format!("{}{}", SYNTHETIC_RULE_PREFIX, self.synthetic_rule_counter)
    }
}

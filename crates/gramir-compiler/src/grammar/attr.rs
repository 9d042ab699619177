//! Attribute dictionaries for rule arguments, return values, and locals.
//!
//! Declarations arrive as the raw text between brackets, e.g.
//! `int x, Map<String, Integer> m = init()`. Splitting respects nested
//! `<> [] ()` and an initializer after `=` is kept out of the name.

use indexmap::IndexMap;
use rowan::TextRange;

/// One declared attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Full declaration text, type and initializer included.
    pub decl: String,
}

/// Named attribute collection, insertion-ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDict {
    attributes: IndexMap<String, Attribute>,
}

impl AttributeDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attr: Attribute) {
        self.attributes.insert(attr.name.clone(), attr);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

/// Parse a bracketed declaration list into a dictionary.
///
/// The span is the declaration site, attached to every attribute's
/// conflict diagnostics by the caller.
pub fn parse_attribute_defs(text: &str) -> AttributeDict {
    let mut dict = AttributeDict::new();
    for decl in split_decls(text) {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        if let Some(name) = decl_name(decl) {
            dict.insert(Attribute {
                name,
                decl: decl.to_owned(),
            });
        }
    }
    dict
}

/// Split on top-level commas only.
fn split_decls(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out
}

/// The declared name: the last identifier before any initializer.
fn decl_name(decl: &str) -> Option<String> {
    let before_init = decl.split('=').next().unwrap_or(decl).trim_end();
    let name_start = before_init
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_'))
        .map_or(0, |i| i + c_len(before_init, i));
    let name = &before_init[name_start..];
    if name.is_empty() || name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(name.to_owned())
}

fn c_len(s: &str, byte_idx: usize) -> usize {
    s[byte_idx..].chars().next().map_or(1, char::len_utf8)
}

/// What kind of thing a label binds to; conflicting kinds for one name
/// within a rule are an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelType {
    TokenLabel,
    TokenListLabel,
    RuleLabel,
    RuleListLabel,
}

impl std::fmt::Display for LabelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LabelType::TokenLabel => "token label",
            LabelType::TokenListLabel => "token list label",
            LabelType::RuleLabel => "rule label",
            LabelType::RuleListLabel => "rule list label",
        };
        f.write_str(s)
    }
}

/// A resolved label occurrence inside a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDef {
    pub name: String,
    pub label_type: LabelType,
    pub span: TextRange,
    /// Alternative-label group the occurrence belongs to, if the rule
    /// names its alternatives; labels are scoped per group then.
    pub alt_label: Option<String>,
}

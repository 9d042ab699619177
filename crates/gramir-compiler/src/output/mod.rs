//! Output surfaces the external code generator and tooling consume:
//! the `.tokens` vocab text, the interpreter dump, and the abstract
//! generator interface.

#[cfg(test)]
mod output_tests;

use std::fmt::Write;

use gramir_atn::{MIN_USER_TOKEN_TYPE, serialize};

use crate::Error;
use crate::grammar::Grammar;

/// The `.tokens` vocab text: `NAME=type` lines for symbolic tokens, then
/// `'literal'=type` lines for literal aliases.
pub fn tokens_vocab(g: &Grammar) -> String {
    let mut out = String::new();
    for (name, &ttype) in &g.token_name_to_type {
        if ttype >= MIN_USER_TOKEN_TYPE {
            writeln!(out, "{name}={ttype}").unwrap();
        }
    }
    for (literal, &ttype) in &g.string_literal_to_type {
        if ttype >= MIN_USER_TOKEN_TYPE {
            writeln!(out, "{literal}={ttype}").unwrap();
        }
    }
    out
}

/// The interpreter dump: token display tables, rule names, lexer channel
/// and mode names, then the serialized ATN integers.
pub fn interp_dump(g: &Grammar) -> Result<String, Error> {
    let mut out = String::new();

    writeln!(out, "token literal names:").unwrap();
    writeln!(out, "null").unwrap();
    for t in MIN_USER_TOKEN_TYPE..=g.max_token_type {
        match g.type_to_string_literal.get(t as usize).and_then(Option::as_deref) {
            Some(lit) => writeln!(out, "{lit}").unwrap(),
            None => writeln!(out, "null").unwrap(),
        }
    }
    writeln!(out).unwrap();

    writeln!(out, "token symbolic names:").unwrap();
    writeln!(out, "null").unwrap();
    for t in MIN_USER_TOKEN_TYPE..=g.max_token_type {
        match g.type_to_token_name.get(t as usize).and_then(Option::as_deref) {
            Some(name) => writeln!(out, "{name}").unwrap(),
            None => writeln!(out, "null").unwrap(),
        }
    }
    writeln!(out).unwrap();

    writeln!(out, "rule names:").unwrap();
    for name in g.rules.keys() {
        writeln!(out, "{name}").unwrap();
    }
    writeln!(out).unwrap();

    if g.is_lexer() {
        writeln!(out, "channel names:").unwrap();
        writeln!(out, "DEFAULT_TOKEN_CHANNEL").unwrap();
        writeln!(out, "HIDDEN").unwrap();
        for name in &g.channel_value_to_name {
            writeln!(out, "{name}").unwrap();
        }
        writeln!(out).unwrap();

        writeln!(out, "mode names:").unwrap();
        writeln!(out, "DEFAULT_MODE").unwrap();
        for name in g.modes.keys() {
            writeln!(out, "{name}").unwrap();
        }
        writeln!(out).unwrap();
    }

    let atn = g.atn.as_ref().ok_or(Error::NoAtn)?;
    let words = serialize(atn)?;
    writeln!(out, "atn:").unwrap();
    let rendered: Vec<String> = words.iter().map(u16::to_string).collect();
    writeln!(out, "[{}]", rendered.join(", ")).unwrap();

    Ok(out)
}

/// A file the code generator produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

/// The surface a target-language code generator implements. The core
/// hands over the finished grammar - symbol tables, ATN, and decision
/// lookahead - and stays ignorant of any concrete target.
pub trait CodeGenerator {
    /// Target language name, for diagnostics.
    fn target(&self) -> &str;

    /// Emit recognizer sources for the processed grammar.
    fn generate(&mut self, grammar: &Grammar) -> Result<Vec<GeneratedFile>, Error>;
}

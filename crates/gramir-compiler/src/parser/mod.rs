//! Parser infrastructure for grammar source files.
//!
//! # Architecture
//!
//! The parser produces a lossless concrete syntax tree (CST) via Rowan's
//! green tree builder:
//!
//! - Zero-copy lexing: tokens carry spans, text sliced only when building
//!   tree nodes
//! - Trivia buffering: whitespace/comments collected, then attached as
//!   leading trivia
//! - Checkpoint-based wrapping: retroactively wrap nodes for EBNF
//!   suffixes, labels, and ranges
//! - Local recovery: unknown tokens land in `Error` nodes; the parser
//!   always produces a tree
//!
//! The CST is immutable; `crate::ast` lowers it into the mutable arena
//! form the transform pipeline works on.

pub mod cst;

mod core;
mod grammar;
mod lexer;

#[cfg(test)]
mod grammar_tests;
#[cfg(test)]
mod lexer_tests;

pub use core::{ParseResult, Parser};
pub use cst::{GLang, SyntaxKind, SyntaxNode, SyntaxToken};
pub use lexer::{Token, lex, token_text};

use crate::Error;

/// Lex and parse one grammar source.
pub fn parse(source: &str) -> Result<ParseResult, Error> {
    let tokens = lex(source);
    Parser::new(source, tokens).parse()
}

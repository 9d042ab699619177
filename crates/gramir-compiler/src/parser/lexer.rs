//! Lexer for grammar source files.
//!
//! Produces span-based tokens without storing text - text is sliced from
//! source only when needed.
//!
//! ## Error handling
//!
//! Consecutive error characters coalesce into single `Garbage` tokens
//! rather than one error per character.
//!
//! ## Prequel blocks
//!
//! Logos lexes every `{...}` as one `Action` token. A block that directly
//! follows `options`, `tokens`, or `channels` is really a brace-delimited
//! token sequence, so the wrapper re-lexes its interior and emits
//! `LBrace` + interior tokens + `RBrace` instead.

use logos::Logos;
use rowan::TextRange;
use std::ops::Range;

use super::cst::SyntaxKind;

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: SyntaxKind, span: TextRange) -> Self {
        Self { kind, span }
    }
}

fn range_to_text_range(range: Range<usize>) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into())
}

/// Tokenizes source into a vector of span-based tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = SyntaxKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(
                        SyntaxKind::Garbage,
                        range_to_text_range(start..end),
                    ));
                }

                let span = lexer.span();
                if kind == SyntaxKind::Action && follows_block_keyword(&tokens) {
                    split_brace_block(source, span, &mut tokens);
                } else {
                    tokens.push(Token::new(kind, range_to_text_range(span)));
                }
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(
                        SyntaxKind::Garbage,
                        range_to_text_range(start..source.len()),
                    ));
                }
                break;
            }
        }
    }

    tokens
}

/// True when the last non-trivia token opens a brace-delimited section.
fn follows_block_keyword(tokens: &[Token]) -> bool {
    tokens
        .iter()
        .rev()
        .find(|t| !t.kind.is_trivia())
        .is_some_and(|t| {
            matches!(
                t.kind,
                SyntaxKind::KwOptions | SyntaxKind::KwTokens | SyntaxKind::KwChannels
            )
        })
}

/// Re-lex the interior of a `{...}` block as ordinary tokens.
fn split_brace_block(source: &str, span: Range<usize>, tokens: &mut Vec<Token>) {
    let start = span.start;
    let end = span.end;

    tokens.push(Token::new(
        SyntaxKind::LBrace,
        range_to_text_range(start..start + 1),
    ));

    if end - start > 2 {
        let interior = &source[start + 1..end - 1];
        let base = (start + 1) as u32;
        let mut inner = SyntaxKind::lexer(interior);
        while let Some(item) = inner.next() {
            let s = inner.span();
            let range = TextRange::new(
                (base + s.start as u32).into(),
                (base + s.end as u32).into(),
            );
            match item {
                Ok(kind) => tokens.push(Token::new(kind, range)),
                Err(()) => tokens.push(Token::new(SyntaxKind::Garbage, range)),
            }
        }
    }

    tokens.push(Token::new(
        SyntaxKind::RBrace,
        range_to_text_range(end - 1..end),
    ));
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[std::ops::Range::<usize>::from(token.span)]
}

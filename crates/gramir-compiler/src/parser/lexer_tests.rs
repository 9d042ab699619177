//! Tests for the grammar-file lexer.

use super::cst::SyntaxKind::{self, *};
use super::lexer::{lex, token_text};

fn kinds(src: &str) -> Vec<SyntaxKind> {
    lex(src)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

#[test]
fn grammar_header() {
    assert_eq!(kinds("grammar T;"), vec![KwGrammar, Ident, Semi]);
    assert_eq!(
        kinds("lexer grammar L;"),
        vec![KwLexer, KwGrammar, Ident, Semi]
    );
}

#[test]
fn keywords_win_over_identifiers() {
    assert_eq!(kinds("fragment"), vec![KwFragment]);
    // A longer identifier containing a keyword prefix stays one token.
    assert_eq!(kinds("fragments"), vec![Ident]);
}

#[test]
fn option_blocks_are_split_into_tokens() {
    assert_eq!(
        kinds("options { superClass = Base ; }"),
        vec![KwOptions, LBrace, Ident, Equals, Ident, Semi, RBrace]
    );
    assert_eq!(
        kinds("tokens { ID, INT }"),
        vec![KwTokens, LBrace, Ident, Comma, Ident, RBrace]
    );
}

#[test]
fn actions_stay_single_tokens() {
    let toks = kinds("@members { int depth = { nested() }; }");
    assert_eq!(toks, vec![At, Ident, Action]);

    let src = "{ if (x) { y(); } }";
    let all = lex(src);
    assert_eq!(all.len(), 1);
    assert_eq!(token_text(src, &all[0]), src);
}

#[test]
fn predicates_are_action_plus_question() {
    assert_eq!(kinds("{p}? ID"), vec![Action, Question, Ident]);
}

#[test]
fn quantifiers_prefer_the_longest_match() {
    assert_eq!(
        kinds("* + ? *? +? ??"),
        vec![Star, Plus, Question, StarQuestion, PlusQuestion, QuestionQuestion]
    );
}

#[test]
fn ranges_and_wildcards() {
    assert_eq!(
        kinds("'a'..'z' ."),
        vec![StringLiteral, DotDot, StringLiteral, Dot]
    );
}

#[test]
fn charsets_and_arg_blocks_share_a_kind() {
    assert_eq!(kinds("[a-z]"), vec![BracketBlock]);
    assert_eq!(kinds("[int x]"), vec![BracketBlock]);
}

#[test]
fn lexer_command_arrows() {
    assert_eq!(
        kinds("-> channel(HIDDEN)"),
        vec![Arrow, Ident, LParen, Ident, RParen]
    );
}

#[test]
fn garbage_coalesces() {
    let toks = kinds("\u{1}\u{2}\u{3} grammar");
    assert_eq!(toks, vec![Garbage, KwGrammar]);
}

#[test]
fn comments_are_trivia() {
    let all = lex("// line\n/* block */ grammar");
    let non_trivia: Vec<_> = all.iter().filter(|t| !t.kind.is_trivia()).collect();
    assert_eq!(non_trivia.len(), 1);
    assert_eq!(non_trivia[0].kind, KwGrammar);
}

#[test]
fn unterminated_action_becomes_garbage() {
    // The unmatched brace errors out; the rest lexes normally.
    let toks = kinds("{ never closed");
    assert_eq!(toks, vec![Garbage, Ident, Ident]);
}

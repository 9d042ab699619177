//! Tests for block-set reduction.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::test_utils::{dump_ast, parse};

use super::reduce_block_sets;

fn reduced(src: &str) -> (String, Diagnostics) {
    let mut parsed = parse(src);
    let mut diag = Diagnostics::new();
    reduce_block_sets(&mut parsed.grammar, &mut diag);
    (
        dump_ast(&parsed.grammar.ast, parsed.grammar.root),
        diag,
    )
}

#[test]
fn parser_token_block_collapses() {
    let (dump, diag) = reduced("grammar T; a : x=(A | B | C) ;");
    insta::assert_snapshot!(dump, @r"
    Grammar(combined) T
      Rule a
        Block
          Alt
            Set [x=]
              TokenRef A
              TokenRef B
              TokenRef C
    ");
    assert!(diag.is_empty());
}

#[test]
fn lexer_char_alternatives_collapse() {
    let (dump, _) = reduced("lexer grammar L; X : ('a' | 'b' | 'c'..'f')+ ;");
    insta::assert_snapshot!(dump, @r"
    Grammar(lexer) L
      Rule X
        Block
          Alt
            Plus
              Set
                StringLit 'a'
                StringLit 'b'
                Range
                  StringLit 'c'
                  StringLit 'f'
    ");
}

#[test]
fn rule_body_blocks_are_exempt() {
    let (dump, _) = reduced("grammar T; a : A | B ;");
    insta::assert_snapshot!(dump, @r"
    Grammar(combined) T
      Rule a
        Block
          Alt
            TokenRef A
          Alt
            TokenRef B
    ");
}

#[test]
fn mixed_blocks_stay() {
    let (dump, _) = reduced("grammar T; a : (A | b) ;");
    insta::assert_snapshot!(dump, @r"
    Grammar(combined) T
      Rule a
        Block
          Alt
            Block
              Alt
                TokenRef A
              Alt
                RuleRef b
    ");
}

#[test]
fn multi_char_lexer_literals_stay() {
    let (dump, _) = reduced("lexer grammar L; X : ('ab' | 'c') ;");
    assert!(dump.contains("Block"));
    assert!(!dump.contains("Set"));
}

#[test]
fn overlapping_chars_warn() {
    let (_, diag) = reduced("lexer grammar L; X : ('a' | 'a'..'z') ;");
    let kinds: Vec<DiagnosticKind> = diag.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::CharactersCollisionInSet]);
}

#[test]
fn labeled_alternatives_prevent_reduction() {
    let (dump, _) = reduced("grammar T; a : (A # One | B # Two) ;");
    assert!(!dump.contains("Set"));
}

//! Parser tests, asserted through the lowered AST shape.

use indoc::indoc;

use crate::ast;
use crate::test_utils::dump_ast;

fn dump(src: &str) -> String {
    let parsed = super::parse(src).expect("parses");
    let (ast, root) = ast::lower(&parsed.root);
    dump_ast(&ast, root)
}

fn errors(src: &str) -> usize {
    super::parse(src).expect("parses").diagnostics.error_count()
}

#[test]
fn combined_grammar_with_ebnf() {
    let src = indoc! {"
        grammar T;
        a : ID (',' ID)* ;
    "};
    insta::assert_snapshot!(dump(src), @r"
    Grammar(combined) T
      Rule a
        Block
          Alt
            TokenRef ID
            Star
              Block
                Alt
                  StringLit ','
                  TokenRef ID
    ");
}

#[test]
fn lexer_rule_with_command() {
    let src = indoc! {"
        lexer grammar L;
        WS : [ \\t]+ -> skip ;
    "};
    insta::assert_snapshot!(dump(src), @r"
    Grammar(lexer) L
      Rule WS
        Block
          Alt
            Plus
              CharSet [ \t]
        LexerCommand skip
    ");
}

#[test]
fn labels_attach_to_elements() {
    let src = "grammar T; e : x=ID y+=e ;";
    insta::assert_snapshot!(dump(src), @r"
    Grammar(combined) T
      Rule e
        Block
          Alt
            TokenRef ID [x=]
            RuleRef e [y+=]
    ");
}

#[test]
fn alternative_labels() {
    let src = "grammar T; a : ID # One | INT # Two ;";
    insta::assert_snapshot!(dump(src), @r"
    Grammar(combined) T
      Rule a
        Block
          Alt [One=]
            TokenRef ID
          Alt [Two=]
            TokenRef INT
    ");
}

#[test]
fn scoped_named_action() {
    let src = "grammar T; @parser::members { int depth; } a : ID ;";
    insta::assert_snapshot!(dump(src), @r"
    Grammar(combined) T
      NamedAction members
        Name parser
        Action int depth;
      Rule a
        Block
          Alt
            TokenRef ID
    ");
}

#[test]
fn prequels_and_rule_options() {
    let src = indoc! {"
        parser grammar P;
        options { tokenVocab = L; }
        tokens { A, B }
        a options { k = v ; } : A ;
    "};
    insta::assert_snapshot!(dump(src), @r"
    Grammar(parser) P
      Options
        OptionDef tokenVocab
          Name L
      Tokens
        TokenRef A
        TokenRef B
      Rule a
        Options
          OptionDef k
            Name v
        Block
          Alt
            TokenRef A
    ");
}

#[test]
fn modes_own_their_rules() {
    let src = indoc! {"
        lexer grammar L;
        A : 'a' ;
        mode ISLAND;
        B : 'b' -> popMode ;
    "};
    insta::assert_snapshot!(dump(src), @r"
    Grammar(lexer) L
      Rule A
        Block
          Alt
            StringLit 'a'
      Mode ISLAND
        Rule B
          Block
            Alt
              StringLit 'b'
          LexerCommand popMode
    ");
}

#[test]
fn negation_ranges_and_wildcard() {
    let src = "lexer grammar L; X : ~[ab] 'a'..'z' . ;";
    insta::assert_snapshot!(dump(src), @r"
    Grammar(lexer) L
      Rule X
        Block
          Alt
            Not
              CharSet [ab]
            Range
              StringLit 'a'
              StringLit 'z'
            Wildcard .
    ");
}

#[test]
fn predicates_and_actions() {
    let src = "grammar T; a : {ready()}? ID {done();} ;";
    insta::assert_snapshot!(dump(src), @r"
    Grammar(combined) T
      Rule a
        Block
          Alt
            Predicate ready()
            TokenRef ID
            Action done();
    ");
}

#[test]
fn parser_rule_signature() {
    let src = "grammar T; a[int x] returns [int y] locals [int z] : ID ;";
    insta::assert_snapshot!(dump(src), @r"
    Grammar(combined) T
      Rule a
        Args int x
        Returns int y
        Locals int z
        Block
          Alt
            TokenRef ID
    ");
}

#[test]
fn missing_semicolon_recovers() {
    let src = "grammar T; a : ID b : INT ;";
    assert!(errors(src) > 0);
    // Both rules still come out of the tree.
    let dumped = dump(src);
    assert!(dumped.contains("Rule a"));
}

#[test]
fn non_greedy_suffixes() {
    let src = "lexer grammar L; C : '/*' .*? '*/' ;";
    insta::assert_snapshot!(dump(src), @r"
    Grammar(lexer) L
      Rule C
        Block
          Alt
            StringLit '/*'
            Star(lazy)
              Wildcard .
            StringLit '*/'
    ");
}

//! Tests for symbol conflict checks.

use indoc::indoc;

use crate::test_utils::diagnostics_of;

#[test]
fn label_on_a_non_set_block() {
    let src = indoc! {"
        grammar T;
        ss : op=('=' | '+=' | expr) EOF ;
        expr : '=' '=' ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    86(ERROR) label op assigned to a block which is not a set
    ");
}

#[test]
fn declaration_conflicts_with_rules_and_each_other() {
    let src = indoc! {"
        grammar T;
        ss[int expr] returns [int expr] locals [int expr] : expr=expr EOF ;
        expr : '=' ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    87(ERROR) parameter expr conflicts with rule with same name
    88(ERROR) return value expr conflicts with rule with same name
    90(ERROR) return value expr conflicts with parameter with same name
    89(ERROR) local expr conflicts with rule with same name
    91(ERROR) local expr conflicts with parameter with same name
    92(ERROR) local expr conflicts with return value with same name
    80(ERROR) label expr conflicts with rule with same name
    82(ERROR) label expr conflicts with parameter with same name
    83(ERROR) label expr conflicts with return value with same name
    84(ERROR) label expr conflicts with local with same name
    ");
}

#[test]
fn reserved_rule_names() {
    let src = "lexer grammar L; MIN_CHAR_VALUE : 'a' ;";
    insta::assert_snapshot!(diagnostics_of(src), @r"
    52(ERROR) cannot declare a rule with reserved name MIN_CHAR_VALUE
    ");
}

#[test]
fn undefined_rule_reference() {
    let src = "parser grammar P; a : b ;";
    insta::assert_snapshot!(diagnostics_of(src), @r"
    60(ERROR) reference to undefined rule: b
    ");
}

#[test]
fn rule_argument_mismatches() {
    let src = indoc! {"
        grammar T;
        a : b[5] c ;
        b : ID ;
        c[int x] : ID ;
        ID : [a-z]+ ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    61(ERROR) rule b has no defined parameters
    62(ERROR) missing argument(s) on rule reference: c
    ");
}

#[test]
fn label_type_conflicts_within_a_rule() {
    let src = "grammar T; a : x=ID x+=ID ;";
    let dump = diagnostics_of(src);
    assert!(dump.contains("label x type mismatch"), "{dump}");
}

#[test]
fn alt_labels_scope_label_types() {
    // Same label name, different types, but in separate labeled
    // alternatives: no conflict.
    let src = "grammar T; a : x=ID # One | x=b # Two ; b : ID ;";
    let dump = diagnostics_of(src);
    assert!(!dump.contains("type mismatch"), "{dump}");
}

#[test]
fn action_redefinition_in_one_grammar() {
    let src = "grammar T; @members { int a; } @members { int b; } r : ID ;";
    let dump = diagnostics_of(src);
    assert!(dump.contains("redefinition of members action"), "{dump}");
}

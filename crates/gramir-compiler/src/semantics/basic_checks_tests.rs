//! Tests for the basic checks.

use indoc::indoc;

use crate::test_utils::diagnostics_of;

#[test]
fn illegal_options_and_repeated_prequels() {
    let src = indoc! {"
        parser grammar U;
        options { foo = bar; }
        tokens { ID, f }
        tokens { A }
        a options { blech = bar; } : ID ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    53(ERROR) repeated grammar prequel spec (tokens); please merge
    53(ERROR) repeated grammar prequel spec (tokens); please merge
    70(WARN) unsupported option foo
    70(WARN) unsupported option blech
    57(ERROR) token names must start with an uppercase letter: f
    ");
}

#[test]
fn channels_only_in_lexer_grammars() {
    let src = "grammar T; channels { WS_CHANNEL } a : ID ;";
    let dump = diagnostics_of(src);
    assert!(dump.contains("custom channels are only valid in lexer grammars"));
}

#[test]
fn incompatible_lexer_commands() {
    let src = "lexer grammar L; A : 'a' -> skip, more ;";
    let dump = diagnostics_of(src);
    assert!(dump.contains("lexer command more is incompatible with skip"));
}

#[test]
fn compatible_commands_pass() {
    let src = "lexer grammar L; channels { C } A : 'a' -> type(B), channel(C) ; B : 'b' ;";
    let dump = diagnostics_of(src);
    assert!(!dump.contains("incompatible"), "{dump}");
}

#[test]
fn duplicated_commands_warn() {
    let src = "lexer grammar L; A : 'a' -> skip, skip ;";
    let dump = diagnostics_of(src);
    assert!(dump.contains("duplicated lexer command skip"));
}

#[test]
fn empty_mode_is_an_error() {
    let src = indoc! {"
        lexer grammar L;
        A : 'a' ;
        mode X;
        fragment B : 'b' ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    55(ERROR) lexer mode X must contain at least one non-fragment rule
    ");
}

#[test]
fn epsilon_tokens_warn() {
    let src = "lexer grammar L; A : 'a'? ;";
    let dump = diagnostics_of(src);
    assert!(dump.contains("non-fragment lexer rule A can match the empty string"));

    // A fragment may match empty without complaint.
    let src = "lexer grammar L; X : 'x' F ; fragment F : 'f'? ;";
    let dump = diagnostics_of(src);
    assert!(!dump.contains("empty string"), "{dump}");
}

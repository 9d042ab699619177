//! Tests for attribute-expression checks.

use indoc::indoc;

use crate::test_utils::diagnostics_of;

#[test]
fn known_references_pass() {
    let src = indoc! {"
        grammar T;
        add[int left] returns [int value]
            locals [int scratch]
            : x=term { $value = $left + $x.value + $scratch; }
            ;
        term returns [int value] : INT { $value = $INT.int; } ;
        INT : [0-9]+ ;
    "};
    let dump = diagnostics_of(src);
    assert!(!dump.contains("unknown attribute"), "{dump}");
}

#[test]
fn unknown_simple_attribute() {
    let src = indoc! {"
        grammar T;
        a : ID { $nope = 1; } ;
        ID : [a-z]+ ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    95(ERROR) unknown attribute reference $nope in a
    ");
}

#[test]
fn unknown_rule_attribute() {
    let src = indoc! {"
        grammar T;
        a : b { $b.missing = 1; } ;
        b : ID ;
        ID : [a-z]+ ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    96(ERROR) unknown attribute missing for rule b in $b.missing
    ");
}

#[test]
fn token_builtins_are_known() {
    let src = indoc! {"
        grammar T;
        a : t=ID { say($t.text, $t.line, $ID.type); } ;
        ID : [a-z]+ ;
    "};
    let dump = diagnostics_of(src);
    assert!(!dump.contains("unknown"), "{dump}");
}

#[test]
fn unknown_token_attribute() {
    let src = indoc! {"
        grammar T;
        a : t=ID { use($t.nonsuch); } ;
        ID : [a-z]+ ;
    "};
    insta::assert_snapshot!(diagnostics_of(src), @r"
    95(ERROR) unknown attribute reference $t.nonsuch in a
    ");
}

#[test]
fn references_inside_strings_are_ignored() {
    let src = indoc! {"
        grammar T;
        a : ID { print(\"$fake\"); } ;
        ID : [a-z]+ ;
    "};
    let dump = diagnostics_of(src);
    assert!(!dump.contains("unknown"), "{dump}");
}

#[test]
fn predicate_references_are_checked_too() {
    let src = indoc! {"
        grammar T;
        a[int depth] : {$depth < 10}? ID ;
        ID : [a-z]+ ;
    "};
    let dump = diagnostics_of(src);
    assert!(!dump.contains("unknown"), "{dump}");
}

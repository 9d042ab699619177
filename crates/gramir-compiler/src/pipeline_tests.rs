//! Whole-pipeline integration tests and cross-cutting invariants.

use indoc::indoc;

use gramir_atn::MIN_USER_TOKEN_TYPE;

use crate::diagnostics::Diagnostics;
use crate::test_utils::process;

const CALC: &str = indoc! {"
    grammar Calc;
    prog : stat+ EOF ;
    stat : expr NEWLINE
         | ID '=' expr NEWLINE
         | NEWLINE
         ;
    expr : expr ('*' | '/') expr
         | expr ('+' | '-') expr
         | INT
         | ID
         | '(' expr ')'
         ;
    ID : [a-z]+ ;
    INT : [0-9]+ ;
    NEWLINE : '\\r'? '\\n' ;
    WS : [ \\t]+ -> skip ;
"};

#[test]
fn calculator_grammar_processes_cleanly() {
    let done = process(CALC);
    assert!(done.is_valid(), "{}", done.diagnostics().dump());

    let g = &done.grammar;
    assert!(g.implicit_lexer.is_some());
    assert!(g.rule("expr").unwrap().left_recursive.is_some());
    assert!(!g.decision_lookahead.is_empty());

    let atn = g.atn.as_ref().unwrap();
    atn.verify().unwrap();
    let lexer_atn = g.implicit_lexer.as_ref().unwrap().atn.as_ref().unwrap();
    lexer_atn.verify().unwrap();
}

#[test]
fn rule_indexes_match_their_table_positions() {
    let done = process(CALC);
    for (i, (name, rule)) in done.grammar.rules.iter().enumerate() {
        assert_eq!(rule.index, i);
        assert_eq!(name, &rule.name);
        assert_eq!(
            done.grammar.rule_by_index(rule.index).unwrap().name,
            rule.name
        );
    }
}

#[test]
fn token_tables_agree_both_ways() {
    let done = process(CALC);
    let g = &done.grammar;
    for t in MIN_USER_TOKEN_TYPE..=g.max_token_type {
        let named = g.type_to_token_name[t as usize].is_some();
        let aliased = g.type_to_string_literal[t as usize].is_some();
        assert!(
            named || aliased,
            "token type {t} has neither a name nor a literal"
        );
    }
    for (name, &t) in &g.token_name_to_type {
        if t >= MIN_USER_TOKEN_TYPE {
            assert_eq!(g.type_to_token_name[t as usize].as_deref(), Some(name.as_str()));
        }
    }
}

#[test]
fn atn_states_index_correctly_after_optimization() {
    let done = process(CALC);
    for atn in [
        done.grammar.atn.as_ref().unwrap(),
        done.grammar.implicit_lexer.as_ref().unwrap().atn.as_ref().unwrap(),
    ] {
        for (i, st) in atn.states.iter().enumerate() {
            assert_eq!(st.id as usize, i);
        }
        for (d, &sid) in atn.decision_to_state.iter().enumerate() {
            assert_eq!(atn.state(sid).decision, Some(d as u32));
        }
    }
}

#[test]
fn serialized_atn_round_trips() {
    let done = process(CALC);
    let words = done.serialized_atn().unwrap();
    let back = gramir_atn::deserialize(&words).unwrap();
    assert_eq!(&back, done.grammar.atn.as_ref().unwrap());
}

#[test]
fn semantic_reruns_define_no_new_symbols() {
    let mut done = process(CALC);
    let tokens_before = done.grammar.token_name_to_type.len();
    let literals_before = done.grammar.string_literal_to_type.len();
    let rules_before = done.grammar.rules.len();
    let max_before = done.grammar.max_token_type;

    let mut diag = Diagnostics::new();
    crate::semantics::analyze(&mut done.grammar, &mut diag);

    assert_eq!(done.grammar.token_name_to_type.len(), tokens_before);
    assert_eq!(done.grammar.string_literal_to_type.len(), literals_before);
    assert_eq!(done.grammar.rules.len(), rules_before);
    assert_eq!(done.grammar.max_token_type, max_before);
}

#[test]
fn ast_parents_stay_consistent_through_the_pipeline() {
    let mut done = process(CALC);
    let root = done.grammar.root;
    done.grammar.ast.sanity_check(root).unwrap();

    for n in done.grammar.ast.walk(root) {
        if n == root {
            continue;
        }
        let node = done.grammar.ast.node(n);
        let parent = node.parent.expect("reachable nodes are parented");
        assert!(done.grammar.ast.children(parent).contains(&n));
    }
}

#[test]
fn warnings_can_be_promoted_to_errors() {
    let src = "grammar T; a : ID ;";
    let done = crate::GrammarBuilder::new(src)
        .warnings_are_errors(true)
        .parse()
        .unwrap()
        .process();
    // The implicit ID token warns, and the promotion makes the run fail.
    assert!(!done.is_valid());
    assert!(
        done.diagnostics()
            .iter()
            .any(|d| d.kind == crate::DiagnosticKind::WarningTreatedAsError)
    );
}

#[test]
fn exit_status_contract() {
    assert!(process(CALC).is_valid());
    assert!(!process("parser grammar P; a : b ;").is_valid());
}

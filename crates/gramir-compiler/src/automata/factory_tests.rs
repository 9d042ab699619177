//! Tests for ATN construction.

use gramir_atn::{StateKind, Transition, dump_atn};
use indoc::indoc;

use crate::test_utils::process;

#[test]
fn two_alternative_rule() {
    let src = indoc! {"
        grammar T;
        s : A | B ;
        A : 'a' ;
        B : 'b' ;
    "};
    let done = process(src);
    assert!(done.is_valid(), "{}", done.diagnostics().dump());
    let atn = done.grammar.atn.as_ref().unwrap();
    atn.verify().unwrap();

    insta::assert_snapshot!(dump_atn(atn), @r"
    s0 RuleStart(r0) -> eps s2
    s1 RuleStop(r0)
    s2 BlockStart(r0) d0 -> eps s4, eps s6
    s3 BlockEnd(r0) -> eps s1
    s4 Basic(r0) -> atom(1) s5
    s5 Basic(r0) -> eps s3
    s6 Basic(r0) -> atom(2) s7
    s7 Basic(r0) -> eps s3
    ");
}

#[test]
fn star_loop_shape() {
    let src = indoc! {"
        grammar T;
        s : A* ;
        A : 'a' ;
    "};
    let done = process(src);
    let atn = done.grammar.atn.as_ref().unwrap();
    insta::assert_snapshot!(dump_atn(atn), @r"
    s0 RuleStart(r0) -> eps s4
    s1 RuleStop(r0)
    s2 Basic(r0) -> atom(1) s3
    s3 Basic(r0) -> eps s5
    s4 StarLoopEntry(r0) d0 -> eps s2, eps s6
    s5 StarLoopBack(r0) -> eps s4
    s6 LoopEnd(r0) -> eps s1
    ");
}

#[test]
fn non_greedy_star_exits_first() {
    let src = indoc! {"
        grammar T;
        s : A*? B ;
        A : 'a' ;
        B : 'b' ;
    "};
    let done = process(src);
    let atn = done.grammar.atn.as_ref().unwrap();
    let entry = atn
        .states
        .iter()
        .find(|s| matches!(s.kind, StateKind::StarLoopEntry { .. }))
        .unwrap();
    // The exit edge (to the loop end) comes before the body edge.
    let first_target = entry.transitions[0].target();
    assert!(matches!(
        atn.state(first_target).kind,
        StateKind::LoopEnd { .. }
    ));
}

#[test]
fn plus_loop_decides_at_the_loopback() {
    let src = indoc! {"
        grammar T;
        s : A+ ;
        A : 'a' ;
    "};
    let done = process(src);
    let atn = done.grammar.atn.as_ref().unwrap();
    let loopback = atn
        .states
        .iter()
        .find(|s| matches!(s.kind, StateKind::PlusLoopBack))
        .unwrap();
    assert!(loopback.decision.is_some());
    let start = atn
        .states
        .iter()
        .find(|s| matches!(s.kind, StateKind::PlusBlockStart { .. }))
        .unwrap();
    assert!(start.decision.is_none());
}

#[test]
fn lexer_literals_chain_code_points() {
    let src = "lexer grammar L; A : 'ab' ;";
    let done = process(src);
    let atn = done.grammar.atn.as_ref().unwrap();
    insta::assert_snapshot!(dump_atn(atn), @r"
    s0 RuleStart(r0) -> eps s2
    s1 RuleStop(r0)
    s2 Basic(r0) -> atom(97) s3
    s3 Basic(r0) -> atom(98) s4
    s4 Basic(r0) -> eps s1
    s5 Basic(r0) -> eps s0
    ");
    assert_eq!(atn.mode_to_start, vec![5]);
    assert_eq!(atn.rule_to_token_type, vec![1]);
}

#[test]
fn case_insensitive_literals_expand_to_both_cases() {
    let src = indoc! {"
        lexer grammar L;
        options { caseInsensitive = true; }
        A : 'a1' ;
    "};
    let done = process(src);
    let atn = done.grammar.atn.as_ref().unwrap();
    let transitions: Vec<&Transition> = atn
        .states
        .iter()
        .flat_map(|s| &s.transitions)
        .filter(|t| matches!(t, Transition::Set { .. } | Transition::Atom { .. }))
        .collect();
    // 'a' expands to {A, a}; '1' has no case and stays an atom.
    assert!(matches!(
        transitions[0],
        Transition::Set { set, .. } if set.to_string() == "{65, 97}"
    ));
    assert!(matches!(
        transitions[1],
        Transition::Atom { label, .. } if *label == '1' as i32
    ));
}

#[test]
fn charset_and_negation_transitions() {
    let src = "lexer grammar L; X : ~[ab] [0-9] ;";
    let done = process(src);
    let atn = done.grammar.atn.as_ref().unwrap();
    let has_notset = atn
        .states
        .iter()
        .flat_map(|s| &s.transitions)
        .any(|t| matches!(t, Transition::NotSet { set, .. } if set.contains('a' as i32)));
    let has_set = atn
        .states
        .iter()
        .flat_map(|s| &s.transitions)
        .any(|t| matches!(t, Transition::Set { set, .. } if set.contains('5' as i32)));
    assert!(has_notset && has_set);
}

#[test]
fn rule_calls_carry_follow_states() {
    let src = indoc! {"
        grammar T;
        s : a B ;
        a : A ;
        A : 'a' ;
        B : 'b' ;
    "};
    let done = process(src);
    let atn = done.grammar.atn.as_ref().unwrap();
    let call = atn
        .states
        .iter()
        .flat_map(|s| &s.transitions)
        .find_map(|t| match t {
            Transition::Rule {
                target,
                rule,
                follow,
                ..
            } => Some((*target, *rule, *follow)),
            _ => None,
        })
        .expect("one rule call");
    let (target, rule, follow) = call;
    assert_eq!(rule, 1);
    assert_eq!(target, atn.rule_to_start[1]);
    // The follow state continues the caller's alternative.
    assert!(matches!(atn.state(follow).kind, StateKind::Basic));
}

#[test]
fn left_recursive_rule_shape() {
    let src = "grammar T; e : e '+' e | INT ; INT : [0-9]+ ;";
    let done = process(src);
    assert!(done.is_valid(), "{}", done.diagnostics().dump());
    let atn = done.grammar.atn.as_ref().unwrap();

    let start = atn.state(atn.rule_to_start[0]);
    assert!(matches!(
        start.kind,
        StateKind::RuleStart {
            left_recursive: true,
            ..
        }
    ));
    assert!(atn.states.iter().any(|s| matches!(
        s.kind,
        StateKind::StarLoopEntry {
            precedence_decision: true,
            ..
        }
    )));
    assert!(
        atn.states
            .iter()
            .flat_map(|s| &s.transitions)
            .any(|t| matches!(t, Transition::PrecedencePredicate { precedence: 2, .. }))
    );
    assert!(
        atn.states
            .iter()
            .flat_map(|s| &s.transitions)
            .any(|t| matches!(t, Transition::Rule { precedence: 3, .. }))
    );
}

#[test]
fn predicates_and_actions_index_into_the_grammar() {
    let src = indoc! {"
        lexer grammar L;
        A : 'a' {start()} 'b' {finish()} ;
        B : {ok()}? 'b' ;
    "};
    let done = process(src);
    let g = &done.grammar;
    let atn = g.atn.as_ref().unwrap();

    let action_indexes: Vec<u32> = atn
        .states
        .iter()
        .flat_map(|s| &s.transitions)
        .filter_map(|t| match t {
            Transition::Action { action_index, .. } => Some(*action_index),
            _ => None,
        })
        .collect();
    assert_eq!(action_indexes, vec![0, 1]);
    assert_eq!(g.lexer_actions.len(), 2);

    assert!(
        atn.states
            .iter()
            .flat_map(|s| &s.transitions)
            .any(|t| matches!(t, Transition::Predicate { pred_index: 0, .. }))
    );
    assert_eq!(g.sempreds.len(), 1);
}

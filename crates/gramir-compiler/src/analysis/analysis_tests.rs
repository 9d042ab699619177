//! Tests for decision lookahead analysis.

use gramir_atn::IntervalSet;
use indoc::indoc;

use crate::test_utils::process;

use super::disjoint;

fn lookahead_strings(src: &str) -> Vec<(bool, Vec<String>)> {
    let done = process(src);
    assert!(done.is_valid(), "{}", done.diagnostics().dump());
    done.grammar
        .decision_ll1
        .iter()
        .zip(&done.grammar.decision_lookahead)
        .map(|(&ll1, sets)| (ll1, sets.iter().map(IntervalSet::to_string).collect()))
        .collect()
}

#[test]
fn token_alternatives_are_ll1() {
    let src = indoc! {"
        grammar T;
        s : A | B ;
        A : 'a' ;
        B : 'b' ;
    "};
    assert_eq!(
        lookahead_strings(src),
        vec![(true, vec!["1".to_owned(), "2".to_owned()])]
    );
}

#[test]
fn lookahead_reaches_through_rule_calls() {
    let src = indoc! {"
        grammar T;
        s : a | B ;
        a : C D ;
        B : 'b' ;
        C : 'c' ;
        D : 'd' ;
    "};
    let decisions = lookahead_strings(src);
    assert_eq!(decisions.len(), 1);
    let (ll1, sets) = &decisions[0];
    assert!(ll1);
    // Alt 1 starts with whatever `a` starts with.
    assert_eq!(sets[0], "2");
    assert_eq!(sets[1], "1");
}

#[test]
fn shared_prefixes_are_not_ll1() {
    let src = indoc! {"
        grammar T;
        s : A B | A C ;
        A : 'a' ;
        B : 'b' ;
        C : 'c' ;
    "};
    let done = process(src);
    assert_eq!(done.grammar.decision_ll1, vec![false]);
    // The sets are still recorded for diagnostics.
    assert_eq!(done.grammar.decision_lookahead[0].len(), 2);
    assert_eq!(done.grammar.decision_lookahead[0][0].to_string(), "1");
}

#[test]
fn empty_alternative_sees_the_follow() {
    // With no caller context, the optional's exit sees EOF.
    let src = indoc! {"
        grammar T;
        s : A? ;
        A : 'a' ;
    "};
    let decisions = lookahead_strings(src);
    assert_eq!(decisions, vec![(true, vec!["1".to_owned(), "-1".to_owned()])]);
}

#[test]
fn disjoint_is_pairwise() {
    let a: IntervalSet = [1, 2].into_iter().collect();
    let b: IntervalSet = [3].into_iter().collect();
    let c: IntervalSet = [2, 5].into_iter().collect();
    assert!(disjoint(&[a.clone(), b.clone()]));
    assert!(!disjoint(&[a, b, c]));
    assert!(disjoint(&[]));
}

#[test]
fn lexer_decisions_use_code_points() {
    let src = "lexer grammar L; A : 'x'+ ;";
    let done = process(src);
    let g = &done.grammar;
    // The plus-loop decision: iterate on 'x', exit on EOF.
    assert_eq!(g.decision_ll1, vec![true]);
    let sets: Vec<String> = g.decision_lookahead[0]
        .iter()
        .map(IntervalSet::to_string)
        .collect();
    assert_eq!(sets, vec!["120".to_owned(), "-1".to_owned()]);
}

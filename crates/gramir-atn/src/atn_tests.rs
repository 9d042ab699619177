//! Tests for the network container.

use std::collections::HashSet;

use super::atn::{Atn, AtnKind};
use super::dump::dump_atn;
use super::state::{NO_STATE, StateKind};
use super::transition::Transition;

/// One rule, one two-alt decision block: `r : A | B ;` with A=5, B=6.
fn two_alt_atn() -> Atn {
    let mut atn = Atn::new(AtnKind::Parser, 6);

    let start = atn.add_state(
        StateKind::RuleStart {
            stop: NO_STATE,
            left_recursive: false,
        },
        0,
    );
    let stop = atn.add_state(StateKind::RuleStop, 0);
    if let StateKind::RuleStart { stop: s, .. } = &mut atn.state_mut(start).kind {
        *s = stop;
    }

    let block = atn.add_state(StateKind::BlockStart { end: NO_STATE }, 0);
    let alt1 = atn.add_state(StateKind::Basic, 0);
    let alt2 = atn.add_state(StateKind::Basic, 0);
    let end = atn.add_state(StateKind::BlockEnd { start: block }, 0);
    if let StateKind::BlockStart { end: e } = &mut atn.state_mut(block).kind {
        *e = end;
    }

    atn.add_transition(start, Transition::Epsilon { target: block });
    atn.add_transition(block, Transition::Epsilon { target: alt1 });
    atn.add_transition(block, Transition::Epsilon { target: alt2 });
    atn.add_transition(alt1, Transition::Atom { target: end, label: 5 });
    atn.add_transition(alt2, Transition::Atom { target: end, label: 6 });
    atn.add_transition(end, Transition::Epsilon { target: stop });

    atn.define_decision(block);
    atn.rule_to_start.push(start);
    atn.rule_to_stop.push(stop);
    atn.rule_to_token_type.push(0);
    atn
}

#[test]
fn decision_registry_round_trips() {
    let atn = two_alt_atn();
    assert_eq!(atn.num_decisions(), 1);
    assert_eq!(atn.decision_state(0).decision, Some(0));
    atn.verify().unwrap();
}

#[test]
fn dump_shows_the_shape() {
    let atn = two_alt_atn();
    insta::assert_snapshot!(dump_atn(&atn), @r"
    s0 RuleStart(r0) -> eps s2
    s1 RuleStop(r0)
    s2 BlockStart(r0) d0 -> eps s3, eps s4
    s3 Basic(r0) -> atom(5) s5
    s4 Basic(r0) -> atom(6) s5
    s5 BlockEnd(r0) -> eps s1
    ");
}

#[test]
fn compaction_renumbers_and_remaps() {
    let mut atn = Atn::new(AtnKind::Parser, 3);
    let a = atn.add_state(StateKind::Basic, 0);
    let dead = atn.add_state(StateKind::Basic, 0);
    let b = atn.add_state(StateKind::Basic, 0);
    atn.add_transition(a, Transition::Atom { target: b, label: 1 });
    atn.rule_to_start.push(a);
    atn.rule_to_stop.push(b);
    atn.rule_to_token_type.push(0);

    atn.compact(&HashSet::from([dead]));

    assert_eq!(atn.states.len(), 2);
    assert_eq!(atn.states[1].id, 1);
    assert_eq!(atn.states[0].transitions[0].target(), 1);
    assert_eq!(atn.rule_to_stop[0], 1);
    atn.verify().unwrap();
}

#[test]
fn verify_catches_dangling_targets() {
    let mut atn = Atn::new(AtnKind::Parser, 1);
    let a = atn.add_state(StateKind::Basic, 0);
    atn.add_transition(a, Transition::Epsilon { target: 42 });
    assert!(atn.verify().is_err());
}

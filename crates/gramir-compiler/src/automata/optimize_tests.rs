//! Tests for the ATN optimizer.

use gramir_atn::{Atn, AtnKind, NO_STATE, StateKind, Transition, dump_atn};

use super::optimize_atn;

/// `r : ( A | B ) ;` with the alternatives spelled out, one nesting level
/// below the rule body so the merge applies.
fn nested_singleton_block() -> Atn {
    let mut atn = Atn::new(AtnKind::Parser, 2);

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

    let body = atn.add_state(StateKind::Basic, 0);
    let block = atn.add_state(StateKind::BlockStart { end: NO_STATE }, 0);
    let alt1 = atn.add_state(StateKind::Basic, 0);
    let alt2 = atn.add_state(StateKind::Basic, 0);
    let end = atn.add_state(StateKind::BlockEnd { start: block }, 0);
    if let StateKind::BlockStart { end: e } = &mut atn.state_mut(block).kind {
        *e = end;
    }

    atn.add_transition(start, Transition::Epsilon { target: body });
    atn.add_transition(body, Transition::Epsilon { target: block });
    atn.add_transition(block, Transition::Epsilon { target: alt1 });
    atn.add_transition(block, Transition::Epsilon { target: alt2 });
    atn.add_transition(alt1, Transition::Atom { target: end, label: 1 });
    atn.add_transition(alt2, Transition::Atom { target: end, label: 2 });
    atn.add_transition(end, Transition::Epsilon { target: stop });

    atn.define_decision(block);
    atn.rule_to_start.push(start);
    atn.rule_to_stop.push(stop);
    atn.rule_to_token_type.push(0);
    atn
}

#[test]
fn singleton_alternatives_merge_into_a_set() {
    let mut atn = nested_singleton_block();
    let stats = optimize_atn(&mut atn);

    assert_eq!(stats.decisions_merged, 1);
    assert_eq!(stats.states_removed, 2);
    atn.verify().unwrap();

    insta::assert_snapshot!(dump_atn(&atn), @r"
    s0 RuleStart(r0) -> eps s2
    s1 RuleStop(r0)
    s2 Basic(r0) -> eps s3
    s3 BlockStart(r0) d0 -> set(1..2) s4
    s4 BlockEnd(r0) -> eps s1
    ");
}

#[test]
fn rule_body_decisions_never_merge() {
    let mut atn = Atn::new(AtnKind::Parser, 2);
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
    atn.add_transition(alt1, Transition::Atom { target: end, label: 1 });
    atn.add_transition(alt2, Transition::Atom { target: end, label: 2 });
    atn.add_transition(end, Transition::Epsilon { target: stop });
    atn.define_decision(block);
    atn.rule_to_start.push(start);
    atn.rule_to_stop.push(stop);
    atn.rule_to_token_type.push(0);

    let stats = optimize_atn(&mut atn);
    assert_eq!(stats.decisions_merged, 0);
    assert_eq!(stats.states_removed, 0);
}

#[test]
fn multi_transition_alternatives_do_not_merge() {
    let mut atn = nested_singleton_block();
    // Give alt1 a second step so it is no longer a singleton.
    let extra = atn.add_state(StateKind::Basic, 0);
    let end = 6;
    atn.state_mut(4).transitions = vec![Transition::Atom {
        target: extra,
        label: 1,
    }];
    atn.add_transition(extra, Transition::Atom { target: end, label: 3 });

    let stats = optimize_atn(&mut atn);
    assert_eq!(stats.decisions_merged, 0);
}

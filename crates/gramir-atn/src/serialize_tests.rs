//! Round-trip tests for the integer-stream form.

use super::atn::{Atn, AtnKind};
use super::interval::IntervalSet;
use super::serialize::{deserialize, serialize};
use super::state::{NO_STATE, StateKind};
use super::transition::Transition;

/// Lexer-shaped network exercising every transition kind and both tables.
fn kitchen_sink_atn() -> Atn {
    let mut atn = Atn::new(AtnKind::Lexer, 4);

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
    let a = atn.add_state(StateKind::Basic, 0);
    let b = atn.add_state(StateKind::Basic, 0);
    let c = atn.add_state(StateKind::Basic, 0);

    let mut set = IntervalSet::of_range('0' as i32, '9' as i32);
    set.add('_' as i32);

    atn.add_transition(start, Transition::Epsilon { target: a });
    atn.add_transition(
        a,
        Transition::Range {
            target: b,
            from: 'a' as i32,
            to: 'z' as i32,
        },
    );
    atn.add_transition(
        a,
        Transition::Set {
            target: b,
            set: set.clone(),
        },
    );
    atn.add_transition(a, Transition::NotSet { target: b, set });
    atn.add_transition(
        b,
        Transition::Rule {
            target: start,
            rule: 0,
            precedence: 2,
            follow: c,
        },
    );
    atn.add_transition(
        b,
        Transition::Predicate {
            target: c,
            rule: 0,
            pred_index: 1,
        },
    );
    atn.add_transition(
        c,
        Transition::Action {
            target: stop,
            rule: 0,
            action_index: 0,
        },
    );
    atn.add_transition(c, Transition::Wildcard { target: stop });
    atn.add_transition(
        c,
        Transition::PrecedencePredicate {
            target: stop,
            precedence: 3,
        },
    );
    atn.add_transition(c, Transition::Atom { target: stop, label: crate::TOKEN_EOF });

    atn.rule_to_start.push(start);
    atn.rule_to_stop.push(stop);
    atn.rule_to_token_type.push(1);
    atn.mode_to_start.push(start);
    atn
}

#[test]
fn round_trip_is_structurally_identical() {
    let atn = kitchen_sink_atn();
    let words = serialize(&atn).unwrap();
    let back = deserialize(&words).unwrap();
    assert_eq!(back, atn);
}

#[test]
fn round_trip_preserves_decisions_and_links() {
    let mut atn = Atn::new(AtnKind::Parser, 2);
    let entry = atn.add_state(
        StateKind::StarLoopEntry {
            loopback: NO_STATE,
            precedence_decision: true,
        },
        0,
    );
    let back_state = atn.add_state(StateKind::StarLoopBack, 0);
    let end = atn.add_state(StateKind::LoopEnd { loopback: back_state }, 0);
    if let StateKind::StarLoopEntry { loopback, .. } = &mut atn.state_mut(entry).kind {
        *loopback = back_state;
    }
    atn.add_transition(entry, Transition::Epsilon { target: end });
    atn.add_transition(back_state, Transition::Epsilon { target: entry });
    atn.define_decision(entry);

    let back = deserialize(&serialize(&atn).unwrap()).unwrap();
    assert_eq!(back, atn);
    assert_eq!(back.decision_state(0).decision, Some(0));
    assert!(matches!(
        back.states[0].kind,
        StateKind::StarLoopEntry {
            loopback: 1,
            precedence_decision: true
        }
    ));
}

#[test]
fn shared_sets_are_deduplicated_in_the_stream() {
    let mut atn = Atn::new(AtnKind::Lexer, 1);
    let a = atn.add_state(StateKind::Basic, 0);
    let b = atn.add_state(StateKind::Basic, 0);
    let set = IntervalSet::of_range(10, 20);
    atn.add_transition(a, Transition::Set { target: b, set: set.clone() });
    atn.add_transition(a, Transition::Set { target: b, set });

    let words = serialize(&atn).unwrap();
    let back = deserialize(&words).unwrap();
    assert_eq!(back, atn);

    // Two transitions, one serialized set.
    let shorter = serialize(&back).unwrap();
    assert_eq!(words, shorter);
}

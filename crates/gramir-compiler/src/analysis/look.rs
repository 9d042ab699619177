//! LOOK computation: the set of symbols that can start a path from a
//! state, bounded to one symbol of lookahead.

use std::collections::HashSet;

use gramir_atn::{Atn, IntervalSet, StateId, TOKEN_EOF, Transition};

/// LOOK from a state: epsilon closure until the first consuming
/// transition, following rule calls through their return states. An
/// empty follow stack at a rule stop contributes EOF.
pub fn look(atn: &Atn, start: StateId, universe_min: i32, universe_max: i32) -> IntervalSet {
    let mut out = IntervalSet::new();
    let mut follow = Vec::new();
    let mut visited = HashSet::new();
    closure(
        atn,
        start,
        &mut follow,
        &mut visited,
        &mut out,
        universe_min,
        universe_max,
    );
    out
}

/// LOOK through one transition: its own label if it consumes, otherwise
/// the closure of its target.
pub fn look_transition(
    atn: &Atn,
    t: &Transition,
    universe_min: i32,
    universe_max: i32,
) -> IntervalSet {
    if let Some(label) = t.label(universe_min, universe_max) {
        return label;
    }
    match t {
        Transition::Rule { target, follow, .. } => {
            let mut out = IntervalSet::new();
            let mut stack = vec![*follow];
            let mut visited = HashSet::new();
            closure(
                atn,
                *target,
                &mut stack,
                &mut visited,
                &mut out,
                universe_min,
                universe_max,
            );
            out
        }
        _ => look(atn, t.target(), universe_min, universe_max),
    }
}

fn closure(
    atn: &Atn,
    s: StateId,
    follow: &mut Vec<StateId>,
    visited: &mut HashSet<(StateId, Option<StateId>)>,
    out: &mut IntervalSet,
    universe_min: i32,
    universe_max: i32,
) {
    // Keyed on the follow top as well, so re-entry through a different
    // call site is not pruned away.
    if !visited.insert((s, follow.last().copied())) {
        return;
    }

    let state = atn.state(s);
    if state.is_rule_stop() {
        match follow.pop() {
            Some(ret) => {
                closure(atn, ret, follow, visited, out, universe_min, universe_max);
                follow.push(ret);
            }
            None => {
                out.add(TOKEN_EOF);
            }
        }
        return;
    }

    for t in &state.transitions {
        if let Some(label) = t.label(universe_min, universe_max) {
            out.add_set(&label);
            continue;
        }
        match t {
            Transition::Rule {
                target,
                follow: ret,
                ..
            } => {
                follow.push(*ret);
                closure(atn, *target, follow, visited, out, universe_min, universe_max);
                follow.pop();
            }
            _ => closure(
                atn,
                t.target(),
                follow,
                visited,
                out,
                universe_min,
                universe_max,
            ),
        }
    }
}

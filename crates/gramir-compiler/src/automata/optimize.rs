//! Post-construction ATN optimization.
//!
//! Two passes over the freshly built network:
//!
//! 1. **Set merge** - a decision whose alternatives each consume one
//!    symbol and reconverge on the block end collapses into a single set
//!    transition.
//! 2. **Compaction** - states orphaned by the merge (and anything else
//!    unreachable from a rule or mode entry) are removed and the state
//!    array renumbered, restoring `states[n].id == n`.

use std::collections::HashSet;

use gramir_atn::{Atn, IntervalSet, StateId, StateKind, Transition};

/// Statistics from the optimization passes.
#[derive(Debug, Default)]
pub struct OptimizeStats {
    pub decisions_merged: usize,
    pub states_removed: usize,
}

pub fn optimize_atn(atn: &mut Atn) -> OptimizeStats {
    let mut stats = OptimizeStats::default();
    stats.decisions_merged = merge_sets(atn);

    let dead = unreachable_states(atn);
    stats.states_removed = dead.len();
    atn.compact(&dead);
    stats
}

/// Merge `BlockStart` decisions whose alternatives are all
/// epsilon → one consuming transition → block end.
///
/// A rule's body block is exempt: its alternative numbering is part of
/// the parse-tree contract, so the decision must survive even when every
/// alternative is a singleton.
fn merge_sets(atn: &mut Atn) -> usize {
    let mut merged = 0;
    let universe = symbol_universe(atn);

    let rule_bodies: HashSet<StateId> = atn
        .rule_to_start
        .iter()
        .flat_map(|&s| atn.state(s).transitions.iter().map(Transition::target))
        .collect();

    for id in 0..atn.states.len() as StateId {
        let StateKind::BlockStart { end } = atn.state(id).kind else {
            continue;
        };
        if atn.state(id).transitions.len() < 2 || rule_bodies.contains(&id) {
            continue;
        }

        let mut union = IntervalSet::new();
        let mut mergeable = true;
        for t in &atn.state(id).transitions {
            let Transition::Epsilon { target } = t else {
                mergeable = false;
                break;
            };
            let alt = atn.state(*target);
            let [only] = alt.transitions.as_slice() else {
                mergeable = false;
                break;
            };
            if only.target() != end {
                mergeable = false;
                break;
            }
            match only.label(universe.0, universe.1) {
                Some(label) if !matches!(only, Transition::NotSet { .. }) => union.add_set(&label),
                _ => {
                    mergeable = false;
                    break;
                }
            }
        }
        if !mergeable || union.is_nil() {
            continue;
        }

        atn.state_mut(id).transitions = vec![Transition::Set {
            target: end,
            set: union,
        }];
        merged += 1;
    }
    merged
}

fn symbol_universe(atn: &Atn) -> (i32, i32) {
    match atn.kind {
        gramir_atn::AtnKind::Lexer => (gramir_atn::MIN_CHAR_VALUE, gramir_atn::MAX_CHAR_VALUE),
        gramir_atn::AtnKind::Parser => (gramir_atn::MIN_USER_TOKEN_TYPE, atn.max_token_type),
    }
}

/// States not reachable from any rule start, rule stop, or mode entry.
fn unreachable_states(atn: &Atn) -> HashSet<StateId> {
    let mut reachable: HashSet<StateId> = HashSet::new();
    let mut work: Vec<StateId> = atn
        .rule_to_start
        .iter()
        .chain(&atn.rule_to_stop)
        .chain(&atn.mode_to_start)
        .copied()
        .collect();

    while let Some(id) = work.pop() {
        if !reachable.insert(id) {
            continue;
        }
        for t in &atn.state(id).transitions {
            work.push(t.target());
            if let Transition::Rule { follow, .. } = t {
                work.push(*follow);
            }
        }
    }

    (0..atn.states.len() as StateId)
        .filter(|id| !reachable.contains(id))
        .collect()
}

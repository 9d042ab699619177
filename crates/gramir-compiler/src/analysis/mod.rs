//! Decision analysis.
//!
//! Computes the k=1 lookahead set of every decision alternative and
//! marks the decisions whose sets are pairwise disjoint as LL(1). The
//! code generator chooses between an inline lookahead test and the
//! adaptive-prediction call path based on that flag; non-LL(1) decisions
//! keep their sets for diagnostics.
//!
//! Left-recursion cycles the transform could not remove are reported by
//! the cycle detector during the semantic pipeline; by the time analysis
//! runs, the rule graph is loop-safe and the closure only needs a
//! visited guard against epsilon cycles.

mod look;

#[cfg(test)]
mod analysis_tests;

pub use look::look;

use gramir_atn::{AtnKind, IntervalSet, MAX_CHAR_VALUE, MIN_CHAR_VALUE, MIN_USER_TOKEN_TYPE};

use crate::grammar::Grammar;

/// Fill `decision_lookahead` and `decision_ll1` for every decision.
pub fn analyze_decisions(g: &mut Grammar) {
    let Some(atn) = &g.atn else { return };

    let (lo, hi) = match atn.kind {
        AtnKind::Lexer => (MIN_CHAR_VALUE, MAX_CHAR_VALUE),
        AtnKind::Parser => (MIN_USER_TOKEN_TYPE, atn.max_token_type),
    };

    let mut lookahead = Vec::with_capacity(atn.decision_to_state.len());
    let mut ll1 = Vec::with_capacity(atn.decision_to_state.len());

    for &sid in &atn.decision_to_state {
        let state = atn.state(sid);
        let mut alt_sets = Vec::with_capacity(state.transitions.len());
        for t in &state.transitions {
            alt_sets.push(look::look_transition(atn, t, lo, hi));
        }
        ll1.push(disjoint(&alt_sets));
        lookahead.push(alt_sets);
    }

    g.decision_lookahead = lookahead;
    g.decision_ll1 = ll1;
}

/// True when the sets are pairwise disjoint, i.e. one token of lookahead
/// picks the alternative.
pub fn disjoint(sets: &[IntervalSet]) -> bool {
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            if a.intersects(b) {
                return false;
            }
        }
    }
    true
}

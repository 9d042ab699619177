//! ATN transitions.

use crate::interval::IntervalSet;
use crate::state::StateId;

/// A labeled edge between two states.
///
/// Consuming transitions (`Atom`, `Range`, `Set`, `NotSet`, `Wildcard`)
/// match one token or code point. The rest are control flow: `Rule` calls
/// another rule's start state and carries the caller-side return state;
/// `Action`/`Predicate`/`PrecedencePredicate` index into the owning
/// grammar's side tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Epsilon {
        target: StateId,
    },
    Atom {
        target: StateId,
        label: i32,
    },
    Range {
        target: StateId,
        from: i32,
        to: i32,
    },
    Set {
        target: StateId,
        set: IntervalSet,
    },
    NotSet {
        target: StateId,
        set: IntervalSet,
    },
    Rule {
        /// The callee's rule start state.
        target: StateId,
        rule: u32,
        precedence: i32,
        /// Caller-side state reached after the callee returns.
        follow: StateId,
    },
    Predicate {
        target: StateId,
        rule: u32,
        pred_index: u32,
    },
    Action {
        target: StateId,
        rule: u32,
        action_index: u32,
    },
    Wildcard {
        target: StateId,
    },
    PrecedencePredicate {
        target: StateId,
        precedence: i32,
    },
}

impl Transition {
    pub fn target(&self) -> StateId {
        match self {
            Transition::Epsilon { target }
            | Transition::Atom { target, .. }
            | Transition::Range { target, .. }
            | Transition::Set { target, .. }
            | Transition::NotSet { target, .. }
            | Transition::Rule { target, .. }
            | Transition::Predicate { target, .. }
            | Transition::Action { target, .. }
            | Transition::Wildcard { target }
            | Transition::PrecedencePredicate { target, .. } => *target,
        }
    }

    pub fn set_target(&mut self, new: StateId) {
        match self {
            Transition::Epsilon { target }
            | Transition::Atom { target, .. }
            | Transition::Range { target, .. }
            | Transition::Set { target, .. }
            | Transition::NotSet { target, .. }
            | Transition::Rule { target, .. }
            | Transition::Predicate { target, .. }
            | Transition::Action { target, .. }
            | Transition::Wildcard { target }
            | Transition::PrecedencePredicate { target, .. } => *target = new,
        }
    }

    /// Non-consuming: followed during epsilon closure.
    ///
    /// `Rule` transitions are calls, not epsilons; closure handles them
    /// separately because the return state matters.
    pub fn is_epsilon_like(&self) -> bool {
        matches!(
            self,
            Transition::Epsilon { .. }
                | Transition::Predicate { .. }
                | Transition::Action { .. }
                | Transition::PrecedencePredicate { .. }
        )
    }

    /// The set of symbols this transition matches, if it consumes input.
    ///
    /// `NotSet` needs the universe bound to complement against; `Wildcard`
    /// matches the whole universe.
    pub fn label(&self, universe_min: i32, universe_max: i32) -> Option<IntervalSet> {
        match self {
            Transition::Atom { label, .. } => Some(IntervalSet::of(*label)),
            Transition::Range { from, to, .. } => Some(IntervalSet::of_range(*from, *to)),
            Transition::Set { set, .. } => Some(set.clone()),
            Transition::NotSet { set, .. } => Some(set.complement(universe_min, universe_max)),
            Transition::Wildcard { .. } => {
                Some(IntervalSet::of_range(universe_min, universe_max))
            }
            _ => None,
        }
    }
}

//! ATN states.

use crate::transition::Transition;

/// Index into `Atn::states`.
pub type StateId = u32;

/// Placeholder for a link that is patched later during construction.
pub const NO_STATE: StateId = StateId::MAX;

/// What role a state plays in the network.
///
/// Kinds that carry a `StateId` link it to a partner state: a block start
/// knows its block end, loop entries know their loop-back state. Links are
/// patched in by the factory after both states exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Basic,
    /// Entry state of a rule. `stop` is the rule's stop state.
    RuleStart { stop: StateId, left_recursive: bool },
    /// Exit state of a rule; the only state with no outgoing edges
    /// until analysis follows rule-call return sites.
    RuleStop,
    /// Start of an alternative block; a decision state.
    BlockStart { end: StateId },
    /// Shared end of an alternative block.
    BlockEnd { start: StateId },
    /// Start of a `+` block; a decision state on re-entry.
    PlusBlockStart { loopback: StateId },
    /// Decision between another `+` iteration and falling out.
    PlusLoopBack,
    /// Start of an alternative block inside a `*` loop.
    StarBlockStart,
    /// Decision between entering a `*` body and skipping it.
    StarLoopEntry { loopback: StateId, precedence_decision: bool },
    /// Back edge of a `*` loop.
    StarLoopBack,
    /// Exit state of a `*`/`+` loop. `loopback` is the loop's back state.
    LoopEnd { loopback: StateId },
}

impl StateKind {
    /// Kinds that may carry a decision number.
    pub fn can_decide(&self) -> bool {
        matches!(
            self,
            StateKind::BlockStart { .. }
                | StateKind::PlusBlockStart { .. }
                | StateKind::PlusLoopBack
                | StateKind::StarBlockStart
                | StateKind::StarLoopEntry { .. }
        )
    }
}

/// One state of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtnState {
    pub id: StateId,
    pub kind: StateKind,
    /// Index of the rule this state belongs to.
    pub rule: u32,
    /// Decision number, for states that introduce nondeterminism.
    pub decision: Option<u32>,
    pub transitions: Vec<Transition>,
}

impl AtnState {
    pub fn new(id: StateId, kind: StateKind, rule: u32) -> Self {
        Self {
            id,
            kind,
            rule,
            decision: None,
            transitions: Vec::new(),
        }
    }

    pub fn add_transition(&mut self, t: Transition) {
        self.transitions.push(t);
    }

    pub fn is_rule_stop(&self) -> bool {
        matches!(self.kind, StateKind::RuleStop)
    }

    pub fn is_decision(&self) -> bool {
        self.decision.is_some()
    }

    /// True when every outgoing edge is non-consuming.
    pub fn epsilon_only_transitions(&self) -> bool {
        self.transitions.iter().all(Transition::is_epsilon_like)
    }
}

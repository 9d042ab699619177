//! The network itself: state array, decision registry, rule links.

use std::collections::HashSet;

use crate::state::{AtnState, NO_STATE, StateId, StateKind};
use crate::transition::Transition;

/// Which kind of recognizer this network drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtnKind {
    Lexer,
    Parser,
}

/// A complete transition network for one grammar.
///
/// States live in a flat vector; `AtnState::id` equals the state's index
/// after construction and again after every compaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atn {
    pub kind: AtnKind,
    pub states: Vec<AtnState>,
    /// Decision number → decision state.
    pub decision_to_state: Vec<StateId>,
    /// Rule index → rule start state.
    pub rule_to_start: Vec<StateId>,
    /// Rule index → rule stop state.
    pub rule_to_stop: Vec<StateId>,
    /// Rule index → token type produced (lexer ATNs; `TOKEN_INVALID_TYPE`
    /// for fragments and parser ATNs).
    pub rule_to_token_type: Vec<i32>,
    /// Mode index → mode start state (lexer ATNs).
    pub mode_to_start: Vec<StateId>,
    pub max_token_type: i32,
}

impl Atn {
    pub fn new(kind: AtnKind, max_token_type: i32) -> Self {
        Self {
            kind,
            states: Vec::new(),
            decision_to_state: Vec::new(),
            rule_to_start: Vec::new(),
            rule_to_stop: Vec::new(),
            rule_to_token_type: Vec::new(),
            mode_to_start: Vec::new(),
            max_token_type,
        }
    }

    pub fn add_state(&mut self, kind: StateKind, rule: u32) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(AtnState::new(id, kind, rule));
        id
    }

    pub fn state(&self, id: StateId) -> &AtnState {
        &self.states[id as usize]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut AtnState {
        &mut self.states[id as usize]
    }

    pub fn add_transition(&mut self, from: StateId, t: Transition) {
        self.state_mut(from).add_transition(t);
    }

    /// Register `state` as a decision, returning its decision number.
    pub fn define_decision(&mut self, state: StateId) -> u32 {
        let decision = self.decision_to_state.len() as u32;
        self.decision_to_state.push(state);
        self.state_mut(state).decision = Some(decision);
        decision
    }

    pub fn decision_state(&self, decision: u32) -> &AtnState {
        self.state(self.decision_to_state[decision as usize])
    }

    pub fn num_decisions(&self) -> usize {
        self.decision_to_state.len()
    }

    /// Remove `dead` states, renumbering the survivors so that
    /// `states[n].id == n` again. All transition targets, kind links,
    /// decision entries, and rule/mode tables are remapped.
    ///
    /// Dead states must be unreferenced by any surviving transition.
    pub fn compact(&mut self, dead: &HashSet<StateId>) {
        if dead.is_empty() {
            return;
        }

        let mut remap = vec![NO_STATE; self.states.len()];
        let mut next: StateId = 0;
        for (old, slot) in remap.iter_mut().enumerate() {
            if !dead.contains(&(old as StateId)) {
                *slot = next;
                next += 1;
            }
        }

        let map = |id: StateId| -> StateId {
            if id == NO_STATE {
                return NO_STATE;
            }
            let new = remap[id as usize];
            debug_assert_ne!(new, NO_STATE, "dead state still referenced");
            new
        };

        let old_states = std::mem::take(&mut self.states);
        for mut st in old_states {
            if dead.contains(&st.id) {
                continue;
            }
            st.id = map(st.id);
            match &mut st.kind {
                StateKind::RuleStart { stop, .. } => *stop = map(*stop),
                StateKind::BlockStart { end } => *end = map(*end),
                StateKind::BlockEnd { start } => *start = map(*start),
                StateKind::PlusBlockStart { loopback } => *loopback = map(*loopback),
                StateKind::StarLoopEntry { loopback, .. } => *loopback = map(*loopback),
                StateKind::LoopEnd { loopback } => *loopback = map(*loopback),
                _ => {}
            }
            for t in &mut st.transitions {
                t.set_target(map(t.target()));
                if let Transition::Rule { follow, .. } = t {
                    *follow = map(*follow);
                }
            }
            self.states.push(st);
        }

        for id in self
            .decision_to_state
            .iter_mut()
            .chain(&mut self.rule_to_start)
            .chain(&mut self.rule_to_stop)
            .chain(&mut self.mode_to_start)
        {
            *id = map(*id);
        }
    }

    /// Structural consistency check, used by tests and debug builds.
    ///
    /// Verifies that ids match indices, every transition target is a valid
    /// state, and every decision entry points at a state carrying that
    /// decision number.
    pub fn verify(&self) -> Result<(), String> {
        let n = self.states.len() as StateId;
        for (i, st) in self.states.iter().enumerate() {
            if st.id != i as StateId {
                return Err(format!("state {} has id {}", i, st.id));
            }
            for t in &st.transitions {
                if t.target() >= n {
                    return Err(format!("state {} targets missing state {}", i, t.target()));
                }
                if let Transition::Rule { follow, .. } = t {
                    if *follow >= n {
                        return Err(format!("state {} follow targets missing state {}", i, follow));
                    }
                }
            }
        }
        for (d, &id) in self.decision_to_state.iter().enumerate() {
            if id >= n {
                return Err(format!("decision {d} maps to missing state {id}"));
            }
            if self.state(id).decision != Some(d as u32) {
                return Err(format!("decision {d} state disagrees on its number"));
            }
        }
        for &id in self.rule_to_start.iter().chain(&self.rule_to_stop) {
            if id >= n {
                return Err(format!("rule table references missing state {id}"));
            }
        }
        Ok(())
    }
}

//! Integer-stream serialization of an ATN.
//!
//! The serialized form is a sequence of 16-bit words:
//!
//! - a word with the high bit clear encodes its low 15 bits directly;
//! - a word with the high bit set starts a two-word big-endian pair whose
//!   31 payload bits are `(first & 0x7FFF) << 16 | second`;
//! - the pair `0xFFFF 0xFFFF` is the sentinel for `-1`.
//!
//! The sentinel occupies the top of the 31-bit range, so the largest
//! encodable payload is `0x7FFF_FFFE`; anything at or above `0x7FFF_FFFF`
//! is an overflow error. Layout:
//!
//! ```text
//! version, kind, max_token_type,
//! state count,    per state: tag rule link decision flag
//! set count,      per set: interval count, then a b pairs
//! transition count, per transition: src tag target a1 a2 a3
//! rule count,     per rule: start stop token_type
//! mode count,     per mode: start
//! decision count, per decision: state
//! ```

use thiserror::Error;

use crate::atn::{Atn, AtnKind};
use crate::interval::IntervalSet;
use crate::state::{NO_STATE, StateId, StateKind};
use crate::transition::Transition;

/// Format version written as the first word.
pub const SERIALIZED_VERSION: i32 = 1;

const SENTINEL: u16 = 0xFFFF;
const MAX_PAYLOAD: i64 = 0x7FFF_FFFE;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializeError {
    #[error("serialized value {value} exceeds the 31-bit payload limit")]
    PayloadTooLarge { value: i64 },

    #[error("cannot serialize negative value {value}")]
    NegativeValue { value: i32 },

    #[error("serialized data ended unexpectedly")]
    UnexpectedEof,

    #[error("unsupported serialized version {found}")]
    BadVersion { found: i32 },

    #[error("unrecognized tag {tag} at word {pos}")]
    BadTag { tag: i32, pos: usize },
}

pub type SerializeResult<T> = Result<T, SerializeError>;

fn write_int(out: &mut Vec<u16>, v: i32) -> SerializeResult<()> {
    if v == -1 {
        out.push(SENTINEL);
        out.push(SENTINEL);
        return Ok(());
    }
    if v < 0 {
        return Err(SerializeError::NegativeValue { value: v });
    }
    if (v as i64) > MAX_PAYLOAD {
        return Err(SerializeError::PayloadTooLarge { value: v as i64 });
    }
    if v < 0x8000 {
        out.push(v as u16);
    } else {
        out.push(0x8000 | ((v >> 16) as u16));
        out.push((v & 0xFFFF) as u16);
    }
    Ok(())
}

fn write_state_id(out: &mut Vec<u16>, id: StateId) -> SerializeResult<()> {
    if id == NO_STATE {
        write_int(out, -1)
    } else {
        write_int(out, id as i32)
    }
}

struct Reader<'a> {
    words: &'a [u16],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(words: &'a [u16]) -> Self {
        Self { words, pos: 0 }
    }

    fn next_word(&mut self) -> SerializeResult<u16> {
        let w = *self
            .words
            .get(self.pos)
            .ok_or(SerializeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(w)
    }

    fn read_int(&mut self) -> SerializeResult<i32> {
        let w = self.next_word()?;
        if w & 0x8000 == 0 {
            return Ok(w as i32);
        }
        let lo = self.next_word()?;
        let v = (((w & 0x7FFF) as i32) << 16) | lo as i32;
        Ok(if v == 0x7FFF_FFFF { -1 } else { v })
    }

    fn read_count(&mut self) -> SerializeResult<usize> {
        let v = self.read_int()?;
        if v < 0 {
            return Err(SerializeError::BadTag {
                tag: v,
                pos: self.pos,
            });
        }
        Ok(v as usize)
    }

    fn read_state_id(&mut self) -> SerializeResult<StateId> {
        let v = self.read_int()?;
        Ok(if v == -1 { NO_STATE } else { v as StateId })
    }
}

fn state_tag(kind: &StateKind) -> i32 {
    match kind {
        StateKind::Basic => 0,
        StateKind::RuleStart { .. } => 1,
        StateKind::RuleStop => 2,
        StateKind::BlockStart { .. } => 3,
        StateKind::BlockEnd { .. } => 4,
        StateKind::PlusBlockStart { .. } => 5,
        StateKind::PlusLoopBack => 6,
        StateKind::StarBlockStart => 7,
        StateKind::StarLoopEntry { .. } => 8,
        StateKind::StarLoopBack => 9,
        StateKind::LoopEnd { .. } => 10,
    }
}

fn state_link(kind: &StateKind) -> StateId {
    match kind {
        StateKind::RuleStart { stop, .. } => *stop,
        StateKind::BlockStart { end } => *end,
        StateKind::BlockEnd { start } => *start,
        StateKind::PlusBlockStart { loopback } => *loopback,
        StateKind::StarLoopEntry { loopback, .. } => *loopback,
        StateKind::LoopEnd { loopback } => *loopback,
        _ => NO_STATE,
    }
}

fn state_flag(kind: &StateKind) -> i32 {
    match kind {
        StateKind::RuleStart { left_recursive, .. } => *left_recursive as i32,
        StateKind::StarLoopEntry {
            precedence_decision,
            ..
        } => *precedence_decision as i32,
        _ => 0,
    }
}

fn kind_from_parts(tag: i32, link: StateId, flag: i32, pos: usize) -> SerializeResult<StateKind> {
    Ok(match tag {
        0 => StateKind::Basic,
        1 => StateKind::RuleStart {
            stop: link,
            left_recursive: flag != 0,
        },
        2 => StateKind::RuleStop,
        3 => StateKind::BlockStart { end: link },
        4 => StateKind::BlockEnd { start: link },
        5 => StateKind::PlusBlockStart { loopback: link },
        6 => StateKind::PlusLoopBack,
        7 => StateKind::StarBlockStart,
        8 => StateKind::StarLoopEntry {
            loopback: link,
            precedence_decision: flag != 0,
        },
        9 => StateKind::StarLoopBack,
        10 => StateKind::LoopEnd { loopback: link },
        _ => return Err(SerializeError::BadTag { tag, pos }),
    })
}

/// Serialize an ATN to its integer-stream form.
pub fn serialize(atn: &Atn) -> SerializeResult<Vec<u16>> {
    let mut out = Vec::new();
    write_int(&mut out, SERIALIZED_VERSION)?;
    write_int(&mut out, matches!(atn.kind, AtnKind::Parser) as i32)?;
    write_int(&mut out, atn.max_token_type)?;

    write_int(&mut out, atn.states.len() as i32)?;
    for st in &atn.states {
        write_int(&mut out, state_tag(&st.kind))?;
        write_int(&mut out, st.rule as i32)?;
        write_state_id(&mut out, state_link(&st.kind))?;
        write_int(&mut out, st.decision.map_or(-1, |d| d as i32))?;
        write_int(&mut out, state_flag(&st.kind))?;
    }

    // Interval sets are deduplicated; transitions reference them by index.
    fn set_index<'a>(sets: &mut Vec<&'a IntervalSet>, set: &'a IntervalSet) -> usize {
        match sets.iter().position(|s| *s == set) {
            Some(i) => i,
            None => {
                sets.push(set);
                sets.len() - 1
            }
        }
    }
    let mut sets: Vec<&IntervalSet> = Vec::new();
    let mut transitions: Vec<(StateId, i32, StateId, i32, i32, i32)> = Vec::new();
    for st in &atn.states {
        for t in &st.transitions {
            let rec = match t {
                Transition::Epsilon { target } => (st.id, 0, *target, 0, 0, 0),
                Transition::Atom { target, label } => (st.id, 1, *target, *label, 0, 0),
                Transition::Range { target, from, to } => (st.id, 2, *target, *from, *to, 0),
                Transition::Set { target, set } => {
                    (st.id, 3, *target, set_index(&mut sets, set) as i32, 0, 0)
                }
                Transition::NotSet { target, set } => {
                    (st.id, 4, *target, set_index(&mut sets, set) as i32, 0, 0)
                }
                Transition::Rule {
                    target,
                    rule,
                    precedence,
                    follow,
                } => (st.id, 5, *target, *rule as i32, *precedence, *follow as i32),
                Transition::Predicate {
                    target,
                    rule,
                    pred_index,
                } => (st.id, 6, *target, *rule as i32, *pred_index as i32, 0),
                Transition::Action {
                    target,
                    rule,
                    action_index,
                } => (st.id, 7, *target, *rule as i32, *action_index as i32, 0),
                Transition::Wildcard { target } => (st.id, 8, *target, 0, 0, 0),
                Transition::PrecedencePredicate { target, precedence } => {
                    (st.id, 9, *target, *precedence, 0, 0)
                }
            };
            transitions.push(rec);
        }
    }

    write_int(&mut out, sets.len() as i32)?;
    for set in &sets {
        write_int(&mut out, set.intervals().len() as i32)?;
        for iv in set.intervals() {
            write_int(&mut out, iv.a)?;
            write_int(&mut out, iv.b)?;
        }
    }

    write_int(&mut out, transitions.len() as i32)?;
    for (src, tag, target, a1, a2, a3) in transitions {
        write_int(&mut out, src as i32)?;
        write_int(&mut out, tag)?;
        write_int(&mut out, target as i32)?;
        write_int(&mut out, a1)?;
        write_int(&mut out, a2)?;
        write_int(&mut out, a3)?;
    }

    write_int(&mut out, atn.rule_to_start.len() as i32)?;
    for r in 0..atn.rule_to_start.len() {
        write_state_id(&mut out, atn.rule_to_start[r])?;
        write_state_id(&mut out, atn.rule_to_stop[r])?;
        let tt = atn.rule_to_token_type.get(r).copied().unwrap_or(0);
        write_int(&mut out, tt)?;
    }

    write_int(&mut out, atn.mode_to_start.len() as i32)?;
    for &m in &atn.mode_to_start {
        write_state_id(&mut out, m)?;
    }

    write_int(&mut out, atn.decision_to_state.len() as i32)?;
    for &d in &atn.decision_to_state {
        write_state_id(&mut out, d)?;
    }

    Ok(out)
}

/// Reconstruct an ATN from its integer-stream form.
pub fn deserialize(words: &[u16]) -> SerializeResult<Atn> {
    let mut r = Reader::new(words);

    let version = r.read_int()?;
    if version != SERIALIZED_VERSION {
        return Err(SerializeError::BadVersion { found: version });
    }
    let kind = if r.read_int()? == 0 {
        AtnKind::Lexer
    } else {
        AtnKind::Parser
    };
    let max_token_type = r.read_int()?;
    let mut atn = Atn::new(kind, max_token_type);

    let state_count = r.read_count()?;
    for _ in 0..state_count {
        let tag = r.read_int()?;
        let rule = r.read_int()? as u32;
        let link = r.read_state_id()?;
        let decision = r.read_int()?;
        let flag = r.read_int()?;
        let kind = kind_from_parts(tag, link, flag, r.pos)?;
        let id = atn.add_state(kind, rule);
        if decision >= 0 {
            atn.state_mut(id).decision = Some(decision as u32);
        }
    }

    let set_count = r.read_count()?;
    let mut sets = Vec::with_capacity(set_count);
    for _ in 0..set_count {
        let n = r.read_count()?;
        let mut set = IntervalSet::new();
        for _ in 0..n {
            let a = r.read_int()?;
            let b = r.read_int()?;
            set.add_range(a, b);
        }
        sets.push(set);
    }

    let transition_count = r.read_count()?;
    for _ in 0..transition_count {
        let src = r.read_state_id()?;
        let tag = r.read_int()?;
        let target = r.read_state_id()?;
        let a1 = r.read_int()?;
        let a2 = r.read_int()?;
        let a3 = r.read_int()?;
        let t = match tag {
            0 => Transition::Epsilon { target },
            1 => Transition::Atom { target, label: a1 },
            2 => Transition::Range {
                target,
                from: a1,
                to: a2,
            },
            3 => Transition::Set {
                target,
                set: sets[a1 as usize].clone(),
            },
            4 => Transition::NotSet {
                target,
                set: sets[a1 as usize].clone(),
            },
            5 => Transition::Rule {
                target,
                rule: a1 as u32,
                precedence: a2,
                follow: a3 as StateId,
            },
            6 => Transition::Predicate {
                target,
                rule: a1 as u32,
                pred_index: a2 as u32,
            },
            7 => Transition::Action {
                target,
                rule: a1 as u32,
                action_index: a2 as u32,
            },
            8 => Transition::Wildcard { target },
            9 => Transition::PrecedencePredicate {
                target,
                precedence: a1,
            },
            _ => return Err(SerializeError::BadTag { tag, pos: r.pos }),
        };
        atn.add_transition(src, t);
    }

    let rule_count = r.read_count()?;
    for _ in 0..rule_count {
        let start = r.read_state_id()?;
        let stop = r.read_state_id()?;
        let tt = r.read_int()?;
        atn.rule_to_start.push(start);
        atn.rule_to_stop.push(stop);
        atn.rule_to_token_type.push(tt);
    }

    let mode_count = r.read_count()?;
    for _ in 0..mode_count {
        let m = r.read_state_id()?;
        atn.mode_to_start.push(m);
    }

    let decision_count = r.read_count()?;
    for _ in 0..decision_count {
        let d = r.read_state_id()?;
        atn.decision_to_state.push(d);
    }

    Ok(atn)
}

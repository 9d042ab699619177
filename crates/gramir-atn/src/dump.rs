//! Plaintext ATN dump for tests and debugging.

use std::fmt::Write;

use crate::atn::Atn;
use crate::state::StateKind;
use crate::transition::Transition;

/// Render the network one state per line:
///
/// ```text
/// s0 RuleStart(r0) -> eps s1
/// s1 BlockStart(r0) d0 -> eps s2, eps s4
/// ```
pub fn dump_atn(atn: &Atn) -> String {
    let mut out = String::new();

    for st in &atn.states {
        write!(out, "s{} {}(r{})", st.id, kind_name(&st.kind), st.rule).unwrap();
        if let Some(d) = st.decision {
            write!(out, " d{d}").unwrap();
        }
        if !st.transitions.is_empty() {
            out.push_str(" -> ");
            for (i, t) in st.transitions.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&transition_text(t));
            }
        }
        out.push('\n');
    }

    out
}

fn kind_name(kind: &StateKind) -> &'static str {
    match kind {
        StateKind::Basic => "Basic",
        StateKind::RuleStart { .. } => "RuleStart",
        StateKind::RuleStop => "RuleStop",
        StateKind::BlockStart { .. } => "BlockStart",
        StateKind::BlockEnd { .. } => "BlockEnd",
        StateKind::PlusBlockStart { .. } => "PlusBlockStart",
        StateKind::PlusLoopBack => "PlusLoopBack",
        StateKind::StarBlockStart => "StarBlockStart",
        StateKind::StarLoopEntry { .. } => "StarLoopEntry",
        StateKind::StarLoopBack => "StarLoopBack",
        StateKind::LoopEnd { .. } => "LoopEnd",
    }
}

fn transition_text(t: &Transition) -> String {
    match t {
        Transition::Epsilon { target } => format!("eps s{target}"),
        Transition::Atom { target, label } => format!("atom({label}) s{target}"),
        Transition::Range { target, from, to } => format!("range({from}..{to}) s{target}"),
        Transition::Set { target, set } => format!("set({set}) s{target}"),
        Transition::NotSet { target, set } => format!("not({set}) s{target}"),
        Transition::Rule {
            target,
            rule,
            precedence,
            follow,
        } => {
            if *precedence > 0 {
                format!("rule(r{rule}, prec {precedence}) s{target} then s{follow}")
            } else {
                format!("rule(r{rule}) s{target} then s{follow}")
            }
        }
        Transition::Predicate {
            target, pred_index, ..
        } => format!("pred({pred_index}) s{target}"),
        Transition::Action {
            target,
            action_index,
            ..
        } => format!("action({action_index}) s{target}"),
        Transition::Wildcard { target } => format!("wildcard s{target}"),
        Transition::PrecedencePredicate { target, precedence } => {
            format!("precpred({precedence}) s{target}")
        }
    }
}

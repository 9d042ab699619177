//! The ATN factory.

use indexmap::IndexMap;

use gramir_atn::{
    Atn, AtnKind, IntervalSet, MAX_CHAR_VALUE, MIN_CHAR_VALUE, MIN_USER_TOKEN_TYPE, NO_STATE,
    StateId, StateKind, TOKEN_EOF, TOKEN_INVALID_TYPE, Transition,
};

use crate::ast::{AstId, GrammarAst, NodeKind, unescape_literal};
use crate::charset::parse_char_set;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::{Grammar, Rule};
use crate::transform::{PRECEDENCE_LOOP_OPTION, PRECEDENCE_OPTION};

/// A sub-network with one entry and one exit state.
#[derive(Debug, Clone, Copy)]
struct Handle {
    left: StateId,
    right: StateId,
}

/// Build the grammar's ATN and store it in `g.atn`.
pub fn build_atn(g: &mut Grammar, diag: &mut Diagnostics) {
    let kind = if g.is_lexer() {
        AtnKind::Lexer
    } else {
        AtnKind::Parser
    };

    let grammar_ci = g.ast.node(g.root).option("caseInsensitive") == Some("true");

    let Grammar {
        ast,
        rules,
        sempreds,
        lexer_actions,
        token_name_to_type,
        string_literal_to_type,
        max_token_type,
        modes,
        ..
    } = g;

    let mut b = Builder {
        atn: Atn::new(kind, *max_token_type),
        ast,
        sempreds,
        lexer_actions,
        token_name_to_type,
        string_literal_to_type,
        rules,
        max_token_type: *max_token_type,
        lexer: kind == AtnKind::Lexer,
        grammar_ci,
        rule_ci: grammar_ci,
        current_rule: 0,
        diag,
    };

    // Phase one: every rule's start/stop pair, so rule transitions can
    // target forward references.
    for rule in b.rules.values() {
        let start = b.atn.add_state(
            StateKind::RuleStart {
                stop: NO_STATE,
                left_recursive: rule.left_recursive.is_some(),
            },
            rule.index as u32,
        );
        let stop = b.atn.add_state(StateKind::RuleStop, rule.index as u32);
        if let StateKind::RuleStart { stop: s, .. } = &mut b.atn.state_mut(start).kind {
            *s = stop;
        }
        b.atn.rule_to_start.push(start);
        b.atn.rule_to_stop.push(stop);
        let token_type = if b.lexer && !rule.is_fragment {
            b.token_name_to_type
                .get(&rule.name)
                .copied()
                .unwrap_or(TOKEN_INVALID_TYPE)
        } else {
            TOKEN_INVALID_TYPE
        };
        b.atn.rule_to_token_type.push(token_type);
    }

    // Phase two: rule bodies.
    let rule_list: Vec<(usize, AstId)> = b.rules.values().map(|r| (r.index, r.ast)).collect();
    for (index, rule_ast) in rule_list {
        b.current_rule = index as u32;
        b.rule_ci = match b.ast.node(rule_ast).option("caseInsensitive") {
            Some("true") => true,
            Some("false") => false,
            _ => b.grammar_ci,
        };
        let start = b.atn.rule_to_start[index];
        let stop = b.atn.rule_to_stop[index];
        let body = b.ast.find_child(rule_ast, |k| *k == NodeKind::Block);
        match body {
            Some(block) => {
                let h = b.block(block);
                b.epsilon(start, h.left);
                b.epsilon(h.right, stop);
            }
            None => b.epsilon(start, stop),
        }
    }

    // Lexer mode entry states: the default mode, then each declared mode.
    if b.lexer {
        let mode_rule_sets: Vec<Vec<usize>> = {
            let default: Vec<usize> = b
                .rules
                .values()
                .filter(|r| !r.is_fragment && r.mode.is_none())
                .map(|r| r.index)
                .collect();
            let mut sets = vec![default];
            for mode_name in modes.keys() {
                sets.push(
                    b.rules
                        .values()
                        .filter(|r| !r.is_fragment && r.mode.as_deref() == Some(mode_name))
                        .map(|r| r.index)
                        .collect(),
                );
            }
            sets
        };
        for rule_indexes in mode_rule_sets {
            let entry = b.atn.add_state(StateKind::Basic, 0);
            for index in rule_indexes {
                let target = b.atn.rule_to_start[index];
                b.atn.add_transition(entry, Transition::Epsilon { target });
            }
            b.atn.mode_to_start.push(entry);
        }
    }

    g.atn = Some(b.atn);
}

struct Builder<'a> {
    atn: Atn,
    ast: &'a mut GrammarAst,
    rules: &'a IndexMap<String, Rule>,
    sempreds: &'a IndexMap<AstId, u32>,
    lexer_actions: &'a IndexMap<AstId, u32>,
    token_name_to_type: &'a IndexMap<String, i32>,
    string_literal_to_type: &'a IndexMap<String, i32>,
    max_token_type: i32,
    lexer: bool,
    grammar_ci: bool,
    rule_ci: bool,
    current_rule: u32,
    diag: &'a mut Diagnostics,
}

impl Builder<'_> {
    fn basic(&mut self) -> StateId {
        self.atn.add_state(StateKind::Basic, self.current_rule)
    }

    fn epsilon(&mut self, from: StateId, to: StateId) {
        self.atn
            .add_transition(from, Transition::Epsilon { target: to });
    }

    /// Two fresh states joined by one transition.
    fn edge(&mut self, t: impl FnOnce(StateId) -> Transition) -> Handle {
        let left = self.basic();
        let right = self.basic();
        self.atn.add_transition(left, t(right));
        Handle { left, right }
    }

    // ─────────────────────────────────────────────────────────────────
    // Blocks and alternatives
    // ─────────────────────────────────────────────────────────────────

    fn block(&mut self, block: AstId) -> Handle {
        let alts = self.ast.children(block).to_vec();
        if alts.len() == 1 {
            return self.alternative(alts[0]);
        }

        let start = self
            .atn
            .add_state(StateKind::BlockStart { end: NO_STATE }, self.current_rule);
        let end = self
            .atn
            .add_state(StateKind::BlockEnd { start }, self.current_rule);
        if let StateKind::BlockStart { end: e } = &mut self.atn.state_mut(start).kind {
            *e = end;
        }
        self.atn.define_decision(start);
        self.ast.node_mut(block).atn_state = Some(start);

        for alt in alts {
            let h = self.alternative(alt);
            self.epsilon(start, h.left);
            self.epsilon(h.right, end);
        }

        Handle { left: start, right: end }
    }

    fn alternative(&mut self, alt: AstId) -> Handle {
        let mut handles: Vec<Handle> = Vec::new();

        // A rewritten operator alternative opens with its precedence
        // guard.
        if let Some(p) = self.precedence_of(alt) {
            handles.push(self.edge(|target| Transition::PrecedencePredicate {
                target,
                precedence: p,
            }));
        }

        for element in self.ast.children(alt).to_vec() {
            if let Some(h) = self.element(element) {
                handles.push(h);
            }
        }

        match handles.len() {
            0 => {
                let left = self.basic();
                let right = self.basic();
                self.epsilon(left, right);
                Handle { left, right }
            }
            _ => {
                for pair in handles.windows(2) {
                    self.epsilon(pair[0].right, pair[1].left);
                }
                Handle {
                    left: handles[0].left,
                    right: handles[handles.len() - 1].right,
                }
            }
        }
    }

    fn precedence_of(&self, node: AstId) -> Option<i32> {
        self.ast
            .node(node)
            .option(PRECEDENCE_OPTION)
            .and_then(|p| p.parse().ok())
    }

    // ─────────────────────────────────────────────────────────────────
    // Elements
    // ─────────────────────────────────────────────────────────────────

    fn element(&mut self, node: AstId) -> Option<Handle> {
        let kind = self.ast.node(node).kind;
        let handle = match kind {
            NodeKind::Block => Some(self.block(node)),
            NodeKind::Alt => Some(self.alternative(node)),
            NodeKind::TokenRef => Some(self.token_ref(node)),
            NodeKind::RuleRef => Some(self.rule_ref(node)),
            NodeKind::StringLit => Some(self.string_literal(node)),
            NodeKind::Range => {
                let set = self.set_of(node);
                Some(self.edge(|target| Transition::Set { target, set }))
            }
            NodeKind::CharSet => {
                let set = self.set_of(node);
                Some(self.edge(|target| Transition::Set { target, set }))
            }
            NodeKind::Set => {
                let set = self.set_of(node);
                Some(self.edge(|target| Transition::Set { target, set }))
            }
            NodeKind::Not => {
                let inner = *self.ast.children(node).first()?;
                let set = self.set_of(inner);
                Some(self.edge(|target| Transition::NotSet { target, set }))
            }
            NodeKind::Wildcard => Some(self.edge(|target| Transition::Wildcard { target })),
            NodeKind::Optional { greedy } => {
                let inner = *self.ast.children(node).first()?;
                let h = self.element(inner)?;
                Some(self.optional(h, greedy))
            }
            NodeKind::Star { greedy } => {
                let inner = *self.ast.children(node).first()?;
                let precedence_loop = self.ast.node(node).option(PRECEDENCE_LOOP_OPTION).is_some();
                let h = self.element(inner)?;
                Some(self.star(h, greedy, precedence_loop))
            }
            NodeKind::Plus { greedy } => {
                let inner = *self.ast.children(node).first()?;
                let h = self.element(inner)?;
                Some(self.plus(h, greedy))
            }
            NodeKind::Action => {
                if self.lexer {
                    let action_index = self.lexer_actions.get(&node).copied().unwrap_or(0);
                    let rule = self.current_rule;
                    Some(self.edge(|target| Transition::Action {
                        target,
                        rule,
                        action_index,
                    }))
                } else {
                    // Parser actions execute inline; control flow sees an
                    // epsilon.
                    let left = self.basic();
                    let right = self.basic();
                    self.epsilon(left, right);
                    Some(Handle { left, right })
                }
            }
            NodeKind::Predicate => {
                let pred_index = self.sempreds.get(&node).copied().unwrap_or(0);
                let rule = self.current_rule;
                Some(self.edge(|target| Transition::Predicate {
                    target,
                    rule,
                    pred_index,
                }))
            }
            _ => None,
        };
        if let Some(h) = handle {
            self.ast.node_mut(node).atn_state = Some(h.left);
        }
        handle
    }

    fn token_ref(&mut self, node: AstId) -> Handle {
        let name = self.ast.node(node).text.clone();
        if name == "EOF" {
            return self.edge(|target| Transition::Atom {
                target,
                label: TOKEN_EOF,
            });
        }
        if self.lexer {
            // Inside a lexer an uppercase reference calls another rule.
            return self.call_rule(&name, node);
        }
        let label = self
            .token_name_to_type
            .get(&name)
            .copied()
            .unwrap_or(TOKEN_INVALID_TYPE);
        self.edge(|target| Transition::Atom { target, label })
    }

    fn rule_ref(&mut self, node: AstId) -> Handle {
        let name = self.ast.node(node).text.clone();
        self.call_rule(&name, node)
    }

    fn call_rule(&mut self, name: &str, node: AstId) -> Handle {
        let Some(callee) = self.rules.get(name) else {
            // Undefined references were reported; keep the graph wired.
            let left = self.basic();
            let right = self.basic();
            self.epsilon(left, right);
            return Handle { left, right };
        };
        let precedence = self.precedence_of(node).unwrap_or(0);
        let left = self.basic();
        let follow = self.basic();
        let target = self.atn.rule_to_start[callee.index];
        let rule = callee.index as u32;
        self.atn.add_transition(
            left,
            Transition::Rule {
                target,
                rule,
                precedence,
                follow,
            },
        );
        Handle { left, right: follow }
    }

    fn string_literal(&mut self, node: AstId) -> Handle {
        if !self.lexer {
            let text = self.ast.node(node).text.clone();
            let label = self
                .string_literal_to_type
                .get(&text)
                .copied()
                .unwrap_or(TOKEN_INVALID_TYPE);
            return self.edge(|target| Transition::Atom { target, label });
        }

        // Lexer: one transition per code point.
        let text = unescape_literal(&self.ast.node(node).text);
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            let left = self.basic();
            let right = self.basic();
            self.epsilon(left, right);
            return Handle { left, right };
        }

        let left = self.basic();
        let mut prev = left;
        for c in chars {
            let next = self.basic();
            let t = self.char_transition(c, next);
            self.atn.add_transition(prev, t);
            prev = next;
        }
        Handle { left, right: prev }
    }

    /// One character match, expanded to both cases when the rule is
    /// case-insensitive. Characters whose case mapping changes the code
    /// point count keep their case-sensitive transition.
    fn char_transition(&mut self, c: char, target: StateId) -> Transition {
        if self.rule_ci {
            if let Some((lo, hi)) = case_pair(c) {
                let mut set = IntervalSet::of(lo as i32);
                set.add(hi as i32);
                return Transition::Set { target, set };
            }
        }
        Transition::Atom {
            target,
            label: c as i32,
        }
    }

    /// The symbol set a set-like node matches, with lexer
    /// case-insensitive expansion applied.
    fn set_of(&mut self, node: AstId) -> IntervalSet {
        let node_kind = self.ast.node(node).kind;
        let mut set = IntervalSet::new();
        match node_kind {
            NodeKind::TokenRef => {
                let name = self.ast.node(node).text.clone();
                if name == "EOF" {
                    set.add(TOKEN_EOF);
                } else if let Some(&t) = self.token_name_to_type.get(&name) {
                    set.add(t);
                }
            }
            NodeKind::StringLit => {
                if self.lexer {
                    let text = unescape_literal(&self.ast.node(node).text);
                    if let Some(c) = text.chars().next() {
                        self.add_char_ci(&mut set, c);
                    }
                } else {
                    let text = self.ast.node(node).text.clone();
                    if let Some(&t) = self.string_literal_to_type.get(&text) {
                        set.add(t);
                    }
                }
            }
            NodeKind::Range => {
                let bounds = self.ast.children(node).to_vec();
                if let [lo, hi] = bounds.as_slice() {
                    let lo = unescape_literal(&self.ast.node(*lo).text).chars().next();
                    let hi = unescape_literal(&self.ast.node(*hi).text).chars().next();
                    if let (Some(lo), Some(hi)) = (lo, hi) {
                        self.add_range_ci(&mut set, lo, hi);
                    }
                }
            }
            NodeKind::CharSet => {
                let raw = self.ast.node(node).text.clone();
                let span = self.ast.node(node).span;
                let parsed = parse_char_set(&raw);
                for collision in &parsed.collisions {
                    self.diag
                        .report(DiagnosticKind::CharactersCollisionInSet, span)
                        .arg(collision)
                        .arg(&raw)
                        .emit();
                }
                for iv in parsed.set.intervals() {
                    if self.rule_ci {
                        let lo = char::from_u32(iv.a as u32);
                        let hi = char::from_u32(iv.b as u32);
                        if let (Some(lo), Some(hi)) = (lo, hi) {
                            self.add_range_ci(&mut set, lo, hi);
                            continue;
                        }
                    }
                    set.add_range(iv.a, iv.b);
                }
            }
            NodeKind::Set | NodeKind::Block => {
                for child in self.ast.children(node).to_vec() {
                    let inner = self.set_of(child);
                    set.add_set(&inner);
                }
            }
            NodeKind::Alt => {
                if let Some(&only) = self.ast.children(node).first() {
                    let inner = self.set_of(only);
                    set.add_set(&inner);
                }
            }
            NodeKind::Wildcard => {
                if self.lexer {
                    set.add_range(MIN_CHAR_VALUE, MAX_CHAR_VALUE);
                } else if self.max_token_type >= MIN_USER_TOKEN_TYPE {
                    set.add_range(MIN_USER_TOKEN_TYPE, self.max_token_type);
                }
            }
            _ => {}
        }
        set
    }

    fn add_char_ci(&mut self, set: &mut IntervalSet, c: char) {
        if self.rule_ci {
            if let Some((lo, hi)) = case_pair(c) {
                set.add(lo as i32);
                set.add(hi as i32);
                return;
            }
        }
        set.add(c as i32);
    }

    fn add_range_ci(&mut self, set: &mut IntervalSet, lo: char, hi: char) {
        set.add_range(lo as i32, hi as i32);
        if self.rule_ci {
            let mapped_lo = single_case_map(lo);
            let mapped_hi = single_case_map(hi);
            if let (Some(ml), Some(mh)) = (mapped_lo, mapped_hi) {
                if (ml, mh) != (lo, hi) {
                    set.add_range(ml as i32, mh as i32);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // EBNF loops
    // ─────────────────────────────────────────────────────────────────

    /// `X?` — a two-alternative decision: the body or the skip edge.
    fn optional(&mut self, h: Handle, greedy: bool) -> Handle {
        let start = self
            .atn
            .add_state(StateKind::BlockStart { end: NO_STATE }, self.current_rule);
        let end = self
            .atn
            .add_state(StateKind::BlockEnd { start }, self.current_rule);
        if let StateKind::BlockStart { end: e } = &mut self.atn.state_mut(start).kind {
            *e = end;
        }
        self.atn.define_decision(start);

        if greedy {
            self.epsilon(start, h.left);
            self.epsilon(start, end);
        } else {
            self.epsilon(start, end);
            self.epsilon(start, h.left);
        }
        self.epsilon(h.right, end);
        Handle { left: start, right: end }
    }

    /// `X*` — loop entry decides between entering the body and leaving.
    fn star(&mut self, h: Handle, greedy: bool, precedence_loop: bool) -> Handle {
        let entry = self.atn.add_state(
            StateKind::StarLoopEntry {
                loopback: NO_STATE,
                precedence_decision: precedence_loop,
            },
            self.current_rule,
        );
        let loopback = self
            .atn
            .add_state(StateKind::StarLoopBack, self.current_rule);
        let end = self
            .atn
            .add_state(StateKind::LoopEnd { loopback }, self.current_rule);
        if let StateKind::StarLoopEntry { loopback: l, .. } = &mut self.atn.state_mut(entry).kind {
            *l = loopback;
        }
        self.atn.define_decision(entry);

        if greedy {
            self.epsilon(entry, h.left);
            self.epsilon(entry, end);
        } else {
            self.epsilon(entry, end);
            self.epsilon(entry, h.left);
        }
        self.epsilon(h.right, loopback);
        self.epsilon(loopback, entry);
        Handle { left: entry, right: end }
    }

    /// `X+` — at least one pass; the loop-back state decides whether to
    /// iterate again.
    fn plus(&mut self, h: Handle, greedy: bool) -> Handle {
        let start = self
            .atn
            .add_state(StateKind::PlusBlockStart { loopback: NO_STATE }, self.current_rule);
        let loopback = self
            .atn
            .add_state(StateKind::PlusLoopBack, self.current_rule);
        let end = self
            .atn
            .add_state(StateKind::LoopEnd { loopback }, self.current_rule);
        if let StateKind::PlusBlockStart { loopback: l } = &mut self.atn.state_mut(start).kind {
            *l = loopback;
        }
        self.atn.define_decision(loopback);

        self.epsilon(start, h.left);
        self.epsilon(h.right, loopback);
        if greedy {
            self.epsilon(loopback, start);
            self.epsilon(loopback, end);
        } else {
            self.epsilon(loopback, end);
            self.epsilon(loopback, start);
        }
        Handle { left: start, right: end }
    }
}

/// The lower/upper pair of a cased character, when both case mappings
/// stay a single code point.
fn case_pair(c: char) -> Option<(char, char)> {
    let lo = single_case(c.to_lowercase());
    let hi = single_case(c.to_uppercase());
    let (lo, hi) = (lo?, hi?);
    (lo != hi).then_some((lo, hi))
}

fn single_case(mut it: impl Iterator<Item = char>) -> Option<char> {
    let c = it.next()?;
    it.next().is_none().then_some(c)
}

/// Case-map a single character, when the mapping stays one code point.
fn single_case_map(c: char) -> Option<char> {
    if c.is_lowercase() {
        single_case(c.to_uppercase())
    } else if c.is_uppercase() {
        single_case(c.to_lowercase())
    } else {
        Some(c)
    }
}

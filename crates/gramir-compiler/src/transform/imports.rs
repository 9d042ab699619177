//! Import integration.
//!
//! Merges every imported grammar into the root AST. The root always wins
//! on conflicts: imported rules, modes, and mode members are added only
//! when the root does not already declare the name. Channels union by
//! name, tokens concatenate, and named actions with the same scoped name
//! concatenate textually when they come from different grammars.

use std::collections::HashSet;

use crate::ast::{AstId, GrammarAst, NodeKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::Grammar;

/// Merge all imported grammars into `root`, depth-first in load order.
pub fn integrate_imports(root: &mut Grammar, diag: &mut Diagnostics) {
    let imports = std::mem::take(&mut root.imports);
    let mut visited = HashSet::new();
    for imported in &imports {
        merge_one(root, imported, &mut visited, diag);
    }
    root.imports = imports;
}

fn merge_one(
    root: &mut Grammar,
    imported: &Grammar,
    visited: &mut HashSet<String>,
    diag: &mut Diagnostics,
) {
    if !visited.insert(imported.name.clone()) {
        return;
    }
    // Depth-first: an import's own imports merge before it does.
    for nested in &imported.imports {
        merge_one(root, nested, visited, diag);
    }

    merge_options(root, imported, diag);
    merge_channels(root, imported);
    merge_tokens(root, imported);
    merge_named_actions(root, imported);
    merge_rules_and_modes(root, imported);
}

fn merge_options(root: &Grammar, imported: &Grammar, diag: &mut Diagnostics) {
    let Some(imported_opts) = &imported.ast.node(imported.root).options else {
        return;
    };
    for (key, value) in imported_opts {
        let root_value = root.ast.node(root.root).option(key);
        if root_value.is_some_and(|v| v != value) {
            diag.report(DiagnosticKind::OptionsInDelegate, imported.ast.node(imported.root).span)
                .arg(&imported.name)
                .emit();
        }
    }
}

fn merge_channels(root: &mut Grammar, imported: &Grammar) {
    let imported_names: Vec<(String, AstId)> = section_entries(&imported.ast, imported.root, NodeKind::Channels);
    if imported_names.is_empty() {
        return;
    }

    let existing: HashSet<String> = section_entries(&root.ast, root.root, NodeKind::Channels)
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    let section = match root
        .ast
        .find_child(root.root, |k| *k == NodeKind::Channels)
    {
        Some(s) => s,
        None => {
            let s = root.ast.synthesize(NodeKind::Channels, "");
            let at = prequel_insert_index(&root.ast, root.root);
            root.ast.insert_child(root.root, at, s);
            s
        }
    };

    for (name, node) in imported_names {
        if existing.contains(&name) {
            continue;
        }
        let copied = root.ast.copy_subtree(&imported.ast, node);
        root.ast.add_child(section, copied);
    }
}

fn merge_tokens(root: &mut Grammar, imported: &Grammar) {
    let imported_names: Vec<(String, AstId)> = section_entries(&imported.ast, imported.root, NodeKind::Tokens);
    if imported_names.is_empty() {
        return;
    }

    let existing: HashSet<String> = section_entries(&root.ast, root.root, NodeKind::Tokens)
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    let section = match root.ast.find_child(root.root, |k| *k == NodeKind::Tokens) {
        Some(s) => s,
        None => {
            let s = root.ast.synthesize(NodeKind::Tokens, "");
            let at = prequel_insert_index(&root.ast, root.root);
            root.ast.insert_child(root.root, at, s);
            s
        }
    };

    for (name, node) in imported_names {
        if existing.contains(&name) {
            continue;
        }
        let copied = root.ast.copy_subtree(&imported.ast, node);
        root.ast.add_child(section, copied);
    }
}

fn merge_named_actions(root: &mut Grammar, imported: &Grammar) {
    let default_scope = imported.default_action_scope();
    for action in imported
        .ast
        .children_where(imported.root, |k| *k == NodeKind::NamedAction)
        .collect::<Vec<_>>()
    {
        let name = imported.ast.node(action).text.clone();
        let scope = imported
            .ast
            .find_child(action, |k| *k == NodeKind::Name)
            .map(|s| imported.ast.node(s).text.clone())
            .unwrap_or_else(|| default_scope.to_owned());
        let body = imported
            .ast
            .find_child(action, |k| *k == NodeKind::Action)
            .map(|b| imported.ast.node(b).text.clone())
            .unwrap_or_default();

        match find_named_action(&root.ast, root.root, &scope, &name, root.default_action_scope()) {
            Some(existing) => {
                // Same scoped name from a different grammar: concatenate
                // the bodies inside one brace block.
                if let Some(b) = root.ast.find_child(existing, |k| *k == NodeKind::Action) {
                    let joined = format!("{}\n{}", root.ast.node(b).text, body);
                    root.ast.node_mut(b).text = joined;
                }
            }
            None => {
                let copied = root.ast.copy_subtree(&imported.ast, action);
                root.ast.add_child(root.root, copied);
            }
        }
    }
}

fn find_named_action(
    ast: &GrammarAst,
    root: AstId,
    scope: &str,
    name: &str,
    default_scope: &str,
) -> Option<AstId> {
    ast.children_where(root, |k| *k == NodeKind::NamedAction)
        .find(|&a| {
            let a_name = &ast.node(a).text;
            let a_scope = ast
                .find_child(a, |k| *k == NodeKind::Name)
                .map(|s| ast.node(s).text.clone())
                .unwrap_or_else(|| default_scope.to_owned());
            a_name == name && a_scope == scope
        })
}

fn merge_rules_and_modes(root: &mut Grammar, imported: &Grammar) {
    let root_rules = rule_names(&root.ast, root.root);

    // Top-level rules.
    for rule in imported
        .ast
        .children_where(imported.root, |k| matches!(k, NodeKind::Rule { .. }))
        .collect::<Vec<_>>()
    {
        let name = imported.ast.node(rule).text.clone();
        if root_rules.contains(&name) {
            continue;
        }
        let copied = root.ast.copy_subtree(&imported.ast, rule);
        root.ast.add_child(root.root, copied);
    }

    // Modes: fill an existing mode, or add the whole mode when missing.
    for mode in imported
        .ast
        .children_where(imported.root, |k| *k == NodeKind::Mode)
        .collect::<Vec<_>>()
    {
        let mode_name = imported.ast.node(mode).text.clone();
        let incoming: Vec<AstId> = imported
            .ast
            .children_where(mode, |k| matches!(k, NodeKind::Rule { .. }))
            .filter(|&r| !root_rules.contains(&imported.ast.node(r).text))
            .collect();

        let existing_mode = root
            .ast
            .children_where(root.root, |k| *k == NodeKind::Mode)
            .find(|&m| root.ast.node(m).text == mode_name);
        match existing_mode {
            Some(existing) => {
                for r in incoming {
                    let copied = root.ast.copy_subtree(&imported.ast, r);
                    root.ast.add_child(existing, copied);
                }
            }
            None => {
                // An empty merged mode is not added.
                if incoming.is_empty() {
                    continue;
                }
                let m = root.ast.synthesize(NodeKind::Mode, mode_name);
                for r in incoming {
                    let copied = root.ast.copy_subtree(&imported.ast, r);
                    root.ast.add_child(m, copied);
                }
                root.ast.add_child(root.root, m);
            }
        }
    }
}

/// Every rule name declared anywhere in the grammar, modes included.
fn rule_names(ast: &GrammarAst, root: AstId) -> HashSet<String> {
    ast.walk(root)
        .into_iter()
        .filter(|&n| matches!(ast.node(n).kind, NodeKind::Rule { .. }))
        .map(|n| ast.node(n).text.clone())
        .collect()
}

/// `(name, node)` pairs of a `tokens`/`channels` section's entries.
fn section_entries(ast: &GrammarAst, root: AstId, section: NodeKind) -> Vec<(String, AstId)> {
    let mut out = Vec::new();
    for s in ast.children_where(root, |k| *k == section) {
        for &entry in ast.children(s) {
            out.push((ast.node(entry).text.clone(), entry));
        }
    }
    out
}

/// Index right after the last prequel section, before the first rule.
fn prequel_insert_index(ast: &GrammarAst, root: AstId) -> usize {
    ast.children(root)
        .iter()
        .position(|&c| matches!(ast.node(c).kind, NodeKind::Rule { .. } | NodeKind::Mode))
        .unwrap_or(ast.children(root).len())
}

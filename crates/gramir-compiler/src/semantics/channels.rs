//! Channel assignment and mode-name conflict checks.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::grammar::{COMMON_CONSTANTS, Grammar};

use super::collect::SymbolCollection;

pub fn assign(g: &mut Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    assign_channels(g, symbols, diag);
    check_modes(g, diag);
}

/// Custom channels number monotonically after the predefined channels;
/// reserved, token, and mode names are rejected.
fn assign_channels(g: &mut Grammar, symbols: &SymbolCollection, diag: &mut Diagnostics) {
    for (name, node) in &symbols.channel_defs {
        let span = g.ast.node(*node).span;
        if COMMON_CONSTANTS.contains(&name.as_str()) {
            diag.report(DiagnosticKind::ChannelConflictsWithCommonConstants, span)
                .arg(name)
                .emit();
            continue;
        }
        if g.token_name_to_type.contains_key(name) {
            diag.report(DiagnosticKind::ChannelConflictsWithToken, span)
                .arg(name)
                .emit();
            continue;
        }
        if g.modes.contains_key(name) {
            diag.report(DiagnosticKind::ChannelConflictsWithMode, span)
                .arg(name)
                .emit();
            continue;
        }
        g.define_channel(name);
    }
}

/// Lexer modes may not shadow reserved constants or tokens.
fn check_modes(g: &Grammar, diag: &mut Diagnostics) {
    if !g.is_lexer() {
        return;
    }
    for (name, &node) in &g.modes {
        let span = g.ast.node(node).span;
        if COMMON_CONSTANTS.contains(&name.as_str()) {
            diag.report(DiagnosticKind::ModeConflictsWithCommonConstants, span)
                .arg(name)
                .emit();
        } else if g.token_name_to_type.contains_key(name) {
            diag.report(DiagnosticKind::ModeConflictsWithToken, span)
                .arg(name)
                .emit();
        }
    }
}

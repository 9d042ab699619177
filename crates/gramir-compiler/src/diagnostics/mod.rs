//! Compiler diagnostics infrastructure.
//!
//! Diagnostics accumulate in a [`Diagnostics`] collection through a small
//! builder API; registered listeners observe every emission synchronously
//! in registration order. One-off kinds are suppressed after their first
//! occurrence, and `warnings_are_errors` promotes each warning by emitting
//! an additional [`DiagnosticKind::WarningTreatedAsError`].

mod kind;
mod printer;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use rowan::TextRange;

pub use kind::{DiagnosticKind, Severity};
pub use printer::{DiagnosticFormat, DiagnosticsPrinter};

/// A location the diagnostic points back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub range: TextRange,
    pub message: String,
}

/// One reported issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub range: TextRange,
    args: Vec<String>,
    message_override: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity().is_error()
    }

    pub fn is_warning(&self) -> bool {
        self.severity().is_warning()
    }

    /// The formatted message: the kind's template with arguments filled
    /// in, unless a free-form override was supplied.
    pub fn message(&self) -> String {
        match &self.message_override {
            Some(m) => m.clone(),
            None => self.kind.render(&self.args),
        }
    }
}

/// Observer invoked for every emitted diagnostic.
pub trait DiagnosticListener {
    fn issue(&mut self, diag: &Diagnostic);
}

/// Collection of diagnostics from every pipeline stage.
#[derive(Default)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
    one_off_seen: HashSet<DiagnosticKind>,
    warnings_are_errors: bool,
    listeners: Vec<Box<dyn DiagnosticListener>>,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("messages", &self.messages)
            .field("warnings_are_errors", &self.warnings_are_errors)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Builder for one diagnostic.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    diag: Diagnostic,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat every subsequently emitted warning as an error.
    pub fn set_warnings_are_errors(&mut self, value: bool) {
        self.warnings_are_errors = value;
    }

    pub fn add_listener(&mut self, listener: Box<dyn DiagnosticListener>) {
        self.listeners.push(listener);
    }

    pub fn report(&mut self, kind: DiagnosticKind, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            diag: Diagnostic {
                kind,
                range,
                args: Vec::new(),
                message_override: None,
                related: Vec::new(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    /// Move another collection's messages into this one, replaying them
    /// through this collection's listeners and promotion rules.
    pub fn extend(&mut self, other: Diagnostics) {
        for diag in other.messages {
            self.push(diag);
        }
    }

    fn push(&mut self, diag: Diagnostic) {
        if diag.severity().is_one_off() && !self.one_off_seen.insert(diag.kind) {
            return;
        }
        for listener in &mut self.listeners {
            listener.issue(&diag);
        }
        let promote = self.warnings_are_errors && diag.is_warning();
        let range = diag.range;
        self.messages.push(diag);
        if promote {
            let promotion = Diagnostic {
                kind: DiagnosticKind::WarningTreatedAsError,
                range,
                args: Vec::new(),
                message_override: None,
                related: Vec::new(),
            };
            for listener in &mut self.listeners {
                listener.issue(&promotion);
            }
            self.messages.push(promotion);
        }
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Append a positional template argument.
    pub fn arg(mut self, value: impl std::fmt::Display) -> Self {
        self.diag.args.push(value.to_string());
        self
    }

    /// Replace the template with a free-form message (syntax errors).
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.diag.message_override = Some(msg.into());
        self
    }

    pub fn related_to(mut self, msg: impl Into<String>, range: TextRange) -> Self {
        self.diag.related.push(RelatedInfo {
            range,
            message: msg.into(),
        });
        self
    }

    pub fn emit(self) {
        self.diagnostics.push(self.diag);
    }
}

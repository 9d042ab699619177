//! Rendering of collected diagnostics.
//!
//! Two surfaces: the single-line location formats consumed by build tools
//! (`antlr`, `gnu`, `vs2005`) and an annotated-source pretty mode.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};
use rowan::TextRange;

use super::Diagnostics;
use super::kind::Severity;

/// Shape of the one-line location prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticFormat {
    #[default]
    Antlr,
    Gnu,
    Vs2005,
}

/// Builder for rendering diagnostics with various options.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: &'s str,
    path: &'s str,
    format: DiagnosticFormat,
    pretty: bool,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics, source: &'s str) -> Self {
        Self {
            diagnostics,
            source,
            path: "<string>",
            format: DiagnosticFormat::Antlr,
            pretty: false,
            colored: false,
        }
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = path;
        self
    }

    pub fn format(mut self, format: DiagnosticFormat) -> Self {
        self.format = format;
        self
    }

    /// Render annotated source snippets instead of one-line locations.
    pub fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out).expect("String write never fails");
        out
    }

    pub fn write(&self, w: &mut impl Write) -> std::fmt::Result {
        if self.pretty {
            self.write_pretty(w)
        } else {
            self.write_lines(w)
        }
    }

    fn write_lines(&self, w: &mut impl Write) -> std::fmt::Result {
        for diag in self.diagnostics.iter() {
            let (line, col) = line_col(self.source, diag.range);
            let severity = diag.severity();
            let message = diag.message();
            match self.format {
                DiagnosticFormat::Antlr => writeln!(
                    w,
                    "{}({}): {}:{}:{}: {}",
                    severity,
                    diag.kind.code(),
                    self.path,
                    line,
                    col,
                    message
                )?,
                DiagnosticFormat::Gnu => {
                    writeln!(w, "{}:{}:{}: {}: {}", self.path, line, col, severity, message)?
                }
                DiagnosticFormat::Vs2005 => writeln!(
                    w,
                    "{}({},{}) : {} {} : {}",
                    self.path,
                    line,
                    col,
                    severity,
                    diag.kind.code(),
                    message
                )?,
            }
        }
        Ok(())
    }

    fn write_pretty(&self, w: &mut impl Write) -> std::fmt::Result {
        if self.diagnostics.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            let message = diag.message();
            let range = adjust_range(diag.range, self.source.len());

            let mut snippet = Snippet::source(self.source)
                .line_start(1)
                .path(self.path)
                .annotation(AnnotationKind::Primary.span(range).label(&message));

            for related in &diag.related {
                snippet = snippet.annotation(
                    AnnotationKind::Context
                        .span(adjust_range(related.range, self.source.len()))
                        .label(&related.message),
                );
            }

            let level = severity_to_level(diag.severity());
            let report = vec![level.primary_title(&message).element(snippet)];

            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", renderer.render(&report))?;
        }

        Ok(())
    }
}

impl Diagnostics {
    pub fn printer<'d, 's>(&'d self, source: &'s str) -> DiagnosticsPrinter<'d, 's> {
        DiagnosticsPrinter::new(self, source)
    }

    /// Compact `code(SEVERITY) message` dump, one line per diagnostic.
    /// The staple of snapshot tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for diag in self.iter() {
            let sev = match diag.severity() {
                Severity::Info => "INFO",
                Severity::Warning | Severity::WarningOneOff => "WARN",
                Severity::Error | Severity::ErrorOneOff => "ERROR",
                Severity::Fatal => "FATAL",
            };
            writeln!(out, "{}({}) {}", diag.kind.code(), sev, diag.message()).unwrap();
        }
        out
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Info => Level::INFO,
        Severity::Warning | Severity::WarningOneOff => Level::WARNING,
        Severity::Error | Severity::ErrorOneOff | Severity::Fatal => Level::ERROR,
    }
}

/// 1-based line and 0-based column of the range start.
fn line_col(source: &str, range: TextRange) -> (usize, usize) {
    let offset: usize = u32::from(range.start()) as usize;
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let col = before.rfind('\n').map_or(offset, |nl| offset - nl - 1);
    (line, col)
}

fn adjust_range(range: TextRange, limit: usize) -> std::ops::Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();

    if start == end {
        return start..(start + 1).min(limit);
    }

    start..end
}

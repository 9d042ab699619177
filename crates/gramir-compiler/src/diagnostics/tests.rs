//! Tests for the diagnostics collection and printer.

use std::cell::RefCell;
use std::rc::Rc;

use rowan::{TextRange, TextSize};

use super::{DiagnosticFormat, DiagnosticKind, DiagnosticListener, Diagnostics, Severity};

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::from(start), TextSize::from(end))
}

#[test]
fn templates_fill_positional_args() {
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticKind::UndefinedRuleRef, range(0, 3))
        .arg("expr")
        .emit();

    let d = diag.iter().next().unwrap();
    assert_eq!(d.message(), "reference to undefined rule: expr");
    assert_eq!(d.kind.code(), 60);
    assert_eq!(d.severity(), Severity::Error);
}

#[test]
fn free_form_message_overrides_template() {
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticKind::SyntaxError, range(0, 1))
        .message("mismatched input ';'")
        .emit();
    assert_eq!(diag.iter().next().unwrap().message(), "mismatched input ';'");
}

#[test]
fn one_off_kinds_report_once() {
    let mut diag = Diagnostics::new();
    for _ in 0..3 {
        diag.report(DiagnosticKind::OptionsInDelegate, range(0, 1))
            .arg("Sub")
            .emit();
    }
    assert_eq!(diag.len(), 1);
    assert_eq!(diag.warning_count(), 1);
}

#[test]
fn warnings_are_errors_adds_a_promotion() {
    let mut diag = Diagnostics::new();
    diag.set_warnings_are_errors(true);
    diag.report(DiagnosticKind::ImplicitTokenDefinition, range(0, 2))
        .arg("ID")
        .emit();

    assert_eq!(diag.len(), 2);
    assert_eq!(diag.error_count(), 1);
    let kinds: Vec<_> = diag.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::ImplicitTokenDefinition,
            DiagnosticKind::WarningTreatedAsError
        ]
    );
}

#[test]
fn listeners_observe_in_registration_order() {
    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }
    impl DiagnosticListener for Recorder {
        fn issue(&mut self, diag: &super::Diagnostic) {
            self.log
                .borrow_mut()
                .push(format!("{}:{}", self.tag, diag.kind.code()));
        }
    }

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut diag = Diagnostics::new();
    diag.add_listener(Box::new(Recorder {
        tag: "a",
        log: Rc::clone(&log),
    }));
    diag.add_listener(Box::new(Recorder {
        tag: "b",
        log: Rc::clone(&log),
    }));

    diag.report(DiagnosticKind::RuleRedefinition, range(0, 1))
        .arg("r")
        .emit();

    assert_eq!(*log.borrow(), vec!["a:51", "b:51"]);
}

#[test]
fn line_formats_shape_the_location_prefix() {
    let source = "grammar T;\na : b ;\n";
    let mut diag = Diagnostics::new();
    // Points at `b` on line 2, column 4.
    diag.report(DiagnosticKind::UndefinedRuleRef, range(15, 16))
        .arg("b")
        .emit();

    let antlr = diag.printer(source).path("T.g4").render();
    assert_eq!(antlr, "error(60): T.g4:2:4: reference to undefined rule: b\n");

    let gnu = diag
        .printer(source)
        .path("T.g4")
        .format(DiagnosticFormat::Gnu)
        .render();
    assert_eq!(gnu, "T.g4:2:4: error: reference to undefined rule: b\n");

    let vs = diag
        .printer(source)
        .path("T.g4")
        .format(DiagnosticFormat::Vs2005)
        .render();
    assert_eq!(vs, "T.g4(2,4) : error 60 : reference to undefined rule: b\n");
}

#[test]
fn dump_is_one_line_per_diagnostic() {
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticKind::ImplicitTokenDefinition, range(0, 2))
        .arg("ID")
        .emit();
    diag.report(DiagnosticKind::UndefinedRuleRef, range(3, 4))
        .arg("x")
        .emit();

    insta::assert_snapshot!(diag.dump(), @r"
    100(WARN) implicit definition of token ID in parser
    60(ERROR) reference to undefined rule: x
    ");
}

//! Tests for the output surfaces.

use indoc::indoc;

use crate::output::{CodeGenerator, GeneratedFile};
use crate::test_utils::process;

#[test]
fn vocab_lists_symbolic_tokens_then_literals() {
    let src = indoc! {"
        lexer grammar L;
        IF : 'if' ;
        ID : [a-z]+ ;
    "};
    let done = process(src);
    insta::assert_snapshot!(done.tokens_vocab(), @r"
    IF=1
    ID=2
    'if'=1
    ");
}

#[test]
fn interp_dump_has_the_fixed_sections() {
    let src = indoc! {"
        lexer grammar L;
        channels { DOC }
        IF : 'if' ;
        WS : [ \\t]+ -> channel(HIDDEN) ;
        mode ISLAND;
        END : 'end' -> popMode ;
    "};
    let done = process(src);
    assert!(done.is_valid(), "{}", done.diagnostics().dump());
    let dump = done.interp_dump().unwrap();

    let mut sections = vec![
        "token literal names:",
        "token symbolic names:",
        "rule names:",
        "channel names:",
        "mode names:",
        "atn:",
    ];
    for line in dump.lines() {
        if Some(&line) == sections.first() {
            sections.remove(0);
        }
    }
    assert!(sections.is_empty(), "missing sections {sections:?} in:\n{dump}");

    assert!(dump.contains("'if'"));
    assert!(dump.contains("DOC"));
    assert!(dump.contains("ISLAND"));
    assert!(dump.contains("DEFAULT_MODE"));

    // The ATN line round-trips through the serializer.
    let atn_line = dump.lines().last().unwrap();
    let words: Vec<u16> = atn_line
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(", ")
        .map(|w| w.parse().unwrap())
        .collect();
    let back = gramir_atn::deserialize(&words).unwrap();
    assert_eq!(&back, done.grammar.atn.as_ref().unwrap());
}

#[test]
fn parser_grammars_omit_lexer_sections() {
    let src = "parser grammar P; tokens { A } s : A ;";
    let done = process(src);
    let dump = done.interp_dump().unwrap();
    assert!(!dump.contains("channel names:"));
    assert!(!dump.contains("mode names:"));
}

#[test]
fn code_generators_receive_the_finished_grammar() {
    struct StubTarget {
        saw_rules: usize,
        saw_decisions: usize,
    }
    impl CodeGenerator for StubTarget {
        fn target(&self) -> &str {
            "stub"
        }
        fn generate(
            &mut self,
            grammar: &crate::Grammar,
        ) -> crate::Result<Vec<GeneratedFile>> {
            self.saw_rules = grammar.rules.len();
            self.saw_decisions = grammar.decision_lookahead.len();
            Ok(vec![GeneratedFile {
                name: format!("{}Parser.stub", grammar.name),
                content: String::new(),
            }])
        }
    }

    let done = process("grammar T; s : A | B ; A : 'a' ; B : 'b' ;");
    let mut target = StubTarget {
        saw_rules: 0,
        saw_decisions: 0,
    };
    let files = done.generate(&mut target).unwrap();
    assert_eq!(files[0].name, "TParser.stub");
    assert_eq!(target.saw_rules, 1);
    assert_eq!(target.saw_decisions, 1);
}

//! Gramir compiler front-end: grammar parser, analyzer, and ATN builder.
//!
//! This crate provides the grammar-to-ATN pipeline:
//! - `parser` - lexer, CST construction for `.g4` sources
//! - `ast` - the mutable arena AST the transforms work on
//! - `grammar` - rule table and token/channel symbol tables
//! - `transform` - import merging, implicit-lexer extraction, set
//!   reduction, left-recursion elimination
//! - `semantics` - the semantic pass pipeline
//! - `automata` - ATN construction and optimization
//! - `analysis` - decision lookahead and LL(1) detection
//! - `diagnostics` - error reporting
//! - `output` - vocab/interp emitters and the code-generator seam

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analysis;
pub mod ast;
pub mod automata;
pub mod diagnostics;
pub mod grammar;
pub mod output;
pub mod parser;
pub mod semantics;
pub mod transform;

mod charset;

#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
pub mod test_utils;

use rowan::{TextRange, TextSize};

pub use diagnostics::{DiagnosticFormat, DiagnosticKind, Diagnostics, Severity};
pub use grammar::Grammar;

/// Errors that end processing instead of accumulating as diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Grammar source nested too deeply for the parser.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    /// An output was requested before the ATN was built.
    #[error("grammar has no ATN")]
    NoAtn,

    /// Serialized output could not be written.
    #[error("cannot write serialized ATN: {0}")]
    Serialize(#[from] gramir_atn::SerializeError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Entry point: configures and parses one grammar plus its imports.
pub struct GrammarBuilder {
    source: String,
    file_name: Option<String>,
    import_sources: Vec<String>,
    warnings_are_errors: bool,
}

impl GrammarBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            file_name: None,
            import_sources: Vec::new(),
            warnings_are_errors: false,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Supply the source of a grammar the root may import. Sources are
    /// matched to `import` statements by their declared grammar name.
    pub fn with_import(mut self, source: impl Into<String>) -> Self {
        self.import_sources.push(source.into());
        self
    }

    pub fn warnings_are_errors(mut self, value: bool) -> Self {
        self.warnings_are_errors = value;
        self
    }

    pub fn parse(self) -> Result<ParsedGrammar> {
        let mut diag = Diagnostics::new();
        diag.set_warnings_are_errors(self.warnings_are_errors);

        let mut grammar = parse_one(&self.source, &mut diag)?;
        if let Some(name) = self.file_name {
            grammar.file_name = name;
        }

        // Parse the provided import sources, then bind them to the
        // root's import statements by name.
        let mut available: Vec<Grammar> = Vec::new();
        for source in &self.import_sources {
            available.push(parse_one(source, &mut diag)?);
        }

        bind_imports(&mut grammar, &mut available, &mut diag);

        Ok(ParsedGrammar {
            source: self.source,
            grammar,
            diagnostics: diag,
        })
    }
}

fn parse_one(source: &str, diag: &mut Diagnostics) -> Result<Grammar> {
    let result = parser::parse(source)?;
    diag.extend(result.diagnostics);
    let (ast, root) = ast::lower(&result.root);
    Ok(Grammar::from_ast(ast, root))
}

/// Bind parsed import sources to `import` statements by declared name,
/// depth-first so an import's own imports resolve too.
fn bind_imports(g: &mut Grammar, available: &mut Vec<Grammar>, diag: &mut Diagnostics) {
    for (name, span) in declared_imports(g) {
        if g.imports.iter().any(|i| i.name == name) {
            continue;
        }
        match available.iter().position(|a| a.name == name) {
            Some(at) => {
                let mut imported = available.swap_remove(at);
                bind_imports(&mut imported, available, diag);
                g.imports.push(imported);
            }
            None => {
                diag.report(DiagnosticKind::CannotFindImportedGrammar, span)
                    .arg(&name)
                    .emit();
            }
        }
    }
}

fn declared_imports(g: &Grammar) -> Vec<(String, TextRange)> {
    let mut out = Vec::new();
    for section in g.ast.children_where(g.root, |k| *k == ast::NodeKind::Import) {
        for &entry in g.ast.children(section) {
            let node = g.ast.node(entry);
            out.push((node.text.clone(), node.span));
        }
    }
    out
}

/// A parsed grammar, ready for transformation and analysis.
pub struct ParsedGrammar {
    source: String,
    pub grammar: Grammar,
    diagnostics: Diagnostics,
}

impl ParsedGrammar {
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run the rest of the pipeline: transforms, semantic passes, ATN
    /// construction, and decision analysis. Stages gate on the error
    /// count so a broken early stage does not cascade.
    pub fn process(mut self) -> ProcessedGrammar {
        let diag = &mut self.diagnostics;
        let g = &mut self.grammar;

        transform::integrate_imports(g, diag);

        if let Some(mut lexer) = transform::extract_implicit_lexer(g) {
            process_grammar(&mut lexer, diag);
            // The combined grammar consumes the lexer's vocabulary before
            // its own semantic passes run.
            g.import_vocab(&lexer);
            g.implicit_lexer = Some(Box::new(lexer));
        }

        process_grammar(g, diag);

        ProcessedGrammar {
            source: self.source,
            grammar: self.grammar,
            diagnostics: self.diagnostics,
        }
    }
}

/// The per-grammar pipeline tail, shared by the root grammar and an
/// extracted implicit lexer.
fn process_grammar(g: &mut Grammar, diag: &mut Diagnostics) {
    let before = diag.error_count();
    transform::reduce_block_sets(g, diag);
    if diag.error_count() > before {
        return;
    }

    let before = diag.error_count();
    semantics::analyze(g, diag);
    if diag.error_count() > before {
        return;
    }

    let before = diag.error_count();
    automata::build_atn(g, diag);
    if let Some(atn) = &mut g.atn {
        automata::optimize_atn(atn);
        if let Err(msg) = atn.verify() {
            diag.report(DiagnosticKind::InternalError, TextRange::empty(TextSize::from(0)))
                .arg(msg)
                .emit();
        }
    }
    if diag.error_count() > before {
        return;
    }

    analysis::analyze_decisions(g);
}

/// A fully processed grammar: symbol tables populated, ATN built and
/// optimized, decision lookahead computed.
pub struct ProcessedGrammar {
    source: String,
    pub grammar: Grammar,
    diagnostics: Diagnostics,
}

impl ProcessedGrammar {
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The serialized ATN integer stream.
    pub fn serialized_atn(&self) -> Result<Vec<u16>> {
        let atn = self.grammar.atn.as_ref().ok_or(Error::NoAtn)?;
        Ok(gramir_atn::serialize(atn)?)
    }

    /// The `.tokens` vocab text.
    pub fn tokens_vocab(&self) -> String {
        output::tokens_vocab(&self.grammar)
    }

    /// The interpreter dump text.
    pub fn interp_dump(&self) -> Result<String> {
        output::interp_dump(&self.grammar)
    }

    /// Hand the finished grammar to a code generator.
    pub fn generate(
        &self,
        generator: &mut dyn output::CodeGenerator,
    ) -> Result<Vec<output::GeneratedFile>> {
        generator.generate(&self.grammar)
    }
}

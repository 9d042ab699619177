//! Grammar AST transforms.
//!
//! These passes make the root grammar self-contained and regular before
//! semantic analysis:
//!
//! - `imports` - merge imported grammars into the root (root wins)
//! - `extract_lexer` - split the implicit lexer out of a combined grammar
//! - `blockset` - collapse all-singleton alternative blocks into sets
//! - `left_recursion` - rewrite direct left recursion into a
//!   precedence-climbing loop (runs inside the semantic pipeline)

mod blockset;
mod extract_lexer;
mod imports;
mod left_recursion;

#[cfg(test)]
mod blockset_tests;

pub use blockset::reduce_block_sets;
pub use extract_lexer::extract_implicit_lexer;
pub use imports::integrate_imports;
pub use left_recursion::{detect_recursion_cycles, transform_left_recursion};

pub(crate) use extract_lexer::literal_alias_of;
pub(crate) use left_recursion::{PRECEDENCE_LOOP_OPTION, PRECEDENCE_OPTION};

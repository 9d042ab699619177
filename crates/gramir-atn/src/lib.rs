//! ATN data model for gramir.
//!
//! The augmented transition network is the executable form of a grammar:
//! a flat array of states connected by labeled transitions. This crate
//! holds the model itself plus its serialized integer-stream form; the
//! compiler that builds ATNs lives in `gramir-compiler`.
//!
//! - `interval` - sorted interval sets over token types / code points
//! - `state` - state kinds and the state record
//! - `transition` - transition kinds
//! - `atn` - the network, decision registry, rule entry/exit links
//! - `serialize` - integer-stream encode/decode
//! - `dump` - plaintext dump for tests and debugging

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod atn;
mod dump;
mod interval;
mod serialize;
mod state;
mod transition;

#[cfg(test)]
mod atn_tests;
#[cfg(test)]
mod interval_tests;
#[cfg(test)]
mod serialize_tests;

pub use atn::{Atn, AtnKind};
pub use dump::dump_atn;
pub use interval::{Interval, IntervalSet};
pub use serialize::{SerializeError, SerializeResult, deserialize, serialize};
pub use state::{AtnState, NO_STATE, StateId, StateKind};
pub use transition::Transition;

/// Token type of the synthetic end-of-file token.
pub const TOKEN_EOF: i32 = -1;

/// Pseudo token type used for epsilon edges in lookahead computation.
pub const TOKEN_EPSILON: i32 = -2;

/// Token type 0 is reserved and never assigned to a user token.
pub const TOKEN_INVALID_TYPE: i32 = 0;

/// First token type available to user-defined tokens.
pub const MIN_USER_TOKEN_TYPE: i32 = 1;

/// Smallest valid code point in lexer transitions.
pub const MIN_CHAR_VALUE: i32 = 0;

/// Largest valid code point in lexer transitions.
pub const MAX_CHAR_VALUE: i32 = 0x10FFFF;

//! The per-packet classifier (spec §4.3): a hot-swappable interpreter that
//! walks an installed [`crate::codec::Blob`] against a [`Frame`], honoring
//! matches, watchers, and jump/return control flow without ever touching
//! the mutable chain graph.

pub mod counters;
pub mod engine;
pub mod frame;
pub mod verdict_stack;

pub use counters::CounterBank;
pub use engine::{Engine, Outcome};
pub use frame::Frame;
pub use verdict_stack::{VerdictStack, MAX_JUMP_DEPTH};

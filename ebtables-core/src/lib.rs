#![forbid(unsafe_code)]

pub mod classifier;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod mutate;
pub mod reconcile;
pub mod transport;
pub mod validate;

pub use classifier::{Engine, Frame, Outcome};
pub use config::{load_initial_ruleset, InitialRuleSet};
pub use error::{EbtError, Result};
pub use model::{
    Chain, ChainKind, CounterChangeLog, Entry, LogOp, Match, Policy, Registry, Table, Target,
    Verdict, Watcher,
};
pub use transport::{AtomicFileTransport, MemoryTransport, Transport};
pub use validate::validate;

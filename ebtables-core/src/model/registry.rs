//! The extension registry (spec §4.1): the set of match/watcher/target
//! implementations a [`Table`](super::Table) can reference by name.
//!
//! CLI-flag parsing (the `-A ... --ip-tos ...` grammar) is an external
//! concern and is not modeled here; a capability is limited to what the
//! classifier and validator actually need at runtime: describing itself,
//! checking a finished entry, comparing two payloads for equality, and
//! running the match/watch/target logic against a frame.

use std::collections::HashMap;

use crate::error::Result;

/// What a non-standard target decided for the packet that reached it.
/// Unlike the built-in standard target, extension targets never jump —
/// none of the concrete ebtables target extensions (`mark`, `nat`,
/// `redirect`, `arpreply`) ever produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    Accept,
    Drop,
    Continue,
    Return,
}

/// A match extension: inspects a frame and reports hit/no-hit, honoring the
/// entry's `invflags` for this match (negation is applied by the caller).
pub trait MatchExt: Send + Sync {
    fn name(&self) -> &str;

    /// Reject malformed or contradictory match payloads at rule-build time
    /// (mirrors `final_check` in the C `ebt_u_match` vtable).
    fn final_check(&self, payload: &[u8]) -> Result<()>;

    fn matches(&self, payload: &[u8], frame: &crate::classifier::Frame) -> bool;

    /// Payload-level equality, used by the rule-exists check (spec §4.4.1)
    /// to compare a candidate entry against an existing one.
    fn payload_eq(&self, a: &[u8], b: &[u8]) -> bool {
        a == b
    }
}

/// A watcher extension: observes a frame without affecting match/no-match.
pub trait WatcherExt: Send + Sync {
    fn name(&self) -> &str;
    fn final_check(&self, payload: &[u8]) -> Result<()>;
    fn observe(&self, payload: &[u8], frame: &crate::classifier::Frame);
    fn payload_eq(&self, a: &[u8], b: &[u8]) -> bool {
        a == b
    }
}

/// A non-standard target extension.
pub trait TargetExt: Send + Sync {
    fn name(&self) -> &str;
    fn final_check(&self, payload: &[u8]) -> Result<()>;
    fn invoke(&self, payload: &[u8], frame: &crate::classifier::Frame) -> TargetOutcome;
    fn payload_eq(&self, a: &[u8], b: &[u8]) -> bool {
        a == b
    }
}

/// A table extension: governs which hooks a table may bind and what its
/// valid target set is (mirrors `struct ebt_u_table`'s `check` callback,
/// e.g. `nat`'s restriction to `PREROUTING`/`OUTPUT`/`POSTROUTING`).
pub trait TableExt: Send + Sync {
    fn name(&self) -> &str;
    fn valid_hooks(&self) -> u32;
}

/// The set of extensions a [`Table`](super::Table) can reference. Built up
/// once at startup and shared (typically behind an `Arc`) across the
/// mutator, validator, and classifier.
#[derive(Default)]
pub struct Registry {
    matches: HashMap<String, Box<dyn MatchExt>>,
    watchers: HashMap<String, Box<dyn WatcherExt>>,
    targets: HashMap<String, Box<dyn TargetExt>>,
    tables: HashMap<String, Box<dyn TableExt>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_match(&mut self, ext: Box<dyn MatchExt>) {
        self.matches.insert(ext.name().to_string(), ext);
    }

    pub fn register_watcher(&mut self, ext: Box<dyn WatcherExt>) {
        self.watchers.insert(ext.name().to_string(), ext);
    }

    pub fn register_target(&mut self, ext: Box<dyn TargetExt>) {
        self.targets.insert(ext.name().to_string(), ext);
    }

    pub fn register_table(&mut self, ext: Box<dyn TableExt>) {
        self.tables.insert(ext.name().to_string(), ext);
    }

    pub fn find_match(&self, name: &str) -> Option<&dyn MatchExt> {
        self.matches.get(name).map(|b| b.as_ref())
    }

    pub fn find_watcher(&self, name: &str) -> Option<&dyn WatcherExt> {
        self.watchers.get(name).map(|b| b.as_ref())
    }

    pub fn find_target(&self, name: &str) -> Option<&dyn TargetExt> {
        self.targets.get(name).map(|b| b.as_ref())
    }

    pub fn find_table(&self, name: &str) -> Option<&dyn TableExt> {
        self.tables.get(name).map(|b| b.as_ref())
    }

    /// List every registered extension name, grouped by kind, in
    /// registration order is not preserved (`HashMap`); callers that need a
    /// stable order should sort the result (mirrors `ebt_list_extensions`,
    /// which the original prints unsorted but we make deterministic here).
    pub fn extension_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .matches
            .keys()
            .chain(self.watchers.keys())
            .chain(self.targets.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullTarget;
    impl TargetExt for NullTarget {
        fn name(&self) -> &str {
            "null"
        }
        fn final_check(&self, _payload: &[u8]) -> Result<()> {
            Ok(())
        }
        fn invoke(&self, _payload: &[u8], _frame: &crate::classifier::Frame) -> TargetOutcome {
            TargetOutcome::Accept
        }
    }

    #[test]
    fn registers_and_finds_by_name() {
        let mut reg = Registry::new();
        reg.register_target(Box::new(NullTarget));
        assert!(reg.find_target("null").is_some());
        assert!(reg.find_target("missing").is_none());
    }

    #[test]
    fn extension_names_are_sorted_and_deduped() {
        let mut reg = Registry::new();
        reg.register_target(Box::new(NullTarget));
        assert_eq!(reg.extension_names(), vec!["null".to_string()]);
    }
}

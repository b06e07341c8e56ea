use super::{CounterChangeLog, Entry, STANDARD_CHAIN_BIT};

/// What a chain's default policy is once traversal falls off the end of its
/// entry list, for standard (hook-bound) chains. UDCs have no policy of
/// their own: falling off the end of a UDC is an implicit `RETURN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Accept,
    Drop,
}

impl Policy {
    pub fn as_verdict(self) -> super::Verdict {
        match self {
            Policy::Accept => super::Verdict::Accept,
            Policy::Drop => super::Verdict::Drop,
        }
    }
}

/// Distinguishes a standard (hook-bound) chain from a user-defined one.
/// `hook_mask` on a UDC is the OR of the hook bits (and
/// [`STANDARD_CHAIN_BIT`] of every chain reachable on some path, per
/// `ebt_check_for_loops`'s hook-mask propagation) of every chain that jumps
/// to it, directly or transitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Standard { policy: Policy },
    UserDefined,
}

/// A named sequence of [`Entry`] rules, either bound to a bridging hook or
/// user-defined and reachable only via a `Jump` from some other chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub name: String,
    pub kind: ChainKind,
    pub hook_mask: u32,
    pub entries: Vec<Entry>,
    pub counter_offset: u32,
    /// Per-slot reconciliation tags accumulated by [`crate::mutate`] as
    /// edits happen, consumed by [`crate::reconcile`] to produce this
    /// chain's new counter array against the previously installed one.
    pub change_log: CounterChangeLog,
}

impl Chain {
    pub fn new_standard(name: impl Into<String>, hook_bit: u32, policy: Policy) -> Self {
        Chain {
            name: name.into(),
            kind: ChainKind::Standard { policy },
            hook_mask: hook_bit | STANDARD_CHAIN_BIT,
            entries: Vec::new(),
            counter_offset: 0,
            change_log: CounterChangeLog::new(),
        }
    }

    pub fn new_udc(name: impl Into<String>) -> Self {
        Chain {
            name: name.into(),
            kind: ChainKind::UserDefined,
            hook_mask: 0,
            entries: Vec::new(),
            counter_offset: 0,
            change_log: CounterChangeLog::new(),
        }
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.kind, ChainKind::Standard { .. })
    }

    pub fn policy(&self) -> Option<Policy> {
        match self.kind {
            ChainKind::Standard { policy } => Some(policy),
            ChainKind::UserDefined => None,
        }
    }
}

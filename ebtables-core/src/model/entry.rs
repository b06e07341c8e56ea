use std::ops::{BitOr, BitOrAssign};

use super::{InterfaceName, MacAddr, Verdict};

/// Entry match-direction flags, mirroring `EBT_IPROTO`, `EBT_IIN`,
/// `EBT_IOUT`, `EBT_ILOGICALIN`, `EBT_ILOGICALOUT`, `EBT_ISOURCE`,
/// `EBT_IDEST` from `ebtables_u.h`, plus their `EBT_I*_NOT` inversions
/// folded into [`Entry::invflags`] rather than here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags(u32);

impl EntryFlags {
    pub const PROTO: EntryFlags = EntryFlags(1 << 0);
    pub const IN: EntryFlags = EntryFlags(1 << 1);
    pub const OUT: EntryFlags = EntryFlags(1 << 2);
    pub const LOGICAL_IN: EntryFlags = EntryFlags(1 << 3);
    pub const LOGICAL_OUT: EntryFlags = EntryFlags(1 << 4);
    pub const SOURCE_MAC: EntryFlags = EntryFlags(1 << 5);
    pub const DEST_MAC: EntryFlags = EntryFlags(1 << 6);
    /// Accept 802.3-framed traffic (EtherType < 1536) as a protocol match,
    /// alongside an exact `ethproto` equality (`EBT_802_3`).
    pub const ETH_802_3: EntryFlags = EntryFlags(1 << 7);
    /// Skip protocol matching entirely — the entry matches any EtherType
    /// regardless of `ethproto` (`EBT_NOPROTO`).
    pub const NOPROTO: EntryFlags = EntryFlags(1 << 8);

    pub fn contains(self, other: EntryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: EntryFlags) {
        self.0 |= other.0;
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn from_bits_truncate(bits: u32) -> EntryFlags {
        EntryFlags(bits)
    }
}

impl BitOr for EntryFlags {
    type Output = EntryFlags;
    fn bitor(self, rhs: EntryFlags) -> EntryFlags {
        EntryFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntryFlags {
    fn bitor_assign(&mut self, rhs: EntryFlags) {
        self.0 |= rhs.0;
    }
}

/// Packet/byte hit counters attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counter {
    pub packets: u64,
    pub bytes: u64,
}

/// An opaque match extension invocation: a name plus its serialized
/// match-specific payload. The payload's shape is owned by whichever
/// [`super::MatchExt`] is registered under `name`; the core model never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub name: String,
    pub payload: Vec<u8>,
}

/// An opaque watcher extension invocation (same shape as [`Match`], but
/// watchers observe rather than filter — see spec §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watcher {
    pub name: String,
    pub payload: Vec<u8>,
}

/// A target invocation: either the built-in standard target (a [`Verdict`])
/// or a named extension target with an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPayload {
    Standard(Verdict),
    Extension(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub payload: TargetPayload,
}

impl Target {
    pub fn standard(verdict: Verdict) -> Self {
        Target { name: "standard".to_string(), payload: TargetPayload::Standard(verdict) }
    }

    pub fn as_verdict(&self) -> Option<Verdict> {
        match &self.payload {
            TargetPayload::Standard(v) => Some(*v),
            TargetPayload::Extension(_) => None,
        }
    }
}

/// One rule: the match criteria every entry carries directly (protocol,
/// interfaces, MAC source/dest), plus extension matches/watchers and a
/// target. Mirrors `struct ebt_u_entry` in `ebtables_u.h`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub bitmask: EntryFlags,
    pub invflags: u32,
    pub ethproto: u16,
    pub in_if: InterfaceName,
    pub out_if: InterfaceName,
    pub logical_in: InterfaceName,
    pub logical_out: InterfaceName,
    pub sourcemac: MacAddr,
    pub sourcemsk: MacAddr,
    pub destmac: MacAddr,
    pub destmsk: MacAddr,
    pub matches: Vec<Match>,
    pub watchers: Vec<Watcher>,
    pub target: Target,
    pub counter: Counter,
}

impl Entry {
    /// A bare entry matching every packet, falling through to `target`.
    pub fn new(target: Target) -> Self {
        Entry {
            bitmask: EntryFlags::default(),
            invflags: 0,
            ethproto: 0,
            in_if: InterfaceName::default(),
            out_if: InterfaceName::default(),
            logical_in: InterfaceName::default(),
            logical_out: InterfaceName::default(),
            sourcemac: MacAddr::ZERO,
            sourcemsk: MacAddr::ZERO,
            destmac: MacAddr::ZERO,
            destmsk: MacAddr::ZERO,
            matches: Vec::new(),
            watchers: Vec::new(),
            target,
            counter: Counter::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_entry_has_no_builtin_criteria() {
        let e = Entry::new(Target::standard(Verdict::Accept));
        assert_eq!(e.bitmask, EntryFlags::default());
        assert!(e.matches.is_empty());
        assert!(e.watchers.is_empty());
        assert_eq!(e.target.as_verdict(), Some(Verdict::Accept));
    }
}

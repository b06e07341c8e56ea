//! The in-memory chain graph (spec data model, §3).
//!
//! A [`Table`] owns an arena of [`Chain`]s; chain identity is a dense index
//! ("chain nr") rather than a pointer, mirroring `ebt_nr_to_chain` in the
//! original `libebtc.c`: hook indices `0..NUM_HOOKS` address standard
//! chains, indices `>= NUM_HOOKS` address user-defined chains in creation
//! order.

mod chain;
mod counter_log;
mod entry;
mod interface;
mod mac;
mod registry;
mod table;
mod verdict;

pub use chain::{Chain, ChainKind, Policy};
pub use counter_log::{CounterChangeLog, CounterChangeMode, LogOp};
pub use entry::{Counter, Entry, EntryFlags, Match, Target, TargetPayload, Watcher};
pub use interface::InterfaceName;
pub use mac::MacAddr;
pub use registry::{MatchExt, Registry, TableExt, TargetExt, TargetOutcome, WatcherExt};
pub use table::Table;
pub use verdict::Verdict;

/// Number of standard bridge-forwarding hooks (`NF_BR_NUMHOOKS`).
pub const NUM_HOOKS: usize = 6;

/// Bit set alongside a chain's own hook bit in its `hook_mask`, marking it
/// as a standard (hook-bound) chain rather than a UDC. Matches the
/// `(1 << NF_BR_NUMHOOKS)` sentinel used by `ebt_check_for_loops`.
pub const STANDARD_CHAIN_BIT: u32 = 1 << NUM_HOOKS;

/// A standard bridge-forwarding entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Hook {
    PreRouting = 0,
    Input = 1,
    Forward = 2,
    Output = 3,
    PostRouting = 4,
    Broute = 5,
}

impl Hook {
    pub const ALL: [Hook; NUM_HOOKS] = [
        Hook::PreRouting,
        Hook::Input,
        Hook::Forward,
        Hook::Output,
        Hook::PostRouting,
        Hook::Broute,
    ];

    pub fn index(self) -> usize {
        self as u8 as usize
    }

    pub fn from_index(i: usize) -> Option<Hook> {
        Self::ALL.get(i).copied()
    }

    /// Case-insensitive lookup by standard chain name (`"INPUT"`, `"input"`, ...).
    pub fn from_name(name: &str) -> Option<Hook> {
        Self::ALL.into_iter().find(|h| h.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Hook::PreRouting => "PREROUTING",
            Hook::Input => "INPUT",
            Hook::Forward => "FORWARD",
            Hook::Output => "OUTPUT",
            Hook::PostRouting => "POSTROUTING",
            Hook::Broute => "BROUTING",
        }
    }

    pub fn bit(self) -> u32 {
        1 << self.index()
    }
}

/// Maximum length (excluding NUL) of a table/chain/extension name on the
/// wire; the on-wire buffer is [`NAME_WIRE_LEN`] bytes.
pub const NAME_MAXLEN: usize = 31;
/// Wire size of a table/chain/extension name buffer (31 bytes + NUL).
pub const NAME_WIRE_LEN: usize = 32;
/// Wire size of an interface name buffer (`IFNAMSIZ`).
pub const IFNAME_WIRE_LEN: usize = 16;
/// Maximum printable length of an interface name (15 bytes + optional
/// wildcard marker consumes none of that budget on the wire, but we keep
/// one byte free for the `\x01` wildcard suffix like the kernel does).
pub const IFNAME_MAXLEN: usize = 15;
/// Byte length of an Ethernet MAC address.
pub const MAC_LEN: usize = 6;
/// The wildcard suffix byte the kernel uses in interface names (printed as `+`).
pub const WILDCARD_BYTE: u8 = 0x01;

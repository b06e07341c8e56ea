//! The per-packet interpreter (spec §4.3), grounded on `ebt_do_table` in
//! the kernel module this userspace tool administers: walk the installed
//! blob entry by entry using bounds-checked self-relative offsets,
//! evaluating built-in and extension matches, honoring watchers, and
//! dispatching the target's verdict — `Jump` pushes a return point,
//! `Return` pops one, falling off a standard chain's last entry applies
//! its policy, and anything unexpected drops the packet rather than
//! panicking.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::codec::{wire, Blob, ChainIndex};
use crate::error::{EbtError, Result};
use crate::model::{InterfaceName, MacAddr, Registry, TargetOutcome};

use super::counters::CounterBank;
use super::frame::Frame;
use super::verdict_stack::VerdictStack;

/// What the classifier decided for a frame, after walking every jump and
/// `RETURN` to a final disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accept,
    Drop,
}

enum RawVerdict {
    Accept,
    Drop,
    Continue,
    Return,
    Jump(u32),
}

impl RawVerdict {
    fn from_raw(raw: i32) -> Self {
        match raw {
            -1 => RawVerdict::Accept,
            -2 => RawVerdict::Drop,
            -3 => RawVerdict::Continue,
            -4 => RawVerdict::Return,
            n if n >= 0 => RawVerdict::Jump(n as u32),
            _ => RawVerdict::Drop,
        }
    }
}

struct InstalledBlob {
    blob: Blob,
    index: ChainIndex,
}

/// A live, hot-swappable classifier for one table. `install` replaces the
/// blob+index pair behind an `ArcSwap`; in-flight `classify` calls finish
/// against whatever snapshot they already loaded (an RCU-style swap, no
/// reader ever blocks on a writer).
pub struct Engine {
    installed: ArcSwap<InstalledBlob>,
    counters: CounterBank,
    registry: Arc<Registry>,
}

impl Engine {
    pub fn new(registry: Arc<Registry>) -> Self {
        Engine {
            installed: ArcSwap::from_pointee(InstalledBlob { blob: Blob::default(), index: ChainIndex::build(&Blob::default()).expect("empty blob indexes cleanly") }),
            counters: CounterBank::new(0),
            registry,
        }
    }

    /// Swap in a newly translated blob, and its reconciled counter array.
    pub fn install(&self, blob: Blob, counters: Vec<crate::model::Counter>) -> Result<()> {
        let index = ChainIndex::build(&blob)?;
        self.counters.replace(counters);
        self.installed.store(Arc::new(InstalledBlob { blob, index }));
        Ok(())
    }

    pub fn counters(&self) -> &CounterBank {
        &self.counters
    }

    /// Classify one frame against the chain bound to `frame.hook`.
    /// No chain bound to that hook (an unpopulated hook) accepts by
    /// default, mirroring a bridge hook with no table attached.
    pub fn classify(&self, frame: &Frame<'_>) -> Result<Outcome> {
        let installed = self.installed.load();
        let Some(start_offset) = installed.index.hook_chain_offset(frame.hook.index()) else {
            return Ok(Outcome::Accept);
        };

        let mut stack: VerdictStack<ResumeFrame> = VerdictStack::new();
        let (mut policy, mut entries_left, mut entry_offset) =
            read_chain_header(&installed.blob, start_offset as usize)?;

        loop {
            if entries_left == 0 {
                match policy {
                    Some(crate::model::Policy::Accept) => return Ok(Outcome::Accept),
                    Some(crate::model::Policy::Drop) => return Ok(Outcome::Drop),
                    None => match stack.pop() {
                        Some(resume) => {
                            policy = resume.policy;
                            entries_left = resume.entries_left;
                            entry_offset = resume.entry_offset;
                            continue;
                        }
                        None => return Ok(Outcome::Accept),
                    },
                }
            }

            let (step, next) = evaluate_entry(
                &installed.blob,
                entry_offset,
                frame,
                &self.registry,
                &self.counters,
                &installed.index,
            )?;
            match step {
                EntryStep::NoMatch | EntryStep::Verdict(RawVerdict::Continue) => {
                    entry_offset = next;
                    entries_left -= 1;
                }
                EntryStep::Verdict(RawVerdict::Accept) => return Ok(Outcome::Accept),
                EntryStep::Verdict(RawVerdict::Drop) => return Ok(Outcome::Drop),
                EntryStep::Verdict(RawVerdict::Return) => match stack.pop() {
                    Some(resume) => {
                        policy = resume.policy;
                        entries_left = resume.entries_left;
                        entry_offset = resume.entry_offset;
                    }
                    None => return Ok(Outcome::Accept),
                },
                EntryStep::Verdict(RawVerdict::Jump(target)) => {
                    if !installed.index.is_chain_offset(target) {
                        return Err(EbtError::Corrupt(format!(
                            "jump target offset {target} does not land on a chain header"
                        )));
                    }
                    let resume = ResumeFrame { policy, entries_left: entries_left - 1, entry_offset: next };
                    if !stack.push(resume) {
                        return Ok(Outcome::Drop);
                    }
                    let (target_policy, target_entries, target_offset) =
                        read_chain_header(&installed.blob, target as usize)?;
                    policy = target_policy;
                    entries_left = target_entries;
                    entry_offset = target_offset;
                }
            }
        }
    }
}

/// Where to resume the calling chain after a jumped-to chain runs off its
/// end or hits `RETURN`: the specific entry to continue at, how many
/// entries remain in that chain from there, and its policy (`None` for a
/// user-defined chain, which instead pops its own caller on fallthrough).
struct ResumeFrame {
    policy: Option<crate::model::Policy>,
    entries_left: usize,
    entry_offset: u32,
}

enum EntryStep {
    NoMatch,
    Verdict(RawVerdict),
}

fn read_chain_header(blob: &Blob, offset: usize) -> Result<(Option<crate::model::Policy>, usize, u32)> {
    let mut r = blob.cursor_at(offset)?;
    let tag = r.read_u8()?;
    if tag != wire::TAG_CHAIN {
        return Err(EbtError::Corrupt(format!("expected chain header at offset {offset}")));
    }
    let _hook_mask = r.read_u32()?;
    let policy_raw = r.read_i32()?;
    let entry_count = r.read_u32()? as usize;
    let name_len = r.read_u8()? as usize;
    r.read_bytes(name_len)?;
    let policy = match policy_raw {
        wire::POLICY_ACCEPT => Some(crate::model::Policy::Accept),
        wire::POLICY_DROP => Some(crate::model::Policy::Drop),
        wire::POLICY_NONE => None,
        other => return Err(EbtError::Corrupt(format!("invalid policy {other}"))),
    };
    Ok((policy, entry_count, r.position() as u32))
}

#[allow(clippy::too_many_arguments)]
fn evaluate_entry(
    blob: &Blob,
    entry_offset: u32,
    frame: &Frame<'_>,
    registry: &Registry,
    counters: &CounterBank,
    index: &ChainIndex,
) -> Result<(EntryStep, u32)> {
    let entry_start = entry_offset as usize;
    let mut r = blob.cursor_at(entry_start)?;
    let tag = r.read_u8()?;
    if tag != wire::TAG_ENTRY {
        return Err(EbtError::Corrupt(format!("expected entry at offset {entry_start}")));
    }
    let bitmask = r.read_u32()?;
    let invflags = r.read_u32()?;
    let ethproto = r.read_u16_be()?;
    let in_if = crate::codec::wire::decode_ifname_field(r.read_bytes(16)?)?;
    let out_if = crate::codec::wire::decode_ifname_field(r.read_bytes(16)?)?;
    let logical_in = crate::codec::wire::decode_ifname_field(r.read_bytes(16)?)?;
    let logical_out = crate::codec::wire::decode_ifname_field(r.read_bytes(16)?)?;
    let sourcemac = MacAddr(r.read_array6()?);
    let sourcemsk = MacAddr(r.read_array6()?);
    let destmac = MacAddr(r.read_array6()?);
    let destmsk = MacAddr(r.read_array6()?);
    let _watchers_offset = r.read_u32()?;
    let _target_offset = r.read_u32()?;
    let next_offset = r.read_u32()?;
    let next = entry_offset + next_offset;
    let _packets = r.read_u64()?;
    let _bytes = r.read_u64()?;

    if !builtin_fields_match(
        bitmask, invflags, ethproto, &in_if, &out_if, &logical_in, &logical_out, sourcemac,
        sourcemsk, destmac, destmsk, frame,
    ) {
        return Ok((EntryStep::NoMatch, next));
    }

    for (name, payload) in crate::codec::parse::read_ext_list(&mut r)? {
        let Some(ext) = registry.find_match(&name) else {
            return Err(EbtError::Resolve(format!("unknown match '{name}'")));
        };
        if !ext.matches(&payload, frame) {
            return Ok((EntryStep::NoMatch, next));
        }
    }

    for (name, payload) in crate::codec::parse::read_ext_list(&mut r)? {
        let Some(ext) = registry.find_watcher(&name) else {
            return Err(EbtError::Resolve(format!("unknown watcher '{name}'")));
        };
        ext.observe(&payload, frame);
    }

    let entry_ordinal = index.entry_ordinal(entry_offset).ok_or_else(|| {
        EbtError::Corrupt(format!("entry at offset {entry_start} has no counter slot"))
    })?;
    counters.hit(entry_ordinal, frame.len());

    let _target_name = crate::codec::wire::decode_name_field(r.read_bytes(32)?)?;
    let target_kind = r.read_u8()?;
    let verdict = match target_kind {
        0 => RawVerdict::from_raw(r.read_i32()?),
        1 => {
            let len = r.read_u16()? as usize;
            let payload = r.read_bytes(len)?;
            let Some(ext) = registry.find_target(&_target_name) else {
                return Err(EbtError::Resolve(format!("unknown target '{}'", _target_name)));
            };
            match ext.invoke(payload, frame) {
                TargetOutcome::Accept => RawVerdict::Accept,
                TargetOutcome::Drop => RawVerdict::Drop,
                TargetOutcome::Continue => RawVerdict::Continue,
                TargetOutcome::Return => RawVerdict::Return,
            }
        }
        other => return Err(EbtError::Corrupt(format!("unknown target payload kind {other}"))),
    };
    Ok((EntryStep::Verdict(verdict), next))
}

#[allow(clippy::too_many_arguments)]
fn builtin_fields_match(
    bitmask: u32,
    invflags: u32,
    ethproto: u16,
    in_if: &InterfaceName,
    out_if: &InterfaceName,
    logical_in: &InterfaceName,
    logical_out: &InterfaceName,
    sourcemac: MacAddr,
    sourcemsk: MacAddr,
    destmac: MacAddr,
    destmsk: MacAddr,
    frame: &Frame<'_>,
) -> bool {
    use crate::model::EntryFlags;
    let flags = EntryFlags::from_bits_truncate(bitmask);

    let check = |bit: EntryFlags, inv_bit: u32, cond: bool| -> bool {
        if !flags.contains(bit) {
            return true;
        }
        cond != (invflags & inv_bit != 0)
    };

    let proto_match = flags.contains(EntryFlags::NOPROTO)
        || ethproto == frame.ethproto
        || (frame.ethproto < 1536 && flags.contains(EntryFlags::ETH_802_3));

    check(EntryFlags::PROTO, 1 << 0, proto_match)
        && check(EntryFlags::IN, 1 << 1, in_if.matches(frame.in_if))
        && check(EntryFlags::OUT, 1 << 2, out_if.matches(frame.out_if))
        && check(EntryFlags::LOGICAL_IN, 1 << 3, logical_in.matches(frame.logical_in))
        && check(EntryFlags::LOGICAL_OUT, 1 << 4, logical_out.matches(frame.logical_out))
        && check(EntryFlags::SOURCE_MAC, 1 << 5, sourcemac.masked_eq(&sourcemsk, &frame.source))
        && check(EntryFlags::DEST_MAC, 1 << 6, destmac.masked_eq(&destmsk, &frame.dest))
}

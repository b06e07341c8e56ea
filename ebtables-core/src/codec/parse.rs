//! Blob → graph translation (spec §4.2.3), grounded on
//! `ebt_translate_chains`/`ebt_translate_entry` in `communication.c`: a
//! first pass walks every chain header to build a side table mapping each
//! chain's byte offset to a dense chain nr, then a second pass
//! materializes each entry and resolves jump targets through that table.

use std::collections::HashMap;

use crate::error::{EbtError, Result};
use crate::model::{
    Chain, ChainKind, Counter, Entry, EntryFlags, Match, MacAddr, Policy, Target, TargetPayload,
    Verdict, Watcher, NUM_HOOKS,
};

use super::blob::{Blob, BlobReader};
use super::wire::{
    decode_ifname_field, decode_name_field, CHAIN_HEADER_FIXED_LEN, ENTRY_FIXED_LEN, POLICY_ACCEPT,
    POLICY_DROP, POLICY_NONE, TAG_CHAIN, TAG_ENTRY,
};

pub(crate) struct ChainDescriptor {
    pub(crate) offset: usize,
    pub(crate) hook_mask: u32,
    pub(crate) policy: i32,
    pub(crate) entry_count: u32,
    pub(crate) name: String,
    /// Starting byte offset of each of this chain's entries, in
    /// traversal order, as scanned.
    pub(crate) entry_offsets: Vec<usize>,
}

/// Parse a previously-[`serialize`](super::serialize::serialize)d blob back
/// into a [`crate::model::Table`].
pub fn parse(name: &str, blob: &Blob) -> Result<crate::model::Table> {
    let descriptors = scan_chain_headers(blob)?;

    // Pass 1: assign every chain its dense nr and record offset -> nr,
    // without touching entries yet, so pass 2 can resolve a jump to any
    // chain regardless of where in the blob it appears.
    let mut offset_to_nr: HashMap<usize, usize> = HashMap::new();
    let mut hook_slots: [Option<usize>; NUM_HOOKS] = [None; NUM_HOOKS];
    let mut valid_hooks = 0u32;
    let mut udc_order: Vec<usize> = Vec::new();

    for (desc_index, desc) in descriptors.iter().enumerate() {
        if desc.policy == POLICY_NONE {
            let nr = NUM_HOOKS + udc_order.len();
            offset_to_nr.insert(desc.offset, nr);
            udc_order.push(desc_index);
        } else {
            let hook_bit = desc.hook_mask & !crate::model::STANDARD_CHAIN_BIT;
            if hook_bit.count_ones() != 1 {
                return Err(EbtError::Corrupt(format!(
                    "standard chain '{}' has malformed hook mask {:#x}",
                    desc.name, desc.hook_mask
                )));
            }
            let hook_index = hook_bit.trailing_zeros() as usize;
            if hook_index >= NUM_HOOKS || hook_slots[hook_index].is_some() {
                return Err(EbtError::Corrupt(format!(
                    "duplicate or out-of-range hook index {hook_index}"
                )));
            }
            valid_hooks |= hook_bit;
            hook_slots[hook_index] = Some(desc_index);
            offset_to_nr.insert(desc.offset, hook_index);
        }
    }

    // Each chain's counter_offset is the prefix sum of nentries over every
    // chain that precedes it in blob traversal order (spec invariant: the
    // table-wide counter vector is sliced per chain in that same order).
    let mut counter_offsets: HashMap<usize, u32> = HashMap::with_capacity(descriptors.len());
    let mut running = 0u32;
    for desc in &descriptors {
        counter_offsets.insert(desc.offset, running);
        running += desc.entry_count;
    }

    // Pass 2: materialize every chain's entries, resolving jump verdicts
    // through the now-complete offset_to_nr table.
    let mut hook_chains: [Option<Chain>; NUM_HOOKS] = Default::default();
    for (hook_index, desc_index) in hook_slots.iter().enumerate() {
        if let Some(desc_index) = desc_index {
            let desc = &descriptors[*desc_index];
            hook_chains[hook_index] = Some(materialize_chain(
                blob,
                desc,
                &offset_to_nr,
                counter_offsets[&desc.offset],
                true,
            )?);
        }
    }
    let mut udc_chains = Vec::with_capacity(udc_order.len());
    for desc_index in &udc_order {
        let desc = &descriptors[*desc_index];
        udc_chains.push(materialize_chain(
            blob,
            desc,
            &offset_to_nr,
            counter_offsets[&desc.offset],
            false,
        )?);
    }

    Ok(crate::model::Table::from_parts(name.to_string(), valid_hooks, hook_chains, udc_chains))
}

pub(crate) fn scan_chain_headers(blob: &Blob) -> Result<Vec<ChainDescriptor>> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos < blob.len() {
        let offset = pos;
        let mut r = blob.cursor_at(pos)?;
        let tag = r.read_u8()?;
        if tag != TAG_CHAIN {
            return Err(EbtError::Corrupt(format!("expected chain header at offset {offset}")));
        }
        let hook_mask = r.read_u32()?;
        let policy = r.read_i32()?;
        let entry_count = r.read_u32()?;
        let name_len = r.read_u8()? as usize;
        let name = decode_name_field(r.read_bytes(name_len)?)?;
        pos = offset + CHAIN_HEADER_FIXED_LEN + name_len;

        let mut entry_offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entry_offsets.push(pos);
            let mut er = blob.cursor_at(pos)?;
            let entry_tag = er.read_u8()?;
            if entry_tag != TAG_ENTRY {
                return Err(EbtError::Corrupt(format!("expected entry at offset {pos}")));
            }
            er.seek(pos + 1 + 4 + 4 + 2 + (16 * 4) + (6 * 4) + 4 + 4)?;
            let next_offset = er.read_u32()?;
            pos += next_offset as usize;
        }

        out.push(ChainDescriptor { offset, hook_mask, policy, entry_count, name, entry_offsets });
    }
    Ok(out)
}

fn materialize_chain(
    blob: &Blob,
    desc: &ChainDescriptor,
    offset_to_nr: &HashMap<usize, usize>,
    counter_offset: u32,
    is_standard: bool,
) -> Result<Chain> {
    let kind = if is_standard {
        match desc.policy {
            POLICY_ACCEPT => ChainKind::Standard { policy: Policy::Accept },
            POLICY_DROP => ChainKind::Standard { policy: Policy::Drop },
            other => {
                return Err(EbtError::Corrupt(format!("invalid standard policy {other}")));
            }
        }
    } else {
        ChainKind::UserDefined
    };

    let mut entries = Vec::with_capacity(desc.entry_count as usize);
    let mut pos = desc.offset + CHAIN_HEADER_FIXED_LEN + desc.name.len();
    for _ in 0..desc.entry_count {
        let (entry, size) = parse_entry(blob, pos, offset_to_nr)?;
        entries.push(entry);
        pos += size;
    }

    // The log is seeded one `Norm` per entry already on record — reconcile
    // carries each entry's old counter forward unchanged until a mutator
    // marks a slot as added, deleted, zeroed, or changed.
    let mut change_log = crate::model::CounterChangeLog::new();
    for _ in 0..desc.entry_count {
        change_log.push(crate::model::LogOp::Norm);
    }

    Ok(Chain {
        name: desc.name.clone(),
        kind,
        hook_mask: desc.hook_mask,
        entries,
        counter_offset,
        change_log,
    })
}

fn parse_entry(
    blob: &Blob,
    entry_start: usize,
    offset_to_nr: &HashMap<usize, usize>,
) -> Result<(Entry, usize)> {
    let mut r = blob.cursor_at(entry_start)?;
    let tag = r.read_u8()?;
    if tag != TAG_ENTRY {
        return Err(EbtError::Corrupt(format!("expected entry at offset {entry_start}")));
    }
    let bitmask = EntryFlags::from_bits_truncate(r.read_u32()?);
    let invflags = r.read_u32()?;
    let ethproto = r.read_u16_be()?;
    let in_if = decode_ifname_field(r.read_bytes(16)?)?;
    let out_if = decode_ifname_field(r.read_bytes(16)?)?;
    let logical_in = decode_ifname_field(r.read_bytes(16)?)?;
    let logical_out = decode_ifname_field(r.read_bytes(16)?)?;
    let sourcemac = MacAddr(r.read_array6()?);
    let sourcemsk = MacAddr(r.read_array6()?);
    let destmac = MacAddr(r.read_array6()?);
    let destmsk = MacAddr(r.read_array6()?);

    let watchers_offset = r.read_u32()? as usize;
    let target_offset = r.read_u32()? as usize;
    let next_offset = r.read_u32()? as usize;
    let packets = r.read_u64()?;
    let bytes = r.read_u64()?;

    debug_assert_eq!(r.position() - entry_start, ENTRY_FIXED_LEN);

    let matches = read_ext_list(&mut r)?
        .into_iter()
        .map(|(name, payload)| Match { name, payload })
        .collect();

    if r.position() - entry_start != watchers_offset {
        return Err(EbtError::Corrupt(format!(
            "entry at {entry_start}: watchers_offset {watchers_offset} does not match actual position {}",
            r.position() - entry_start
        )));
    }
    let watchers = read_ext_list(&mut r)?
        .into_iter()
        .map(|(name, payload)| Watcher { name, payload })
        .collect();

    if r.position() - entry_start != target_offset {
        return Err(EbtError::Corrupt(format!(
            "entry at {entry_start}: target_offset {target_offset} does not match actual position {}",
            r.position() - entry_start
        )));
    }
    let target_name = decode_name_field(r.read_bytes(32)?)?;
    let target_kind = r.read_u8()?;
    let payload = match target_kind {
        0 => {
            let raw = r.read_i32()?;
            let verdict = if raw >= 0 {
                let nr = offset_to_nr.get(&(raw as usize)).copied().ok_or_else(|| {
                    EbtError::Corrupt(format!("jump target offset {raw} does not land on a chain header"))
                })?;
                Verdict::Jump(nr)
            } else {
                Verdict::from_raw(raw)?
            };
            TargetPayload::Standard(verdict)
        }
        1 => {
            let len = r.read_u16()? as usize;
            TargetPayload::Extension(r.read_bytes(len)?.to_vec())
        }
        other => return Err(EbtError::Corrupt(format!("unknown target payload kind {other}"))),
    };

    if r.position() - entry_start != next_offset {
        return Err(EbtError::Corrupt(format!(
            "entry at {entry_start}: next_offset {next_offset} does not match actual size {}",
            r.position() - entry_start
        )));
    }

    let entry = Entry {
        bitmask,
        invflags,
        ethproto,
        in_if,
        out_if,
        logical_in,
        logical_out,
        sourcemac,
        sourcemsk,
        destmac,
        destmsk,
        matches,
        watchers,
        target: Target { name: target_name, payload },
        counter: Counter { packets, bytes },
    };
    Ok((entry, next_offset))
}

pub(crate) fn read_ext_list(r: &mut BlobReader<'_>) -> Result<Vec<(String, Vec<u8>)>> {
    let count = r.read_u16()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = decode_name_field(r.read_bytes(32)?)?;
        let len = r.read_u16()? as usize;
        let payload = r.read_bytes(len)?.to_vec();
        out.push((name, payload));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serialize::serialize;
    use crate::model::{Hook, Policy as ModelPolicy, Table};

    #[test]
    fn round_trips_empty_table() {
        let table = Table::new("filter", Hook::Input.bit(), ModelPolicy::Accept);
        let blob = serialize(&table).unwrap();
        let parsed = parse("filter", &blob).unwrap();
        assert_eq!(parsed.chain(Hook::Input.index()).unwrap().name, "INPUT");
        assert!(parsed.chain(Hook::Forward.index()).is_none());
    }

    #[test]
    fn round_trips_jump_to_udc() {
        let mut table = Table::new("filter", Hook::Input.bit(), ModelPolicy::Accept);
        let udc_nr = table.push_udc(Chain::new_udc("my-chain"));
        table
            .chain_mut(Hook::Input.index())
            .unwrap()
            .entries
            .push(Entry::new(Target::standard(Verdict::Jump(udc_nr))));
        let blob = serialize(&table).unwrap();
        let parsed = parse("filter", &blob).unwrap();
        let input = parsed.chain(Hook::Input.index()).unwrap();
        assert_eq!(input.entries[0].target.as_verdict(), Some(Verdict::Jump(NUM_HOOKS)));
        assert_eq!(parsed.chain(NUM_HOOKS).unwrap().name, "my-chain");
    }

    #[test]
    fn rejects_truncated_blob() {
        let table = Table::new("filter", Hook::Input.bit(), ModelPolicy::Accept);
        let mut blob_bytes = serialize(&table).unwrap().as_slice().to_vec();
        blob_bytes.truncate(3);
        let blob = Blob::new(blob_bytes);
        assert!(parse("filter", &blob).is_err());
    }
}

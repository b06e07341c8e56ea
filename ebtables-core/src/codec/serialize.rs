//! Graph → blob translation (spec §4.2.2), grounded on
//! `translate_user2kernel` in the original `communication.c`: precompute a
//! dense table of each chain's eventual byte offset before emitting a
//! single byte, so that `Jump` verdicts can be rewritten to offsets in one
//! forward pass with no backpatching of cross-chain references.

use crate::error::{EbtError, Result};
use crate::model::{Chain, ChainKind, Entry, Match, Table, TargetPayload, Verdict, Watcher};

use super::blob::{Blob, BlobWriter};
use super::wire::{
    encode_ifname_field, encode_name_field, CHAIN_HEADER_FIXED_LEN, POLICY_ACCEPT, POLICY_DROP,
    POLICY_NONE, TAG_CHAIN, TAG_ENTRY,
};

/// Translate a table's chain graph into a flat [`Blob`], resolving every
/// `Jump(nr)` verdict to the jumped-to chain's header byte offset.
pub fn serialize(table: &Table) -> Result<Blob> {
    let chain_offsets = precompute_chain_offsets(table)?;

    let mut w = BlobWriter::new();
    for (nr, chain) in table.iter_chains() {
        write_chain_header(&mut w, chain)?;
        for entry in &chain.entries {
            write_entry(&mut w, entry, &chain_offsets)?;
        }
        let _ = nr;
    }
    Ok(w.finish())
}

/// Walk every chain once, accounting for header + per-entry sizes, to learn
/// each chain's header offset before any jump target needs it. Entry sizes
/// must be computed identically here and in [`write_entry`]; a debug build
/// mismatch between the two would corrupt every jump past the first.
fn precompute_chain_offsets(table: &Table) -> Result<Vec<u32>> {
    let mut offsets = vec![0u32; table.chain_count()];
    let mut pos: u64 = 0;
    for (nr, chain) in table.iter_chains() {
        offsets[nr] = u32::try_from(pos)
            .map_err(|_| EbtError::Bug("blob exceeds 4 GiB addressable offset space".into()))?;
        pos += CHAIN_HEADER_FIXED_LEN as u64 + chain.name.len() as u64;
        for entry in &chain.entries {
            pos += entry_size(entry)? as u64;
        }
    }
    Ok(offsets)
}

fn entry_size(entry: &Entry) -> Result<usize> {
    use super::wire::ENTRY_FIXED_LEN;
    let mut size = ENTRY_FIXED_LEN;
    size += 2; // matches count
    for m in &entry.matches {
        size += crate::model::NAME_WIRE_LEN + 2 + m.payload.len();
    }
    size += 2; // watchers count
    for wch in &entry.watchers {
        size += crate::model::NAME_WIRE_LEN + 2 + wch.payload.len();
    }
    size += crate::model::NAME_WIRE_LEN + 1; // target name + payload-kind tag
    size += match &entry.target.payload {
        TargetPayload::Standard(_) => 4,
        TargetPayload::Extension(bytes) => 2 + bytes.len(),
    };
    Ok(size)
}

fn write_chain_header(w: &mut BlobWriter, chain: &Chain) -> Result<()> {
    w.write_u8(TAG_CHAIN);
    w.write_u32(chain.hook_mask);
    let policy = match chain.kind {
        ChainKind::Standard { policy } => match policy {
            crate::model::Policy::Accept => POLICY_ACCEPT,
            crate::model::Policy::Drop => POLICY_DROP,
        },
        ChainKind::UserDefined => POLICY_NONE,
    };
    w.write_i32(policy);
    w.write_u32(chain.entries.len() as u32);
    w.write_u8(chain.name.len() as u8);
    w.write_bytes(chain.name.as_bytes());
    Ok(())
}

fn write_entry(w: &mut BlobWriter, entry: &Entry, chain_offsets: &[u32]) -> Result<()> {
    let entry_start = w.position();
    w.write_u8(TAG_ENTRY);
    w.write_u32(entry.bitmask.bits());
    w.write_u32(entry.invflags);
    w.write_u16_be(entry.ethproto);
    w.write_bytes(&encode_ifname_field(&entry.in_if)?);
    w.write_bytes(&encode_ifname_field(&entry.out_if)?);
    w.write_bytes(&encode_ifname_field(&entry.logical_in)?);
    w.write_bytes(&encode_ifname_field(&entry.logical_out)?);
    w.write_bytes(&entry.sourcemac.0);
    w.write_bytes(&entry.sourcemsk.0);
    w.write_bytes(&entry.destmac.0);
    w.write_bytes(&entry.destmsk.0);

    let watchers_offset_pos = w.position();
    w.write_u32(0);
    let target_offset_pos = w.position();
    w.write_u32(0);
    let next_offset_pos = w.position();
    w.write_u32(0);
    w.write_u64(entry.counter.packets);
    w.write_u64(entry.counter.bytes);

    write_match_list(w, &entry.matches)?;

    let watchers_offset = (w.position() - entry_start) as u32;
    w.patch_u32(watchers_offset_pos, watchers_offset);
    write_watcher_list(w, &entry.watchers)?;

    let target_offset = (w.position() - entry_start) as u32;
    w.patch_u32(target_offset_pos, target_offset);
    write_target(w, entry, chain_offsets)?;

    let next_offset = (w.position() - entry_start) as u32;
    w.patch_u32(next_offset_pos, next_offset);
    Ok(())
}

fn write_match_list(w: &mut BlobWriter, matches: &[Match]) -> Result<()> {
    w.write_u16(matches.len() as u16);
    for m in matches {
        w.write_bytes(&encode_name_field(&m.name)?);
        w.write_u16(m.payload.len() as u16);
        w.write_bytes(&m.payload);
    }
    Ok(())
}

fn write_watcher_list(w: &mut BlobWriter, watchers: &[Watcher]) -> Result<()> {
    w.write_u16(watchers.len() as u16);
    for wch in watchers {
        w.write_bytes(&encode_name_field(&wch.name)?);
        w.write_u16(wch.payload.len() as u16);
        w.write_bytes(&wch.payload);
    }
    Ok(())
}

fn write_target(w: &mut BlobWriter, entry: &Entry, chain_offsets: &[u32]) -> Result<()> {
    w.write_bytes(&encode_name_field(&entry.target.name)?);
    match &entry.target.payload {
        TargetPayload::Standard(verdict) => {
            w.write_u8(0);
            let raw = match *verdict {
                Verdict::Jump(nr) => {
                    let offset = chain_offsets.get(nr).copied().ok_or_else(|| {
                        EbtError::Reference(format!("jump target chain nr {nr} does not exist"))
                    })?;
                    offset as i32
                }
                other => other.to_raw(),
            };
            w.write_i32(raw);
        }
        TargetPayload::Extension(bytes) => {
            w.write_u8(1);
            w.write_u16(bytes.len() as u16);
            w.write_bytes(bytes);
        }
    }
    Ok(())
}

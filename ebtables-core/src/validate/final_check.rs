//! Final, whole-rule-set validation (spec §4.6.2), grounded on
//! `ebtc_check_final` / the match-list-walking `final_check` dispatch in
//! `libebtc.c`: every jump must land on a chain that exists, and every
//! match/watcher/target payload must pass its extension's own
//! `final_check` before the rule-set is considered installable.

use crate::error::{EbtError, Result};
use crate::model::{EntryFlags, Registry, Table, TargetPayload, Verdict};

pub fn final_check(table: &Table, registry: &Registry) -> Result<()> {
    for (_nr, chain) in table.iter_chains() {
        for (idx, entry) in chain.entries.iter().enumerate() {
            if entry.bitmask.contains(EntryFlags::PROTO)
                && entry.ethproto < 1536
                && !entry.bitmask.contains(EntryFlags::ETH_802_3)
            {
                return Err(EbtError::Config(format!(
                    "chain '{}' rule {idx}: protocol {:#x} is < 1536 and requires the 802_3 flag",
                    chain.name, entry.ethproto
                )));
            }
            for m in &entry.matches {
                let ext = registry.find_match(&m.name).ok_or_else(|| {
                    EbtError::Resolve(format!(
                        "chain '{}' rule {idx}: unknown match '{}'",
                        chain.name, m.name
                    ))
                })?;
                ext.final_check(&m.payload).map_err(|e| {
                    EbtError::Resolve(format!(
                        "chain '{}' rule {idx}: match '{}' failed final check: {e}",
                        chain.name, m.name
                    ))
                })?;
            }
            for wch in &entry.watchers {
                let ext = registry.find_watcher(&wch.name).ok_or_else(|| {
                    EbtError::Resolve(format!(
                        "chain '{}' rule {idx}: unknown watcher '{}'",
                        chain.name, wch.name
                    ))
                })?;
                ext.final_check(&wch.payload).map_err(|e| {
                    EbtError::Resolve(format!(
                        "chain '{}' rule {idx}: watcher '{}' failed final check: {e}",
                        chain.name, wch.name
                    ))
                })?;
            }
            match &entry.target.payload {
                TargetPayload::Standard(Verdict::Jump(target_nr)) => {
                    if table.chain(*target_nr).is_none() {
                        return Err(EbtError::Reference(format!(
                            "chain '{}' rule {idx}: jump to nonexistent chain nr {target_nr}",
                            chain.name
                        )));
                    }
                }
                TargetPayload::Standard(_) => {}
                TargetPayload::Extension(payload) => {
                    let ext = registry.find_target(&entry.target.name).ok_or_else(|| {
                        EbtError::Resolve(format!(
                            "chain '{}' rule {idx}: unknown target '{}'",
                            chain.name, entry.target.name
                        ))
                    })?;
                    ext.final_check(payload).map_err(|e| {
                        EbtError::Resolve(format!(
                            "chain '{}' rule {idx}: target '{}' failed final check: {e}",
                            chain.name, entry.target.name
                        ))
                    })?;
                }
            }
        }
    }
    Ok(())
}

//! Rule removal (`-D`, spec §4.4.4), grounded on `ebtc_delete_rule` in
//! `libebtc.c`: delete either by rule number, or by value — the first (or
//! all, with `count < 0`) rule(s) structurally equal to a supplied
//! template entry.

use crate::error::{EbtError, Result};
use crate::model::{Entry, Registry, Table};

/// Delete the rule at `index` in `chain_nr`.
pub fn delete_rule_at(table: &mut Table, chain_nr: usize, index: usize) -> Result<Entry> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;
    if index >= chain.entries.len() {
        return Err(EbtError::Reference(format!(
            "rule index {index} out of range (chain has {} rules)",
            chain.entries.len()
        )));
    }
    chain.change_log.delete_for_entry(index);
    let removed = chain.entries.remove(index);
    table.recompute_counter_offsets();
    Ok(removed)
}

/// Delete every rule in `chain_nr` structurally equal to `template`, up to
/// `max_count` deletions (`None` = delete all matches). Returns the number
/// of rules deleted; zero matches is not an error (mirrors
/// `ebt_check_rule_exists` returning "not found" without failing the
/// overall command).
pub fn delete_matching(
    table: &mut Table,
    chain_nr: usize,
    template: &Entry,
    registry: &Registry,
    max_count: Option<usize>,
) -> Result<usize> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;

    let mut deleted = 0;
    let mut i = 0;
    while i < chain.entries.len() {
        if max_count.is_some_and(|max| deleted >= max) {
            break;
        }
        if entries_equal(&chain.entries[i], template, registry) {
            chain.change_log.delete_for_entry(i);
            chain.entries.remove(i);
            deleted += 1;
        } else {
            i += 1;
        }
    }
    if deleted > 0 {
        table.recompute_counter_offsets();
    }
    Ok(deleted)
}

/// Structural equality of two entries for rule-exists/delete-by-value
/// purposes: built-in fields compared directly, extension payloads
/// compared via the registered extension's `payload_eq` (falling back to
/// raw byte equality for an unregistered name, which can only ever compare
/// equal to itself).
pub fn entries_equal(a: &Entry, b: &Entry, registry: &Registry) -> bool {
    if a.bitmask != b.bitmask
        || a.invflags != b.invflags
        || a.ethproto != b.ethproto
        || a.in_if != b.in_if
        || a.out_if != b.out_if
        || a.logical_in != b.logical_in
        || a.logical_out != b.logical_out
        || a.sourcemac != b.sourcemac
        || a.sourcemsk != b.sourcemsk
        || a.destmac != b.destmac
        || a.destmsk != b.destmsk
    {
        return false;
    }
    if a.matches.len() != b.matches.len() || a.watchers.len() != b.watchers.len() {
        return false;
    }
    for (ma, mb) in a.matches.iter().zip(&b.matches) {
        if ma.name != mb.name {
            return false;
        }
        let eq = registry
            .find_match(&ma.name)
            .map(|ext| ext.payload_eq(&ma.payload, &mb.payload))
            .unwrap_or_else(|| ma.payload == mb.payload);
        if !eq {
            return false;
        }
    }
    for (wa, wb) in a.watchers.iter().zip(&b.watchers) {
        if wa.name != wb.name {
            return false;
        }
        let eq = registry
            .find_watcher(&wa.name)
            .map(|ext| ext.payload_eq(&wa.payload, &wb.payload))
            .unwrap_or_else(|| wa.payload == wb.payload);
        if !eq {
            return false;
        }
    }
    if a.target.name != b.target.name {
        return false;
    }
    match (&a.target.payload, &b.target.payload) {
        (crate::model::TargetPayload::Standard(va), crate::model::TargetPayload::Standard(vb)) => {
            va == vb
        }
        (crate::model::TargetPayload::Extension(pa), crate::model::TargetPayload::Extension(pb)) => {
            registry
                .find_target(&a.target.name)
                .map(|ext| ext.payload_eq(pa, pb))
                .unwrap_or(pa == pb)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hook, Policy, Target, Verdict};

    #[test]
    fn delete_at_index_removes_and_logs() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        crate::mutate::append::append_rule(
            &mut table,
            Hook::Input.index(),
            Entry::new(Target::standard(Verdict::Accept)),
        )
        .unwrap();
        delete_rule_at(&mut table, Hook::Input.index(), 0).unwrap();
        assert!(table.chain(Hook::Input.index()).unwrap().entries.is_empty());
    }

    #[test]
    fn delete_matching_removes_all_by_default_bound() {
        let registry = Registry::new();
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        for _ in 0..3 {
            crate::mutate::append::append_rule(
                &mut table,
                Hook::Input.index(),
                Entry::new(Target::standard(Verdict::Accept)),
            )
            .unwrap();
        }
        let template = Entry::new(Target::standard(Verdict::Accept));
        let deleted =
            delete_matching(&mut table, Hook::Input.index(), &template, &registry, None).unwrap();
        assert_eq!(deleted, 3);
        assert!(table.chain(Hook::Input.index()).unwrap().entries.is_empty());
    }

    #[test]
    fn delete_matching_respects_max_count() {
        let registry = Registry::new();
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        for _ in 0..3 {
            crate::mutate::append::append_rule(
                &mut table,
                Hook::Input.index(),
                Entry::new(Target::standard(Verdict::Accept)),
            )
            .unwrap();
        }
        let template = Entry::new(Target::standard(Verdict::Accept));
        let deleted = delete_matching(
            &mut table,
            Hook::Input.index(),
            &template,
            &registry,
            Some(1),
        )
        .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(table.chain(Hook::Input.index()).unwrap().entries.len(), 2);
    }
}

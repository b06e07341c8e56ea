//! Chain flush (`-F`, spec §4.4.6), grounded on `ebtc_flush_chains` in
//! `libebtc.c`: drop every entry in a chain (or every chain in the table
//! when no chain is named), logging a `Del` per dropped entry so the
//! reconciler knows to consume and discard their old counters.

use crate::error::{EbtError, Result};
use crate::model::Table;

pub fn flush_chain(table: &mut Table, chain_nr: usize) -> Result<usize> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;
    let removed = chain.entries.len();
    chain.entries.clear();
    // Always delete the current first live entry: each call consumes one
    // live slot, converting it to (or folding it away as) `Del`, so the
    // index to target never needs to advance.
    for _ in 0..removed {
        chain.change_log.delete_for_entry(0);
    }
    if removed > 0 {
        table.recompute_counter_offsets();
    }
    Ok(removed)
}

pub fn flush_table(table: &mut Table) -> Result<usize> {
    let mut total = 0;
    for nr in 0..table.chain_count() {
        if table.chain(nr).is_some() {
            total += flush_chain(table, nr)?;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, Hook, Policy, Target, Verdict};

    #[test]
    fn flush_chain_clears_entries_and_logs_deletes() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        crate::mutate::append::append_rule(
            &mut table,
            Hook::Input.index(),
            Entry::new(Target::standard(Verdict::Accept)),
        )
        .unwrap();
        let removed = flush_chain(&mut table, Hook::Input.index()).unwrap();
        assert_eq!(removed, 1);
        assert!(table.chain(Hook::Input.index()).unwrap().entries.is_empty());
    }

    #[test]
    fn flush_table_covers_every_populated_chain() {
        let mut table = Table::new("filter", Hook::Input.bit() | Hook::Forward.bit(), Policy::Accept);
        crate::mutate::append::append_rule(
            &mut table,
            Hook::Input.index(),
            Entry::new(Target::standard(Verdict::Accept)),
        )
        .unwrap();
        crate::mutate::append::append_rule(
            &mut table,
            Hook::Forward.index(),
            Entry::new(Target::standard(Verdict::Drop)),
        )
        .unwrap();
        assert_eq!(flush_table(&mut table).unwrap(), 2);
    }
}

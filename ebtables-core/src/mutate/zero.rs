//! Counter zeroing (`-Z`, spec §4.4.7), grounded on `ebtc_zero_counters` in
//! `libebtc.c`: reset an entry's in-memory counter to zero and log it so
//! reconciliation discards the old (non-zero) counter rather than carrying
//! it forward.

use crate::error::{EbtError, Result};
use crate::model::{Counter, LogOp, Table};

pub fn zero_rule(table: &mut Table, chain_nr: usize, index: usize) -> Result<()> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;
    let entry = chain
        .entries
        .get_mut(index)
        .ok_or_else(|| EbtError::Reference(format!("rule index {index} out of range")))?;
    entry.counter = Counter::default();
    chain.change_log.push(LogOp::Zero);
    Ok(())
}

pub fn zero_chain(table: &mut Table, chain_nr: usize) -> Result<()> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;
    for entry in chain.entries.iter_mut() {
        entry.counter = Counter::default();
    }
    for _ in 0..chain.entries.len() {
        chain.change_log.push(LogOp::Zero);
    }
    Ok(())
}

pub fn zero_table(table: &mut Table) -> Result<()> {
    for nr in 0..table.chain_count() {
        if table.chain(nr).is_some() {
            zero_chain(table, nr)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, Hook, Policy, Target, Verdict};

    #[test]
    fn zero_rule_resets_counter() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let mut entry = Entry::new(Target::standard(Verdict::Accept));
        entry.counter = Counter { packets: 5, bytes: 500 };
        crate::mutate::append::append_rule(&mut table, Hook::Input.index(), entry).unwrap();
        zero_rule(&mut table, Hook::Input.index(), 0).unwrap();
        assert_eq!(table.chain(Hook::Input.index()).unwrap().entries[0].counter, Counter::default());
    }
}

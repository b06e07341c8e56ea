//! Chain lifecycle (`-N`/`-X`/`-E`, spec §4.4.9), grounded on
//! `ebtc_new_chain`/`ebtc_delete_chain`/`ebtc_rename_chain` in
//! `libebtc.c`. Deleting a chain renumbers every `Jump` verdict pointing
//! past the removed slot (`decrease_chain_jumps` in the original), since
//! chain nrs are dense and removing a UDC shifts every later one down one.

use crate::model::{Chain, Target, TargetPayload, Table, Verdict};
use crate::error::{EbtError, Result};

/// Create a new, empty user-defined chain. Fails if the name is already
/// taken by any chain in the table (standard or user-defined).
pub fn new_chain(table: &mut Table, name: impl Into<String>) -> Result<usize> {
    let name = name.into();
    if table.name_to_nr(&name).is_some() {
        return Err(EbtError::Config(format!("chain '{name}' already exists")));
    }
    let nr = table.push_udc(Chain::new_udc(name));
    table.recompute_counter_offsets();
    Ok(nr)
}

/// Delete an empty, unreferenced user-defined chain, renumbering every
/// `Jump` target greater than `nr` down by one to close the gap.
pub fn delete_chain(table: &mut Table, nr: usize) -> Result<()> {
    if table.is_standard_nr(nr) {
        return Err(EbtError::Config("cannot delete a standard chain".to_string()));
    }
    let chain = table
        .chain(nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {nr}")))?;
    if !chain.entries.is_empty() {
        return Err(EbtError::Config(format!("chain '{}' is not empty", chain.name)));
    }
    if is_referenced(table, nr) {
        return Err(EbtError::Config(format!(
            "chain '{}' is referenced by a jump in another chain",
            chain.name
        )));
    }

    table.remove_udc(nr)?;
    decrease_chain_jumps(table, nr);
    table.recompute_counter_offsets();
    Ok(())
}

/// Rename a user-defined chain. Standard chain names are fixed.
pub fn rename_chain(table: &mut Table, nr: usize, new_name: impl Into<String>) -> Result<()> {
    if table.is_standard_nr(nr) {
        return Err(EbtError::Config("cannot rename a standard chain".to_string()));
    }
    let new_name = new_name.into();
    if table.name_to_nr(&new_name).is_some() {
        return Err(EbtError::Config(format!("chain '{new_name}' already exists")));
    }
    let chain = table
        .chain_mut(nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {nr}")))?;
    chain.name = new_name;
    Ok(())
}

fn is_referenced(table: &Table, nr: usize) -> bool {
    table.iter_chains().any(|(_, chain)| {
        chain.entries.iter().any(|e| {
            matches!(&e.target.payload, TargetPayload::Standard(Verdict::Jump(target)) if *target == nr)
        })
    })
}

fn decrease_chain_jumps(table: &mut Table, removed_nr: usize) {
    for nr in 0..table.chain_count() {
        let Some(chain) = table.chain_mut(nr) else { continue };
        for entry in &mut chain.entries {
            if let TargetPayload::Standard(Verdict::Jump(target)) = &mut entry.target.payload {
                if *target > removed_nr {
                    *target -= 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, Hook, Policy, NUM_HOOKS};

    #[test]
    fn new_chain_rejects_duplicate_name() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        new_chain(&mut table, "my-chain").unwrap();
        assert!(new_chain(&mut table, "my-chain").is_err());
        assert!(new_chain(&mut table, "INPUT").is_err());
    }

    #[test]
    fn delete_chain_renumbers_later_jumps() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let a = new_chain(&mut table, "a").unwrap();
        let b = new_chain(&mut table, "b").unwrap();
        assert_eq!(b, a + 1);

        crate::mutate::append::append_rule(
            &mut table,
            Hook::Input.index(),
            Entry::new(Target::standard(Verdict::Jump(b))),
        )
        .unwrap();

        delete_chain(&mut table, a).unwrap();

        let input = table.chain(Hook::Input.index()).unwrap();
        assert_eq!(input.entries[0].target.as_verdict(), Some(Verdict::Jump(NUM_HOOKS)));
    }

    #[test]
    fn delete_chain_rejects_referenced_chain() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let nr = new_chain(&mut table, "a").unwrap();
        crate::mutate::append::append_rule(
            &mut table,
            Hook::Input.index(),
            Entry::new(Target::standard(Verdict::Jump(nr))),
        )
        .unwrap();
        assert!(delete_chain(&mut table, nr).is_err());
    }

    #[test]
    fn delete_chain_rejects_nonempty_chain() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let nr = new_chain(&mut table, "a").unwrap();
        crate::mutate::append::append_rule(&mut table, nr, Entry::new(Target::standard(Verdict::Return)))
            .unwrap();
        assert!(delete_chain(&mut table, nr).is_err());
    }
}

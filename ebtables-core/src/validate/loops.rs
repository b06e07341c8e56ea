//! Loop detection and hook-mask propagation (spec §4.6.1), grounded on
//! `ebt_check_for_loops` in `libebtc.c`: a DFS from each standard chain,
//! using an explicit stack of chain nrs (`ebt_u_stack` in the original) so
//! a UDC revisited while still on the stack is a genuine cycle rather than
//! just being jumped to from two different places.
//!
//! While walking, every UDC's `hook_mask` accumulates the OR of the
//! hook bit (and [`STANDARD_CHAIN_BIT`]) of every standard chain that can
//! reach it, directly or through intermediate UDCs. A table extension
//! whose `final_check` needs to know which hooks a UDC is reachable from
//! (e.g. `nat`'s restriction on which targets are valid per hook) relies
//! on this mask being accurate once validation succeeds.

use crate::error::{EbtError, Result};
use crate::model::{TargetPayload, Verdict, Table, STANDARD_CHAIN_BIT, NUM_HOOKS};

/// Run loop detection and hook-mask propagation over every standard chain
/// in `table`. On success every UDC's `hook_mask` reflects the full set of
/// chains that can reach it. On a cycle, returns `Err(EbtError::Loop)`
/// naming the two chains involved.
pub fn check_for_loops(table: &mut Table) -> Result<()> {
    for nr in 0..NUM_HOOKS {
        if table.chain(nr).is_none() {
            continue;
        }
        let root_mask = table.chain(nr).unwrap().hook_mask;
        let mut stack = vec![nr];
        walk(table, nr, root_mask, &mut stack)?;
    }
    Ok(())
}

fn walk(table: &mut Table, from_nr: usize, mask: u32, stack: &mut Vec<usize>) -> Result<()> {
    let jumps: Vec<usize> = table
        .chain(from_nr)
        .into_iter()
        .flat_map(|c| c.entries.iter())
        .filter_map(|e| match &e.target.payload {
            TargetPayload::Standard(Verdict::Jump(nr)) => Some(*nr),
            _ => None,
        })
        .collect();

    for target_nr in jumps {
        if table.is_standard_nr(target_nr) {
            // Jumping to a standard chain is only meaningful as a dangling
            // reference check, handled separately in final_check; standard
            // chains are always DFS roots themselves and never re-entered
            // via a jump in a well-formed rule-set.
            continue;
        }
        if stack.contains(&target_nr) {
            let from_name = table.chain(from_nr).map(|c| c.name.clone()).unwrap_or_default();
            let to_name = table.chain(target_nr).map(|c| c.name.clone()).unwrap_or_default();
            return Err(EbtError::Loop { from: from_name, to: to_name });
        }

        if let Some(chain) = table.chain_mut(target_nr) {
            chain.hook_mask |= mask;
        }

        stack.push(target_nr);
        walk(table, target_nr, mask, stack)?;
        stack.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chain, Entry, Hook, Policy, Target};

    #[test]
    fn straight_line_jumps_propagate_hook_mask() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let a = table.push_udc(Chain::new_udc("a"));
        table
            .chain_mut(Hook::Input.index())
            .unwrap()
            .entries
            .push(Entry::new(Target::standard(Verdict::Jump(a))));

        check_for_loops(&mut table).unwrap();

        let chain_a = table.chain(a).unwrap();
        assert!(chain_a.hook_mask & Hook::Input.bit() != 0);
        assert!(chain_a.hook_mask & STANDARD_CHAIN_BIT != 0);
    }

    #[test]
    fn detects_direct_cycle() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let a = table.push_udc(Chain::new_udc("a"));
        let b = table.push_udc(Chain::new_udc("b"));
        table
            .chain_mut(a)
            .unwrap()
            .entries
            .push(Entry::new(Target::standard(Verdict::Jump(b))));
        table
            .chain_mut(b)
            .unwrap()
            .entries
            .push(Entry::new(Target::standard(Verdict::Jump(a))));
        table
            .chain_mut(Hook::Input.index())
            .unwrap()
            .entries
            .push(Entry::new(Target::standard(Verdict::Jump(a))));

        let err = check_for_loops(&mut table).unwrap_err();
        assert!(matches!(err, EbtError::Loop { .. }));
    }

    #[test]
    fn detects_self_loop() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let a = table.push_udc(Chain::new_udc("a"));
        table.chain_mut(a).unwrap().entries.push(Entry::new(Target::standard(Verdict::Jump(a))));
        table
            .chain_mut(Hook::Input.index())
            .unwrap()
            .entries
            .push(Entry::new(Target::standard(Verdict::Jump(a))));

        assert!(check_for_loops(&mut table).is_err());
    }

    #[test]
    fn diamond_shaped_jumps_are_not_a_loop() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        let a = table.push_udc(Chain::new_udc("a"));
        let b = table.push_udc(Chain::new_udc("b"));
        let c = table.push_udc(Chain::new_udc("c"));
        table.chain_mut(a).unwrap().entries.push(Entry::new(Target::standard(Verdict::Jump(c))));
        table.chain_mut(b).unwrap().entries.push(Entry::new(Target::standard(Verdict::Jump(c))));
        let input = table.chain_mut(Hook::Input.index()).unwrap();
        input.entries.push(Entry::new(Target::standard(Verdict::Jump(a))));
        input.entries.push(Entry::new(Target::standard(Verdict::Jump(b))));

        check_for_loops(&mut table).unwrap();
        assert!(table.chain(c).unwrap().hook_mask & Hook::Input.bit() != 0);
    }
}

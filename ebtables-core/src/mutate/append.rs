//! Rule insertion (`-A`/`-I` in the original CLI, spec §4.4.2/§4.4.3).
//! CLI flags themselves are out of scope; these operate directly on a
//! chain nr and an already-built [`Entry`].

use crate::error::{EbtError, Result};
use crate::model::{Entry, LogOp, Table};

/// Append `entry` to the end of `chain_nr`'s rule list.
pub fn append_rule(table: &mut Table, chain_nr: usize, entry: Entry) -> Result<()> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;
    chain.entries.push(entry);
    chain.change_log.push(LogOp::Add);
    table.recompute_counter_offsets();
    Ok(())
}

/// Insert `entry` at `position` (0-based, shifting later rules down), as
/// `-I chain rulenum`. `position == chain.entries.len()` behaves like
/// [`append_rule`].
pub fn insert_rule(table: &mut Table, chain_nr: usize, position: usize, entry: Entry) -> Result<()> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;
    if position > chain.entries.len() {
        return Err(EbtError::Reference(format!(
            "rule position {position} out of range (chain has {} rules)",
            chain.entries.len()
        )));
    }
    chain.entries.insert(position, entry);
    chain.change_log.insert_for_entry(position, LogOp::Add);
    table.recompute_counter_offsets();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hook, Policy, Target, Verdict};

    fn entry() -> Entry {
        Entry::new(Target::standard(Verdict::Accept))
    }

    #[test]
    fn append_adds_to_end() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        append_rule(&mut table, Hook::Input.index(), entry()).unwrap();
        append_rule(&mut table, Hook::Input.index(), entry()).unwrap();
        let chain = table.chain(Hook::Input.index()).unwrap();
        assert_eq!(chain.entries.len(), 2);
        assert_eq!(chain.change_log.len(), 2);
    }

    #[test]
    fn insert_shifts_later_rules() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        append_rule(&mut table, Hook::Input.index(), Entry::new(Target::standard(Verdict::Drop)))
            .unwrap();
        insert_rule(&mut table, Hook::Input.index(), 0, entry()).unwrap();
        let chain = table.chain(Hook::Input.index()).unwrap();
        assert_eq!(chain.entries[0].target.as_verdict(), Some(Verdict::Accept));
        assert_eq!(chain.entries[1].target.as_verdict(), Some(Verdict::Drop));
    }

    #[test]
    fn insert_rejects_out_of_range_position() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        assert!(insert_rule(&mut table, Hook::Input.index(), 5, entry()).is_err());
    }

    #[test]
    fn rejects_unknown_chain() {
        let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
        assert!(append_rule(&mut table, 99, entry()).is_err());
    }
}

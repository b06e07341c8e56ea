//! Chain lifecycle and rule-editing mutators exercised together on one
//! table, the sequence a front end would run for `-N`/`-A`/`-I`/`-D`/`-P`/
//! `-X` in a single session.

use ebtables_core::model::{Entry, Hook, Policy, Registry, Table, Target, Verdict};
use ebtables_core::mutate::{
    append_rule, delete_chain, delete_matching, delete_rule_at, insert_rule, new_chain, rename_chain,
    set_policy, zero_chain,
};
use ebtables_core::validate::validate;

#[test]
fn new_chain_rejects_a_name_already_in_use() {
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    new_chain(&mut table, "side").unwrap();
    assert!(new_chain(&mut table, "side").is_err());
    assert!(new_chain(&mut table, "INPUT").is_err());
}

#[test]
fn delete_chain_rejects_nonempty_and_referenced_chains() {
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    let side = new_chain(&mut table, "side").unwrap();

    append_rule(&mut table, side, Entry::new(Target::standard(Verdict::Return))).unwrap();
    assert!(delete_chain(&mut table, side).is_err());

    delete_rule_at(&mut table, side, 0).unwrap();
    append_rule(&mut table, Hook::Input.index(), Entry::new(Target::standard(Verdict::Jump(side))))
        .unwrap();
    assert!(delete_chain(&mut table, side).is_err());

    delete_rule_at(&mut table, Hook::Input.index(), 0).unwrap();
    delete_chain(&mut table, side).unwrap();
    assert!(table.chain(side).is_none());
}

#[test]
fn delete_chain_renumbers_jumps_past_the_removed_slot() {
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    let first = new_chain(&mut table, "first").unwrap();
    let second = new_chain(&mut table, "second").unwrap();

    append_rule(&mut table, Hook::Input.index(), Entry::new(Target::standard(Verdict::Jump(second))))
        .unwrap();

    delete_chain(&mut table, first).unwrap();

    let new_second_nr = table.name_to_nr("second").unwrap();
    assert_eq!(
        table.chain(Hook::Input.index()).unwrap().entries[0].target.as_verdict(),
        Some(Verdict::Jump(new_second_nr))
    );
}

#[test]
fn rename_chain_updates_lookups() {
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    let nr = new_chain(&mut table, "old-name").unwrap();
    rename_chain(&mut table, nr, "new-name").unwrap();
    assert_eq!(table.name_to_nr("old-name"), None);
    assert_eq!(table.name_to_nr("new-name"), Some(nr));
}

#[test]
fn delete_matching_removes_every_structural_duplicate() {
    let registry = Registry::new();
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    let template = Entry::new(Target::standard(Verdict::Drop));
    append_rule(&mut table, Hook::Input.index(), template.clone()).unwrap();
    append_rule(&mut table, Hook::Input.index(), Entry::new(Target::standard(Verdict::Accept))).unwrap();
    append_rule(&mut table, Hook::Input.index(), template.clone()).unwrap();

    let deleted = delete_matching(&mut table, Hook::Input.index(), &template, &registry, None).unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(table.chain(Hook::Input.index()).unwrap().entries.len(), 1);
}

#[test]
fn set_policy_rejects_user_defined_chains() {
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    let side = new_chain(&mut table, "side").unwrap();
    assert!(set_policy(&mut table, side, Policy::Drop).is_err());
    set_policy(&mut table, Hook::Input.index(), Policy::Drop).unwrap();
    assert_eq!(table.chain(Hook::Input.index()).unwrap().policy(), Some(Policy::Drop));
}

#[test]
fn zero_chain_resets_counters_without_disturbing_structure() {
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    append_rule(&mut table, Hook::Input.index(), Entry::new(Target::standard(Verdict::Accept))).unwrap();
    table.chain_mut(Hook::Input.index()).unwrap().entries[0].counter.packets = 42;

    zero_chain(&mut table, Hook::Input.index()).unwrap();
    assert_eq!(table.chain(Hook::Input.index()).unwrap().entries[0].counter.packets, 0);
}

#[test]
fn insert_then_validate_keeps_the_table_installable() {
    let mut table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    append_rule(&mut table, Hook::Input.index(), Entry::new(Target::standard(Verdict::Drop))).unwrap();
    insert_rule(&mut table, Hook::Input.index(), 0, Entry::new(Target::standard(Verdict::Accept))).unwrap();

    let registry = Registry::new();
    validate(&mut table, &registry).unwrap();
    assert_eq!(table.chain(Hook::Input.index()).unwrap().entries[0].target.as_verdict(), Some(Verdict::Accept));
}

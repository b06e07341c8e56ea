//! Load and validate an initial rule-set from a TOML file, building the
//! [`Table`] it describes — the declarative analogue of `--init-table`'s
//! backing data (spec.md §3), grounded on the teacher's
//! `config::loader::load_from_path`.

use std::fs;
use std::path::Path;

use crate::error::{EbtError, Result};
use crate::model::{Policy, Registry, Table, Target, Verdict};
use crate::mutate;

use super::initial_rule_set::{ChainSpec, InitialRuleSet};
use super::validator::validate_spec;

/// Read `path`, validate the declarative spec it contains, build the
/// `Table` it describes, and run it through the full [`crate::validate`]
/// pipeline before returning it ready to install.
pub fn load_initial_ruleset(path: impl AsRef<Path>, registry: &Registry) -> Result<Table> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| EbtError::Config(format!("failed to read '{}': {e}", path.display())))?;
    let spec: InitialRuleSet = toml::from_str(&text)
        .map_err(|e| EbtError::Config(format!("failed to parse '{}': {e}", path.display())))?;

    validate_spec(&spec)?;

    let mut table = build_table(&spec)?;
    crate::validate::validate(&mut table, registry)?;
    tracing::info!(table = %table.name, chains = table.chain_count(), "loaded initial rule-set");
    Ok(table)
}

fn build_table(spec: &InitialRuleSet) -> Result<Table> {
    let mut valid_hooks = 0u32;
    for chain in &spec.table.chains {
        if let Some(hook) = chain.hook()? {
            valid_hooks |= hook.bit();
        }
    }
    let mut table = Table::new(&spec.table.name, valid_hooks, Policy::Accept);

    // Pass 1: create every user-defined chain and apply standard-chain
    // policy overrides, so pass 2 can resolve every jump's chain name.
    for chain_spec in &spec.table.chains {
        match chain_spec.hook()? {
            Some(hook) => {
                if let Some(policy) = chain_spec.policy()? {
                    mutate::set_policy(&mut table, hook.index(), policy)?;
                }
            }
            None => {
                mutate::new_chain(&mut table, chain_spec.name.clone())?;
            }
        }
    }

    for chain_spec in &spec.table.chains {
        append_rules(&mut table, chain_spec)?;
    }

    Ok(table)
}

fn append_rules(table: &mut Table, chain_spec: &ChainSpec) -> Result<()> {
    let nr = match chain_spec.hook()? {
        Some(hook) => hook.index(),
        None => table.name_to_nr(&chain_spec.name).ok_or_else(|| {
            EbtError::Bug(format!("chain '{}' vanished after creation", chain_spec.name))
        })?,
    };

    for rule in &chain_spec.rules {
        let mut entry = rule.to_entry()?;
        if let Some(target_name) = rule.jump_target_name() {
            let target_nr = table.name_to_nr(target_name).ok_or_else(|| {
                EbtError::Reference(format!("rule jumps to unknown chain '{target_name}'"))
            })?;
            entry.target = Target::standard(Verdict::Jump(target_nr));
        }
        mutate::append_rule(table, nr, entry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hook;

    fn registry() -> Registry {
        Registry::new()
    }

    #[test]
    fn builds_table_with_policy_and_udc_jump() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        write!(
            file,
            r#"
            [table]
            name = "filter"

            [[table.chains]]
            name = "INPUT"
            hook = "INPUT"
            policy = "drop"

            [[table.chains.rules]]
            target = "jump:allow-local"

            [[table.chains]]
            name = "allow-local"

            [[table.chains.rules]]
            in_interface = "lo"
            target = "accept"
            "#,
        )
        .unwrap();

        let registry = registry();
        let table = load_initial_ruleset(file.path(), &registry).unwrap();

        assert_eq!(table.chain(Hook::Input.index()).unwrap().policy(), Some(Policy::Drop));
        let udc_nr = table.name_to_nr("allow-local").unwrap();
        assert_eq!(
            table.chain(Hook::Input.index()).unwrap().entries[0].target.as_verdict(),
            Some(Verdict::Jump(udc_nr))
        );
    }

    #[test]
    fn rejects_missing_file() {
        let registry = registry();
        assert!(load_initial_ruleset("/nonexistent/path.toml", &registry).is_err());
    }
}

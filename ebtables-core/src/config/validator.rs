//! Initial rule-set spec validation, grounded on the teacher's
//! `config::loader::validate_config`: semantic checks on the raw TOML tree
//! before any chain is built, so a malformed rule-set fails with a
//! descriptive [`EbtError::Config`]/[`EbtError::Reference`] instead of
//! surfacing as a confusing panic deep in chain construction.

use std::collections::HashSet;

use crate::error::{EbtError, Result};

use super::initial_rule_set::InitialRuleSet;

pub fn validate_spec(spec: &InitialRuleSet) -> Result<()> {
    if spec.table.name.is_empty() {
        return Err(EbtError::Config("table name must not be empty".to_string()));
    }

    let mut seen_names: HashSet<&str> = HashSet::new();
    let mut declared: HashSet<String> = HashSet::new();
    for chain in &spec.table.chains {
        if !seen_names.insert(chain.name.as_str()) {
            return Err(EbtError::Config(format!("duplicate chain name '{}'", chain.name)));
        }
        match chain.hook()? {
            Some(hook) => {
                declared.insert(hook.name().to_string());
            }
            None => {
                declared.insert(chain.name.clone());
            }
        }
        chain.policy()?;
    }

    for chain in &spec.table.chains {
        for rule in &chain.rules {
            rule.to_entry()?;
            if let Some(target) = rule.jump_target_name() {
                if !declared.contains(target) {
                    return Err(EbtError::Reference(format!(
                        "rule in chain '{}' jumps to undeclared chain '{target}'",
                        chain.name
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> InitialRuleSet {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn accepts_well_formed_spec() {
        let spec = parse(
            r#"
            [table]
            name = "filter"

            [[table.chains]]
            name = "INPUT"
            hook = "INPUT"
            policy = "accept"

            [[table.chains]]
            name = "my-chain"
            "#,
        );
        assert!(validate_spec(&spec).is_ok());
    }

    #[test]
    fn rejects_duplicate_chain_names() {
        let spec = parse(
            r#"
            [table]
            name = "filter"

            [[table.chains]]
            name = "dup"

            [[table.chains]]
            name = "dup"
            "#,
        );
        assert!(validate_spec(&spec).is_err());
    }

    #[test]
    fn rejects_jump_to_undeclared_chain() {
        let spec = parse(
            r#"
            [table]
            name = "filter"

            [[table.chains]]
            name = "INPUT"
            hook = "INPUT"

            [[table.chains.rules]]
            target = "jump:ghost"
            "#,
        );
        assert!(validate_spec(&spec).is_err());
    }
}

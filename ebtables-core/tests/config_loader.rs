//! Loading a declarative initial rule-set end-to-end: parse, validate,
//! build a [`Table`], and run it through the full [`validate`] pipeline.

use std::io::Write;

use ebtables_core::model::{Hook, Policy, Registry, Verdict};
use ebtables_core::{load_initial_ruleset, Table};

fn write_toml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_a_table_with_policy_override_and_a_udc_jump() {
    let file = write_toml(
        r#"
[table]
name = "filter"

[[table.chains]]
name = "INPUT"
hook = "INPUT"
policy = "drop"

[[table.chains.rules]]
protocol = "0x0800"
target = "jump:allow-v4"

[[table.chains]]
name = "allow-v4"

[[table.chains.rules]]
target = "accept"
"#,
    );

    let registry = Registry::new();
    let table = load_initial_ruleset(file.path(), &registry).unwrap();

    assert_eq!(table.name, "filter");
    let input = table.chain(Hook::Input.index()).unwrap();
    assert_eq!(input.policy(), Some(Policy::Drop));
    assert_eq!(input.entries.len(), 1);

    let udc_nr = table.name_to_nr("allow-v4").unwrap();
    assert_eq!(input.entries[0].target.as_verdict(), Some(Verdict::Jump(udc_nr)));

    let udc = table.chain(udc_nr).unwrap();
    assert_eq!(udc.entries[0].target.as_verdict(), Some(Verdict::Accept));
}

#[test]
fn rejects_a_jump_to_an_undeclared_chain() {
    let file = write_toml(
        r#"
[table]
name = "filter"

[[table.chains]]
name = "INPUT"
hook = "INPUT"

[[table.chains.rules]]
target = "jump:nowhere"
"#,
    );

    let registry = Registry::new();
    assert!(load_initial_ruleset(file.path(), &registry).is_err());
}

#[test]
fn rejects_a_missing_file() {
    let registry = Registry::new();
    let result: Result<Table, _> = load_initial_ruleset("/no/such/path.toml", &registry);
    assert!(result.is_err());
}

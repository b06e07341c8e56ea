//! The declarative initial rule-set config surface (spec.md §3, ambient
//! stack §B): a table's starting chains/policies/rules, loaded from TOML
//! the way the teacher's `config` loads its `Config` tree.

pub mod initial_rule_set;
pub mod loader;
pub mod validator;

pub use initial_rule_set::{ChainSpec, InitialRuleSet, RuleSpec, TableSpec};
pub use loader::load_initial_ruleset;
pub use validator::validate_spec;

//! Rule-set mutators (spec §4.4): the graph-level edits a front end
//! applies before validating and installing a table. Each mutator takes a
//! `&mut Table` and updates the touched chain's `change_log` so
//! [`crate::reconcile`] can later compute correct counters.

pub mod append;
pub mod chain_ops;
pub mod delete;
pub mod flush;
pub mod policy;
pub mod zero;

pub use append::{append_rule, insert_rule};
pub use chain_ops::{delete_chain, new_chain, rename_chain};
pub use delete::{delete_matching, delete_rule_at, entries_equal};
pub use flush::{flush_chain, flush_table};
pub use policy::set_policy;
pub use zero::{zero_chain, zero_rule, zero_table};

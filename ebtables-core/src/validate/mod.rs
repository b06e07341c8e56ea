//! Rule-set validation (spec §4.6): loop detection with hook-mask
//! propagation, then a final structural/extension check. Both must pass
//! before a table is eligible for installation.

pub mod final_check;
pub mod loops;

pub use final_check::final_check;
pub use loops::check_for_loops;

use crate::error::Result;
use crate::model::{Registry, Table};

/// Run the full validation pipeline: loop detection first (it mutates
/// UDC hook masks that `final_check` doesn't currently depend on, but
/// order mirrors `ebtc_check_final`'s own two-step structure), then the
/// final check.
pub fn validate(table: &mut Table, registry: &Registry) -> Result<()> {
    check_for_loops(table)?;
    final_check(table, registry)
}

//! Policy change (`-P`, spec §4.4.8), grounded on `ebtc_change_policy` in
//! `libebtc.c`. Only standard chains carry a policy; UDCs always fall
//! through to an implicit `RETURN`.

use crate::error::{EbtError, Result};
use crate::model::{ChainKind, Policy, Table};

pub fn set_policy(table: &mut Table, chain_nr: usize, policy: Policy) -> Result<()> {
    let chain = table
        .chain_mut(chain_nr)
        .ok_or_else(|| EbtError::Reference(format!("no such chain nr {chain_nr}")))?;
    match &mut chain.kind {
        ChainKind::Standard { policy: p } => {
            *p = policy;
            Ok(())
        }
        ChainKind::UserDefined => Err(EbtError::Config(format!(
            "chain '{}' is user-defined and has no policy",
            chain.name
        ))),
    }
}

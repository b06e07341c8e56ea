use crate::error::{EbtError, Result};

use super::{Chain, Hook, Policy, NUM_HOOKS};

/// A rule-set for one table (`filter`, `nat`, `broute`, ...): the standard
/// hook chains this table's `valid_hooks` mask permits, plus any
/// user-defined chains created within it.
///
/// Chain identity is a dense "chain nr": `0..NUM_HOOKS` addresses
/// `hook_chains[nr]` (only populated where `valid_hooks` has that bit set),
/// `NUM_HOOKS..` addresses `udcs[nr - NUM_HOOKS]` in creation order. This
/// mirrors `ebt_nr_to_chain` in `libebtc.c`.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub valid_hooks: u32,
    hook_chains: [Option<Chain>; NUM_HOOKS],
    udcs: Vec<Chain>,
}

impl Table {
    pub fn new(name: impl Into<String>, valid_hooks: u32, default_policy: Policy) -> Self {
        let hook_chains = Hook::ALL.map(|hook| {
            if valid_hooks & hook.bit() != 0 {
                Some(Chain::new_standard(hook.name(), hook.bit(), default_policy))
            } else {
                None
            }
        });
        Table { name: name.into(), valid_hooks, hook_chains, udcs: Vec::new() }
    }

    /// Rebuild a table directly from already-materialized chains, as the
    /// codec's parser does: it determines hook slots and UDC order from the
    /// blob itself rather than from a caller-supplied `valid_hooks`.
    pub(crate) fn from_parts(
        name: impl Into<String>,
        valid_hooks: u32,
        hook_chains: [Option<Chain>; NUM_HOOKS],
        udcs: Vec<Chain>,
    ) -> Self {
        Table { name: name.into(), valid_hooks, hook_chains, udcs }
    }

    pub fn chain(&self, nr: usize) -> Option<&Chain> {
        if nr < NUM_HOOKS {
            self.hook_chains[nr].as_ref()
        } else {
            self.udcs.get(nr - NUM_HOOKS)
        }
    }

    pub fn chain_mut(&mut self, nr: usize) -> Option<&mut Chain> {
        if nr < NUM_HOOKS {
            self.hook_chains[nr].as_mut()
        } else {
            self.udcs.get_mut(nr - NUM_HOOKS)
        }
    }

    pub fn chain_count(&self) -> usize {
        NUM_HOOKS + self.udcs.len()
    }

    pub fn name_to_nr(&self, name: &str) -> Option<usize> {
        (0..self.chain_count()).find(|&nr| self.chain(nr).map(|c| c.name.as_str()) == Some(name))
    }

    pub fn push_udc(&mut self, chain: Chain) -> usize {
        self.udcs.push(chain);
        NUM_HOOKS + self.udcs.len() - 1
    }

    /// Remove a UDC by nr, shifting subsequent UDCs down one slot. Callers
    /// must have already renumbered every `Jump` target that referenced a
    /// nr at or above the removed slot (spec §4.4.5) before calling this.
    pub fn remove_udc(&mut self, nr: usize) -> Result<Chain> {
        if nr < NUM_HOOKS {
            return Err(EbtError::Bug(format!("chain nr {nr} is a standard chain, not a UDC")));
        }
        let idx = nr - NUM_HOOKS;
        if idx >= self.udcs.len() {
            return Err(EbtError::Bug(format!("chain nr {nr} out of range")));
        }
        Ok(self.udcs.remove(idx))
    }

    /// Iterate every chain in blob order: populated hook chains ascending
    /// by hook index, then UDCs in creation order.
    pub fn iter_chains(&self) -> impl Iterator<Item = (usize, &Chain)> {
        (0..self.chain_count()).filter_map(move |nr| self.chain(nr).map(|c| (nr, c)))
    }

    /// Recompute every chain's `counter_offset` as the prefix sum of
    /// `nentries` over every chain preceding it in blob traversal order.
    /// Called by [`crate::mutate`] after any edit that changes a chain's
    /// entry count, so a table-wide counter vector can still be sliced per
    /// chain for reconciliation.
    pub fn recompute_counter_offsets(&mut self) {
        let mut running = 0u32;
        for nr in 0..self.chain_count() {
            if let Some(chain) = self.chain_mut(nr) {
                chain.counter_offset = running;
                running += chain.entries.len() as u32;
            }
        }
    }

    pub fn udcs(&self) -> &[Chain] {
        &self.udcs
    }

    pub fn is_standard_nr(&self, nr: usize) -> bool {
        nr < NUM_HOOKS
    }
}

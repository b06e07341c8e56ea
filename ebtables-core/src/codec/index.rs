//! A lightweight chain-offset index built over a [`Blob`] without fully
//! materializing the graph — what [`crate::classifier`] needs to find
//! where a hook's chain starts, and whether a jump target offset lands on
//! a real chain header, at per-packet speed.

use crate::error::{EbtError, Result};
use crate::model::{NUM_HOOKS, STANDARD_CHAIN_BIT};

use super::blob::Blob;
use super::parse::scan_chain_headers;

#[derive(Debug, Clone)]
pub struct ChainIndex {
    hook_offsets: [Option<u32>; NUM_HOOKS],
    chain_offsets: Vec<u32>,
    /// Every entry's starting byte offset, in blob traversal order (chains
    /// in scan order, entries within a chain in list order). Traversal
    /// order is strictly increasing in byte offset, so this doubles as a
    /// sorted offset -> ordinal lookup: the position an offset is found at
    /// via binary search *is* its global entry ordinal, matching the
    /// indexing [`CounterBank`](crate::classifier::CounterBank) and
    /// `reconcile` use.
    entry_offsets: Vec<u32>,
}

impl ChainIndex {
    pub fn build(blob: &Blob) -> Result<Self> {
        let descriptors = scan_chain_headers(blob)?;
        let mut hook_offsets: [Option<u32>; NUM_HOOKS] = [None; NUM_HOOKS];
        let mut chain_offsets = Vec::with_capacity(descriptors.len());
        let mut entry_offsets = Vec::new();

        for desc in &descriptors {
            chain_offsets.push(desc.offset as u32);
            entry_offsets.extend(desc.entry_offsets.iter().map(|&off| off as u32));
            if desc.policy != 0 {
                let hook_bit = desc.hook_mask & !STANDARD_CHAIN_BIT;
                if hook_bit.count_ones() != 1 {
                    return Err(EbtError::Corrupt(format!(
                        "standard chain '{}' has malformed hook mask {:#x}",
                        desc.name, desc.hook_mask
                    )));
                }
                let hook_index = hook_bit.trailing_zeros() as usize;
                hook_offsets[hook_index] = Some(desc.offset as u32);
            }
        }

        Ok(ChainIndex { hook_offsets, chain_offsets, entry_offsets })
    }

    pub fn hook_chain_offset(&self, hook_index: usize) -> Option<u32> {
        self.hook_offsets.get(hook_index).copied().flatten()
    }

    /// `true` if `offset` is the start of some chain header in this blob —
    /// used to validate a jump target before following it. Offsets are
    /// scanned and pushed in strictly increasing order, so a binary search
    /// is valid.
    pub fn is_chain_offset(&self, offset: u32) -> bool {
        self.chain_offsets.binary_search(&offset).is_ok()
    }

    /// The global entry ordinal (position among every entry in the
    /// installed blob, in traversal order) for the entry starting at
    /// `offset` — the index [`CounterBank`](crate::classifier::CounterBank)
    /// actually uses, which is unrelated to the entry's raw byte offset.
    pub fn entry_ordinal(&self, offset: u32) -> Option<usize> {
        self.entry_offsets.binary_search(&offset).ok()
    }
}

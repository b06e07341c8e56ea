use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::model::Counter;

/// Per-entry packet/byte counters, indexed in the same order as the
/// installed blob's entries.
///
/// Increments take the `RwLock`'s read side (many readers, no blocking
/// against each other) and bump the atomics with `Relaxed` ordering —
/// exact interleaving across entries doesn't matter, only that each
/// counter's own increments are never lost. Installing a new blob (which
/// may add or remove entries) takes the write side just long enough to
/// swap the backing `Vec`; in-flight reads finish against the old `Vec`
/// they already borrowed.
#[derive(Default)]
pub struct CounterBank {
    slots: RwLock<Vec<(AtomicU64, AtomicU64)>>,
}

impl CounterBank {
    pub fn new(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || (AtomicU64::new(0), AtomicU64::new(0)));
        CounterBank { slots: RwLock::new(slots) }
    }

    pub fn hit(&self, entry_index: usize, frame_len: usize) {
        let guard = self.slots.read().expect("counter bank lock poisoned");
        if let Some((packets, bytes)) = guard.get(entry_index) {
            packets.fetch_add(1, Ordering::Relaxed);
            bytes.fetch_add(frame_len as u64, Ordering::Relaxed);
        }
    }

    /// Snapshot every counter into a plain `Vec<Counter>`, in entry order.
    pub fn snapshot(&self) -> Vec<Counter> {
        let guard = self.slots.read().expect("counter bank lock poisoned");
        guard
            .iter()
            .map(|(packets, bytes)| Counter {
                packets: packets.load(Ordering::Relaxed),
                bytes: bytes.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Replace the backing slots wholesale, e.g. after a reconciled
    /// counter array is computed for a freshly installed blob.
    pub fn replace(&self, counters: Vec<Counter>) {
        let mut guard = self.slots.write().expect("counter bank lock poisoned");
        *guard = counters
            .into_iter()
            .map(|c| (AtomicU64::new(c.packets), AtomicU64::new(c.bytes)))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.slots.read().expect("counter bank lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_accumulates_packets_and_bytes() {
        let bank = CounterBank::new(2);
        bank.hit(0, 64);
        bank.hit(0, 128);
        bank.hit(1, 40);
        let snap = bank.snapshot();
        assert_eq!(snap[0], Counter { packets: 2, bytes: 192 });
        assert_eq!(snap[1], Counter { packets: 1, bytes: 40 });
    }

    #[test]
    fn replace_swaps_whole_bank() {
        let bank = CounterBank::new(1);
        bank.hit(0, 10);
        bank.replace(vec![Counter { packets: 9, bytes: 9 }, Counter::default()]);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.snapshot()[0], Counter { packets: 9, bytes: 9 });
    }
}

use std::sync::RwLock;

use crate::codec::Blob;
use crate::error::Result;
use crate::model::Counter;

use super::Transport;

/// An in-process transport backed by `RwLock`-guarded state, standing in
/// for the kernel-facing syscall/socket transport in tests and the demo
/// binary (spec §4.7(a), host-OS-specific and out of scope here).
pub struct MemoryTransport {
    initial_blob: Blob,
    initial_counters: Vec<Counter>,
    current_blob: RwLock<Blob>,
    current_counters: RwLock<Vec<Counter>>,
}

impl MemoryTransport {
    pub fn new(initial_blob: Blob, initial_counters: Vec<Counter>) -> Self {
        MemoryTransport {
            current_blob: RwLock::new(initial_blob.clone()),
            current_counters: RwLock::new(initial_counters.clone()),
            initial_blob,
            initial_counters,
        }
    }
}

impl Transport for MemoryTransport {
    fn get_current_blob(&self) -> Result<(Blob, Vec<Counter>)> {
        Ok((
            self.current_blob.read().expect("memory transport lock poisoned").clone(),
            self.current_counters.read().expect("memory transport lock poisoned").clone(),
        ))
    }

    fn get_initial_blob(&self) -> Result<(Blob, Vec<Counter>)> {
        Ok((self.initial_blob.clone(), self.initial_counters.clone()))
    }

    fn put_blob(&self, blob: &Blob) -> Result<()> {
        *self.current_blob.write().expect("memory transport lock poisoned") = blob.clone();
        Ok(())
    }

    fn put_counters(&self, counters: &[Counter]) -> Result<()> {
        *self.current_counters.write().expect("memory transport lock poisoned") = counters.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_blob_is_visible_to_get_current_but_not_get_initial() {
        let transport = MemoryTransport::new(Blob::new(vec![1, 2, 3]), vec![Counter::default()]);
        transport.put_blob(&Blob::new(vec![9, 9])).unwrap();

        let (current, _) = transport.get_current_blob().unwrap();
        assert_eq!(current.as_slice(), &[9, 9]);

        let (initial, _) = transport.get_initial_blob().unwrap();
        assert_eq!(initial.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn put_counters_replaces_current_counters_only() {
        let transport = MemoryTransport::new(Blob::default(), vec![Counter { packets: 1, bytes: 1 }]);
        transport.put_counters(&[Counter { packets: 5, bytes: 500 }]).unwrap();

        let (_, current) = transport.get_current_blob().unwrap();
        assert_eq!(current, vec![Counter { packets: 5, bytes: 500 }]);

        let (_, initial) = transport.get_initial_blob().unwrap();
        assert_eq!(initial, vec![Counter { packets: 1, bytes: 1 }]);
    }
}

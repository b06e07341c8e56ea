//! Transport abstraction (spec §4.7): the four operations a rule-set
//! install/fetch cycle needs, independent of whether the far end is a
//! kernel socket or a file. `ebtables-core` ships the latter
//! ([`atomic_file`]) plus an in-process stand-in ([`memory`]) used by
//! tests and the demo binary — the kernel-facing syscall/socket transport
//! is host-OS-specific and out of scope (spec.md §1).

pub mod atomic_file;
pub mod memory;

pub use atomic_file::AtomicFileTransport;
pub use memory::MemoryTransport;

use crate::codec::Blob;
use crate::error::Result;
use crate::model::Counter;

/// A rule-set transport: fetch the currently installed blob (with its
/// counters), fetch the boot-time initial blob, and install a new blob or
/// counter array.
///
/// Per spec §5's ordering rule, installing a blob and its counters are two
/// separate calls — [`Transport::put_blob`] then [`Transport::put_counters`]
/// — and a reader may observe the intermediate state (new blob, stale or
/// zeroed counters).
pub trait Transport: Send + Sync {
    /// The blob and counters currently installed.
    fn get_current_blob(&self) -> Result<(Blob, Vec<Counter>)>;

    /// The blob and counters the classifier booted with.
    fn get_initial_blob(&self) -> Result<(Blob, Vec<Counter>)>;

    fn put_blob(&self, blob: &Blob) -> Result<()>;

    fn put_counters(&self, counters: &[Counter]) -> Result<()>;
}

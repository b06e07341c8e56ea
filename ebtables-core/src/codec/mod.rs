//! Translation between the in-memory chain graph and the flat relocatable
//! blob (spec §4.2): [`serialize`] (graph → blob) and [`parse`] (blob →
//! graph), plus the shared [`Blob`] byte buffer and wire-layout constants.

pub mod blob;
pub mod index;
pub mod parse;
pub mod serialize;
pub mod wire;

pub use blob::{Blob, BlobReader, BlobWriter};
pub use index::ChainIndex;
pub use parse::parse;
pub use serialize::serialize;

//! The atomic file transport (spec §4.7), grounded on
//! `store_table_in_file`/`retrieve_from_file` in `communication.c`: a
//! single file holding a fixed metadata header, then the blob, then the
//! counter array, rewritten atomically (write to a temp file in the same
//! directory, `fsync`, `rename`) and created with mode 0600.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::codec::{Blob, BlobReader, BlobWriter};
use crate::error::{EbtError, Result};
use crate::model::{Counter, NUM_HOOKS};

use super::Transport;

/// If set, the default atomic file path (spec §6), consulted by
/// [`AtomicFileTransport::from_env`] before any read or write.
pub const ATOMIC_FILE_ENV_VAR: &str = "EBTABLES_ATOMIC_FILE";

const FILE_MODE: u32 = 0o600;
const NO_HOOK: u32 = u32::MAX;

/// A rule-set persisted to a single file. The "initial" blob is whatever
/// was on disk when this transport was opened; "current" is mutated
/// in-process by `put_blob`/`put_counters` and only reaches disk on the
/// next [`AtomicFileTransport::save`].
pub struct AtomicFileTransport {
    path: PathBuf,
    initial: (Blob, Vec<Counter>),
    current: std::sync::RwLock<(Blob, Vec<Counter>)>,
}

impl AtomicFileTransport {
    /// Open `path`, reading whatever rule-set (if any) is already there as
    /// the initial snapshot. A missing file starts from an empty blob with
    /// no counters, mirroring a freshly booted table with no saved state.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let initial = match fs::read(&path) {
            Ok(bytes) => decode_file(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Blob::default(), Vec::new()),
            Err(e) => {
                return Err(EbtError::Transport(format!(
                    "failed to read atomic file '{}': {e}",
                    path.display()
                )))
            }
        };
        Ok(AtomicFileTransport {
            path,
            current: std::sync::RwLock::new(initial.clone()),
            initial,
        })
    }

    /// Resolve the path from [`ATOMIC_FILE_ENV_VAR`] and open it.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(ATOMIC_FILE_ENV_VAR)
            .map_err(|_| EbtError::Config(format!("{ATOMIC_FILE_ENV_VAR} is not set")))?;
        Self::open(path)
    }

    /// Rewrite the file with the current in-process blob and counters:
    /// write to a sibling temp file, set mode 0600, then rename over the
    /// target so a concurrent reader never observes a partial write.
    pub fn save(&self) -> Result<()> {
        let (blob, counters) = {
            let guard = self.current.read().expect("atomic file transport lock poisoned");
            guard.clone()
        };
        let bytes = encode_file(&blob, &counters)?;

        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = File::create(&tmp_path)
            .map_err(|e| EbtError::Transport(format!("failed to create '{}': {e}", tmp_path.display())))?;
        tmp.set_permissions(fs::Permissions::from_mode(FILE_MODE))
            .map_err(|e| EbtError::Transport(format!("failed to chmod '{}': {e}", tmp_path.display())))?;
        tmp.write_all(&bytes)
            .map_err(|e| EbtError::Transport(format!("failed to write '{}': {e}", tmp_path.display())))?;
        tmp.sync_all()
            .map_err(|e| EbtError::Transport(format!("failed to sync '{}': {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            EbtError::Transport(format!(
                "failed to rename '{}' to '{}': {e}",
                tmp_path.display(),
                self.path.display()
            ))
        })?;
        Ok(())
    }
}

impl Transport for AtomicFileTransport {
    fn get_current_blob(&self) -> Result<(Blob, Vec<Counter>)> {
        Ok(self.current.read().expect("atomic file transport lock poisoned").clone())
    }

    fn get_initial_blob(&self) -> Result<(Blob, Vec<Counter>)> {
        Ok(self.initial.clone())
    }

    fn put_blob(&self, blob: &Blob) -> Result<()> {
        self.current.write().expect("atomic file transport lock poisoned").0 = blob.clone();
        self.save()
    }

    fn put_counters(&self, counters: &[Counter]) -> Result<()> {
        self.current.write().expect("atomic file transport lock poisoned").1 = counters.to_vec();
        self.save()
    }
}

/// Encode the fixed header (entries_size, per-hook chain offsets, counter
/// count) followed by the blob bytes and the counter array.
fn encode_file(blob: &Blob, counters: &[Counter]) -> Result<Vec<u8>> {
    let index = crate::codec::ChainIndex::build(blob)?;
    let mut w = BlobWriter::new();
    w.write_u32(blob.len() as u32);
    for hook_index in 0..NUM_HOOKS {
        w.write_u32(index.hook_chain_offset(hook_index).unwrap_or(NO_HOOK));
    }
    w.write_u32(counters.len() as u32);
    w.write_bytes(blob.as_slice());
    for c in counters {
        w.write_u64(c.packets);
        w.write_u64(c.bytes);
    }
    Ok(w.finish().as_slice().to_vec())
}

fn decode_file(bytes: &[u8]) -> Result<(Blob, Vec<Counter>)> {
    let file_blob = Blob::new(bytes.to_vec());
    let mut r: BlobReader<'_> = file_blob.cursor_at(0)?;
    let entries_size = r.read_u32()? as usize;
    for _ in 0..NUM_HOOKS {
        r.read_u32()?;
    }
    let counter_count = r.read_u32()? as usize;

    let entries_start = r.position();
    let entries_end = entries_start + entries_size;
    let blob = Blob::new(
        bytes
            .get(entries_start..entries_end)
            .ok_or_else(|| EbtError::Corrupt("atomic file truncated before end of blob".to_string()))?
            .to_vec(),
    );

    let mut cr = file_blob.cursor_at(entries_end)?;
    let mut counters = Vec::with_capacity(counter_count);
    for _ in 0..counter_count {
        let packets = cr.read_u64()?;
        let bytes = cr.read_u64()?;
        counters.push(Counter { packets, bytes });
    }
    Ok((blob, counters))
}

#[allow(dead_code)]
fn file_mode_is_owner_only(path: &Path) -> Result<bool> {
    let meta = fs::metadata(path)
        .map_err(|e| EbtError::Transport(format!("failed to stat '{}': {e}", path.display())))?;
    Ok(meta.permissions().mode() & 0o777 == FILE_MODE)
}

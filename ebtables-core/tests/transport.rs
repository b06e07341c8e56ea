//! Transport round-trips: install a serialized table through
//! [`MemoryTransport`] and [`AtomicFileTransport`], checking that
//! `put_blob`/`put_counters` stay two independent calls and that
//! `get_initial_blob` never reflects a later `put_*`.

use ebtables_core::codec::serialize;
use ebtables_core::model::{Counter, Hook, Policy, Table};
use ebtables_core::{AtomicFileTransport, MemoryTransport, Transport};

fn sample_blob() -> ebtables_core::codec::Blob {
    let table = Table::new("filter", Hook::Input.bit(), Policy::Accept);
    serialize(&table).unwrap()
}

#[test]
fn memory_transport_separates_initial_from_current() {
    let blob = sample_blob();
    let transport = MemoryTransport::new(blob.clone(), vec![Counter::default()]);

    let new_blob = ebtables_core::codec::Blob::new(vec![0, 0, 0, 0]);
    transport.put_blob(&new_blob).unwrap();
    transport.put_counters(&[Counter { packets: 7, bytes: 700 }]).unwrap();

    let (initial_blob, initial_counters) = transport.get_initial_blob().unwrap();
    assert_eq!(initial_blob, blob);
    assert_eq!(initial_counters, vec![Counter::default()]);

    let (current_blob, current_counters) = transport.get_current_blob().unwrap();
    assert_eq!(current_blob, new_blob);
    assert_eq!(current_counters, vec![Counter { packets: 7, bytes: 700 }]);
}

#[test]
fn atomic_file_transport_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ebtables.state");

    let blob = sample_blob();
    {
        let transport = AtomicFileTransport::open(&path).unwrap();
        transport.put_blob(&blob).unwrap();
        transport.put_counters(&[Counter { packets: 1, bytes: 64 }]).unwrap();
    }

    let reopened = AtomicFileTransport::open(&path).unwrap();
    let (initial_blob, initial_counters) = reopened.get_initial_blob().unwrap();
    assert_eq!(initial_blob, blob);
    assert_eq!(initial_counters, vec![Counter { packets: 1, bytes: 64 }]);
}

#[test]
fn atomic_file_transport_resolves_path_from_env_var() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("via-env");
    std::env::set_var("EBTABLES_ATOMIC_FILE", &path);

    let transport = AtomicFileTransport::from_env().unwrap();
    transport.put_blob(&sample_blob()).unwrap();
    assert!(path.exists());

    std::env::remove_var("EBTABLES_ATOMIC_FILE");
}

//! Store / append / load through the public API, against in-memory backends.

mod common;

use common::{Harness, BLOCK};
use proptest::prelude::*;
use sealshare_client::SealshareError;
use sealshare_crypto::ids::file_entry_id;
use sealshare_storage::Datastore;

// ── Store and load ──────────────────────────────────────────────────────────

/// Boundary sizes around the block size all round-trip exactly.
#[test]
fn store_load_boundary_sizes() {
    let h = Harness::new();
    let alice = h.user("alice");

    for len in [0, 1, BLOCK - 1, BLOCK, BLOCK + 1, 2 * BLOCK, 7 * BLOCK + 3] {
        let content: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
        let name = format!("file-{len}");
        alice.store_file(&name, &content).unwrap();
        assert_eq!(alice.load_file(&name).unwrap(), content, "len {len}");
    }
}

/// 15 bytes at B=10: one entry record plus a 10-byte and a 5-byte chunk.
#[test]
fn fifteen_bytes_make_two_chunks() {
    let h = Harness::new();
    let alice = h.user("alice");

    let created = h.new_ids(|| alice.store_file("f", b"AAAAAAAAAABBBBB").unwrap());
    assert_eq!(created.len(), 3);
    assert_eq!(alice.load_file("f").unwrap(), b"AAAAAAAAAABBBBB");
}

/// An empty file is a single chunk and loads as empty.
#[test]
fn empty_file_is_one_chunk() {
    let h = Harness::new();
    let alice = h.user("alice");

    let created = h.new_ids(|| alice.store_file("empty", b"").unwrap());
    assert_eq!(created.len(), 2);
    assert!(alice.load_file("empty").unwrap().is_empty());
}

/// Overwrites replace content in place without touching the file entry, and
/// reclaim chunks the new content no longer needs.
#[test]
fn overwrite_keeps_entry_and_reclaims_chunks() {
    let h = Harness::new();
    let alice = h.user("alice");

    alice.store_file("f", &[1u8; 5 * BLOCK]).unwrap();
    let entry_id = file_entry_id("alice", "f");
    let entry_before = h.datastore.get(entry_id).unwrap();
    let records_before = h.datastore.len();

    alice.store_file("f", b"short").unwrap();
    assert_eq!(alice.load_file("f").unwrap(), b"short");
    assert_eq!(h.datastore.get(entry_id).unwrap(), entry_before);
    assert_eq!(h.datastore.len(), records_before - 4);

    alice.store_file("f", &[2u8; 3 * BLOCK + 1]).unwrap();
    assert_eq!(alice.load_file("f").unwrap(), vec![2u8; 3 * BLOCK + 1]);
    assert_eq!(h.datastore.get(entry_id).unwrap(), entry_before);
}

/// Filenames are per-user namespaces.
#[test]
fn same_filename_different_users() {
    let h = Harness::new();
    let alice = h.user("alice");
    let bob = h.user("bob");

    alice.store_file("notes", b"alice's").unwrap();
    bob.store_file("notes", b"bob's").unwrap();
    assert_eq!(alice.load_file("notes").unwrap(), b"alice's");
    assert_eq!(bob.load_file("notes").unwrap(), b"bob's");
}

/// Loading a name that was never stored is NotFound.
#[test]
fn load_missing_file() {
    let h = Harness::new();
    let alice = h.user("alice");
    assert!(matches!(
        alice.load_file("nope"),
        Err(SealshareError::NotFound(_))
    ));
}

// ── Append ──────────────────────────────────────────────────────────────────

/// Appends that fill the tail exactly, overflow it, and start from empty.
#[test]
fn append_across_block_boundaries() {
    let h = Harness::new();
    let alice = h.user("alice");

    alice.store_file("f", b"123").unwrap();
    alice.append_to_file("f", b"4567890").unwrap();
    assert_eq!(alice.load_file("f").unwrap(), b"1234567890");

    alice.append_to_file("f", b"abcdefghijklmnopqrstuvwxyz").unwrap();
    assert_eq!(
        alice.load_file("f").unwrap(),
        b"1234567890abcdefghijklmnopqrstuvwxyz"
    );

    alice.append_to_file("f", b"!").unwrap();
    assert_eq!(
        alice.load_file("f").unwrap(),
        b"1234567890abcdefghijklmnopqrstuvwxyz!"
    );

    alice.store_file("e", b"").unwrap();
    alice.append_to_file("e", &[9u8; 2 * BLOCK]).unwrap();
    assert_eq!(alice.load_file("e").unwrap(), vec![9u8; 2 * BLOCK]);
}

/// Append writes only the new chunks plus at most two rewrites.
#[test]
fn append_cost_is_proportional_to_appended_bytes() {
    let h = Harness::new();
    let alice = h.user("alice");
    alice.store_file("big", &[0u8; 50 * BLOCK + 5]).unwrap();

    let created = h.new_ids(|| alice.append_to_file("big", &[1u8; 2 * BLOCK]).unwrap());
    assert_eq!(created.len(), 2);

    let created = h.new_ids(|| alice.append_to_file("big", b"xy").unwrap());
    assert!(created.is_empty(), "filling the tail creates nothing");

    let mut expected = vec![0u8; 50 * BLOCK + 5];
    expected.extend_from_slice(&[1u8; 2 * BLOCK]);
    expected.extend_from_slice(b"xy");
    assert_eq!(alice.load_file("big").unwrap(), expected);
}

/// Appending nothing is a no-op.
#[test]
fn append_empty_is_noop() {
    let h = Harness::new();
    let alice = h.user("alice");
    alice.store_file("f", b"abc").unwrap();

    let before = h.datastore.snapshot().unwrap();
    alice.append_to_file("f", b"").unwrap();
    assert_eq!(h.datastore.snapshot().unwrap(), before);
}

/// Appending to a file that does not exist fails without writing.
#[test]
fn append_to_missing_file() {
    let h = Harness::new();
    let alice = h.user("alice");
    let before = h.datastore.len();

    assert!(matches!(
        alice.append_to_file("nope", b"data"),
        Err(SealshareError::NotFound(_))
    ));
    assert_eq!(h.datastore.len(), before);
}

// ── Sessions ────────────────────────────────────────────────────────────────

/// Independent sessions of the same user see each other's committed writes.
#[test]
fn sessions_share_persisted_state() {
    let h = Harness::new();
    let laptop = h.user("alice");
    let phone = h.login("alice");

    laptop.store_file("f", b"from laptop").unwrap();
    assert_eq!(phone.load_file("f").unwrap(), b"from laptop");

    phone.append_to_file("f", b", then phone").unwrap();
    assert_eq!(
        laptop.load_file("f").unwrap(),
        b"from laptop, then phone"
    );

    let tablet = h.login("alice");
    tablet.store_file("f", b"tablet").unwrap();
    assert_eq!(laptop.load_file("f").unwrap(), b"tablet");
    assert_eq!(phone.load_file("f").unwrap(), b"tablet");
}

/// Resetting the backends forgets every user.
#[test]
fn reset_between_cases() {
    let h = Harness::new();
    let alice = h.user("alice");
    alice.store_file("f", b"data").unwrap();

    h.datastore.reset().unwrap();
    h.keystore.reset().unwrap();
    assert!(h.datastore.is_empty());
    assert!(matches!(
        h.client.login("alice", "alice-pw"),
        Err(SealshareError::Auth(_))
    ));

    h.user("alice");
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn store_then_load_roundtrips(content in proptest::collection::vec(any::<u8>(), 0..=8 * BLOCK)) {
        let h = Harness::new();
        let alice = h.user("alice");
        alice.store_file("f", &content).unwrap();
        prop_assert_eq!(alice.load_file("f").unwrap(), content);
    }

    #[test]
    fn store_append_load_concatenates(
        first in proptest::collection::vec(any::<u8>(), 0..=4 * BLOCK),
        rest in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..=3 * BLOCK), 1..4),
    ) {
        let h = Harness::new();
        let alice = h.user("alice");
        alice.store_file("f", &first).unwrap();

        let mut expected = first.clone();
        for piece in &rest {
            alice.append_to_file("f", piece).unwrap();
            expected.extend_from_slice(piece);
        }
        prop_assert_eq!(alice.load_file("f").unwrap(), expected);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! 9300 compressed-chain loading: template seeding, incremental patching
//! and the self-synchronising record scan.

mod common;

use athcal::eep::compress::{comp_checksum, comp_hdr_pack, CompHdr, Compression, Template};
use athcal::eep::f9300::{AR9300_BASE_ADDR_4K, AR9300_EEPROM_STRUCT_SIZE};
use athcal::eep::{t9300, Family};
use athcal::loader::{self, LoadMode, Session};
use athcal::source::FileConnector;

use common::write_dump;

/// Lay a logical record stream out backwards from byte cursor `cptr`.
fn lay_stream(image: &mut [u8], cptr: usize, stream: &[u8]) {
    for (k, &b) in stream.iter().enumerate() {
        image[cptr - k] = b;
    }
}

fn block_record(reference: u8, patches: &[u8]) -> Vec<u8> {
    let hdr = CompHdr {
        comp: Compression::Block,
        reference,
        len: patches.len(),
        maj: 0,
        min: 0,
    };
    let mut stream = comp_hdr_pack(&hdr).to_vec();
    stream.extend_from_slice(patches);
    stream.extend_from_slice(&comp_checksum(patches).to_le_bytes());
    stream
}

fn base_image() -> Vec<u8> {
    let mut image = vec![0u8; 0x1000];
    image[0] = 0x5a; // EEPROM magic, little-endian
    image[1] = 0xa5;
    image
}

fn load_9300(image: &[u8]) -> Vec<u8> {
    let f = write_dump(image);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A9300.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();
    session.unpacked[..AR9300_EEPROM_STRUCT_SIZE].to_vec()
}

#[test]
fn test_single_block_patches_template() {
    // One BLOCK record over template X113: patch {offset=3, length=6}.
    let mut patches = vec![3u8, 6, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    patches.extend_from_slice(&[0u8; 16]); // zero-length patch filler
    assert_eq!(patches.len(), 24);

    let mut image = base_image();
    lay_stream(&mut image, AR9300_BASE_ADDR_4K, &block_record(6, &patches));

    let unpacked = load_9300(&image);

    let tpl = Template::find(t9300::TEMPLATES, 6).unwrap();
    let mut expect = (tpl.image)();
    expect[3..9].copy_from_slice(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    assert_eq!(unpacked, expect);
}

#[test]
fn test_second_block_same_ref_patches_incrementally() {
    let mut p1 = vec![3u8, 6, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    p1.extend_from_slice(&[0u8; 16]);
    let p2 = vec![20u8, 4, 0xde, 0xad, 0xbe, 0xef];

    let r1 = block_record(6, &p1);
    let r2 = block_record(6, &p2);

    let mut image = base_image();
    let cptr = AR9300_BASE_ADDR_4K;
    lay_stream(&mut image, cptr, &r1);
    lay_stream(&mut image, cptr - r1.len(), &r2);

    let unpacked = load_9300(&image);

    // No re-seed on the repeated ref: both patch sets are visible.
    let tpl = Template::find(t9300::TEMPLATES, 6).unwrap();
    let mut expect = (tpl.image)();
    expect[3..9].copy_from_slice(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    expect[20..24].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(unpacked, expect);
}

#[test]
fn test_corrupt_record_is_skipped_by_backing_up() {
    // A record with a broken trailing checksum at the first header
    // boundary; the good record sits one header length below.
    let mut p_good = vec![3u8, 4, 0xca, 0xfe, 0xba, 0xbe];
    p_good.extend_from_slice(&[0u8; 2]);
    let good = block_record(6, &p_good);

    let mut bad = block_record(6, &[0u8, 2, 0x77, 0x77]);
    let blen = bad.len();
    bad[blen - 1] ^= 0xff; // break the stored checksum

    let mut image = base_image();
    let cptr = AR9300_BASE_ADDR_4K;
    lay_stream(&mut image, cptr, &bad);
    lay_stream(&mut image, cptr - 4, &good);

    let unpacked = load_9300(&image);

    let tpl = Template::find(t9300::TEMPLATES, 6).unwrap();
    let mut expect = (tpl.image)();
    expect[3..7].copy_from_slice(&[0xca, 0xfe, 0xba, 0xbe]);
    assert_eq!(unpacked, expect);
}

#[test]
fn test_patch_cursor_out_of_range_rejects_record() {
    // A patch whose cursor runs past the image end: the record is
    // rejected and no other record exists, so the load fails cleanly.
    let mut long_patch = Vec::new();
    for _ in 0..5 {
        long_patch.extend_from_slice(&[0xff, 0]); // cursor += 255, no write
    }
    long_patch.extend_from_slice(&[0, 4, 0xaa, 0xbb, 0xcc, 0xdd]); // past end

    let mut image = base_image();
    lay_stream(
        &mut image,
        AR9300_BASE_ADDR_4K,
        &block_record(6, &long_patch),
    );

    let f = write_dump(&image);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A9300.create();
    session.setup_io();
    assert!(loader::load(&mut session, map.as_mut(), LoadMode::Normal).is_err());
}

#[test]
fn test_unpack_roundtrip_matches_template_semantics() {
    // A full-image NONE record round-trips bit-exactly.
    let tpl = Template::find(t9300::TEMPLATES, 2).unwrap();
    let full = (tpl.image)();
    let hdr = CompHdr {
        comp: Compression::None,
        reference: 0,
        len: full.len(),
        maj: 0,
        min: 0,
    };
    let mut stream = comp_hdr_pack(&hdr).to_vec();
    stream.extend_from_slice(&full);
    stream.extend_from_slice(&comp_checksum(&full).to_le_bytes());

    let mut image = base_image();
    lay_stream(&mut image, AR9300_BASE_ADDR_4K, &stream);

    let unpacked = load_9300(&image);
    assert_eq!(unpacked, full);
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! 5416-era EEPROM loading: structural validation, endianness detection
//! and the MAC update path, driven through the dump-file connector.

mod common;

use athcal::eep::common::calc_csum;
use athcal::eep::f5416::{AR5416_DATA_CSUM_LOC, AR5416_DATA_START_LOC, AR5416_DATA_SZ};
use athcal::eep::{Family, Section, UpdateParam};
use athcal::error::Error;
use athcal::loader::{self, LoadMode, Session};
use athcal::source::FileConnector;

use common::{build_5416_dump, byteswap_words, write_dump};

fn load_5416(dump: &[u8]) -> (tempfile::NamedTempFile, Vec<u16>, String) {
    let f = write_dump(dump);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5416.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();

    let mut out = String::new();
    map.dump(&session, Section::Base, &mut out);
    let buf = session.eep_buf[..session.eep_len].to_vec();
    (f, buf, out)
}

#[test]
fn test_load_and_validate_le_dump() {
    let (_f, buf, base) = load_5416(&build_5416_dump());

    // Checksum over the declared payload folds to 0xffff.
    let el = usize::from(buf[AR5416_DATA_START_LOC]) / 2;
    let el = el.min(AR5416_DATA_SZ);
    assert_eq!(
        calc_csum(&buf[AR5416_DATA_START_LOC..AR5416_DATA_START_LOC + el]),
        0xffff
    );

    let field = |name: &str| {
        base.lines()
            .find(|l| l.contains(name))
            .unwrap_or_else(|| panic!("missing field {:?} in: {}", name, base))
            .split(" : ")
            .nth(1)
            .unwrap()
            .trim()
            .to_string()
    };
    assert_eq!(field("Major Version"), "14");
    assert_eq!(field("Minor Version"), "2");
    assert_eq!(field("RegDomain2"), "0x001F");
    assert_eq!(field("OpFlags(5GHz)"), "1");
    assert_eq!(field("OpFlags(2GHz)"), "0");
    assert_eq!(field("Big Endian"), "0");
    assert_eq!(field("MacAddress"), "00:03:7F:11:22:33");
}

#[test]
fn test_byteswapped_dump_parses_identically() {
    // parse(swap16(B)) == parse(B) once the detector toggles io_swap.
    let dump = build_5416_dump();
    let (_f1, _b1, straight) = load_5416(&dump);
    let (_f2, _b2, swapped) = load_5416(&byteswap_words(&dump));
    assert_eq!(straight, swapped);
}

#[test]
fn test_empty_images_rejected_not_panicking() {
    for filler in [0x00u8, 0xff] {
        let dump = vec![filler; 0x1000];
        let f = write_dump(&dump);
        let mut con = FileConnector::open(f.path()).unwrap();
        let mut session = Session::new(&mut con);
        let mut map = Family::A5416.create();
        session.setup_io();
        let err = loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap_err();
        assert!(
            matches!(err, Error::Integrity { .. } | Error::NotFound { .. }),
            "filler 0x{:02x}: {:?}",
            filler,
            err
        );
    }
}

#[test]
fn test_truncated_dump_clamps_and_still_checks() {
    // Declared length beyond the dump: the tail reads as erased words and
    // the checksum cannot fold; the parser must error, not crash.
    let dump = build_5416_dump();
    let f = write_dump(&dump[..dump.len() - 0x100]);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5416.create();
    session.setup_io();
    let err = loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap_err();
    assert!(matches!(err, Error::Integrity { .. }));
}

#[test]
fn test_mac_update_rewrites_checksum() {
    let f = write_dump(&build_5416_dump());
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5416.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();

    let old_csum = session.eep_buf[AR5416_DATA_CSUM_LOC];

    let mac = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
    loader::update(&mut session, map.as_mut(), &UpdateParam::Mac(mac)).unwrap();

    // The dump file carries the new MAC at the canonical slot...
    let bytes = std::fs::read(f.path()).unwrap();
    let mac_off = (AR5416_DATA_START_LOC + 6) * 2;
    assert_eq!(&bytes[mac_off..mac_off + 6], &mac);

    // ...and a re-sealed checksum: reload and validate from scratch.
    let new_csum = u16::from_le_bytes([
        bytes[AR5416_DATA_CSUM_LOC * 2],
        bytes[AR5416_DATA_CSUM_LOC * 2 + 1],
    ]);
    assert_ne!(old_csum, new_csum);

    let mut con2 = FileConnector::open(f.path()).unwrap();
    let mut session2 = Session::new(&mut con2);
    let mut map2 = Family::A5416.create();
    session2.setup_io();
    loader::load(&mut session2, map2.as_mut(), LoadMode::Normal).unwrap();
    let mut out = String::new();
    map2.dump(&session2, Section::Base, &mut out);
    assert!(out.contains("AA:BB:CC:DD:EE:FF"));
}

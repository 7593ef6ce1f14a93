// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! 5211 legacy map: default-length loading, byteswap compensation and the
//! inverted-order MAC update.

mod common;

use athcal::eep::common::calc_csum;
use athcal::eep::f5211::{
    AR5211_EEPROM_MAGIC_VAL, AR5211_EEP_CSUM, AR5211_EEP_INFO_BASE, AR5211_EEP_MAC,
    AR5211_EEP_MAGIC, AR5211_EEP_OPFLAGS, AR5211_EEP_REGDOMAIN, AR5211_EEP_VER, AR5211_SIZE_DEF,
};
use athcal::eep::{Family, Section, UpdateParam};
use athcal::loader::{self, LoadMode, Session};
use athcal::source::FileConnector;

use common::write_dump;

/// A minimal valid v3.3 image of the default 0x400-word size.
fn build_5211_dump() -> Vec<u8> {
    let mut words = vec![0u16; AR5211_SIZE_DEF];

    words[AR5211_EEP_MAGIC as usize] = AR5211_EEPROM_MAGIC_VAL;
    // MAC 00:03:7F:AA:BB:CC, stored high-octet-first per word
    words[AR5211_EEP_MAC] = 0xbbcc;
    words[AR5211_EEP_MAC + 1] = 0x7faa;
    words[AR5211_EEP_MAC + 2] = 0x0003;
    words[AR5211_EEP_REGDOMAIN] = 0x0010;
    words[AR5211_EEP_VER] = 0x3003;
    words[AR5211_EEP_OPFLAGS] = 0x0001 | (2 << 11); // .11a, PCI device

    // Seal the info-section checksum
    words[AR5211_EEP_CSUM] = 0xffff;
    let sum = calc_csum(&words[AR5211_EEP_INFO_BASE..]);
    words[AR5211_EEP_CSUM] = sum;

    let mut dump = Vec::with_capacity(words.len() * 2);
    for w in &words {
        dump.extend_from_slice(&w.to_le_bytes());
    }
    dump
}

fn load_5211(dump: &[u8]) -> (tempfile::NamedTempFile, String) {
    let f = write_dump(dump);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5211.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();
    let mut out = String::new();
    map.dump(&session, Section::Base, &mut out);
    (f, out)
}

#[test]
fn test_load_with_default_length() {
    let (_f, base) = load_5211(&build_5211_dump());
    assert!(base.contains(": 3.3"), "{}", base);
    assert!(base.contains("00:03:7F:AA:BB:CC"));
    assert!(base.contains("0x0010"));
    let a_line = base.lines().find(|l| l.contains(".11a status")).unwrap();
    assert!(a_line.contains("enabled"));
    let b_line = base.lines().find(|l| l.contains(".11b status")).unwrap();
    assert!(b_line.contains("disabled"));
    let dev_line = base.lines().find(|l| l.contains("Device Type")).unwrap();
    assert!(dev_line.contains("PCI"));
}

#[test]
fn test_byteswapped_magic_toggles_io_swap() {
    let swapped = common::byteswap_words(&build_5211_dump());
    let (_f, base) = load_5211(&swapped);
    // Subsequent reads consume the stream as little-endian again.
    assert!(base.contains("00:03:7F:AA:BB:CC"));
}

#[test]
fn test_mac_update_inverts_byte_order() {
    let f = write_dump(&build_5211_dump());
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5211.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();

    let mac = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
    loader::update(&mut session, map.as_mut(), &UpdateParam::Mac(mac)).unwrap();

    // Octet order is inverted on this family.
    let bytes = std::fs::read(f.path()).unwrap();
    let off = AR5211_EEP_MAC * 2;
    assert_eq!(&bytes[off..off + 6], &[0xff, 0xee, 0xdd, 0xcc, 0xbb, 0xaa]);

    // The checksum slot was resealed and the image still validates.
    let mut con2 = FileConnector::open(f.path()).unwrap();
    let mut session2 = Session::new(&mut con2);
    let mut map2 = Family::A5211.create();
    session2.setup_io();
    loader::load(&mut session2, map2.as_mut(), LoadMode::Normal).unwrap();
    let mut out = String::new();
    map2.dump(&session2, Section::Base, &mut out);
    assert!(out.contains("AA:BB:CC:DD:EE:FF"));
}

#[test]
fn test_bad_magic_rejected() {
    let mut dump = build_5211_dump();
    dump[AR5211_EEP_MAGIC as usize * 2] = 0x00;
    dump[AR5211_EEP_MAGIC as usize * 2 + 1] = 0x00;
    let f = write_dump(&dump);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5211.create();
    session.setup_io();
    assert!(loader::load(&mut session, map.as_mut(), LoadMode::Normal).is_err());
}

#[test]
fn test_bad_checksum_rejected() {
    let mut dump = build_5211_dump();
    dump[(AR5211_EEP_INFO_BASE + 8) * 2] ^= 0x5a; // corrupt the info area
    let f = write_dump(&dump);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5211.create();
    session.setup_io();
    assert!(loader::load(&mut session, map.as_mut(), LoadMode::Normal).is_err());
}

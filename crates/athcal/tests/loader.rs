// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Loader orchestration: source priority, raw-content modes and the check
//! gating.

mod common;

use athcal::eep::common::{calc_csum_bytes, fixup_csum_bytes};
use athcal::eep::f9888::QCA9888_EEPROM_STRUCT_SIZE;
use athcal::eep::{f9888, Family, Section};
use athcal::error::Error;
use athcal::loader::{self, LoadMode, Session};
use athcal::source::FileConnector;

use common::write_dump;

fn build_9888_blob() -> Vec<u8> {
    let mut eep = f9888::Qca9888Eeprom::default();
    eep.base.length = QCA9888_EEPROM_STRUCT_SIZE as u16;
    eep.base.eeprom_version = 2;
    eep.base.template_version = 9;
    eep.base.mac_addr = [0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
    let mut image = eep.encode().unwrap();
    fixup_csum_bytes(&mut image, 2);
    assert_eq!(calc_csum_bytes(&image), 0xffff);
    image
}

#[test]
fn test_blob_load_and_check() {
    let f = write_dump(&build_9888_blob());
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::Q9888.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();

    let mut out = String::new();
    map.dump(&session, Section::Base, &mut out);
    assert!(out.contains("04:05:06:07:08:09"));
}

#[test]
fn test_blob_with_bad_checksum_fails_check() {
    let mut blob = build_9888_blob();
    blob[100] ^= 0xff;
    let f = write_dump(&blob);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::Q9888.create();
    session.setup_io();
    let err = loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap_err();
    assert!(matches!(err, Error::Integrity { .. }));
}

#[test]
fn test_raw_eeprom_load_skips_validation() {
    // Garbage content: the normal path must fail, the raw path must not
    // (the 9285 map supports raw EEPROM loading).
    let garbage = vec![0xA5u8; 0x1000];
    let f = write_dump(&garbage);

    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A9285.create();
    session.setup_io();
    assert!(loader::load(&mut session, map.as_mut(), LoadMode::Normal).is_err());

    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A9285.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::RawEep).unwrap();
    assert!(session.eep_len > 0);
    assert_eq!(session.eep_buf[0], 0xA5A5);
}

#[test]
fn test_raw_mode_refused_without_feature() {
    // The 5416 map has no raw-loading feature; the loader reports that no
    // suitable source/feature combination exists.
    let f = write_dump(&common::build_5416_dump());
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::A5416.create();
    session.setup_io();
    let err = loader::load(&mut session, map.as_mut(), LoadMode::RawEep).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test]
fn test_source_priority_blob_first() {
    // A 9888-sized blob that also happens to be EEPROM-readable: the
    // loader must pick the blob interface first (the 9888 map provides
    // only blob loading, so a successful load proves the blob path ran).
    let f = write_dump(&build_9888_blob());
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::Q9888.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();
    assert_eq!(session.eep_len, QCA9888_EEPROM_STRUCT_SIZE / 2);
}

#[test]
fn test_update_unsupported_map_is_not_supported_error() {
    let f = write_dump(&build_9888_blob());
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::Q9888.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal).unwrap();

    let err = loader::update(
        &mut session,
        map.as_mut(),
        &athcal::eep::UpdateParam::Mac([2, 3, 4, 5, 6, 7]),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotSupported { .. }));
}

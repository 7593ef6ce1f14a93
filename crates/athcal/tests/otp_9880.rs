// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! 9880 OTP container parsing: stream framing, CALDATA decompression and
//! the checksum recomputation on the assembled image.

mod common;

use athcal::eep::common::calc_csum_bytes;
use athcal::eep::compress::{comp_checksum, comp_hdr_pack, CompHdr, Compression, Template};
use athcal::eep::f9880::{
    QCA9880_EEPROM_STRUCT_SIZE, QCA9880_OTP_HEADER_SIZE, QCA9880_OTP_MAGIC_OFFSET,
    QCA9880_OTP_SIZE, QCA9880_OTP_STR_TYPE_CALDATA,
};
use athcal::eep::{t9880, Family};
use athcal::error::Error;
use athcal::loader::{self, LoadMode, Session};
use athcal::source::FileConnector;

use common::write_dump;

fn caldata_record(reference: u8, patches: &[u8]) -> Vec<u8> {
    let hdr = CompHdr {
        comp: Compression::Block,
        reference,
        len: patches.len(),
        maj: 0,
        min: 0,
    };
    let mut rec = comp_hdr_pack(&hdr).to_vec();
    rec.extend_from_slice(patches);
    rec.extend_from_slice(&comp_checksum(patches).to_le_bytes());
    rec
}

/// OTP container with one CALDATA stream framed at `stream_off`.
fn build_otp(stream_off: usize, stream_code: u8, body: &[u8]) -> Vec<u8> {
    let mut otp = vec![0u8; QCA9880_OTP_SIZE];
    otp[QCA9880_OTP_MAGIC_OFFSET] = 0xaa;
    otp[QCA9880_OTP_MAGIC_OFFSET + 1] = 0x55;

    let mut p = stream_off;
    otp[p] = 0xb0 | stream_code; // begin marker
    p += 1;
    otp[p] = QCA9880_OTP_STR_TYPE_CALDATA;
    otp[p + 1] = 1; // stream format version
    p += 2;
    otp[p..p + body.len()].copy_from_slice(body);
    p += body.len();
    otp[p] = 0xc0 | stream_code; // doubled end marker
    otp[p + 1] = 0xc0 | stream_code;

    otp
}

fn load_otp(otp: &[u8]) -> Result<Vec<u8>, Error> {
    let f = write_dump(otp);
    let mut con = FileConnector::open(f.path()).unwrap();
    let mut session = Session::new(&mut con);
    let mut map = Family::Q9880.create();
    session.setup_io();
    loader::load(&mut session, map.as_mut(), LoadMode::Normal)?;
    Ok(session.unpacked[..QCA9880_EEPROM_STRUCT_SIZE].to_vec())
}

#[test]
fn test_caldata_stream_assembles_image() {
    // Patch CUS223 (ref 3) at offset 16: six recognisable octets.
    let patches = [16u8, 6, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    let otp = build_otp(0x100, 0x3, &caldata_record(3, &patches));

    let unpacked = load_otp(&otp).unwrap();
    assert_eq!(unpacked.len(), QCA9880_EEPROM_STRUCT_SIZE);

    // The patch landed over the template...
    assert_eq!(&unpacked[16..22], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    let tpl = Template::find(t9880::TEMPLATES, 3).unwrap();
    let expect = (tpl.image)();
    assert_eq!(&unpacked[22..], &expect[22..]);

    // ...and the checksum slot was recomputed so the image folds clean.
    assert_eq!(calc_csum_bytes(&unpacked), 0xffff);
}

#[test]
fn test_invalid_magic_rejected() {
    let mut otp = build_otp(0x100, 0x3, &caldata_record(3, &[0u8, 1, 0x42]));
    otp[QCA9880_OTP_MAGIC_OFFSET] = 0x00;
    assert!(matches!(
        load_otp(&otp),
        Err(Error::NotFound { .. }) | Err(Error::Integrity { .. })
    ));
}

#[test]
fn test_invalid_begin_marker_rejected() {
    let mut otp = build_otp(0x100, 0x3, &caldata_record(3, &[0u8, 1, 0x42]));
    // A stray non-marker octet before the stream begins.
    otp[QCA9880_OTP_HEADER_SIZE + 2] = 0x42;
    assert!(load_otp(&otp).is_err());
}

#[test]
fn test_end_marker_needs_doubling() {
    // A single end marker inside the stream body must not terminate it:
    // place one lone end-marker octet in the patch data.
    let patches = [16u8, 3, 0xc5, 0x01, 0x02];
    let otp = build_otp(0x100, 0x5, &caldata_record(3, &patches));
    let unpacked = load_otp(&otp).unwrap();
    assert_eq!(&unpacked[16..19], &[0xc5, 0x01, 0x02]);
}

#[test]
fn test_otp_without_caldata_stream_fails() {
    let mut otp = vec![0u8; QCA9880_OTP_SIZE];
    otp[QCA9880_OTP_MAGIC_OFFSET] = 0xaa;
    otp[QCA9880_OTP_MAGIC_OFFSET + 1] = 0x55;
    assert!(matches!(load_otp(&otp), Err(Error::NotFound { .. })));
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Shared fixtures: dump-file builders driven through the same layout
//! code the parsers use.
#![allow(dead_code)]

use std::io::Write;

use athcal::eep::common::{
    calc_csum_bytes, fixup_csum_bytes, AR5416_EEPROM_MAGIC, AR5416_OPFLAGS_11A,
};
use athcal::eep::f5416::{Ar5416Eeprom, AR5416_DATA_BYTES, AR5416_DATA_START_LOC};

/// A valid little-endian 5416 dump: init area with the magic plus a
/// checksum-sealed data area.
pub fn build_5416_dump() -> Vec<u8> {
    let mut eep = Ar5416Eeprom::default();
    eep.base.length = AR5416_DATA_BYTES as u16;
    eep.base.version = 0xe002; // 14.2
    eep.base.op_cap_flags = AR5416_OPFLAGS_11A;
    eep.base.eep_misc = 0;
    eep.base.reg_dmn = [0x0000, 0x001f];
    eep.base.mac_addr = [0x00, 0x03, 0x7f, 0x11, 0x22, 0x33];
    eep.base.tx_mask = 0x07;
    eep.base.rx_mask = 0x07;
    eep.base.bin_build_number = 0x00091500;
    eep.base.device_type = 5;
    eep.modal_5g.xpd_gain = 0x03;

    let mut data = eep.encode().unwrap();
    fixup_csum_bytes(&mut data, 2);
    assert_eq!(calc_csum_bytes(&data), 0xffff);

    let mut dump = Vec::new();
    dump.extend_from_slice(&AR5416_EEPROM_MAGIC.to_le_bytes());
    dump.extend_from_slice(&0u16.to_le_bytes()); // prot
    dump.extend_from_slice(&0u16.to_le_bytes()); // iptr
    dump.extend_from_slice(&0xffffu16.to_le_bytes()); // regs terminator
    dump.resize(AR5416_DATA_START_LOC * 2, 0);
    dump.extend_from_slice(&data);
    dump
}

/// Byte-reverse every 16-bit word of a dump.
pub fn byteswap_words(dump: &[u8]) -> Vec<u8> {
    let mut out = dump.to_vec();
    for pair in out.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    out
}

pub fn write_dump(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

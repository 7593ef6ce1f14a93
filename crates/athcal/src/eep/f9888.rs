// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! EEPROM map of the QCA9888/IPQ40xx .11ac chips: an uncompressed
//! 12064-byte image loaded from a blob, base header only.

use std::fmt::Write as _;

use crate::eep::common;
use crate::eep::cursor::{Cursor, CursorMut};
use crate::eep::render;
use crate::eep::{EepMap, Op, Section, UpdateParam};
use crate::error::{Error, Result};
use crate::loader::Session;

pub const QCA9888_CUSTOMER_DATA_SIZE: usize = 20;
pub const QCA9888_EEPROM_STRUCT_SIZE: usize = 12064;

#[derive(Debug, Clone)]
pub struct BaseHdr {
    pub length: u16,
    pub checksum: u16,
    pub eeprom_version: u8,
    pub template_version: u8,
    pub mac_addr: [u8; 6],
    pub cust_data: [u8; QCA9888_CUSTOMER_DATA_SIZE],
}

impl Default for BaseHdr {
    fn default() -> Self {
        Self {
            length: 0,
            checksum: 0,
            eeprom_version: 0,
            template_version: 0,
            mac_addr: [0; 6],
            cust_data: [0; QCA9888_CUSTOMER_DATA_SIZE],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Qca9888Eeprom {
    pub base: BaseHdr,
}

impl Qca9888Eeprom {
    pub fn parse(image: &[u8]) -> Result<Qca9888Eeprom> {
        let mut c = Cursor::new(image);
        let mut eep = Qca9888Eeprom::default();
        eep.base.length = c.read_u16()?;
        eep.base.checksum = c.read_u16()?;
        eep.base.eeprom_version = c.read_u8()?;
        eep.base.template_version = c.read_u8()?;
        eep.base.mac_addr = c.read_array()?;
        c.skip(32)?;
        eep.base.cust_data = c.read_array()?;
        Ok(eep)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut image = vec![0u8; QCA9888_EEPROM_STRUCT_SIZE];
        let mut c = CursorMut::new(&mut image);
        c.write_u16(self.base.length)?;
        c.write_u16(self.base.checksum)?;
        c.write_u8(self.base.eeprom_version)?;
        c.write_u8(self.base.template_version)?;
        c.write_bytes(&self.base.mac_addr)?;
        c.skip(32)?;
        c.write_bytes(&self.base.cust_data)?;
        Ok(image)
    }
}

pub struct Eep9888 {
    eep: Qca9888Eeprom,
    loaded: bool,
}

impl Default for Eep9888 {
    fn default() -> Self {
        Self::new()
    }
}

impl Eep9888 {
    pub fn new() -> Self {
        Self {
            eep: Qca9888Eeprom::default(),
            loaded: false,
        }
    }
}

impl EepMap for Eep9888 {
    fn name(&self) -> &'static str {
        "9888"
    }

    fn desc(&self) -> &'static str {
        "EEPROM map for .11ac chips (QCA9884/QCA9886/QCA9888/IPQ4018/IPQ4019/etc.)"
    }

    fn srev_reg(&self) -> Option<u32> {
        Some(0x800ec)
    }

    fn eep_buf_words(&self) -> usize {
        QCA9888_EEPROM_STRUCT_SIZE / 2
    }

    fn provides(&self, op: Op) -> bool {
        matches!(op, Op::LoadBlob)
    }

    fn sections(&self) -> &'static [Section] {
        &[Section::Base]
    }

    fn load_blob(&mut self, session: &mut Session) -> Result<()> {
        let size = session.con.blob_size()?;
        if size < QCA9888_EEPROM_STRUCT_SIZE {
            return Err(Error::not_found("blob is smaller than the calibration image"));
        }

        let mut image = vec![0u8; QCA9888_EEPROM_STRUCT_SIZE];
        let read = session.con.blob_read(&mut image)?;
        if read != QCA9888_EEPROM_STRUCT_SIZE {
            return Err(Error::io("unable to read calibration data blob"));
        }

        for (i, pair) in image.chunks_exact(2).enumerate() {
            session.eep_buf[i] = u16::from_le_bytes([pair[0], pair[1]]);
        }
        session.eep_len = (QCA9888_EEPROM_STRUCT_SIZE + 1) / 2;

        self.eep = Qca9888Eeprom::parse(&image)?;
        self.loaded = true;

        Ok(())
    }

    fn check(&mut self, session: &mut Session) -> Result<()> {
        if !self.loaded {
            return Err(Error::not_found("no calibration data loaded"));
        }

        let b = &self.eep.base;
        if usize::from(b.length) != QCA9888_EEPROM_STRUCT_SIZE
            && usize::from(b.length.swap_bytes()) != QCA9888_EEPROM_STRUCT_SIZE
        {
            return Err(Error::integrity(format!(
                "bad EEPROM length 0x{:04x}/0x{:04x} (expect 0x{:04x})",
                b.length,
                b.length.swap_bytes(),
                QCA9888_EEPROM_STRUCT_SIZE
            )));
        }

        let sum = common::calc_csum(&session.eep_buf[..QCA9888_EEPROM_STRUCT_SIZE / 2]);
        if sum != 0xffff {
            return Err(Error::integrity(format!("bad EEPROM checksum 0x{:04x}", sum)));
        }

        Ok(())
    }

    fn dump(&self, _session: &Session, section: Section, out: &mut String) {
        if section != Section::Base {
            return;
        }
        let b = &self.eep.base;

        render::sect_name(out, "EEPROM Base Header");

        let _ = writeln!(out, "{:<30} : 0x{:04X}", "Length", b.length);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "Checksum", b.checksum);
        let _ = writeln!(out, "{:<30} : {}", "EEP Version", b.eeprom_version);
        let _ = writeln!(out, "{:<30} : {}", "Template Version", b.template_version);
        let m = b.mac_addr;
        let _ = writeln!(
            out,
            "{:<30} : {:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            "MacAddress", m[0], m[1], m[2], m[3], m[4], m[5]
        );

        out.push_str("\nCustomer Data in hex:\n");
        render::hexdump(out, &b.cust_data);
        out.push('\n');
    }

    fn update(&mut self, _session: &mut Session, _param: &UpdateParam) -> Result<()> {
        Err(Error::not_supported("9888: content updating"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_size() {
        assert_eq!(
            Qca9888Eeprom::default().encode().unwrap().len(),
            QCA9888_EEPROM_STRUCT_SIZE
        );
    }

    #[test]
    fn test_roundtrip() {
        let mut eep = Qca9888Eeprom::default();
        eep.base.length = QCA9888_EEPROM_STRUCT_SIZE as u16;
        eep.base.mac_addr = [1, 2, 3, 4, 5, 6];
        let back = Qca9888Eeprom::parse(&eep.encode().unwrap()).unwrap();
        assert_eq!(back.base.mac_addr, [1, 2, 3, 4, 5, 6]);
        assert_eq!(back.base.length, QCA9888_EEPROM_STRUCT_SIZE as u16);
    }
}

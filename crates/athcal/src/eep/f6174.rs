// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! EEPROM map of the QCA6174 .11ac chips: an uncompressed 8124-byte image
//! loaded from a blob. Only the base header and the CTL tables are decoded
//! so far.

use std::fmt::Write as _;

use crate::eep::common;
use crate::eep::cursor::{Cursor, CursorMut};
use crate::eep::render;
use crate::eep::{EepMap, Op, Section, UpdateParam};
use crate::error::{Error, Result};
use crate::loader::Session;

pub const QCA6174_CUSTOMER_DATA_SIZE: usize = 20;

pub const QCA6174_NUM_2G_CTLS: usize = 18;
pub const QCA6174_NUM_2G_BAND_EDGES: usize = 4;
pub const QCA6174_NUM_5G_CTLS: usize = 18;
pub const QCA6174_NUM_5G_BAND_EDGES: usize = 8;

pub const QCA6174_EEPROM_STRUCT_SIZE: usize = 8124;

// Byte offsets of the decoded regions within the image.
const CTL_2G_INDEX_OFF: usize = 0x0818;
const CTL_5G_INDEX_OFF: usize = 0x1772;

#[derive(Debug, Clone)]
pub struct BaseHdr {
    pub length: u16,
    pub checksum: u16,
    pub eeprom_version: u8,
    pub template_version: u8,
    pub mac_addr: [u8; 6],
    pub cust_data: [u8; QCA6174_CUSTOMER_DATA_SIZE],
}

impl Default for BaseHdr {
    fn default() -> Self {
        Self {
            length: 0,
            checksum: 0,
            eeprom_version: 0,
            template_version: 0,
            mac_addr: [0; 6],
            cust_data: [0; QCA6174_CUSTOMER_DATA_SIZE],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Qca6174Eeprom {
    pub base: BaseHdr,
    pub ctl_index_2g: [u8; QCA6174_NUM_2G_CTLS],
    pub ctl_freqbin_2g: [[u8; QCA6174_NUM_2G_BAND_EDGES]; QCA6174_NUM_2G_CTLS],
    pub ctl_data_2g: [[u8; QCA6174_NUM_2G_BAND_EDGES]; QCA6174_NUM_2G_CTLS],
    pub ctl_index_5g: [u8; QCA6174_NUM_5G_CTLS],
    pub ctl_freqbin_5g: [[u8; QCA6174_NUM_5G_BAND_EDGES]; QCA6174_NUM_5G_CTLS],
    pub ctl_data_5g: [[u8; QCA6174_NUM_5G_BAND_EDGES]; QCA6174_NUM_5G_CTLS],
}

impl Default for Qca6174Eeprom {
    fn default() -> Self {
        Self {
            base: BaseHdr::default(),
            ctl_index_2g: [0; QCA6174_NUM_2G_CTLS],
            ctl_freqbin_2g: Default::default(),
            ctl_data_2g: Default::default(),
            ctl_index_5g: [0; QCA6174_NUM_5G_CTLS],
            ctl_freqbin_5g: Default::default(),
            ctl_data_5g: Default::default(),
        }
    }
}

impl Qca6174Eeprom {
    pub fn parse(image: &[u8]) -> Result<Qca6174Eeprom> {
        let mut eep = Qca6174Eeprom::default();

        let mut c = Cursor::new(image);
        eep.base.length = c.read_u16()?;
        eep.base.checksum = c.read_u16()?;
        eep.base.eeprom_version = c.read_u8()?;
        eep.base.template_version = c.read_u8()?;
        eep.base.mac_addr = c.read_array()?;
        c.skip(32)?;
        eep.base.cust_data = c.read_array()?;

        let mut c = Cursor::new(&image[CTL_2G_INDEX_OFF..]);
        eep.ctl_index_2g = c.read_array()?;
        c.skip(2)?;
        for f in &mut eep.ctl_freqbin_2g {
            *f = c.read_array()?;
        }
        for d in &mut eep.ctl_data_2g {
            *d = c.read_array()?;
        }

        let mut c = Cursor::new(&image[CTL_5G_INDEX_OFF..]);
        eep.ctl_index_5g = c.read_array()?;
        c.skip(4)?;
        for f in &mut eep.ctl_freqbin_5g {
            *f = c.read_array()?;
        }
        for d in &mut eep.ctl_data_5g {
            *d = c.read_array()?;
        }

        Ok(eep)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut image = vec![0u8; QCA6174_EEPROM_STRUCT_SIZE];

        {
            let mut c = CursorMut::new(&mut image);
            c.write_u16(self.base.length)?;
            c.write_u16(self.base.checksum)?;
            c.write_u8(self.base.eeprom_version)?;
            c.write_u8(self.base.template_version)?;
            c.write_bytes(&self.base.mac_addr)?;
            c.skip(32)?;
            c.write_bytes(&self.base.cust_data)?;
        }
        {
            let mut c = CursorMut::new(&mut image[CTL_2G_INDEX_OFF..]);
            c.write_bytes(&self.ctl_index_2g)?;
            c.skip(2)?;
            for f in &self.ctl_freqbin_2g {
                c.write_bytes(f)?;
            }
            for d in &self.ctl_data_2g {
                c.write_bytes(d)?;
            }
        }
        {
            let mut c = CursorMut::new(&mut image[CTL_5G_INDEX_OFF..]);
            c.write_bytes(&self.ctl_index_5g)?;
            c.skip(4)?;
            for f in &self.ctl_freqbin_5g {
                c.write_bytes(f)?;
            }
            for d in &self.ctl_data_5g {
                c.write_bytes(d)?;
            }
        }

        Ok(image)
    }
}

pub struct Eep6174 {
    eep: Qca6174Eeprom,
    loaded: bool,
}

impl Default for Eep6174 {
    fn default() -> Self {
        Self::new()
    }
}

impl Eep6174 {
    pub fn new() -> Self {
        Self {
            eep: Qca6174Eeprom::default(),
            loaded: false,
        }
    }

    fn dump_base(&self, out: &mut String) {
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

    fn dump_power(&self, out: &mut String) {
        let eep = &self.eep;

        render::sect_name(out, "EEPROM Power Info");

        render::subsect_name(out, "2 GHz CTL data");
        for (i, &ctl) in eep.ctl_index_2g.iter().enumerate() {
            if ctl == 0x00 || ctl == 0xff {
                continue;
            }
            let _ = writeln!(out, "  {}:", render::ctl_label(ctl));
            let edges: Vec<render::CtlEdge> = eep.ctl_freqbin_2g[i]
                .iter()
                .zip(&eep.ctl_data_2g[i])
                .map(|(&fbin, &p)| render::CtlEdge { fbin, ctl: p })
                .collect();
            render::ctl_edges(out, &edges, true, true);
            out.push('\n');
        }

        render::subsect_name(out, "5 GHz CTL data");
        for (i, &ctl) in eep.ctl_index_5g.iter().enumerate() {
            if ctl == 0x00 || ctl == 0xff {
                continue;
            }
            let _ = writeln!(out, "  {}:", render::ctl_label(ctl));
            let edges: Vec<render::CtlEdge> = eep.ctl_freqbin_5g[i]
                .iter()
                .zip(&eep.ctl_data_5g[i])
                .map(|(&fbin, &p)| render::CtlEdge { fbin, ctl: p })
                .collect();
            render::ctl_edges(out, &edges, false, true);
            out.push('\n');
        }
    }
}

impl EepMap for Eep6174 {
    fn name(&self) -> &'static str {
        "6174"
    }

    fn desc(&self) -> &'static str {
        "EEPROM map for .11ac chips (QCA6174)"
    }

    fn srev_reg(&self) -> Option<u32> {
        Some(0x08f0)
    }

    fn eep_buf_words(&self) -> usize {
        QCA6174_EEPROM_STRUCT_SIZE / 2
    }

    fn provides(&self, op: Op) -> bool {
        matches!(op, Op::LoadBlob)
    }

    fn sections(&self) -> &'static [Section] {
        &[Section::Base, Section::Power]
    }

    fn load_blob(&mut self, session: &mut Session) -> Result<()> {
        let size = session.con.blob_size()?;
        if size < QCA6174_EEPROM_STRUCT_SIZE {
            return Err(Error::not_found("blob is smaller than the calibration image"));
        }

        let mut image = vec![0u8; QCA6174_EEPROM_STRUCT_SIZE];
        let read = session.con.blob_read(&mut image)?;
        if read != QCA6174_EEPROM_STRUCT_SIZE {
            return Err(Error::io("unable to read calibration data blob"));
        }

        for (i, pair) in image.chunks_exact(2).enumerate() {
            session.eep_buf[i] = u16::from_le_bytes([pair[0], pair[1]]);
        }
        session.eep_len = (QCA6174_EEPROM_STRUCT_SIZE + 1) / 2;

        self.eep = Qca6174Eeprom::parse(&image)?;
        self.loaded = true;

        Ok(())
    }

    fn check(&mut self, session: &mut Session) -> Result<()> {
        if !self.loaded {
            return Err(Error::not_found("no calibration data loaded"));
        }

        let b = &self.eep.base;
        if usize::from(b.length) != QCA6174_EEPROM_STRUCT_SIZE
            && usize::from(b.length.swap_bytes()) != QCA6174_EEPROM_STRUCT_SIZE
        {
            return Err(Error::integrity(format!(
                "bad EEPROM length 0x{:04x}/0x{:04x} (expect 0x{:04x})",
                b.length,
                b.length.swap_bytes(),
                QCA6174_EEPROM_STRUCT_SIZE
            )));
        }

        let sum = common::calc_csum(&session.eep_buf[..QCA6174_EEPROM_STRUCT_SIZE / 2]);
        if sum != 0xffff {
            return Err(Error::integrity(format!("bad EEPROM checksum 0x{:04x}", sum)));
        }

        Ok(())
    }

    fn dump(&self, _session: &Session, section: Section, out: &mut String) {
        match section {
            Section::Base => self.dump_base(out),
            Section::Power => self.dump_power(out),
            Section::Init | Section::Modal => {}
        }
    }

    fn update(&mut self, _session: &mut Session, _param: &UpdateParam) -> Result<()> {
        Err(Error::not_supported("6174: content updating"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_size_is_static_asserted() {
        let image = Qca6174Eeprom::default().encode().unwrap();
        assert_eq!(image.len(), 8124);
    }

    #[test]
    fn test_roundtrip() {
        let mut eep = Qca6174Eeprom::default();
        eep.base.length = 8124;
        eep.base.eeprom_version = 2;
        eep.base.mac_addr = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
        eep.ctl_index_5g[2] = 0x30;
        eep.ctl_freqbin_5g[2][0] = common::freq2fbin(5500, false);
        let image = eep.encode().unwrap();
        let back = Qca6174Eeprom::parse(&image).unwrap();
        assert_eq!(back.base.mac_addr, eep.base.mac_addr);
        assert_eq!(back.ctl_index_5g[2], 0x30);
        assert_eq!(back.ctl_freqbin_5g[2][0], common::freq2fbin(5500, false));
    }
}

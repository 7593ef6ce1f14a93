// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Calibration-data format parsers ("EEPROM maps"), one per chip family,
//! plus the primitives they compose.

pub mod bits;
pub mod common;
pub mod compress;
pub mod cursor;
pub mod render;

pub mod f5211;
pub mod f5416;
pub mod f6174;
pub mod f9285;
pub mod f9287;
pub mod f9300;
pub mod f9880;
pub mod f9888;
pub mod t9300;
pub mod t9880;

use crate::error::{Error, Result};
use crate::loader::Session;
use compress::Template;

/// Dumpable sections of a parsed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Init,
    Base,
    Modal,
    Power,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Init, Section::Base, Section::Modal, Section::Power];

    pub fn name(self) -> &'static str {
        match self {
            Section::Init => "init",
            Section::Base => "base",
            Section::Modal => "modal",
            Section::Power => "power",
        }
    }

    pub fn desc(self) -> &'static str {
        match self {
            Section::Init => "Device initialization information (e.g. PCI IDs)",
            Section::Base => "Main device configuration (common for all modes)",
            Section::Modal => "Per-band (per-mode) device configuration",
            Section::Power => "Tx Power information (calibrations and limitations)",
        }
    }

    pub fn from_name(name: &str) -> Option<Section> {
        Section::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

/// Updateable record parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateParam {
    /// Device MAC address.
    Mac([u8; 6]),
    /// Zero the CTL index region. Destructive; gated by the
    /// `danger-erase-ctl` build feature.
    EraseCtl,
}

impl UpdateParam {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateParam::Mac(_) => "mac",
            UpdateParam::EraseCtl => "erasectl",
        }
    }
}

/// Operations a parser may or may not provide. The loader checks
/// availability before invoking any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    LoadBlob,
    LoadEeprom,
    LoadOtp,
    Update,
}

/// Optional raw-contents loading support.
#[derive(Debug, Clone, Copy, Default)]
pub struct Features {
    pub raw_eep: bool,
    pub raw_otp: bool,
}

/// One calibration-data format parser.
///
/// `load_*` fetch data from the session's connector into the session
/// buffers and decode it into the parser's record; `check` validates the
/// decoded record (magic, version, checksum) and normalises endianness;
/// `dump` renders one section of the record; `update` patches a parameter
/// and rewrites the affected region plus checksum.
pub trait EepMap {
    fn name(&self) -> &'static str;
    fn desc(&self) -> &'static str;

    fn features(&self) -> Features {
        Features::default()
    }

    /// Chip revision register offset, when the family supports hardware
    /// access at all.
    fn srev_reg(&self) -> Option<u32> {
        None
    }

    /// Word-buffer size the session must provide, in 16-bit words.
    fn eep_buf_words(&self) -> usize;

    /// Unpacked (decompressed) image size, zero when the format is not
    /// compressed.
    fn unpacked_size(&self) -> usize {
        0
    }

    fn templates(&self) -> &'static [Template] {
        &[]
    }

    fn provides(&self, op: Op) -> bool;

    fn sections(&self) -> &'static [Section];

    fn supports_section(&self, section: Section) -> bool {
        self.sections().contains(&section)
    }

    fn load_blob(&mut self, _session: &mut Session) -> Result<()> {
        Err(Error::not_supported(format!("{}: blob loading", self.name())))
    }

    fn load_eeprom(&mut self, _session: &mut Session, _raw: bool) -> Result<()> {
        Err(Error::not_supported(format!(
            "{}: EEPROM loading",
            self.name()
        )))
    }

    fn load_otp(&mut self, _session: &mut Session, _raw: bool) -> Result<()> {
        Err(Error::not_supported(format!("{}: OTP loading", self.name())))
    }

    fn check(&mut self, session: &mut Session) -> Result<()>;

    fn dump(&self, session: &Session, section: Section, out: &mut String);

    fn update(&mut self, _session: &mut Session, _param: &UpdateParam) -> Result<()> {
        Err(Error::not_supported(format!(
            "{}: content updating",
            self.name()
        )))
    }

    fn supports_param(&self, _param: &UpdateParam) -> bool {
        false
    }
}

/// Chip families, i.e. the known EEPROM map types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    A5211,
    A5416,
    Q6174,
    A9285,
    A9287,
    A9300,
    Q9880,
    Q9888,
}

impl Family {
    pub const ALL: [Family; 8] = [
        Family::A5211,
        Family::A5416,
        Family::Q6174,
        Family::A9285,
        Family::A9287,
        Family::A9300,
        Family::Q9880,
        Family::Q9888,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Family::A5211 => "5211",
            Family::A5416 => "5416",
            Family::Q6174 => "6174",
            Family::A9285 => "9285",
            Family::A9287 => "9287",
            Family::A9300 => "9300",
            Family::Q9880 => "9880",
            Family::Q9888 => "9888",
        }
    }

    pub fn from_name(name: &str) -> Option<Family> {
        Family::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Instantiate the family's parser.
    pub fn create(self) -> Box<dyn EepMap> {
        match self {
            Family::A5211 => Box::new(f5211::Eep5211::new()),
            Family::A5416 => Box::new(f5416::Eep5416::new()),
            Family::Q6174 => Box::new(f6174::Eep6174::new()),
            Family::A9285 => Box::new(f9285::Eep9285::new()),
            Family::A9287 => Box::new(f9287::Eep9287::new()),
            Family::A9300 => Box::new(f9300::Eep9300::new()),
            Family::Q9880 => Box::new(f9880::Eep9880::new()),
            Family::Q9888 => Box::new(f9888::Eep9888::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_names_roundtrip() {
        for s in Section::ALL {
            assert_eq!(Section::from_name(s.name()), Some(s));
        }
        assert_eq!(Section::from_name("POWER"), Some(Section::Power));
        assert_eq!(Section::from_name("nosuch"), None);
    }

    #[test]
    fn test_family_lookup() {
        assert_eq!(Family::from_name("9300"), Some(Family::A9300));
        assert_eq!(Family::from_name("9880"), Some(Family::Q9880));
        assert_eq!(Family::from_name("none"), None);
    }

    #[test]
    fn test_every_family_creates_a_parser() {
        for f in Family::ALL {
            let map = f.create();
            assert_eq!(map.name(), f.name());
            assert!(map.eep_buf_words() > 0);
        }
    }
}

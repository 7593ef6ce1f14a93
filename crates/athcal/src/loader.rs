// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Session context and load-attempt orchestration.
//!
//! A [`Session`] aggregates everything one program invocation works with:
//! the active connector, the I/O byteswap flag, the chip identity, the
//! intermediate word buffer and the unpacked-data buffer. It is threaded
//! explicitly through every operation; there is no global state.

use crate::eep::{EepMap, Op, UpdateParam};
use crate::error::{Error, Result};
use crate::source::{Connector, CON_CAP_HW};

/// Use write-protect GPIO autodetection.
pub const EEP_WP_GPIO_AUTO: i32 = -1;
/// Do not use a GPIO for unlocking.
pub const EEP_WP_GPIO_NONE: i32 = -2;

/// How EEPROM word I/O reaches the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EepAccess {
    #[default]
    None,
    /// The connector provides word I/O directly.
    Connector,
    /// 5416-and-later offset-mapped controller.
    Hw9xxx,
    /// Legacy 5211 command/status controller.
    Hw5211,
}

/// How OTP octet I/O reaches the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum OtpAccess {
    #[default]
    None,
    Connector,
    /// AR93xx word-cached OTP reads.
    Hw93xx,
    /// QCA988x OTP with the explicit enable dance.
    Hw988x,
}

/// GPIO register block flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GpioStyle {
    Ar5xxx,
    Ar9xxx,
}

pub struct Session<'a> {
    pub con: &'a mut dyn Connector,

    /// Byte-reverse every word crossing the connector boundary.
    pub io_swap: bool,

    pub mac_version: u32,
    pub mac_rev: u16,

    /// Intermediate EEPROM word buffer; each entry is the little-endian
    /// decoded word value.
    pub eep_buf: Vec<u16>,
    /// Words of valid data in `eep_buf`.
    pub eep_len: usize,

    /// Unpacked (decompressed) data buffer.
    pub unpacked: Vec<u8>,
    /// Octets of valid data in `unpacked`.
    pub unpacked_len: usize,

    pub(crate) eep_access: EepAccess,
    pub(crate) otp_access: OtpAccess,
    pub(crate) otp_was_enabled: bool,
    pub(crate) otp_cache_addr: Option<u32>,
    pub(crate) otp_cache_data: u32,

    pub(crate) gpio: Option<GpioStyle>,
    pub gpio_num: u32,
    pub wp_gpio_num: i32,
    pub wp_gpio_pol: u8,
}

impl<'a> Session<'a> {
    pub fn new(con: &'a mut dyn Connector) -> Self {
        Self {
            con,
            io_swap: false,
            mac_version: 0,
            mac_rev: 0,
            eep_buf: Vec::new(),
            eep_len: 0,
            unpacked: Vec::new(),
            unpacked_len: 0,
            eep_access: EepAccess::None,
            otp_access: OtpAccess::None,
            otp_was_enabled: false,
            otp_cache_addr: None,
            otp_cache_data: 0,
            gpio: None,
            gpio_num: 0,
            wp_gpio_num: EEP_WP_GPIO_AUTO,
            wp_gpio_pol: 0,
        }
    }

    /// Size the word and unpacked buffers for `map`.
    pub fn alloc_buffers(&mut self, map: &dyn EepMap) -> Result<()> {
        let words = map.eep_buf_words();
        self.eep_buf = Vec::new();
        self.eep_buf
            .try_reserve_exact(words)
            .map_err(|_| Error::OutOfMemory)?;
        self.eep_buf.resize(words, 0);
        self.eep_len = 0;

        let unpacked = map.unpacked_size();
        self.unpacked = Vec::new();
        self.unpacked
            .try_reserve_exact(unpacked)
            .map_err(|_| Error::OutOfMemory)?;
        self.unpacked.resize(unpacked, 0);
        self.unpacked_len = 0;

        Ok(())
    }

    /// Select EEPROM/OTP access paths: connector-provided ops win, then the
    /// chip revision picks the register-level state machine.
    pub fn setup_io(&mut self) {
        if self.con.has_eep() {
            log::debug!("EEPROM access ops: use connector's ops");
            self.eep_access = EepAccess::Connector;
        } else if self.con.caps() & CON_CAP_HW != 0 {
            self.eep_access = self.hw_pick_eep_access();
        }

        if self.con.has_otp() {
            log::debug!("OTP access ops: use connector's ops");
            self.otp_access = OtpAccess::Connector;
        } else if self.con.caps() & CON_CAP_HW != 0 {
            self.otp_access = self.hw_pick_otp_access();
        }
    }

    pub fn has_eep(&self) -> bool {
        self.eep_access != EepAccess::None
    }

    pub fn has_otp(&self) -> bool {
        self.otp_access != OtpAccess::None
    }

    /// Read one EEPROM word with byteswap compensation applied.
    pub fn eep_read(&mut self, off: u32) -> Result<u16> {
        let word = match self.eep_access {
            EepAccess::Connector => self.con.eep_read(off)?,
            EepAccess::Hw9xxx => self.hw_eeprom_read_9xxx(off)?,
            EepAccess::Hw5211 => self.hw_eeprom_read_5211(off)?,
            EepAccess::None => return Err(Error::not_supported("EEPROM access")),
        };

        Ok(if self.io_swap { word.swap_bytes() } else { word })
    }

    /// Write one EEPROM word with byteswap compensation applied.
    pub fn eep_write(&mut self, off: u32, data: u16) -> Result<()> {
        let data = if self.io_swap { data.swap_bytes() } else { data };

        match self.eep_access {
            EepAccess::Connector => self.con.eep_write(off, data),
            EepAccess::Hw9xxx => self.hw_eeprom_write_9xxx(off, data),
            EepAccess::Hw5211 => self.hw_eeprom_write_5211(off, data),
            EepAccess::None => Err(Error::not_supported("EEPROM access")),
        }
    }

    pub fn otp_read(&mut self, off: u32) -> Result<u8> {
        match self.otp_access {
            OtpAccess::Connector => self.con.otp_read(off),
            OtpAccess::Hw93xx => self.hw_otp_read_93xx(off),
            OtpAccess::Hw988x => self.hw_otp_read_988x(off),
            OtpAccess::None => Err(Error::not_supported("OTP access")),
        }
    }

    pub fn otp_enable(&mut self, enable: bool) -> Result<()> {
        match self.otp_access {
            OtpAccess::Connector => self.con.otp_enable(enable),
            OtpAccess::Hw988x => self.hw_otp_enable_988x(enable),
            _ => Ok(()),
        }
    }

    /// Fill the word buffer with `words` EEPROM words starting from zero,
    /// fetching only the portion not already buffered.
    pub fn fill_eep_buf(&mut self, words: usize) -> Result<()> {
        if words > self.eep_buf.len() {
            return Err(Error::integrity(format!(
                "EEPROM read of {} words exceeds the {}-word buffer",
                words,
                self.eep_buf.len()
            )));
        }
        for addr in self.eep_len..words {
            let word = self.eep_read(addr as u32)?;
            self.eep_buf[addr] = word;
        }
        if words > self.eep_len {
            self.eep_len = words;
        }
        Ok(())
    }

    /// Fill the word buffer (viewed as octets) with `bytes` OTP octets,
    /// fetching only the unbuffered tail.
    pub fn fill_otp_buf(&mut self, bytes: usize) -> Result<()> {
        let size = (bytes + 1) & !1; // 16-bit alignment
        if size / 2 > self.eep_buf.len() {
            return Err(Error::integrity(format!(
                "OTP read of {} bytes exceeds the buffer",
                bytes
            )));
        }
        for addr in self.eep_len * 2..size {
            let octet = self.otp_read(addr as u32)?;
            let word = &mut self.eep_buf[addr / 2];
            if addr % 2 == 0 {
                *word = (*word & 0xff00) | u16::from(octet);
            } else {
                *word = (*word & 0x00ff) | (u16::from(octet) << 8);
            }
        }
        if size / 2 > self.eep_len {
            self.eep_len = size / 2;
        }
        Ok(())
    }
}

/// What kind of contents an action needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Parsed data: blob, then EEPROM, then OTP; `check` afterwards.
    Normal,
    /// Raw EEPROM contents only, no structural validation.
    RawEep,
    /// Raw OTP contents only, no structural validation.
    RawOtp,
    /// Raw contents from either memory type.
    RawAny,
}

impl LoadMode {
    fn wants_raw_eep(self) -> bool {
        matches!(self, LoadMode::RawEep | LoadMode::RawAny)
    }

    fn wants_raw_otp(self) -> bool {
        matches!(self, LoadMode::RawOtp | LoadMode::RawAny)
    }

    pub fn is_raw(self) -> bool {
        !matches!(self, LoadMode::Normal)
    }
}

/// Try data sources in fixed priority order, stopping at the first that
/// yields data; validate the result unless the caller asked for raw
/// contents.
pub fn load(session: &mut Session, map: &mut dyn EepMap, mode: LoadMode) -> Result<()> {
    session.alloc_buffers(map)?;

    let mut tries = 0;

    if mode.is_raw() {
        if mode.wants_raw_eep() && map.features().raw_eep && session.has_eep() {
            tries += 1;
            log::debug!("Try to load RAW EEPROM data");
            if map.load_eeprom(session, true).is_ok() {
                return Ok(());
            }
        }
        if mode.wants_raw_otp() && map.features().raw_otp && session.has_otp() {
            tries += 1;
            log::debug!("Try to load RAW OTP data");
            if map.load_otp(session, true).is_ok() {
                return Ok(());
            }
        }
        return Err(no_data(tries));
    }

    if session.con.has_blob() && map.provides(Op::LoadBlob) {
        tries += 1;
        log::debug!("Try to load data from blob");
        if map.load_blob(session).is_ok() {
            return check_after_load(session, map);
        }
    }
    if session.has_eep() && map.provides(Op::LoadEeprom) {
        tries += 1;
        log::debug!("Try to load data from EEPROM");
        if map.load_eeprom(session, false).is_ok() {
            return check_after_load(session, map);
        }
    }
    if session.has_otp() && map.provides(Op::LoadOtp) {
        tries += 1;
        log::debug!("Try to load data from OTP memory");
        if map.load_otp(session, false).is_ok() {
            return check_after_load(session, map);
        }
    }

    Err(no_data(tries))
}

fn no_data(tries: u32) -> Error {
    if tries > 0 {
        Error::not_found("unable to load data from any sources".to_string())
    } else {
        Error::invalid_argument("no suitable data source available via configured connector")
    }
}

fn check_after_load(session: &mut Session, map: &mut dyn EepMap) -> Result<()> {
    map.check(session)
        .map_err(|e| Error::integrity(format!("EEPROM check failed: {}", e)))
}

/// Run a parameter update with the write-protect GPIO unlocked around it.
/// The protection is always re-engaged, error or not.
pub fn update(session: &mut Session, map: &mut dyn EepMap, param: &UpdateParam) -> Result<()> {
    if !map.provides(Op::Update) {
        return Err(Error::not_supported(format!(
            "{} EEPROM map does not support content updating",
            map.name()
        )));
    }
    if !map.supports_param(param) {
        return Err(Error::not_supported(format!(
            "{} EEPROM map does not support parameter -- {}",
            map.name(),
            param.name()
        )));
    }

    session.eep_lock(false);
    let res = map.update(session, param);
    session.eep_lock(true);

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StubConnector;

    #[test]
    fn test_eep_read_applies_io_swap() {
        struct OneWord;
        impl crate::source::Connector for OneWord {
            fn name(&self) -> &'static str {
                "test"
            }
            fn has_eep(&self) -> bool {
                true
            }
            fn eep_read(&mut self, _off: u32) -> crate::error::Result<u16> {
                Ok(0x5aa5)
            }
        }

        let mut con = OneWord;
        let mut s = Session::new(&mut con);
        s.eep_access = EepAccess::Connector;
        assert_eq!(s.eep_read(0).unwrap(), 0x5aa5);
        s.io_swap = true;
        assert_eq!(s.eep_read(0).unwrap(), 0xa55a);
    }

    #[test]
    fn test_fill_otp_buf_packs_octets_into_words() {
        struct Counting;
        impl crate::source::Connector for Counting {
            fn name(&self) -> &'static str {
                "test"
            }
            fn has_otp(&self) -> bool {
                true
            }
            fn otp_read(&mut self, off: u32) -> crate::error::Result<u8> {
                Ok(off as u8)
            }
        }

        let mut con = Counting;
        let mut s = Session::new(&mut con);
        s.otp_access = OtpAccess::Connector;
        s.eep_buf = vec![0; 4];
        s.fill_otp_buf(6).unwrap();
        assert_eq!(s.eep_len, 3);
        assert_eq!(s.eep_buf[0], 0x0100);
        assert_eq!(s.eep_buf[1], 0x0302);
        assert_eq!(s.eep_buf[2], 0x0504);
    }

    #[test]
    fn test_load_without_sources_is_invalid_argument() {
        let mut con = StubConnector;
        let mut s = Session::new(&mut con);
        let mut map = crate::eep::Family::A5416.create();
        let err = load(&mut s, map.as_mut(), LoadMode::Normal).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Data-source connectors.
//!
//! A connector is whatever sits between the tool and the calibration data:
//! a dump file, a memory-mapped chip, nothing at all. The trait carries the
//! full capability set the loader consumes; every access is optional and
//! defaults to `NotSupported`, callers check [`Connector::caps`] and the
//! `has_*` probes before invoking.

mod file;
mod mem;
mod stub;

pub use file::FileConnector;
pub use mem::MemConnector;
pub use stub::StubConnector;

use crate::error::{Error, Result};

/// Connector is able to interact with the hardware.
pub const CON_CAP_HW: u32 = 1 << 0;
/// Connector is able to autodetect the EEPROM layout (plug-and-play).
pub const CON_CAP_PNP: u32 = 1 << 1;

pub trait Connector {
    fn name(&self) -> &'static str;

    fn caps(&self) -> u32 {
        0
    }

    fn has_regs(&self) -> bool {
        false
    }
    fn has_eep(&self) -> bool {
        false
    }
    fn has_otp(&self) -> bool {
        false
    }
    fn has_blob(&self) -> bool {
        false
    }

    fn reg_read(&mut self, _reg: u32) -> Result<u32> {
        Err(Error::not_supported(format!(
            "{}: direct register access",
            self.name()
        )))
    }

    fn reg_write(&mut self, _reg: u32, _val: u32) -> Result<()> {
        Err(Error::not_supported(format!(
            "{}: direct register write",
            self.name()
        )))
    }

    fn reg_rmw(&mut self, reg: u32, set: u32, clr: u32) -> Result<()> {
        let val = self.reg_read(reg)?;
        self.reg_write(reg, (val & !clr) | set)
    }

    /// Read a 16-bit word at a word offset. No byteswap compensation at
    /// this level; the session applies `io_swap` on top.
    fn eep_read(&mut self, _off: u32) -> Result<u16> {
        Err(Error::not_supported(format!("{}: EEPROM read", self.name())))
    }

    fn eep_write(&mut self, _off: u32, _data: u16) -> Result<()> {
        Err(Error::not_supported(format!(
            "{}: EEPROM write",
            self.name()
        )))
    }

    fn otp_read(&mut self, _off: u32) -> Result<u8> {
        Err(Error::not_supported(format!("{}: OTP read", self.name())))
    }

    fn otp_enable(&mut self, _enable: bool) -> Result<()> {
        Ok(())
    }

    fn blob_size(&mut self) -> Result<usize> {
        Err(Error::not_supported(format!("{}: blob size", self.name())))
    }

    /// Read up to `buf.len()` octets of the raw dump from its beginning;
    /// returns the number of octets read.
    fn blob_read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::not_supported(format!("{}: blob read", self.name())))
    }
}

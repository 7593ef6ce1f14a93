// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! `/dev/mem` connector: maps the chip I/O window into the process and
//! serves register accesses from it. EEPROM/OTP access then goes through
//! the register-level state machines of the hw layer.

use std::ffi::CString;

use crate::error::{Error, Result};
use crate::source::{Connector, CON_CAP_HW};

/// Mapped I/O window size.
const MEM_MAP_SIZE: usize = 0x10000;

pub struct MemConnector {
    fd: libc::c_int,
    map: *mut libc::c_void,
    io_addr: u64,
}

impl MemConnector {
    /// Map the device I/O memory starting at `io_addr`.
    pub fn open(io_addr: u64) -> Result<Self> {
        if io_addr == 0 || io_addr % 4 != 0 {
            return Err(Error::invalid_argument(format!(
                "conmem: invalid I/O memory start address -- 0x{:x}",
                io_addr
            )));
        }

        let path = CString::new("/dev/mem").expect("static path");
        // SAFETY: plain open(2) on a constant path.
        let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR) };
        if fd < 0 {
            return Err(Error::io(format!(
                "conmem: opening /dev/mem failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        // SAFETY: mapping a file-backed region we own the fd of; failure is
        // checked against MAP_FAILED before use.
        let map = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                MEM_MAP_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                io_addr as libc::off_t,
            )
        };
        if map == libc::MAP_FAILED {
            let err = std::io::Error::last_os_error();
            // SAFETY: fd is open and owned by us.
            unsafe { libc::close(fd) };
            return Err(Error::io(format!(
                "conmem: mmap of device at 0x{:08x} for 0x{:08x} bytes failed: {}",
                io_addr, MEM_MAP_SIZE, err
            )));
        }

        Ok(Self { fd, map, io_addr })
    }

    fn reg_ptr(&self, reg: u32) -> Result<*mut u32> {
        if reg as usize + 4 > MEM_MAP_SIZE {
            return Err(Error::invalid_argument(format!(
                "conmem: register 0x{:08x} outside the mapped window",
                reg
            )));
        }
        // SAFETY: offset checked against the mapping size above.
        Ok(unsafe { self.map.cast::<u8>().add(reg as usize).cast::<u32>() })
    }
}

impl Connector for MemConnector {
    fn name(&self) -> &'static str {
        "Mem"
    }

    fn caps(&self) -> u32 {
        CON_CAP_HW
    }

    fn has_regs(&self) -> bool {
        true
    }

    fn reg_read(&mut self, reg: u32) -> Result<u32> {
        let ptr = self.reg_ptr(reg)?;
        // SAFETY: in-bounds pointer into a live MAP_SHARED mapping.
        Ok(unsafe { std::ptr::read_volatile(ptr) })
    }

    fn reg_write(&mut self, reg: u32, val: u32) -> Result<()> {
        let ptr = self.reg_ptr(reg)?;
        // SAFETY: in-bounds pointer into a live MAP_SHARED mapping.
        unsafe { std::ptr::write_volatile(ptr, val) };
        Ok(())
    }
}

impl Drop for MemConnector {
    fn drop(&mut self) {
        // SAFETY: the mapping and fd are owned by this connector and not
        // used after drop.
        unsafe {
            libc::munmap(self.map, MEM_MAP_SIZE);
            libc::close(self.fd);
        }
        log::debug!("conmem: unmapped device at 0x{:08x}", self.io_addr);
    }
}

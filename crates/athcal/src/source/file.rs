// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Dump-file connector.
//!
//! Serves a calibration dump from a regular file while emulating the
//! address behaviour of a real part: reads wrap at the emulated IC size
//! (rounded up to a power of two, at least 2 KB) and the area past the
//! file's end reads as erased (`0xFFFF` words, `0x00` OTP octets).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::source::Connector;

pub struct FileConnector {
    file: File,
    data_len: u32,
    ic_sz: u32,
}

fn roundup_pow_of_2(v: u32) -> u32 {
    let mut v = v.wrapping_sub(1);
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v.wrapping_add(1)
}

impl FileConnector {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::io(format!("can not open dump file '{}': {}", path.display(), e)))?;

        let len = file.metadata().map(|m| m.len()).unwrap_or(0) as u32;
        let data_len = len & !1; // align to 16 bit
        let mut ic_sz = roundup_pow_of_2(data_len);
        if ic_sz < 0x0800 {
            ic_sz = 0x0800; // do not emulate too small ICs
        }

        log::info!(
            "confile: file data length is 0x{:04x} ({}) bytes, emulate 0x{:04x} bytes ({} KB) EEPROM IC",
            len,
            len,
            ic_sz,
            ic_sz / 1024
        );

        Ok(Self {
            file,
            data_len,
            ic_sz,
        })
    }
}

impl Connector for FileConnector {
    fn name(&self) -> &'static str {
        "File"
    }

    fn has_eep(&self) -> bool {
        true
    }

    fn has_otp(&self) -> bool {
        true
    }

    fn has_blob(&self) -> bool {
        true
    }

    fn eep_read(&mut self, off: u32) -> Result<u16> {
        let pos = (off * 2) % self.ic_sz; // emulate address wrap

        if pos >= self.data_len {
            return Ok(0xffff); // emulate empty area
        }

        self.file.seek(SeekFrom::Start(u64::from(pos)))?;
        let mut word = [0u8; 2];
        self.file.read_exact(&mut word)?;

        // NB: raw file octet order, the session io_swap compensates
        Ok(u16::from_le_bytes(word))
    }

    fn eep_write(&mut self, off: u32, data: u16) -> Result<()> {
        let pos = (off * 2) % self.ic_sz;

        if pos >= self.data_len {
            // Fill the gap between the data end and the writing position
            self.file.seek(SeekFrom::Start(u64::from(self.data_len)))?;
            let mut addr = self.data_len;
            while addr < pos {
                self.file.write_all(&[0xff, 0xff])?;
                addr += 2;
            }
            self.data_len = pos + 2;
        } else {
            self.file.seek(SeekFrom::Start(u64::from(pos)))?;
        }

        self.file.write_all(&data.to_le_bytes())?;
        Ok(())
    }

    fn otp_read(&mut self, off: u32) -> Result<u8> {
        if off >= self.data_len {
            return Ok(0x00); // emulate empty area
        }

        self.file.seek(SeekFrom::Start(u64::from(off)))?;
        let mut octet = [0u8; 1];
        self.file.read_exact(&mut octet)?;
        Ok(octet[0])
    }

    fn blob_size(&mut self) -> Result<usize> {
        Ok(self.data_len as usize)
    }

    fn blob_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut read = 0;
        while read < buf.len() {
            let n = self.file.read(&mut buf[read..])?;
            if n == 0 {
                break;
            }
            read += n;
        }
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn dump_with(bytes: &[u8]) -> (tempfile::NamedTempFile, FileConnector) {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        let con = FileConnector::open(f.path()).unwrap();
        (f, con)
    }

    #[test]
    fn test_word_read_little_endian() {
        let (_f, mut con) = dump_with(&[0x5a, 0xa5, 0x34, 0x12]);
        assert_eq!(con.eep_read(0).unwrap(), 0xa55a);
        assert_eq!(con.eep_read(1).unwrap(), 0x1234);
    }

    #[test]
    fn test_empty_area_reads_erased() {
        let (_f, mut con) = dump_with(&[0x00; 16]);
        assert_eq!(con.eep_read(100).unwrap(), 0xffff);
        assert_eq!(con.otp_read(100).unwrap(), 0x00);
    }

    #[test]
    fn test_address_wrap_emulation() {
        let (_f, mut con) = dump_with(&[0xaa; 0x800]);
        // IC size is 0x800 bytes = 0x400 words; word 0x400 wraps to word 0.
        assert_eq!(con.eep_read(0x400).unwrap(), con.eep_read(0).unwrap());
    }

    #[test]
    fn test_write_extends_file_with_erased_fill() {
        let (f, mut con) = dump_with(&[0x11, 0x11]);
        con.eep_write(3, 0xbeef).unwrap();
        let data = std::fs::read(f.path()).unwrap();
        assert_eq!(&data[2..6], &[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(&data[6..8], &0xbeefu16.to_le_bytes());
        assert_eq!(con.eep_read(3).unwrap(), 0xbeef);
    }

    #[test]
    fn test_blob_read() {
        let (_f, mut con) = dump_with(b"blobdata");
        assert_eq!(con.blob_size().unwrap(), 8);
        let mut buf = [0u8; 8];
        assert_eq!(con.blob_read(&mut buf).unwrap(), 8);
        assert_eq!(&buf, b"blobdata");
    }
}

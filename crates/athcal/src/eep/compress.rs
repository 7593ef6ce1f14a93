// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Template + delta decompression for the compressed calibration chains
//! used by the AR93xx and QCA988x generations.
//!
//! Calibration blocks are stored as a chain of records. Each record is a
//! 4-octet header, `len` octets of payload and a 2-octet checksum:
//!
//! ```text
//! bits[0..3]  comp   compression type
//! bits[3..9]  ref    reference template id
//! bits[9..19] len    payload length, octets
//! bits[19..23] maj
//! bits[24..32] min
//! ```
//!
//! `NONE` records carry a full image; `BLOCK` records carry a patch stream
//! `{offset, length, bytes…}*` applied over a template selected by `ref`.
//! The template seeds the output buffer once per `ref`; further `BLOCK`
//! records with the same `ref` patch the output incrementally.

use crate::error::{Error, Result};

pub const COMP_HDR_LEN: usize = 4;
pub const COMP_CKSUM_LEN: usize = 2;

/// Compression type codes of the record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Lzma,
    Pairs,
    Block,
    Unknown(u8),
}

impl From<u8> for Compression {
    fn from(v: u8) -> Self {
        match v {
            0 => Compression::None,
            1 => Compression::Lzma,
            2 => Compression::Pairs,
            3 => Compression::Block,
            other => Compression::Unknown(other),
        }
    }
}

/// Unpacked compressed-record header.
#[derive(Debug, Clone, Copy)]
pub struct CompHdr {
    pub comp: Compression,
    pub reference: u8,
    pub len: usize,
    pub maj: u8,
    pub min: u8,
}

/// Unpack the 4-octet record header.
pub fn comp_hdr_unpack(p: &[u8]) -> CompHdr {
    let v = [
        u32::from(p[0]),
        u32::from(p[1]),
        u32::from(p[2]),
        u32::from(p[3]),
    ];

    CompHdr {
        comp: Compression::from(((v[0] >> 5) & 0x0007) as u8),
        reference: ((v[0] & 0x001f) | ((v[1] >> 2) & 0x0020)) as u8,
        len: (((v[1] << 4) & 0x07f0) | ((v[2] >> 4) & 0x000f)) as usize,
        maj: (v[2] & 0x000f) as u8,
        min: (v[3] & 0x00ff) as u8,
    }
}

/// Plain 16-bit sum of the payload octets modulo 0x10000.
pub fn comp_checksum(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u32, |acc, &b| (acc + u32::from(b)) & 0xffff) as u16
}

/// A factory calibration template: a full default image keyed by the small
/// integer id that `BLOCK` record headers reference.
pub struct Template {
    pub id: u8,
    pub name: &'static str,
    pub image: fn() -> Vec<u8>,
}

impl Template {
    pub fn find<'t>(templates: &'t [Template], id: u8) -> Option<&'t Template> {
        templates.iter().find(|t| t.id == id)
    }

    pub fn find_by_name<'t>(templates: &'t [Template], name: &str) -> Option<&'t Template> {
        templates.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

/// Apply a `BLOCK` patch stream over `out`.
///
/// The patch cursor advances by each patch `offset`, then `length` bytes
/// are written and the cursor moves past them. The cursor must stay inside
/// `out` for every patch, otherwise the record is rejected.
fn uncompress_block(out: &mut [u8], input: &[u8]) -> Result<()> {
    let out_size = out.len();
    let mut spot = 0usize;
    let mut it = 0usize;

    while it + 2 <= input.len() {
        let offset = usize::from(input[it]);
        let length = usize::from(input[it + 1]);
        spot += offset;

        if length > 0 {
            if spot + length > out_size || it + 2 + length > input.len() {
                return Err(Error::integrity(format!(
                    "bad restore at {}: spot={} offset={} length={}",
                    it, spot, offset, length
                )));
            }
            log::debug!(
                "Restore at {}: spot={} offset={} length={}",
                it,
                spot,
                offset,
                length
            );
            out[spot..spot + length].copy_from_slice(&input[it + 2..it + 2 + length]);
            spot += length;
        }

        it += length + 2;
    }

    Ok(())
}

/// Stateful record-to-image assembler. Owns the current reference template
/// id so a chain of `BLOCK` records over one `ref` patches incrementally.
pub struct Assembler<'t> {
    templates: &'t [Template],
    curr_ref: Option<u8>,
}

impl<'t> Assembler<'t> {
    pub fn new(templates: &'t [Template]) -> Self {
        Self {
            templates,
            curr_ref: None,
        }
    }

    /// Reset the reference template, e.g. before scanning a new chain.
    pub fn reset(&mut self) {
        self.curr_ref = None;
    }

    /// Decompress one validated record into `out`.
    pub fn apply(&mut self, it: usize, hdr: &CompHdr, payload: &[u8], out: &mut [u8]) -> Result<()> {
        match hdr.comp {
            Compression::None => {
                if hdr.len != out.len() {
                    return Err(Error::integrity(format!(
                        "EEPROM structure size mismatch memory={} eeprom={}",
                        out.len(),
                        hdr.len
                    )));
                }
                out.copy_from_slice(&payload[..hdr.len]);
                log::debug!("restored eeprom {}: uncompressed, length {}", it, hdr.len);
                Ok(())
            }
            Compression::Block => {
                if self.curr_ref != Some(hdr.reference) {
                    let tpl = Template::find(self.templates, hdr.reference).ok_or_else(|| {
                        Error::integrity(format!(
                            "can't find reference eeprom struct {}",
                            hdr.reference
                        ))
                    })?;
                    let image = (tpl.image)();
                    if image.len() != out.len() {
                        return Err(Error::integrity(format!(
                            "template {} size mismatch memory={} template={}",
                            tpl.name,
                            out.len(),
                            image.len()
                        )));
                    }
                    out.copy_from_slice(&image);
                    self.curr_ref = Some(hdr.reference);
                }
                log::debug!(
                    "Restore eeprom {}: block, reference {}, length {}",
                    it,
                    hdr.reference,
                    hdr.len
                );
                uncompress_block(out, &payload[..hdr.len])
            }
            other => Err(Error::integrity(format!(
                "unknown compression code {:?}",
                other
            ))),
        }
    }
}

/// Pack a record header; the scanning direction of [`comp_hdr_unpack`]
/// reversed. Used by the canonical serialiser and the tests.
pub fn comp_hdr_pack(hdr: &CompHdr) -> [u8; 4] {
    let comp = match hdr.comp {
        Compression::None => 0u32,
        Compression::Lzma => 1,
        Compression::Pairs => 2,
        Compression::Block => 3,
        Compression::Unknown(v) => u32::from(v),
    };
    let reference = u32::from(hdr.reference);
    let len = hdr.len as u32;

    [
        ((comp << 5) | (reference & 0x1f)) as u8,
        (((reference & 0x20) << 2) | ((len >> 4) & 0x7f)) as u8,
        (((len & 0x0f) << 4) | u32::from(hdr.maj & 0x0f)) as u8,
        hdr.min,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hdr_pack_unpack_roundtrip() {
        let hdr = CompHdr {
            comp: Compression::Block,
            reference: 6,
            len: 24,
            maj: 0,
            min: 0,
        };
        let packed = comp_hdr_pack(&hdr);
        let got = comp_hdr_unpack(&packed);
        assert_eq!(got.comp, Compression::Block);
        assert_eq!(got.reference, 6);
        assert_eq!(got.len, 24);
        assert_eq!(got.maj, 0);
        assert_eq!(got.min, 0);
    }

    #[test]
    fn test_hdr_unpack_wide_fields() {
        // ref uses its 6th bit, len its full 10-bit range
        let hdr = CompHdr {
            comp: Compression::None,
            reference: 0x2a,
            len: 0x3f5,
            maj: 0xb,
            min: 0x7e,
        };
        let got = comp_hdr_unpack(&comp_hdr_pack(&hdr));
        assert_eq!(got.reference, 0x2a);
        assert_eq!(got.len, 0x3f5);
        assert_eq!(got.maj, 0xb);
        assert_eq!(got.min, 0x7e);
    }

    #[test]
    fn test_comp_checksum_wraps() {
        let data = vec![0xffu8; 0x400];
        assert_eq!(comp_checksum(&data), ((0x400u32 * 0xff) & 0xffff) as u16);
    }

    fn tiny_templates() -> &'static [Template] {
        static T: [Template; 1] = [Template {
            id: 6,
            name: "tiny",
            image: || vec![0xAA; 32],
        }];
        &T
    }

    #[test]
    fn test_block_patches_template() {
        let mut out = vec![0u8; 32];
        let mut asm = Assembler::new(tiny_templates());
        // offset 3, write 6 bytes
        let payload = [3u8, 6, 1, 2, 3, 4, 5, 6];
        let hdr = CompHdr {
            comp: Compression::Block,
            reference: 6,
            len: payload.len(),
            maj: 0,
            min: 0,
        };
        asm.apply(0, &hdr, &payload, &mut out).unwrap();
        assert_eq!(&out[..3], &[0xAA; 3]);
        assert_eq!(&out[3..9], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&out[9..], &[0xAA; 23]);
    }

    #[test]
    fn test_second_block_same_ref_does_not_reseed() {
        let mut out = vec![0u8; 32];
        let mut asm = Assembler::new(tiny_templates());
        let p1 = [3u8, 2, 0x11, 0x22];
        let hdr1 = CompHdr {
            comp: Compression::Block,
            reference: 6,
            len: p1.len(),
            maj: 0,
            min: 0,
        };
        asm.apply(0, &hdr1, &p1, &mut out).unwrap();
        // Second record patches bytes 10.. without reverting bytes 3..5.
        let p2 = [5u8, 1, 0x33];
        let hdr2 = CompHdr {
            comp: Compression::Block,
            reference: 6,
            len: p2.len(),
            maj: 0,
            min: 0,
        };
        asm.apply(1, &hdr2, &p2, &mut out).unwrap();
        assert_eq!(out[3], 0x11);
        assert_eq!(out[4], 0x22);
        assert_eq!(out[10], 0x33);
    }

    #[test]
    fn test_block_cursor_out_of_range_rejected() {
        let mut out = vec![0u8; 32];
        let mut asm = Assembler::new(tiny_templates());
        let payload = [30u8, 6, 1, 2, 3, 4, 5, 6];
        let hdr = CompHdr {
            comp: Compression::Block,
            reference: 6,
            len: payload.len(),
            maj: 0,
            min: 0,
        };
        let res = asm.apply(0, &hdr, &payload, &mut out);
        assert!(matches!(res, Err(crate::error::Error::Integrity { .. })));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let mut out = vec![0u8; 32];
        let mut asm = Assembler::new(tiny_templates());
        let payload = [0u8, 1, 0x77];
        let hdr = CompHdr {
            comp: Compression::Block,
            reference: 13,
            len: payload.len(),
            maj: 0,
            min: 0,
        };
        assert!(asm.apply(0, &hdr, &payload, &mut out).is_err());
    }

    #[test]
    fn test_none_record_length_must_match() {
        let mut out = vec![0u8; 32];
        let mut asm = Assembler::new(tiny_templates());
        let payload = vec![0x55u8; 16];
        let hdr = CompHdr {
            comp: Compression::None,
            reference: 0,
            len: 16,
            maj: 0,
            min: 0,
        };
        assert!(asm.apply(0, &hdr, &payload, &mut out).is_err());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Constants and helpers shared by all EEPROM map generations.

use crate::error::{Error, Result};
use crate::loader::Session;

/// Magic word value after little-endian normalisation.
pub const AR5416_EEPROM_MAGIC: u16 = 0xa55a;
/// Word offset of the magic in 5416-era images.
pub const AR5416_EEPROM_MAGIC_OFFSET: u32 = 0x0;

pub const AR5416_EEP_VER: u16 = 0xE;
pub const AR5416_EEP_NO_BACK_VER: u16 = 0x1;

pub const AR5416_OPFLAGS_11A: u8 = 0x01;
pub const AR5416_OPFLAGS_11G: u8 = 0x02;
pub const AR5416_OPFLAGS_N_5G_HT40: u8 = 0x04;
pub const AR5416_OPFLAGS_N_2G_HT40: u8 = 0x08;
pub const AR5416_OPFLAGS_N_5G_HT20: u8 = 0x10;
pub const AR5416_OPFLAGS_N_2G_HT20: u8 = 0x20;

pub const AR5416_EEPMISC_BIG_ENDIAN: u8 = 0x01;

pub const AR5416_RFSILENT_ENABLED: u16 = 0x0001;
pub const AR5416_RFSILENT_POLARITY: u16 = 0x0002;
pub const AR5416_RFSILENT_GPIO_SEL: u16 = 0x001c;
pub const AR5416_RFSILENT_GPIO_SEL_S: u16 = 2;

pub const AR5416_EEP_MINOR_VER_3: u16 = 0x3;
pub const AR5416_EEP_MINOR_VER_17: u16 = 0x11;
pub const AR5416_EEP_MINOR_VER_19: u16 = 0x13;
pub const AR5416_EEP_MINOR_VER_21: u16 = 0x15;

pub const AR5416_EEPROM_MODAL_SPURS: usize = 5;
pub const AR5416_NUM_PD_GAINS: usize = 4;
pub const AR5416_PD_GAIN_ICEPTS: usize = 5;
/// Sentinel for unused 2 GHz/5 GHz frequency-bin slots.
pub const AR5416_BCHAN_UNUSED: u8 = 0xff;

pub const AR5416_PWR_TABLE_OFFSET_DB: i32 = -5;

pub const NUM_TARGET_POWER_RATES_LEG: usize = 4;
pub const NUM_TARGET_POWER_RATES_HT: usize = 8;

pub const DEVICE_TYPE_NAMES: [&str; 8] = [
    "UNKNOWN [0]",
    "Cardbus",
    "PCI",
    "MiniPCI",
    "Access Point",
    "PCIExpress",
    "UNKNOWN [6]",
    "UNKNOWN [7]",
];

pub const ACCESS_TYPE_NAMES: [&str; 4] = ["ReadWrite", "WriteOnly", "ReadOnly", "NoAccess"];

pub const RATES_CCK: [&str; NUM_TARGET_POWER_RATES_LEG] =
    ["1 mbps", "2 mbps", "5.5 mbps", "11 mbps"];

pub const RATES_OFDM: [&str; NUM_TARGET_POWER_RATES_LEG] =
    ["6-24 mbps", "36 mbps", "48 mbps", "54 mbps"];

pub const RATES_HT: [&str; NUM_TARGET_POWER_RATES_HT] = [
    "MCS 0/8", "MCS 1/9", "MCS 2/10", "MCS 3/11", "MCS 4/12", "MCS 5/13", "MCS 6/14", "MCS 7/15",
];

pub const CTL_DOMAIN_NAMES: [&str; 16] = [
    "Unknown (0)",
    "FCC",
    "Unknown (2)",
    "ETSI",
    "MKK",
    "Unknown (5)",
    "Unknown (6)",
    "Unknown (7)",
    "Unknown (8)",
    "Unknown (9)",
    "Unknown (10)",
    "Unknown (11)",
    "Unknown (12)",
    "Unknown (13)",
    "SD no ctl",
    "No ctl",
];

pub const CTL_MODE_NAMES: [&str; 16] = [
    "5GHz OFDM",
    "2GHz CCK",
    "2GHz OFDM",
    "5GHz Turbo",
    "2GHz Turbo",
    "2GHz HT20",
    "5GHz HT20",
    "2GHz HT40",
    "5GHz HT40",
    "5GHz VHT20",
    "2GHz VHT20",
    "5GHz VHT40",
    "2GHz VHT40",
    "5GHz VHT80",
    "Unknown (14)",
    "Unknown (15)",
];

/// Does a CTL mode code address the 2 GHz band?
pub fn ctl_mode_is_2g(mode: u8) -> bool {
    CTL_MODE_NAMES[usize::from(mode & 0x0f)].starts_with('2')
}

pub fn ctl_edge_power(ctl: u8) -> u8 {
    ctl & 0x3f
}

pub fn ctl_edge_flags(ctl: u8) -> u8 {
    (ctl & 0xc0) >> 6
}

pub fn ctl_pack(tpower: u8, flags: u8) -> u8 {
    (tpower & 0x3f) | (flags << 6)
}

/// Channel centre frequency to the compact frequency-bin coding.
pub fn freq2fbin(freq: u32, is_2g: bool) -> u8 {
    if is_2g {
        (freq - 2300) as u8
    } else {
        ((freq - 4800) / 5) as u8
    }
}

/// Compact frequency-bin coding back to a centre frequency in MHz.
pub fn fbin2freq(fbin: u8, is_2g: bool) -> u32 {
    if is_2g {
        u32::from(fbin) + 2300
    } else {
        u32::from(fbin) * 5 + 4800
    }
}

/// Pre-calibration init area of the 5416-era EEPROM head: magic, access
/// protection, register-init pointer and the register-init records.
#[derive(Debug, Clone, Default)]
pub struct EepInit {
    pub magic: u16,
    pub prot: u16,
    pub iptr: u16,
    pub regs: Vec<crate::eep::render::RegInit>,
}

impl EepInit {
    /// Decode the init words (everything before the data start location).
    /// `swap` byte-reverses every word first, for images whose declared
    /// endianness is big.
    pub fn parse(words: &[u16], swap: bool) -> EepInit {
        let w = |i: usize| {
            let v = words.get(i).copied().unwrap_or(0xffff);
            if swap {
                v.swap_bytes()
            } else {
                v
            }
        };

        let mut regs = Vec::new();
        let mut i = 3;
        while i + 2 < words.len() {
            let addr = w(i);
            if addr == 0xffff {
                break;
            }
            regs.push(crate::eep::render::RegInit {
                addr,
                val_low: w(i + 1),
                val_high: w(i + 2),
            });
            i += 3;
        }

        EepInit {
            magic: w(0),
            prot: w(1),
            iptr: w(2),
            regs,
        }
    }
}

/// Per-band spur channel descriptor of the 5416-era modal headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpurChan {
    pub spur_chan: u16,
    pub range_low: u8,
    pub range_high: u8,
}

/// XOR-fold of 16-bit words; a valid payload folds to `0xFFFF`.
pub fn calc_csum(words: &[u16]) -> u16 {
    words.iter().fold(0u16, |acc, w| acc ^ w)
}

/// XOR-fold over the words of a little-endian byte image.
pub fn calc_csum_bytes(image: &[u8]) -> u16 {
    let mut csum = 0u16;
    let mut it = image.chunks_exact(2);
    for pair in &mut it {
        csum ^= u16::from_le_bytes([pair[0], pair[1]]);
    }
    if let [last] = it.remainder() {
        csum ^= u16::from(*last);
    }
    csum
}

/// Rewrite the checksum slot of a byte image so the XOR-fold of the whole
/// image equals `0xFFFF`. `csum_off` is the byte offset of the 16-bit
/// checksum field.
pub fn fixup_csum_bytes(image: &mut [u8], csum_off: usize) {
    image[csum_off] = 0xff;
    image[csum_off + 1] = 0xff;
    let sum = calc_csum_bytes(image);
    image[csum_off..csum_off + 2].copy_from_slice(&sum.to_le_bytes());
}

/// Detect possible EEPROM I/O byteswapping and toggle the I/O byteswap
/// compensation when required, so that subsequent reads consume the data
/// stream as little-endian.
///
/// Probe one: the magic word format. Probe two: the `{opCapFlags, eepMisc}`
/// pair, where the low bit of each octet flags 5 GHz support and big-endian data
/// respectively, so `0x0000`/`0x0101` decide immediately, anything else is
/// ambiguous. The tie is broken by the ART build-number word, a 32-bit
/// `0xMMmmrr00` value whose first half-word has a zero low octet and a
/// non-zero high octet exactly when not byteswapped. If even that fails,
/// prefer little-endian.
///
/// NB: all offsets are in 16-bit words.
pub fn toggle_byteswap(
    session: &mut Session,
    eepmisc_off: u32,
    binbuildnum_off: u32,
) -> Result<()> {
    let word = session.eep_read(AR5416_EEPROM_MAGIC_OFFSET)?;
    let magic_is_be = word != AR5416_EEPROM_MAGIC;

    let word = session
        .eep_read(eepmisc_off)
        .map_err(|_| Error::io("EEPROM misc field read failed"))?;

    match word & 0x0101 {
        0x0000 => {
            // Clearly not a big-endian EEPROM
            if magic_is_be {
                log::debug!("Got byteswapped little-endian EEPROM data");
                return toggle(session);
            }
            return Ok(());
        }
        0x0101 => {
            // Clearly a big-endian EEPROM
            if !magic_is_be {
                log::debug!("Got byteswapped big-endian EEPROM data");
                return toggle(session);
            }
            return Ok(());
        }
        _ => log::debug!("Data is possibly byteswapped"),
    }

    let word = session
        .eep_read(binbuildnum_off)
        .map_err(|_| Error::io("calibration software build read failed"))?;

    if (word & 0xff00) == 0 && (word & 0x00ff) != 0 {
        return toggle(session);
    }
    if (word & 0xff00) != 0 && (word & 0x00ff) == 0 {
        log::debug!("Looks like there is no byteswapping");
        return Ok(());
    }

    log::debug!("Unable to detect byteswap, giving up");
    if magic_is_be {
        return toggle(session);
    }

    Ok(())
}

fn toggle(session: &mut Session) -> Result<()> {
    log::info!("Toggle EEPROM I/O byteswap compensation");
    session.io_swap = !session.io_swap;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fbin_codec() {
        assert_eq!(freq2fbin(2412, true), 112);
        assert_eq!(fbin2freq(112, true), 2412);
        assert_eq!(freq2fbin(5180, false), 76);
        assert_eq!(fbin2freq(76, false), 5180);
    }

    #[test]
    fn test_ctl_pack_unpack() {
        let ctl = ctl_pack(60, 0x2);
        assert_eq!(ctl_edge_power(ctl), 60);
        assert_eq!(ctl_edge_flags(ctl), 0x2);
    }

    #[test]
    fn test_csum_fold() {
        // A payload where one word is patched to force the 0xffff fold.
        let mut words = vec![0x1111u16, 0x2222, 0x3333, 0x0000];
        let fold = calc_csum(&words[..3]);
        words[3] = fold ^ 0xffff;
        assert_eq!(calc_csum(&words), 0xffff);
    }

    #[test]
    fn test_csum_bytes_matches_words() {
        let words = [0xa55au16, 0x00e0, 0x1234];
        let mut bytes = Vec::new();
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        assert_eq!(calc_csum(&words), calc_csum_bytes(&bytes));
    }

    #[test]
    fn test_fixup_csum_bytes() {
        let mut image = vec![0u8; 64];
        image[10] = 0x5a;
        image[33] = 0x77;
        fixup_csum_bytes(&mut image, 2);
        assert_eq!(calc_csum_bytes(&image), 0xffff);
    }

    #[test]
    fn test_ctl_mode_band() {
        assert!(ctl_mode_is_2g(1)); // 2GHz CCK
        assert!(!ctl_mode_is_2g(0)); // 5GHz OFDM
        assert!(ctl_mode_is_2g(0x17 & 0x0f)); // masks high nibble
    }
}

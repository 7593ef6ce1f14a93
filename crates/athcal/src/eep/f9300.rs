// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! EEPROM map of the modern .11n chips (AR93xx/AR94xx/AR95xx).
//!
//! Data may come from a raw blob (full uncompressed image), from EEPROM
//! (compressed record chain scanned downward from a family-specific byte
//! cursor) or from OTP. EEPROM words are little-endian, OTP words are
//! host-native; the byte-stream extractor honours the difference.

use std::fmt::Write as _;

use crate::eep::common;
use crate::eep::compress::{
    self, Assembler, CompHdr, Template, COMP_CKSUM_LEN, COMP_HDR_LEN,
};
use crate::eep::cursor::{Cursor, CursorMut};
use crate::eep::render;
use crate::eep::{t9300, EepMap, Op, Section, UpdateParam};
use crate::error::{Error, Result};
use crate::loader::Session;

pub const AR9300_MAX_CHAINS: usize = 3;
pub const AR9300_NUM_2G_CAL_PIERS: usize = 3;
pub const AR9300_NUM_5G_CAL_PIERS: usize = 8;
pub const AR9300_NUM_2G_CCK_TARGET_POWERS: usize = 2;
pub const AR9300_NUM_2G_20_TARGET_POWERS: usize = 3;
pub const AR9300_NUM_2G_40_TARGET_POWERS: usize = 3;
pub const AR9300_NUM_5G_20_TARGET_POWERS: usize = 8;
pub const AR9300_NUM_5G_40_TARGET_POWERS: usize = 8;
pub const AR9300_NUM_HT_RATES: usize = 14;
pub const AR9300_NUM_CTLS_2G: usize = 12;
pub const AR9300_NUM_BAND_EDGES_2G: usize = 4;
pub const AR9300_NUM_CTLS_5G: usize = 9;
pub const AR9300_NUM_BAND_EDGES_5G: usize = 8;
pub const AR9300_EEPROM_MODAL_SPURS: usize = 5;

/// Unpacked calibration image size.
pub const AR9300_EEPROM_STRUCT_SIZE: usize = 1088;
/// Raw source buffer size, bytes.
pub const AR9300_EEPROM_SIZE: usize = 0x1000;

/// Compressed-chain candidate byte cursors.
pub const AR9300_BASE_ADDR_4K: usize = 0x0fff;
pub const AR9300_BASE_ADDR: usize = 0x03ff;
pub const AR9300_BASE_ADDR_512: usize = 0x01ff;

/// Per-record payload length cap; AR9485 parts allow a full-image record.
const BLOCK_LEN_CAP: usize = 1024;
const BLOCK_LEN_CAP_9485: usize = AR9300_EEPROM_STRUCT_SIZE;

const MODAL_BYTES: usize = 85;

#[derive(Debug, Clone, Default)]
pub struct BaseHdr {
    pub reg_dmn: [u16; 2],
    pub txrx_mask: u8,
    pub op_flags: u8,
    pub eep_misc: u8,
    pub rf_silent: u8,
    pub blue_tooth_options: u8,
    pub device_cap: u8,
    pub device_type: u8,
    pub pwr_table_offset: i8,
    pub params_for_tuning_caps: [u8; 2],
    pub feature_enable: u8,
    pub misc_configuration: u8,
    pub eeprom_write_enable_gpio: u8,
    pub wlan_disable_gpio: u8,
    pub wlan_led_gpio: u8,
    pub rx_band_select_gpio: u8,
    pub txrxgain: u8,
    pub swreg: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ModalHdr {
    pub ant_ctrl_common: u32,
    pub ant_ctrl_common2: u32,
    pub ant_ctrl_chain: [u16; AR9300_MAX_CHAINS],
    pub xatten1_db: [u8; AR9300_MAX_CHAINS],
    pub xatten1_margin: [u8; AR9300_MAX_CHAINS],
    pub temp_slope: i8,
    pub volt_slope: i8,
    pub spur_chans: [u8; AR9300_EEPROM_MODAL_SPURS],
    pub noise_floor_thresh_ch: [i8; AR9300_MAX_CHAINS],
    pub quick_drop: i8,
    pub xpa_bias_lvl: u8,
    pub tx_frame_to_data_start: u8,
    pub tx_frame_to_pa_on: u8,
    pub tx_clip: u8,
    pub antenna_gain: u8,
    pub switch_settling: u8,
    pub adc_desired_size: i8,
    pub tx_end_to_xpa_off: u8,
    pub tx_end_to_rx_on: u8,
    pub tx_frame_to_xpa_on: u8,
    pub thresh62: u8,
    pub papd_rate_mask_ht20: u32,
    pub papd_rate_mask_ht40: u32,
}

/// Open-loop calibration measurements at one pier of one chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalPierData {
    pub ref_power: i8,
    pub volt_meas: u8,
    pub temp_meas: u8,
    pub rx_noisefloor_cal: i8,
    pub rx_noisefloor_power: i8,
    pub rx_temp_meas: u8,
}

#[derive(Debug, Clone)]
pub struct Ar9300Eeprom {
    pub eeprom_version: u8,
    pub template_version: u8,
    pub mac_addr: [u8; 6],
    pub cust_data: [u8; 20],
    pub base: BaseHdr,

    pub modal_2g: ModalHdr,
    pub cal_freq_pier_2g: [u8; AR9300_NUM_2G_CAL_PIERS],
    pub cal_pier_data_2g: [[CalPierData; AR9300_NUM_2G_CAL_PIERS]; AR9300_MAX_CHAINS],
    pub cal_target_freqbin_cck: [u8; AR9300_NUM_2G_CCK_TARGET_POWERS],
    pub cal_target_freqbin_2g: [u8; AR9300_NUM_2G_20_TARGET_POWERS],
    pub cal_target_freqbin_2g_ht20: [u8; AR9300_NUM_2G_20_TARGET_POWERS],
    pub cal_target_freqbin_2g_ht40: [u8; AR9300_NUM_2G_40_TARGET_POWERS],
    pub cal_target_power_cck: [[u8; 4]; AR9300_NUM_2G_CCK_TARGET_POWERS],
    pub cal_target_power_2g: [[u8; 4]; AR9300_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht20: [[u8; AR9300_NUM_HT_RATES]; AR9300_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht40: [[u8; AR9300_NUM_HT_RATES]; AR9300_NUM_2G_40_TARGET_POWERS],
    pub ctl_index_2g: [u8; AR9300_NUM_CTLS_2G],
    pub ctl_freqbin_2g: [[u8; AR9300_NUM_BAND_EDGES_2G]; AR9300_NUM_CTLS_2G],
    pub ctl_power_data_2g: [[u8; AR9300_NUM_BAND_EDGES_2G]; AR9300_NUM_CTLS_2G],

    pub modal_5g: ModalHdr,
    pub cal_freq_pier_5g: [u8; AR9300_NUM_5G_CAL_PIERS],
    pub cal_pier_data_5g: [[CalPierData; AR9300_NUM_5G_CAL_PIERS]; AR9300_MAX_CHAINS],
    pub cal_target_freqbin_5g: [u8; AR9300_NUM_5G_20_TARGET_POWERS],
    pub cal_target_freqbin_5g_ht20: [u8; AR9300_NUM_5G_20_TARGET_POWERS],
    pub cal_target_freqbin_5g_ht40: [u8; AR9300_NUM_5G_40_TARGET_POWERS],
    pub cal_target_power_5g: [[u8; 4]; AR9300_NUM_5G_20_TARGET_POWERS],
    pub cal_target_power_5g_ht20: [[u8; AR9300_NUM_HT_RATES]; AR9300_NUM_5G_20_TARGET_POWERS],
    pub cal_target_power_5g_ht40: [[u8; AR9300_NUM_HT_RATES]; AR9300_NUM_5G_40_TARGET_POWERS],
    pub ctl_index_5g: [u8; AR9300_NUM_CTLS_5G],
    pub ctl_freqbin_5g: [[u8; AR9300_NUM_BAND_EDGES_5G]; AR9300_NUM_CTLS_5G],
    pub ctl_power_data_5g: [[u8; AR9300_NUM_BAND_EDGES_5G]; AR9300_NUM_CTLS_5G],
}

impl Default for Ar9300Eeprom {
    fn default() -> Self {
        Self {
            eeprom_version: 0,
            template_version: 0,
            mac_addr: [0; 6],
            cust_data: [0; 20],
            base: BaseHdr::default(),
            modal_2g: ModalHdr::default(),
            cal_freq_pier_2g: [0; AR9300_NUM_2G_CAL_PIERS],
            cal_pier_data_2g: Default::default(),
            cal_target_freqbin_cck: [0; AR9300_NUM_2G_CCK_TARGET_POWERS],
            cal_target_freqbin_2g: [0; AR9300_NUM_2G_20_TARGET_POWERS],
            cal_target_freqbin_2g_ht20: [0; AR9300_NUM_2G_20_TARGET_POWERS],
            cal_target_freqbin_2g_ht40: [0; AR9300_NUM_2G_40_TARGET_POWERS],
            cal_target_power_cck: Default::default(),
            cal_target_power_2g: Default::default(),
            cal_target_power_2g_ht20: Default::default(),
            cal_target_power_2g_ht40: Default::default(),
            ctl_index_2g: [0; AR9300_NUM_CTLS_2G],
            ctl_freqbin_2g: Default::default(),
            ctl_power_data_2g: Default::default(),
            modal_5g: ModalHdr::default(),
            cal_freq_pier_5g: [0; AR9300_NUM_5G_CAL_PIERS],
            cal_pier_data_5g: Default::default(),
            cal_target_freqbin_5g: [0; AR9300_NUM_5G_20_TARGET_POWERS],
            cal_target_freqbin_5g_ht20: [0; AR9300_NUM_5G_20_TARGET_POWERS],
            cal_target_freqbin_5g_ht40: [0; AR9300_NUM_5G_40_TARGET_POWERS],
            cal_target_power_5g: Default::default(),
            cal_target_power_5g_ht20: Default::default(),
            cal_target_power_5g_ht40: Default::default(),
            ctl_index_5g: [0; AR9300_NUM_CTLS_5G],
            ctl_freqbin_5g: Default::default(),
            ctl_power_data_5g: Default::default(),
        }
    }
}

fn sw16(v: u16, swap: bool) -> u16 {
    if swap {
        v.swap_bytes()
    } else {
        v
    }
}

fn sw32(v: u32, swap: bool) -> u32 {
    if swap {
        v.swap_bytes()
    } else {
        v
    }
}

fn parse_modal(c: &mut Cursor<'_>, swap: bool) -> Result<ModalHdr> {
    let mut m = ModalHdr::default();
    m.ant_ctrl_common = sw32(c.read_u32()?, swap);
    m.ant_ctrl_common2 = sw32(c.read_u32()?, swap);
    for chain in &mut m.ant_ctrl_chain {
        *chain = sw16(c.read_u16()?, swap);
    }
    m.xatten1_db = c.read_array()?;
    m.xatten1_margin = c.read_array()?;
    m.temp_slope = c.read_i8()?;
    m.volt_slope = c.read_i8()?;
    m.spur_chans = c.read_array()?;
    for nf in &mut m.noise_floor_thresh_ch {
        *nf = c.read_i8()?;
    }
    c.skip(11)?; // reserved
    m.quick_drop = c.read_i8()?;
    m.xpa_bias_lvl = c.read_u8()?;
    m.tx_frame_to_data_start = c.read_u8()?;
    m.tx_frame_to_pa_on = c.read_u8()?;
    m.tx_clip = c.read_u8()?;
    m.antenna_gain = c.read_u8()?;
    m.switch_settling = c.read_u8()?;
    m.adc_desired_size = c.read_i8()?;
    m.tx_end_to_xpa_off = c.read_u8()?;
    m.tx_end_to_rx_on = c.read_u8()?;
    m.tx_frame_to_xpa_on = c.read_u8()?;
    m.thresh62 = c.read_u8()?;
    m.papd_rate_mask_ht20 = sw32(c.read_u32()?, swap);
    m.papd_rate_mask_ht40 = sw32(c.read_u32()?, swap);
    c.skip(24)?; // futureModal
    Ok(m)
}

fn encode_modal(c: &mut CursorMut<'_>, m: &ModalHdr) -> Result<()> {
    c.write_u32(m.ant_ctrl_common)?;
    c.write_u32(m.ant_ctrl_common2)?;
    for chain in &m.ant_ctrl_chain {
        c.write_u16(*chain)?;
    }
    c.write_bytes(&m.xatten1_db)?;
    c.write_bytes(&m.xatten1_margin)?;
    c.write_i8(m.temp_slope)?;
    c.write_i8(m.volt_slope)?;
    c.write_bytes(&m.spur_chans)?;
    for nf in &m.noise_floor_thresh_ch {
        c.write_i8(*nf)?;
    }
    c.skip(11)?;
    c.write_i8(m.quick_drop)?;
    c.write_u8(m.xpa_bias_lvl)?;
    c.write_u8(m.tx_frame_to_data_start)?;
    c.write_u8(m.tx_frame_to_pa_on)?;
    c.write_u8(m.tx_clip)?;
    c.write_u8(m.antenna_gain)?;
    c.write_u8(m.switch_settling)?;
    c.write_i8(m.adc_desired_size)?;
    c.write_u8(m.tx_end_to_xpa_off)?;
    c.write_u8(m.tx_end_to_rx_on)?;
    c.write_u8(m.tx_frame_to_xpa_on)?;
    c.write_u8(m.thresh62)?;
    c.write_u32(m.papd_rate_mask_ht20)?;
    c.write_u32(m.papd_rate_mask_ht40)?;
    c.skip(24)?;
    Ok(())
}

impl Ar9300Eeprom {
    pub fn parse(image: &[u8], swap: bool) -> Result<Ar9300Eeprom> {
        let mut c = Cursor::new(image);
        let mut eep = Ar9300Eeprom::default();

        eep.eeprom_version = c.read_u8()?;
        eep.template_version = c.read_u8()?;
        eep.mac_addr = c.read_array()?;
        eep.cust_data = c.read_array()?;

        let b = &mut eep.base;
        b.reg_dmn = [sw16(c.read_u16()?, swap), sw16(c.read_u16()?, swap)];
        b.txrx_mask = c.read_u8()?;
        b.op_flags = c.read_u8()?;
        b.eep_misc = c.read_u8()?;
        b.rf_silent = c.read_u8()?;
        b.blue_tooth_options = c.read_u8()?;
        b.device_cap = c.read_u8()?;
        b.device_type = c.read_u8()?;
        b.pwr_table_offset = c.read_i8()?;
        b.params_for_tuning_caps = c.read_array()?;
        b.feature_enable = c.read_u8()?;
        b.misc_configuration = c.read_u8()?;
        b.eeprom_write_enable_gpio = c.read_u8()?;
        b.wlan_disable_gpio = c.read_u8()?;
        b.wlan_led_gpio = c.read_u8()?;
        b.rx_band_select_gpio = c.read_u8()?;
        b.txrxgain = c.read_u8()?;
        b.swreg = sw32(c.read_u32()?, swap);

        eep.modal_2g = parse_modal(&mut c, swap)?;
        eep.cal_freq_pier_2g = c.read_array()?;
        for chain in 0..AR9300_MAX_CHAINS {
            for pier in 0..AR9300_NUM_2G_CAL_PIERS {
                eep.cal_pier_data_2g[chain][pier] = parse_pier_data(&mut c)?;
            }
        }
        eep.cal_target_freqbin_cck = c.read_array()?;
        eep.cal_target_freqbin_2g = c.read_array()?;
        eep.cal_target_freqbin_2g_ht20 = c.read_array()?;
        eep.cal_target_freqbin_2g_ht40 = c.read_array()?;
        for t in &mut eep.cal_target_power_cck {
            *t = c.read_array()?;
        }
        for t in &mut eep.cal_target_power_2g {
            *t = c.read_array()?;
        }
        for t in &mut eep.cal_target_power_2g_ht20 {
            *t = c.read_array()?;
        }
        for t in &mut eep.cal_target_power_2g_ht40 {
            *t = c.read_array()?;
        }
        eep.ctl_index_2g = c.read_array()?;
        for f in &mut eep.ctl_freqbin_2g {
            *f = c.read_array()?;
        }
        for p in &mut eep.ctl_power_data_2g {
            *p = c.read_array()?;
        }

        eep.modal_5g = parse_modal(&mut c, swap)?;
        eep.cal_freq_pier_5g = c.read_array()?;
        for chain in 0..AR9300_MAX_CHAINS {
            for pier in 0..AR9300_NUM_5G_CAL_PIERS {
                eep.cal_pier_data_5g[chain][pier] = parse_pier_data(&mut c)?;
            }
        }
        eep.cal_target_freqbin_5g = c.read_array()?;
        eep.cal_target_freqbin_5g_ht20 = c.read_array()?;
        eep.cal_target_freqbin_5g_ht40 = c.read_array()?;
        for t in &mut eep.cal_target_power_5g {
            *t = c.read_array()?;
        }
        for t in &mut eep.cal_target_power_5g_ht20 {
            *t = c.read_array()?;
        }
        for t in &mut eep.cal_target_power_5g_ht40 {
            *t = c.read_array()?;
        }
        eep.ctl_index_5g = c.read_array()?;
        for f in &mut eep.ctl_freqbin_5g {
            *f = c.read_array()?;
        }
        for p in &mut eep.ctl_power_data_5g {
            *p = c.read_array()?;
        }

        Ok(eep)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut image = vec![0u8; AR9300_EEPROM_STRUCT_SIZE];
        let mut c = CursorMut::new(&mut image);

        c.write_u8(self.eeprom_version)?;
        c.write_u8(self.template_version)?;
        c.write_bytes(&self.mac_addr)?;
        c.write_bytes(&self.cust_data)?;

        let b = &self.base;
        c.write_u16(b.reg_dmn[0])?;
        c.write_u16(b.reg_dmn[1])?;
        c.write_u8(b.txrx_mask)?;
        c.write_u8(b.op_flags)?;
        c.write_u8(b.eep_misc)?;
        c.write_u8(b.rf_silent)?;
        c.write_u8(b.blue_tooth_options)?;
        c.write_u8(b.device_cap)?;
        c.write_u8(b.device_type)?;
        c.write_i8(b.pwr_table_offset)?;
        c.write_bytes(&b.params_for_tuning_caps)?;
        c.write_u8(b.feature_enable)?;
        c.write_u8(b.misc_configuration)?;
        c.write_u8(b.eeprom_write_enable_gpio)?;
        c.write_u8(b.wlan_disable_gpio)?;
        c.write_u8(b.wlan_led_gpio)?;
        c.write_u8(b.rx_band_select_gpio)?;
        c.write_u8(b.txrxgain)?;
        c.write_u32(b.swreg)?;

        encode_modal(&mut c, &self.modal_2g)?;
        c.write_bytes(&self.cal_freq_pier_2g)?;
        for chain in &self.cal_pier_data_2g {
            for pier in chain {
                encode_pier_data(&mut c, pier)?;
            }
        }
        c.write_bytes(&self.cal_target_freqbin_cck)?;
        c.write_bytes(&self.cal_target_freqbin_2g)?;
        c.write_bytes(&self.cal_target_freqbin_2g_ht20)?;
        c.write_bytes(&self.cal_target_freqbin_2g_ht40)?;
        for t in &self.cal_target_power_cck {
            c.write_bytes(t)?;
        }
        for t in &self.cal_target_power_2g {
            c.write_bytes(t)?;
        }
        for t in &self.cal_target_power_2g_ht20 {
            c.write_bytes(t)?;
        }
        for t in &self.cal_target_power_2g_ht40 {
            c.write_bytes(t)?;
        }
        c.write_bytes(&self.ctl_index_2g)?;
        for f in &self.ctl_freqbin_2g {
            c.write_bytes(f)?;
        }
        for p in &self.ctl_power_data_2g {
            c.write_bytes(p)?;
        }

        encode_modal(&mut c, &self.modal_5g)?;
        c.write_bytes(&self.cal_freq_pier_5g)?;
        for chain in &self.cal_pier_data_5g {
            for pier in chain {
                encode_pier_data(&mut c, pier)?;
            }
        }
        c.write_bytes(&self.cal_target_freqbin_5g)?;
        c.write_bytes(&self.cal_target_freqbin_5g_ht20)?;
        c.write_bytes(&self.cal_target_freqbin_5g_ht40)?;
        for t in &self.cal_target_power_5g {
            c.write_bytes(t)?;
        }
        for t in &self.cal_target_power_5g_ht20 {
            c.write_bytes(t)?;
        }
        for t in &self.cal_target_power_5g_ht40 {
            c.write_bytes(t)?;
        }
        c.write_bytes(&self.ctl_index_5g)?;
        for f in &self.ctl_freqbin_5g {
            c.write_bytes(f)?;
        }
        for p in &self.ctl_power_data_5g {
            c.write_bytes(p)?;
        }

        debug_assert_eq!(c.offset(), AR9300_EEPROM_STRUCT_SIZE);
        Ok(image)
    }

    /// Plausibility check for a candidate uncompressed image.
    pub fn data_looks_valid(image: &[u8]) -> bool {
        if image.len() < 40 {
            return false;
        }
        let txrx_mask = image[32];
        let op_flags = image[33];
        let txm = txrx_mask >> 4;
        let rxm = txrx_mask & 0x0f;
        if txm == 0x0 || txm == 0xf || rxm == 0x0 || rxm == 0xf {
            return false;
        }
        if op_flags & (common::AR5416_OPFLAGS_11A | common::AR5416_OPFLAGS_11G) == 0 {
            return false;
        }
        true
    }
}

fn parse_pier_data(c: &mut Cursor<'_>) -> Result<CalPierData> {
    Ok(CalPierData {
        ref_power: c.read_i8()?,
        volt_meas: c.read_u8()?,
        temp_meas: c.read_u8()?,
        rx_noisefloor_cal: c.read_i8()?,
        rx_noisefloor_power: c.read_i8()?,
        rx_temp_meas: c.read_u8()?,
    })
}

fn encode_pier_data(c: &mut CursorMut<'_>, d: &CalPierData) -> Result<()> {
    c.write_i8(d.ref_power)?;
    c.write_u8(d.volt_meas)?;
    c.write_u8(d.temp_meas)?;
    c.write_i8(d.rx_noisefloor_cal)?;
    c.write_i8(d.rx_noisefloor_power)?;
    c.write_u8(d.rx_temp_meas)?;
    Ok(())
}

/// Which source the record in memory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DataSrc {
    #[default]
    None,
    Blob,
    Eeprom,
    Otp,
}

pub struct Eep9300 {
    eep: Ar9300Eeprom,
    data_src: DataSrc,
    /// Byte cursor below which chip init data lives after a chain scan.
    init_data_max_size: usize,
    /// Buffered words carry big-endian octet pairs (OTP on a BE host).
    buf_is_be: bool,
}

impl Default for Eep9300 {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `count` octets ending at byte address `addr` from the word
/// buffer, reading bytes in reverse direction: the first two output octets
/// come from the word holding `addr`, the next two from its predecessor,
/// and so on.
fn buf2bstr(
    eep_buf: &[u16],
    eep_len: usize,
    buf_is_be: bool,
    addr: usize,
    count: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; count];

    if addr + 1 < count || addr / 2 >= eep_len {
        log::warn!("Requested address not in range");
        return out;
    }

    for i in (addr + 1 - count..=addr).rev() {
        let shift = if buf_is_be { (i + 1) % 2 } else { i % 2 };
        out[addr - i] = (eep_buf[i / 2] >> (8 * shift)) as u8;
    }

    out
}

impl Eep9300 {
    pub fn new() -> Self {
        Self {
            eep: Ar9300Eeprom::default(),
            data_src: DataSrc::None,
            init_data_max_size: 0,
            buf_is_be: false,
        }
    }

    fn block_len_cap(session: &Session) -> usize {
        if session.srev_is_9485() {
            BLOCK_LEN_CAP_9485
        } else {
            BLOCK_LEN_CAP
        }
    }

    /// Walk the compressed-record chain downward from byte cursor `cptr`.
    /// Returns the number of valid records decompressed into the session's
    /// unpacked buffer.
    fn process_blocks(&mut self, session: &mut Session, mut cptr: usize) -> usize {
        // The chain is self-synchronising at the header boundary: a record
        // failing validation backs the cursor up by one header length.
        const MSTATE: usize = 100;

        let hw = session.con.caps() & crate::source::CON_CAP_HW != 0;
        let len_cap = Self::block_len_cap(session);
        let mut asm = Assembler::new(t9300::TEMPLATES);
        let mut valid_blocks = 0;

        let Session {
            eep_buf,
            eep_len,
            unpacked,
            ..
        } = session;

        for it in 0..MSTATE {
            let hdr_bytes = buf2bstr(eep_buf, *eep_len, self.buf_is_be, cptr, COMP_HDR_LEN);
            let first = u32::from_le_bytes([hdr_bytes[0], hdr_bytes[1], hdr_bytes[2], hdr_bytes[3]]);
            if first == 0 || first == !0 {
                break; // chain end
            }

            let hdr: CompHdr = compress::comp_hdr_unpack(&hdr_bytes);
            log::debug!(
                "Found block at {:x}: comp={:?} ref={} length={} major={} minor={}",
                cptr,
                hdr.comp,
                hdr.reference,
                hdr.len,
                hdr.maj,
                hdr.min
            );

            let len_ok = !(hw && hdr.len >= len_cap)
                && COMP_HDR_LEN + hdr.len + COMP_CKSUM_LEN <= cptr;
            if !len_ok {
                log::debug!("Skipping bad header");
                if cptr < COMP_HDR_LEN {
                    break;
                }
                cptr -= COMP_HDR_LEN;
                continue;
            }

            let block = buf2bstr(
                eep_buf,
                *eep_len,
                self.buf_is_be,
                cptr,
                COMP_HDR_LEN + hdr.len + COMP_CKSUM_LEN,
            );
            let payload = &block[COMP_HDR_LEN..COMP_HDR_LEN + hdr.len];
            let checksum = compress::comp_checksum(payload);
            let mchecksum =
                u16::from(block[COMP_HDR_LEN + hdr.len]) | (u16::from(block[COMP_HDR_LEN + hdr.len + 1]) << 8);
            if checksum != mchecksum {
                log::debug!(
                    "Skipping block with bad checksum (got 0x{:04x}, expect 0x{:04x})",
                    checksum,
                    mchecksum
                );
                if cptr < COMP_HDR_LEN {
                    break;
                }
                cptr -= COMP_HDR_LEN;
                continue;
            }

            let out = &mut unpacked[..AR9300_EEPROM_STRUCT_SIZE];
            if asm.apply(it, &hdr, payload, out).is_ok() {
                valid_blocks += 1;
            }

            cptr -= COMP_HDR_LEN + hdr.len + COMP_CKSUM_LEN;
        }

        self.init_data_max_size = cptr;
        valid_blocks
    }

    fn take_unpacked(&mut self, session: &mut Session) -> Result<()> {
        session.unpacked_len = AR9300_EEPROM_STRUCT_SIZE;
        self.eep = Ar9300Eeprom::parse(&session.unpacked[..AR9300_EEPROM_STRUCT_SIZE], false)?;
        Ok(())
    }

    fn dump_base(&self, out: &mut String) {
        let eep = &self.eep;
        let b = &eep.base;

        render::sect_name(out, "EEPROM Base Header");

        let _ = writeln!(out, "{:<30} : {:2}", "Version", eep.eeprom_version);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RegDomain1", b.reg_dmn[0]);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RegDomain2", b.reg_dmn[1]);
        let m = eep.mac_addr;
        let _ = writeln!(
            out,
            "{:<30} : {:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            "MacAddress", m[0], m[1], m[2], m[3], m[4], m[5]
        );
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "TX Mask", b.txrx_mask >> 4);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RX Mask", b.txrx_mask & 0x0f);
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Allow 5GHz",
            u8::from(b.op_flags & common::AR5416_OPFLAGS_11A != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Allow 2GHz",
            u8::from(b.op_flags & common::AR5416_OPFLAGS_11G != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Disable 2GHz HT20",
            u8::from(b.op_flags & common::AR5416_OPFLAGS_N_2G_HT20 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Disable 2GHz HT40",
            u8::from(b.op_flags & common::AR5416_OPFLAGS_N_2G_HT40 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Disable 5Ghz HT20",
            u8::from(b.op_flags & common::AR5416_OPFLAGS_N_5G_HT20 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Disable 5Ghz HT40",
            u8::from(b.op_flags & common::AR5416_OPFLAGS_N_5G_HT40 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Big Endian",
            u8::from(b.eep_misc & common::AR5416_EEPMISC_BIG_ENDIAN != 0)
        );
        let _ = writeln!(out, "{:<30} : {:x}", "RF Silent", b.rf_silent);
        let _ = writeln!(out, "{:<30} : {:x}", "BT option", b.blue_tooth_options);
        let _ = writeln!(out, "{:<30} : {:x}", "Device Cap", b.device_cap);
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Device Type",
            common::DEVICE_TYPE_NAMES[usize::from(b.device_type & 0x7)]
        );
        let _ = writeln!(out, "{:<30} : {:x}", "Power Table Offset", b.pwr_table_offset);
        let _ = writeln!(
            out,
            "{:<30} : {:x}",
            "Tuning Caps1", b.params_for_tuning_caps[0]
        );
        let _ = writeln!(
            out,
            "{:<30} : {:x}",
            "Tuning Caps2", b.params_for_tuning_caps[1]
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Enable Tx Temp Comp",
            u8::from(b.feature_enable & (1 << 0) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Enable Tx Volt Comp",
            u8::from(b.feature_enable & (1 << 1) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Enable fast clock",
            u8::from(b.feature_enable & (1 << 2) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Enable doubling",
            u8::from(b.feature_enable & (1 << 3) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Internal regulator",
            u8::from(b.feature_enable & (1 << 4) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Enable Paprd",
            u8::from(b.feature_enable & (1 << 5) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Driver Strength",
            u8::from(b.misc_configuration & (1 << 0) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Quick Drop",
            u8::from(b.misc_configuration & (1 << 1) != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Chain mask Reduce",
            (b.misc_configuration >> 0x3) & 0x1
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Write enable Gpio", b.eeprom_write_enable_gpio
        );
        let _ = writeln!(out, "{:<30} : {}", "WLAN Disable Gpio", b.wlan_disable_gpio);
        let _ = writeln!(out, "{:<30} : {}", "WLAN LED Gpio", b.wlan_led_gpio);
        let _ = writeln!(out, "{:<30} : {}", "Rx Band Select Gpio", b.rx_band_select_gpio);
        let _ = writeln!(out, "{:<30} : {}", "Tx Gain", b.txrxgain >> 4);
        let _ = writeln!(out, "{:<30} : {}", "Rx Gain", b.txrxgain & 0xf);
        let _ = writeln!(out, "{:<30} : {}", "SW Reg", b.swreg);

        out.push_str("\nCustomer Data in hex:\n");
        render::hexdump(out, &eep.cust_data);
        out.push('\n');
    }

    fn dump_modal(&self, out: &mut String) {
        let eep = &self.eep;
        let has_2g = eep.base.op_flags & common::AR5416_OPFLAGS_11G != 0;
        let has_5g = eep.base.op_flags & common::AR5416_OPFLAGS_11A != 0;

        render::sect_name(out, "EEPROM Modal Header");

        let _ = write!(out, "{:31}", "");
        if has_2g {
            let _ = write!(out, "{:<8}", "2G");
        }
        if has_5g {
            let _ = write!(out, "{:<8}", "5G");
        }
        out.push_str("\n\n");

        let mut line = |token: &str, f: &dyn Fn(&ModalHdr) -> String| {
            let _ = write!(out, "{:<23} {:<7}", token, ":");
            if has_2g {
                let _ = write!(out, "{:<8}", f(&eep.modal_2g));
            }
            if has_5g {
                let _ = write!(out, "{:<8}", f(&eep.modal_5g));
            }
            out.push('\n');
        };

        for i in 0..AR9300_MAX_CHAINS {
            line(&format!("Ant Chain {}", i), &|m| {
                format!("{}", m.ant_ctrl_chain[i])
            });
        }
        line("Antenna Common", &|m| format!("{}", m.ant_ctrl_common));
        line("Antenna Common2", &|m| format!("{}", m.ant_ctrl_common2));
        line("Antenna Gain", &|m| format!("{}", m.antenna_gain));
        line("Switch Settling", &|m| format!("{}", m.switch_settling));
        for i in 0..AR9300_MAX_CHAINS {
            line(&format!("xatten1DB Ch {}", i), &|m| {
                format!("{}", m.xatten1_db[i])
            });
        }
        for i in 0..AR9300_MAX_CHAINS {
            line(&format!("xatten1Margin Chain {}", i), &|m| {
                format!("{}", m.xatten1_margin[i])
            });
        }
        line("Temp Slope", &|m| format!("{}", m.temp_slope));
        line("Volt Slope", &|m| format!("{}", m.volt_slope));
        for i in 0..AR9300_EEPROM_MODAL_SPURS {
            line(&format!("spur Channels{}", i), &|m| {
                format!("{}", m.spur_chans[i])
            });
        }
        for i in 0..AR9300_MAX_CHAINS {
            line(&format!("NF Thresh {}", i), &|m| {
                format!("{}", m.noise_floor_thresh_ch[i])
            });
        }
        line("Quick Drop", &|m| format!("{}", m.quick_drop));
        line("TX end to xpa off", &|m| format!("{}", m.tx_end_to_xpa_off));
        line("Xpa bias level", &|m| format!("{}", m.xpa_bias_lvl));
        line("txFrameToDataStart", &|m| {
            format!("{}", m.tx_frame_to_data_start)
        });
        line("txFrameToPaOn", &|m| format!("{}", m.tx_frame_to_pa_on));
        line("TX frame to xpa on", &|m| format!("{}", m.tx_frame_to_xpa_on));
        line("TxClip", &|m| format!("{}", m.tx_clip));
        line("ADC Desired Size", &|m| format!("{}", m.adc_desired_size));
        line("PAPD Rate Mask HT20", &|m| {
            format!("0x{:x}", m.papd_rate_mask_ht20)
        });
        line("PAPD Rate Mask HT40", &|m| {
            format!("0x{:x}", m.papd_rate_mask_ht40)
        });

        out.push('\n');
    }

    fn dump_pwr_cal(
        out: &mut String,
        piers: &[u8],
        data: &[[CalPierData; 8]],
        npiers: usize,
        is_2g: bool,
        chainmask: u8,
    ) {
        let _ = write!(out, "               ");
        for j in 0..AR9300_MAX_CHAINS {
            if chainmask & (1 << j) == 0 {
                continue;
            }
            let _ = write!(out, ".-------------- Chain {} -----------.", j);
        }
        out.push('\n');
        let _ = write!(out, "               ");
        for j in 0..AR9300_MAX_CHAINS {
            if chainmask & (1 << j) == 0 {
                continue;
            }
            let _ = write!(out, "|        Tx        :       Rx      |");
        }
        out.push('\n');
        let _ = write!(out, "    Freq, MHz  ");
        for j in 0..AR9300_MAX_CHAINS {
            if chainmask & (1 << j) == 0 {
                continue;
            }
            let _ = write!(out, " PwrDelta Volt Temp    NF  Pwr Temp ");
        }
        out.push('\n');

        for i in 0..npiers {
            let _ = write!(out, "         {:4}  ", common::fbin2freq(piers[i], is_2g));
            for j in 0..AR9300_MAX_CHAINS {
                if chainmask & (1 << j) == 0 {
                    continue;
                }
                let d = &data[j][i];
                let _ = write!(
                    out,
                    "    {:5.1} {:4} {:4}  {:4} {:4} {:4} ",
                    f64::from(d.ref_power) / 2.0,
                    d.volt_meas,
                    d.temp_meas,
                    d.rx_noisefloor_cal,
                    d.rx_noisefloor_power,
                    d.rx_temp_meas
                );
            }
            out.push('\n');
        }
    }

    fn dump_tgt_pwr(
        out: &mut String,
        freqs: &[u8],
        tgtpwr: &[&[u8]],
        rates: &[&str],
        is_2g: bool,
    ) {
        let _ = write!(out, "    {:>18}, MHz:", "Freq");
        for &f in freqs {
            let _ = write!(out, "  {:4}", common::fbin2freq(f, is_2g));
        }
        out.push('\n');
        let _ = write!(out, "    ------------------------");
        for _ in freqs {
            out.push_str("  ----");
        }
        out.push('\n');

        for (i, rate) in rates.iter().enumerate() {
            let _ = write!(out, "    {:>18}, dBm:", rate);
            for pwr in tgtpwr {
                let _ = write!(out, "  {:4.1}", f64::from(pwr[i]) / 2.0);
            }
            out.push('\n');
        }
    }

    fn dump_power(&self, out: &mut String) {
        let eep = &self.eep;
        let has_2g = eep.base.op_flags & common::AR5416_OPFLAGS_11G != 0;
        let has_5g = eep.base.op_flags & common::AR5416_OPFLAGS_11A != 0;
        let txmask = eep.base.txrx_mask >> 4;

        render::sect_name(out, "EEPROM Power Info");

        if has_2g {
            render::subsect_name(out, "2 GHz per-freq power cal. data");
            let mut data = [[CalPierData::default(); 8]; AR9300_MAX_CHAINS];
            for (chain, piers) in eep.cal_pier_data_2g.iter().enumerate() {
                data[chain][..AR9300_NUM_2G_CAL_PIERS].copy_from_slice(piers);
            }
            Self::dump_pwr_cal(
                out,
                &eep.cal_freq_pier_2g,
                &data,
                AR9300_NUM_2G_CAL_PIERS,
                true,
                txmask,
            );
            out.push('\n');
        }
        if has_5g {
            render::subsect_name(out, "5 GHz per-freq power cal. data");
            Self::dump_pwr_cal(
                out,
                &eep.cal_freq_pier_5g,
                &eep.cal_pier_data_5g,
                AR9300_NUM_5G_CAL_PIERS,
                false,
                txmask,
            );
            out.push('\n');
        }

        const RATES_CCK: [&str; 4] = ["1-5 mbps (L)", "5 mbps (S)", "11 mbps (L)", "11 mbps (S)"];
        const RATES_OFDM: [&str; 4] = ["6-24 mbps", "36 mbps", "48 mbps", "54 mbps"];
        const RATES_HT: [&str; AR9300_NUM_HT_RATES] = [
            "MCS 0,8,16",
            "MCS 1-3,9-11,17-19",
            "MCS 4",
            "MCS 5",
            "MCS 6",
            "MCS 7",
            "MCS 12",
            "MCS 13",
            "MCS 14",
            "MCS 15",
            "MCS 20",
            "MCS 21",
            "MCS 22",
            "MCS 23",
        ];

        macro_rules! tgt {
            ($name:expr, $freqs:expr, $pwr:expr, $rates:expr, $is_2g:expr) => {
                render::subsect_name(out, concat!($name, " per-rate target power"));
                let rows: Vec<&[u8]> = $pwr.iter().map(|r| &r[..]).collect();
                Self::dump_tgt_pwr(out, &$freqs, &rows, &$rates, $is_2g);
                out.push('\n');
            };
        }

        if has_2g {
            tgt!(
                "2 GHz CCK",
                eep.cal_target_freqbin_cck,
                eep.cal_target_power_cck,
                RATES_CCK,
                true
            );
            tgt!(
                "2 GHz OFDM",
                eep.cal_target_freqbin_2g,
                eep.cal_target_power_2g,
                RATES_OFDM,
                true
            );
            tgt!(
                "2 GHz HT20",
                eep.cal_target_freqbin_2g_ht20,
                eep.cal_target_power_2g_ht20,
                RATES_HT,
                true
            );
            tgt!(
                "2 GHz HT40",
                eep.cal_target_freqbin_2g_ht40,
                eep.cal_target_power_2g_ht40,
                RATES_HT,
                true
            );
        }
        if has_5g {
            tgt!(
                "5 GHz OFDM",
                eep.cal_target_freqbin_5g,
                eep.cal_target_power_5g,
                RATES_OFDM,
                false
            );
            tgt!(
                "5 GHz HT20",
                eep.cal_target_freqbin_5g_ht20,
                eep.cal_target_power_5g_ht20,
                RATES_HT,
                false
            );
            tgt!(
                "5 GHz HT40",
                eep.cal_target_freqbin_5g_ht40,
                eep.cal_target_power_5g_ht40,
                RATES_HT,
                false
            );
        }

        if has_2g {
            render::subsect_name(out, "2 GHz CTL data");
            render_ctl(
                out,
                &eep.ctl_index_2g,
                eep.ctl_freqbin_2g.iter().map(|f| &f[..]),
                eep.ctl_power_data_2g.iter().map(|p| &p[..]),
                true,
            );
        }
        if has_5g {
            render::subsect_name(out, "5 GHz CTL data");
            render_ctl(
                out,
                &eep.ctl_index_5g,
                eep.ctl_freqbin_5g.iter().map(|f| &f[..]),
                eep.ctl_power_data_5g.iter().map(|p| &p[..]),
                false,
            );
        }
    }

    fn dump_init(&self, session: &Session, out: &mut String) {
        render::sect_name(out, "Chip init data");

        match self.data_src {
            DataSrc::None | DataSrc::Blob => {
                out.push_str("Blob has no chip initialization data\n\n");
            }
            DataSrc::Eeprom => {
                // 5416-style register-init records before the data start
                let words = &session.eep_buf[..self.init_data_max_size / 2];
                let ini = common::EepInit::parse(words, false);
                render::eep_init(out, ini.magic, ini.prot, ini.iptr, &ini.regs);
            }
            DataSrc::Otp => {
                // 32-bit flag word followed by {addr, value} register pairs
                let words = &session.eep_buf[..self.init_data_max_size / 2];
                let flags = if words.len() >= 2 {
                    u32::from(words[0]) | (u32::from(words[1]) << 16)
                } else {
                    0
                };
                let _ = writeln!(out, "Flags: 0x{:08x}\n", flags);
                render::subsect_name(out, "Register(s) initialization data");
                let mut i = 2;
                while i + 3 < words.len() {
                    let addr = u32::from(words[i]) | (u32::from(words[i + 1]) << 16);
                    if addr == 0 {
                        break;
                    }
                    let val = u32::from(words[i + 2]) | (u32::from(words[i + 3]) << 16);
                    let _ = writeln!(out, "  {:06X}: {:08X}", addr, val);
                    i += 4;
                }
                out.push('\n');
            }
        }
    }
}

/// 9300-style sparse CTL table rendering.
fn render_ctl<'a>(
    out: &mut String,
    index: &[u8],
    freqbins: impl Iterator<Item = &'a [u8]>,
    powers: impl Iterator<Item = &'a [u8]>,
    is_2g: bool,
) {
    for ((&ctl, freqs), pwrs) in index.iter().zip(freqbins).zip(powers) {
        if ctl == 0x00 || ctl == 0xff {
            continue;
        }
        let _ = writeln!(out, "  {}:", render::ctl_label(ctl));
        let edges: Vec<render::CtlEdge> = freqs
            .iter()
            .zip(pwrs)
            .map(|(&fbin, &p)| render::CtlEdge { fbin, ctl: p })
            .collect();
        render::ctl_edges(out, &edges, is_2g, true);
        out.push('\n');
    }
}

impl EepMap for Eep9300 {
    fn name(&self) -> &'static str {
        "9300"
    }

    fn desc(&self) -> &'static str {
        "EEPROM map for modern .11n chips (AR93xx/AR94xx/AR95xx/etc.)"
    }

    fn srev_reg(&self) -> Option<u32> {
        Some(0x4020)
    }

    fn eep_buf_words(&self) -> usize {
        AR9300_EEPROM_SIZE / 2
    }

    fn unpacked_size(&self) -> usize {
        AR9300_EEPROM_STRUCT_SIZE
    }

    fn templates(&self) -> &'static [Template] {
        t9300::TEMPLATES
    }

    fn provides(&self, op: Op) -> bool {
        matches!(op, Op::LoadBlob | Op::LoadEeprom | Op::LoadOtp | Op::Update)
    }

    fn sections(&self) -> &'static [Section] {
        &[Section::Init, Section::Base, Section::Modal, Section::Power]
    }

    fn load_blob(&mut self, session: &mut Session) -> Result<()> {
        let size = session.con.blob_size()?;
        if size < AR9300_EEPROM_STRUCT_SIZE {
            return Err(Error::not_found("blob is smaller than the calibration image"));
        }

        let mut image = vec![0u8; AR9300_EEPROM_STRUCT_SIZE];
        let read = session.con.blob_read(&mut image)?;
        if read != AR9300_EEPROM_STRUCT_SIZE {
            return Err(Error::io("unable to read EEPROM blob"));
        }

        if !Ar9300Eeprom::data_looks_valid(&image) {
            return Err(Error::integrity("no valid uncompressed EEPROM data"));
        }
        log::debug!("Found valid uncompressed EEPROM data");

        // Mirror the image into the word buffer so `save` works.
        for (i, pair) in image.chunks_exact(2).enumerate() {
            session.eep_buf[i] = u16::from_le_bytes([pair[0], pair[1]]);
        }
        session.eep_len = (AR9300_EEPROM_STRUCT_SIZE + 1) / 2;
        session.unpacked[..AR9300_EEPROM_STRUCT_SIZE].copy_from_slice(&image);

        self.data_src = DataSrc::Blob;
        self.take_unpacked(session)
    }

    fn load_eeprom(&mut self, session: &mut Session, _raw: bool) -> Result<()> {
        self.buf_is_be = false; // EEPROM is always little-endian
        session.eep_len = 0;

        let magic = session.eep_read(common::AR5416_EEPROM_MAGIC_OFFSET)?;
        if magic.swap_bytes() == common::AR5416_EEPROM_MAGIC {
            log::debug!("Use byteswapped EEPROM I/O");
            session.io_swap = !session.io_swap;
        } else if magic != common::AR5416_EEPROM_MAGIC {
            return Err(Error::integrity(format!(
                "invalid EEPROM magic 0x{:04x}",
                magic
            )));
        }
        log::debug!("EEPROM magic found");

        let cptr = if session.srev_is_9485() {
            AR9300_BASE_ADDR
        } else if session.srev_is_9330() {
            AR9300_BASE_ADDR_512
        } else {
            AR9300_BASE_ADDR_4K
        };

        log::debug!("Trying EEPROM access at Address 0x{:04x}", cptr);
        session.fill_eep_buf((cptr + 1) / 2)?;
        if self.process_blocks(session, cptr) > 0 {
            session.eep_len = (cptr + 1) / 2;
            self.data_src = DataSrc::Eeprom;
            return self.take_unpacked(session);
        }

        let cptr = AR9300_BASE_ADDR_512;
        log::debug!("Trying EEPROM access at Address 0x{:04x}", cptr);
        if self.process_blocks(session, cptr) > 0 {
            session.eep_len = (cptr + 1) / 2;
            self.data_src = DataSrc::Eeprom;
            return self.take_unpacked(session);
        }

        Err(Error::not_found(
            "no calibration data at any candidate EEPROM address",
        ))
    }

    fn load_otp(&mut self, session: &mut Session, _raw: bool) -> Result<()> {
        // OTP is native-endian on the wire, but the session packs octets
        // into buffer words low-byte-first, so extraction stays LE here.
        self.buf_is_be = false;
        session.eep_len = 0;

        let cptr = AR9300_BASE_ADDR;
        log::debug!("Trying OTP access at Address 0x{:04x}", cptr);
        session.fill_otp_buf(cptr + 1)?;
        if self.process_blocks(session, cptr) > 0 {
            session.eep_len = (cptr + 1) / 2;
            self.data_src = DataSrc::Otp;
            return self.take_unpacked(session);
        }

        let cptr = AR9300_BASE_ADDR_512;
        log::debug!("Trying OTP access at Address 0x{:04x}", cptr);
        if self.process_blocks(session, cptr) > 0 {
            session.eep_len = (cptr + 1) / 2;
            self.data_src = DataSrc::Otp;
            return self.take_unpacked(session);
        }

        Err(Error::not_found(
            "no calibration data at any candidate OTP address",
        ))
    }

    fn check(&mut self, session: &mut Session) -> Result<()> {
        if self.data_src == DataSrc::None {
            return Err(Error::not_found("no calibration data loaded"));
        }

        // All structural checks ran at loading time; normalise endianness
        // of multi-byte fields when the image declares the other order.
        if self.eep.base.eep_misc & common::AR5416_EEPMISC_BIG_ENDIAN != 0 {
            log::info!("EEPROM endianness is not native, swapping multi-byte fields");
            self.eep = Ar9300Eeprom::parse(&session.unpacked[..AR9300_EEPROM_STRUCT_SIZE], true)?;
        }

        Ok(())
    }

    fn dump(&self, session: &Session, section: Section, out: &mut String) {
        match section {
            Section::Init => self.dump_init(session, out),
            Section::Base => self.dump_base(out),
            Section::Modal => self.dump_modal(out),
            Section::Power => self.dump_power(out),
        }
    }

    fn supports_param(&self, param: &UpdateParam) -> bool {
        matches!(param, UpdateParam::Mac(_))
    }

    fn update(&mut self, session: &mut Session, param: &UpdateParam) -> Result<()> {
        if self.data_src != DataSrc::Blob {
            return Err(Error::not_supported(
                "updating is supported for uncompressed data only",
            ));
        }

        match param {
            UpdateParam::Mac(mac) => {
                // MAC at bytes 2..8 of the image, word offset 1..4
                session.eep_buf[1] = u16::from_le_bytes([mac[0], mac[1]]);
                session.eep_buf[2] = u16::from_le_bytes([mac[2], mac[3]]);
                session.eep_buf[3] = u16::from_le_bytes([mac[4], mac[5]]);
                for addr in 1..4u32 {
                    let word = session.eep_buf[addr as usize];
                    session.eep_write(addr, word).map_err(|_| {
                        Error::io(format!("unable to write EEPROM data at 0x{:04x}", addr))
                    })?;
                }
                self.eep.mac_addr = *mac;
                Ok(())
            }
            UpdateParam::EraseCtl => Err(Error::not_supported("9300: CTL erase")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_size_is_1088() {
        let image = Ar9300Eeprom::default().encode().unwrap();
        assert_eq!(image.len(), AR9300_EEPROM_STRUCT_SIZE);
    }

    #[test]
    fn test_parse_encode_roundtrip() {
        let mut eep = Ar9300Eeprom::default();
        eep.eeprom_version = 2;
        eep.template_version = 6;
        eep.mac_addr = [0, 3, 0x7f, 0, 0, 0];
        eep.base.reg_dmn = [0x0000, 0x001f];
        eep.base.txrx_mask = 0x77;
        eep.base.op_flags = common::AR5416_OPFLAGS_11A;
        eep.base.swreg = 0xdeadbeef;
        eep.modal_5g.ant_ctrl_common2 = 0x00044444;
        eep.modal_5g.papd_rate_mask_ht40 = 0x0cf0e0e0;
        eep.ctl_index_5g[0] = 0x11;
        eep.ctl_freqbin_5g[0][0] = common::freq2fbin(5180, false);

        let image = eep.encode().unwrap();
        let back = Ar9300Eeprom::parse(&image, false).unwrap();
        assert_eq!(back.template_version, 6);
        assert_eq!(back.base.swreg, 0xdeadbeef);
        assert_eq!(back.modal_5g.papd_rate_mask_ht40, 0x0cf0e0e0);
        assert_eq!(back.ctl_freqbin_5g[0][0], common::freq2fbin(5180, false));
        assert_eq!(back.encode().unwrap(), image);
    }

    #[test]
    fn test_endian_swap_on_declared_be() {
        let mut eep = Ar9300Eeprom::default();
        eep.base.reg_dmn = [0x1234, 0x001f];
        eep.base.eep_misc = common::AR5416_EEPMISC_BIG_ENDIAN;
        eep.modal_2g.ant_ctrl_common = 0x00000110;
        let mut image = eep.encode().unwrap();
        // Byte-reverse the two fields to emulate big-endian storage.
        image.swap(28, 29);
        let off = 28 + 25; // modal 2G antCtrlCommon
        image[off..off + 4].reverse();
        let back = Ar9300Eeprom::parse(&image, true).unwrap();
        assert_eq!(back.base.reg_dmn[0], 0x1234);
        assert_eq!(back.modal_2g.ant_ctrl_common, 0x00000110);
    }

    #[test]
    fn test_buf2bstr_reverse_direction() {
        // Words 0x1122 0x3344: bytes at ascending addresses are
        // 22 11 44 33 (LE buffer), extraction at addr=3 len=4 walks down.
        let words = [0x1122u16, 0x3344];
        let out = buf2bstr(&words, 2, false, 3, 4);
        assert_eq!(out, vec![0x33, 0x44, 0x11, 0x22]);
    }

    #[test]
    fn test_buf2bstr_big_endian_buffer() {
        let words = [0x1122u16, 0x3344];
        let out = buf2bstr(&words, 2, true, 3, 4);
        assert_eq!(out, vec![0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_blob_plausibility_check() {
        let mut eep = Ar9300Eeprom::default();
        eep.base.txrx_mask = 0x77;
        eep.base.op_flags = common::AR5416_OPFLAGS_11A;
        let image = eep.encode().unwrap();
        assert!(Ar9300Eeprom::data_looks_valid(&image));

        let mut bad = image.clone();
        bad[32] = 0x0f; // tx mask zero
        assert!(!Ar9300Eeprom::data_looks_valid(&bad));

        let mut bad = image;
        bad[33] = 0; // no band enabled
        assert!(!Ar9300Eeprom::data_looks_valid(&bad));
    }
}

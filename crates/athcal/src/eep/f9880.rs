// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! EEPROM map of the earlier .11ac chips (QCA9880/QCA9882/QCA9892).
//!
//! Calibration data comes either as an uncompressed blob or from an OTP
//! container: a fixed-size header with an `0xAA55` magic at octet 2,
//! followed by variable-length streams. A stream begins with a one-octet
//! marker (`0xB?`, stream code in the low nibble) and ends with the
//! matching `0xC?` end marker repeated twice. CALDATA streams carry a
//! compressed record that is fed to the template+delta decompressor; OTP
//! stores no checksum, so the assembled image gets its checksum slot
//! recomputed.

use std::fmt::Write as _;

use crate::eep::common;
use crate::eep::compress::{self, Template, COMP_CKSUM_LEN, COMP_HDR_LEN};
use crate::eep::cursor::{Cursor, CursorMut};
use crate::eep::render;
use crate::eep::{t9880, EepMap, Op, Section};
use crate::error::{Error, Result};
use crate::loader::Session;

pub const QCA9880_MAX_CHAINS: usize = 3;

pub const QCA9880_OPFLAGS_11A: u8 = 0x01;
pub const QCA9880_OPFLAGS_11G: u8 = 0x02;
pub const QCA9880_OPFLAGS_5G_HT40: u8 = 0x04;
pub const QCA9880_OPFLAGS_2G_HT40: u8 = 0x08;
pub const QCA9880_OPFLAGS_5G_HT20: u8 = 0x10;
pub const QCA9880_OPFLAGS_2G_HT20: u8 = 0x20;

pub const QCA9880_OPFLAGS2_5G_VHT20: u8 = 0x01;
pub const QCA9880_OPFLAGS2_2G_VHT20: u8 = 0x02;
pub const QCA9880_OPFLAGS2_5G_VHT40: u8 = 0x04;
pub const QCA9880_OPFLAGS2_2G_VHT40: u8 = 0x08;
pub const QCA9880_OPFLAGS2_5G_VHT80: u8 = 0x10;

pub const QCA9880_FEATURE_TEMP_COMP: u8 = 0x01;
pub const QCA9880_FEATURE_INT_REGULATOR: u8 = 0x08;

pub const QCA9880_CUSTOMER_DATA_SIZE: usize = 20;

pub const QCA9880_NUM_2G_CAL_PIERS: usize = 3;
pub const QCA9880_NUM_5G_CAL_PIERS: usize = 8;
pub const QCA9880_NUM_CAL_GAINS: usize = 2;

pub const QCA9880_TGTPWR_CCK_2G_NUM_FREQS: usize = 2;
pub const QCA9880_TGTPWR_LEG_2G_NUM_FREQS: usize = 3;
pub const QCA9880_TGTPWR_VHT_2G_NUM_FREQS: usize = 3;
pub const QCA9880_TGTPWR_LEG_5G_NUM_FREQS: usize = 6;
pub const QCA9880_TGTPWR_VHT_5G_NUM_FREQS: usize = 6;
pub const QCA9880_TGTPWR_VHT_NUM_RATES: usize = 18;
pub const QCA9880_TGTPWR_VHT_2G_NUM_BWS: usize = 2; // VHT: 20, 40
pub const QCA9880_TGTPWR_VHT_5G_NUM_BWS: usize = 3; // VHT: 20, 40, 80

const VHT_2G_EXT_DELTA_SIZE: usize = (QCA9880_TGTPWR_VHT_2G_NUM_BWS
    * QCA9880_TGTPWR_VHT_2G_NUM_FREQS
    * QCA9880_TGTPWR_VHT_NUM_RATES
    + 7)
    / 8;
const VHT_5G_EXT_DELTA_SIZE: usize = (QCA9880_TGTPWR_VHT_5G_NUM_BWS
    * QCA9880_TGTPWR_VHT_5G_NUM_FREQS
    * QCA9880_TGTPWR_VHT_NUM_RATES
    + 7)
    / 8;

pub const QCA9880_NUM_2G_CTLS: usize = 18;
pub const QCA9880_NUM_2G_BAND_EDGES: usize = 4;
pub const QCA9880_NUM_5G_CTLS: usize = 18;
pub const QCA9880_NUM_5G_BAND_EDGES: usize = 8;

const NUM_2G_ALPHATHERM_CHANS: usize = 4;
const NUM_5G_ALPHATHERM_CHANS: usize = 8;
const NUM_ALPHATHERM_TEMPS: usize = 4;
const CONFIG_ENTRIES: usize = 24;

/// Canonical uncompressed image size.
pub const QCA9880_EEPROM_STRUCT_SIZE: usize = 8124;
/// Raw source buffer size, bytes.
pub const QCA9880_EEPROM_SIZE: usize = 0x2000;

// OTP container framing
pub const QCA9880_OTP_SIZE: usize = 0x800;
pub const QCA9880_OTP_MAGIC_OFFSET: usize = 0x0002;
pub const QCA9880_OTP_HEADER_SIZE: usize = 0x0010;
pub const QCA9880_OTP_MAGIC: [u8; 2] = [0xaa, 0x55];

const OTP_STR_MARK_BEGIN: u8 = 0xb0;
const OTP_STR_MARK_END: u8 = 0xc0;
const OTP_STR_MARK_MASK: u8 = 0xf0;
const OTP_STR_MARK_CODE_MASK: u8 = 0x0f;

/// OTP stream payload types.
pub const QCA9880_OTP_STR_TYPE_CALDATA: u8 = 1;

fn mark_is_begin(octet: u8) -> bool {
    octet & OTP_STR_MARK_MASK == OTP_STR_MARK_BEGIN
}

fn mark_is_end(octet: u8) -> bool {
    octet & OTP_STR_MARK_MASK == OTP_STR_MARK_END
}

fn mark_code(octet: u8) -> u8 {
    octet & OTP_STR_MARK_CODE_MASK
}

#[derive(Debug, Clone, Default)]
pub struct EepFlags {
    pub op_flags: u8,
    pub feature_flags: u8,
    pub misc_flags: u8,
    pub board_flags: u32,
    pub op_flags2: u8,
}

#[derive(Debug, Clone)]
pub struct BaseHdr {
    pub length: u16,
    pub checksum: u16,
    pub eeprom_version: u8,
    pub template_version: u8,
    pub mac_addr: [u8; 6],
    pub reg_dmn: [u16; 2],
    pub op_cap_brd_flags: EepFlags,
    pub bin_build_number: u16,
    pub txrx_mask: u8,
    pub rf_silent: u8,
    pub wlan_led_gpio: u8,
    pub spur_base_a: u8,
    pub spur_base_b: u8,
    pub spur_rssi_thresh: u8,
    pub spur_rssi_thresh_cck: u8,
    pub spur_mit_flag: u8,
    pub swreg: u8,
    pub txrxgain: u8,
    pub pwr_table_offset: i8,
    pub param_for_tuning_caps: u8,
    pub delta_cck_20: i8,
    pub delta_40_20: i8,
    pub delta_80_20: i8,
    pub cust_data: [u8; QCA9880_CUSTOMER_DATA_SIZE],
    pub param_for_tuning_caps1: u8,
}

impl Default for BaseHdr {
    fn default() -> Self {
        Self {
            length: 0,
            checksum: 0,
            eeprom_version: 0,
            template_version: 0,
            mac_addr: [0; 6],
            reg_dmn: [0; 2],
            op_cap_brd_flags: EepFlags::default(),
            bin_build_number: 0,
            txrx_mask: 0,
            rf_silent: 0,
            wlan_led_gpio: 0,
            spur_base_a: 0,
            spur_base_b: 0,
            spur_rssi_thresh: 0,
            spur_rssi_thresh_cck: 0,
            spur_mit_flag: 0,
            swreg: 0,
            txrxgain: 0,
            pwr_table_offset: 0,
            param_for_tuning_caps: 0,
            delta_cck_20: 0,
            delta_40_20: 0,
            delta_80_20: 0,
            cust_data: [0; QCA9880_CUSTOMER_DATA_SIZE],
            param_for_tuning_caps1: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpurChan {
    pub spur_chan: u8,
    pub spur_a_prim_sec_choose: u8,
    pub spur_b_prim_sec_choose: u8,
}

#[derive(Debug, Clone, Default)]
pub struct ModalHdr {
    pub volt_slope: [i8; QCA9880_MAX_CHAINS],
    pub spur_chans: [SpurChan; common::AR5416_EEPROM_MODAL_SPURS],
    pub xpa_bias_lvl: u8,
    pub antenna_gain: i8,
    pub ant_ctrl_common: u32,
    pub ant_ctrl_common2: u32,
    pub ant_ctrl_chain: [u16; QCA9880_MAX_CHAINS],
    pub rx_filter_cap: u8,
    pub rx_gain_cap: u8,
    pub txrxgain: u8,
    pub noise_floor_thresh: i8,
    pub min_cca_pwr: [i8; QCA9880_MAX_CHAINS],
}

/// Per-band modal pier quadruple (2G / 5G low / 5G mid / 5G high).
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalPiers {
    pub value_2g: u8,
    pub value_5g_low: u8,
    pub value_5g_mid: u8,
    pub value_5g_high: u8,
}

#[derive(Debug, Clone, Default)]
pub struct BaseExt {
    pub xatten1_db: [ModalPiers; QCA9880_MAX_CHAINS],
    pub xatten1_margin: [ModalPiers; QCA9880_MAX_CHAINS],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThermCal {
    pub therm_adc_scaled_gain: u16,
    pub therm_adc_offset: i8,
    pub rbias: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CalPerChain {
    pub txgain_idx: [u8; QCA9880_NUM_CAL_GAINS],
    pub power: [u16; QCA9880_NUM_CAL_GAINS],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CalPierData {
    pub cal_per_chain: [CalPerChain; QCA9880_MAX_CHAINS],
    pub dac_gain: [i8; QCA9880_NUM_CAL_GAINS],
    pub therm_cal_val: u8,
    pub volt_cal_val: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TgtPowLegacy {
    pub t_pow2x: [u8; 4],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TgtPowVht {
    pub t_pow2x_base: [u8; QCA9880_MAX_CHAINS],
    pub t_pow2x_delta: [u8; QCA9880_TGTPWR_VHT_NUM_RATES / 2],
}

#[derive(Debug, Clone)]
pub struct Qca9880Eeprom {
    pub base: BaseHdr,
    pub modal_5g: ModalHdr,
    pub modal_2g: ModalHdr,
    pub base_ext: BaseExt,
    pub therm_cal: ThermCal,

    pub cal_freq_pier_2g: [u8; QCA9880_NUM_2G_CAL_PIERS],
    pub cal_pier_data_2g: [CalPierData; QCA9880_NUM_2G_CAL_PIERS],
    pub ext_t_pow2x_delta_2g: [u8; VHT_2G_EXT_DELTA_SIZE],
    pub target_freqbin_2g_cck: [u8; QCA9880_TGTPWR_CCK_2G_NUM_FREQS],
    pub target_freqbin_2g_leg: [u8; QCA9880_TGTPWR_LEG_2G_NUM_FREQS],
    pub target_freqbin_2g_vht20: [u8; QCA9880_TGTPWR_VHT_2G_NUM_FREQS],
    pub target_freqbin_2g_vht40: [u8; QCA9880_TGTPWR_VHT_2G_NUM_FREQS],
    pub target_power_2g_cck: [TgtPowLegacy; QCA9880_TGTPWR_CCK_2G_NUM_FREQS],
    pub target_power_2g_leg: [TgtPowLegacy; QCA9880_TGTPWR_LEG_2G_NUM_FREQS],
    pub target_power_2g_vht20: [TgtPowVht; QCA9880_TGTPWR_VHT_2G_NUM_FREQS],
    pub target_power_2g_vht40: [TgtPowVht; QCA9880_TGTPWR_VHT_2G_NUM_FREQS],
    pub ctl_index_2g: [u8; QCA9880_NUM_2G_CTLS],
    pub ctl_freqbin_2g: [[u8; QCA9880_NUM_2G_BAND_EDGES]; QCA9880_NUM_2G_CTLS],
    pub ctl_data_2g: [[u8; QCA9880_NUM_2G_BAND_EDGES]; QCA9880_NUM_2G_CTLS],
    pub alpha_therm_tbl_2g:
        [[[u8; NUM_ALPHATHERM_TEMPS]; NUM_2G_ALPHATHERM_CHANS]; QCA9880_MAX_CHAINS],

    pub cal_freq_pier_5g: [u8; QCA9880_NUM_5G_CAL_PIERS],
    pub cal_pier_data_5g: [CalPierData; QCA9880_NUM_5G_CAL_PIERS],
    pub ext_t_pow2x_delta_5g: [u8; VHT_5G_EXT_DELTA_SIZE],
    pub target_freqbin_5g_leg: [u8; QCA9880_TGTPWR_LEG_5G_NUM_FREQS],
    pub target_freqbin_5g_vht20: [u8; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
    pub target_freqbin_5g_vht40: [u8; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
    pub target_freqbin_5g_vht80: [u8; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
    pub target_power_5g_leg: [TgtPowLegacy; QCA9880_TGTPWR_LEG_5G_NUM_FREQS],
    pub target_power_5g_vht20: [TgtPowVht; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
    pub target_power_5g_vht40: [TgtPowVht; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
    pub target_power_5g_vht80: [TgtPowVht; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
    pub ctl_index_5g: [u8; QCA9880_NUM_5G_CTLS],
    pub ctl_freqbin_5g: [[u8; QCA9880_NUM_5G_BAND_EDGES]; QCA9880_NUM_5G_CTLS],
    pub ctl_data_5g: [[u8; QCA9880_NUM_5G_BAND_EDGES]; QCA9880_NUM_5G_CTLS],
    pub alpha_therm_tbl_5g:
        [[[u8; NUM_ALPHATHERM_TEMPS]; NUM_5G_ALPHATHERM_CHANS]; QCA9880_MAX_CHAINS],

    pub config_addr: [u32; CONFIG_ENTRIES],
}

impl Default for Qca9880Eeprom {
    fn default() -> Self {
        Self {
            base: BaseHdr::default(),
            modal_5g: ModalHdr::default(),
            modal_2g: ModalHdr::default(),
            base_ext: BaseExt::default(),
            therm_cal: ThermCal::default(),
            cal_freq_pier_2g: [0; QCA9880_NUM_2G_CAL_PIERS],
            cal_pier_data_2g: Default::default(),
            ext_t_pow2x_delta_2g: [0; VHT_2G_EXT_DELTA_SIZE],
            target_freqbin_2g_cck: [0; QCA9880_TGTPWR_CCK_2G_NUM_FREQS],
            target_freqbin_2g_leg: [0; QCA9880_TGTPWR_LEG_2G_NUM_FREQS],
            target_freqbin_2g_vht20: [0; QCA9880_TGTPWR_VHT_2G_NUM_FREQS],
            target_freqbin_2g_vht40: [0; QCA9880_TGTPWR_VHT_2G_NUM_FREQS],
            target_power_2g_cck: Default::default(),
            target_power_2g_leg: Default::default(),
            target_power_2g_vht20: Default::default(),
            target_power_2g_vht40: Default::default(),
            ctl_index_2g: [0; QCA9880_NUM_2G_CTLS],
            ctl_freqbin_2g: Default::default(),
            ctl_data_2g: Default::default(),
            alpha_therm_tbl_2g: Default::default(),
            cal_freq_pier_5g: [0; QCA9880_NUM_5G_CAL_PIERS],
            cal_pier_data_5g: Default::default(),
            ext_t_pow2x_delta_5g: [0; VHT_5G_EXT_DELTA_SIZE],
            target_freqbin_5g_leg: [0; QCA9880_TGTPWR_LEG_5G_NUM_FREQS],
            target_freqbin_5g_vht20: [0; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
            target_freqbin_5g_vht40: [0; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
            target_freqbin_5g_vht80: [0; QCA9880_TGTPWR_VHT_5G_NUM_FREQS],
            target_power_5g_leg: Default::default(),
            target_power_5g_vht20: Default::default(),
            target_power_5g_vht40: Default::default(),
            target_power_5g_vht80: Default::default(),
            ctl_index_5g: [0; QCA9880_NUM_5G_CTLS],
            ctl_freqbin_5g: Default::default(),
            ctl_data_5g: Default::default(),
            alpha_therm_tbl_5g: Default::default(),
            config_addr: [0; CONFIG_ENTRIES],
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
    for v in &mut m.volt_slope {
        *v = c.read_i8()?;
    }
    for spur in &mut m.spur_chans {
        spur.spur_chan = c.read_u8()?;
        spur.spur_a_prim_sec_choose = c.read_u8()?;
        spur.spur_b_prim_sec_choose = c.read_u8()?;
    }
    m.xpa_bias_lvl = c.read_u8()?;
    m.antenna_gain = c.read_i8()?;
    m.ant_ctrl_common = sw32(c.read_u32()?, swap);
    m.ant_ctrl_common2 = sw32(c.read_u32()?, swap);
    for chain in &mut m.ant_ctrl_chain {
        *chain = sw16(c.read_u16()?, swap);
    }
    m.rx_filter_cap = c.read_u8()?;
    m.rx_gain_cap = c.read_u8()?;
    m.txrxgain = c.read_u8()?;
    m.noise_floor_thresh = c.read_i8()?;
    for p in &mut m.min_cca_pwr {
        *p = c.read_i8()?;
    }
    c.skip(123)?; // futureModal
    Ok(m)
}

fn encode_modal(c: &mut CursorMut<'_>, m: &ModalHdr) -> Result<()> {
    for v in &m.volt_slope {
        c.write_i8(*v)?;
    }
    for spur in &m.spur_chans {
        c.write_u8(spur.spur_chan)?;
        c.write_u8(spur.spur_a_prim_sec_choose)?;
        c.write_u8(spur.spur_b_prim_sec_choose)?;
    }
    c.write_u8(m.xpa_bias_lvl)?;
    c.write_i8(m.antenna_gain)?;
    c.write_u32(m.ant_ctrl_common)?;
    c.write_u32(m.ant_ctrl_common2)?;
    for chain in &m.ant_ctrl_chain {
        c.write_u16(*chain)?;
    }
    c.write_u8(m.rx_filter_cap)?;
    c.write_u8(m.rx_gain_cap)?;
    c.write_u8(m.txrxgain)?;
    c.write_i8(m.noise_floor_thresh)?;
    for p in &m.min_cca_pwr {
        c.write_i8(*p)?;
    }
    c.skip(123)?;
    Ok(())
}

fn parse_pier_data(c: &mut Cursor<'_>, swap: bool) -> Result<CalPierData> {
    let mut d = CalPierData::default();
    for chain in &mut d.cal_per_chain {
        chain.txgain_idx = c.read_array()?;
        for p in &mut chain.power {
            *p = sw16(c.read_u16()?, swap);
        }
    }
    for g in &mut d.dac_gain {
        *g = c.read_i8()?;
    }
    d.therm_cal_val = c.read_u8()?;
    d.volt_cal_val = c.read_u8()?;
    Ok(d)
}

fn encode_pier_data(c: &mut CursorMut<'_>, d: &CalPierData) -> Result<()> {
    for chain in &d.cal_per_chain {
        c.write_bytes(&chain.txgain_idx)?;
        for p in &chain.power {
            c.write_u16(*p)?;
        }
    }
    for g in &d.dac_gain {
        c.write_i8(*g)?;
    }
    c.write_u8(d.therm_cal_val)?;
    c.write_u8(d.volt_cal_val)?;
    Ok(())
}

impl Qca9880Eeprom {
    pub fn parse(image: &[u8], swap: bool) -> Result<Qca9880Eeprom> {
        let mut c = Cursor::new(image);
        let mut eep = Qca9880Eeprom::default();

        let b = &mut eep.base;
        b.length = sw16(c.read_u16()?, swap);
        b.checksum = sw16(c.read_u16()?, swap);
        b.eeprom_version = c.read_u8()?;
        b.template_version = c.read_u8()?;
        b.mac_addr = c.read_array()?;
        b.reg_dmn = [sw16(c.read_u16()?, swap), sw16(c.read_u16()?, swap)];
        b.op_cap_brd_flags.op_flags = c.read_u8()?;
        b.op_cap_brd_flags.feature_flags = c.read_u8()?;
        b.op_cap_brd_flags.misc_flags = c.read_u8()?;
        c.skip(1)?;
        b.op_cap_brd_flags.board_flags = sw32(c.read_u32()?, swap);
        c.skip(2)?;
        b.op_cap_brd_flags.op_flags2 = c.read_u8()?;
        c.skip(1)?;
        b.bin_build_number = sw16(c.read_u16()?, swap);
        b.txrx_mask = c.read_u8()?;
        b.rf_silent = c.read_u8()?;
        b.wlan_led_gpio = c.read_u8()?;
        b.spur_base_a = c.read_u8()?;
        b.spur_base_b = c.read_u8()?;
        b.spur_rssi_thresh = c.read_u8()?;
        b.spur_rssi_thresh_cck = c.read_u8()?;
        b.spur_mit_flag = c.read_u8()?;
        b.swreg = c.read_u8()?;
        b.txrxgain = c.read_u8()?;
        b.pwr_table_offset = c.read_i8()?;
        b.param_for_tuning_caps = c.read_u8()?;
        b.delta_cck_20 = c.read_i8()?;
        b.delta_40_20 = c.read_i8()?;
        b.delta_80_20 = c.read_i8()?;
        b.cust_data = c.read_array()?;
        b.param_for_tuning_caps1 = c.read_u8()?;
        c.skip(66)?; // futureBase

        eep.modal_5g = parse_modal(&mut c, swap)?;
        eep.modal_2g = parse_modal(&mut c, swap)?;

        for x in &mut eep.base_ext.xatten1_db {
            *x = parse_modal_piers(&mut c)?;
        }
        for x in &mut eep.base_ext.xatten1_margin {
            *x = parse_modal_piers(&mut c)?;
        }
        c.skip(QCA9880_MAX_CHAINS * 5 * 4)?; // reserved modal piers

        eep.therm_cal.therm_adc_scaled_gain = sw16(c.read_u16()?, swap);
        eep.therm_cal.therm_adc_offset = c.read_i8()?;
        eep.therm_cal.rbias = c.read_u8()?;

        eep.cal_freq_pier_2g = c.read_array()?;
        c.skip(1)?;
        for pier in &mut eep.cal_pier_data_2g {
            *pier = parse_pier_data(&mut c, swap)?;
        }
        c.skip(46)?; // futureCalData2G

        eep.ext_t_pow2x_delta_2g = c.read_array()?;
        c.skip(2)?;
        eep.target_freqbin_2g_cck = c.read_array()?;
        eep.target_freqbin_2g_leg = c.read_array()?;
        c.skip(1)?;
        eep.target_freqbin_2g_vht20 = c.read_array()?;
        c.skip(1)?;
        eep.target_freqbin_2g_vht40 = c.read_array()?;
        c.skip(1)?;
        for t in &mut eep.target_power_2g_cck {
            t.t_pow2x = c.read_array()?;
        }
        for t in &mut eep.target_power_2g_leg {
            t.t_pow2x = c.read_array()?;
        }
        for t in &mut eep.target_power_2g_vht20 {
            t.t_pow2x_base = c.read_array()?;
            t.t_pow2x_delta = c.read_array()?;
        }
        for t in &mut eep.target_power_2g_vht40 {
            t.t_pow2x_base = c.read_array()?;
            t.t_pow2x_delta = c.read_array()?;
        }

        eep.ctl_index_2g = c.read_array()?;
        c.skip(2)?;
        for f in &mut eep.ctl_freqbin_2g {
            *f = c.read_array()?;
        }
        for d in &mut eep.ctl_data_2g {
            *d = c.read_array()?;
        }
        c.skip(40)?; // futureCtl2G

        for chain in &mut eep.alpha_therm_tbl_2g {
            for chan in chain.iter_mut() {
                *chan = c.read_array()?;
            }
        }
        c.skip(2)?;

        eep.cal_freq_pier_5g = c.read_array()?;
        for pier in &mut eep.cal_pier_data_5g {
            *pier = parse_pier_data(&mut c, swap)?;
        }
        c.skip(20)?; // futureCalData5G

        eep.ext_t_pow2x_delta_5g = c.read_array()?;
        c.skip(3)?;
        eep.target_freqbin_5g_leg = c.read_array()?;
        eep.target_freqbin_5g_vht20 = c.read_array()?;
        eep.target_freqbin_5g_vht40 = c.read_array()?;
        eep.target_freqbin_5g_vht80 = c.read_array()?;
        for t in &mut eep.target_power_5g_leg {
            t.t_pow2x = c.read_array()?;
        }
        for t in &mut eep.target_power_5g_vht20 {
            t.t_pow2x_base = c.read_array()?;
            t.t_pow2x_delta = c.read_array()?;
        }
        for t in &mut eep.target_power_5g_vht40 {
            t.t_pow2x_base = c.read_array()?;
            t.t_pow2x_delta = c.read_array()?;
        }
        for t in &mut eep.target_power_5g_vht80 {
            t.t_pow2x_base = c.read_array()?;
            t.t_pow2x_delta = c.read_array()?;
        }

        eep.ctl_index_5g = c.read_array()?;
        c.skip(2)?;
        for f in &mut eep.ctl_freqbin_5g {
            *f = c.read_array()?;
        }
        for d in &mut eep.ctl_data_5g {
            *d = c.read_array()?;
        }
        c.skip(64)?; // futureCtl5G

        for chain in &mut eep.alpha_therm_tbl_5g {
            for chan in chain.iter_mut() {
                *chan = c.read_array()?;
            }
        }

        for entry in &mut eep.config_addr {
            *entry = sw32(c.read_u32()?, swap);
        }

        Ok(eep)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut image = vec![0u8; QCA9880_EEPROM_STRUCT_SIZE];
        let mut c = CursorMut::new(&mut image);

        let b = &self.base;
        c.write_u16(b.length)?;
        c.write_u16(b.checksum)?;
        c.write_u8(b.eeprom_version)?;
        c.write_u8(b.template_version)?;
        c.write_bytes(&b.mac_addr)?;
        c.write_u16(b.reg_dmn[0])?;
        c.write_u16(b.reg_dmn[1])?;
        c.write_u8(b.op_cap_brd_flags.op_flags)?;
        c.write_u8(b.op_cap_brd_flags.feature_flags)?;
        c.write_u8(b.op_cap_brd_flags.misc_flags)?;
        c.skip(1)?;
        c.write_u32(b.op_cap_brd_flags.board_flags)?;
        c.skip(2)?;
        c.write_u8(b.op_cap_brd_flags.op_flags2)?;
        c.skip(1)?;
        c.write_u16(b.bin_build_number)?;
        c.write_u8(b.txrx_mask)?;
        c.write_u8(b.rf_silent)?;
        c.write_u8(b.wlan_led_gpio)?;
        c.write_u8(b.spur_base_a)?;
        c.write_u8(b.spur_base_b)?;
        c.write_u8(b.spur_rssi_thresh)?;
        c.write_u8(b.spur_rssi_thresh_cck)?;
        c.write_u8(b.spur_mit_flag)?;
        c.write_u8(b.swreg)?;
        c.write_u8(b.txrxgain)?;
        c.write_i8(b.pwr_table_offset)?;
        c.write_u8(b.param_for_tuning_caps)?;
        c.write_i8(b.delta_cck_20)?;
        c.write_i8(b.delta_40_20)?;
        c.write_i8(b.delta_80_20)?;
        c.write_bytes(&b.cust_data)?;
        c.write_u8(b.param_for_tuning_caps1)?;
        c.skip(66)?;

        encode_modal(&mut c, &self.modal_5g)?;
        encode_modal(&mut c, &self.modal_2g)?;

        for x in &self.base_ext.xatten1_db {
            encode_modal_piers(&mut c, x)?;
        }
        for x in &self.base_ext.xatten1_margin {
            encode_modal_piers(&mut c, x)?;
        }
        c.skip(QCA9880_MAX_CHAINS * 5 * 4)?;

        c.write_u16(self.therm_cal.therm_adc_scaled_gain)?;
        c.write_i8(self.therm_cal.therm_adc_offset)?;
        c.write_u8(self.therm_cal.rbias)?;

        c.write_bytes(&self.cal_freq_pier_2g)?;
        c.skip(1)?;
        for pier in &self.cal_pier_data_2g {
            encode_pier_data(&mut c, pier)?;
        }
        c.skip(46)?;

        c.write_bytes(&self.ext_t_pow2x_delta_2g)?;
        c.skip(2)?;
        c.write_bytes(&self.target_freqbin_2g_cck)?;
        c.write_bytes(&self.target_freqbin_2g_leg)?;
        c.skip(1)?;
        c.write_bytes(&self.target_freqbin_2g_vht20)?;
        c.skip(1)?;
        c.write_bytes(&self.target_freqbin_2g_vht40)?;
        c.skip(1)?;
        for t in &self.target_power_2g_cck {
            c.write_bytes(&t.t_pow2x)?;
        }
        for t in &self.target_power_2g_leg {
            c.write_bytes(&t.t_pow2x)?;
        }
        for t in &self.target_power_2g_vht20 {
            c.write_bytes(&t.t_pow2x_base)?;
            c.write_bytes(&t.t_pow2x_delta)?;
        }
        for t in &self.target_power_2g_vht40 {
            c.write_bytes(&t.t_pow2x_base)?;
            c.write_bytes(&t.t_pow2x_delta)?;
        }

        c.write_bytes(&self.ctl_index_2g)?;
        c.skip(2)?;
        for f in &self.ctl_freqbin_2g {
            c.write_bytes(f)?;
        }
        for d in &self.ctl_data_2g {
            c.write_bytes(d)?;
        }
        c.skip(40)?;

        for chain in &self.alpha_therm_tbl_2g {
            for chan in chain {
                c.write_bytes(chan)?;
            }
        }
        c.skip(2)?;

        c.write_bytes(&self.cal_freq_pier_5g)?;
        for pier in &self.cal_pier_data_5g {
            encode_pier_data(&mut c, pier)?;
        }
        c.skip(20)?;

        c.write_bytes(&self.ext_t_pow2x_delta_5g)?;
        c.skip(3)?;
        c.write_bytes(&self.target_freqbin_5g_leg)?;
        c.write_bytes(&self.target_freqbin_5g_vht20)?;
        c.write_bytes(&self.target_freqbin_5g_vht40)?;
        c.write_bytes(&self.target_freqbin_5g_vht80)?;
        for t in &self.target_power_5g_leg {
            c.write_bytes(&t.t_pow2x)?;
        }
        for t in &self.target_power_5g_vht20 {
            c.write_bytes(&t.t_pow2x_base)?;
            c.write_bytes(&t.t_pow2x_delta)?;
        }
        for t in &self.target_power_5g_vht40 {
            c.write_bytes(&t.t_pow2x_base)?;
            c.write_bytes(&t.t_pow2x_delta)?;
        }
        for t in &self.target_power_5g_vht80 {
            c.write_bytes(&t.t_pow2x_base)?;
            c.write_bytes(&t.t_pow2x_delta)?;
        }

        c.write_bytes(&self.ctl_index_5g)?;
        c.skip(2)?;
        for f in &self.ctl_freqbin_5g {
            c.write_bytes(f)?;
        }
        for d in &self.ctl_data_5g {
            c.write_bytes(d)?;
        }
        c.skip(64)?;

        for chain in &self.alpha_therm_tbl_5g {
            for chan in chain {
                c.write_bytes(chan)?;
            }
        }

        for entry in &self.config_addr {
            c.write_u32(*entry)?;
        }

        // Tail pad up to the canonical image size.
        Ok(image)
    }
}

fn parse_modal_piers(c: &mut Cursor<'_>) -> Result<ModalPiers> {
    Ok(ModalPiers {
        value_2g: c.read_u8()?,
        value_5g_low: c.read_u8()?,
        value_5g_mid: c.read_u8()?,
        value_5g_high: c.read_u8()?,
    })
}

fn encode_modal_piers(c: &mut CursorMut<'_>, p: &ModalPiers) -> Result<()> {
    c.write_u8(p.value_2g)?;
    c.write_u8(p.value_5g_low)?;
    c.write_u8(p.value_5g_mid)?;
    c.write_u8(p.value_5g_high)?;
    Ok(())
}

pub struct Eep9880 {
    eep: Qca9880Eeprom,
    loaded: bool,
}

impl Default for Eep9880 {
    fn default() -> Self {
        Self::new()
    }
}

impl Eep9880 {
    pub fn new() -> Self {
        Self {
            eep: Qca9880Eeprom::default(),
            loaded: false,
        }
    }

    /// Decode one CALDATA OTP stream payload into the unpacked buffer.
    fn proc_otp_caldata(session: &mut Session, data: &[u8]) -> Result<()> {
        let hdr = compress::comp_hdr_unpack(data);
        log::debug!(
            "Found block at 0: comp={:?} ref={} length={} major={} minor={}",
            hdr.comp,
            hdr.reference,
            hdr.len,
            hdr.maj,
            hdr.min
        );

        if data.len() < COMP_HDR_LEN + hdr.len + COMP_CKSUM_LEN {
            return Err(Error::integrity(
                "caldata block length greater than OTP stream length",
            ));
        }
        let payload = &data[COMP_HDR_LEN..COMP_HDR_LEN + hdr.len];

        let cksum = compress::comp_checksum(payload);
        let stored = u16::from(data[COMP_HDR_LEN + hdr.len])
            | (u16::from(data[COMP_HDR_LEN + hdr.len + 1]) << 8);
        if cksum != stored {
            return Err(Error::integrity(format!(
                "bad caldata block checksum (got 0x{:04x}, expect 0x{:04x})",
                cksum, stored
            )));
        }

        let mut asm = compress::Assembler::new(t9880::TEMPLATES);
        let out = &mut session.unpacked[..QCA9880_EEPROM_STRUCT_SIZE];
        asm.apply(0, &hdr, payload, out)
    }

    fn take_unpacked(&mut self, session: &mut Session) -> Result<()> {
        session.unpacked_len = QCA9880_EEPROM_STRUCT_SIZE;
        self.eep = Qca9880Eeprom::parse(&session.unpacked[..QCA9880_EEPROM_STRUCT_SIZE], false)?;
        self.loaded = true;
        Ok(())
    }

    fn dump_base(&self, out: &mut String) {
        let b = &self.eep.base;
        let flags = &b.op_cap_brd_flags;

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
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RegDomain1", b.reg_dmn[0]);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RegDomain2", b.reg_dmn[1]);
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Allow 5GHz",
            u8::from(flags.op_flags & QCA9880_OPFLAGS_11A != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}/{}",
            "Allow 5GHz HT20/HT40",
            u8::from(flags.op_flags & QCA9880_OPFLAGS_5G_HT20 != 0),
            u8::from(flags.op_flags & QCA9880_OPFLAGS_5G_HT40 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}/{}/{}",
            "Allow 5GHz VHT20/VHT40/VHT80",
            u8::from(flags.op_flags2 & QCA9880_OPFLAGS2_5G_VHT20 != 0),
            u8::from(flags.op_flags2 & QCA9880_OPFLAGS2_5G_VHT40 != 0),
            u8::from(flags.op_flags2 & QCA9880_OPFLAGS2_5G_VHT80 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Allow 2GHz",
            u8::from(flags.op_flags & QCA9880_OPFLAGS_11G != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}/{}",
            "Allow 2GHz HT20/HT40",
            u8::from(flags.op_flags & QCA9880_OPFLAGS_2G_HT20 != 0),
            u8::from(flags.op_flags & QCA9880_OPFLAGS_2G_HT40 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}/{}",
            "Allow 2GHz VHT20/VHT40",
            u8::from(flags.op_flags2 & QCA9880_OPFLAGS2_2G_VHT20 != 0),
            u8::from(flags.op_flags2 & QCA9880_OPFLAGS2_2G_VHT40 != 0)
        );
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "Cal Bin Ver", b.bin_build_number);
        let _ = writeln!(out, "{:<30} : 0x{:02X}", "TX Mask", b.txrx_mask >> 4);
        let _ = writeln!(out, "{:<30} : 0x{:02X}", "RX Mask", b.txrx_mask & 0x0f);
        let _ = writeln!(out, "{:<30} : {}", "Tx Gain", b.txrxgain >> 4);
        let _ = writeln!(out, "{:<30} : {}", "Rx Gain", b.txrxgain & 0xf);
        let _ = writeln!(out, "{:<30} : {}", "Power Table Offset", b.pwr_table_offset);
        let _ = writeln!(out, "{:<30} : {}", "CCK/OFDM Pwr Delta, dB", b.delta_cck_20);
        let _ = writeln!(out, "{:<30} : {}", "40/20 Pwr Delta, dB", b.delta_40_20);
        let _ = writeln!(out, "{:<30} : {}", "80/20 Pwr Delta, dB", b.delta_80_20);

        out.push_str("\nCustomer Data in hex:\n");
        render::hexdump(out, &b.cust_data);
        out.push('\n');
    }

    fn dump_modal(&self, out: &mut String) {
        let eep = &self.eep;
        let op_flags = eep.base.op_cap_brd_flags.op_flags;
        let has_2g = op_flags & QCA9880_OPFLAGS_11G != 0;
        let has_5g = op_flags & QCA9880_OPFLAGS_11A != 0;

        render::sect_name(out, "EEPROM Modal Header");

        let _ = write!(out, "{:35}", "");
        if has_2g {
            let _ = write!(out, "  {:<20}", "2G");
        }
        if has_5g {
            let _ = write!(out, "  {}", "5G");
        }
        out.push_str("\n\n");

        let mut line = |token: &str, f: &dyn Fn(&ModalHdr) -> String| {
            let _ = write!(out, "{:<33} :", token);
            if has_2g {
                let _ = write!(out, "  {:<20}", f(&eep.modal_2g));
            }
            if has_5g {
                let _ = write!(out, "  {}", f(&eep.modal_5g));
            }
            out.push('\n');
        };

        for i in 0..QCA9880_MAX_CHAINS {
            line(&format!("Antenna Ctrl Chain {}", i), &|m| {
                format!("0x{:X}", m.ant_ctrl_chain[i])
            });
        }
        line("Antenna Ctrl Common", &|m| format!("0x{:X}", m.ant_ctrl_common));
        line("Antenna Ctrl Common2", &|m| {
            format!("0x{:X}", m.ant_ctrl_common2)
        });
        line("Antenna Gain", &|m| format!("{}", m.antenna_gain));
        line("NF Thresh", &|m| format!("{}", m.noise_floor_thresh));
        line("xPA bias level", &|m| format!("{}", m.xpa_bias_lvl));

        out.push('\n');
    }

    fn dump_tgt_pow_legacy(
        out: &mut String,
        freqs: &[u8],
        data: &[TgtPowLegacy],
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
            for d in data {
                let _ = write!(out, "  {:4.1}", f64::from(d.t_pow2x[i]) / 2.0);
            }
            out.push('\n');
        }
    }

    /// VHT rate power: per-stream base plus a 4-bit delta nibble, extended
    /// to 5 bits by the external delta bit table.
    fn vht_power(
        data: &TgtPowVht,
        ext_delta: &[u8],
        bwidx: usize,
        nfreqs: usize,
        freq_idx: usize,
        stream: usize,
        rate_idx: usize,
    ) -> u8 {
        let base = data.t_pow2x_base[stream];
        let mut delta = (data.t_pow2x_delta[rate_idx / 2] >> (4 * (rate_idx % 2))) & 0x0f;
        let ebidx = (bwidx * nfreqs + freq_idx) * QCA9880_TGTPWR_VHT_NUM_RATES + rate_idx;
        let ed = (ext_delta[ebidx / 8] >> (ebidx % 8)) & 0x01;
        delta |= ed << 4;
        base.wrapping_add(delta)
    }

    fn dump_tgt_pow_vht(
        out: &mut String,
        freqs: &[u8],
        data: &[TgtPowVht],
        ext_delta: &[u8],
        bwidx: usize,
        maxstreams: usize,
        is_2g: bool,
    ) {
        struct RateRow {
            ht_mcs: &'static str,
            vht_mcs: &'static str,
            nstreams: usize,
            rate_idx: usize,
        }
        const RATES: [RateRow; 24] = [
            RateRow { ht_mcs: "    0", vht_mcs: "    0", nstreams: 1, rate_idx: 0 },
            RateRow { ht_mcs: "  1-2", vht_mcs: "  1-2", nstreams: 1, rate_idx: 1 },
            RateRow { ht_mcs: "  3-4", vht_mcs: "  3-4", nstreams: 1, rate_idx: 2 },
            RateRow { ht_mcs: "    5", vht_mcs: "    5", nstreams: 1, rate_idx: 3 },
            RateRow { ht_mcs: "    6", vht_mcs: "    6", nstreams: 1, rate_idx: 4 },
            RateRow { ht_mcs: "    7", vht_mcs: "    7", nstreams: 1, rate_idx: 5 },
            RateRow { ht_mcs: "     ", vht_mcs: "    8", nstreams: 1, rate_idx: 6 },
            RateRow { ht_mcs: "     ", vht_mcs: "    9", nstreams: 1, rate_idx: 7 },
            RateRow { ht_mcs: "    8", vht_mcs: "   10", nstreams: 2, rate_idx: 0 },
            RateRow { ht_mcs: " 9-10", vht_mcs: "11-12", nstreams: 2, rate_idx: 1 },
            RateRow { ht_mcs: "11-12", vht_mcs: "13-14", nstreams: 2, rate_idx: 2 },
            RateRow { ht_mcs: "   13", vht_mcs: "   15", nstreams: 2, rate_idx: 8 },
            RateRow { ht_mcs: "   14", vht_mcs: "   16", nstreams: 2, rate_idx: 9 },
            RateRow { ht_mcs: "   15", vht_mcs: "   17", nstreams: 2, rate_idx: 10 },
            RateRow { ht_mcs: "     ", vht_mcs: "   18", nstreams: 2, rate_idx: 11 },
            RateRow { ht_mcs: "     ", vht_mcs: "   19", nstreams: 2, rate_idx: 12 },
            RateRow { ht_mcs: "   16", vht_mcs: "   20", nstreams: 3, rate_idx: 0 },
            RateRow { ht_mcs: "17-18", vht_mcs: "21-22", nstreams: 3, rate_idx: 1 },
            RateRow { ht_mcs: "19-20", vht_mcs: "23-24", nstreams: 3, rate_idx: 2 },
            RateRow { ht_mcs: "   21", vht_mcs: "   25", nstreams: 3, rate_idx: 13 },
            RateRow { ht_mcs: "   22", vht_mcs: "   26", nstreams: 3, rate_idx: 14 },
            RateRow { ht_mcs: "   23", vht_mcs: "   27", nstreams: 3, rate_idx: 15 },
            RateRow { ht_mcs: "     ", vht_mcs: "   28", nstreams: 3, rate_idx: 16 },
            RateRow { ht_mcs: "     ", vht_mcs: "   29", nstreams: 3, rate_idx: 17 },
        ];

        let _ = write!(out, "     HT MCS VHT MCS | {}, MHz:", "Freq");
        for &f in freqs {
            let _ = write!(out, "  {:4}", common::fbin2freq(f, is_2g));
        }
        out.push('\n');
        let _ = write!(out, "    ----------------------------");
        for _ in freqs {
            out.push_str("  ----");
        }
        out.push('\n');

        for rate in &RATES {
            if rate.nstreams > maxstreams {
                break;
            }
            let _ = write!(out, "    {:7} {:7},        dBm:", rate.ht_mcs, rate.vht_mcs);
            for (j, d) in data.iter().enumerate() {
                let pow2x = Self::vht_power(
                    d,
                    ext_delta,
                    bwidx,
                    freqs.len(),
                    j,
                    rate.nstreams - 1,
                    rate.rate_idx,
                );
                let _ = write!(out, "  {:4.1}", f64::from(pow2x) / 2.0);
            }
            out.push('\n');
        }
    }

    fn dump_power(&self, out: &mut String) {
        const MASK2MAXSTREAMS: [usize; 8] = [0, 1, 1, 2, 1, 2, 2, 3];
        const RATES_CCK: [&str; 4] = ["1-5 mbps (L)", "5 mbps (S)", "11 mbps (L)", "11 mbps (S)"];
        const RATES_OFDM: [&str; 4] = ["6-24 mbps", "36 mbps", "48 mbps", "54 mbps"];

        let eep = &self.eep;
        let op_flags = eep.base.op_cap_brd_flags.op_flags;

        render::sect_name(out, "EEPROM Power Info");

        let mut txmask = usize::from(eep.base.txrx_mask >> 4);
        if txmask >= MASK2MAXSTREAMS.len() {
            let _ = writeln!(
                out,
                "Invalid TxMask value -- 0x{:04x}, use maximum possible value 0x7\n",
                txmask
            );
            txmask = 0x7;
        }
        let maxstreams = MASK2MAXSTREAMS[txmask];

        if op_flags & QCA9880_OPFLAGS_11G != 0 {
            render::subsect_name(out, "2 GHz CCK per-rate target power");
            Self::dump_tgt_pow_legacy(
                out,
                &eep.target_freqbin_2g_cck,
                &eep.target_power_2g_cck,
                &RATES_CCK,
                true,
            );
            out.push('\n');
            render::subsect_name(out, "2 GHz OFDM per-rate target power");
            Self::dump_tgt_pow_legacy(
                out,
                &eep.target_freqbin_2g_leg,
                &eep.target_power_2g_leg,
                &RATES_OFDM,
                true,
            );
            out.push('\n');
            render::subsect_name(out, "2 GHz HT20 per-rate target power");
            Self::dump_tgt_pow_vht(
                out,
                &eep.target_freqbin_2g_vht20,
                &eep.target_power_2g_vht20,
                &eep.ext_t_pow2x_delta_2g,
                0,
                maxstreams,
                true,
            );
            out.push('\n');
            render::subsect_name(out, "2 GHz HT40 per-rate target power");
            Self::dump_tgt_pow_vht(
                out,
                &eep.target_freqbin_2g_vht40,
                &eep.target_power_2g_vht40,
                &eep.ext_t_pow2x_delta_2g,
                1,
                maxstreams,
                true,
            );
            out.push('\n');
        }

        if op_flags & QCA9880_OPFLAGS_11A != 0 {
            render::subsect_name(out, "5 GHz OFDM per-rate target power");
            Self::dump_tgt_pow_legacy(
                out,
                &eep.target_freqbin_5g_leg,
                &eep.target_power_5g_leg,
                &RATES_OFDM,
                false,
            );
            out.push('\n');
            render::subsect_name(out, "5 GHz HT20/VHT20 per-rate target power");
            Self::dump_tgt_pow_vht(
                out,
                &eep.target_freqbin_5g_vht20,
                &eep.target_power_5g_vht20,
                &eep.ext_t_pow2x_delta_5g,
                0,
                maxstreams,
                false,
            );
            out.push('\n');
            render::subsect_name(out, "5 GHz HT40/VHT40 per-rate target power");
            Self::dump_tgt_pow_vht(
                out,
                &eep.target_freqbin_5g_vht40,
                &eep.target_power_5g_vht40,
                &eep.ext_t_pow2x_delta_5g,
                1,
                maxstreams,
                false,
            );
            out.push('\n');
            render::subsect_name(out, "5 GHz VHT80 per-rate target power");
            Self::dump_tgt_pow_vht(
                out,
                &eep.target_freqbin_5g_vht80,
                &eep.target_power_5g_vht80,
                &eep.ext_t_pow2x_delta_5g,
                2,
                maxstreams,
                false,
            );
            out.push('\n');
        }

        if op_flags & QCA9880_OPFLAGS_11G != 0 {
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
        }
        if op_flags & QCA9880_OPFLAGS_11A != 0 {
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
}

impl EepMap for Eep9880 {
    fn name(&self) -> &'static str {
        "9880"
    }

    fn desc(&self) -> &'static str {
        "EEPROM map for earlier .11ac chips (QCA9880/QCA9882/QCA9892/etc.)"
    }

    fn srev_reg(&self) -> Option<u32> {
        Some(0x40ec)
    }

    fn eep_buf_words(&self) -> usize {
        QCA9880_EEPROM_SIZE / 2
    }

    fn unpacked_size(&self) -> usize {
        QCA9880_EEPROM_STRUCT_SIZE
    }

    fn templates(&self) -> &'static [Template] {
        t9880::TEMPLATES
    }

    fn provides(&self, op: Op) -> bool {
        matches!(op, Op::LoadBlob | Op::LoadOtp)
    }

    fn sections(&self) -> &'static [Section] {
        &[Section::Base, Section::Modal, Section::Power]
    }

    fn load_blob(&mut self, session: &mut Session) -> Result<()> {
        let size = session.con.blob_size()?;
        if size < QCA9880_EEPROM_STRUCT_SIZE {
            return Err(Error::not_found("blob is smaller than the calibration image"));
        }

        let mut image = vec![0u8; QCA9880_EEPROM_STRUCT_SIZE];
        let read = session.con.blob_read(&mut image)?;
        if read != QCA9880_EEPROM_STRUCT_SIZE {
            return Err(Error::io("unable to read calibration data blob"));
        }

        for (i, pair) in image.chunks_exact(2).enumerate() {
            session.eep_buf[i] = u16::from_le_bytes([pair[0], pair[1]]);
        }
        session.eep_len = (QCA9880_EEPROM_STRUCT_SIZE + 1) / 2;
        session.unpacked[..QCA9880_EEPROM_STRUCT_SIZE].copy_from_slice(&image);

        self.take_unpacked(session)
    }

    fn load_otp(&mut self, session: &mut Session, _raw: bool) -> Result<()> {
        session.otp_enable(true)?;
        let res = self.load_otp_inner(session);
        // OTP power is always dropped again, error or not.
        let _ = session.otp_enable(false);
        res
    }

    fn check(&mut self, session: &mut Session) -> Result<()> {
        if !self.loaded {
            return Err(Error::not_found("no calibration data loaded"));
        }

        let b = &self.eep.base;

        if usize::from(b.length) != QCA9880_EEPROM_STRUCT_SIZE
            && usize::from(b.length.swap_bytes()) != QCA9880_EEPROM_STRUCT_SIZE
        {
            return Err(Error::integrity(format!(
                "bad EEPROM length 0x{:04x}/0x{:04x} (expect 0x{:04x})",
                b.length,
                b.length.swap_bytes(),
                QCA9880_EEPROM_STRUCT_SIZE
            )));
        }

        // Checksum over the decompressed image before any endianness fix.
        let sum = common::calc_csum_bytes(&session.unpacked[..QCA9880_EEPROM_STRUCT_SIZE]);
        if sum != 0xffff {
            return Err(Error::integrity(format!("bad EEPROM checksum 0x{:04x}", sum)));
        }

        if self.eep.base.op_cap_brd_flags.misc_flags & common::AR5416_EEPMISC_BIG_ENDIAN != 0 {
            log::info!("EEPROM endianness is not native, swapping multi-byte fields");
            self.eep =
                Qca9880Eeprom::parse(&session.unpacked[..QCA9880_EEPROM_STRUCT_SIZE], true)?;
        }

        Ok(())
    }

    fn dump(&self, _session: &Session, section: Section, out: &mut String) {
        match section {
            Section::Base => self.dump_base(out),
            Section::Modal => self.dump_modal(out),
            Section::Power => self.dump_power(out),
            Section::Init => {}
        }
    }
}

impl Eep9880 {
    fn load_otp_inner(&mut self, session: &mut Session) -> Result<()> {
        session.eep_len = 0;
        session.fill_otp_buf(QCA9880_OTP_SIZE)?;

        let mut otp = vec![0u8; QCA9880_OTP_SIZE];
        for (i, octet) in otp.iter_mut().enumerate() {
            *octet = (session.eep_buf[i / 2] >> (8 * (i % 2))) as u8;
        }

        if otp[QCA9880_OTP_MAGIC_OFFSET..QCA9880_OTP_MAGIC_OFFSET + 2] != QCA9880_OTP_MAGIC {
            return Err(Error::integrity(format!(
                "invalid OTP magic 0x{:02X}{:02X}, expected value 0x{:02X}{:02X}",
                otp[QCA9880_OTP_MAGIC_OFFSET],
                otp[QCA9880_OTP_MAGIC_OFFSET + 1],
                QCA9880_OTP_MAGIC[0],
                QCA9880_OTP_MAGIC[1]
            )));
        }

        // Walk the stream containers. The stream length is never stored;
        // it is the distance between the begin marker and the doubled end
        // marker carrying the same stream code.
        let mut strcode: Option<u8> = None;
        let mut end_mark_seen = false;
        let mut stream_begin = 0usize;
        let mut got_caldata = false;

        let mut p = QCA9880_OTP_HEADER_SIZE;
        while p < QCA9880_OTP_SIZE {
            let octet = otp[p];
            match strcode {
                None => {
                    if octet != 0x00 {
                        if !mark_is_begin(octet) {
                            return Err(Error::integrity(format!(
                                "invalid OTP stream begin marker 0x{:02x} at 0x{:04x}",
                                octet, p
                            )));
                        }
                        strcode = Some(mark_code(octet));
                        end_mark_seen = false;
                        stream_begin = p;
                    }
                }
                Some(code) => {
                    if !mark_is_end(octet) || mark_code(octet) != code {
                        end_mark_seen = false;
                    } else if !end_mark_seen {
                        end_mark_seen = true;
                    } else {
                        // Got the second 'end' mark; the markers bracket
                        // {type, version, payload...}.
                        let len = p - stream_begin - 2; // exclude markers
                        if len < 2 {
                            return Err(Error::integrity(format!(
                                "too short OTP stream raw data length {} byte(s) at 0x{:04x}",
                                len, stream_begin
                            )));
                        }
                        let body = &otp[stream_begin + 1..stream_begin + 1 + len];
                        let stype = body[0];
                        let version = body[1];
                        log::debug!(
                            "Found OTP stream (begin: 0x{:04x}, raw data len: {}, type: {}, version: {})",
                            stream_begin,
                            len,
                            stype,
                            version
                        );
                        if stype == QCA9880_OTP_STR_TYPE_CALDATA {
                            Self::proc_otp_caldata(session, &body[2..])?;
                            got_caldata = true;
                        }
                        strcode = None;
                    }
                }
            }
            p += 1;
        }

        if !got_caldata {
            return Err(Error::not_found("no calibration data stream in OTP"));
        }

        // OTP does not carry a checksum correction, recompute it on the
        // assembled image.
        common::fixup_csum_bytes(&mut session.unpacked[..QCA9880_EEPROM_STRUCT_SIZE], 2);

        session.eep_len = QCA9880_OTP_SIZE / 2;
        self.take_unpacked(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_size_is_canonical() {
        let image = Qca9880Eeprom::default().encode().unwrap();
        assert_eq!(image.len(), QCA9880_EEPROM_STRUCT_SIZE);
    }

    #[test]
    fn test_parse_encode_roundtrip() {
        let mut eep = Qca9880Eeprom::default();
        eep.base.length = QCA9880_EEPROM_STRUCT_SIZE as u16;
        eep.base.eeprom_version = 2;
        eep.base.template_version = 3;
        eep.base.txrx_mask = 0x77;
        eep.base.op_cap_brd_flags.op_flags = QCA9880_OPFLAGS_11A;
        eep.base.op_cap_brd_flags.board_flags = 0x00080c44;
        eep.modal_5g.ant_ctrl_common = 0x00000220;
        eep.therm_cal.therm_adc_scaled_gain = 0x00cd;
        eep.target_power_5g_vht20[0].t_pow2x_base = [30, 28, 26];
        eep.config_addr[23] = 0xaabbccdd;

        let image = eep.encode().unwrap();
        let back = Qca9880Eeprom::parse(&image, false).unwrap();
        assert_eq!(back.base.op_cap_brd_flags.board_flags, 0x00080c44);
        assert_eq!(back.modal_5g.ant_ctrl_common, 0x00000220);
        assert_eq!(back.therm_cal.therm_adc_scaled_gain, 0x00cd);
        assert_eq!(back.target_power_5g_vht20[0].t_pow2x_base, [30, 28, 26]);
        assert_eq!(back.config_addr[23], 0xaabbccdd);
        assert_eq!(back.encode().unwrap(), image);
    }

    #[test]
    fn test_known_field_offsets() {
        // The pad names of the historical layout pin several offsets; the
        // cursor walk must land on them.
        let mut eep = Qca9880Eeprom::default();
        eep.cal_freq_pier_2g = [0xAA, 0xBB, 0xCC];
        eep.ctl_index_2g[0] = 0x11;
        eep.ctl_index_5g[0] = 0x21;
        let image = eep.encode().unwrap();
        assert_eq!(&image[0x224..0x227], &[0xAA, 0xBB, 0xCC]);
        assert_eq!(image[0x312], 0x11);
        assert_eq!(image[0x610], 0x21);
    }

    #[test]
    fn test_vht_power_composition() {
        let mut t = TgtPowVht::default();
        t.t_pow2x_base = [40, 0, 0];
        t.t_pow2x_delta[0] = 0x21; // rate 0 delta = 1, rate 1 delta = 2
        let mut ext = [0u8; VHT_5G_EXT_DELTA_SIZE];
        assert_eq!(Eep9880::vht_power(&t, &ext, 0, 6, 0, 0, 0), 41);
        assert_eq!(Eep9880::vht_power(&t, &ext, 0, 6, 0, 0, 1), 42);
        // The ext-delta bit extends the nibble to 5 bits.
        ext[0] |= 0x01;
        assert_eq!(Eep9880::vht_power(&t, &ext, 0, 6, 0, 0, 0), 41 + 16);
    }
}

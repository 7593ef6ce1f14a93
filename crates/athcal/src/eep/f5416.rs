// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Default EEPROM map of the earlier .11n chips (AR5416/AR9160/AR92xx).
//!
//! A fixed-layout image at word offset 0x40, preceded by the chip init
//! data. Three chains, 5 GHz and 2 GHz modal headers, closed-loop power
//! detector calibration with up to four PD gains.

use std::fmt::Write as _;

use crate::eep::common::{self, EepInit, SpurChan};
use crate::eep::cursor::{Cursor, CursorMut};
use crate::eep::render::{self, CtlEdge, TgtPower};
use crate::eep::{EepMap, Features, Op, Section, UpdateParam};
use crate::error::{Error, Result};
use crate::loader::Session;

pub const AR5416_DATA_START_LOC: usize = 0x40;
pub const AR5416_DATA_CSUM_LOC: usize = AR5416_DATA_START_LOC + 1;
pub const AR5416_CUSTOMER_DATA_SZ: usize = 64;
pub const AR5416_MAX_CHAINS: usize = 3;
pub const AR5416_NUM_5G_CAL_PIERS: usize = 8;
pub const AR5416_NUM_2G_CAL_PIERS: usize = 4;
pub const AR5416_NUM_5G_20_TARGET_POWERS: usize = 8;
pub const AR5416_NUM_5G_40_TARGET_POWERS: usize = 8;
pub const AR5416_NUM_2G_CCK_TARGET_POWERS: usize = 3;
pub const AR5416_NUM_2G_20_TARGET_POWERS: usize = 4;
pub const AR5416_NUM_2G_40_TARGET_POWERS: usize = 4;
pub const AR5416_NUM_CTLS: usize = 24;
pub const AR5416_NUM_BAND_EDGES: usize = 8;

/// Data-area image size, bytes.
pub const AR5416_DATA_BYTES: usize = 0x40
    + AR5416_CUSTOMER_DATA_SZ
    + 2 * MODAL_BYTES
    + AR5416_NUM_5G_CAL_PIERS
    + AR5416_NUM_2G_CAL_PIERS
    + AR5416_MAX_CHAINS * AR5416_NUM_5G_CAL_PIERS * PIER_BYTES
    + AR5416_MAX_CHAINS * AR5416_NUM_2G_CAL_PIERS * PIER_BYTES
    + AR5416_NUM_5G_20_TARGET_POWERS * 5
    + AR5416_NUM_5G_20_TARGET_POWERS * 9
    + AR5416_NUM_5G_40_TARGET_POWERS * 9
    + AR5416_NUM_2G_CCK_TARGET_POWERS * 5
    + AR5416_NUM_2G_20_TARGET_POWERS * 5
    + AR5416_NUM_2G_20_TARGET_POWERS * 9
    + AR5416_NUM_2G_40_TARGET_POWERS * 9
    + AR5416_NUM_CTLS
    + AR5416_NUM_CTLS * AR5416_MAX_CHAINS * AR5416_NUM_BAND_EDGES * 2
    + 1;
/// Data-area size in 16-bit words.
pub const AR5416_DATA_SZ: usize = AR5416_DATA_BYTES / 2;

const MODAL_BYTES: usize = 0x68;
const PIER_BYTES: usize =
    2 * common::AR5416_NUM_PD_GAINS * common::AR5416_PD_GAIN_ICEPTS;

/// Byte offset of the CTL index within the data area; it starts in the
/// middle of an EEPROM word, which the erase path must respect.
const CTL_INDEX_BYTE_OFF: usize = 0x40
    + AR5416_CUSTOMER_DATA_SZ
    + 2 * MODAL_BYTES
    + AR5416_NUM_5G_CAL_PIERS
    + AR5416_NUM_2G_CAL_PIERS
    + AR5416_MAX_CHAINS * AR5416_NUM_5G_CAL_PIERS * PIER_BYTES
    + AR5416_MAX_CHAINS * AR5416_NUM_2G_CAL_PIERS * PIER_BYTES
    + AR5416_NUM_5G_20_TARGET_POWERS * 5
    + AR5416_NUM_5G_20_TARGET_POWERS * 9
    + AR5416_NUM_5G_40_TARGET_POWERS * 9
    + AR5416_NUM_2G_CCK_TARGET_POWERS * 5
    + AR5416_NUM_2G_20_TARGET_POWERS * 5
    + AR5416_NUM_2G_20_TARGET_POWERS * 9
    + AR5416_NUM_2G_40_TARGET_POWERS * 9;

/// Byte offset of the MAC address within the data area.
const MAC_BYTE_OFF: usize = 0x0c;

#[derive(Debug, Clone, Default)]
pub struct BaseHdr {
    pub length: u16,
    pub checksum: u16,
    pub version: u16,
    pub op_cap_flags: u8,
    pub eep_misc: u8,
    pub reg_dmn: [u16; 2],
    pub mac_addr: [u8; 6],
    pub rx_mask: u8,
    pub tx_mask: u8,
    pub rf_silent: u16,
    pub blue_tooth_options: u16,
    pub device_cap: u16,
    pub bin_build_number: u32,
    pub device_type: u8,
    pub pwdclkind: u8,
    pub fast_clk_5g: u8,
    pub div_chain: u8,
    pub rx_gain_type: u8,
    pub dac_hi_pwr_mode_5g: u8,
    pub open_loop_pwr_cntl: u8,
    pub dac_lp_mode: u8,
    pub tx_gain_type: u8,
    pub rc_chain_mask: u8,
    pub desired_scale_cck: u8,
    pub power_table_offset: i8,
    pub frac_n_5g: u8,
}

#[derive(Debug, Clone, Default)]
pub struct ModalHdr {
    pub ant_ctrl_chain: [u32; AR5416_MAX_CHAINS],
    pub ant_ctrl_common: u32,
    pub antenna_gain_ch: [u8; AR5416_MAX_CHAINS],
    pub switch_settling: u8,
    pub tx_rx_atten_ch: [u8; AR5416_MAX_CHAINS],
    pub rx_tx_margin_ch: [u8; AR5416_MAX_CHAINS],
    pub adc_desired_size: i8,
    pub pga_desired_size: i8,
    pub xlna_gain_ch: [u8; AR5416_MAX_CHAINS],
    pub tx_end_to_xpa_off: u8,
    pub tx_end_to_rx_on: u8,
    pub tx_frame_to_xpa_on: u8,
    pub thresh62: u8,
    pub noise_floor_thresh_ch: [i8; AR5416_MAX_CHAINS],
    pub xpd_gain: u8,
    pub xpd: u8,
    pub iq_cal_i_ch: [i8; AR5416_MAX_CHAINS],
    pub iq_cal_q_ch: [i8; AR5416_MAX_CHAINS],
    pub pd_gain_overlap: u8,
    pub ob: u8,
    pub db: u8,
    pub xpa_bias_lvl: u8,
    pub pwr_decrease_for_2_chain: u8,
    pub pwr_decrease_for_3_chain: u8,
    pub tx_frame_to_data_start: u8,
    pub tx_frame_to_pa_on: u8,
    pub ht40_power_inc_for_pdadc: u8,
    pub bsw_atten: [u8; AR5416_MAX_CHAINS],
    pub bsw_margin: [u8; AR5416_MAX_CHAINS],
    pub sw_settle_ht40: u8,
    pub xatten2_db: [u8; AR5416_MAX_CHAINS],
    pub xatten2_margin: [u8; AR5416_MAX_CHAINS],
    pub ob_ch1: u8,
    pub db_ch1: u8,
    pub lna_ctl: u8,
    pub misc_bits: u8,
    pub xpa_bias_lvl_freq: [u16; 3],
    pub spur_chans: [SpurChan; common::AR5416_EEPROM_MODAL_SPURS],
}

/// Closed-loop PD calibration of one pier on one chain.
#[derive(Debug, Clone)]
pub struct CalPier {
    pub pwr_pdg: [[u8; common::AR5416_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
    pub vpd_pdg: [[u8; common::AR5416_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
}

impl Default for CalPier {
    fn default() -> Self {
        Self {
            pwr_pdg: [[0xff; common::AR5416_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
            vpd_pdg: [[0xff; common::AR5416_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
        }
    }
}

#[derive(Debug, Clone)]
pub struct TargetPower<const NRATES: usize> {
    pub bchannel: u8,
    pub pow2x: [u8; NRATES],
}

impl<const NRATES: usize> Default for TargetPower<NRATES> {
    fn default() -> Self {
        Self {
            bchannel: common::AR5416_BCHAN_UNUSED,
            pow2x: [0; NRATES],
        }
    }
}

pub type TargetPowerLeg = TargetPower<4>;
pub type TargetPowerHt = TargetPower<8>;

#[derive(Debug, Clone)]
pub struct Ar5416Eeprom {
    pub base: BaseHdr,
    pub cust_data: [u8; AR5416_CUSTOMER_DATA_SZ],
    pub modal_5g: ModalHdr,
    pub modal_2g: ModalHdr,
    pub cal_freq_pier_5g: [u8; AR5416_NUM_5G_CAL_PIERS],
    pub cal_freq_pier_2g: [u8; AR5416_NUM_2G_CAL_PIERS],
    pub cal_pier_data_5g: Vec<CalPier>,
    pub cal_pier_data_2g: Vec<CalPier>,
    pub cal_target_power_5g: [TargetPowerLeg; AR5416_NUM_5G_20_TARGET_POWERS],
    pub cal_target_power_5g_ht20: [TargetPowerHt; AR5416_NUM_5G_20_TARGET_POWERS],
    pub cal_target_power_5g_ht40: [TargetPowerHt; AR5416_NUM_5G_40_TARGET_POWERS],
    pub cal_target_power_cck: [TargetPowerLeg; AR5416_NUM_2G_CCK_TARGET_POWERS],
    pub cal_target_power_2g: [TargetPowerLeg; AR5416_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht20: [TargetPowerHt; AR5416_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht40: [TargetPowerHt; AR5416_NUM_2G_40_TARGET_POWERS],
    pub ctl_index: [u8; AR5416_NUM_CTLS],
    pub ctl_data: Vec<[CtlEdge; AR5416_NUM_BAND_EDGES]>,
}

impl Default for Ar5416Eeprom {
    fn default() -> Self {
        Self {
            base: BaseHdr::default(),
            cust_data: [0; AR5416_CUSTOMER_DATA_SZ],
            modal_5g: ModalHdr::default(),
            modal_2g: ModalHdr::default(),
            cal_freq_pier_5g: [common::AR5416_BCHAN_UNUSED; AR5416_NUM_5G_CAL_PIERS],
            cal_freq_pier_2g: [common::AR5416_BCHAN_UNUSED; AR5416_NUM_2G_CAL_PIERS],
            cal_pier_data_5g: vec![
                CalPier::default();
                AR5416_MAX_CHAINS * AR5416_NUM_5G_CAL_PIERS
            ],
            cal_pier_data_2g: vec![
                CalPier::default();
                AR5416_MAX_CHAINS * AR5416_NUM_2G_CAL_PIERS
            ],
            cal_target_power_5g: Default::default(),
            cal_target_power_5g_ht20: Default::default(),
            cal_target_power_5g_ht40: Default::default(),
            cal_target_power_cck: Default::default(),
            cal_target_power_2g: Default::default(),
            cal_target_power_2g_ht20: Default::default(),
            cal_target_power_2g_ht40: Default::default(),
            ctl_index: [0; AR5416_NUM_CTLS],
            ctl_data: vec![[CtlEdge::default(); AR5416_NUM_BAND_EDGES]; AR5416_NUM_CTLS],
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
    for chain in &mut m.ant_ctrl_chain {
        *chain = sw32(c.read_u32()?, swap);
    }
    m.ant_ctrl_common = sw32(c.read_u32()?, swap);
    m.antenna_gain_ch = c.read_array()?;
    m.switch_settling = c.read_u8()?;
    m.tx_rx_atten_ch = c.read_array()?;
    m.rx_tx_margin_ch = c.read_array()?;
    m.adc_desired_size = c.read_i8()?;
    m.pga_desired_size = c.read_i8()?;
    m.xlna_gain_ch = c.read_array()?;
    m.tx_end_to_xpa_off = c.read_u8()?;
    m.tx_end_to_rx_on = c.read_u8()?;
    m.tx_frame_to_xpa_on = c.read_u8()?;
    m.thresh62 = c.read_u8()?;
    for nf in &mut m.noise_floor_thresh_ch {
        *nf = c.read_i8()?;
    }
    m.xpd_gain = c.read_u8()?;
    m.xpd = c.read_u8()?;
    for iq in &mut m.iq_cal_i_ch {
        *iq = c.read_i8()?;
    }
    for iq in &mut m.iq_cal_q_ch {
        *iq = c.read_i8()?;
    }
    m.pd_gain_overlap = c.read_u8()?;
    m.ob = c.read_u8()?;
    m.db = c.read_u8()?;
    m.xpa_bias_lvl = c.read_u8()?;
    m.pwr_decrease_for_2_chain = c.read_u8()?;
    m.pwr_decrease_for_3_chain = c.read_u8()?;
    m.tx_frame_to_data_start = c.read_u8()?;
    m.tx_frame_to_pa_on = c.read_u8()?;
    m.ht40_power_inc_for_pdadc = c.read_u8()?;
    m.bsw_atten = c.read_array()?;
    m.bsw_margin = c.read_array()?;
    m.sw_settle_ht40 = c.read_u8()?;
    m.xatten2_db = c.read_array()?;
    m.xatten2_margin = c.read_array()?;
    m.ob_ch1 = c.read_u8()?;
    m.db_ch1 = c.read_u8()?;
    m.lna_ctl = c.read_u8()?;
    m.misc_bits = c.read_u8()?;
    for f in &mut m.xpa_bias_lvl_freq {
        *f = sw16(c.read_u16()?, swap);
    }
    c.skip(6)?; // futureModal
    for spur in &mut m.spur_chans {
        spur.spur_chan = sw16(c.read_u16()?, swap);
        spur.range_low = c.read_u8()?;
        spur.range_high = c.read_u8()?;
    }
    Ok(m)
}

fn encode_modal(c: &mut CursorMut<'_>, m: &ModalHdr) -> Result<()> {
    for chain in &m.ant_ctrl_chain {
        c.write_u32(*chain)?;
    }
    c.write_u32(m.ant_ctrl_common)?;
    c.write_bytes(&m.antenna_gain_ch)?;
    c.write_u8(m.switch_settling)?;
    c.write_bytes(&m.tx_rx_atten_ch)?;
    c.write_bytes(&m.rx_tx_margin_ch)?;
    c.write_i8(m.adc_desired_size)?;
    c.write_i8(m.pga_desired_size)?;
    c.write_bytes(&m.xlna_gain_ch)?;
    c.write_u8(m.tx_end_to_xpa_off)?;
    c.write_u8(m.tx_end_to_rx_on)?;
    c.write_u8(m.tx_frame_to_xpa_on)?;
    c.write_u8(m.thresh62)?;
    for nf in &m.noise_floor_thresh_ch {
        c.write_i8(*nf)?;
    }
    c.write_u8(m.xpd_gain)?;
    c.write_u8(m.xpd)?;
    for iq in &m.iq_cal_i_ch {
        c.write_i8(*iq)?;
    }
    for iq in &m.iq_cal_q_ch {
        c.write_i8(*iq)?;
    }
    c.write_u8(m.pd_gain_overlap)?;
    c.write_u8(m.ob)?;
    c.write_u8(m.db)?;
    c.write_u8(m.xpa_bias_lvl)?;
    c.write_u8(m.pwr_decrease_for_2_chain)?;
    c.write_u8(m.pwr_decrease_for_3_chain)?;
    c.write_u8(m.tx_frame_to_data_start)?;
    c.write_u8(m.tx_frame_to_pa_on)?;
    c.write_u8(m.ht40_power_inc_for_pdadc)?;
    c.write_bytes(&m.bsw_atten)?;
    c.write_bytes(&m.bsw_margin)?;
    c.write_u8(m.sw_settle_ht40)?;
    c.write_bytes(&m.xatten2_db)?;
    c.write_bytes(&m.xatten2_margin)?;
    c.write_u8(m.ob_ch1)?;
    c.write_u8(m.db_ch1)?;
    c.write_u8(m.lna_ctl)?;
    c.write_u8(m.misc_bits)?;
    for f in &m.xpa_bias_lvl_freq {
        c.write_u16(*f)?;
    }
    c.skip(6)?;
    for spur in &m.spur_chans {
        c.write_u16(spur.spur_chan)?;
        c.write_u8(spur.range_low)?;
        c.write_u8(spur.range_high)?;
    }
    Ok(())
}

fn parse_pier(c: &mut Cursor<'_>) -> Result<CalPier> {
    let mut pier = CalPier::default();
    for g in 0..common::AR5416_NUM_PD_GAINS {
        pier.pwr_pdg[g] = c.read_array()?;
    }
    for g in 0..common::AR5416_NUM_PD_GAINS {
        pier.vpd_pdg[g] = c.read_array()?;
    }
    Ok(pier)
}

fn parse_tgt<const N: usize>(c: &mut Cursor<'_>) -> Result<TargetPower<N>> {
    Ok(TargetPower {
        bchannel: c.read_u8()?,
        pow2x: c.read_array()?,
    })
}

impl Ar5416Eeprom {
    /// Decode the data-area byte image. `swap` selects the big-endian
    /// reading of multi-byte fields for images whose `eepMisc` declares
    /// big-endian storage.
    pub fn parse(image: &[u8], swap: bool) -> Result<Ar5416Eeprom> {
        let mut c = Cursor::new(image);
        let mut eep = Ar5416Eeprom::default();

        let b = &mut eep.base;
        b.length = sw16(c.read_u16()?, swap);
        b.checksum = sw16(c.read_u16()?, swap);
        b.version = sw16(c.read_u16()?, swap);
        b.op_cap_flags = c.read_u8()?;
        b.eep_misc = c.read_u8()?;
        b.reg_dmn = [sw16(c.read_u16()?, swap), sw16(c.read_u16()?, swap)];
        b.mac_addr = c.read_array()?;
        b.rx_mask = c.read_u8()?;
        b.tx_mask = c.read_u8()?;
        b.rf_silent = sw16(c.read_u16()?, swap);
        b.blue_tooth_options = sw16(c.read_u16()?, swap);
        b.device_cap = sw16(c.read_u16()?, swap);
        b.bin_build_number = sw32(c.read_u32()?, swap);
        b.device_type = c.read_u8()?;
        b.pwdclkind = c.read_u8()?;
        b.fast_clk_5g = c.read_u8()?;
        b.div_chain = c.read_u8()?;
        b.rx_gain_type = c.read_u8()?;
        b.dac_hi_pwr_mode_5g = c.read_u8()?;
        b.open_loop_pwr_cntl = c.read_u8()?;
        b.dac_lp_mode = c.read_u8()?;
        b.tx_gain_type = c.read_u8()?;
        b.rc_chain_mask = c.read_u8()?;
        b.desired_scale_cck = c.read_u8()?;
        b.power_table_offset = c.read_i8()?;
        b.frac_n_5g = c.read_u8()?;
        c.skip(21)?; // futureBase

        eep.cust_data = c.read_array()?;
        eep.modal_5g = parse_modal(&mut c, swap)?;
        eep.modal_2g = parse_modal(&mut c, swap)?;

        eep.cal_freq_pier_5g = c.read_array()?;
        eep.cal_freq_pier_2g = c.read_array()?;
        for i in 0..AR5416_MAX_CHAINS * AR5416_NUM_5G_CAL_PIERS {
            eep.cal_pier_data_5g[i] = parse_pier(&mut c)?;
        }
        for i in 0..AR5416_MAX_CHAINS * AR5416_NUM_2G_CAL_PIERS {
            eep.cal_pier_data_2g[i] = parse_pier(&mut c)?;
        }

        for t in &mut eep.cal_target_power_5g {
            *t = parse_tgt(&mut c)?;
        }
        for t in &mut eep.cal_target_power_5g_ht20 {
            *t = parse_tgt(&mut c)?;
        }
        for t in &mut eep.cal_target_power_5g_ht40 {
            *t = parse_tgt(&mut c)?;
        }
        for t in &mut eep.cal_target_power_cck {
            *t = parse_tgt(&mut c)?;
        }
        for t in &mut eep.cal_target_power_2g {
            *t = parse_tgt(&mut c)?;
        }
        for t in &mut eep.cal_target_power_2g_ht20 {
            *t = parse_tgt(&mut c)?;
        }
        for t in &mut eep.cal_target_power_2g_ht40 {
            *t = parse_tgt(&mut c)?;
        }

        eep.ctl_index = c.read_array()?;
        for i in 0..AR5416_NUM_CTLS {
            let mut edges = [CtlEdge { fbin: 0, ctl: 0 }; AR5416_NUM_BAND_EDGES];
            for chain_edges in 0..AR5416_MAX_CHAINS {
                for e in 0..AR5416_NUM_BAND_EDGES {
                    let fbin = c.read_u8()?;
                    let ctl = c.read_u8()?;
                    // Render follows the first (primary) chain edges; the
                    // remaining chains repeat the layout.
                    if chain_edges == 0 {
                        edges[e] = CtlEdge { fbin, ctl };
                    }
                }
            }
            eep.ctl_data[i] = edges;
        }

        Ok(eep)
    }

    /// Canonical little-endian serialisation of the data area.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut image = vec![0u8; AR5416_DATA_BYTES];
        let mut c = CursorMut::new(&mut image);

        let b = &self.base;
        c.write_u16(b.length)?;
        c.write_u16(b.checksum)?;
        c.write_u16(b.version)?;
        c.write_u8(b.op_cap_flags)?;
        c.write_u8(b.eep_misc)?;
        c.write_u16(b.reg_dmn[0])?;
        c.write_u16(b.reg_dmn[1])?;
        c.write_bytes(&b.mac_addr)?;
        c.write_u8(b.rx_mask)?;
        c.write_u8(b.tx_mask)?;
        c.write_u16(b.rf_silent)?;
        c.write_u16(b.blue_tooth_options)?;
        c.write_u16(b.device_cap)?;
        c.write_u32(b.bin_build_number)?;
        c.write_u8(b.device_type)?;
        c.write_u8(b.pwdclkind)?;
        c.write_u8(b.fast_clk_5g)?;
        c.write_u8(b.div_chain)?;
        c.write_u8(b.rx_gain_type)?;
        c.write_u8(b.dac_hi_pwr_mode_5g)?;
        c.write_u8(b.open_loop_pwr_cntl)?;
        c.write_u8(b.dac_lp_mode)?;
        c.write_u8(b.tx_gain_type)?;
        c.write_u8(b.rc_chain_mask)?;
        c.write_u8(b.desired_scale_cck)?;
        c.write_i8(b.power_table_offset)?;
        c.write_u8(b.frac_n_5g)?;
        c.skip(21)?;

        c.write_bytes(&self.cust_data)?;
        encode_modal(&mut c, &self.modal_5g)?;
        encode_modal(&mut c, &self.modal_2g)?;

        c.write_bytes(&self.cal_freq_pier_5g)?;
        c.write_bytes(&self.cal_freq_pier_2g)?;
        for pier in self.cal_pier_data_5g.iter().chain(&self.cal_pier_data_2g) {
            for g in 0..common::AR5416_NUM_PD_GAINS {
                c.write_bytes(&pier.pwr_pdg[g])?;
            }
            for g in 0..common::AR5416_NUM_PD_GAINS {
                c.write_bytes(&pier.vpd_pdg[g])?;
            }
        }

        macro_rules! put_tgt {
            ($arr:expr) => {
                for t in &$arr {
                    c.write_u8(t.bchannel)?;
                    c.write_bytes(&t.pow2x)?;
                }
            };
        }
        put_tgt!(self.cal_target_power_5g);
        put_tgt!(self.cal_target_power_5g_ht20);
        put_tgt!(self.cal_target_power_5g_ht40);
        put_tgt!(self.cal_target_power_cck);
        put_tgt!(self.cal_target_power_2g);
        put_tgt!(self.cal_target_power_2g_ht20);
        put_tgt!(self.cal_target_power_2g_ht40);

        c.write_bytes(&self.ctl_index)?;
        for edges in &self.ctl_data {
            for _chain in 0..AR5416_MAX_CHAINS {
                for e in edges {
                    c.write_u8(e.fbin)?;
                    c.write_u8(e.ctl)?;
                }
            }
        }

        Ok(image)
    }

    pub fn version_major(&self) -> u16 {
        (self.base.version >> 12) & 0xf
    }

    pub fn version_minor(&self) -> u16 {
        self.base.version & 0xfff
    }
}

/// 5416-family parser state.
pub struct Eep5416 {
    ini: EepInit,
    eep: Ar5416Eeprom,
}

impl Default for Eep5416 {
    fn default() -> Self {
        Self::new()
    }
}

impl Eep5416 {
    pub fn new() -> Self {
        Self {
            ini: EepInit::default(),
            eep: Ar5416Eeprom::default(),
        }
    }

    fn data_image(session: &Session) -> Vec<u8> {
        let mut image = Vec::with_capacity(AR5416_DATA_BYTES);
        for w in &session.eep_buf[AR5416_DATA_START_LOC..AR5416_DATA_START_LOC + AR5416_DATA_SZ] {
            image.extend_from_slice(&w.to_le_bytes());
        }
        image
    }

    fn dump_base(&self, out: &mut String) {
        let b = &self.eep.base;

        render::sect_name(out, "EEPROM Base Header");

        let _ = writeln!(out, "{:<30} : {:2}", "Major Version", self.eep.version_major());
        let _ = writeln!(out, "{:<30} : {:2}", "Minor Version", self.eep.version_minor());
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "Checksum", b.checksum);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "Length", b.length);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RegDomain1", b.reg_dmn[0]);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RegDomain2", b.reg_dmn[1]);
        let m = b.mac_addr;
        let _ = writeln!(
            out,
            "{:<30} : {:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            "MacAddress", m[0], m[1], m[2], m[3], m[4], m[5]
        );
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "TX Mask", b.tx_mask);
        let _ = writeln!(out, "{:<30} : 0x{:04X}", "RX Mask", b.rx_mask);
        if b.rf_silent & common::AR5416_RFSILENT_ENABLED != 0 {
            let _ = writeln!(
                out,
                "{:<30} : GPIO:{} Pol:{}",
                "RfSilent",
                (b.rf_silent & common::AR5416_RFSILENT_GPIO_SEL)
                    >> common::AR5416_RFSILENT_GPIO_SEL_S,
                if b.rf_silent & common::AR5416_RFSILENT_POLARITY != 0 {
                    'H'
                } else {
                    'L'
                }
            );
        } else {
            let _ = writeln!(out, "{:<30} : disabled", "RfSilent");
        }
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "OpFlags(5GHz)",
            u8::from(b.op_cap_flags & common::AR5416_OPFLAGS_11A != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "OpFlags(2GHz)",
            u8::from(b.op_cap_flags & common::AR5416_OPFLAGS_11G != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "OpFlags(Disable 2GHz HT20)",
            u8::from(b.op_cap_flags & common::AR5416_OPFLAGS_N_2G_HT20 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "OpFlags(Disable 2GHz HT40)",
            u8::from(b.op_cap_flags & common::AR5416_OPFLAGS_N_2G_HT40 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "OpFlags(Disable 5Ghz HT20)",
            u8::from(b.op_cap_flags & common::AR5416_OPFLAGS_N_5G_HT20 != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "OpFlags(Disable 5Ghz HT40)",
            u8::from(b.op_cap_flags & common::AR5416_OPFLAGS_N_5G_HT40 != 0)
        );
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_19 {
            let _ = writeln!(
                out,
                "{:<30} : {}",
                "OpenLoopPwrCntl",
                if b.open_loop_pwr_cntl != 0 { "true" } else { "false" }
            );
        }
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Big Endian",
            u8::from(b.eep_misc & common::AR5416_EEPMISC_BIG_ENDIAN != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Cal Bin Major Ver",
            (b.bin_build_number >> 24) & 0xff
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Cal Bin Minor Ver",
            (b.bin_build_number >> 16) & 0xff
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Cal Bin Build",
            (b.bin_build_number >> 8) & 0xff
        );
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_17 {
            let _ = writeln!(
                out,
                "{:<30} : {}",
                "Rx Gain Type",
                match b.rx_gain_type {
                    0 => "23dB backoff",
                    1 => "13dB backoff",
                    2 => "original",
                    _ => "unknown",
                }
            );
        }
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_19 {
            let _ = writeln!(
                out,
                "{:<30} : {}",
                "Tx Gain Type",
                match b.tx_gain_type {
                    0 => "original",
                    1 => "high power",
                    _ => "unknown",
                }
            );
        }
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_21 {
            let _ = writeln!(
                out,
                "{:<30} : {}",
                "Power table offset, dBm", b.power_table_offset
            );
        }
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_3 {
            let _ = writeln!(
                out,
                "{:<30} : {}",
                "Device Type",
                common::DEVICE_TYPE_NAMES[usize::from(b.device_type & 0x7)]
            );
        }

        out.push_str("\nCustomer Data in hex:\n");
        render::hexdump(out, &self.eep.cust_data);
        out.push('\n');
    }

    fn dump_modal(&self, out: &mut String) {
        render::sect_name(out, "EEPROM Modal Header");

        let flags = self.eep.base.op_cap_flags;
        let has_2g = flags & common::AR5416_OPFLAGS_11G != 0;
        let has_5g = flags & common::AR5416_OPFLAGS_11A != 0;

        let _ = write!(out, "{:35}", "");
        if has_2g {
            let _ = write!(out, "       {:<20}", "2G");
        }
        if has_5g {
            let _ = write!(out, "  {}", "5G");
        }
        out.push_str("\n\n");

        let mut line = |token: &str, f: &dyn Fn(&ModalHdr) -> String| {
            let _ = write!(out, "{:<33} :", token);
            if has_2g {
                let _ = write!(out, "       {:<20}", f(&self.eep.modal_2g));
            }
            if has_5g {
                let _ = write!(out, "  {}", f(&self.eep.modal_5g));
            }
            out.push('\n');
        };

        for i in 0..AR5416_MAX_CHAINS {
            line(&format!("Ant Ctrl Chain {}", i), &|m| {
                format!("0x{:X}", m.ant_ctrl_chain[i])
            });
        }
        line("Antenna Ctrl Common", &|m| {
            format!("0x{:X}", m.ant_ctrl_common)
        });
        line("Antenna Gain (per-chain)", &|m| {
            format!(
                "{:.1} / {:.1} / {:.1}",
                f64::from(m.antenna_gain_ch[0]) / 2.0,
                f64::from(m.antenna_gain_ch[1]) / 2.0,
                f64::from(m.antenna_gain_ch[2]) / 2.0
            )
        });
        line("Switch Settling", &|m| format!("{}", m.switch_settling));
        line("TxRxAttenuation (per-chain), dB", &|m| {
            format!(
                "{} / {} / {}",
                m.tx_rx_atten_ch[0], m.tx_rx_atten_ch[1], m.tx_rx_atten_ch[2]
            )
        });
        line("TxRxAtten margin (per-chain), dB", &|m| {
            format!(
                "{} / {} / {}",
                m.rx_tx_margin_ch[0], m.rx_tx_margin_ch[1], m.rx_tx_margin_ch[2]
            )
        });
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_3 {
            line("bswAtten (per-chain), dB", &|m| {
                format!("{} / {} / {}", m.bsw_atten[0], m.bsw_atten[1], m.bsw_atten[2])
            });
            line("bswAtten margin (per-chain), dB", &|m| {
                format!(
                    "{} / {} / {}",
                    m.bsw_margin[0], m.bsw_margin[1], m.bsw_margin[2]
                )
            });
        }
        line("ADC Desired Size, dBm", &|m| {
            format!("{:.1}", f64::from(m.adc_desired_size) / 2.0)
        });
        line("PGA Desired Size, dBm", &|m| {
            format!("{:.1}", f64::from(m.pga_desired_size) / 2.0)
        });
        line("xLNA gain (per-chain)", &|m| {
            format!(
                "{} / {} / {}",
                m.xlna_gain_ch[0], m.xlna_gain_ch[1], m.xlna_gain_ch[2]
            )
        });
        line("Thresh62", &|m| format!("{}", m.thresh62));
        line("NF Thresh (per-chain)", &|m| {
            format!(
                "{} / {} / {}",
                m.noise_floor_thresh_ch[0], m.noise_floor_thresh_ch[1], m.noise_floor_thresh_ch[2]
            )
        });
        line("xPD Gain Mask", &|m| format!("0x{:X}", m.xpd_gain));
        line("PD type", &|m| {
            String::from(if m.xpd != 0 { "external" } else { "internal" })
        });
        line("IQ Cal I (per-chain)", &|m| {
            format!("{} / {} / {}", m.iq_cal_i_ch[0], m.iq_cal_i_ch[1], m.iq_cal_i_ch[2])
        });
        line("IQ Cal Q (per-chain)", &|m| {
            format!("{} / {} / {}", m.iq_cal_q_ch[0], m.iq_cal_q_ch[1], m.iq_cal_q_ch[2])
        });
        line("Analog Output Bias(ob)", &|m| format!("{}", m.ob));
        line("Analog Driver Bias(db)", &|m| format!("{}", m.db));
        line("xPA bias level", &|m| format!("{}", m.xpa_bias_lvl));
        for i in 0..3 {
            line(&format!("xPA bias level Freq {}", i), &|m| {
                format!("{}", m.xpa_bias_lvl_freq[i])
            });
        }
        line("xLNA control", &|m| format!("0x{:X}", m.lna_ctl));
        line("PD gain Overlap, dB", &|m| {
            format!("{:.1}", f64::from(m.pd_gain_overlap) / 2.0)
        });
        line("Pwr decrease 2 chain", &|m| {
            format!("{:.1}", f64::from(m.pwr_decrease_for_2_chain) / 2.0)
        });
        line("Pwr decrease 3 chain", &|m| {
            format!("{:.1}", f64::from(m.pwr_decrease_for_3_chain) / 2.0)
        });
        line("ob_ch1", &|m| format!("{}", m.ob_ch1));
        line("db_ch1", &|m| format!("{}", m.db_ch1));
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_3 {
            line("HT40PowerIncForPDADC", &|m| {
                format!("{}", m.ht40_power_inc_for_pdadc)
            });
        }
        line("TX End to xLNA On, us", &|m| {
            format!("{:.1}", f64::from(m.tx_end_to_rx_on) / 10.0)
        });
        line("TX End to xPA Off, us", &|m| {
            format!("{:.1}", f64::from(m.tx_end_to_xpa_off) / 10.0)
        });
        line("TX Frame to xPA On, us", &|m| {
            format!("{:.1}", f64::from(m.tx_frame_to_xpa_on) / 10.0)
        });
        if self.eep.version_minor() >= common::AR5416_EEP_MINOR_VER_3 {
            line("TX Frame to DataStart, us", &|m| {
                format!("{:.1}", f64::from(m.tx_frame_to_data_start) / 10.0)
            });
            line("TX Frame to PA On, us", &|m| {
                format!("{:.1}", f64::from(m.tx_frame_to_pa_on) / 10.0)
            });
        }
        line("Switch Settling [HT40]", &|m| format!("{}", m.sw_settle_ht40));
        line("xatten2Db (per-chain)", &|m| {
            format!("{} / {} / {}", m.xatten2_db[0], m.xatten2_db[1], m.xatten2_db[2])
        });
        line("xatten2Db margin (per-chain)", &|m| {
            format!(
                "{} / {} / {}",
                m.xatten2_margin[0], m.xatten2_margin[1], m.xatten2_margin[2]
            )
        });

        out.push('\n');
    }

    fn dump_pd_cal(
        &self,
        out: &mut String,
        freqs: &[u8],
        piers: &[CalPier],
        maxfreqs: usize,
        is_2g: bool,
        gainmask: u8,
        power_table_offset: i32,
    ) {
        let chainmask = self.eep.base.tx_mask;
        for chain in 0..AR5416_MAX_CHAINS {
            if chainmask & (1 << chain) == 0 {
                continue;
            }
            let _ = writeln!(out, "  Chain {}:\n", chain);
            for (freq, &fbin) in freqs.iter().enumerate() {
                if fbin == common::AR5416_BCHAN_UNUSED {
                    break;
                }
                let _ = writeln!(out, "    {:4} MHz:", common::fbin2freq(fbin, is_2g));
                let pier = &piers[chain * maxfreqs + freq];
                let pwr: Vec<&[u8]> = pier.pwr_pdg.iter().map(|g| &g[..]).collect();
                let vpd: Vec<&[u8]> = pier.vpd_pdg.iter().map(|g| &g[..]).collect();
                render::pd_pier_closeloop(out, &pwr, &vpd, gainmask, power_table_offset);
                out.push('\n');
            }
        }
    }

    fn dump_power(&self, out: &mut String) {
        let eep = &self.eep;
        let b = &eep.base;

        render::sect_name(out, "EEPROM Power Info");

        let is_openloop = eep.version_minor() >= common::AR5416_EEP_MINOR_VER_19
            && b.open_loop_pwr_cntl & 0x01 != 0;
        let power_table_offset = if eep.version_minor() >= common::AR5416_EEP_MINOR_VER_21 {
            i32::from(b.power_table_offset)
        } else {
            common::AR5416_PWR_TABLE_OFFSET_DB
        };

        if b.op_cap_flags & common::AR5416_OPFLAGS_11G != 0 {
            render::subsect_name(out, "2 GHz per-freq PD cal. data");
            if is_openloop {
                out.push_str("  Open-loop PD calibration dumping is not supported\n");
            } else {
                self.dump_pd_cal(
                    out,
                    &eep.cal_freq_pier_2g,
                    &eep.cal_pier_data_2g,
                    AR5416_NUM_2G_CAL_PIERS,
                    true,
                    eep.modal_2g.xpd_gain,
                    power_table_offset,
                );
            }
            out.push('\n');
        }
        if b.op_cap_flags & common::AR5416_OPFLAGS_11A != 0 {
            render::subsect_name(out, "5 GHz per-freq PD cal. data");
            if is_openloop {
                out.push_str("  Open-loop PD calibration dumping is not supported\n");
            } else {
                self.dump_pd_cal(
                    out,
                    &eep.cal_freq_pier_5g,
                    &eep.cal_pier_data_5g,
                    AR5416_NUM_5G_CAL_PIERS,
                    false,
                    eep.modal_5g.xpd_gain,
                    power_table_offset,
                );
            }
            out.push('\n');
        }

        macro_rules! tgt {
            ($name:expr, $arr:expr, $rates:expr, $is_2g:expr) => {
                render::subsect_name(out, concat!($name, " per-rate target power"));
                let piers: Vec<TgtPower> = $arr
                    .iter()
                    .map(|t| TgtPower {
                        fbin: t.bchannel,
                        pow2x: &t.pow2x,
                    })
                    .collect();
                render::target_power(out, &piers, &$rates, $is_2g);
                out.push('\n');
            };
        }

        if b.op_cap_flags & common::AR5416_OPFLAGS_11G != 0 {
            tgt!("2 GHz CCK", eep.cal_target_power_cck, common::RATES_CCK, true);
            tgt!("2 GHz OFDM", eep.cal_target_power_2g, common::RATES_OFDM, true);
            tgt!("2 GHz HT20", eep.cal_target_power_2g_ht20, common::RATES_HT, true);
            tgt!("2 GHz HT40", eep.cal_target_power_2g_ht40, common::RATES_HT, true);
        }
        if b.op_cap_flags & common::AR5416_OPFLAGS_11A != 0 {
            tgt!("5 GHz OFDM", eep.cal_target_power_5g, common::RATES_OFDM, false);
            tgt!("5 GHz HT20", eep.cal_target_power_5g_ht20, common::RATES_HT, false);
            tgt!("5 GHz HT40", eep.cal_target_power_5g_ht40, common::RATES_HT, false);
        }

        render::subsect_name(out, "CTL data");
        for (i, &ctl) in eep.ctl_index.iter().enumerate() {
            if ctl == 0 {
                break;
            }
            let _ = writeln!(out, "  {}:", render::ctl_label(ctl));
            render::ctl_edges(
                out,
                &eep.ctl_data[i],
                common::ctl_mode_is_2g(ctl),
                false,
            );
            out.push('\n');
        }
    }
}

impl EepMap for Eep5416 {
    fn name(&self) -> &'static str {
        "5416"
    }

    fn desc(&self) -> &'static str {
        "Default EEPROM map for earlier .11n chips (AR5416/AR9160/AR92xx/etc.)"
    }

    fn features(&self) -> Features {
        Features::default()
    }

    fn eep_buf_words(&self) -> usize {
        AR5416_DATA_START_LOC + AR5416_DATA_SZ
    }

    fn provides(&self, op: Op) -> bool {
        matches!(op, Op::LoadEeprom | Op::Update)
    }

    fn sections(&self) -> &'static [Section] {
        &[Section::Init, Section::Base, Section::Modal, Section::Power]
    }

    fn load_eeprom(&mut self, session: &mut Session, _raw: bool) -> Result<()> {
        common::toggle_byteswap(
            session,
            (AR5416_DATA_START_LOC + 3) as u32,
            (AR5416_DATA_START_LOC + 0x1a / 2) as u32,
        )?;

        session.eep_len = 0;
        session.fill_eep_buf(AR5416_DATA_START_LOC + AR5416_DATA_SZ)?;

        // The record itself is decoded in `check`, where endianness
        // normalisation has the `eepMisc` flag at hand.
        Ok(())
    }

    fn check(&mut self, session: &mut Session) -> Result<()> {
        let image = Self::data_image(session);

        let raw_magic = session.eep_buf[0];
        if raw_magic != common::AR5416_EEPROM_MAGIC
            && raw_magic.swap_bytes() != common::AR5416_EEPROM_MAGIC
        {
            return Err(Error::integrity(format!(
                "invalid EEPROM magic 0x{:04x}, expected 0x{:04x}",
                raw_magic,
                common::AR5416_EEPROM_MAGIC
            )));
        }

        let eep_misc = image[7];
        let swap = eep_misc & common::AR5416_EEPMISC_BIG_ENDIAN != 0;
        if swap {
            log::info!("EEPROM endianness is not native, swapping multi-byte fields");
        }

        self.ini = EepInit::parse(&session.eep_buf[..AR5416_DATA_START_LOC], swap);
        self.eep = Ar5416Eeprom::parse(&image, swap)?;

        if self.eep.version_major() != common::AR5416_EEP_VER
            || self.eep.version_minor() < common::AR5416_EEP_NO_BACK_VER
        {
            return Err(Error::integrity(format!(
                "bad EEPROM version 0x{:04x} ({}.{})",
                self.eep.base.version,
                self.eep.version_major(),
                self.eep.version_minor()
            )));
        }

        let mut el = usize::from(self.eep.base.length) / 2;
        if el > AR5416_DATA_SZ {
            el = AR5416_DATA_SZ;
        }
        let sum = common::calc_csum(
            &session.eep_buf[AR5416_DATA_START_LOC..AR5416_DATA_START_LOC + el],
        );
        if sum != 0xffff {
            return Err(Error::integrity(format!("bad EEPROM checksum 0x{:04x}", sum)));
        }

        Ok(())
    }

    fn dump(&self, _session: &Session, section: Section, out: &mut String) {
        match section {
            Section::Init => {
                render::sect_name(out, "Chip init data");
                render::eep_init(out, self.ini.magic, self.ini.prot, self.ini.iptr, &self.ini.regs);
            }
            Section::Base => self.dump_base(out),
            Section::Modal => self.dump_modal(out),
            Section::Power => self.dump_power(out),
        }
    }

    fn supports_param(&self, param: &UpdateParam) -> bool {
        match param {
            UpdateParam::Mac(_) => true,
            UpdateParam::EraseCtl => cfg!(feature = "danger-erase-ctl"),
        }
    }

    fn update(&mut self, session: &mut Session, param: &UpdateParam) -> Result<()> {
        let (data_pos, data_len);

        match param {
            UpdateParam::Mac(mac) => {
                data_pos = AR5416_DATA_START_LOC + MAC_BYTE_OFF / 2;
                data_len = 3;
                for (i, pair) in mac.chunks_exact(2).enumerate() {
                    session.eep_buf[data_pos + i] = u16::from_le_bytes([pair[0], pair[1]]);
                }
            }
            UpdateParam::EraseCtl => {
                if !cfg!(feature = "danger-erase-ctl") {
                    return Err(Error::not_supported("CTL erasing is disabled at build time"));
                }
                // It is enough to erase the CTL index only. The index
                // starts and ends in the middle of an EEPROM word, so the
                // range is extended by one word and the first/last octets
                // sharing those words with neighbouring data are kept.
                data_pos = AR5416_DATA_START_LOC + CTL_INDEX_BYTE_OFF / 2;
                data_len = AR5416_NUM_CTLS / 2 + 1;

                let mut addr = data_pos;
                session.eep_buf[addr] &= 0x00ff; // keep the word LSB
                addr += 1;
                while addr < data_pos + data_len - 1 {
                    session.eep_buf[addr] = 0x0000;
                    addr += 1;
                }
                session.eep_buf[addr] &= 0xff00; // keep the word MSB
            }
        }

        for addr in data_pos..data_pos + data_len {
            let word = session.eep_buf[addr];
            session.eep_write(addr as u32, word).map_err(|_| {
                Error::io(format!("unable to write EEPROM data at 0x{:04x}", addr))
            })?;
        }

        if data_pos > AR5416_DATA_START_LOC {
            let mut el = usize::from(self.eep.base.length) / 2;
            if el > AR5416_DATA_SZ {
                el = AR5416_DATA_SZ;
            }
            session.eep_buf[AR5416_DATA_CSUM_LOC] = 0xffff;
            let sum = common::calc_csum(
                &session.eep_buf[AR5416_DATA_START_LOC..AR5416_DATA_START_LOC + el],
            );
            session.eep_buf[AR5416_DATA_CSUM_LOC] = sum;
            session
                .eep_write(AR5416_DATA_CSUM_LOC as u32, sum)
                .map_err(|_| Error::io("unable to update EEPROM checksum"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        // The CTL index starts in the middle of a word.
        assert_eq!(CTL_INDEX_BYTE_OFF % 2, 1);
        assert_eq!(AR5416_DATA_BYTES % 2, 0);
        let image = Ar5416Eeprom::default().encode().unwrap();
        assert_eq!(image.len(), AR5416_DATA_BYTES);
    }

    #[test]
    fn test_parse_encode_roundtrip() {
        let mut eep = Ar5416Eeprom::default();
        eep.base.version = 0xe002;
        eep.base.length = AR5416_DATA_BYTES as u16;
        eep.base.mac_addr = [0x00, 0x03, 0x07, 0x12, 0x34, 0x56];
        eep.base.reg_dmn = [0x0000, 0x001f];
        eep.base.bin_build_number = 0x00091500;
        eep.modal_5g.ant_ctrl_common = 0x00000110;
        eep.modal_5g.spur_chans[0].spur_chan = 0x2420;

        let image = eep.encode().unwrap();
        let back = Ar5416Eeprom::parse(&image, false).unwrap();
        assert_eq!(back.base.version, 0xe002);
        assert_eq!(back.base.mac_addr, eep.base.mac_addr);
        assert_eq!(back.base.bin_build_number, 0x00091500);
        assert_eq!(back.modal_5g.ant_ctrl_common, eep.modal_5g.ant_ctrl_common);
        assert_eq!(back.modal_5g.spur_chans[0].spur_chan, 0x2420);
        let again = back.encode().unwrap();
        assert_eq!(image, again);
    }
}

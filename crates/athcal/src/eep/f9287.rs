// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! AR9287 chip EEPROM map: two chains, 2 GHz only, image at word offset
//! 0x80. The pier calibration area holds either an open-loop or a
//! closed-loop record, selected by the base-header open-loop bit; the two
//! shapes are a tagged variant here, never an overlay.

use std::fmt::Write as _;

use crate::eep::common::{self, EepInit, SpurChan};
use crate::eep::cursor::{Cursor, CursorMut};
use crate::eep::render::{self, CtlEdge, TgtPower};
use crate::eep::{EepMap, Op, Section, UpdateParam};
use crate::error::{Error, Result};
use crate::loader::Session;

pub const AR9287_DATA_START_LOC: usize = 0x80;
pub const AR9287_CUSTOMER_DATA_SZ: usize = 20;
pub const AR9287_NUM_2G_CAL_PIERS: usize = 3;
pub const AR9287_NUM_2G_CCK_TARGET_POWERS: usize = 3;
pub const AR9287_NUM_2G_20_TARGET_POWERS: usize = 3;
pub const AR9287_NUM_2G_40_TARGET_POWERS: usize = 3;
pub const AR9287_NUM_CTLS: usize = 12;
pub const AR9287_NUM_BAND_EDGES: usize = 4;
pub const AR9287_PD_GAIN_ICEPTS: usize = 5;
pub const AR9287_MAX_CHAINS: usize = 2;

pub const AR9287_EEPMISC_WOW: u8 = 0x02;

const BASE_BYTES: usize = 64;
const MODAL_BYTES: usize = 100;
/// Both pier record shapes occupy the same 40-octet slot.
const PIER_BYTES: usize = 40;

pub const AR9287_DATA_BYTES: usize = BASE_BYTES
    + AR9287_CUSTOMER_DATA_SZ
    + MODAL_BYTES
    + AR9287_NUM_2G_CAL_PIERS
    + AR9287_MAX_CHAINS * AR9287_NUM_2G_CAL_PIERS * PIER_BYTES
    + AR9287_NUM_2G_CCK_TARGET_POWERS * 5
    + AR9287_NUM_2G_20_TARGET_POWERS * 5
    + AR9287_NUM_2G_20_TARGET_POWERS * 9
    + AR9287_NUM_2G_40_TARGET_POWERS * 9
    + AR9287_NUM_CTLS
    + AR9287_NUM_CTLS * AR9287_MAX_CHAINS * AR9287_NUM_BAND_EDGES * 2
    + 1;
pub const AR9287_DATA_SZ: usize = AR9287_DATA_BYTES / 2;

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
    pub open_loop_pwr_cntl: u8,
    pub pwr_table_offset: i8,
    pub temp_sens_slope: i8,
    pub temp_sens_slope_pal_on: i8,
}

#[derive(Debug, Clone, Default)]
pub struct ModalHdr {
    pub ant_ctrl_chain: [u32; AR9287_MAX_CHAINS],
    pub ant_ctrl_common: u32,
    pub antenna_gain_ch: [u8; AR9287_MAX_CHAINS],
    pub switch_settling: u8,
    pub tx_rx_atten_ch: [u8; AR9287_MAX_CHAINS],
    pub rx_tx_margin_ch: [u8; AR9287_MAX_CHAINS],
    pub adc_desired_size: i8,
    pub tx_end_to_xpa_off: u8,
    pub tx_end_to_rx_on: u8,
    pub tx_frame_to_xpa_on: u8,
    pub thresh62: u8,
    pub noise_floor_thresh_ch: [i8; AR9287_MAX_CHAINS],
    pub xpd_gain: u8,
    pub xpd: u8,
    pub iq_cal_i_ch: [i8; AR9287_MAX_CHAINS],
    pub iq_cal_q_ch: [i8; AR9287_MAX_CHAINS],
    pub pd_gain_overlap: u8,
    pub xpa_bias_lvl: u8,
    pub tx_frame_to_data_start: u8,
    pub tx_frame_to_pa_on: u8,
    pub ht40_power_inc_for_pdadc: u8,
    pub bsw_atten: [u8; AR9287_MAX_CHAINS],
    pub bsw_margin: [u8; AR9287_MAX_CHAINS],
    pub sw_settle_ht40: u8,
    pub version: u8,
    pub db1: u8,
    pub db2: u8,
    pub ob_cck: u8,
    pub ob_psk: u8,
    pub ob_qam: u8,
    pub ob_pal_off: u8,
    pub spur_chans: [SpurChan; common::AR5416_EEPROM_MODAL_SPURS],
}

/// Closed-loop pier: per-gain power/VPD icept series.
#[derive(Debug, Clone)]
pub struct ClosedLoopPier {
    pub pwr_pdg: [[u8; AR9287_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
    pub vpd_pdg: [[u8; AR9287_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
}

/// Open-loop pier: only the leading element of each series carries data.
#[derive(Debug, Clone)]
pub struct OpenLoopPier {
    pub pwr_pdg: [[u8; AR9287_PD_GAIN_ICEPTS]; 2],
    pub vpd_pdg: [[u8; AR9287_PD_GAIN_ICEPTS]; 2],
    pub pcdac: [[u8; AR9287_PD_GAIN_ICEPTS]; 2],
    pub empty: [[u8; AR9287_PD_GAIN_ICEPTS]; 2],
}

/// The pier-calibration slot, disambiguated by the base-header bit.
#[derive(Debug, Clone)]
pub enum PierCal {
    OpenLoop(Vec<OpenLoopPier>),
    ClosedLoop(Vec<ClosedLoopPier>),
}

pub type TargetPowerLeg = super::f5416::TargetPower<4>;
pub type TargetPowerHt = super::f5416::TargetPower<8>;

#[derive(Debug, Clone)]
pub struct Ar9287Eeprom {
    pub base: BaseHdr,
    pub cust_data: [u8; AR9287_CUSTOMER_DATA_SZ],
    pub modal: ModalHdr,
    pub cal_freq_pier_2g: [u8; AR9287_NUM_2G_CAL_PIERS],
    pub cal_pier_data_2g: PierCal,
    pub cal_target_power_cck: [TargetPowerLeg; AR9287_NUM_2G_CCK_TARGET_POWERS],
    pub cal_target_power_2g: [TargetPowerLeg; AR9287_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht20: [TargetPowerHt; AR9287_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht40: [TargetPowerHt; AR9287_NUM_2G_40_TARGET_POWERS],
    pub ctl_index: [u8; AR9287_NUM_CTLS],
    pub ctl_data: [[CtlEdge; AR9287_NUM_BAND_EDGES]; AR9287_NUM_CTLS],
}

impl Default for Ar9287Eeprom {
    fn default() -> Self {
        Self {
            base: BaseHdr::default(),
            cust_data: [0; AR9287_CUSTOMER_DATA_SZ],
            modal: ModalHdr::default(),
            cal_freq_pier_2g: [common::AR5416_BCHAN_UNUSED; AR9287_NUM_2G_CAL_PIERS],
            cal_pier_data_2g: PierCal::ClosedLoop(Vec::new()),
            cal_target_power_cck: Default::default(),
            cal_target_power_2g: Default::default(),
            cal_target_power_2g_ht20: Default::default(),
            cal_target_power_2g_ht40: Default::default(),
            ctl_index: [0; AR9287_NUM_CTLS],
            ctl_data: [[CtlEdge::default(); AR9287_NUM_BAND_EDGES]; AR9287_NUM_CTLS],
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

impl Ar9287Eeprom {
    pub fn parse(image: &[u8], swap: bool) -> Result<Ar9287Eeprom> {
        let mut c = Cursor::new(image);
        let mut eep = Ar9287Eeprom::default();

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
        b.open_loop_pwr_cntl = c.read_u8()?;
        b.pwr_table_offset = c.read_i8()?;
        b.temp_sens_slope = c.read_i8()?;
        b.temp_sens_slope_pal_on = c.read_i8()?;
        c.skip(29)?; // futureBase

        eep.cust_data = c.read_array()?;

        let m = &mut eep.modal;
        for chain in &mut m.ant_ctrl_chain {
            *chain = sw32(c.read_u32()?, swap);
        }
        m.ant_ctrl_common = sw32(c.read_u32()?, swap);
        m.antenna_gain_ch = c.read_array()?;
        m.switch_settling = c.read_u8()?;
        m.tx_rx_atten_ch = c.read_array()?;
        m.rx_tx_margin_ch = c.read_array()?;
        m.adc_desired_size = c.read_i8()?;
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
        m.xpa_bias_lvl = c.read_u8()?;
        m.tx_frame_to_data_start = c.read_u8()?;
        m.tx_frame_to_pa_on = c.read_u8()?;
        m.ht40_power_inc_for_pdadc = c.read_u8()?;
        m.bsw_atten = c.read_array()?;
        m.bsw_margin = c.read_array()?;
        m.sw_settle_ht40 = c.read_u8()?;
        m.version = c.read_u8()?;
        m.db1 = c.read_u8()?;
        m.db2 = c.read_u8()?;
        m.ob_cck = c.read_u8()?;
        m.ob_psk = c.read_u8()?;
        m.ob_qam = c.read_u8()?;
        m.ob_pal_off = c.read_u8()?;
        c.skip(30)?; // futureModal
        for spur in &mut m.spur_chans {
            spur.spur_chan = sw16(c.read_u16()?, swap);
            spur.range_low = c.read_u8()?;
            spur.range_high = c.read_u8()?;
        }

        eep.cal_freq_pier_2g = c.read_array()?;

        let npiers = AR9287_MAX_CHAINS * AR9287_NUM_2G_CAL_PIERS;
        if eep.base.open_loop_pwr_cntl & 0x01 != 0 {
            let mut piers = Vec::with_capacity(npiers);
            for _ in 0..npiers {
                let mut pier = OpenLoopPier {
                    pwr_pdg: [[0; AR9287_PD_GAIN_ICEPTS]; 2],
                    vpd_pdg: [[0; AR9287_PD_GAIN_ICEPTS]; 2],
                    pcdac: [[0; AR9287_PD_GAIN_ICEPTS]; 2],
                    empty: [[0; AR9287_PD_GAIN_ICEPTS]; 2],
                };
                for g in 0..2 {
                    pier.pwr_pdg[g] = c.read_array()?;
                }
                for g in 0..2 {
                    pier.vpd_pdg[g] = c.read_array()?;
                }
                for g in 0..2 {
                    pier.pcdac[g] = c.read_array()?;
                }
                for g in 0..2 {
                    pier.empty[g] = c.read_array()?;
                }
                piers.push(pier);
            }
            eep.cal_pier_data_2g = PierCal::OpenLoop(piers);
        } else {
            let mut piers = Vec::with_capacity(npiers);
            for _ in 0..npiers {
                let mut pier = ClosedLoopPier {
                    pwr_pdg: [[0xff; AR9287_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
                    vpd_pdg: [[0xff; AR9287_PD_GAIN_ICEPTS]; common::AR5416_NUM_PD_GAINS],
                };
                for g in 0..common::AR5416_NUM_PD_GAINS {
                    pier.pwr_pdg[g] = c.read_array()?;
                }
                for g in 0..common::AR5416_NUM_PD_GAINS {
                    pier.vpd_pdg[g] = c.read_array()?;
                }
                piers.push(pier);
            }
            eep.cal_pier_data_2g = PierCal::ClosedLoop(piers);
        }

        macro_rules! get_tgt {
            ($arr:expr) => {
                for t in &mut $arr {
                    *t = super::f5416::TargetPower {
                        bchannel: c.read_u8()?,
                        pow2x: c.read_array()?,
                    };
                }
            };
        }
        get_tgt!(eep.cal_target_power_cck);
        get_tgt!(eep.cal_target_power_2g);
        get_tgt!(eep.cal_target_power_2g_ht20);
        get_tgt!(eep.cal_target_power_2g_ht40);

        eep.ctl_index = c.read_array()?;
        for ctl in &mut eep.ctl_data {
            for chain in 0..AR9287_MAX_CHAINS {
                for e in 0..AR9287_NUM_BAND_EDGES {
                    let fbin = c.read_u8()?;
                    let pwr = c.read_u8()?;
                    // Render follows the primary chain edges.
                    if chain == 0 {
                        ctl[e] = CtlEdge { fbin, ctl: pwr };
                    }
                }
            }
        }

        Ok(eep)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut image = vec![0u8; AR9287_DATA_BYTES];
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
        c.write_u8(b.open_loop_pwr_cntl)?;
        c.write_i8(b.pwr_table_offset)?;
        c.write_i8(b.temp_sens_slope)?;
        c.write_i8(b.temp_sens_slope_pal_on)?;
        c.skip(29)?;

        c.write_bytes(&self.cust_data)?;

        let m = &self.modal;
        for chain in &m.ant_ctrl_chain {
            c.write_u32(*chain)?;
        }
        c.write_u32(m.ant_ctrl_common)?;
        c.write_bytes(&m.antenna_gain_ch)?;
        c.write_u8(m.switch_settling)?;
        c.write_bytes(&m.tx_rx_atten_ch)?;
        c.write_bytes(&m.rx_tx_margin_ch)?;
        c.write_i8(m.adc_desired_size)?;
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
        c.write_u8(m.xpa_bias_lvl)?;
        c.write_u8(m.tx_frame_to_data_start)?;
        c.write_u8(m.tx_frame_to_pa_on)?;
        c.write_u8(m.ht40_power_inc_for_pdadc)?;
        c.write_bytes(&m.bsw_atten)?;
        c.write_bytes(&m.bsw_margin)?;
        c.write_u8(m.sw_settle_ht40)?;
        c.write_u8(m.version)?;
        c.write_u8(m.db1)?;
        c.write_u8(m.db2)?;
        c.write_u8(m.ob_cck)?;
        c.write_u8(m.ob_psk)?;
        c.write_u8(m.ob_qam)?;
        c.write_u8(m.ob_pal_off)?;
        c.skip(30)?;
        for spur in &m.spur_chans {
            c.write_u16(spur.spur_chan)?;
            c.write_u8(spur.range_low)?;
            c.write_u8(spur.range_high)?;
        }

        c.write_bytes(&self.cal_freq_pier_2g)?;

        match &self.cal_pier_data_2g {
            PierCal::OpenLoop(piers) => {
                for pier in piers {
                    for g in 0..2 {
                        c.write_bytes(&pier.pwr_pdg[g])?;
                    }
                    for g in 0..2 {
                        c.write_bytes(&pier.vpd_pdg[g])?;
                    }
                    for g in 0..2 {
                        c.write_bytes(&pier.pcdac[g])?;
                    }
                    for g in 0..2 {
                        c.write_bytes(&pier.empty[g])?;
                    }
                }
            }
            PierCal::ClosedLoop(piers) => {
                for pier in piers {
                    for g in 0..common::AR5416_NUM_PD_GAINS {
                        c.write_bytes(&pier.pwr_pdg[g])?;
                    }
                    for g in 0..common::AR5416_NUM_PD_GAINS {
                        c.write_bytes(&pier.vpd_pdg[g])?;
                    }
                }
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
        put_tgt!(self.cal_target_power_cck);
        put_tgt!(self.cal_target_power_2g);
        put_tgt!(self.cal_target_power_2g_ht20);
        put_tgt!(self.cal_target_power_2g_ht40);

        c.write_bytes(&self.ctl_index)?;
        for ctl in &self.ctl_data {
            for _chain in 0..AR9287_MAX_CHAINS {
                for e in ctl {
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

pub struct Eep9287 {
    ini: EepInit,
    eep: Ar9287Eeprom,
}

impl Default for Eep9287 {
    fn default() -> Self {
        Self::new()
    }
}

impl Eep9287 {
    pub fn new() -> Self {
        Self {
            ini: EepInit::default(),
            eep: Ar9287Eeprom::default(),
        }
    }

    fn data_image(session: &Session) -> Vec<u8> {
        let mut image = Vec::with_capacity(AR9287_DATA_BYTES);
        for w in &session.eep_buf[AR9287_DATA_START_LOC..AR9287_DATA_START_LOC + AR9287_DATA_SZ] {
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
            "Big Endian",
            u8::from(b.eep_misc & common::AR5416_EEPMISC_BIG_ENDIAN != 0)
        );
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "Wake on Wireless",
            u8::from(b.eep_misc & AR9287_EEPMISC_WOW != 0)
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
        let _ = writeln!(out, "{:<30} : {}", "Cal Bin Build", (b.bin_build_number >> 8) & 0xff);
        let _ = writeln!(
            out,
            "{:<30} : {}",
            "OpenLoop PowerControl",
            b.open_loop_pwr_cntl & 0x1
        );
        let _ = writeln!(out, "{:<30} : {}", "Power Table Offset, dBm", b.pwr_table_offset);
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
        let m = &self.eep.modal;

        render::sect_name(out, "EEPROM Modal Header");

        let mut pr = |token: &str, val: String| {
            let _ = writeln!(out, "{:<23} : {}", token, val);
        };

        pr("Chain0 Ant. Control", format!("0x{:X}", m.ant_ctrl_chain[0]));
        pr("Chain1 Ant. Control", format!("0x{:X}", m.ant_ctrl_chain[1]));
        pr("Ant. Common Control", format!("0x{:X}", m.ant_ctrl_common));
        pr("Chain0 Ant. Gain", format!("{}", m.antenna_gain_ch[0]));
        pr("Chain1 Ant. Gain", format!("{}", m.antenna_gain_ch[1]));
        pr("Switch Settle", format!("{}", m.switch_settling));
        pr("Chain0 TxRxAtten", format!("{}", m.tx_rx_atten_ch[0]));
        pr("Chain1 TxRxAtten", format!("{}", m.tx_rx_atten_ch[1]));
        pr("Chain0 RxTxMargin", format!("{}", m.rx_tx_margin_ch[0]));
        pr("Chain1 RxTxMargin", format!("{}", m.rx_tx_margin_ch[1]));
        pr("ADC Desired size", format!("{}", m.adc_desired_size));
        pr("txEndToXpaOff", format!("{}", m.tx_end_to_xpa_off));
        pr("txEndToRxOn", format!("{}", m.tx_end_to_rx_on));
        pr("txFrameToXpaOn", format!("{}", m.tx_frame_to_xpa_on));
        pr("CCA Threshold", format!("{}", m.thresh62));
        pr("Chain0 NF Threshold", format!("{}", m.noise_floor_thresh_ch[0]));
        pr("Chain1 NF Threshold", format!("{}", m.noise_floor_thresh_ch[1]));
        pr("xpdGain", format!("0x{:x}", m.xpd_gain));
        pr("External PD", format!("{}", m.xpd));
        pr("Chain0 I Coefficient", format!("{}", m.iq_cal_i_ch[0]));
        pr("Chain1 I Coefficient", format!("{}", m.iq_cal_i_ch[1]));
        pr("Chain0 Q Coefficient", format!("{}", m.iq_cal_q_ch[0]));
        pr("Chain1 Q Coefficient", format!("{}", m.iq_cal_q_ch[1]));
        pr("pdGainOverlap", format!("{}", m.pd_gain_overlap));
        pr("xPA Bias Level", format!("{}", m.xpa_bias_lvl));
        pr("txFrameToDataStart", format!("{}", m.tx_frame_to_data_start));
        pr("txFrameToPaOn", format!("{}", m.tx_frame_to_pa_on));
        pr("HT40 Power Inc.", format!("{}", m.ht40_power_inc_for_pdadc));
        pr("Chain0 bswAtten", format!("{}", m.bsw_atten[0]));
        pr("Chain1 bswAtten", format!("{}", m.bsw_atten[1]));
        pr("Chain0 bswMargin", format!("{}", m.bsw_margin[0]));
        pr("Chain1 bswMargin", format!("{}", m.bsw_margin[1]));
        pr("HT40 Switch Settle", format!("{}", m.sw_settle_ht40));
        pr("AR92x7 Version", format!("{}", m.version));
        pr("DriverBias1", format!("{}", m.db1));
        pr("DriverBias2", format!("{}", m.db2));
        pr("CCK OutputBias", format!("{}", m.ob_cck));
        pr("PSK OutputBias", format!("{}", m.ob_psk));
        pr("QAM OutputBias", format!("{}", m.ob_qam));
        pr("PAL_OFF OutputBias", format!("{}", m.ob_pal_off));

        out.push('\n');
    }

    fn dump_pwrctl_openloop(&self, out: &mut String, piers: &[OpenLoopPier]) {
        const GAINS: [&str; 4] = ["4", "2", "1", "0.5"];
        let gainmask = self.eep.modal.xpd_gain;

        for chain in 0..AR9287_MAX_CHAINS {
            if self.eep.base.tx_mask & (1 << chain) == 0 {
                continue;
            }
            let _ = writeln!(out, "  Chain {}:\n", chain);
            for (freq, &fbin) in self.eep.cal_freq_pier_2g.iter().enumerate() {
                if fbin == common::AR5416_BCHAN_UNUSED {
                    break;
                }
                let _ = writeln!(out, "    {:4} MHz:", common::fbin2freq(fbin, true));
                let pier = &piers[chain * AR9287_NUM_2G_CAL_PIERS + freq];

                out.push_str("          Field: pwrPdg vpdPdg  pcdac  empty\n");
                out.push_str("      ---------- ------ ------ ------ ------\n");
                let mut pos = 0usize;
                for (bit, label) in GAINS.iter().enumerate() {
                    if gainmask & (1 << bit) == 0 {
                        continue;
                    }
                    if pos >= pier.pwr_pdg.len() {
                        out.push_str("      Too many gains activated, no data available\n");
                        break;
                    }
                    // Only the leading element of each series is meaningful.
                    let _ = writeln!(
                        out,
                        "      Gain x{:<3}:  {:5.2}  {:5}  {:5}  {:5}",
                        label,
                        f64::from(pier.pwr_pdg[pos][0]) / 4.0,
                        pier.vpd_pdg[pos][0],
                        pier.pcdac[pos][0],
                        pier.empty[pos][0]
                    );
                    pos += 1;
                }
                out.push('\n');
            }
        }
    }

    fn dump_power(&self, out: &mut String) {
        let eep = &self.eep;

        render::sect_name(out, "EEPROM Power Info");

        render::subsect_name(out, "2 GHz per-freq PD cal. data");
        match &eep.cal_pier_data_2g {
            PierCal::OpenLoop(piers) => self.dump_pwrctl_openloop(out, piers),
            PierCal::ClosedLoop(piers) => {
                for chain in 0..AR9287_MAX_CHAINS {
                    if eep.base.tx_mask & (1 << chain) == 0 {
                        continue;
                    }
                    let _ = writeln!(out, "  Chain {}:\n", chain);
                    for (freq, &fbin) in eep.cal_freq_pier_2g.iter().enumerate() {
                        if fbin == common::AR5416_BCHAN_UNUSED {
                            break;
                        }
                        let _ = writeln!(out, "    {:4} MHz:", common::fbin2freq(fbin, true));
                        let pier = &piers[chain * AR9287_NUM_2G_CAL_PIERS + freq];
                        let pwr: Vec<&[u8]> = pier.pwr_pdg.iter().map(|g| &g[..]).collect();
                        let vpd: Vec<&[u8]> = pier.vpd_pdg.iter().map(|g| &g[..]).collect();
                        render::pd_pier_closeloop(
                            out,
                            &pwr,
                            &vpd,
                            eep.modal.xpd_gain,
                            i32::from(eep.base.pwr_table_offset),
                        );
                        out.push('\n');
                    }
                }
            }
        }
        out.push('\n');

        macro_rules! tgt {
            ($name:expr, $arr:expr, $rates:expr) => {
                render::subsect_name(out, concat!($name, " per-rate target power"));
                let piers: Vec<TgtPower> = $arr
                    .iter()
                    .map(|t| TgtPower {
                        fbin: t.bchannel,
                        pow2x: &t.pow2x,
                    })
                    .collect();
                render::target_power(out, &piers, &$rates, true);
                out.push('\n');
            };
        }

        tgt!("2 GHz CCK", eep.cal_target_power_cck, common::RATES_CCK);
        tgt!("2 GHz OFDM", eep.cal_target_power_2g, common::RATES_OFDM);
        tgt!("2 GHz HT20", eep.cal_target_power_2g_ht20, common::RATES_HT);
        tgt!("2 GHz HT40", eep.cal_target_power_2g_ht40, common::RATES_HT);

        render::subsect_name(out, "CTL data");
        for (i, &ctl) in eep.ctl_index.iter().enumerate() {
            if ctl == 0 {
                break;
            }
            let _ = writeln!(out, "  {}:", render::ctl_label(ctl));
            render::ctl_edges(out, &eep.ctl_data[i], common::ctl_mode_is_2g(ctl), false);
            out.push('\n');
        }
    }
}

impl EepMap for Eep9287 {
    fn name(&self) -> &'static str {
        "9287"
    }

    fn desc(&self) -> &'static str {
        "AR9287 chip EEPROM map"
    }

    fn srev_reg(&self) -> Option<u32> {
        Some(0x4020)
    }

    fn eep_buf_words(&self) -> usize {
        AR9287_DATA_START_LOC + AR9287_DATA_SZ
    }

    fn provides(&self, op: Op) -> bool {
        matches!(op, Op::LoadEeprom)
    }

    fn sections(&self) -> &'static [Section] {
        &[Section::Init, Section::Base, Section::Modal, Section::Power]
    }

    fn load_eeprom(&mut self, session: &mut Session, _raw: bool) -> Result<()> {
        common::toggle_byteswap(
            session,
            (AR9287_DATA_START_LOC + 3) as u32,
            (AR9287_DATA_START_LOC + 0x1a / 2) as u32,
        )?;

        session.eep_len = 0;
        session.fill_eep_buf(AR9287_DATA_START_LOC + AR9287_DATA_SZ)?;

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

        let swap = image[7] & common::AR5416_EEPMISC_BIG_ENDIAN != 0;
        if swap {
            log::info!("EEPROM endianness is not native, swapping multi-byte fields");
        }

        self.ini = EepInit::parse(&session.eep_buf[..AR9287_DATA_START_LOC], swap);
        self.eep = Ar9287Eeprom::parse(&image, swap)?;

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
        if el > AR9287_DATA_SZ {
            el = AR9287_DATA_SZ;
        }
        let sum = common::calc_csum(
            &session.eep_buf[AR9287_DATA_START_LOC..AR9287_DATA_START_LOC + el],
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

    fn update(&mut self, _session: &mut Session, _param: &UpdateParam) -> Result<()> {
        Err(Error::not_supported("9287: content updating"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pier_variant_selected_by_open_loop_bit() {
        let mut eep = Ar9287Eeprom::default();
        eep.base.version = 0xe003;
        eep.cal_pier_data_2g = PierCal::ClosedLoop(vec![
            ClosedLoopPier {
                pwr_pdg: [[0xff; AR9287_PD_GAIN_ICEPTS]; 4],
                vpd_pdg: [[0xff; AR9287_PD_GAIN_ICEPTS]; 4],
            };
            AR9287_MAX_CHAINS * AR9287_NUM_2G_CAL_PIERS
        ]);

        let image = eep.encode().unwrap();
        assert_eq!(image.len(), AR9287_DATA_BYTES);
        let closed = Ar9287Eeprom::parse(&image, false).unwrap();
        assert!(matches!(closed.cal_pier_data_2g, PierCal::ClosedLoop(_)));

        let mut eep = closed;
        eep.base.open_loop_pwr_cntl = 0x01;
        eep.cal_pier_data_2g = PierCal::OpenLoop(vec![
            OpenLoopPier {
                pwr_pdg: [[1; AR9287_PD_GAIN_ICEPTS]; 2],
                vpd_pdg: [[2; AR9287_PD_GAIN_ICEPTS]; 2],
                pcdac: [[3; AR9287_PD_GAIN_ICEPTS]; 2],
                empty: [[0; AR9287_PD_GAIN_ICEPTS]; 2],
            };
            AR9287_MAX_CHAINS * AR9287_NUM_2G_CAL_PIERS
        ]);
        let image = eep.encode().unwrap();
        let open = Ar9287Eeprom::parse(&image, false).unwrap();
        match open.cal_pier_data_2g {
            PierCal::OpenLoop(ref piers) => {
                assert_eq!(piers[0].pcdac[0][0], 3);
            }
            PierCal::ClosedLoop(_) => panic!("open-loop bit must select the open-loop variant"),
        }
    }

    #[test]
    fn test_closed_loop_pier_slot_size_matches_open_loop() {
        // Both variants must serialise to the same pier area size, the
        // data start of the following target-power tables depends on it.
        assert_eq!(
            2 * AR9287_PD_GAIN_ICEPTS * common::AR5416_NUM_PD_GAINS,
            4 * 2 * AR9287_PD_GAIN_ICEPTS * 2 / 2
        );
        assert_eq!(PIER_BYTES, 40);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! AR9285 chip EEPROM map: the single-chain cut of the 5416-era layout
//! with nibble-packed output/driver bias fields. Supports RAW EEPROM
//! loading.

use std::fmt::Write as _;

use crate::eep::common::{self, EepInit, SpurChan};
use crate::eep::cursor::{Cursor, CursorMut};
use crate::eep::render::{self, CtlEdge, TgtPower};
use crate::eep::{EepMap, Features, Op, Section, UpdateParam};
use crate::error::{Error, Result};
use crate::loader::Session;

pub const AR9285_DATA_START_LOC: usize = 0x40;
pub const AR9285_CUSTOMER_DATA_SZ: usize = 20;
pub const AR9285_NUM_2G_CAL_PIERS: usize = 3;
pub const AR9285_NUM_2G_CCK_TARGET_POWERS: usize = 3;
pub const AR9285_NUM_2G_20_TARGET_POWERS: usize = 3;
pub const AR9285_NUM_2G_40_TARGET_POWERS: usize = 3;
pub const AR9285_NUM_CTLS: usize = 12;
pub const AR9285_NUM_BAND_EDGES: usize = 4;
pub const AR9285_NUM_PD_GAINS: usize = 2;
pub const AR9285_MAX_CHAINS: usize = 1;

const BASE_BYTES: usize = 32;
const MODAL_BYTES: usize = 68;
const PIER_BYTES: usize = 2 * AR9285_NUM_PD_GAINS * common::AR5416_PD_GAIN_ICEPTS;

pub const AR9285_DATA_BYTES: usize = BASE_BYTES
    + AR9285_CUSTOMER_DATA_SZ
    + MODAL_BYTES
    + AR9285_NUM_2G_CAL_PIERS
    + AR9285_MAX_CHAINS * AR9285_NUM_2G_CAL_PIERS * PIER_BYTES
    + AR9285_NUM_2G_CCK_TARGET_POWERS * 5
    + AR9285_NUM_2G_20_TARGET_POWERS * 5
    + AR9285_NUM_2G_20_TARGET_POWERS * 9
    + AR9285_NUM_2G_40_TARGET_POWERS * 9
    + AR9285_NUM_CTLS
    + AR9285_NUM_CTLS * AR9285_MAX_CHAINS * AR9285_NUM_BAND_EDGES * 2
    + 1;
pub const AR9285_DATA_SZ: usize = AR9285_DATA_BYTES / 2;

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
    pub tx_gain_type: u8,
}

#[derive(Debug, Clone, Default)]
pub struct ModalHdr {
    pub ant_ctrl_chain: u32,
    pub ant_ctrl_common: u32,
    pub antenna_gain_ch: u8,
    pub switch_settling: u8,
    pub tx_rx_atten_ch: u8,
    pub rx_tx_margin_ch: u8,
    pub adc_desired_size: i8,
    pub pga_desired_size: i8,
    pub xlna_gain_ch: u8,
    pub tx_end_to_xpa_off: u8,
    pub tx_end_to_rx_on: u8,
    pub tx_frame_to_xpa_on: u8,
    pub thresh62: u8,
    pub noise_floor_thresh_ch: i8,
    pub xpd_gain: u8,
    pub xpd: u8,
    pub iq_cal_i_ch: i8,
    pub iq_cal_q_ch: i8,
    pub pd_gain_overlap: u8,
    /// ob_0 in the low nibble, ob_1 in the high one.
    pub ob_01: u8,
    pub db1_01: u8,
    pub xpa_bias_lvl: u8,
    pub tx_frame_to_data_start: u8,
    pub tx_frame_to_pa_on: u8,
    pub ht40_power_inc_for_pdadc: u8,
    pub bsw_atten: u8,
    pub bsw_margin: u8,
    pub sw_settle_ht40: u8,
    pub xatten2_db: u8,
    pub xatten2_margin: u8,
    pub db2_01: u8,
    pub version: u8,
    pub ob_23: u8,
    pub ob4_antdiv1: u8,
    pub db1_23: u8,
    pub db1_4_antdiv2: u8,
    pub db2_23: u8,
    pub db2_4: u8,
    pub tx_diversity: u8,
    pub flc_pwr_thresh: u8,
    pub bb_scale_smrt_antenna: u8,
    pub spur_chans: [SpurChan; common::AR5416_EEPROM_MODAL_SPURS],
}

fn lo(v: u8) -> u8 {
    v & 0x0f
}

fn hi(v: u8) -> u8 {
    v >> 4
}

#[derive(Debug, Clone)]
pub struct CalPier {
    pub pwr_pdg: [[u8; common::AR5416_PD_GAIN_ICEPTS]; AR9285_NUM_PD_GAINS],
    pub vpd_pdg: [[u8; common::AR5416_PD_GAIN_ICEPTS]; AR9285_NUM_PD_GAINS],
}

impl Default for CalPier {
    fn default() -> Self {
        Self {
            pwr_pdg: [[0xff; common::AR5416_PD_GAIN_ICEPTS]; AR9285_NUM_PD_GAINS],
            vpd_pdg: [[0xff; common::AR5416_PD_GAIN_ICEPTS]; AR9285_NUM_PD_GAINS],
        }
    }
}

pub type TargetPowerLeg = super::f5416::TargetPower<4>;
pub type TargetPowerHt = super::f5416::TargetPower<8>;

#[derive(Debug, Clone)]
pub struct Ar9285Eeprom {
    pub base: BaseHdr,
    pub cust_data: [u8; AR9285_CUSTOMER_DATA_SZ],
    pub modal: ModalHdr,
    pub cal_freq_pier_2g: [u8; AR9285_NUM_2G_CAL_PIERS],
    pub cal_pier_data_2g: [CalPier; AR9285_NUM_2G_CAL_PIERS],
    pub cal_target_power_cck: [TargetPowerLeg; AR9285_NUM_2G_CCK_TARGET_POWERS],
    pub cal_target_power_2g: [TargetPowerLeg; AR9285_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht20: [TargetPowerHt; AR9285_NUM_2G_20_TARGET_POWERS],
    pub cal_target_power_2g_ht40: [TargetPowerHt; AR9285_NUM_2G_40_TARGET_POWERS],
    pub ctl_index: [u8; AR9285_NUM_CTLS],
    pub ctl_data: [[CtlEdge; AR9285_NUM_BAND_EDGES]; AR9285_NUM_CTLS],
}

impl Default for Ar9285Eeprom {
    fn default() -> Self {
        Self {
            base: BaseHdr::default(),
            cust_data: [0; AR9285_CUSTOMER_DATA_SZ],
            modal: ModalHdr::default(),
            cal_freq_pier_2g: [common::AR5416_BCHAN_UNUSED; AR9285_NUM_2G_CAL_PIERS],
            cal_pier_data_2g: Default::default(),
            cal_target_power_cck: Default::default(),
            cal_target_power_2g: Default::default(),
            cal_target_power_2g_ht20: Default::default(),
            cal_target_power_2g_ht40: Default::default(),
            ctl_index: [0; AR9285_NUM_CTLS],
            ctl_data: [[CtlEdge::default(); AR9285_NUM_BAND_EDGES]; AR9285_NUM_CTLS],
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

impl Ar9285Eeprom {
    pub fn parse(image: &[u8], swap: bool) -> Result<Ar9285Eeprom> {
        let mut c = Cursor::new(image);
        let mut eep = Ar9285Eeprom::default();

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
        b.tx_gain_type = c.read_u8()?;

        eep.cust_data = c.read_array()?;

        let m = &mut eep.modal;
        m.ant_ctrl_chain = sw32(c.read_u32()?, swap);
        m.ant_ctrl_common = sw32(c.read_u32()?, swap);
        m.antenna_gain_ch = c.read_u8()?;
        m.switch_settling = c.read_u8()?;
        m.tx_rx_atten_ch = c.read_u8()?;
        m.rx_tx_margin_ch = c.read_u8()?;
        m.adc_desired_size = c.read_i8()?;
        m.pga_desired_size = c.read_i8()?;
        m.xlna_gain_ch = c.read_u8()?;
        m.tx_end_to_xpa_off = c.read_u8()?;
        m.tx_end_to_rx_on = c.read_u8()?;
        m.tx_frame_to_xpa_on = c.read_u8()?;
        m.thresh62 = c.read_u8()?;
        m.noise_floor_thresh_ch = c.read_i8()?;
        m.xpd_gain = c.read_u8()?;
        m.xpd = c.read_u8()?;
        m.iq_cal_i_ch = c.read_i8()?;
        m.iq_cal_q_ch = c.read_i8()?;
        m.pd_gain_overlap = c.read_u8()?;
        m.ob_01 = c.read_u8()?;
        m.db1_01 = c.read_u8()?;
        m.xpa_bias_lvl = c.read_u8()?;
        m.tx_frame_to_data_start = c.read_u8()?;
        m.tx_frame_to_pa_on = c.read_u8()?;
        m.ht40_power_inc_for_pdadc = c.read_u8()?;
        m.bsw_atten = c.read_u8()?;
        m.bsw_margin = c.read_u8()?;
        m.sw_settle_ht40 = c.read_u8()?;
        m.xatten2_db = c.read_u8()?;
        m.xatten2_margin = c.read_u8()?;
        m.db2_01 = c.read_u8()?;
        m.version = c.read_u8()?;
        m.ob_23 = c.read_u8()?;
        m.ob4_antdiv1 = c.read_u8()?;
        m.db1_23 = c.read_u8()?;
        m.db1_4_antdiv2 = c.read_u8()?;
        m.db2_23 = c.read_u8()?;
        m.db2_4 = c.read_u8()?;
        m.tx_diversity = c.read_u8()?;
        m.flc_pwr_thresh = c.read_u8()?;
        m.bb_scale_smrt_antenna = c.read_u8()?;
        c.skip(1)?; // futureModal
        for spur in &mut m.spur_chans {
            spur.spur_chan = sw16(c.read_u16()?, swap);
            spur.range_low = c.read_u8()?;
            spur.range_high = c.read_u8()?;
        }

        eep.cal_freq_pier_2g = c.read_array()?;
        for pier in &mut eep.cal_pier_data_2g {
            for g in 0..AR9285_NUM_PD_GAINS {
                pier.pwr_pdg[g] = c.read_array()?;
            }
            for g in 0..AR9285_NUM_PD_GAINS {
                pier.vpd_pdg[g] = c.read_array()?;
            }
        }

        for t in &mut eep.cal_target_power_cck {
            *t = super::f5416::TargetPower {
                bchannel: c.read_u8()?,
                pow2x: c.read_array()?,
            };
        }
        for t in &mut eep.cal_target_power_2g {
            *t = super::f5416::TargetPower {
                bchannel: c.read_u8()?,
                pow2x: c.read_array()?,
            };
        }
        for t in &mut eep.cal_target_power_2g_ht20 {
            *t = super::f5416::TargetPower {
                bchannel: c.read_u8()?,
                pow2x: c.read_array()?,
            };
        }
        for t in &mut eep.cal_target_power_2g_ht40 {
            *t = super::f5416::TargetPower {
                bchannel: c.read_u8()?,
                pow2x: c.read_array()?,
            };
        }

        eep.ctl_index = c.read_array()?;
        for ctl in &mut eep.ctl_data {
            for e in ctl.iter_mut() {
                e.fbin = c.read_u8()?;
                e.ctl = c.read_u8()?;
            }
        }

        Ok(eep)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut image = vec![0u8; AR9285_DATA_BYTES];
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
        c.write_u8(b.tx_gain_type)?;

        c.write_bytes(&self.cust_data)?;

        let m = &self.modal;
        c.write_u32(m.ant_ctrl_chain)?;
        c.write_u32(m.ant_ctrl_common)?;
        c.write_u8(m.antenna_gain_ch)?;
        c.write_u8(m.switch_settling)?;
        c.write_u8(m.tx_rx_atten_ch)?;
        c.write_u8(m.rx_tx_margin_ch)?;
        c.write_i8(m.adc_desired_size)?;
        c.write_i8(m.pga_desired_size)?;
        c.write_u8(m.xlna_gain_ch)?;
        c.write_u8(m.tx_end_to_xpa_off)?;
        c.write_u8(m.tx_end_to_rx_on)?;
        c.write_u8(m.tx_frame_to_xpa_on)?;
        c.write_u8(m.thresh62)?;
        c.write_i8(m.noise_floor_thresh_ch)?;
        c.write_u8(m.xpd_gain)?;
        c.write_u8(m.xpd)?;
        c.write_i8(m.iq_cal_i_ch)?;
        c.write_i8(m.iq_cal_q_ch)?;
        c.write_u8(m.pd_gain_overlap)?;
        c.write_u8(m.ob_01)?;
        c.write_u8(m.db1_01)?;
        c.write_u8(m.xpa_bias_lvl)?;
        c.write_u8(m.tx_frame_to_data_start)?;
        c.write_u8(m.tx_frame_to_pa_on)?;
        c.write_u8(m.ht40_power_inc_for_pdadc)?;
        c.write_u8(m.bsw_atten)?;
        c.write_u8(m.bsw_margin)?;
        c.write_u8(m.sw_settle_ht40)?;
        c.write_u8(m.xatten2_db)?;
        c.write_u8(m.xatten2_margin)?;
        c.write_u8(m.db2_01)?;
        c.write_u8(m.version)?;
        c.write_u8(m.ob_23)?;
        c.write_u8(m.ob4_antdiv1)?;
        c.write_u8(m.db1_23)?;
        c.write_u8(m.db1_4_antdiv2)?;
        c.write_u8(m.db2_23)?;
        c.write_u8(m.db2_4)?;
        c.write_u8(m.tx_diversity)?;
        c.write_u8(m.flc_pwr_thresh)?;
        c.write_u8(m.bb_scale_smrt_antenna)?;
        c.skip(1)?;
        for spur in &m.spur_chans {
            c.write_u16(spur.spur_chan)?;
            c.write_u8(spur.range_low)?;
            c.write_u8(spur.range_high)?;
        }

        c.write_bytes(&self.cal_freq_pier_2g)?;
        for pier in &self.cal_pier_data_2g {
            for g in 0..AR9285_NUM_PD_GAINS {
                c.write_bytes(&pier.pwr_pdg[g])?;
            }
            for g in 0..AR9285_NUM_PD_GAINS {
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
        put_tgt!(self.cal_target_power_cck);
        put_tgt!(self.cal_target_power_2g);
        put_tgt!(self.cal_target_power_2g_ht20);
        put_tgt!(self.cal_target_power_2g_ht40);

        c.write_bytes(&self.ctl_index)?;
        for ctl in &self.ctl_data {
            for e in ctl {
                c.write_u8(e.fbin)?;
                c.write_u8(e.ctl)?;
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

pub struct Eep9285 {
    ini: EepInit,
    eep: Ar9285Eeprom,
}

impl Default for Eep9285 {
    fn default() -> Self {
        Self::new()
    }
}

impl Eep9285 {
    pub fn new() -> Self {
        Self {
            ini: EepInit::default(),
            eep: Ar9285Eeprom::default(),
        }
    }

    fn data_image(session: &Session) -> Vec<u8> {
        let mut image = Vec::with_capacity(AR9285_DATA_BYTES);
        for w in &session.eep_buf[AR9285_DATA_START_LOC..AR9285_DATA_START_LOC + AR9285_DATA_SZ] {
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

        pr("Ant Chain 0", format!("0x{:X}", m.ant_ctrl_chain));
        pr("Antenna Common", format!("0x{:X}", m.ant_ctrl_common));
        pr("Antenna Gain Chain 0", format!("{}", m.antenna_gain_ch));
        pr("Switch Settling", format!("{}", m.switch_settling));
        pr("TxRxAttenuation Chain 0", format!("{}", m.tx_rx_atten_ch));
        pr("RxTxMargin Chain 0", format!("{}", m.rx_tx_margin_ch));
        pr("ADC Desired Size", format!("{}", m.adc_desired_size));
        pr("PGA Desired Size", format!("{}", m.pga_desired_size));
        pr("XLNA Gain Chain 0", format!("{}", m.xlna_gain_ch));
        pr("TxEndToXpaOff", format!("{}", m.tx_end_to_xpa_off));
        pr("TxEndToRxOn", format!("{}", m.tx_end_to_rx_on));
        pr("TxFrameToXpaOn", format!("{}", m.tx_frame_to_xpa_on));
        pr("Thresh 62", format!("{}", m.thresh62));
        pr("NF Thresh Chain 0", format!("{}", m.noise_floor_thresh_ch));
        pr("XPD Gain", format!("0x{:x}", m.xpd_gain));
        pr("XPD", format!("{}", m.xpd));
        pr("IQ Cal I Chain 0", format!("{}", m.iq_cal_i_ch));
        pr("IQ Cal Q Chain 0", format!("{}", m.iq_cal_q_ch));
        pr("PD Gain Overlap", format!("{}", m.pd_gain_overlap));
        pr("Output Bias CCK", format!("{}", lo(m.ob_01)));
        pr("Output Bias BPSK", format!("{}", hi(m.ob_01)));
        pr("Driver 1 Bias CCK", format!("{}", lo(m.db1_01)));
        pr("Driver 1 Bias BPSK", format!("{}", hi(m.db1_01)));
        pr("XPA Bias Level", format!("{}", m.xpa_bias_lvl));
        pr("TX Frame to Data Start", format!("{}", m.tx_frame_to_data_start));
        pr("TX Frame to PA On", format!("{}", m.tx_frame_to_pa_on));
        pr("HT40PowerIncForPDADC", format!("{}", m.ht40_power_inc_for_pdadc));
        pr("bsw_atten Chain 0", format!("{}", m.bsw_atten));
        pr("bsw_margin Chain 0", format!("{}", m.bsw_margin));
        pr("Switch Settling [HT40]", format!("{}", m.sw_settle_ht40));
        pr("xatten2DB Chain 0", format!("{}", m.xatten2_db));
        pr("xatten2margin Chain 0", format!("{}", m.xatten2_margin));
        pr("Driver 2 Bias CCK", format!("{}", lo(m.db2_01)));
        pr("Driver 2 Bias BPSK", format!("{}", hi(m.db2_01)));
        pr("ob_db Version", format!("{}", m.version));
        pr("Output Bias QPSK", format!("{}", lo(m.ob_23)));
        pr("Output Bias 16QAM", format!("{}", hi(m.ob_23)));
        pr("Output Bias 64QAM", format!("{}", lo(m.ob4_antdiv1)));
        pr("Ant diversity ctrl 1", format!("{}", hi(m.ob4_antdiv1)));
        pr("Driver 1 Bias QPSK", format!("{}", lo(m.db1_23)));
        pr("Driver 1 Bias 16QAM", format!("{}", hi(m.db1_23)));
        pr("Driver 1 Bias 64QAM", format!("{}", lo(m.db1_4_antdiv2)));
        pr("Ant diversity ctrl 2", format!("{}", hi(m.db1_4_antdiv2)));
        pr("Driver 2 Bias QPSK", format!("{}", lo(m.db2_23)));
        pr("Driver 2 Bias 16QAM", format!("{}", hi(m.db2_23)));
        pr("Driver 2 Bias 64QAM", format!("{}", lo(m.db2_4)));

        out.push('\n');
    }

    fn dump_power(&self, out: &mut String) {
        let eep = &self.eep;

        render::sect_name(out, "EEPROM Power Info");

        render::subsect_name(out, "2 GHz per-freq PD cal. data");
        for chain in 0..AR9285_MAX_CHAINS {
            if eep.base.tx_mask & (1 << chain) == 0 {
                continue;
            }
            let _ = writeln!(out, "  Chain {}:\n", chain);
            for (i, &fbin) in eep.cal_freq_pier_2g.iter().enumerate() {
                if fbin == common::AR5416_BCHAN_UNUSED {
                    break;
                }
                let _ = writeln!(out, "    {:4} MHz:", common::fbin2freq(fbin, true));
                let pier = &eep.cal_pier_data_2g[i];
                let pwr: Vec<&[u8]> = pier.pwr_pdg.iter().map(|g| &g[..]).collect();
                let vpd: Vec<&[u8]> = pier.vpd_pdg.iter().map(|g| &g[..]).collect();
                render::pd_pier_closeloop(
                    out,
                    &pwr,
                    &vpd,
                    eep.modal.xpd_gain,
                    common::AR5416_PWR_TABLE_OFFSET_DB,
                );
                out.push('\n');
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

impl EepMap for Eep9285 {
    fn name(&self) -> &'static str {
        "9285"
    }

    fn desc(&self) -> &'static str {
        "AR9285 chip EEPROM map"
    }

    fn features(&self) -> Features {
        Features {
            raw_eep: true,
            raw_otp: false,
        }
    }

    fn srev_reg(&self) -> Option<u32> {
        Some(0x4020)
    }

    fn eep_buf_words(&self) -> usize {
        AR9285_DATA_START_LOC + AR9285_DATA_SZ
    }

    fn provides(&self, op: Op) -> bool {
        matches!(op, Op::LoadEeprom)
    }

    fn sections(&self) -> &'static [Section] {
        &[Section::Init, Section::Base, Section::Modal, Section::Power]
    }

    fn load_eeprom(&mut self, session: &mut Session, raw: bool) -> Result<()> {
        if !raw {
            common::toggle_byteswap(
                session,
                (AR9285_DATA_START_LOC + 3) as u32,
                (AR9285_DATA_START_LOC + 0x1a / 2) as u32,
            )?;
        }

        session.eep_len = 0;
        session.fill_eep_buf(AR9285_DATA_START_LOC + AR9285_DATA_SZ)?;

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

        self.ini = EepInit::parse(&session.eep_buf[..AR9285_DATA_START_LOC], swap);
        self.eep = Ar9285Eeprom::parse(&image, swap)?;

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
        if el > AR9285_DATA_SZ {
            el = AR9285_DATA_SZ;
        }
        let sum = common::calc_csum(
            &session.eep_buf[AR9285_DATA_START_LOC..AR9285_DATA_START_LOC + el],
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
        Err(Error::not_supported("9285: content updating"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut eep = Ar9285Eeprom::default();
        eep.base.version = 0xe00c;
        eep.base.op_cap_flags = common::AR5416_OPFLAGS_11G;
        eep.modal.ob_01 = 0x21;
        eep.modal.db2_4 = 0x05;
        let image = eep.encode().unwrap();
        assert_eq!(image.len(), AR9285_DATA_BYTES);
        let back = Ar9285Eeprom::parse(&image, false).unwrap();
        assert_eq!(back.base.version, 0xe00c);
        assert_eq!(lo(back.modal.ob_01), 1);
        assert_eq!(hi(back.modal.ob_01), 2);
        assert_eq!(back.encode().unwrap(), image);
    }
}

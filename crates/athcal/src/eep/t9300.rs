// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Built-in AR93xx calibration templates.
//!
//! Factory default images keyed by the small integer id that compressed
//! `BLOCK` records reference. Each template is a fully-populated record
//! serialised on lookup; template versions double as the ids.

use crate::eep::common::{
    freq2fbin, AR5416_OPFLAGS_11A, AR5416_OPFLAGS_11G,
};
use crate::eep::compress::Template;
use crate::eep::f9300::{Ar9300Eeprom, ModalHdr, AR9300_NUM_HT_RATES};

pub const TPL_VER_DEFAULT: u8 = 2;
pub const TPL_VER_H112: u8 = 3;
pub const TPL_VER_H116: u8 = 4;
pub const TPL_VER_X112: u8 = 5;
pub const TPL_VER_X113: u8 = 6;

pub static TEMPLATES: &[Template] = &[
    Template {
        id: TPL_VER_DEFAULT,
        name: "default",
        image: || image(default_template()),
    },
    Template {
        id: TPL_VER_H112,
        name: "H112",
        image: || image(h112_template()),
    },
    Template {
        id: TPL_VER_H116,
        name: "H116",
        image: || image(h116_template()),
    },
    Template {
        id: TPL_VER_X112,
        name: "X112",
        image: || image(x112_template()),
    },
    Template {
        id: TPL_VER_X113,
        name: "X113",
        image: || image(x113_template()),
    },
];

fn image(eep: Ar9300Eeprom) -> Vec<u8> {
    eep.encode().expect("template layout is static")
}

fn pwr2x(dbm: u8) -> u8 {
    dbm * 2
}

fn modal_2g_common() -> ModalHdr {
    let mut m = ModalHdr::default();
    m.ant_ctrl_common = 0x00000110;
    m.ant_ctrl_common2 = 0x00022222;
    m.ant_ctrl_chain = [0x0150, 0x0150, 0x0150];
    m.temp_slope = 25;
    m.spur_chans = [freq2fbin(2464, true), 0, 0, 0, 0];
    m.noise_floor_thresh_ch = [-1, 0, 0];
    m.tx_frame_to_data_start = 0x0e;
    m.tx_frame_to_pa_on = 0x0e;
    m.tx_clip = 3;
    m.switch_settling = 0x2c;
    m.adc_desired_size = -30;
    m.tx_end_to_rx_on = 0x2;
    m.tx_frame_to_xpa_on = 0xe;
    m.thresh62 = 28;
    m.papd_rate_mask_ht20 = 0x0c80c080;
    m.papd_rate_mask_ht40 = 0x0080c080;
    m
}

fn modal_5g_common() -> ModalHdr {
    let mut m = ModalHdr::default();
    m.ant_ctrl_common = 0x00000110;
    m.ant_ctrl_common2 = 0x00022222;
    m.ant_ctrl_chain = [0x0000, 0x0000, 0x0000];
    m.temp_slope = 45;
    m.noise_floor_thresh_ch = [-1, 0, 0];
    m.tx_frame_to_data_start = 0x0e;
    m.tx_frame_to_pa_on = 0x0e;
    m.tx_clip = 3;
    m.switch_settling = 0x2d;
    m.adc_desired_size = -30;
    m.tx_end_to_rx_on = 0x2;
    m.tx_frame_to_xpa_on = 0xe;
    m.thresh62 = 28;
    m.papd_rate_mask_ht20 = 0x0cf0e0e0;
    m.papd_rate_mask_ht40 = 0x6cf0e0e0;
    m
}

fn cal_piers_2g(eep: &mut Ar9300Eeprom) {
    eep.cal_freq_pier_2g = [
        freq2fbin(2412, true),
        freq2fbin(2437, true),
        freq2fbin(2472, true),
    ];
    eep.cal_target_freqbin_cck = [freq2fbin(2412, true), freq2fbin(2484, true)];
    eep.cal_target_freqbin_2g = [
        freq2fbin(2412, true),
        freq2fbin(2437, true),
        freq2fbin(2472, true),
    ];
    eep.cal_target_freqbin_2g_ht20 = eep.cal_target_freqbin_2g;
    eep.cal_target_freqbin_2g_ht40 = eep.cal_target_freqbin_2g;
    eep.cal_target_power_cck = [[pwr2x(17); 4]; 2];
    eep.cal_target_power_2g = [[pwr2x(17), pwr2x(17), pwr2x(16), pwr2x(16)]; 3];
    let mut ht = [pwr2x(16); AR9300_NUM_HT_RATES];
    ht[0] = pwr2x(17);
    ht[1] = pwr2x(17);
    eep.cal_target_power_2g_ht20 = [ht; 3];
    eep.cal_target_power_2g_ht40 = [ht; 3];
}

fn cal_piers_5g(eep: &mut Ar9300Eeprom) {
    eep.cal_freq_pier_5g = [
        freq2fbin(5180, false),
        freq2fbin(5220, false),
        freq2fbin(5320, false),
        freq2fbin(5400, false),
        freq2fbin(5500, false),
        freq2fbin(5600, false),
        freq2fbin(5700, false),
        freq2fbin(5825, false),
    ];
    eep.cal_target_freqbin_5g = [
        freq2fbin(5180, false),
        freq2fbin(5220, false),
        freq2fbin(5320, false),
        freq2fbin(5400, false),
        freq2fbin(5500, false),
        freq2fbin(5600, false),
        freq2fbin(5700, false),
        freq2fbin(5825, false),
    ];
    eep.cal_target_freqbin_5g_ht20 = eep.cal_target_freqbin_5g;
    eep.cal_target_freqbin_5g_ht40 = eep.cal_target_freqbin_5g;
    eep.cal_target_power_5g = [[pwr2x(17), pwr2x(16), pwr2x(15), pwr2x(14)]; 8];
    let mut ht = [pwr2x(14); AR9300_NUM_HT_RATES];
    ht[0] = pwr2x(16);
    ht[1] = pwr2x(15);
    eep.cal_target_power_5g_ht20 = [ht; 8];
    eep.cal_target_power_5g_ht40 = [ht; 8];
}

fn ctl_2g(eep: &mut Ar9300Eeprom) {
    eep.ctl_index_2g = [
        0x11, 0x12, 0x15, 0x17, 0x41, 0x42, 0x45, 0x47, 0x31, 0x32, 0x35, 0x37,
    ];
    let lo = freq2fbin(2412, true);
    let mid = freq2fbin(2437, true);
    let hi = freq2fbin(2472, true);
    for (i, bins) in eep.ctl_freqbin_2g.iter_mut().enumerate() {
        *bins = if i % 4 == 3 {
            [lo, mid, hi, freq2fbin(2484, true)]
        } else {
            [lo, mid, hi, 0xff]
        };
    }
    eep.ctl_power_data_2g = [[0x3c; 4]; 12];
}

fn ctl_5g(eep: &mut Ar9300Eeprom) {
    eep.ctl_index_5g = [0x10, 0x16, 0x18, 0x40, 0x46, 0x48, 0x30, 0x36, 0x38];
    let bins = [
        freq2fbin(5180, false),
        freq2fbin(5260, false),
        freq2fbin(5320, false),
        freq2fbin(5500, false),
        freq2fbin(5600, false),
        freq2fbin(5700, false),
        freq2fbin(5745, false),
        freq2fbin(5825, false),
    ];
    eep.ctl_freqbin_5g = [bins; 9];
    eep.ctl_power_data_5g = [[0x3c; 8]; 9];
}

fn base_record(tpl_ver: u8, op_flags: u8) -> Ar9300Eeprom {
    let mut eep = Ar9300Eeprom::default();
    eep.eeprom_version = 2;
    eep.template_version = tpl_ver;
    eep.mac_addr = [0, 2, 3, 4, 5, 6];
    eep.base.reg_dmn = [0x0000, 0x001f];
    eep.base.txrx_mask = 0x77;
    eep.base.op_flags = op_flags;
    eep.base.device_type = 5;
    eep.base.pwr_table_offset = 0;
    eep.base.feature_enable = 0x0c;
    eep.base.eeprom_write_enable_gpio = 3;
    eep.base.wlan_led_gpio = 8;
    eep.base.rx_band_select_gpio = 0xff;
    eep.modal_2g = modal_2g_common();
    eep.modal_5g = modal_5g_common();
    cal_piers_2g(&mut eep);
    cal_piers_5g(&mut eep);
    ctl_2g(&mut eep);
    ctl_5g(&mut eep);
    eep
}

pub fn default_template() -> Ar9300Eeprom {
    base_record(TPL_VER_DEFAULT, AR5416_OPFLAGS_11G | AR5416_OPFLAGS_11A)
}

/// H112: dual-band high-power reference design.
pub fn h112_template() -> Ar9300Eeprom {
    let mut eep = base_record(TPL_VER_H112, AR5416_OPFLAGS_11G | AR5416_OPFLAGS_11A);
    eep.cust_data[..4].copy_from_slice(b"h112");
    eep.modal_5g.ant_ctrl_common = 0x00000220;
    eep.modal_5g.xatten1_db = [0x19, 0x19, 0x19];
    eep.modal_5g.xatten1_margin = [0x14, 0x14, 0x14];
    eep.base.txrxgain = 0x10;
    eep
}

/// H116: two-stream low-power variant.
pub fn h116_template() -> Ar9300Eeprom {
    let mut eep = base_record(TPL_VER_H116, AR5416_OPFLAGS_11G | AR5416_OPFLAGS_11A);
    eep.cust_data[..4].copy_from_slice(b"h116");
    eep.base.txrx_mask = 0x33;
    eep.base.txrxgain = 0x10;
    eep.modal_2g.ant_ctrl_chain = [0x0010, 0x0010, 0x0010];
    eep.modal_5g.ant_ctrl_chain = [0x0010, 0x0010, 0x0010];
    eep
}

/// X112: dual-band external-PA design.
pub fn x112_template() -> Ar9300Eeprom {
    let mut eep = base_record(TPL_VER_X112, AR5416_OPFLAGS_11G | AR5416_OPFLAGS_11A);
    eep.cust_data[..4].copy_from_slice(b"x112");
    eep.modal_2g.xpa_bias_lvl = 0x0f;
    eep.modal_5g.xpa_bias_lvl = 0x0c;
    eep.modal_5g.xatten1_db = [0x21, 0x21, 0x21];
    eep.modal_5g.xatten1_margin = [0x0e, 0x0e, 0x0e];
    eep
}

/// X113: 5 GHz-only design.
pub fn x113_template() -> Ar9300Eeprom {
    let mut eep = base_record(TPL_VER_X113, AR5416_OPFLAGS_11A);
    eep.mac_addr = [0x00, 0x03, 0x7f, 0x00, 0x00, 0x00];
    eep.cust_data[..14].copy_from_slice(b"x113-023-f0000");
    eep.base.feature_enable = 0x0d;
    eep.base.eeprom_write_enable_gpio = 6;
    eep.base.txrxgain = 0x21;
    eep.modal_5g.ant_ctrl_common = 0x00000220;
    eep.modal_5g.ant_ctrl_common2 = 0x00011111;
    eep.modal_2g.ant_ctrl_common2 = 0x00044444;
    eep.modal_5g.xpa_bias_lvl = 0x0f;
    eep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eep::f9300::AR9300_EEPROM_STRUCT_SIZE;

    #[test]
    fn test_all_templates_serialise_to_struct_size() {
        for tpl in TEMPLATES {
            let image = (tpl.image)();
            assert_eq!(image.len(), AR9300_EEPROM_STRUCT_SIZE, "{}", tpl.name);
        }
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let x113 = Template::find(TEMPLATES, TPL_VER_X113).unwrap();
        assert_eq!(x113.name, "X113");
        let h112 = Template::find_by_name(TEMPLATES, "h112").unwrap();
        assert_eq!(h112.id, TPL_VER_H112);
        assert!(Template::find(TEMPLATES, 99).is_none());
    }

    #[test]
    fn test_template_version_field_matches_id() {
        for (tpl, build) in [
            (TPL_VER_DEFAULT, default_template as fn() -> Ar9300Eeprom),
            (TPL_VER_H112, h112_template),
            (TPL_VER_H116, h116_template),
            (TPL_VER_X112, x112_template),
            (TPL_VER_X113, x113_template),
        ] {
            assert_eq!(build().template_version, tpl);
        }
    }

    #[test]
    fn test_template_ctl_bins_stay_in_band() {
        // Every stored CTL edge is either a sentinel or a decodable
        // frequency inside its band.
        for build in [default_template, h112_template, h116_template, x112_template, x113_template]
        {
            let eep = build();
            for bins in &eep.ctl_freqbin_2g {
                for &b in bins {
                    assert!(
                        b == 0x00 || b == 0xff || (2412..=2484).contains(&crate::eep::common::fbin2freq(b, true))
                    );
                }
            }
            for bins in &eep.ctl_freqbin_5g {
                for &b in bins {
                    assert!(
                        b == 0x00 || b == 0xff || (4900..=5900).contains(&crate::eep::common::fbin2freq(b, false))
                    );
                }
            }
        }
    }

    #[test]
    fn test_x113_is_5ghz_only() {
        let eep = x113_template();
        assert_eq!(eep.base.op_flags & AR5416_OPFLAGS_11G, 0);
        assert_ne!(eep.base.op_flags & AR5416_OPFLAGS_11A, 0);
    }
}

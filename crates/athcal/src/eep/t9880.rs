// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Built-in QCA988x calibration templates.

use crate::eep::common::freq2fbin;
use crate::eep::compress::Template;
use crate::eep::f9880::{
    ModalPiers, Qca9880Eeprom, QCA9880_EEPROM_STRUCT_SIZE, QCA9880_FEATURE_INT_REGULATOR,
    QCA9880_FEATURE_TEMP_COMP, QCA9880_OPFLAGS2_5G_VHT20, QCA9880_OPFLAGS2_5G_VHT40,
    QCA9880_OPFLAGS2_5G_VHT80, QCA9880_OPFLAGS_11A, QCA9880_OPFLAGS_5G_HT20,
    QCA9880_OPFLAGS_5G_HT40,
};

pub const TPL_VER_CUS223: u8 = 3;
pub const TPL_VER_XB140: u8 = 14;

pub static TEMPLATES: &[Template] = &[
    Template {
        id: TPL_VER_CUS223,
        name: "CUS223",
        image: || image(cus223_template()),
    },
    Template {
        id: TPL_VER_XB140,
        name: "XB140",
        image: || image(xb140_template()),
    },
];

fn image(eep: Qca9880Eeprom) -> Vec<u8> {
    eep.encode().expect("template layout is static")
}

fn pwr2x(dbm: u8) -> u8 {
    dbm * 2
}

fn base_record(tpl_ver: u8) -> Qca9880Eeprom {
    let mut eep = Qca9880Eeprom::default();

    eep.base.length = QCA9880_EEPROM_STRUCT_SIZE as u16;
    eep.base.eeprom_version = 2;
    eep.base.template_version = tpl_ver;
    eep.base.mac_addr = [0x00, 0x03, 0x07, 0x12, 0x34, 0x56];
    eep.base.op_cap_brd_flags.op_flags =
        QCA9880_OPFLAGS_11A | QCA9880_OPFLAGS_5G_HT40 | QCA9880_OPFLAGS_5G_HT20;
    eep.base.op_cap_brd_flags.feature_flags =
        QCA9880_FEATURE_TEMP_COMP | QCA9880_FEATURE_INT_REGULATOR;
    eep.base.op_cap_brd_flags.board_flags = 0x00080c44;
    eep.base.op_cap_brd_flags.op_flags2 =
        QCA9880_OPFLAGS2_5G_VHT20 | QCA9880_OPFLAGS2_5G_VHT40 | QCA9880_OPFLAGS2_5G_VHT80;
    eep.base.txrx_mask = 0x77;
    eep.base.swreg = 0x98;
    eep.base.param_for_tuning_caps = 0x4a;
    eep.base.param_for_tuning_caps1 = 0x4a;

    eep.modal_5g.xpa_bias_lvl = 0x0c;
    eep.modal_5g.antenna_gain = 1;
    eep.modal_5g.ant_ctrl_common = 0x00000220;
    eep.modal_5g.ant_ctrl_common2 = 0x00011111;
    eep.modal_5g.ant_ctrl_chain = [0x0010, 0x0010, 0x0010];

    eep.modal_2g.xpa_bias_lvl = 0x0f;
    eep.modal_2g.ant_ctrl_common = 0x00090449;
    eep.modal_2g.ant_ctrl_common2 = 0x00099999;
    eep.modal_2g.ant_ctrl_chain = [0x0000, 0x0000, 0x0000];

    eep.base_ext.xatten1_db = [ModalPiers {
        value_2g: 0x00,
        value_5g_low: 0x18,
        value_5g_mid: 0x18,
        value_5g_high: 0x18,
    }; 3];
    eep.base_ext.xatten1_margin = [ModalPiers {
        value_2g: 0x00,
        value_5g_low: 0x08,
        value_5g_mid: 0x08,
        value_5g_high: 0x08,
    }; 3];

    eep.therm_cal.therm_adc_scaled_gain = 0x00cd;
    eep.therm_cal.rbias = 0x40;

    eep.cal_freq_pier_2g = [0xff, 0xff, 0xff];
    for pier in &mut eep.cal_pier_data_2g {
        pier.therm_cal_val = 121;
        pier.volt_cal_val = 100;
    }

    eep.target_freqbin_2g_cck = [freq2fbin(2412, true), freq2fbin(2472, true)];
    eep.target_freqbin_2g_leg = [
        freq2fbin(2412, true),
        freq2fbin(2442, true),
        freq2fbin(2472, true),
    ];
    eep.target_freqbin_2g_vht20 = eep.target_freqbin_2g_leg;
    eep.target_freqbin_2g_vht40 = eep.target_freqbin_2g_leg;
    for t in &mut eep.target_power_2g_cck {
        t.t_pow2x = [pwr2x(14); 4];
    }
    for t in &mut eep.target_power_2g_leg {
        t.t_pow2x = [pwr2x(14), pwr2x(14), pwr2x(13), pwr2x(12)];
    }
    for t in eep
        .target_power_2g_vht20
        .iter_mut()
        .chain(&mut eep.target_power_2g_vht40)
    {
        t.t_pow2x_base = [pwr2x(14); 3];
    }

    eep.cal_freq_pier_5g = [
        freq2fbin(5180, false),
        freq2fbin(5240, false),
        freq2fbin(5320, false),
        freq2fbin(5500, false),
        freq2fbin(5600, false),
        freq2fbin(5700, false),
        freq2fbin(5745, false),
        freq2fbin(5825, false),
    ];
    for pier in &mut eep.cal_pier_data_5g {
        pier.therm_cal_val = 121;
        pier.volt_cal_val = 100;
    }

    eep.target_freqbin_5g_leg = [
        freq2fbin(5180, false),
        freq2fbin(5320, false),
        freq2fbin(5500, false),
        freq2fbin(5600, false),
        freq2fbin(5700, false),
        freq2fbin(5825, false),
    ];
    eep.target_freqbin_5g_vht20 = eep.target_freqbin_5g_leg;
    eep.target_freqbin_5g_vht40 = eep.target_freqbin_5g_leg;
    eep.target_freqbin_5g_vht80 = eep.target_freqbin_5g_leg;
    for t in &mut eep.target_power_5g_leg {
        t.t_pow2x = [pwr2x(15), pwr2x(14), pwr2x(13), pwr2x(12)];
    }
    for t in eep
        .target_power_5g_vht20
        .iter_mut()
        .chain(&mut eep.target_power_5g_vht40)
        .chain(&mut eep.target_power_5g_vht80)
    {
        t.t_pow2x_base = [pwr2x(15), pwr2x(14), pwr2x(13)];
    }

    eep.ctl_index_5g = [
        0x10, 0x16, 0x18, 0x19, 0x40, 0x46, 0x48, 0x49, 0x30, 0x36, 0x38, 0x39, 0, 0, 0, 0, 0, 0,
    ];
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
    for (i, f) in eep.ctl_freqbin_5g.iter_mut().enumerate() {
        if eep.ctl_index_5g[i] != 0 {
            *f = bins;
        }
    }
    for (i, d) in eep.ctl_data_5g.iter_mut().enumerate() {
        if eep.ctl_index_5g[i] != 0 {
            *d = [0x3c; 8];
        }
    }

    // A template must itself be a checksum-valid image.
    let mut image = eep.encode().expect("template layout is static");
    crate::eep::common::fixup_csum_bytes(&mut image, 2);
    eep.base.checksum = u16::from_le_bytes([image[2], image[3]]);

    eep
}

/// CUS223: 5 GHz-only three-stream reference board.
pub fn cus223_template() -> Qca9880Eeprom {
    base_record(TPL_VER_CUS223)
}

/// XB140: later 5 GHz reference board with a two-stream radio.
pub fn xb140_template() -> Qca9880Eeprom {
    let mut eep = base_record(TPL_VER_XB140);
    eep.base.txrx_mask = 0x33;
    eep.modal_5g.ant_ctrl_common2 = 0x00022222;
    eep.base_ext.xatten1_db = [ModalPiers {
        value_2g: 0x00,
        value_5g_low: 0x10,
        value_5g_mid: 0x10,
        value_5g_high: 0x10,
    }; 3];
    // Chain-mask change shifts the fold; re-seal the image.
    let mut image = eep.encode().expect("template layout is static");
    crate::eep::common::fixup_csum_bytes(&mut image, 2);
    eep.base.checksum = u16::from_le_bytes([image[2], image[3]]);
    eep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eep::common::calc_csum_bytes;

    #[test]
    fn test_templates_serialise_to_struct_size() {
        for tpl in TEMPLATES {
            assert_eq!((tpl.image)().len(), QCA9880_EEPROM_STRUCT_SIZE, "{}", tpl.name);
        }
    }

    #[test]
    fn test_templates_are_checksum_valid() {
        for tpl in TEMPLATES {
            assert_eq!(calc_csum_bytes(&(tpl.image)()), 0xffff, "{}", tpl.name);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Template::find(TEMPLATES, TPL_VER_XB140).unwrap().name, "XB140");
        assert_eq!(
            Template::find_by_name(TEMPLATES, "cus223").unwrap().id,
            TPL_VER_CUS223
        );
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Text rendering of parsed calibration data.
//!
//! All helpers append to a `String` so callers (and tests) decide where the
//! text goes. The contract: every field of a record is emitted exactly
//! once, per-chain and per-band data are labelled, power values are shown
//! in dBm at the granularity of the stored array (0.5 or 0.25 dB units).

use std::fmt::Write;

use crate::eep::common::{
    ctl_edge_flags, ctl_edge_power, fbin2freq, ACCESS_TYPE_NAMES, CTL_DOMAIN_NAMES,
    CTL_MODE_NAMES,
};

/// `.----------------------.` style section banner.
pub fn sect_name(out: &mut String, name: &str) {
    let _ = write!(
        out,
        "\n.----------------------.\n| {:<20} |\n'----------------------'\n\n",
        name
    );
}

pub fn subsect_name(out: &mut String, name: &str) {
    let _ = writeln!(out, "[{}]\n", name);
}

/// Canonical hex + ASCII dump, 16 octets per row.
pub fn hexdump(out: &mut String, buf: &[u8]) {
    let mut i = 0;
    while i < buf.len() {
        for j in 0..16 {
            if j % 8 == 0 {
                out.push(' ');
            }
            if i + j < buf.len() {
                let _ = write!(out, " {:02x}", buf[i + j]);
            } else {
                out.push_str("   ");
            }
        }
        out.push_str(" |");
        for j in 0..16 {
            if i + j >= buf.len() {
                out.push(' ');
            } else {
                let c = buf[i + j];
                out.push(if c.is_ascii_graphic() || c == b' ' {
                    c as char
                } else {
                    '.'
                });
            }
        }
        out.push_str("|\n");
        i += 16;
    }
}

/// One register-init record of the pre-calibration EEPROM area.
#[derive(Debug, Clone, Copy)]
pub struct RegInit {
    pub addr: u16,
    pub val_low: u16,
    pub val_high: u16,
}

/// Chip init data of the 5416-era EEPROM head: magic word, access
/// protection field and register initialization records.
pub fn eep_init(out: &mut String, magic: u16, prot: u16, iptr: u16, regs: &[RegInit]) {
    let _ = writeln!(out, "{:<20} : 0x{:04X}", "Magic", magic);
    for i in 0..8 {
        let _ = writeln!(
            out,
            "Region{} access       : {}",
            i,
            ACCESS_TYPE_NAMES[usize::from((prot >> (i * 2)) & 0x3)]
        );
    }
    let _ = writeln!(out, "{:<20} : 0x{:04X}", "Regs init data ptr", iptr);
    out.push('\n');

    subsect_name(out, "Register(s) initialization data");
    for reg in regs {
        if reg.addr == 0xffff {
            break;
        }
        let _ = writeln!(out, "  {:04X}: {:04X}{:04X}", reg.addr, reg.val_high, reg.val_low);
    }
    out.push('\n');
}

/// One CTL band edge: compact frequency bin + packed power/flags octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CtlEdge {
    pub fbin: u8,
    pub ctl: u8,
}

/// `"FCC 2GHz CCK"` style label of a CTL index octet.
pub fn ctl_label(ctl: u8) -> String {
    format!(
        "{} {}",
        CTL_DOMAIN_NAMES[usize::from(ctl >> 4)],
        CTL_MODE_NAMES[usize::from(ctl & 0x0f)]
    )
}

/// Render the edge frequencies with the bracketing convention: edges with
/// zero flag bits toggle an open/closed state, an opening edge is prefixed
/// with `[` and the closing one suffixed with `]`, marking the contiguous
/// allowed ranges. Follows with the per-edge max-power line.
///
/// `sparse` selects the sentinel convention: `false` terminates at the
/// first zero bin (legacy packed tables), `true` skips `0x00`/`0xff` bins
/// in place (fixed-size tables of the newer maps).
pub fn ctl_edges(out: &mut String, edges: &[CtlEdge], is_2g: bool, sparse: bool) {
    let live = |e: &&CtlEdge| e.fbin != 0x00 && e.fbin != 0xff;

    let mut open = true;
    let mut line = String::new();
    for e in edges.iter() {
        if !sparse && e.fbin == 0 {
            break;
        }
        if sparse && !live(&e) {
            continue;
        }
        let boundary = ctl_edge_flags(e.ctl) == 0;
        let tok = if boundary && open {
            format!("[{}", fbin2freq(e.fbin, is_2g))
        } else if boundary && !open {
            format!("{}]", fbin2freq(e.fbin, is_2g))
        } else {
            format!("{}", fbin2freq(e.fbin, is_2g))
        };
        if !line.is_empty() {
            line.push_str(if line.ends_with(']') { " " } else { "  " });
        }
        line.push_str(&tok);
        if boundary {
            open = !open;
        }
    }
    let _ = writeln!(out, "           Edges, MHz: {}", line);

    let _ = write!(out, "      MaxTxPower, dBm:");
    for e in edges.iter() {
        if !sparse && e.fbin == 0 {
            break;
        }
        if sparse && !live(&e) {
            continue;
        }
        let _ = write!(out, "  {:4.1} ", f64::from(ctl_edge_power(e.ctl)) / 2.0);
    }
    out.push('\n');
}

/// A per-pier target power column: frequency bin plus one power per rate
/// (0.5 dB units).
pub struct TgtPower<'a> {
    pub fbin: u8,
    pub pow2x: &'a [u8],
}

/// Per-rate target power table: frequency columns, rate rows.
pub fn target_power(out: &mut String, piers: &[TgtPower<'_>], rates: &[&str], is_2g: bool) {
    let live: Vec<&TgtPower> = piers
        .iter()
        .take_while(|p| p.fbin != crate::eep::common::AR5416_BCHAN_UNUSED)
        .collect();

    let _ = write!(out, "    {:>10}, MHz:", "Freq");
    for p in &live {
        let _ = write!(out, "  {:4}", fbin2freq(p.fbin, is_2g));
    }
    out.push('\n');
    let _ = write!(out, "    ----------------");
    for _ in &live {
        out.push_str("  ----");
    }
    out.push('\n');

    for (i, rate) in rates.iter().enumerate() {
        let _ = write!(out, "    {:>10}, dBm:", rate);
        for p in &live {
            let _ = write!(out, "  {:4.1}", f64::from(p.pow2x[i]) / 2.0);
        }
        out.push('\n');
    }
}

/// Per-gain power/VPD series merged onto one shared power axis.
///
/// `pwr` is the merged power column (strictly increasing, in whatever unit
/// the caller stored); `vpd[i][gain]` is the detector reading of `gain` at
/// `pwr[i]`, `None` where that gain has no sample at this power.
pub struct MergedPd {
    pub pwr: Vec<i32>,
    pub vpd: Vec<Vec<Option<u8>>>,
}

/// Merge per-gain `(power, vpd)` series: duplicates across gains collapse
/// into one row, so the merged power axis is strictly increasing.
pub fn merge_pd_series(pwr: &[&[i32]], vpd: &[&[u8]]) -> MergedPd {
    let ngains = pwr.len();
    let mut idx = vec![0usize; ngains];
    let mut merged = MergedPd {
        pwr: Vec::new(),
        vpd: Vec::new(),
    };

    loop {
        let mut pwrmin = i32::MAX;
        for g in 0..ngains {
            if idx[g] < pwr[g].len() && pwr[g][idx[g]] < pwrmin {
                pwrmin = pwr[g][idx[g]];
            }
        }
        if pwrmin == i32::MAX {
            break;
        }
        let mut row = vec![None; ngains];
        for g in 0..ngains {
            if idx[g] < pwr[g].len() && pwr[g][idx[g]] == pwrmin {
                row[g] = Some(vpd[g][idx[g]]);
                idx[g] += 1;
            }
        }
        merged.pwr.push(pwrmin);
        merged.vpd.push(row);
    }

    merged
}

const PD_GAIN_LABELS: [&str; 4] = ["4", "2", "1", "0.5"];

/// Render a closed-loop PD calibration pier: per-gain stored series merged
/// onto a shared power axis (0.25 dB units plus table offset), one VPD row
/// per gain enabled in `gainmask`, blank cells where a gain has no sample.
///
/// Gain-mask bit indexes do not match stored-set indexes: stored sets are
/// packed without gaps, set k serves the k-th set bit of the mask.
pub fn pd_pier_closeloop(
    out: &mut String,
    pwr_per_gain: &[&[u8]],
    vpd_per_gain: &[&[u8]],
    gainmask: u8,
    power_table_offset: i32,
) {
    let nstored = pwr_per_gain.len();
    let ngains = (0..PD_GAIN_LABELS.len())
        .filter(|b| gainmask & (1 << b) != 0)
        .count();
    if ngains > nstored {
        let _ = writeln!(
            out,
            "      PD gain mask activates more gains then possible to store -- {} > {}",
            ngains, nstored
        );
        return;
    }

    // 0xff power entries are unused tail slots
    let pwr_i32: Vec<Vec<i32>> = pwr_per_gain
        .iter()
        .take(ngains)
        .map(|s| {
            s.iter()
                .take_while(|&&p| p != 0xff)
                .map(|&p| i32::from(p))
                .collect()
        })
        .collect();
    let pwr_refs: Vec<&[i32]> = pwr_i32.iter().map(Vec::as_slice).collect();
    let vpd_refs: Vec<&[u8]> = vpd_per_gain
        .iter()
        .take(ngains)
        .zip(&pwr_i32)
        .map(|(s, p)| &s[..p.len()])
        .collect();

    let merged = merge_pd_series(&pwr_refs, &vpd_refs);

    let _ = write!(out, "      Tx Power, dBm:");
    for p in &merged.pwr {
        let _ = write!(out, " {:5.2}", f64::from(*p) / 4.0 + f64::from(power_table_offset));
    }
    out.push('\n');
    let _ = write!(out, "      --------------");
    for _ in &merged.pwr {
        out.push_str(" -----");
    }
    out.push('\n');

    let mut stored = 0;
    for (bit, label) in PD_GAIN_LABELS.iter().enumerate() {
        if gainmask & (1 << bit) == 0 {
            continue;
        }
        let _ = write!(out, "      Gain x{:<3} VPD:", label);
        for row in &merged.vpd {
            match row[stored] {
                Some(vpd) => {
                    let _ = write!(out, "   {:3}", vpd);
                }
                None => out.push_str("      "),
            }
        }
        out.push('\n');
        stored += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eep::common::{ctl_pack, freq2fbin};

    #[test]
    fn test_ctl_bracket_rendering() {
        let edges: Vec<CtlEdge> = [2412u32, 2417, 2457, 2462]
            .iter()
            .map(|&f| CtlEdge {
                fbin: freq2fbin(f, true),
                ctl: ctl_pack(60, 0),
            })
            .collect();
        let mut out = String::new();
        ctl_edges(&mut out, &edges, true, false);
        assert!(
            out.contains("[2412  2417] [2457  2462]"),
            "got: {:?}",
            out
        );
    }

    #[test]
    fn test_ctl_interior_edge_stays_unbracketed() {
        let edges = [
            CtlEdge {
                fbin: freq2fbin(5180, false),
                ctl: ctl_pack(40, 0),
            },
            CtlEdge {
                fbin: freq2fbin(5200, false),
                ctl: ctl_pack(40, 1),
            },
            CtlEdge {
                fbin: freq2fbin(5320, false),
                ctl: ctl_pack(40, 0),
            },
        ];
        let mut out = String::new();
        ctl_edges(&mut out, &edges, false, false);
        assert!(out.contains("[5180  5200  5320]"), "got: {:?}", out);
    }

    #[test]
    fn test_ctl_sparse_skips_sentinels() {
        let edges = [
            CtlEdge { fbin: 0xff, ctl: 0 },
            CtlEdge {
                fbin: freq2fbin(2412, true),
                ctl: ctl_pack(30, 0),
            },
            CtlEdge { fbin: 0x00, ctl: 0 },
            CtlEdge {
                fbin: freq2fbin(2472, true),
                ctl: ctl_pack(30, 0),
            },
        ];
        let mut out = String::new();
        ctl_edges(&mut out, &edges, true, true);
        assert!(out.contains("[2412  2472]"), "got: {:?}", out);
    }

    #[test]
    fn test_merge_produces_strictly_increasing_axis() {
        let p0 = [0i32, 8, 16, 24];
        let p1 = [8i32, 16, 32];
        let v0 = [10u8, 20, 30, 40];
        let v1 = [11u8, 21, 31];
        let merged = merge_pd_series(&[&p0, &p1], &[&v0, &v1]);
        assert_eq!(merged.pwr, vec![0, 8, 16, 24, 32]);
        for w in merged.pwr.windows(2) {
            assert!(w[0] < w[1]);
        }
        // Duplicate power 8 collapsed into one row feeding both gains.
        assert_eq!(merged.vpd[1], vec![Some(20), Some(11)]);
        // Power 32 exists only for the second gain.
        assert_eq!(merged.vpd[4], vec![None, Some(31)]);
    }

    #[test]
    fn test_pd_pier_blank_cells() {
        let pwr0 = [0u8, 4, 8, 0xff, 0xff];
        let vpd0 = [5u8, 10, 15, 0xff, 0xff];
        let pwr1 = [4u8, 8, 12, 0xff, 0xff];
        let vpd1 = [50u8, 60, 70, 0xff, 0xff];
        let mut out = String::new();
        pd_pier_closeloop(&mut out, &[&pwr0, &pwr1], &[&vpd0, &vpd1], 0x3, 0);
        assert!(out.contains("Gain x4"));
        assert!(out.contains("Gain x2"));
        // Power 12 has no sample for the first stored gain -> blank run.
        let gain4_line = out.lines().find(|l| l.contains("Gain x4")).unwrap();
        assert!(gain4_line.ends_with("      "));
    }

    #[test]
    fn test_target_power_table() {
        let piers = [
            TgtPower {
                fbin: freq2fbin(2412, true),
                pow2x: &[36, 36, 32, 32],
            },
            TgtPower {
                fbin: freq2fbin(2472, true),
                pow2x: &[34, 34, 30, 30],
            },
        ];
        let mut out = String::new();
        target_power(&mut out, &piers, &crate::eep::common::RATES_CCK, true);
        assert!(out.contains("2412"));
        assert!(out.contains("2472"));
        assert!(out.contains("18.0"));
        assert!(out.contains("11 mbps"));
    }

    #[test]
    fn test_hexdump_shape() {
        let mut out = String::new();
        hexdump(&mut out, b"athcal customer data");
        assert!(out.contains("61 74 68 63 61 6c"));
        assert!(out.contains("|athcal customer "));
    }
}

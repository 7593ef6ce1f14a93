// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! athcalctl - Atheros/Qualcomm NIC calibration data management utility.
//!
//! Reads, validates, dumps and updates the calibration data the NICs keep
//! in EEPROM, OTP memory or file dumps.

mod logger;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use athcal::chip;
use athcal::eep::{compress::Template, EepMap, Family, Section, UpdateParam};
use athcal::error::{Error, Result};
use athcal::loader::{self, LoadMode, Session};
use athcal::source::{Connector, FileConnector, MemConnector, StubConnector, CON_CAP_HW};

/// Atheros NIC EEPROM management utility
#[derive(Parser, Debug)]
#[command(name = "athcalctl")]
#[command(version)]
#[command(about = "Atheros/Qualcomm NIC calibration data (EEPROM/OTP) management utility")]
#[command(after_help = AFTER_HELP)]
struct Args {
    /// Read EEPROM dump from the file
    #[arg(short = 'F', value_name = "eepdump")]
    file: Option<PathBuf>,

    /// Interact with the card via /dev/mem by mapping the card I/O memory
    /// at the given address
    #[arg(short = 'M', value_name = "ioaddr")]
    mem: Option<String>,

    /// Override the EEPROM map type: a map name (e.g. 9300), a chip name
    /// (e.g. AR9280) or a PCI device id prefixed with 'PCI:' (e.g.
    /// PCI:0029). Required for connectors without chip autodetection.
    #[arg(short = 't', value_name = "eepmap")]
    eepmap: Option<String>,

    /// Be verbose: log action stages, print all EEPROM data. Repeat for
    /// more detail.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Action to perform (default: dump) followed by its arguments
    #[arg(value_name = "action")]
    action: Vec<String>,
}

const AFTER_HELP: &str = "\
Available actions:
  dump [<sects>]  Read & parse the EEPROM content and dump it to the
                  terminal (default action). <sects> is a comma-separated
                  list of sections: init, base, modal, power, all, none.
  save <file>     Save fetched raw EEPROM content to the file.
  saveraw <file>  Save raw EEPROM or OTP contents without any pre-checks.
  saveraweep <file>  Same as 'saveraw', but EEPROM contents only.
  saverawotp <file>  Same as 'saveraw', but OTP mem contents only.
  unpack <file>   Save unpacked (decompressed) calibration data.
  update <param>[=<val>]  Set an EEPROM parameter (e.g. mac=xx:...:xx).
  templateexport <name-or-id> <file>  Export a built-in template.
  gpiodump        Dump GPIO lines state to the terminal.
  regread <addr>  Read a register and print its value.
  regwrite <addr> <val>  Write a value to a register.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Dump,
    Save,
    SaveRaw,
    SaveRawEep,
    SaveRawOtp,
    Unpack,
    Update,
    TemplateExport,
    GpioDump,
    RegRead,
    RegWrite,
}

impl Action {
    fn from_name(name: &str) -> Option<Action> {
        Some(match name.to_ascii_lowercase().as_str() {
            "dump" => Action::Dump,
            "save" => Action::Save,
            "saveraw" => Action::SaveRaw,
            "saveraweep" => Action::SaveRawEep,
            "saverawotp" => Action::SaveRawOtp,
            "unpack" => Action::Unpack,
            "update" => Action::Update,
            "templateexport" => Action::TemplateExport,
            "gpiodump" => Action::GpioDump,
            "regread" => Action::RegRead,
            "regwrite" => Action::RegWrite,
            _ => return None,
        })
    }

    fn needs_data(self) -> bool {
        matches!(
            self,
            Action::Dump
                | Action::Save
                | Action::SaveRaw
                | Action::SaveRawEep
                | Action::SaveRawOtp
                | Action::Unpack
                | Action::Update
        )
    }

    fn needs_hw(self) -> bool {
        matches!(self, Action::GpioDump | Action::RegRead | Action::RegWrite)
    }

    fn autonomous(self) -> bool {
        matches!(self, Action::TemplateExport)
    }

    fn load_mode(self) -> LoadMode {
        match self {
            Action::SaveRaw => LoadMode::RawAny,
            Action::SaveRawEep => LoadMode::RawEep,
            Action::SaveRawOtp => LoadMode::RawOtp,
            _ => LoadMode::Normal,
        }
    }
}

fn find_eepmap(arg: &str) -> Result<Family> {
    if let Some(family) = Family::from_name(arg) {
        return Ok(family);
    }
    if let Some(chip) = chip::find_by_name(arg) {
        return Ok(chip.family);
    }
    if let Some(hex) = arg
        .strip_prefix("PCI:")
        .or_else(|| arg.strip_prefix("pci:"))
    {
        let dev_id = u16::from_str_radix(hex, 16).map_err(|_| {
            Error::invalid_argument(format!("invalid PCI Device ID string format -- {}", hex))
        })?;
        if dev_id == 0 {
            return Err(Error::invalid_argument(format!(
                "invalid PCI Device ID string format -- {}",
                hex
            )));
        }
        if let Some(chip) = chip::find_by_pci_id(dev_id).first() {
            return Ok(chip.family);
        }
    }
    Err(Error::invalid_argument(format!(
        "unknown EEPROM map type or chip name or chip Id: {}",
        arg
    )))
}

fn parse_macaddr(val: &str) -> Result<[u8; 6]> {
    let octets: Vec<&str> = val.split(':').collect();
    if octets.len() != 6 {
        return Err(Error::invalid_argument(format!(
            "can not parse MAC address - {}",
            val
        )));
    }
    let mut mac = [0u8; 6];
    for (out, part) in mac.iter_mut().zip(octets) {
        *out = u8::from_str_radix(part, 16).map_err(|_| {
            Error::invalid_argument(format!("can not parse MAC address - {}", val))
        })?;
    }
    // All-zero and multicast addresses make no sense on a NIC
    if mac == [0; 6] || mac[0] & 0x01 != 0 {
        return Err(Error::invalid_argument(format!(
            "invalid MAC address - {}",
            val
        )));
    }
    Ok(mac)
}

fn parse_reg_addr(arg: &str) -> Result<u32> {
    let arg = arg.strip_prefix("0x").unwrap_or(arg);
    let addr = u32::from_str_radix(arg, 16)
        .map_err(|_| Error::invalid_argument(format!("invalid register address -- {}", arg)))?;
    if addr % 4 != 0 {
        return Err(Error::invalid_argument(format!(
            "invalid register address -- {}",
            arg
        )));
    }
    Ok(addr)
}

fn act_dump(session: &Session, map: &dyn EepMap, args: &[String]) -> Result<()> {
    let default = String::from("all");
    let list = args.first().unwrap_or(&default);

    let mut dump_sections: Vec<Section> = Vec::new();
    for tok in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if tok.eq_ignore_ascii_case("all") {
            dump_sections = map.sections().to_vec();
            break;
        }
        if tok.eq_ignore_ascii_case("none") {
            return Ok(());
        }
        let section = Section::from_name(tok).ok_or_else(|| {
            Error::invalid_argument(format!("unknown EEPROM section to dump -- {}", tok))
        })?;
        if !map.supports_section(section) {
            // Just ignore without interruption
            log::warn!(
                "{} EEPROM map does not support {} section dumping",
                map.name(),
                section.name()
            );
            continue;
        }
        dump_sections.push(section);
    }

    let mut out = String::new();
    for section in dump_sections {
        map.dump(session, section, &mut out);
    }
    print!("{}", out);

    Ok(())
}

fn act_save(session: &Session, args: &[String]) -> Result<()> {
    let path = args.first().ok_or_else(|| {
        Error::invalid_argument("output file for EEPROM saving is not specified")
    })?;

    if session.eep_len == 0 {
        return Err(Error::not_found("no EEPROM data fetched"));
    }

    let mut bytes = Vec::with_capacity(session.eep_len * 2);
    for w in &session.eep_buf[..session.eep_len] {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    fs::write(path, &bytes)
        .map_err(|e| Error::io(format!("unable to save EEPROM contents: {}", e)))?;

    Ok(())
}

fn act_unpack(session: &Session, map: &dyn EepMap, args: &[String]) -> Result<()> {
    let path = args.first().ok_or_else(|| {
        Error::invalid_argument("output file for unpacked data saving is not specified")
    })?;

    if map.unpacked_size() == 0 {
        return Err(Error::not_supported(format!(
            "{} EEPROM map does not support unpacked data saving",
            map.name()
        )));
    }
    if session.unpacked_len == 0 {
        return Err(Error::not_found(
            "no unpacked data were produced, possibly data were not packed",
        ));
    }

    fs::write(path, &session.unpacked[..session.unpacked_len])
        .map_err(|e| Error::io(format!("unable to save unpacked data: {}", e)))?;

    Ok(())
}

fn act_update(session: &mut Session, map: &mut dyn EepMap, args: &[String]) -> Result<()> {
    let arg = args
        .first()
        .ok_or_else(|| Error::invalid_argument("parameter for update is not specified"))?;

    let (name, value) = match arg.split_once('=') {
        Some((n, v)) if !v.is_empty() => (n, Some(v)),
        Some((n, _)) => (n, None),
        None => (arg.as_str(), None),
    };

    let param = match name.to_ascii_lowercase().as_str() {
        "mac" => {
            let value = value.ok_or_else(|| {
                Error::invalid_argument("MAC address update requires an argument")
            })?;
            UpdateParam::Mac(parse_macaddr(value)?)
        }
        "erasectl" => UpdateParam::EraseCtl,
        other => {
            return Err(Error::invalid_argument(format!(
                "unknown parameter name -- {}",
                other
            )))
        }
    };

    loader::update(session, map, &param)
}

fn act_template_export(map: &dyn EepMap, args: &[String]) -> Result<()> {
    let name_or_id = args
        .first()
        .ok_or_else(|| Error::invalid_argument("template Name or Id is not specified"))?;
    let path = args.get(1).ok_or_else(|| {
        Error::invalid_argument("output file for template export is not specified")
    })?;

    let templates = map.templates();
    if templates.is_empty() || map.unpacked_size() == 0 {
        return Err(Error::not_supported(format!(
            "{} EEPROM map does not have any templates",
            map.name()
        )));
    }

    let tpl = name_or_id
        .parse::<u8>()
        .ok()
        .and_then(|id| Template::find(templates, id))
        .or_else(|| Template::find_by_name(templates, name_or_id))
        .ok_or_else(|| Error::invalid_argument(format!("unknown template -- {}", name_or_id)))?;

    let image = (tpl.image)();
    fs::write(path, &image)
        .map_err(|e| Error::io(format!("unable to save template data: {}", e)))?;

    Ok(())
}

fn act_gpio_dump(session: &mut Session) -> Result<()> {
    if session.gpio_num == 0 {
        return Err(Error::not_supported("GPIO control for this chip"));
    }

    print!("{:>20}:", "GPIO #");
    for i in 0..session.gpio_num {
        print!(" {:<3}", i);
    }
    println!();
    print!("{:>20}:", "Direction");
    for i in 0..session.gpio_num {
        print!(" {:<3}", session.gpio_dir_get_str(i)?);
    }
    println!();
    if session.gpio_has_out_mux() {
        print!("{:>20}:", "Output mux");
        for i in 0..session.gpio_num {
            print!(" {:<3}", session.gpio_out_mux_get_str(i)?);
        }
        println!();
    }
    print!("{:>20}:", "Input value");
    for i in 0..session.gpio_num {
        print!(" {}  ", if session.gpio_input_get(i)? { '1' } else { ' ' });
    }
    println!();
    print!("{:>20}:", "Output value");
    for i in 0..session.gpio_num {
        print!(" {}  ", if session.gpio_output_get(i)? { '1' } else { ' ' });
    }
    println!();

    Ok(())
}

fn act_reg_read(session: &mut Session, args: &[String]) -> Result<()> {
    let addr = parse_reg_addr(
        args.first()
            .ok_or_else(|| Error::invalid_argument("register address is not specified"))?,
    )?;

    let val = session.con.reg_read(addr)?;
    println!("0x{:08x}: 0x{:08x}", addr, val);

    Ok(())
}

fn act_reg_write(session: &mut Session, args: &[String]) -> Result<()> {
    if args.len() < 2 {
        return Err(Error::invalid_argument(
            "register address and (or) value are not specified",
        ));
    }
    let addr = parse_reg_addr(&args[0])?;
    let val_str = args[1].strip_prefix("0x").unwrap_or(&args[1]);
    let val = u32::from_str_radix(val_str, 16)
        .map_err(|_| Error::invalid_argument(format!("invalid register value -- {}", args[1])))?;

    session.con.reg_write(addr, val)
}

fn run(args: &Args) -> Result<()> {
    let (action, act_args) = match args.action.first() {
        None => (Action::Dump, &args.action[..]),
        Some(name) => {
            let action = Action::from_name(name)
                .ok_or_else(|| Error::invalid_argument(format!("unknown action -- {}", name)))?;
            (action, &args.action[1..])
        }
    };

    let user_family = args.eepmap.as_deref().map(find_eepmap).transpose()?;

    let mut con: Box<dyn Connector> = if let Some(path) = &args.file {
        Box::new(FileConnector::open(path)?)
    } else if let Some(ioaddr) = &args.mem {
        let addr = ioaddr.strip_prefix("0x").unwrap_or(ioaddr);
        let addr = u64::from_str_radix(addr, 16).map_err(|_| {
            Error::invalid_argument(format!("invalid I/O memory start address -- {}", ioaddr))
        })?;
        Box::new(MemConnector::open(addr)?)
    } else if action.autonomous() {
        Box::new(StubConnector)
    } else {
        return Err(Error::invalid_argument("connector is not specified"));
    };

    if action.needs_hw() && con.caps() & CON_CAP_HW == 0 {
        return Err(Error::not_supported(format!(
            "{} action requires direct HW access, which is not provided by the {} connector",
            args.action.first().map_or("dump", String::as_str),
            con.name()
        )));
    }

    let family = match user_family {
        Some(f) => f,
        None => {
            if action.autonomous() {
                return Err(Error::invalid_argument(
                    "EEPROM map is not specified, aborting",
                ));
            }
            return Err(Error::invalid_argument(
                "EEPROM map type option is mandatory for connectors without \
                 chip autodetection (Plug and Play) support",
            ));
        }
    };

    let mut map = family.create();

    if action == Action::TemplateExport {
        return act_template_export(map.as_ref(), act_args);
    }

    let mut session = Session::new(con.as_mut());

    if session.con.caps() & CON_CAP_HW != 0 {
        session.hw_init(map.as_ref())?;
    }

    if action.needs_data() {
        session.setup_io();

        let mode = action.load_mode();
        if mode.is_raw() {
            let features = map.features();
            if mode == LoadMode::RawEep && !features.raw_eep {
                return Err(Error::not_supported(format!(
                    "{} EEPROM map does not support RAW EEPROM contents loading",
                    map.name()
                )));
            }
            if mode == LoadMode::RawOtp && !features.raw_otp {
                return Err(Error::not_supported(format!(
                    "{} EEPROM map does not support RAW OTP contents loading",
                    map.name()
                )));
            }
            if mode == LoadMode::RawAny && !features.raw_eep && !features.raw_otp {
                return Err(Error::not_supported(format!(
                    "{} EEPROM map does not support any RAW data loading",
                    map.name()
                )));
            }
        }

        loader::load(&mut session, map.as_mut(), mode)?;
    }

    match action {
        Action::Dump => act_dump(&session, map.as_ref(), act_args),
        Action::Save | Action::SaveRaw | Action::SaveRawEep | Action::SaveRawOtp => {
            act_save(&session, act_args)
        }
        Action::Unpack => act_unpack(&session, map.as_ref(), act_args),
        Action::Update => act_update(&mut session, map.as_mut(), act_args),
        Action::GpioDump => act_gpio_dump(&mut session),
        Action::RegRead => act_reg_read(&mut session, act_args),
        Action::RegWrite => act_reg_write(&mut session, act_args),
        Action::TemplateExport => unreachable!("handled before session setup"),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            // The error kind maps to a negative code; the process exit
            // status carries its absolute value.
            ExitCode::from((-e.exit_code()) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(Action::from_name("DUMP"), Some(Action::Dump));
        assert_eq!(Action::from_name("saveraweep"), Some(Action::SaveRawEep));
        assert_eq!(Action::from_name("nosuch"), None);
    }

    #[test]
    fn test_mac_parse() {
        assert_eq!(
            parse_macaddr("AA:BB:CC:DD:EE:FF").unwrap(),
            [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]
        );
        assert!(parse_macaddr("00:00:00:00:00:00").is_err()); // all-zero
        assert!(parse_macaddr("01:00:5e:00:00:01").is_err()); // multicast
        assert!(parse_macaddr("aa-bb-cc-dd-ee-ff").is_err());
        assert!(parse_macaddr("aa:bb:cc").is_err());
    }

    #[test]
    fn test_eepmap_resolution() {
        assert_eq!(find_eepmap("9300").unwrap(), Family::A9300);
        assert_eq!(find_eepmap("ar9280").unwrap(), Family::A5416);
        assert_eq!(find_eepmap("PCI:0029").unwrap(), Family::A5416);
        assert!(find_eepmap("PCI:zzzz").is_err());
        assert!(find_eepmap("unknown-chip").is_err());
    }

    #[test]
    fn test_reg_addr_must_be_aligned() {
        assert_eq!(parse_reg_addr("0x4020").unwrap(), 0x4020);
        assert!(parse_reg_addr("0x4021").is_err());
        assert!(parse_reg_addr("nothex").is_err());
    }
}

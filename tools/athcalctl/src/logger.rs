// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Minimal console logger behind the `log` facade.
//!
//! Messages go to stderr so action output on stdout stays clean for
//! redirection. The level filter follows the `-v` occurrence count.

use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => eprintln!("{} {}", "error:".red().bold(), record.args()),
            Level::Warn => eprintln!("{} {}", "warning:".yellow(), record.args()),
            Level::Info => eprintln!("{}", record.args()),
            Level::Debug | Level::Trace => eprintln!("{}", format!("{}", record.args()).dimmed()),
        }
    }

    fn flush(&self) {}
}

/// Install the logger. Verbosity: 0 keeps notices, 1 adds the action
/// stages, 2 adds everything.
pub fn init(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(filter);
    }
}

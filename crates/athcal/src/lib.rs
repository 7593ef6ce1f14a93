// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! # athcal - Atheros/Qualcomm NIC calibration-data management
//!
//! Decodes, validates and renders the per-chip calibration data wireless
//! NICs carry in EEPROM, OTP memory or file dumps, spanning the format
//! generations from the legacy .11abg parts to the .11ac ones.
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        athcalctl (CLI)                       |
//! |        action dispatch: dump / save / unpack / update        |
//! +--------------------------------------------------------------+
//! |                       loader / Session                       |
//! |   source priority blob -> EEPROM -> OTP, buffers, WP lock    |
//! +--------------------------------------------------------------+
//! |                     EEPROM map parsers                       |
//! |  5211 | 5416 | 9285 | 9287 | 9300 | 9880 | 6174 | 9888       |
//! |  bit streams, template+delta codec, checksum, renderers      |
//! +--------------------------------------------------------------+
//! |                  connectors / hw layer                       |
//! |   dump file | /dev/mem mmap | register state machines        |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`loader::Session`] | Per-invocation context threaded through everything |
//! | [`eep::EepMap`] | One calibration format parser |
//! | [`eep::Family`] | Parser selector, resolved from chip name or PCI id |
//! | [`source::Connector`] | Data-source capability set |

pub mod chip;
pub mod eep;
pub mod error;
pub mod hw;
pub mod loader;
pub mod source;

pub use error::{Error, Result};

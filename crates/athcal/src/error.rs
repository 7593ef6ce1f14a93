// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Crate-wide error type.
//!
//! Every failure surfaced to a caller carries one line of diagnostic text.
//! The kinds map 1:1 to the tool exit codes (see [`Error::exit_code`]).

use std::fmt;

/// Operation failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed user-supplied value (MAC address, register address, number).
    InvalidArgument { reason: String },
    /// The selected parser or connector does not implement the operation.
    NotSupported { what: String },
    /// No calibration data discovered at any candidate address.
    NotFound { what: String },
    /// Magic/length/checksum mismatch, corrupt block header, patch cursor
    /// out of range.
    Integrity { reason: String },
    /// Hardware poll exceeded its budget.
    IoTimeout,
    /// Read or write to the underlying source failed.
    Io { reason: String },
    /// Buffer allocation failed.
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument { reason } => write!(f, "invalid argument: {}", reason),
            Error::NotSupported { what } => write!(f, "operation not supported: {}", what),
            Error::NotFound { what } => write!(f, "no data found: {}", what),
            Error::Integrity { reason } => write!(f, "data integrity: {}", reason),
            Error::IoTimeout => write!(f, "hardware poll timed out"),
            Error::Io { reason } => write!(f, "I/O error: {}", reason),
            Error::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io {
            reason: e.to_string(),
        }
    }
}

impl Error {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn not_supported(what: impl Into<String>) -> Self {
        Error::NotSupported { what: what.into() }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    pub fn integrity(reason: impl Into<String>) -> Self {
        Error::Integrity {
            reason: reason.into(),
        }
    }

    pub fn io(reason: impl Into<String>) -> Self {
        Error::Io {
            reason: reason.into(),
        }
    }

    /// Negative exit code for the CLI, errno-flavoured like the historical
    /// tool returned from `main()`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument { .. } => -22,
            Error::NotSupported { .. } => -95,
            Error::NotFound { .. } => -2,
            Error::Integrity { .. } => -74,
            Error::IoTimeout => -110,
            Error::Io { .. } => -5,
            Error::OutOfMemory => -12,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_one_line() {
        let err = Error::integrity("bad EEPROM checksum 0x1234");
        assert_eq!(err.to_string(), "data integrity: bad EEPROM checksum 0x1234");
        assert!(!err.to_string().contains('\n'));
    }

    #[test]
    fn test_exit_codes_are_negative_and_distinct() {
        let all = [
            Error::invalid_argument("x"),
            Error::not_supported("x"),
            Error::not_found("x"),
            Error::integrity("x"),
            Error::IoTimeout,
            Error::io("x"),
            Error::OutOfMemory,
        ];
        let mut codes: Vec<i32> = all.iter().map(Error::exit_code).collect();
        assert!(codes.iter().all(|&c| c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io { .. }));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 athcal developers

//! Inert connector for autonomous actions (template export) that need a
//! session but never touch a data source.

use crate::source::Connector;

#[derive(Default)]
pub struct StubConnector;

impl Connector for StubConnector {
    fn name(&self) -> &'static str {
        "Stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_everything_unsupported() {
        let mut con = StubConnector;
        assert!(matches!(con.eep_read(0), Err(Error::NotSupported { .. })));
        assert!(matches!(con.reg_read(0), Err(Error::NotSupported { .. })));
        assert!(matches!(con.blob_size(), Err(Error::NotSupported { .. })));
        assert_eq!(con.caps(), 0);
    }
}

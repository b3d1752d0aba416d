// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! Unix sysexits-style exit codes for the binary. The application layer
//! classifies its error kinds onto these codes so scripts can distinguish
//! "wrong secret" from "disk full".

/// Process exit codes following BSD sysexits conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Successful completion
    Success = 0,
    /// Unclassified failure
    GeneralError = 1,
    /// Command line usage error (EX_USAGE)
    UsageError = 64,
    /// Input data was corrupt or failed authentication (EX_DATAERR)
    DataError = 65,
    /// An input file or directory did not exist (EX_NOINPUT)
    NoInput = 66,
    /// A required credential was missing or wrong (EX_NOPERM)
    PermissionError = 77,
    /// Configuration error (EX_CONFIG)
    ConfigError = 78,
    /// I/O failure (EX_IOERR)
    IoError = 74,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysexits_values() {
        assert_eq!(ExitCode::Success as u8, 0);
        assert_eq!(ExitCode::UsageError as u8, 64);
        assert_eq!(ExitCode::DataError as u8, 65);
        assert_eq!(ExitCode::NoInput as u8, 66);
        assert_eq!(ExitCode::IoError as u8, 74);
        assert_eq!(ExitCode::PermissionError as u8, 77);
        assert_eq!(ExitCode::ConfigError as u8, 78);
    }
}

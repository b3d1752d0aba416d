// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Argument parsing** - CLI parsing with validation
//! - **Platform abstraction** - OS-specific signals (CPU count, load,
//!   available memory) feeding the throughput predictor
//! - **Error handling** - Unix exit code mapping
//! - **Logging** - a minimal bootstrap-phase logger
//!
//! ## Architecture Position
//!
//! Bootstrap can access all layers; enterprise layers cannot access
//! bootstrap. The binary's `main` calls [`bootstrap_cli`], wires the
//! application, and maps the result to an exit code.
//!
//! ## Module Structure
//!
//! - `cli` - argument parsing and validation
//! - `platform` - OS abstraction (Unix/Windows)
//! - `exit_code` - Unix sysexits mapping
//! - `logger` - bootstrap-specific logging

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod platform;

pub use cli::{parse_and_validate, ParseError, ValidatedCli, ValidatedCommand};
pub use exit_code::ExitCode;
pub use platform::{create_platform, Platform};

/// Bootstrap and parse CLI arguments.
///
/// Handles CLI parsing with clap (which exits on `--help`/`--version`) and
/// security validation of every argument. The caller runs the application
/// logic and maps its result to an exit code.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}

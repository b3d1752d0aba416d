// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Adaptive Encryptor
//!
//! Application and infrastructure layers for the adaptive encryptor:
//!
//! - `application::use_cases` - encrypt-directory, decrypt-directory, and
//!   tune-system drivers
//! - `infrastructure::adapters` - whole-file cipher engines (CTR/GCM/CBC)
//! - `infrastructure::services` - the parallel chunked CTR engine
//! - `infrastructure::repositories` - the SQLite key vault
//! - `infrastructure::runtime` - shared worker pools and temp-file guards
//! - `infrastructure::config` - environment-backed configuration
//!
//! Domain types come from `adaptive-encryptor-domain`; entry-point concerns
//! (CLI, platform signals, exit codes) from `adaptive-encryptor-bootstrap`.

pub mod application;
pub mod infrastructure;

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Repository implementations backed by the embedded SQLite store.

pub mod schema;
pub mod sqlite_key_vault;

pub use sqlite_key_vault::SqliteKeyVault;

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key Vault Port
//!
//! Persistence interface for wrapped file keys. Implementations store one
//! record per key id and guarantee:
//!
//! - `init` is idempotent schema creation
//! - `store` upserts by id (last writer wins)
//! - `load` fails with [`EncryptorError::KeyNotFound`] for unknown ids and
//!   [`EncryptorError::VaultAuthFailure`] when the master secret cannot
//!   unwrap the record
//! - an empty master secret is rejected before any storage access
//!
//! The port is async because key storage is I/O; callers must not hold a
//! vault reference across process boundaries.

use crate::error::EncryptorError;
use crate::value_objects::cipher_mode::CipherMode;
use crate::value_objects::file_key::FileKey;
use crate::value_objects::key_id::KeyId;
use async_trait::async_trait;

/// One persisted vault row. `wrapped_key` is AES-256-CBC/PKCS7 over the raw
/// file key under a KEK derived from the master secret and `salt`.
#[derive(Debug, Clone)]
pub struct VaultRecord {
    pub id: KeyId,
    pub created_at: i64,
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
    pub wrapped_key: Vec<u8>,
    pub mode: String,
}

/// Persistence port for wrapped file keys.
#[async_trait]
pub trait KeyVault: Send + Sync {
    /// Creates the vault schema if it does not already exist.
    async fn init(&self) -> Result<(), EncryptorError>;

    /// Wraps `key` under the master secret and upserts it by `id`.
    async fn store(
        &self,
        id: &KeyId,
        key: &FileKey,
        mode: CipherMode,
        master_secret: &str,
    ) -> Result<(), EncryptorError>;

    /// Loads and unwraps the key stored under `id`, returning the raw key
    /// and the recorded mode label.
    async fn load(&self, id: &KeyId, master_secret: &str) -> Result<(FileKey, String), EncryptorError>;
}

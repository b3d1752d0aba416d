// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Key Value Object
//!
//! The 32-byte symmetric key generated once per encryption run. The raw key
//! encrypts file contents; the derived authentication key
//! `SHA256(key || "auth_key")` keys the per-chunk HMACs, so a ciphertext
//! forger would need both halves of a split secret it cannot compute.
//!
//! Key bytes are wiped from memory when the value is dropped.

use crate::error::EncryptorError;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Domain separator appended to the raw key when deriving the HMAC key.
const AUTH_KEY_CONTEXT: &[u8] = b"auth_key";

/// A 32-byte file encryption key with zeroize-on-drop semantics.
#[derive(Clone)]
pub struct FileKey {
    bytes: Zeroizing<[u8; 32]>,
}

impl FileKey {
    /// Key length in bytes (AES-256).
    pub const LEN: usize = 32;

    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    /// Wraps a key slice, rejecting anything that is not exactly 32 bytes.
    /// Unwrapped vault payloads pass through here, so a garbage unwrap under
    /// a wrong-but-unpaddable master secret is caught by length.
    pub fn from_slice(slice: &[u8]) -> Result<Self, EncryptorError> {
        if slice.len() != Self::LEN {
            return Err(EncryptorError::VaultAuthFailure(format!(
                "Unwrapped key has {} bytes, expected {}",
                slice.len(),
                Self::LEN
            )));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self::from_bytes(bytes))
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Derives the HMAC authentication key: `SHA256(key || "auth_key")`.
    pub fn auth_key(&self) -> Zeroizing<[u8; 32]> {
        let mut hasher = Sha256::new();
        hasher.update(self.bytes.as_slice());
        hasher.update(AUTH_KEY_CONTEXT);
        Zeroizing::new(hasher.finalize().into())
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey").field("bytes", &"[REDACTED]").finish()
    }
}

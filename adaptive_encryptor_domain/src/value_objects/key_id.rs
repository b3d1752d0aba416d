// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key Id Value Object
//!
//! String identity of a file key inside the vault. The format is
//! `<sha256(input_dir)[0..16]>-<mode>-<unix_seconds>`: the input-directory
//! hash ties the key to what was encrypted, the mode records the cipher
//! family, and the timestamp makes ids unique per run.
//!
//! Key ids are the vault's primary key; storing under an existing id
//! replaces the record (last writer wins).

use crate::error::EncryptorError;
use crate::value_objects::cipher_mode::CipherMode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Validated vault key identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    /// Generates the key id for an encryption run.
    ///
    /// `input_dir` is hashed in its display form so the same directory
    /// reached through the same path yields the same prefix.
    pub fn generate(input_dir: &str, mode: CipherMode, unix_seconds: u64) -> Self {
        let digest = Sha256::digest(input_dir.as_bytes());
        let prefix = hex::encode(&digest[..8]);
        Self(format!("{}-{}-{}", prefix, mode.label(), unix_seconds))
    }

    /// Wraps an existing id string, rejecting empty input.
    pub fn new(id: impl Into<String>) -> Result<Self, EncryptorError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EncryptorError::InvalidConfiguration(
                "Key id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = KeyId::generate("/data/in", CipherMode::Ctr, 1_700_000_000);
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 16);
        assert!(parts[0].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(parts[1], "ctr");
        assert_eq!(parts[2], "1700000000");
    }

    #[test]
    fn test_same_inputs_same_prefix() {
        let a = KeyId::generate("/data/in", CipherMode::Gcm, 1);
        let b = KeyId::generate("/data/in", CipherMode::Gcm, 2);
        assert_eq!(&a.as_str()[..16], &b.as_str()[..16]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(KeyId::new("  ").is_err());
        assert!(KeyId::new("abc-ctr-1").is_ok());
    }
}

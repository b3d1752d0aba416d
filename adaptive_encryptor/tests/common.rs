// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared utilities for integration and end-to-end tests.

use adaptive_encryptor::infrastructure::config::EncryptorConfig;
use std::path::Path;

/// Builds a test configuration with the vault inside `dir` and the given
/// master secret.
pub fn test_config(dir: &Path, master: &str) -> EncryptorConfig {
    EncryptorConfig {
        vault_path: dir.join("keyvault.db"),
        master_secret: Some(master.to_string()),
        chunk_override: None,
        archive_name: "encrypted_outputs.zip".to_string(),
    }
}

/// Deterministic pseudo-random content for fixtures.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 251) % 256) as u8).collect()
}

/// Calculate SHA256 checksum of data, hex-encoded.
pub fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_sha256_is_deterministic() {
        let hash = calculate_sha256(b"test data");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, calculate_sha256(b"test data"));
    }

    #[test]
    fn test_patterned_is_stable() {
        assert_eq!(patterned(8), patterned(8));
        assert_eq!(patterned(8).len(), 8);
    }
}

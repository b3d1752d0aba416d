// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Configuration
//!
//! Runtime configuration sourced from environment variables with defaults.
//! The master secret is configuration like everything else, but it is never
//! logged and never stored; absence is only an error at the moment a vault
//! operation needs it.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `ADAPTIVE_ENC_VAULT` | key store location | `keyvault.db` |
//! | `ADAPTIVE_ENC_MASTER` | master secret | required for vault ops |
//! | `ADAPTIVE_ENC_CHUNK_MB` | fixed chunk MiB for large files | per-file elastic |
//! | `ADAPTIVE_ENC_ARCHIVE` | archive filename handed to the packager | `encrypted_outputs.zip` |

use adaptive_encryptor_domain::value_objects::chunk_size::ChunkSize;
use adaptive_encryptor_domain::EncryptorError;
use std::path::PathBuf;

/// Environment variable naming the vault database file.
pub const VAULT_ENV: &str = "ADAPTIVE_ENC_VAULT";

/// Environment variable carrying the master secret.
pub const MASTER_ENV: &str = "ADAPTIVE_ENC_MASTER";

/// Environment variable fixing the chunk size in MiB.
pub const CHUNK_MB_ENV: &str = "ADAPTIVE_ENC_CHUNK_MB";

/// Environment variable naming the output archive.
pub const ARCHIVE_ENV: &str = "ADAPTIVE_ENC_ARCHIVE";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct EncryptorConfig {
    /// Location of the key vault database.
    pub vault_path: PathBuf,
    /// Master secret, if the environment provides one.
    pub master_secret: Option<String>,
    /// Fixed chunk size for large files. `None` selects per-file elastic
    /// sizing, which is the default behavior.
    pub chunk_override: Option<ChunkSize>,
    /// Archive filename the external packager is asked to produce.
    pub archive_name: String,
}

impl EncryptorConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, EncryptorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary lookup, so tests can inject
    /// values without mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EncryptorError> {
        let vault_path = lookup(VAULT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("keyvault.db"));

        let master_secret = lookup(MASTER_ENV).filter(|s| !s.is_empty());

        let chunk_override = match lookup(CHUNK_MB_ENV) {
            Some(raw) => {
                let mib: u64 = raw.parse().map_err(|_| {
                    EncryptorError::InvalidConfiguration(format!(
                        "{} must be an integer MiB count, got '{}'",
                        CHUNK_MB_ENV, raw
                    ))
                })?;
                Some(ChunkSize::from_mib(mib)?)
            }
            None => None,
        };

        let archive_name =
            lookup(ARCHIVE_ENV).unwrap_or_else(|| "encrypted_outputs.zip".to_string());

        Ok(Self {
            vault_path,
            master_secret,
            chunk_override,
            archive_name,
        })
    }

    /// Returns the master secret or fails with `MissingMasterSecret`.
    pub fn master_secret(&self) -> Result<&str, EncryptorError> {
        self.master_secret
            .as_deref()
            .ok_or(EncryptorError::MissingMasterSecret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        let config = EncryptorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.vault_path, PathBuf::from("keyvault.db"));
        assert_eq!(config.archive_name, "encrypted_outputs.zip");
        assert!(config.chunk_override.is_none());
        assert!(matches!(
            config.master_secret(),
            Err(EncryptorError::MissingMasterSecret)
        ));
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = EncryptorConfig::from_lookup(|key| match key {
            VAULT_ENV => Some("/var/lib/enc/keys.db".into()),
            MASTER_ENV => Some("hunter2".into()),
            CHUNK_MB_ENV => Some("16".into()),
            ARCHIVE_ENV => Some("backup.zip".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.vault_path, PathBuf::from("/var/lib/enc/keys.db"));
        assert_eq!(config.master_secret().unwrap(), "hunter2");
        assert_eq!(config.chunk_override.unwrap().bytes(), 16 * 1024 * 1024);
        assert_eq!(config.archive_name, "backup.zip");
    }

    #[test]
    fn test_empty_master_treated_as_missing() {
        let config = EncryptorConfig::from_lookup(|key| match key {
            MASTER_ENV => Some(String::new()),
            _ => None,
        })
        .unwrap();
        assert!(config.master_secret().is_err());
    }

    #[test]
    fn test_bad_chunk_mb_rejected() {
        let result = EncryptorConfig::from_lookup(|key| match key {
            CHUNK_MB_ENV => Some("eight".into()),
            _ => None,
        });
        assert!(matches!(
            result,
            Err(EncryptorError::InvalidConfiguration(_))
        ));
    }
}

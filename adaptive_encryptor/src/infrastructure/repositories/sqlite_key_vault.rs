// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Key Vault
//!
//! Persists file keys wrapped under a master-secret-derived KEK in a
//! single-file embedded SQLite database.
//!
//! ## Wrapping Scheme
//!
//! ```text
//! KEK         = PBKDF2-HMAC-SHA256(master_secret, salt, 200_000 iters, 32 bytes)
//! wrapped_key = AES-256-CBC-PKCS7(KEK, iv, file_key)
//! ```
//!
//! `salt` and `iv` are 16 fresh random bytes per record. The iteration
//! count is a format constant: changing it breaks every existing vault.
//!
//! ## Failure Semantics
//!
//! - empty master secret: rejected before touching storage
//! - unknown id on load: `KeyNotFound`
//! - wrong master secret: the CBC unpadding (or the 32-byte length check on
//!   the unwrapped payload) fails and surfaces as `VaultAuthFailure`
//!
//! Store is an upsert by id; concurrent writers wait up to the connection's
//! 10 second busy timeout for the file lock, then fail loudly.

use adaptive_encryptor_domain::repositories::key_vault::{KeyVault, VaultRecord};
use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::EncryptorError;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use async_trait::async_trait;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use zeroize::Zeroizing;

use crate::infrastructure::repositories::schema;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// PBKDF2 iteration count. Format constant - changing it is a format break.
const KEK_ITERATIONS: u32 = 200_000;

/// Salt and IV length in bytes.
const SALT_LEN: usize = 16;
const IV_LEN: usize = 16;

/// SQLite-backed implementation of the [`KeyVault`] port.
pub struct SqliteKeyVault {
    pool: SqlitePool,
    rng: SystemRandom,
}

impl SqliteKeyVault {
    /// Opens (creating if missing) the vault at `path` and applies the
    /// schema.
    pub async fn open(path: &Path) -> Result<Self, EncryptorError> {
        let pool = schema::initialize_database(path)
            .await
            .map_err(|e| EncryptorError::VaultError(format!("Failed to open vault: {}", e)))?;
        Ok(Self {
            pool,
            rng: SystemRandom::new(),
        })
    }

    /// Derives the key-encryption key from the master secret and salt.
    fn derive_kek(master_secret: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, EncryptorError> {
        let iterations = NonZeroU32::new(KEK_ITERATIONS)
            .ok_or_else(|| EncryptorError::internal_error("Invalid KEK iteration count"))?;
        let mut kek = Zeroizing::new([0u8; 32]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            salt,
            master_secret.as_bytes(),
            kek.as_mut(),
        );
        Ok(kek)
    }

    fn wrap_key(kek: &[u8; 32], iv: &[u8], raw_key: &[u8]) -> Result<Vec<u8>, EncryptorError> {
        let cipher = Aes256CbcEnc::new_from_slices(kek, iv)
            .map_err(|e| EncryptorError::EncryptionError(format!("CBC init failed: {}", e)))?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(raw_key))
    }

    fn unwrap_key(kek: &[u8; 32], iv: &[u8], wrapped: &[u8]) -> Result<FileKey, EncryptorError> {
        let cipher = Aes256CbcDec::new_from_slices(kek, iv)
            .map_err(|e| EncryptorError::EncryptionError(format!("CBC init failed: {}", e)))?;
        let raw = Zeroizing::new(cipher.decrypt_padded_vec_mut::<Pkcs7>(wrapped).map_err(|_| {
            EncryptorError::VaultAuthFailure(
                "Key unwrap failed - wrong master secret or corrupted record".to_string(),
            )
        })?);
        FileKey::from_slice(&raw)
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], EncryptorError> {
        let mut bytes = [0u8; N];
        self.rng
            .fill(&mut bytes)
            .map_err(|e| EncryptorError::EncryptionError(format!("RNG failure: {:?}", e)))?;
        Ok(bytes)
    }
}

#[async_trait]
impl KeyVault for SqliteKeyVault {
    async fn init(&self) -> Result<(), EncryptorError> {
        schema::ensure_schema(&self.pool)
            .await
            .map_err(|e| EncryptorError::VaultError(format!("Schema creation failed: {}", e)))
    }

    async fn store(
        &self,
        id: &KeyId,
        key: &FileKey,
        mode: CipherMode,
        master_secret: &str,
    ) -> Result<(), EncryptorError> {
        if master_secret.is_empty() {
            return Err(EncryptorError::MissingMasterSecret);
        }

        let salt = self.random_bytes::<SALT_LEN>()?;
        let iv = self.random_bytes::<IV_LEN>()?;
        let kek = Self::derive_kek(master_secret, &salt)?;

        let record = VaultRecord {
            id: id.clone(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(EncryptorError::internal_error)?
                .as_secs() as i64,
            salt: salt.to_vec(),
            iv: iv.to_vec(),
            wrapped_key: Self::wrap_key(&kek, &iv, key.as_bytes())?,
            mode: mode.label().to_string(),
        };

        sqlx::query(
            "INSERT OR REPLACE INTO keys(id, created_at, salt, iv, wrapped_key, mode) \
             VALUES(?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.as_str())
        .bind(record.created_at)
        .bind(&record.salt[..])
        .bind(&record.iv[..])
        .bind(&record.wrapped_key[..])
        .bind(record.mode.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| EncryptorError::VaultError(format!("Store failed: {}", e)))?;

        debug!(key_id = %id, "Stored wrapped file key");
        Ok(())
    }

    async fn load(&self, id: &KeyId, master_secret: &str) -> Result<(FileKey, String), EncryptorError> {
        if master_secret.is_empty() {
            return Err(EncryptorError::MissingMasterSecret);
        }

        let row = sqlx::query("SELECT created_at, salt, iv, wrapped_key, mode FROM keys WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EncryptorError::VaultError(format!("Load failed: {}", e)))?
            .ok_or_else(|| EncryptorError::KeyNotFound(id.to_string()))?;

        let record = VaultRecord {
            id: id.clone(),
            created_at: row.get("created_at"),
            salt: row.get("salt"),
            iv: row.get("iv"),
            wrapped_key: row.get("wrapped_key"),
            mode: row.get("mode"),
        };

        let kek = Self::derive_kek(master_secret, &record.salt)?;
        let key = Self::unwrap_key(&kek, &record.iv, &record.wrapped_key)?;
        Ok((key, record.mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_vault() -> (tempfile::TempDir, SqliteKeyVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = SqliteKeyVault::open(&dir.path().join("keyvault.db")).await.unwrap();
        (dir, vault)
    }

    fn key_id(name: &str) -> KeyId {
        KeyId::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_store_load_round_trip() {
        let (_dir, vault) = open_vault().await;
        let key = FileKey::from_bytes([42u8; 32]);

        vault.store(&key_id("k1"), &key, CipherMode::Ctr, "pw").await.unwrap();
        let (loaded, mode) = vault.load(&key_id("k1"), "pw").await.unwrap();

        assert_eq!(loaded.as_bytes(), key.as_bytes());
        assert_eq!(mode, "ctr");
    }

    #[tokio::test]
    async fn test_wrong_master_is_auth_failure() {
        let (_dir, vault) = open_vault().await;
        let key = FileKey::from_bytes([1u8; 32]);
        vault.store(&key_id("k1"), &key, CipherMode::Gcm, "a").await.unwrap();

        let result = vault.load(&key_id("k1"), "b").await;
        assert!(matches!(result, Err(EncryptorError::VaultAuthFailure(_))));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (_dir, vault) = open_vault().await;
        let result = vault.load(&key_id("missing"), "pw").await;
        assert!(matches!(result, Err(EncryptorError::KeyNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_master_rejected() {
        let (_dir, vault) = open_vault().await;
        let key = FileKey::from_bytes([7u8; 32]);

        let store = vault.store(&key_id("k1"), &key, CipherMode::Ctr, "").await;
        assert!(matches!(store, Err(EncryptorError::MissingMasterSecret)));

        let load = vault.load(&key_id("k1"), "").await;
        assert!(matches!(load, Err(EncryptorError::MissingMasterSecret)));
    }

    #[tokio::test]
    async fn test_store_upserts_by_id() {
        let (_dir, vault) = open_vault().await;
        let first = FileKey::from_bytes([1u8; 32]);
        let second = FileKey::from_bytes([2u8; 32]);

        vault.store(&key_id("k1"), &first, CipherMode::Ctr, "pw").await.unwrap();
        vault.store(&key_id("k1"), &second, CipherMode::Cbc, "pw").await.unwrap();

        let (loaded, mode) = vault.load(&key_id("k1"), "pw").await.unwrap();
        assert_eq!(loaded.as_bytes(), second.as_bytes());
        assert_eq!(mode, "cbc");
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let (_dir, vault) = open_vault().await;
        vault.init().await.unwrap();
        vault.init().await.unwrap();
    }
}

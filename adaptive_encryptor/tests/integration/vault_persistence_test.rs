// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Vault Persistence Tests
//!
//! The vault is a single-file database: records written by one process
//! lifetime must be readable by the next.

use adaptive_encryptor::infrastructure::repositories::sqlite_key_vault::SqliteKeyVault;
use adaptive_encryptor_domain::repositories::key_vault::KeyVault;
use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::EncryptorError;

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("keyvault.db");
    let key_id = KeyId::new("persist-ctr-1").unwrap();
    let key = FileKey::from_bytes([0x5Au8; 32]);

    {
        let vault = SqliteKeyVault::open(&db_path).await.unwrap();
        vault.store(&key_id, &key, CipherMode::Ctr, "pw").await.unwrap();
    }

    let reopened = SqliteKeyVault::open(&db_path).await.unwrap();
    let (loaded, mode) = reopened.load(&key_id, "pw").await.unwrap();
    assert_eq!(loaded.as_bytes(), key.as_bytes());
    assert_eq!(mode, "ctr");
}

#[tokio::test]
async fn test_distinct_ids_keep_distinct_keys() {
    let dir = tempfile::tempdir().unwrap();
    let vault = SqliteKeyVault::open(&dir.path().join("keyvault.db")).await.unwrap();

    let first = FileKey::from_bytes([1u8; 32]);
    let second = FileKey::from_bytes([2u8; 32]);
    let id_a = KeyId::generate("/run/a", CipherMode::Ctr, 100);
    let id_b = KeyId::generate("/run/b", CipherMode::Gcm, 100);

    vault.store(&id_a, &first, CipherMode::Ctr, "pw").await.unwrap();
    vault.store(&id_b, &second, CipherMode::Gcm, "pw").await.unwrap();

    assert_eq!(vault.load(&id_a, "pw").await.unwrap().0.as_bytes(), first.as_bytes());
    assert_eq!(vault.load(&id_b, "pw").await.unwrap().0.as_bytes(), second.as_bytes());
}

#[tokio::test]
async fn test_wrong_master_after_reopen_is_auth_failure() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("keyvault.db");
    let key_id = KeyId::new("persist-gcm-1").unwrap();

    {
        let vault = SqliteKeyVault::open(&db_path).await.unwrap();
        vault
            .store(&key_id, &FileKey::from_bytes([3u8; 32]), CipherMode::Gcm, "correct")
            .await
            .unwrap();
    }

    let reopened = SqliteKeyVault::open(&db_path).await.unwrap();
    let result = reopened.load(&key_id, "incorrect").await;
    assert!(matches!(result, Err(EncryptorError::VaultAuthFailure(_))));
}

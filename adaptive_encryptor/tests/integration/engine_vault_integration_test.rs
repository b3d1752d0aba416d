// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine + Vault Integration Tests
//!
//! The full large-file key lifecycle: generate, wrap into the vault,
//! encrypt, then unwrap from the vault and decrypt with the loaded key.

use adaptive_encryptor::infrastructure::repositories::sqlite_key_vault::SqliteKeyVault;
use adaptive_encryptor::infrastructure::services::chunked_engine::ChunkedCtrEngine;
use adaptive_encryptor_domain::repositories::key_vault::KeyVault;
use adaptive_encryptor_domain::value_objects::chunk_size::ChunkSize;
use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::value_objects::manifest::{self, FileManifest};

use crate::common::patterned;

#[tokio::test]
async fn test_chunked_file_decrypts_with_vault_loaded_key() {
    let dir = tempfile::tempdir().unwrap();
    let vault = SqliteKeyVault::open(&dir.path().join("keyvault.db")).await.unwrap();

    let data = patterned(300_000);
    let src = dir.path().join("video.mp4");
    std::fs::write(&src, &data).unwrap();
    let enc = dir.path().join("video.mp4.enc");

    let key = FileKey::from_bytes([0x42u8; 32]);
    let key_id = KeyId::generate("/in", CipherMode::Ctr, 7);
    vault.store(&key_id, &key, CipherMode::Ctr, "pw").await.unwrap();

    let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    ChunkedCtrEngine::new()
        .encrypt_file(&src, &enc, &key, &key_id, ChunkSize::new(65_536).unwrap(), &pool)
        .unwrap();

    // A later process has only the ciphertext, the manifest, and the master
    // secret.
    let sidecar = manifest::sidecar_path(&enc);
    let parsed = FileManifest::from_json(&std::fs::read_to_string(&sidecar).unwrap()).unwrap();
    let (loaded_key, _mode) = vault.load(&parsed.key_id, "pw").await.unwrap();

    let out = dir.path().join("video.restored.mp4");
    ChunkedCtrEngine::new()
        .decrypt_file(&enc, &out, &loaded_key, &parsed, &pool)
        .unwrap();

    assert_eq!(std::fs::read(&out).unwrap(), data);
}

#[tokio::test]
async fn test_manifest_key_id_matches_vault_record() {
    let dir = tempfile::tempdir().unwrap();
    let vault = SqliteKeyVault::open(&dir.path().join("keyvault.db")).await.unwrap();

    let src = dir.path().join("doc.bin");
    std::fs::write(&src, patterned(10_000)).unwrap();
    let enc = dir.path().join("doc.bin.enc");

    let key = FileKey::from_bytes([0x17u8; 32]);
    let key_id = KeyId::generate("/somewhere", CipherMode::Ctr, 99);
    vault.store(&key_id, &key, CipherMode::Ctr, "pw").await.unwrap();

    let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
    let written = ChunkedCtrEngine::new()
        .encrypt_file(&src, &enc, &key, &key_id, ChunkSize::new(4_096).unwrap(), &pool)
        .unwrap();

    assert_eq!(written.key_id, key_id);
    assert!(vault.load(&written.key_id, "pw").await.is_ok());
}

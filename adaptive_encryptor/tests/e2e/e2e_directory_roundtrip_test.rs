// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # End-to-End Directory Round-Trip Tests
//!
//! Full-stack runs through the encrypt and decrypt use cases: mixed small
//! and large trees, whole-file and chunked dispatch, per-file failure
//! isolation, and wrong-master behavior.

use adaptive_encryptor::application::use_cases::{
    DecryptDirectoryUseCase, DecryptParams, EncryptDirectoryUseCase, EncryptParams,
};
use adaptive_encryptor::infrastructure::repositories::sqlite_key_vault::SqliteKeyVault;
use adaptive_encryptor::infrastructure::runtime::worker_pools::WorkerPools;
use adaptive_encryptor_domain::repositories::key_vault::KeyVault;
use adaptive_encryptor_domain::services::scheduler::{Scheduler, SchedulingPolicy};
use adaptive_encryptor_domain::services::throughput_predictor::SystemProfile;
use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::value_objects::manifest::FileManifest;
use adaptive_encryptor_domain::value_objects::worker_count::WorkerCount;
use adaptive_encryptor_domain::EncryptorError;
use std::path::Path;

use crate::common::{calculate_sha256, patterned, test_config};

const BIG_FILE_LEN: usize = 17 * 1024 * 1024 + 333;

struct Fixture {
    root: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn dir(&self, name: &str) -> std::path::PathBuf {
        let path = self.root.path().join(name);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    fn write(&self, rel: &str, contents: &[u8]) {
        let path = self.root.path().join("in").join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

async fn encrypt(
    fixture: &Fixture,
    mode: CipherMode,
    master: &str,
) -> adaptive_encryptor::application::use_cases::RunSummary {
    let config = test_config(fixture.root.path(), master);
    let scheduler = Scheduler::new(SystemProfile::default());
    let pools = WorkerPools::new(WorkerCount::new(2));
    let vault = SqliteKeyVault::open(&config.vault_path).await.unwrap();

    let params = EncryptParams {
        input: fixture.root.path().join("in"),
        output: fixture.root.path().join("out"),
        mode,
        policy: SchedulingPolicy::Priority,
        chunk_override: None,
    };
    EncryptDirectoryUseCase::new()
        .execute(&params, &config, &scheduler, &pools, &vault)
        .await
        .unwrap()
}

async fn decrypt(
    fixture: &Fixture,
    master: &str,
) -> Result<adaptive_encryptor::application::use_cases::RunSummary, EncryptorError> {
    let config = test_config(fixture.root.path(), master);
    let pools = WorkerPools::new(WorkerCount::new(2));
    let vault = SqliteKeyVault::open(&config.vault_path).await.unwrap();

    let params = DecryptParams {
        input: fixture.root.path().join("out"),
        output: fixture.root.path().join("restored"),
    };
    DecryptDirectoryUseCase::new()
        .execute(&params, &config, &pools, &vault)
        .await
}

fn read_manifest(path: &Path) -> FileManifest {
    FileManifest::from_json(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// A vault whose storage is broken: every store fails, nothing is persisted.
struct FailingVault;

#[async_trait::async_trait]
impl KeyVault for FailingVault {
    async fn init(&self) -> Result<(), EncryptorError> {
        Ok(())
    }

    async fn store(
        &self,
        _id: &KeyId,
        _key: &FileKey,
        _mode: CipherMode,
        _master_secret: &str,
    ) -> Result<(), EncryptorError> {
        Err(EncryptorError::VaultError("database is locked".to_string()))
    }

    async fn load(&self, id: &KeyId, _master_secret: &str) -> Result<(FileKey, String), EncryptorError> {
        Err(EncryptorError::KeyNotFound(id.to_string()))
    }
}

#[tokio::test]
async fn test_mixed_tree_round_trips_through_both_engines() {
    let fixture = Fixture::new();
    fixture.dir("in");
    let big = patterned(BIG_FILE_LEN);
    fixture.write("notes.txt", b"five!");
    fixture.write("sub/archive.bin", &patterned(300_000));
    fixture.write("big.bin", &big);

    let summary = encrypt(&fixture, CipherMode::Ctr, "pw").await;
    assert_eq!(summary.processed, 3);
    assert!(summary.failed.is_empty());

    let out = fixture.root.path().join("out");

    // The large file went through the chunked engine.
    let big_enc = std::fs::read(out.join("big.bin.enc")).unwrap();
    assert_eq!(&big_enc[..5], b"CTRCH");
    let big_manifest = read_manifest(&out.join("big.bin.enc.meta.json"));
    assert_eq!(big_manifest.mode, CipherMode::CtrChunked);
    assert_eq!(
        big_manifest.chunk_hmacs.as_ref().unwrap().len() as u64,
        big_manifest.chunk_count.unwrap()
    );

    // Small files went through the whole-file engine.
    let small_enc = std::fs::read(out.join("notes.txt.enc")).unwrap();
    assert_eq!(&small_enc[..3], b"CTR");
    assert_eq!(
        read_manifest(&out.join("notes.txt.enc.meta.json")).chunked,
        Some(false)
    );

    let restored = fixture.root.path().join("restored");
    let summary = decrypt(&fixture, "pw").await.unwrap();
    assert_eq!(summary.processed, 3);
    assert!(summary.failed.is_empty());

    assert_eq!(std::fs::read(restored.join("notes.txt")).unwrap(), b"five!");
    assert_eq!(
        calculate_sha256(&std::fs::read(restored.join("sub/archive.bin")).unwrap()),
        calculate_sha256(&patterned(300_000))
    );
    assert_eq!(
        calculate_sha256(&std::fs::read(restored.join("big.bin")).unwrap()),
        calculate_sha256(&big)
    );
}

#[tokio::test]
async fn test_gcm_batch_round_trips() {
    let fixture = Fixture::new();
    fixture.dir("in");
    fixture.write("a.txt", b"alpha");
    fixture.write("b.txt", b"beta");
    fixture.write("c.txt", b"gamma");

    let summary = encrypt(&fixture, CipherMode::Gcm, "pw").await;
    assert_eq!(summary.processed, 3);

    let summary = decrypt(&fixture, "pw").await.unwrap();
    assert_eq!(summary.processed, 3);

    let restored = fixture.root.path().join("restored");
    assert_eq!(std::fs::read(restored.join("a.txt")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(restored.join("b.txt")).unwrap(), b"beta");
    assert_eq!(std::fs::read(restored.join("c.txt")).unwrap(), b"gamma");
}

#[tokio::test]
async fn test_corrupted_ciphertext_is_isolated() {
    let fixture = Fixture::new();
    fixture.dir("in");
    fixture.write("good.txt", b"untouched");
    fixture.write("bad.txt", b"to be mangled");

    encrypt(&fixture, CipherMode::Gcm, "pw").await;

    // Flip one ciphertext byte of bad.txt.enc.
    let bad_enc = fixture.root.path().join("out/bad.txt.enc");
    let mut bytes = std::fs::read(&bad_enc).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    std::fs::write(&bad_enc, bytes).unwrap();

    let summary = decrypt(&fixture, "pw").await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed.len(), 1);
    assert!(matches!(
        summary.failed[0].1,
        EncryptorError::IntegrityFailure(_)
    ));

    let restored = fixture.root.path().join("restored");
    assert_eq!(std::fs::read(restored.join("good.txt")).unwrap(), b"untouched");
    assert!(!restored.join("bad.txt").exists());
}

#[tokio::test]
async fn test_wrong_master_fails_every_file() {
    let fixture = Fixture::new();
    fixture.dir("in");
    fixture.write("a.txt", b"alpha");
    fixture.write("b.txt", b"beta");

    encrypt(&fixture, CipherMode::Ctr, "correct-horse").await;

    let summary = decrypt(&fixture, "battery-staple").await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.failed.len(), 2);
    for (_, error) in &summary.failed {
        assert!(matches!(error, EncryptorError::VaultAuthFailure(_)));
    }
    assert!(!fixture.root.path().join("restored/a.txt").exists());
}

#[tokio::test]
async fn test_missing_manifest_is_isolated() {
    let fixture = Fixture::new();
    fixture.dir("in");
    fixture.write("kept.txt", b"kept");
    fixture.write("orphan.txt", b"orphan");

    encrypt(&fixture, CipherMode::Cbc, "pw").await;
    std::fs::remove_file(fixture.root.path().join("out/orphan.txt.enc.meta.json")).unwrap();

    let summary = decrypt(&fixture, "pw").await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed.len(), 1);
    assert!(matches!(
        summary.failed[0].1,
        EncryptorError::ManifestMissing(_)
    ));
    assert_eq!(
        std::fs::read(fixture.root.path().join("restored/kept.txt")).unwrap(),
        b"kept"
    );
}

#[tokio::test]
async fn test_ciphertext_survives_vault_store_failure() {
    let fixture = Fixture::new();
    fixture.dir("in");
    fixture.write("a.txt", b"alpha");
    fixture.write("b.txt", b"beta");

    let config = test_config(fixture.root.path(), "pw");
    let scheduler = Scheduler::new(SystemProfile::default());
    let pools = WorkerPools::new(WorkerCount::new(2));

    let params = EncryptParams {
        input: fixture.root.path().join("in"),
        output: fixture.root.path().join("out"),
        mode: CipherMode::Ctr,
        policy: SchedulingPolicy::Priority,
        chunk_override: None,
    };
    let summary = EncryptDirectoryUseCase::new()
        .execute(&params, &config, &scheduler, &pools, &FailingVault)
        .await
        .unwrap();

    // Every file encrypted; every key wrap failed; nothing was deleted.
    assert_eq!(summary.processed, 2);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.vault_failures.len(), 2);
    for (_, error) in &summary.vault_failures {
        assert!(matches!(error, EncryptorError::VaultError(_)));
    }

    let out = fixture.root.path().join("out");
    assert!(out.join("a.txt.enc").exists());
    assert!(out.join("a.txt.enc.meta.json").exists());
    assert!(out.join("b.txt.enc").exists());
    assert!(out.join("b.txt.enc.meta.json").exists());
}

#[tokio::test]
async fn test_empty_input_directory_is_missing_inputs() {
    let fixture = Fixture::new();
    fixture.dir("in");

    let config = test_config(fixture.root.path(), "pw");
    let scheduler = Scheduler::new(SystemProfile::default());
    let pools = WorkerPools::new(WorkerCount::new(2));
    let vault = SqliteKeyVault::open(&config.vault_path).await.unwrap();

    let params = EncryptParams {
        input: fixture.root.path().join("in"),
        output: fixture.root.path().join("out"),
        mode: CipherMode::Ctr,
        policy: SchedulingPolicy::Priority,
        chunk_override: None,
    };
    let result = EncryptDirectoryUseCase::new()
        .execute(&params, &config, &scheduler, &pools, &vault)
        .await;
    assert!(matches!(result, Err(EncryptorError::MissingInputs(_))));
}

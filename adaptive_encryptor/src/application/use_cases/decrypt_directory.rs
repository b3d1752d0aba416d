// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Decrypt Directory Use Case
//!
//! The decryption driver: discovers `*.enc` files, reads each sidecar
//! manifest to pick the chunked or whole-file path, loads the wrapped file
//! key from the vault (once per key id), and restores plaintext under the
//! output directory. Small whole-file outputs decrypt on a
//! 4x-oversubscribed I/O pool; chunked outputs and large whole-file
//! outputs share the process-wide worker pool.
//!
//! Failures are isolated per file - a missing manifest or a tampered chunk
//! skips that file and the batch continues.

use adaptive_encryptor_domain::repositories::key_vault::KeyVault;
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::value_objects::manifest::{self, FileManifest};
use adaptive_encryptor_domain::EncryptorError;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::use_cases::encrypt_directory::{RunSummary, HEAVY_THRESHOLD};
use crate::infrastructure::adapters::whole_file::WholeFileCipher;
use crate::infrastructure::config::EncryptorConfig;
use crate::infrastructure::runtime::worker_pools::WorkerPools;
use crate::infrastructure::services::chunked_engine::ChunkedCtrEngine;

/// Parameters of one decryption run.
#[derive(Debug, Clone)]
pub struct DecryptParams {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// One decryptable ciphertext with everything needed to restore it.
struct DecryptJob {
    enc: PathBuf,
    out: PathBuf,
    key: FileKey,
    file_manifest: FileManifest,
}

/// Driver for decrypting a directory of `.enc` files.
pub struct DecryptDirectoryUseCase {
    engine: Arc<ChunkedCtrEngine>,
    whole: Arc<WholeFileCipher>,
}

impl Default for DecryptDirectoryUseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl DecryptDirectoryUseCase {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(ChunkedCtrEngine::new()),
            whole: Arc::new(WholeFileCipher::new()),
        }
    }

    /// Executes one decryption run.
    pub async fn execute(
        &self,
        params: &DecryptParams,
        config: &EncryptorConfig,
        pools: &WorkerPools,
        vault: &dyn KeyVault,
    ) -> Result<RunSummary, EncryptorError> {
        let run_start = Instant::now();
        let master_secret = config.master_secret()?.to_string();

        let ciphertexts = discover_ciphertexts(&params.input)?;
        if ciphertexts.is_empty() {
            return Err(EncryptorError::MissingInputs(format!(
                "No .enc files under {}",
                params.input.display()
            )));
        }
        info!(files = ciphertexts.len(), "Decryption run planned");

        let mut failed: Vec<(PathBuf, EncryptorError)> = Vec::new();
        let mut chunked_jobs: Vec<DecryptJob> = Vec::new();
        let mut whole_jobs: Vec<DecryptJob> = Vec::new();
        let mut key_cache: HashMap<String, FileKey> = HashMap::new();

        for enc in ciphertexts {
            match self
                .prepare_job(&enc, params, &master_secret, vault, &mut key_cache)
                .await
            {
                Ok(job) => {
                    if job.file_manifest.mode.is_chunked() {
                        chunked_jobs.push(job);
                    } else {
                        whole_jobs.push(job);
                    }
                }
                Err(e) => {
                    warn!(path = %enc.display(), error = %e, "Skipping undecryptable file");
                    failed.push((enc, e));
                }
            }
        }

        let mut processed = 0usize;

        // Large whole-file ciphertexts share the process pool with the
        // chunked engine; small ones are I/O-bound and get the
        // oversubscribed batch pool.
        let (large_whole, small_whole): (Vec<DecryptJob>, Vec<DecryptJob>) =
            whole_jobs.into_iter().partition(|job| {
                std::fs::metadata(&job.enc).map(|m| m.len()).unwrap_or(0) >= HEAVY_THRESHOLD
            });

        if !small_whole.is_empty() {
            let io_pool = pools.io_batch_pool()?;
            let whole = self.whole.clone();
            let outcomes: Vec<(PathBuf, Result<(), EncryptorError>)> = io_pool.install(|| {
                small_whole
                    .par_iter()
                    .map(|job| {
                        let result = ensure_parent(&job.out)
                            .and_then(|_| whole.decrypt(&job.enc, &job.out, &job.key));
                        (job.enc.clone(), result)
                    })
                    .collect()
            });
            for (path, result) in outcomes {
                match result {
                    Ok(()) => processed += 1,
                    Err(e) => failed.push((path, e)),
                }
            }
        }

        if !large_whole.is_empty() {
            let shared_pool = pools.shared_pool()?;
            for job in large_whole {
                ensure_parent(&job.out)?;
                let whole = self.whole.clone();
                let pool = shared_pool.clone();
                let enc = job.enc.clone();

                let result = tokio::task::spawn_blocking(move || {
                    pool.install(|| whole.decrypt(&job.enc, &job.out, &job.key))
                })
                .await
                .map_err(|e| EncryptorError::PoolError(format!("Decrypt task join failure: {}", e)))?;

                match result {
                    Ok(()) => processed += 1,
                    Err(e) => {
                        warn!(path = %enc.display(), error = %e, "Whole-file decryption failed");
                        failed.push((enc, e));
                    }
                }
            }
        }

        // Chunked ciphertexts: each decrypt fans out over the shared pool.
        if !chunked_jobs.is_empty() {
            let shared_pool = pools.shared_pool()?;
            for job in chunked_jobs {
                ensure_parent(&job.out)?;
                let engine = self.engine.clone();
                let pool = shared_pool.clone();
                let enc = job.enc.clone();

                let result = tokio::task::spawn_blocking(move || {
                    engine.decrypt_file(&job.enc, &job.out, &job.key, &job.file_manifest, &pool)
                })
                .await
                .map_err(|e| EncryptorError::PoolError(format!("Engine task join failure: {}", e)))?;

                match result {
                    Ok(()) => processed += 1,
                    Err(e) => {
                        warn!(path = %enc.display(), error = %e, "Chunked decryption failed");
                        failed.push((enc, e));
                    }
                }
            }
        }

        let summary = RunSummary {
            processed,
            failed,
            vault_failures: Vec::new(),
            elapsed: run_start.elapsed(),
            archive_path: params.output.clone(),
        };
        info!(
            processed = summary.processed,
            failed = summary.failed.len(),
            "Decryption run complete"
        );
        Ok(summary)
    }

    /// Reads the sidecar, loads the key (cached per key id), and resolves
    /// the restore path.
    async fn prepare_job(
        &self,
        enc: &Path,
        params: &DecryptParams,
        master_secret: &str,
        vault: &dyn KeyVault,
        key_cache: &mut HashMap<String, FileKey>,
    ) -> Result<DecryptJob, EncryptorError> {
        let sidecar = manifest::sidecar_path(enc);
        if !sidecar.exists() {
            return Err(EncryptorError::ManifestMissing(sidecar.display().to_string()));
        }
        let json = std::fs::read_to_string(&sidecar).map_err(EncryptorError::io_error)?;
        let file_manifest = FileManifest::from_json(&json)?;

        let key_id: KeyId = file_manifest.key_id.clone();
        let key = match key_cache.get(key_id.as_str()) {
            Some(key) => key.clone(),
            None => {
                let (key, _mode) = vault.load(&key_id, master_secret).await?;
                key_cache.insert(key_id.as_str().to_string(), key.clone());
                key
            }
        };

        Ok(DecryptJob {
            enc: enc.to_path_buf(),
            out: restore_path(&params.input, &params.output, enc, &file_manifest)?,
            key,
            file_manifest,
        })
    }
}

/// Recursively finds `.enc` files under the input directory.
fn discover_ciphertexts(input: &Path) -> Result<Vec<PathBuf>, EncryptorError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(input) {
        let entry = entry.map_err(|e| EncryptorError::MissingInputs(e.to_string()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "enc")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Restore path: the input-relative parent under the output root, with the
/// manifest's recorded source name when present, otherwise the ciphertext
/// name without its `.enc` suffix.
fn restore_path(
    input: &Path,
    output: &Path,
    enc: &Path,
    file_manifest: &FileManifest,
) -> Result<PathBuf, EncryptorError> {
    let rel = enc
        .strip_prefix(input)
        .map_err(|_| EncryptorError::internal_error("Discovered file escaped the input root"))?;

    let name: PathBuf = match &file_manifest.src {
        Some(src) if !src.is_empty() => PathBuf::from(src),
        _ => PathBuf::from(rel.file_stem().unwrap_or(rel.as_os_str())),
    };

    Ok(match rel.parent() {
        Some(parent) => output.join(parent).join(name),
        None => output.join(name),
    })
}

fn ensure_parent(path: &Path) -> Result<(), EncryptorError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(EncryptorError::io_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;

    fn whole_manifest(src: Option<&str>) -> FileManifest {
        let mut m = FileManifest::whole(
            CipherMode::Ctr,
            "00".into(),
            KeyId::new("k-ctr-1").unwrap(),
            src.unwrap_or_default().to_string(),
        );
        if src.is_none() {
            m.src = None;
        }
        m
    }

    #[test]
    fn test_restore_path_uses_manifest_src() {
        let out = restore_path(
            Path::new("/in"),
            Path::new("/out"),
            Path::new("/in/sub/report.pdf.enc"),
            &whole_manifest(Some("report.pdf")),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/out/sub/report.pdf"));
    }

    #[test]
    fn test_restore_path_strips_enc_without_src() {
        let out = restore_path(
            Path::new("/in"),
            Path::new("/out"),
            Path::new("/in/data.bin.enc"),
            &whole_manifest(None),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/out/data.bin"));
    }

    #[test]
    fn test_discover_only_enc_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin.enc"), b"x").unwrap();
        std::fs::write(dir.path().join("a.bin.enc.meta.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("plain.txt"), b"x").unwrap();

        let found = discover_ciphertexts(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.bin.enc"));
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Encrypt Directory Use Case
//!
//! The per-run encryption driver:
//!
//! 1. enumerate files under the input directory
//! 2. ask the scheduler for a priority-ordered plan (or take input order
//!    under the `fifo` policy)
//! 3. generate the run's file key and key id
//! 4. partition: files of 16 MiB and above under CTR go to the chunked
//!    engine with per-file elastic chunk sizing; everything else goes to the
//!    whole-file engine
//! 5. small files run inline when there is exactly one (pool setup costs
//!    more than the work), otherwise on a 4x-oversubscribed I/O pool;
//!    large files share the process-wide worker pool
//! 6. as each file's ciphertext commits, the wrapped key is upserted into
//!    the vault; measured durations feed back into the scheduler
//!
//! A single file's failure is logged and isolated; the batch continues and
//! the summary names every casualty. A key wrap that fails *after* a
//! successful ciphertext write is not fatal either: the ciphertext is kept,
//! the failure is logged and reported separately, and the batch continues.
//! Packaging the output directory into an archive is the external
//! packager's job - the summary carries the path it is expected to produce.

use adaptive_encryptor_domain::repositories::key_vault::KeyVault;
use adaptive_encryptor_domain::services::scheduler::{Scheduler, SchedulingPolicy, Task};
use adaptive_encryptor_domain::value_objects::chunk_size::ChunkSize;
use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::EncryptorError;
use rayon::prelude::*;
use ring::rand::{SecureRandom, SystemRandom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::infrastructure::adapters::whole_file::WholeFileCipher;
use crate::infrastructure::config::EncryptorConfig;
use crate::infrastructure::runtime::worker_pools::WorkerPools;
use crate::infrastructure::services::chunked_engine::ChunkedCtrEngine;

/// Files at or above this size under CTR take the chunked path.
pub const HEAVY_THRESHOLD: u64 = 16 * 1024 * 1024;

/// Parameters of one encryption run.
#[derive(Debug, Clone)]
pub struct EncryptParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: CipherMode,
    pub policy: SchedulingPolicy,
    /// Fixed chunk size override; `None` selects per-file elastic sizing.
    pub chunk_override: Option<ChunkSize>,
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: Vec<(PathBuf, EncryptorError)>,
    /// Files whose ciphertext committed but whose key wrap did not. The
    /// ciphertext is kept on disk; the failure is reported, not fatal.
    pub vault_failures: Vec<(PathBuf, EncryptorError)>,
    pub elapsed: Duration,
    /// Where the external packager is expected to write the archive.
    pub archive_path: PathBuf,
}

/// Driver for encrypting a directory tree.
pub struct EncryptDirectoryUseCase {
    engine: Arc<ChunkedCtrEngine>,
    whole: Arc<WholeFileCipher>,
    rng: SystemRandom,
}

impl Default for EncryptDirectoryUseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptDirectoryUseCase {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(ChunkedCtrEngine::new()),
            whole: Arc::new(WholeFileCipher::new()),
            rng: SystemRandom::new(),
        }
    }

    /// Executes one encryption run.
    pub async fn execute(
        &self,
        params: &EncryptParams,
        config: &EncryptorConfig,
        scheduler: &Scheduler,
        pools: &WorkerPools,
        vault: &dyn KeyVault,
    ) -> Result<RunSummary, EncryptorError> {
        let run_start = Instant::now();
        let master_secret = config.master_secret()?.to_string();

        let files = enumerate_files(&params.input)?;
        if files.is_empty() {
            return Err(EncryptorError::MissingInputs(format!(
                "No files under {}",
                params.input.display()
            )));
        }

        let plan = match params.policy {
            SchedulingPolicy::Priority => scheduler.plan(&files),
            SchedulingPolicy::Fifo => files
                .iter()
                .enumerate()
                .map(|(index, (path, size))| Task {
                    priority: index as f64,
                    path: path.clone(),
                    size: *size,
                    suffix: adaptive_encryptor_domain::services::scheduler::suffix_of(path),
                })
                .collect(),
        };

        // One key per run; its wrapped form is upserted into the vault as
        // each file's ciphertext commits.
        let key = self.generate_key()?;
        let unix_seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(EncryptorError::internal_error)?
            .as_secs();
        let key_id = KeyId::generate(
            &params.input.display().to_string(),
            params.mode,
            unix_seconds,
        );
        info!(key_id = %key_id, files = files.len(), "Encryption run planned");

        let (big, small): (Vec<Task>, Vec<Task>) = plan
            .into_iter()
            .partition(|task| task.size >= HEAVY_THRESHOLD && params.mode == CipherMode::Ctr);

        let mut failed: Vec<(PathBuf, EncryptorError)> = Vec::new();
        let mut vault_failures: Vec<(PathBuf, EncryptorError)> = Vec::new();
        let mut processed = 0usize;

        // Small files: inline for a single file, 4x-oversubscribed I/O pool
        // for a batch.
        if small.len() == 1 {
            let task = &small[0];
            match self.encrypt_small(task, params, scheduler, &key, &key_id) {
                Ok(()) => {
                    processed += 1;
                    self.wrap_key_after_commit(
                        vault,
                        &key_id,
                        &key,
                        params.mode,
                        &master_secret,
                        &task.path,
                        &mut vault_failures,
                    )
                    .await;
                }
                Err(e) => failed.push((task.path.clone(), e)),
            }
        } else if !small.is_empty() {
            let io_pool = pools.io_batch_pool()?;
            let outcomes: Vec<(PathBuf, Result<(), EncryptorError>)> = io_pool.install(|| {
                small
                    .par_iter()
                    .map(|task| {
                        let result = self.encrypt_small(task, params, scheduler, &key, &key_id);
                        (task.path.clone(), result)
                    })
                    .collect()
            });
            for (path, result) in outcomes {
                match result {
                    Ok(()) => {
                        processed += 1;
                        self.wrap_key_after_commit(
                            vault,
                            &key_id,
                            &key,
                            params.mode,
                            &master_secret,
                            &path,
                            &mut vault_failures,
                        )
                        .await;
                    }
                    Err(e) => failed.push((path, e)),
                }
            }
        }

        // Large files: sequential dispatch, each sharing the process pool.
        if !big.is_empty() {
            let shared_pool = pools.shared_pool()?;
            let workers = pools.workers().count();
            for task in big {
                let chunk_size = params
                    .chunk_override
                    .or(config.chunk_override)
                    .unwrap_or_else(|| ChunkSize::elastic_for_file(task.size, workers));

                let dst = output_path(&params.input, &params.output, &task.path)?;
                ensure_parent(&dst)?;

                let engine = self.engine.clone();
                let pool = shared_pool.clone();
                let worker_key = key.clone();
                let worker_key_id = key_id.clone();
                let src = task.path.clone();
                let dst_for_worker = dst.clone();

                let started = Instant::now();
                let result = tokio::task::spawn_blocking(move || {
                    engine.encrypt_file(&src, &dst_for_worker, &worker_key, &worker_key_id, chunk_size, &pool)
                })
                .await
                .map_err(|e| EncryptorError::PoolError(format!("Engine task join failure: {}", e)))?;

                match result {
                    Ok(_manifest) => {
                        scheduler.observe(&task.path, task.size, started.elapsed().as_secs_f64());
                        processed += 1;
                        self.wrap_key_after_commit(
                            vault,
                            &key_id,
                            &key,
                            params.mode,
                            &master_secret,
                            &task.path,
                            &mut vault_failures,
                        )
                        .await;
                    }
                    Err(e) => {
                        warn!(path = %task.path.display(), error = %e, "Chunked encryption failed");
                        failed.push((task.path.clone(), e));
                    }
                }
            }
        }

        let summary = RunSummary {
            processed,
            failed,
            vault_failures,
            elapsed: run_start.elapsed(),
            archive_path: params.output.join(&config.archive_name),
        };
        info!(
            processed = summary.processed,
            failed = summary.failed.len(),
            vault_failures = summary.vault_failures.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Encryption run complete"
        );
        Ok(summary)
    }

    /// Upserts the wrapped run key after a file's ciphertext has committed.
    ///
    /// A failure here leaves the ciphertext on disk: the key is still in
    /// memory for the current session, so the run is not aborted - the
    /// failure is logged and carried in the summary instead.
    #[allow(clippy::too_many_arguments)]
    async fn wrap_key_after_commit(
        &self,
        vault: &dyn KeyVault,
        key_id: &KeyId,
        key: &FileKey,
        mode: CipherMode,
        master_secret: &str,
        path: &Path,
        vault_failures: &mut Vec<(PathBuf, EncryptorError)>,
    ) {
        if let Err(e) = vault.store(key_id, key, mode, master_secret).await {
            warn!(
                path = %path.display(),
                error = %e,
                "Key wrap failed after ciphertext commit, keeping ciphertext"
            );
            vault_failures.push((path.to_path_buf(), e));
        }
    }

    fn generate_key(&self) -> Result<FileKey, EncryptorError> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|e| EncryptorError::EncryptionError(format!("RNG failure: {:?}", e)))?;
        Ok(FileKey::from_bytes(bytes))
    }

    fn encrypt_small(
        &self,
        task: &Task,
        params: &EncryptParams,
        scheduler: &Scheduler,
        key: &FileKey,
        key_id: &KeyId,
    ) -> Result<(), EncryptorError> {
        let dst = output_path(&params.input, &params.output, &task.path)?;
        ensure_parent(&dst)?;

        let started = Instant::now();
        self.whole.encrypt(&task.path, &dst, params.mode, key, key_id)?;
        scheduler.observe(&task.path, task.size, started.elapsed().as_secs_f64());
        Ok(())
    }
}

/// Recursively enumerates regular files with their sizes.
fn enumerate_files(input: &Path) -> Result<Vec<(PathBuf, u64)>, EncryptorError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(input) {
        let entry = entry.map_err(|e| EncryptorError::MissingInputs(e.to_string()))?;
        if entry.file_type().is_file() {
            let size = entry
                .metadata()
                .map_err(|e| EncryptorError::io_error(e.to_string()))?
                .len();
            files.push((entry.into_path(), size));
        }
    }
    Ok(files)
}

/// Mirrors the input-relative path under the output root with `.enc`
/// appended.
fn output_path(input: &Path, output: &Path, file: &Path) -> Result<PathBuf, EncryptorError> {
    let rel = file
        .strip_prefix(input)
        .map_err(|_| EncryptorError::internal_error("Planned file escaped the input root"))?;
    let mut name = output.join(rel).into_os_string();
    name.push(".enc");
    Ok(PathBuf::from(name))
}

fn ensure_parent(path: &Path) -> Result<(), EncryptorError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(EncryptorError::io_error)?;
    }
    Ok(())
}

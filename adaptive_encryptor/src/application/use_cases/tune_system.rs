// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tune System Use Case
//!
//! Offline micro-benchmark selecting the best (chunk size, worker count)
//! pair for this machine.
//!
//! ## Method
//!
//! For every pair in `{1, 4, 8, 16} MiB x {1, C/2, C, 1.5C}` workers:
//! generate a random sample buffer, split it into chunk-sized slices, and
//! hash every slice with SHA-256 (a good proxy for AES work) on a **freshly
//! built** thread pool. Pool construction is inside the timed window on
//! purpose: spawning and tearing down an oversubscribed pool costs real
//! time, and configurations that cannot amortize it must score worse.
//!
//! A failed trial records 0 MB/s and tuning continues. The winner maximizes
//! MB/s; ties go to the earlier (smaller) candidate. Only one tuning run
//! may execute at a time - trials measure the machine, and a concurrent
//! run would measure the other tuner instead.

use adaptive_encryptor_domain::value_objects::worker_count::WorkerCount;
use adaptive_encryptor_domain::EncryptorError;
use parking_lot::Mutex;
use rand::RngCore;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::{info, warn};

/// Serializes tuning runs process-wide.
static TUNER_GUARD: Mutex<()> = Mutex::new(());

/// Chunk-size candidates in bytes.
const CHUNK_CANDIDATES: [u64; 4] = [
    1024 * 1024,
    4 * 1024 * 1024,
    8 * 1024 * 1024,
    16 * 1024 * 1024,
];

/// Score of one (chunk, workers) trial.
#[derive(Debug, Clone)]
pub struct TrialScore {
    pub chunk_bytes: u64,
    pub workers: usize,
    pub mbps: f64,
}

/// Tuning outcome: the winning pair plus every score measured.
#[derive(Debug, Clone)]
pub struct TuningReport {
    pub best_chunk: u64,
    pub best_workers: usize,
    pub all_scores: Vec<TrialScore>,
}

/// Use case benchmarking chunk-size / worker-count pairs.
pub struct TuneSystemUseCase;

impl Default for TuneSystemUseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl TuneSystemUseCase {
    pub fn new() -> Self {
        Self
    }

    /// Runs the benchmark matrix over a `sample_mib` MiB random buffer.
    pub fn execute(&self, sample_mib: usize) -> Result<TuningReport, EncryptorError> {
        let _serialized = TUNER_GUARD.lock();

        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let worker_candidates = WorkerCount::tuning_candidates(cores);
        info!(
            sample_mib,
            cores,
            workers = ?worker_candidates,
            "Benchmarking chunk sizes across worker counts"
        );

        let mut sample = vec![0u8; sample_mib.max(1) * 1024 * 1024];
        rand::rng().fill_bytes(&mut sample);

        let mut all_scores = Vec::with_capacity(CHUNK_CANDIDATES.len() * worker_candidates.len());
        for &chunk in &CHUNK_CANDIDATES {
            for &workers in &worker_candidates {
                let mbps = match trial(&sample, chunk, workers) {
                    Ok(mbps) => mbps,
                    Err(e) => {
                        warn!(chunk, workers, error = %e, "Trial failed, scoring 0");
                        0.0
                    }
                };
                all_scores.push(TrialScore {
                    chunk_bytes: chunk,
                    workers,
                    mbps,
                });
            }
        }

        // Strict comparison keeps the first (smallest) candidate on ties.
        let best = all_scores
            .iter()
            .fold(None::<&TrialScore>, |best, score| match best {
                Some(current) if score.mbps <= current.mbps => Some(current),
                _ => Some(score),
            })
            .ok_or_else(|| EncryptorError::internal_error("Tuning produced no scores"))?;

        info!(
            best_chunk = best.chunk_bytes,
            best_workers = best.workers,
            best_mbps = format!("{:.1}", best.mbps),
            "Tuning complete"
        );

        Ok(TuningReport {
            best_chunk: best.chunk_bytes,
            best_workers: best.workers,
            all_scores: all_scores.clone(),
        })
    }
}

/// One timed trial. The pool is built inside the timed window so that
/// spawn and teardown cost counts against the configuration.
fn trial(sample: &[u8], chunk_bytes: u64, workers: usize) -> Result<f64, EncryptorError> {
    let started = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| EncryptorError::PoolError(format!("Trial pool build failed: {}", e)))?;

    pool.install(|| {
        sample.par_chunks(chunk_bytes as usize).for_each(|slice| {
            let _digest = Sha256::digest(slice);
        });
    });
    drop(pool);

    let elapsed = started.elapsed().as_secs_f64().max(1e-6);
    Ok((sample.len() as f64) / (1024.0 * 1024.0) / elapsed)
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Count Value Object
//!
//! Bounded worker counts for the shared process pool and the per-batch
//! small-file pools. The count is clamped at construction so no code path
//! can build a zero-thread or thousand-thread pool.
//!
//! The autotuner probes the candidate set `{1, C/2, C, floor(1.5*C)}` for a
//! machine with `C` logical cores; oversubscribing by 50% is worth testing
//! because cipher work stalls on memory as often as it retires instructions.

use serde::{Deserialize, Serialize};

/// Validated worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerCount {
    count: usize,
}

impl WorkerCount {
    /// Minimum number of workers (always at least 1)
    pub const MIN_WORKERS: usize = 1;

    /// Maximum number of workers (prevents resource exhaustion)
    pub const MAX_WORKERS: usize = 32;

    /// Default worker count for fallback scenarios
    pub const DEFAULT_WORKERS: usize = 4;

    /// Creates a new worker count clamped to
    /// [`MIN_WORKERS`](Self::MIN_WORKERS)..=[`MAX_WORKERS`](Self::MAX_WORKERS).
    pub fn new(count: usize) -> Self {
        Self {
            count: count.clamp(Self::MIN_WORKERS, Self::MAX_WORKERS),
        }
    }

    /// Returns the number of workers.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Worker count scaled for I/O-bound batches.
    ///
    /// Small-file batches wait on the disk, not the CPU, so the driver
    /// oversubscribes by 4x to keep the device queue full.
    pub fn io_oversubscribed(&self) -> usize {
        (self.count * 4).min(Self::MAX_WORKERS * 4)
    }

    /// Returns the default worker count for this system.
    pub fn default_for_system() -> Self {
        let available_cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(Self::DEFAULT_WORKERS);
        Self::new(available_cores)
    }

    /// Candidate worker counts probed by the autotuner for a machine with
    /// `cores` logical CPUs: `{1, cores/2, cores, floor(1.5 * cores)}`,
    /// deduplicated and sorted ascending.
    pub fn tuning_candidates(cores: usize) -> Vec<usize> {
        let cores = cores.max(1);
        let mut candidates = vec![1, (cores / 2).max(1), cores, (cores * 3) / 2];
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORKERS)
    }
}

impl std::fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} workers", self.count)
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Pool Manager
//!
//! Two tiers of Rayon thread pools:
//!
//! - **Shared process pool**: lazily built once per process, sized to the
//!   tuned worker count. The chunked engine and large-file decrypts run
//!   here. Initialization is double-checked - an atomic flag fast-path over
//!   a mutex-guarded slot - so concurrent first users build exactly one
//!   pool.
//! - **Per-batch I/O pools**: built fresh for each small-file batch at
//!   4x the worker count. Small files wait on the disk, not the CPU, so
//!   oversubscription keeps the device queue full; the pool is dropped with
//!   the batch.

use adaptive_encryptor_domain::value_objects::worker_count::WorkerCount;
use adaptive_encryptor_domain::EncryptorError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide worker pool manager.
pub struct WorkerPools {
    workers: WorkerCount,
    shared: Mutex<Option<Arc<rayon::ThreadPool>>>,
    initialized: AtomicBool,
}

impl WorkerPools {
    /// Creates a manager for the given tuned worker count. No threads are
    /// spawned until the first `shared_pool` call.
    pub fn new(workers: WorkerCount) -> Self {
        Self {
            workers,
            shared: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// The configured worker count.
    pub fn workers(&self) -> WorkerCount {
        self.workers
    }

    /// Returns the shared CPU-bound pool, building it on first use.
    pub fn shared_pool(&self) -> Result<Arc<rayon::ThreadPool>, EncryptorError> {
        if self.initialized.load(Ordering::Acquire) {
            if let Some(pool) = self.shared.lock().as_ref() {
                return Ok(pool.clone());
            }
        }

        let mut guard = self.shared.lock();
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.count())
            .thread_name(|i| format!("encryptor-worker-{}", i))
            .build()
            .map_err(|e| EncryptorError::PoolError(format!("Failed to create shared pool: {}", e)))?;

        let pool = Arc::new(pool);
        *guard = Some(pool.clone());
        self.initialized.store(true, Ordering::Release);
        Ok(pool)
    }

    /// Builds a fresh I/O-oversubscribed pool for one small-file batch.
    pub fn io_batch_pool(&self) -> Result<rayon::ThreadPool, EncryptorError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.io_oversubscribed())
            .thread_name(|i| format!("encryptor-io-{}", i))
            .build()
            .map_err(|e| EncryptorError::PoolError(format!("Failed to create I/O pool: {}", e)))
    }
}

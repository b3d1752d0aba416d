// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Size Value Object
//!
//! Type-safe representation of the chunk sizes used by the chunked CTR
//! engine. Chunk size determines the grid stride of the ciphertext file
//! layout, so it is validated once at creation time and immutable after.
//!
//! ## Overview
//!
//! The chunk size value object provides:
//!
//! - **Validation**: chunk sizes are bounded and non-degenerate
//! - **Elastic Sizing**: the per-file sizing rule used by the driver, which
//!   targets four chunks per worker and clamps the result to sane bounds
//! - **Grid Arithmetic**: chunk counts for a given file size
//!
//! ## Elastic Sizing
//!
//! For a file of `size` bytes processed by `W` workers, the driver targets
//! `4 * W` chunks per file:
//!
//! ```text
//! ideal = size / (4 * W)
//! elastic = floor_to_16(clamp(ideal, 1 MiB, 64 MiB))
//! ```
//!
//! Four chunks per worker keeps every worker busy through the tail of the
//! file without shrinking chunks to the point where per-chunk overhead
//! (task dispatch, HMAC finalization, one seek per slot) dominates.
//!
//! ## Chunk Size Constraints
//!
//! - **Minimum (16 bytes)**: one AES block; smaller grids are meaningless
//! - **Maximum (512 MiB)**: bounds worker memory since each in-flight chunk
//!   is materialized in full
//! - **Default (8 MiB)**: the initial chunk size for large files before
//!   elastic sizing or autotuning refines it

use crate::error::EncryptorError;
use serde::{Deserialize, Serialize};

/// Validated chunk size in bytes.
///
/// Two chunk sizes are equal if they have the same byte count; ordering is
/// by byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkSize {
    bytes: u64,
}

impl ChunkSize {
    /// Minimum chunk size (one AES block)
    pub const MIN_SIZE: u64 = 16;

    /// Maximum chunk size (bounds per-worker memory)
    pub const MAX_SIZE: u64 = 512 * 1024 * 1024;

    /// Default chunk size for large files (8 MiB)
    pub const DEFAULT_SIZE: u64 = 8 * 1024 * 1024;

    /// Lower bound of the elastic sizing rule (1 MiB)
    pub const ELASTIC_MIN: u64 = 1024 * 1024;

    /// Upper bound of the elastic sizing rule (64 MiB)
    pub const ELASTIC_MAX: u64 = 64 * 1024 * 1024;

    /// Creates a new chunk size, validating bounds.
    pub fn new(bytes: u64) -> Result<Self, EncryptorError> {
        if bytes < Self::MIN_SIZE {
            return Err(EncryptorError::InvalidConfiguration(format!(
                "Chunk size {} is below the minimum of {} bytes",
                bytes,
                Self::MIN_SIZE
            )));
        }
        if bytes > Self::MAX_SIZE {
            return Err(EncryptorError::InvalidConfiguration(format!(
                "Chunk size {} exceeds the maximum of {} bytes",
                bytes,
                Self::MAX_SIZE
            )));
        }
        Ok(Self { bytes })
    }

    /// Creates a chunk size from mebibytes.
    pub fn from_mib(mib: u64) -> Result<Self, EncryptorError> {
        Self::new(mib * 1024 * 1024)
    }

    /// Returns the chunk size in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns the chunk size in mebibytes.
    pub fn mebibytes(&self) -> f64 {
        (self.bytes as f64) / (1024.0 * 1024.0)
    }

    /// Calculates the per-file elastic chunk size for a worker count.
    ///
    /// Targets `4 * workers` chunks, clamps to
    /// [`ELASTIC_MIN`](Self::ELASTIC_MIN)..=[`ELASTIC_MAX`](Self::ELASTIC_MAX)
    /// and floors to a 16-byte multiple. Both bounds are themselves 16-byte
    /// multiples, so the result always stays within them.
    pub fn elastic_for_file(file_size: u64, workers: usize) -> Self {
        let target_chunks = (workers.max(1) as u64) * 4;
        let ideal = file_size / target_chunks;
        let clamped = ideal.clamp(Self::ELASTIC_MIN, Self::ELASTIC_MAX);
        let floored = (clamped / 16) * 16;
        Self { bytes: floored.max(16) }
    }

    /// Number of chunks a file of `file_size` bytes splits into.
    ///
    /// A zero-length file still occupies one (empty) terminal chunk.
    pub fn chunks_needed_for_file(&self, file_size: u64) -> u64 {
        if file_size == 0 {
            1
        } else {
            file_size.div_ceil(self.bytes)
        }
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self {
            bytes: Self::DEFAULT_SIZE,
        }
    }
}

impl std::fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}MiB", self.mebibytes())
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunked Ciphertext Header and Grid Layout
//!
//! Byte-exact description of the chunked CTR on-disk format (version 1):
//!
//! ```text
//! offset 0   5   MAGIC       = "CTRCH"
//! offset 5   16  BASE_NONCE  (random; first 8 bytes are the nonce prefix)
//! offset 21  8   CHUNK_SIZE  (big-endian u64)
//! offset 29 + i*(8+S):
//!        8   CIPHERTEXT_LEN_i  (big-endian u64)
//!        L   CIPHERTEXT_i      (L = S for i < N-1; L <= S for i = N-1)
//! ```
//!
//! ## Grid Addressability
//!
//! Slot `i` begins at `29 + i * (8 + S)`. Every chunk except possibly the
//! last is exactly `S` bytes, so slot positions are pure arithmetic and
//! workers can scatter-write results without locks or reorder buffers. The
//! terminal slot may be short; because it sits at the end of the file, any
//! transient hole created by an early terminal write is filled before
//! commit.
//!
//! ## Nonce Discipline
//!
//! Chunk `i` is encrypted under the 16-byte CTR IV
//! `BASE_NONCE[0..8] || be64(i)`: the random prefix separates files, the
//! counter suffix separates chunks within a file. The driver never reuses a
//! file key across runs, so (key, nonce) pairs never repeat.

use crate::error::EncryptorError;
use serde::{Deserialize, Serialize};

/// Magic bytes identifying a chunked ciphertext file.
pub const MAGIC: &[u8; 5] = b"CTRCH";

/// Size of the fixed header: magic (5) + base nonce (16) + chunk size (8).
pub const HEADER_SIZE: u64 = 29;

/// Size of the big-endian length prefix preceding each chunk.
pub const LEN_PREFIX_SIZE: u64 = 8;

/// The 16-byte per-file random value seeding all chunk nonces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseNonce([u8; 16]);

impl BaseNonce {
    /// Wraps raw nonce bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Parses the hex rendering stored in manifests.
    pub fn from_hex(hex_str: &str) -> Result<Self, EncryptorError> {
        let raw = hex::decode(hex_str)
            .map_err(|e| EncryptorError::ManifestCorrupt(format!("Bad base_nonce hex: {}", e)))?;
        if raw.len() != 16 {
            return Err(EncryptorError::ManifestCorrupt(format!(
                "base_nonce has {} bytes, expected 16",
                raw.len()
            )));
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    /// Returns the raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Hex rendering for manifests.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Derives the CTR IV for chunk `index`:
    /// `prefix[0..8] || big-endian u64(index)`.
    pub fn chunk_nonce(&self, index: u64) -> [u8; 16] {
        let mut nonce = [0u8; 16];
        nonce[..8].copy_from_slice(&self.0[..8]);
        nonce[8..].copy_from_slice(&index.to_be_bytes());
        nonce
    }
}

/// Parsed form of the 29-byte fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedHeader {
    pub base_nonce: BaseNonce,
    pub chunk_size: u64,
}

impl ChunkedHeader {
    /// Serializes the header to its 29-byte wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        bytes[..5].copy_from_slice(MAGIC);
        bytes[5..21].copy_from_slice(self.base_nonce.as_bytes());
        bytes[21..29].copy_from_slice(&self.chunk_size.to_be_bytes());
        bytes
    }

    /// Parses and validates a 29-byte header.
    pub fn parse(bytes: &[u8]) -> Result<Self, EncryptorError> {
        if bytes.len() < HEADER_SIZE as usize {
            return Err(EncryptorError::HeaderMismatch(format!(
                "File too short for header: {} bytes",
                bytes.len()
            )));
        }
        if &bytes[..5] != MAGIC {
            return Err(EncryptorError::HeaderMismatch(
                "Magic bytes are not CTRCH".to_string(),
            ));
        }
        let mut nonce = [0u8; 16];
        nonce.copy_from_slice(&bytes[5..21]);
        let mut size_be = [0u8; 8];
        size_be.copy_from_slice(&bytes[21..29]);
        let chunk_size = u64::from_be_bytes(size_be);
        if chunk_size == 0 {
            return Err(EncryptorError::HeaderMismatch(
                "Header records a zero chunk size".to_string(),
            ));
        }
        Ok(Self {
            base_nonce: BaseNonce::from_bytes(nonce),
            chunk_size,
        })
    }

    /// Byte offset of chunk slot `index`: `29 + index * (8 + S)`.
    pub fn slot_offset(&self, index: u64) -> u64 {
        HEADER_SIZE + index * (LEN_PREFIX_SIZE + self.chunk_size)
    }

    /// Total file length at commit for `chunk_count` chunks whose terminal
    /// chunk holds `terminal_len` bytes:
    /// `29 + (N-1)*(8+S) + 8 + terminal_len`.
    pub fn committed_len(&self, chunk_count: u64, terminal_len: u64) -> u64 {
        self.slot_offset(chunk_count.saturating_sub(1)) + LEN_PREFIX_SIZE + terminal_len
    }
}

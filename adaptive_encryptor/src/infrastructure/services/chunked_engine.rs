// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunked CTR Engine
//!
//! Parallel encryption and decryption of large files over the `CTRCH` grid
//! format, with a per-chunk HMAC-SHA256 manifest.
//!
//! ## Concurrent Scatter-Writes
//!
//! Workers encrypt chunks on the shared Rayon pool and hand results to a
//! single-threaded aggregator over a crossbeam channel, **in completion
//! order**. The aggregator computes each chunk's HMAC while the ciphertext
//! is hot in cache, then writes it directly to its grid slot
//! `29 + i * (8 + S)` with a positional write:
//!
//! ```text
//! Worker 0: encrypt chunk 2 ──┐
//! Worker 1: encrypt chunk 0 ──┼──> aggregator: HMAC + write_at(slot_i)
//! Worker 2: encrypt chunk 1 ──┘
//! ```
//!
//! Because every non-terminal chunk is exactly `S` bytes, slot positions
//! are pure arithmetic: no lock, no reorder buffer, no second pass. If the
//! terminal (short) chunk lands before an earlier one, the seek leaves a
//! transient hole that later writes fill; the hole cannot outlive the drain
//! loop because the terminal slot is at the end of the file.
//!
//! Platform-specific positional writes keep the aggregator seek-free:
//! `pwrite()` on Unix, `seek_write()` on Windows.
//!
//! ## Failure Semantics
//!
//! Worker failures travel the channel as typed envelopes; the first failure
//! aborts the file, drops the channel (remaining workers' sends become
//! no-ops), and unlinks the temp output. The destination is renamed into
//! place only after every slot is written and synced, so a partial output
//! never replaces it. Decryption verifies every chunk's HMAC against the
//! manifest *before* any ciphertext reaches a decrypt worker.

use adaptive_encryptor_domain::value_objects::chunk_size::ChunkSize;
use adaptive_encryptor_domain::value_objects::chunked_header::{
    BaseNonce, ChunkedHeader, HEADER_SIZE, LEN_PREFIX_SIZE,
};
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::value_objects::manifest::{self, FileManifest};
use adaptive_encryptor_domain::EncryptorError;
use aes::cipher::{KeyIvInit, StreamCipher};
use crossbeam::channel;
use memmap2::Mmap;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::infrastructure::runtime::temp_guard::{temp_path_for, TempFileGuard};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Typed result envelope a worker sends back to the aggregator.
type ChunkEnvelope = (u64, Result<Vec<u8>, EncryptorError>);

/// Parallel chunked CTR engine.
pub struct ChunkedCtrEngine {
    rng: SystemRandom,
}

impl Default for ChunkedCtrEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedCtrEngine {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Encrypts `src` into the chunked grid format at `dst`.
    ///
    /// Writes the sidecar manifest next to `dst` and returns it. The caller
    /// is responsible for having stored the wrapped file key in the vault.
    pub fn encrypt_file(
        &self,
        src: &Path,
        dst: &Path,
        key: &FileKey,
        key_id: &KeyId,
        chunk_size: ChunkSize,
        pool: &rayon::ThreadPool,
    ) -> Result<FileManifest, EncryptorError> {
        let file_size = std::fs::metadata(src).map_err(EncryptorError::io_error)?.len();
        let chunk_count = chunk_size.chunks_needed_for_file(file_size);
        let stride = chunk_size.bytes();

        let mut nonce_bytes = [0u8; 16];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|e| EncryptorError::EncryptionError(format!("RNG failure: {:?}", e)))?;
        let header = ChunkedHeader {
            base_nonce: BaseNonce::from_bytes(nonce_bytes),
            chunk_size: stride,
        };

        let auth_key = key.auth_key();
        let hmac_key = hmac::Key::new(hmac::HMAC_SHA256, auth_key.as_slice());

        // Map the source once; workers slice it read-only with zero copies
        // until the cipher pass. A zero-length file has nothing to map.
        let mmap: Option<Arc<Mmap>> = if file_size > 0 {
            let source = File::open(src).map_err(EncryptorError::io_error)?;
            // SAFETY: the mapping is read-only and lives only for this call;
            // mutating the source mid-run is outside the engine's contract.
            let map = unsafe { Mmap::map(&source) }.map_err(EncryptorError::io_error)?;
            Some(Arc::new(map))
        } else {
            None
        };

        let temp = temp_path_for(dst);
        let guard = TempFileGuard::new(temp.clone());
        let out = File::create(&temp).map_err(EncryptorError::io_error)?;
        write_at(&out, &header.to_bytes(), 0)?;

        let shared_key = Arc::new(key.clone());
        let (tx, rx) = channel::unbounded::<ChunkEnvelope>();

        for index in 0..chunk_count {
            let offset = index * stride;
            let length = if file_size == 0 {
                0
            } else {
                stride.min(file_size - offset)
            };
            let tx = tx.clone();
            let key = shared_key.clone();
            let mmap = mmap.clone();
            let nonce = header.base_nonce.chunk_nonce(index);

            pool.spawn(move || {
                let plaintext = match &mmap {
                    Some(map) => map[offset as usize..(offset + length) as usize].to_vec(),
                    None => Vec::new(),
                };
                let result = apply_ctr(&key, &nonce, plaintext);
                // The aggregator may have aborted and dropped the receiver.
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        // Drain results as they complete, out of order.
        let mut chunk_hmacs: Vec<Option<String>> = vec![None; chunk_count as usize];
        for _ in 0..chunk_count {
            let (index, result) = rx
                .recv()
                .map_err(|_| EncryptorError::PoolError("Worker channel closed early".to_string()))?;
            let ciphertext = result?;

            let tag = hmac::sign(&hmac_key, &ciphertext);
            chunk_hmacs[index as usize] = Some(hex::encode(tag.as_ref()));

            let mut record = Vec::with_capacity(LEN_PREFIX_SIZE as usize + ciphertext.len());
            record.extend_from_slice(&(ciphertext.len() as u64).to_be_bytes());
            record.extend_from_slice(&ciphertext);
            write_at(&out, &record, header.slot_offset(index))?;
        }

        out.sync_all().map_err(EncryptorError::io_error)?;
        std::fs::rename(&temp, dst).map_err(EncryptorError::io_error)?;
        guard.commit();

        let chunk_hmacs: Vec<String> = chunk_hmacs
            .into_iter()
            .map(|mac| mac.ok_or_else(|| EncryptorError::internal_error("Chunk completed without a MAC")))
            .collect::<Result<_, _>>()?;

        let file_manifest = FileManifest::chunked(
            &header.base_nonce,
            stride,
            chunk_count,
            key_id.clone(),
            chunk_hmacs,
        );
        std::fs::write(manifest::sidecar_path(dst), file_manifest.to_json()?)
            .map_err(EncryptorError::io_error)?;

        debug!(
            dst = %dst.display(),
            chunks = chunk_count,
            chunk_size = stride,
            "Chunked encryption committed"
        );
        Ok(file_manifest)
    }

    /// Decrypts a chunked ciphertext described by its manifest into `out`.
    pub fn decrypt_file(
        &self,
        enc: &Path,
        out: &Path,
        key: &FileKey,
        file_manifest: &FileManifest,
        pool: &rayon::ThreadPool,
    ) -> Result<(), EncryptorError> {
        let params = file_manifest.chunked_params()?;
        let auth_key = key.auth_key();
        let hmac_key = hmac::Key::new(hmac::HMAC_SHA256, auth_key.as_slice());

        let mut reader = BufReader::new(File::open(enc).map_err(EncryptorError::io_error)?);
        let mut header_bytes = [0u8; HEADER_SIZE as usize];
        reader
            .read_exact(&mut header_bytes)
            .map_err(|_| EncryptorError::HeaderMismatch("File too short for header".to_string()))?;
        let header = ChunkedHeader::parse(&header_bytes)?;

        if header.chunk_size != params.chunk_size {
            return Err(EncryptorError::HeaderMismatch(format!(
                "Header chunk size {} disagrees with manifest {}",
                header.chunk_size, params.chunk_size
            )));
        }
        if header.base_nonce != params.base_nonce {
            return Err(EncryptorError::HeaderMismatch(
                "Header base nonce disagrees with manifest".to_string(),
            ));
        }

        // Sequential read of the dense grid: every chunk before the last is
        // exactly S bytes, the terminal record ends the file. Each chunk's
        // HMAC is verified before its ciphertext is handed to a worker.
        let stride = params.chunk_size;
        let mut ciphertexts: Vec<Vec<u8>> = Vec::with_capacity(params.chunk_count as usize);
        for index in 0..params.chunk_count {
            let mut len_be = [0u8; 8];
            reader
                .read_exact(&mut len_be)
                .map_err(|_| EncryptorError::HeaderMismatch(format!("Missing record for chunk {}", index)))?;
            let length = u64::from_be_bytes(len_be);

            if length > stride || (index < params.chunk_count - 1 && length != stride) {
                return Err(EncryptorError::HeaderMismatch(format!(
                    "Chunk {} length {} violates the grid stride {}",
                    index, length, stride
                )));
            }

            let mut ciphertext = vec![0u8; length as usize];
            reader
                .read_exact(&mut ciphertext)
                .map_err(|_| EncryptorError::HeaderMismatch(format!("Truncated chunk {}", index)))?;

            let expected = hex::decode(&params.chunk_hmacs[index as usize])
                .map_err(|e| EncryptorError::ManifestCorrupt(format!("Bad HMAC hex: {}", e)))?;
            hmac::verify(&hmac_key, &ciphertext, &expected).map_err(|_| {
                EncryptorError::IntegrityFailure(format!("HMAC mismatch on chunk {}", index))
            })?;

            ciphertexts.push(ciphertext);
        }

        let temp = temp_path_for(out);
        let guard = TempFileGuard::new(temp.clone());
        let dest = File::create(&temp).map_err(EncryptorError::io_error)?;

        let shared_key = Arc::new(key.clone());
        let (tx, rx) = channel::unbounded::<ChunkEnvelope>();

        for (index, ciphertext) in ciphertexts.into_iter().enumerate() {
            let tx = tx.clone();
            let key = shared_key.clone();
            let nonce = params.base_nonce.chunk_nonce(index as u64);
            pool.spawn(move || {
                let result = apply_ctr(&key, &nonce, ciphertext);
                let _ = tx.send((index as u64, result));
            });
        }
        drop(tx);

        for _ in 0..params.chunk_count {
            let (index, result) = rx
                .recv()
                .map_err(|_| EncryptorError::PoolError("Worker channel closed early".to_string()))?;
            let plaintext = result?;
            write_at(&dest, &plaintext, index * stride)?;
        }

        dest.sync_all().map_err(EncryptorError::io_error)?;
        std::fs::rename(&temp, out).map_err(EncryptorError::io_error)?;
        guard.commit();
        Ok(())
    }
}

/// AES-256-CTR over one chunk. CTR is an involution, so the same transform
/// serves encryption and decryption.
fn apply_ctr(key: &FileKey, nonce: &[u8; 16], mut data: Vec<u8>) -> Result<Vec<u8>, EncryptorError> {
    if data.is_empty() {
        return Ok(data);
    }
    let mut cipher = Aes256Ctr::new_from_slices(key.as_bytes(), nonce)
        .map_err(|e| EncryptorError::EncryptionError(format!("CTR init failed: {}", e)))?;
    cipher.apply_keystream(&mut data);
    Ok(data)
}

/// Positional write that never moves a shared file cursor.
fn write_at(file: &File, data: &[u8], position: u64) -> Result<(), EncryptorError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        file.write_all_at(data, position).map_err(|e| {
            EncryptorError::IoError(format!("Failed to write at offset {}: {}", position, e))
        })
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::FileExt;
        let mut written = 0usize;
        while written < data.len() {
            let n = file
                .seek_write(&data[written..], position + written as u64)
                .map_err(|e| {
                    EncryptorError::IoError(format!("Failed to write at offset {}: {}", position, e))
                })?;
            if n == 0 {
                return Err(EncryptorError::IoError(format!(
                    "Zero-length write at offset {}",
                    position
                )));
            }
            written += n;
        }
        Ok(())
    }
}

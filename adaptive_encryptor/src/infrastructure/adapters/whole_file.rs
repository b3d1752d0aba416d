// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Whole-File Cipher Engines
//!
//! Single-shot encryption for files below the chunking threshold. Three
//! modes, each with a 3-byte magic followed by its nonce or IV:
//!
//! - **CTR**: `"CTR" || nonce(16)`, then the CTR keystream applied over
//!   streaming 1 MiB reads - constant memory regardless of file size
//! - **GCM**: `"GCM" || nonce(12)`, then the AEAD ciphertext with the tag
//!   appended - buffered whole because the tag covers the full payload
//! - **CBC**: `"CBC" || iv(16)`, then the PKCS7-padded ciphertext -
//!   buffered whole for the padding pass
//!
//! Every output is written to `<dst>.tmp` and renamed into place; a sidecar
//! manifest records mode, nonce/IV, key id, and the source file name.

use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;
use adaptive_encryptor_domain::value_objects::file_key::FileKey;
use adaptive_encryptor_domain::value_objects::key_id::KeyId;
use adaptive_encryptor_domain::value_objects::manifest::{self, FileManifest};
use adaptive_encryptor_domain::EncryptorError;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use aes_gcm::{AeadInPlace, Aes256Gcm, Key, KeyInit, Nonce};
use ring::rand::{SecureRandom, SystemRandom};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use crate::infrastructure::runtime::temp_guard::{temp_path_for, TempFileGuard};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Fixed read block for the streaming CTR path.
const STREAM_BLOCK: usize = 1024 * 1024;

/// Single-shot cipher engine for small files.
pub struct WholeFileCipher {
    rng: SystemRandom,
}

impl Default for WholeFileCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl WholeFileCipher {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Encrypts `src` into `dst` under the given mode, writes the sidecar
    /// manifest, and returns it.
    pub fn encrypt(
        &self,
        src: &Path,
        dst: &Path,
        mode: CipherMode,
        key: &FileKey,
        key_id: &KeyId,
    ) -> Result<FileManifest, EncryptorError> {
        let temp = temp_path_for(dst);
        let guard = TempFileGuard::new(temp.clone());

        let hex_nonce = match mode {
            CipherMode::Ctr => self.encrypt_ctr(src, &temp, key)?,
            CipherMode::Gcm => self.encrypt_gcm(src, &temp, key)?,
            CipherMode::Cbc => self.encrypt_cbc(src, &temp, key)?,
            CipherMode::CtrChunked => {
                return Err(EncryptorError::internal_error(
                    "Chunked mode routed to the whole-file engine",
                ))
            }
        };

        std::fs::rename(&temp, dst).map_err(EncryptorError::io_error)?;
        guard.commit();

        let src_name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_manifest = FileManifest::whole(mode, hex_nonce, key_id.clone(), src_name);
        std::fs::write(manifest::sidecar_path(dst), file_manifest.to_json()?)
            .map_err(EncryptorError::io_error)?;

        debug!(mode = %mode, dst = %dst.display(), "Whole-file encryption complete");
        Ok(file_manifest)
    }

    /// Decrypts a whole-file ciphertext, dispatching on its 3-byte magic.
    pub fn decrypt(&self, enc: &Path, out: &Path, key: &FileKey) -> Result<(), EncryptorError> {
        let mut reader = BufReader::new(File::open(enc).map_err(EncryptorError::io_error)?);
        let mut magic = [0u8; 3];
        reader
            .read_exact(&mut magic)
            .map_err(|_| EncryptorError::HeaderMismatch("File too short for a header".to_string()))?;

        let temp = temp_path_for(out);
        let guard = TempFileGuard::new(temp.clone());

        match &magic {
            b"CTR" => self.decrypt_ctr(reader, &temp, key)?,
            b"GCM" => self.decrypt_gcm(reader, &temp, key)?,
            b"CBC" => self.decrypt_cbc(reader, &temp, key)?,
            other => {
                return Err(EncryptorError::HeaderMismatch(format!(
                    "Unknown whole-file magic {:?}",
                    other
                )))
            }
        }

        std::fs::rename(&temp, out).map_err(EncryptorError::io_error)?;
        guard.commit();
        Ok(())
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], EncryptorError> {
        let mut bytes = [0u8; N];
        self.rng
            .fill(&mut bytes)
            .map_err(|e| EncryptorError::EncryptionError(format!("RNG failure: {:?}", e)))?;
        Ok(bytes)
    }

    fn encrypt_ctr(&self, src: &Path, temp: &Path, key: &FileKey) -> Result<String, EncryptorError> {
        let nonce = self.random_bytes::<16>()?;
        let mut cipher = Aes256Ctr::new_from_slices(key.as_bytes(), &nonce)
            .map_err(|e| EncryptorError::EncryptionError(format!("CTR init failed: {}", e)))?;

        let mut reader = BufReader::new(File::open(src).map_err(EncryptorError::io_error)?);
        let file = File::create(temp).map_err(EncryptorError::io_error)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(b"CTR").map_err(EncryptorError::io_error)?;
        writer.write_all(&nonce).map_err(EncryptorError::io_error)?;

        // One cipher instance across blocks keeps the keystream counter
        // continuous, so block boundaries leave no seam in the ciphertext.
        let mut block = vec![0u8; STREAM_BLOCK];
        loop {
            let read = reader.read(&mut block).map_err(EncryptorError::io_error)?;
            if read == 0 {
                break;
            }
            cipher.apply_keystream(&mut block[..read]);
            writer.write_all(&block[..read]).map_err(EncryptorError::io_error)?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| EncryptorError::io_error(e.to_string()))?;
        file.sync_all().map_err(EncryptorError::io_error)?;
        Ok(hex::encode(nonce))
    }

    fn decrypt_ctr(
        &self,
        mut reader: BufReader<File>,
        temp: &Path,
        key: &FileKey,
    ) -> Result<(), EncryptorError> {
        let mut nonce = [0u8; 16];
        reader
            .read_exact(&mut nonce)
            .map_err(|_| EncryptorError::HeaderMismatch("CTR header truncated".to_string()))?;
        let mut cipher = Aes256Ctr::new_from_slices(key.as_bytes(), &nonce)
            .map_err(|e| EncryptorError::EncryptionError(format!("CTR init failed: {}", e)))?;

        let file = File::create(temp).map_err(EncryptorError::io_error)?;
        let mut writer = BufWriter::new(file);

        let mut block = vec![0u8; STREAM_BLOCK];
        loop {
            let read = reader.read(&mut block).map_err(EncryptorError::io_error)?;
            if read == 0 {
                break;
            }
            cipher.apply_keystream(&mut block[..read]);
            writer.write_all(&block[..read]).map_err(EncryptorError::io_error)?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| EncryptorError::io_error(e.to_string()))?;
        file.sync_all().map_err(EncryptorError::io_error)
    }

    fn encrypt_gcm(&self, src: &Path, temp: &Path, key: &FileKey) -> Result<String, EncryptorError> {
        let nonce = self.random_bytes::<12>()?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        let mut buffer = std::fs::read(src).map_err(EncryptorError::io_error)?;
        cipher
            .encrypt_in_place(Nonce::from_slice(&nonce), b"", &mut buffer)
            .map_err(|e| EncryptorError::EncryptionError(format!("GCM encryption failed: {:?}", e)))?;

        let mut output = Vec::with_capacity(3 + 12 + buffer.len());
        output.extend_from_slice(b"GCM");
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&buffer);
        std::fs::write(temp, output).map_err(EncryptorError::io_error)?;
        Ok(hex::encode(nonce))
    }

    fn decrypt_gcm(
        &self,
        mut reader: BufReader<File>,
        temp: &Path,
        key: &FileKey,
    ) -> Result<(), EncryptorError> {
        let mut nonce = [0u8; 12];
        reader
            .read_exact(&mut nonce)
            .map_err(|_| EncryptorError::HeaderMismatch("GCM header truncated".to_string()))?;
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).map_err(EncryptorError::io_error)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        cipher
            .decrypt_in_place(Nonce::from_slice(&nonce), b"", &mut buffer)
            .map_err(|_| {
                EncryptorError::IntegrityFailure("GCM tag verification failed".to_string())
            })?;

        std::fs::write(temp, buffer).map_err(EncryptorError::io_error)
    }

    fn encrypt_cbc(&self, src: &Path, temp: &Path, key: &FileKey) -> Result<String, EncryptorError> {
        let iv = self.random_bytes::<16>()?;
        let data = std::fs::read(src).map_err(EncryptorError::io_error)?;

        let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
            .map_err(|e| EncryptorError::EncryptionError(format!("CBC init failed: {}", e)))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(&data);

        let mut output = Vec::with_capacity(3 + 16 + ciphertext.len());
        output.extend_from_slice(b"CBC");
        output.extend_from_slice(&iv);
        output.extend_from_slice(&ciphertext);
        std::fs::write(temp, output).map_err(EncryptorError::io_error)?;
        Ok(hex::encode(iv))
    }

    fn decrypt_cbc(
        &self,
        mut reader: BufReader<File>,
        temp: &Path,
        key: &FileKey,
    ) -> Result<(), EncryptorError> {
        let mut iv = [0u8; 16];
        reader
            .read_exact(&mut iv)
            .map_err(|_| EncryptorError::HeaderMismatch("CBC header truncated".to_string()))?;
        let mut ciphertext = Vec::new();
        reader
            .read_to_end(&mut ciphertext)
            .map_err(EncryptorError::io_error)?;

        let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), &iv)
            .map_err(|e| EncryptorError::EncryptionError(format!("CBC init failed: {}", e)))?;
        let plaintext = cipher.decrypt_padded_vec_mut::<Pkcs7>(&ciphertext).map_err(|_| {
            EncryptorError::IntegrityFailure("CBC padding verification failed".to_string())
        })?;

        std::fs::write(temp, plaintext).map_err(EncryptorError::io_error)
    }
}

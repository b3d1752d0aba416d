// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sidecar Manifest
//!
//! Every ciphertext file is accompanied by `<ciphertext>.meta.json`, a JSON
//! sidecar describing how to decrypt it. Whole-file outputs record their
//! mode, nonce/IV, key id, and original file name. Chunked outputs record
//! the grid parameters plus the ordered list of per-chunk HMACs - the only
//! data that must be serialized in chunk-index order.
//!
//! The manifest is the decrypt entry point: without it the chunked format
//! cannot be authenticated, so a missing sidecar is fatal.

use crate::error::EncryptorError;
use crate::value_objects::chunked_header::BaseNonce;
use crate::value_objects::cipher_mode::CipherMode;
use crate::value_objects::key_id::KeyId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// JSON sidecar written next to every ciphertext file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    pub mode: CipherMode,
    pub version: u32,
    pub key_id: KeyId,

    /// Original file name, restored on decrypt (whole-file outputs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    /// Whole-file outputs mark themselves explicitly non-chunked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunked: Option<bool>,

    /// Hex nonce for CTR/GCM whole-file outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Hex IV for CBC whole-file outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,

    /// Hex base nonce (chunked outputs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u64>,

    /// Ordered per-chunk HMAC-SHA256 tags, hex-encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_hmacs: Option<Vec<String>>,
}

/// Validated view of a chunked manifest.
#[derive(Debug, Clone)]
pub struct ChunkedParams {
    pub base_nonce: BaseNonce,
    pub chunk_size: u64,
    pub chunk_count: u64,
    pub chunk_hmacs: Vec<String>,
    pub key_id: KeyId,
}

impl FileManifest {
    /// Builds the manifest for a chunked output.
    pub fn chunked(
        base_nonce: &BaseNonce,
        chunk_size: u64,
        chunk_count: u64,
        key_id: KeyId,
        chunk_hmacs: Vec<String>,
    ) -> Self {
        Self {
            mode: CipherMode::CtrChunked,
            version: MANIFEST_VERSION,
            key_id,
            src: None,
            chunked: None,
            nonce: None,
            iv: None,
            base_nonce: Some(base_nonce.to_hex()),
            chunk_size: Some(chunk_size),
            chunk_count: Some(chunk_count),
            chunk_hmacs: Some(chunk_hmacs),
        }
    }

    /// Builds the manifest for a whole-file output. CBC records its random
    /// block under `iv`, CTR and GCM under `nonce`.
    pub fn whole(mode: CipherMode, hex_nonce: String, key_id: KeyId, src: String) -> Self {
        let (nonce, iv) = match mode {
            CipherMode::Cbc => (None, Some(hex_nonce)),
            _ => (Some(hex_nonce), None),
        };
        Self {
            mode,
            version: MANIFEST_VERSION,
            key_id,
            src: Some(src),
            chunked: Some(false),
            nonce,
            iv,
            base_nonce: None,
            chunk_size: None,
            chunk_count: None,
            chunk_hmacs: None,
        }
    }

    /// Serializes to the JSON stored on disk.
    pub fn to_json(&self) -> Result<String, EncryptorError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EncryptorError::InternalError(format!("Manifest serialization: {}", e)))
    }

    /// Parses a sidecar's JSON.
    pub fn from_json(json: &str) -> Result<Self, EncryptorError> {
        serde_json::from_str(json)
            .map_err(|e| EncryptorError::ManifestCorrupt(format!("Bad manifest JSON: {}", e)))
    }

    /// Validates a chunked manifest and extracts its grid parameters.
    ///
    /// The HMAC list length must equal the chunk count; the chunk size must
    /// be non-zero. Any violation is `ManifestCorrupt`.
    pub fn chunked_params(&self) -> Result<ChunkedParams, EncryptorError> {
        if self.mode != CipherMode::CtrChunked {
            return Err(EncryptorError::ManifestCorrupt(format!(
                "Expected CTR_CHUNKED manifest, found {}",
                self.mode
            )));
        }
        let base_nonce = self
            .base_nonce
            .as_deref()
            .ok_or_else(|| EncryptorError::ManifestCorrupt("Missing base_nonce".to_string()))
            .and_then(BaseNonce::from_hex)?;
        let chunk_size = self
            .chunk_size
            .filter(|s| *s > 0)
            .ok_or_else(|| EncryptorError::ManifestCorrupt("Missing or zero chunk_size".to_string()))?;
        let chunk_count = self
            .chunk_count
            .filter(|c| *c > 0)
            .ok_or_else(|| EncryptorError::ManifestCorrupt("Missing or zero chunk_count".to_string()))?;
        let chunk_hmacs = self
            .chunk_hmacs
            .clone()
            .ok_or_else(|| EncryptorError::ManifestCorrupt("Missing chunk_hmacs".to_string()))?;
        if chunk_hmacs.len() as u64 != chunk_count {
            return Err(EncryptorError::ManifestCorrupt(format!(
                "chunk_hmacs has {} entries but chunk_count is {}",
                chunk_hmacs.len(),
                chunk_count
            )));
        }
        Ok(ChunkedParams {
            base_nonce,
            chunk_size,
            chunk_count,
            chunk_hmacs,
            key_id: self.key_id.clone(),
        })
    }
}

/// Path of the sidecar for a ciphertext file: `<ciphertext>.meta.json`.
pub fn sidecar_path(ciphertext: &Path) -> PathBuf {
    let mut name = ciphertext.as_os_str().to_os_string();
    name.push(".meta.json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunked_manifest() -> FileManifest {
        FileManifest::chunked(
            &BaseNonce::from_bytes([3u8; 16]),
            1024 * 1024,
            4,
            KeyId::new("abc-ctr-1").unwrap(),
            vec!["aa".into(), "bb".into(), "cc".into(), "dd".into()],
        )
    }

    #[test]
    fn test_chunked_manifest_json_round_trip() {
        let manifest = chunked_manifest();
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"CTR_CHUNKED\""));
        assert!(json.contains("base_nonce"));
        assert!(!json.contains("\"iv\""));
        let parsed = FileManifest::from_json(&json).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_chunked_params_validation() {
        let params = chunked_manifest().chunked_params().unwrap();
        assert_eq!(params.chunk_count, 4);
        assert_eq!(params.chunk_hmacs.len(), 4);
        assert_eq!(params.chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_hmac_count_mismatch_is_corrupt() {
        let mut manifest = chunked_manifest();
        manifest.chunk_hmacs.as_mut().unwrap().pop();
        assert!(matches!(
            manifest.chunked_params(),
            Err(EncryptorError::ManifestCorrupt(_))
        ));
    }

    #[test]
    fn test_whole_manifest_cbc_uses_iv_field() {
        let manifest = FileManifest::whole(
            CipherMode::Cbc,
            "00ff".into(),
            KeyId::new("abc-cbc-1").unwrap(),
            "report.pdf".into(),
        );
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"iv\""));
        assert!(!json.contains("\"nonce\""));
        assert_eq!(manifest.chunked, Some(false));
    }

    #[test]
    fn test_whole_manifest_ctr_uses_nonce_field() {
        let manifest = FileManifest::whole(
            CipherMode::Ctr,
            "00ff".into(),
            KeyId::new("abc-ctr-1").unwrap(),
            "notes.txt".into(),
        );
        assert!(manifest.nonce.is_some());
        assert!(manifest.iv.is_none());
    }

    #[test]
    fn test_chunked_params_rejects_whole_manifest() {
        let manifest = FileManifest::whole(
            CipherMode::Ctr,
            "00".into(),
            KeyId::new("k").unwrap(),
            "a".into(),
        );
        assert!(manifest.chunked_params().is_err());
    }

    #[test]
    fn test_sidecar_path_appends_suffix() {
        let path = sidecar_path(Path::new("/out/a.bin.enc"));
        assert_eq!(path, PathBuf::from("/out/a.bin.enc.meta.json"));
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cipher Mode Value Object
//!
//! The cipher families the encryptor speaks. `Ctr`, `Gcm`, and `Cbc` are the
//! whole-file single-shot modes; `CtrChunked` is the parallel grid format
//! used for large files. Manifests record the mode as an uppercase tag, the
//! vault records it as a lowercase label.

use crate::error::EncryptorError;
use serde::{Deserialize, Serialize};

/// Cipher family of an encrypted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherMode {
    /// AES-256-CTR, single shot, streaming reads
    #[serde(rename = "CTR")]
    Ctr,
    /// AES-256-GCM, single shot, buffered whole with appended tag
    #[serde(rename = "GCM")]
    Gcm,
    /// AES-256-CBC with PKCS7 padding, single shot, buffered whole
    #[serde(rename = "CBC")]
    Cbc,
    /// Chunked AES-256-CTR grid format with per-chunk HMACs
    #[serde(rename = "CTR_CHUNKED")]
    CtrChunked,
}

impl CipherMode {
    /// Uppercase manifest tag (`CTR`, `GCM`, `CBC`, `CTR_CHUNKED`).
    pub fn tag(&self) -> &'static str {
        match self {
            CipherMode::Ctr => "CTR",
            CipherMode::Gcm => "GCM",
            CipherMode::Cbc => "CBC",
            CipherMode::CtrChunked => "CTR_CHUNKED",
        }
    }

    /// Lowercase vault label. The chunked format shares the `ctr` label
    /// because the file key is the same kind of key.
    pub fn label(&self) -> &'static str {
        match self {
            CipherMode::Ctr | CipherMode::CtrChunked => "ctr",
            CipherMode::Gcm => "gcm",
            CipherMode::Cbc => "cbc",
        }
    }

    /// Parses a user-facing or manifest mode string (case-insensitive).
    pub fn parse(value: &str) -> Result<Self, EncryptorError> {
        match value.to_ascii_uppercase().as_str() {
            "CTR" => Ok(CipherMode::Ctr),
            "GCM" => Ok(CipherMode::Gcm),
            "CBC" => Ok(CipherMode::Cbc),
            "CTR_CHUNKED" => Ok(CipherMode::CtrChunked),
            other => Err(EncryptorError::InvalidConfiguration(format!(
                "Unknown cipher mode '{}'",
                other
            ))),
        }
    }

    /// True for the chunked grid format.
    pub fn is_chunked(&self) -> bool {
        matches!(self, CipherMode::CtrChunked)
    }
}

impl std::fmt::Display for CipherMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

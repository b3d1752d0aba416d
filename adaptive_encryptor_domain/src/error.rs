// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Encryptor Error Types
//!
//! This module defines the single error enum used across all layers of the
//! adaptive encryptor. Every fallible operation in the domain, application,
//! and infrastructure layers returns `Result<T, EncryptorError>`.
//!
//! ## Error Categories
//!
//! - **Input**: missing files, empty master secret, bad arguments
//! - **Crypto**: wrong master secret, HMAC mismatch, AEAD tag mismatch
//! - **Format**: magic/header/manifest mismatch, length inconsistency
//! - **I/O**: read/write/rename failure, memory-map failure
//! - **Vault**: schema, timeout, record not found
//! - **Pool**: worker start failure, worker task failure
//!
//! ## Design Principles
//!
//! - **String payloads**: variants carry a human-readable description rather
//!   than wrapped source errors, so the enum stays `Clone` and serializable
//!   across worker boundaries.
//! - **Per-kind variants**: callers match on the kind, not the message. The
//!   driver maps kinds to exit codes; tests assert on kinds.

use thiserror::Error;

/// Unified error type for the adaptive encryptor.
///
/// Worker threads return this type through typed result envelopes; the
/// aggregator fuses the first failure deterministically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncryptorError {
    /// Input directory is missing, empty, or otherwise unusable
    #[error("Missing inputs: {0}")]
    MissingInputs(String),

    /// No master secret was supplied for a vault operation
    #[error("Master secret is required and cannot be empty")]
    MissingMasterSecret,

    /// Key unwrap failed - wrong master secret or corrupted record
    #[error("Vault authentication failure: {0}")]
    VaultAuthFailure(String),

    /// No vault record exists for the requested key id
    #[error("Key '{0}' not found in vault")]
    KeyNotFound(String),

    /// Vault storage failure (schema, connection, timeout)
    #[error("Vault error: {0}")]
    VaultError(String),

    /// The sidecar manifest for a ciphertext file does not exist
    #[error("Manifest missing: {0}")]
    ManifestMissing(String),

    /// The sidecar manifest exists but cannot be parsed or is inconsistent
    #[error("Manifest corrupt: {0}")]
    ManifestCorrupt(String),

    /// Ciphertext header disagrees with itself or with the manifest
    #[error("Header mismatch: {0}")]
    HeaderMismatch(String),

    /// Per-chunk HMAC or AEAD tag verification failed
    #[error("Integrity failure: {0}")]
    IntegrityFailure(String),

    /// Cipher-level failure (key size, nonce size, padding)
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    /// Filesystem failure (read, write, rename, memory map)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration value out of range or unparseable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Worker pool construction or task execution failure
    #[error("Worker pool error: {0}")]
    PoolError(String),

    /// Invariant violation that should never happen in normal operation
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl EncryptorError {
    /// Creates an `IoError` from any displayable source.
    pub fn io_error(message: impl std::fmt::Display) -> Self {
        EncryptorError::IoError(message.to_string())
    }

    /// Creates an `InternalError` from any displayable source.
    pub fn internal_error(message: impl std::fmt::Display) -> Self {
        EncryptorError::InternalError(message.to_string())
    }

    /// True when the error indicates tampering or a wrong secret rather than
    /// an environmental failure. Such errors are never retried.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            EncryptorError::VaultAuthFailure(_) | EncryptorError::IntegrityFailure(_)
        )
    }
}

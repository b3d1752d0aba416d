// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Adaptive Encryptor Domain Layer
//!
//! Pure, reusable business logic for the adaptive encryptor: value objects
//! describing the chunked ciphertext format and its sizing rules, the online
//! throughput predictor and cost-based scheduler, and the key vault port.
//!
//! ## Architecture
//!
//! This crate sits at the centre of the workspace and has no knowledge of
//! tokio, sqlx, rayon, or the filesystem. Infrastructure adapters in the
//! `adaptive-encryptor` crate implement the ports defined here.
//!
//! - `error` - the unified [`EncryptorError`] enum
//! - `value_objects` - chunk size, worker count, key id, cipher mode, file
//!   key, chunked header, manifest
//! - `services` - throughput predictor and scheduler (sync, CPU-only)
//! - `repositories` - the async `KeyVault` port

pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::EncryptorError;
pub use repositories::key_vault::{KeyVault, VaultRecord};
pub use services::scheduler::{Scheduler, SchedulingPolicy, Task};
pub use services::throughput_predictor::{SystemProfile, ThroughputPredictor};
pub use value_objects::chunk_size::ChunkSize;
pub use value_objects::chunked_header::{BaseNonce, ChunkedHeader};
pub use value_objects::cipher_mode::CipherMode;
pub use value_objects::file_key::FileKey;
pub use value_objects::key_id::KeyId;
pub use value_objects::manifest::FileManifest;
pub use value_objects::worker_count::WorkerCount;

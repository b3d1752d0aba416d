// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Windows platform implementation.
//!
//! Windows exposes no load-average equivalent, so `cpu_load` and
//! `available_memory` return `None` and the predictor falls back to its
//! flat base rate.

use super::Platform;

/// Windows implementation of the platform abstraction.
pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    fn cpu_count(&self) -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    fn cpu_load(&self) -> Option<f64> {
        None
    }

    fn available_memory(&self) -> Option<u64> {
        None
    }

    fn platform_name(&self) -> &'static str {
        "Windows"
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Adaptive Throughput Predictor
//!
//! Online per-suffix throughput estimation by exponential smoothing.
//! The predictor answers one question - "how many seconds will encrypting
//! `size` bytes of a `.bin` file take?" - and learns from every completed
//! file via [`ThroughputPredictor::observe`].
//!
//! ## Initial Rate
//!
//! At construction the base rate is estimated from system signals:
//!
//! ```text
//! base       = 10 MB/s
//! cpu_factor = max(0.5, 1 - cpu_load / 2)          in [0.5, 1.0]
//! mem_factor = min(1, available_memory / 2 GiB)    in [0.0, 1.0]
//! rate       = base * cpu_factor * (0.8 + 0.4 * mem_factor)
//! ```
//!
//! If either signal is unavailable the rate falls back to a flat 10 MB/s.
//! Suffixes never seen before inherit the base rate on first use.
//!
//! ## Smoothing
//!
//! `observe` folds a measured rate into the per-suffix estimate with factor
//! α (default 0.25): `rate <- (1-α)*rate + α*(size / max(ε, seconds))`.
//! A quarter-weight update tracks drift without letting one outlier file
//! rewrite the estimate.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Base throughput assumption: 10 MB/s.
const BASE_RATE_BPS: f64 = 10.0 * 1024.0 * 1024.0;

/// Smoothing floor for observed durations.
const EPSILON_SECONDS: f64 = 1e-6;

/// System signals sampled at predictor construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProfile {
    /// CPU utilization as a fraction in [0, 1], if measurable.
    pub cpu_load: Option<f64>,
    /// Available physical memory in bytes, if measurable.
    pub available_memory: Option<u64>,
}

/// Online per-suffix throughput estimator.
pub struct ThroughputPredictor {
    alpha: f64,
    base_rate: f64,
    rates: RwLock<HashMap<String, f64>>,
}

impl ThroughputPredictor {
    /// Default smoothing factor.
    pub const DEFAULT_ALPHA: f64 = 0.25;

    /// Creates a predictor with the default α and a system-derived base rate.
    pub fn new(profile: SystemProfile) -> Self {
        Self::with_alpha(Self::DEFAULT_ALPHA, profile)
    }

    /// Creates a predictor with an explicit smoothing factor.
    pub fn with_alpha(alpha: f64, profile: SystemProfile) -> Self {
        Self {
            alpha,
            base_rate: Self::initial_rate(profile),
            rates: RwLock::new(HashMap::new()),
        }
    }

    fn initial_rate(profile: SystemProfile) -> f64 {
        match (profile.cpu_load, profile.available_memory) {
            (Some(cpu_load), Some(available)) => {
                let cpu_factor = (1.0 - cpu_load / 2.0).max(0.5);
                let mem_factor = ((available as f64) / (2.0 * 1024.0 * 1024.0 * 1024.0)).min(1.0);
                BASE_RATE_BPS * cpu_factor * (0.8 + 0.4 * mem_factor)
            }
            _ => BASE_RATE_BPS,
        }
    }

    /// Predicted seconds to process `size` bytes of a file with `suffix`.
    pub fn predict(&self, size: u64, suffix: &str) -> f64 {
        let rate = self.rate_for(suffix);
        (size as f64) / rate.max(1.0)
    }

    /// Folds an observed duration into the per-suffix estimate.
    pub fn observe(&self, size: u64, suffix: &str, actual_seconds: f64) {
        let observed_rate = (size as f64) / actual_seconds.max(EPSILON_SECONDS);
        let mut rates = self.rates.write();
        let current = *rates.get(suffix).unwrap_or(&self.base_rate);
        rates.insert(
            suffix.to_string(),
            (1.0 - self.alpha) * current + self.alpha * observed_rate,
        );
    }

    /// Current bytes-per-second estimate for a suffix.
    pub fn rate_for(&self, suffix: &str) -> f64 {
        *self.rates.read().get(suffix).unwrap_or(&self.base_rate)
    }

    /// The system-derived base rate (unknown suffixes start here).
    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }
}

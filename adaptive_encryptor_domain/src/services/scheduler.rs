// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cost-Based Scheduler
//!
//! Orders a batch of input files by predicted encryption cost. The scheduler
//! owns the cost model, which owns the throughput predictor - a straight
//! aggregation, not a cycle.
//!
//! ## Policy
//!
//! 1. Batches totalling under 10 MiB skip prediction entirely and run
//!    shortest-job-first by raw size: for sub-batch totals the prediction
//!    overhead exceeds the work itself.
//! 2. Larger batches are ordered by ascending predicted seconds
//!    (cheapest-predicted-first). Ties keep input order.
//!
//! Completion times flow back through [`Scheduler::observe`], so ordering
//! improves over a process lifetime. State is not persisted across runs.

use crate::services::throughput_predictor::{SystemProfile, ThroughputPredictor};
use std::path::{Path, PathBuf};

/// Batches below this total size are ordered by raw size instead of
/// predicted cost.
const SJF_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Work-ordering policy selected at the driver level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingPolicy {
    /// Predicted-cost ordering through the adaptive model.
    #[default]
    Priority,
    /// Input order, no prediction.
    Fifo,
}

impl SchedulingPolicy {
    /// Parses the CLI/config spelling.
    pub fn parse(value: &str) -> Result<Self, crate::error::EncryptorError> {
        match value.to_ascii_lowercase().as_str() {
            "priority" => Ok(SchedulingPolicy::Priority),
            "fifo" => Ok(SchedulingPolicy::Fifo),
            other => Err(crate::error::EncryptorError::InvalidConfiguration(format!(
                "Unknown scheduling policy '{}' (expected 'priority' or 'fifo')",
                other
            ))),
        }
    }
}

/// A planned unit of work: one input file with its predicted priority.
/// Smaller priority runs first.
#[derive(Debug, Clone)]
pub struct Task {
    pub priority: f64,
    pub path: PathBuf,
    pub size: u64,
    pub suffix: String,
}

/// Cost model: predicts seconds-to-encrypt and accepts feedback.
struct CostModel {
    predictor: ThroughputPredictor,
}

impl CostModel {
    fn new(profile: SystemProfile) -> Self {
        Self {
            predictor: ThroughputPredictor::new(profile),
        }
    }

    fn predict_seconds(&self, size: u64, suffix: &str) -> f64 {
        self.predictor.predict(size, suffix)
    }

    fn observe(&self, size: u64, suffix: &str, actual_seconds: f64) {
        self.predictor.observe(size, suffix, actual_seconds);
    }
}

/// Stateful scheduler producing priority-ordered plans.
pub struct Scheduler {
    model: CostModel,
}

impl Scheduler {
    /// Creates a scheduler whose predictor is seeded from system signals.
    pub fn new(profile: SystemProfile) -> Self {
        Self {
            model: CostModel::new(profile),
        }
    }

    /// Produces a priority-ordered plan over `(path, size)` pairs.
    pub fn plan(&self, files: &[(PathBuf, u64)]) -> Vec<Task> {
        if files.is_empty() {
            return Vec::new();
        }

        let total: u64 = files.iter().map(|(_, size)| *size).sum();

        let mut tasks: Vec<Task> = files
            .iter()
            .map(|(path, size)| {
                let suffix = suffix_of(path);
                let priority = if total < SJF_THRESHOLD {
                    *size as f64
                } else {
                    self.model.predict_seconds(*size, &suffix)
                };
                Task {
                    priority,
                    path: path.clone(),
                    size: *size,
                    suffix,
                }
            })
            .collect();

        // Stable sort keeps input order for equal priorities.
        tasks.sort_by(|a, b| a.priority.partial_cmp(&b.priority).unwrap_or(std::cmp::Ordering::Equal));
        tasks
    }

    /// Feeds a measured completion time back into the cost model.
    pub fn observe(&self, path: &Path, size: u64, elapsed_seconds: f64) {
        self.model.observe(size, &suffix_of(path), elapsed_seconds);
    }
}

/// Lowercased file suffix including the dot (`".bin"`), or empty.
pub fn suffix_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn scheduler() -> Scheduler {
        Scheduler::new(SystemProfile::default())
    }

    #[test]
    fn test_empty_plan() {
        assert!(scheduler().plan(&[]).is_empty());
    }

    #[test]
    fn test_small_batch_uses_shortest_job_first() {
        let files = vec![
            (PathBuf::from("c.bin"), 3000),
            (PathBuf::from("a.bin"), 1000),
            (PathBuf::from("b.bin"), 2000),
        ];
        let plan = scheduler().plan(&files);
        let sizes: Vec<u64> = plan.iter().map(|t| t.size).collect();
        assert_eq!(sizes, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_large_batch_orders_by_predicted_cost() {
        let sched = scheduler();
        // Teach the model that .fast files fly and .slow files crawl.
        sched.observe(Path::new("x.fast"), 8 * MIB, 0.0001);
        sched.observe(Path::new("x.slow"), 8 * MIB, 100.0);

        let files = vec![
            (PathBuf::from("one.slow"), 8 * MIB),
            (PathBuf::from("two.fast"), 8 * MIB),
        ];
        let plan = sched.plan(&files);
        assert_eq!(plan[0].suffix, ".fast");
        assert_eq!(plan[1].suffix, ".slow");
        assert!(plan[0].priority < plan[1].priority);
    }

    #[test]
    fn test_ties_preserve_input_order() {
        let files = vec![
            (PathBuf::from("first.bin"), 20 * MIB),
            (PathBuf::from("second.bin"), 20 * MIB),
        ];
        let plan = scheduler().plan(&files);
        assert_eq!(plan[0].path, PathBuf::from("first.bin"));
        assert_eq!(plan[1].path, PathBuf::from("second.bin"));
    }

    #[test]
    fn test_mixed_directory_prediction_ordering() {
        // 5 bytes + 32 MiB totals above the gate, so predicted cost rules;
        // with one shared base rate the tiny file is still cheapest.
        let files = vec![
            (PathBuf::from("b.bin"), 32 * MIB),
            (PathBuf::from("a.txt"), 5),
        ];
        let plan = scheduler().plan(&files);
        assert_eq!(plan[0].path, PathBuf::from("a.txt"));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(SchedulingPolicy::parse("priority").unwrap(), SchedulingPolicy::Priority);
        assert_eq!(SchedulingPolicy::parse("FIFO").unwrap(), SchedulingPolicy::Fifo);
        assert!(SchedulingPolicy::parse("random").is_err());
    }

    #[test]
    fn test_suffix_extraction() {
        assert_eq!(suffix_of(Path::new("a/b/movie.MP4")), ".mp4");
        assert_eq!(suffix_of(Path::new("noext")), "");
    }
}

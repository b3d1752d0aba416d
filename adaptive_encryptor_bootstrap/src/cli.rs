// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parsing and Validation
//!
//! Parses command-line arguments with clap and validates them before any
//! enterprise code runs: input paths must exist, numeric arguments must be
//! in range, and enumerated options must come from their allowed sets. The
//! master secret is deliberately *not* an argument - it is read from the
//! environment so it never appears in shell history or process listings.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bounds accepted for `--workers`.
const WORKER_RANGE: std::ops::RangeInclusive<usize> = 1..=32;

/// Bounds accepted for `--chunk-mib`.
const CHUNK_MIB_RANGE: std::ops::RangeInclusive<u64> = 1..=512;

/// Errors produced by argument validation.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Input path does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Input path is not a directory: {}", .0.display())]
    InputNotADirectory(PathBuf),

    #[error("Workers must be between 1 and 32, got {0}")]
    WorkersOutOfRange(usize),

    #[error("Chunk size must be between 1 and 512 MiB, got {0}")]
    ChunkMibOutOfRange(u64),

    #[error("Unknown mode '{0}' (expected ctr, gcm, or cbc)")]
    UnknownMode(String),

    #[error("Unknown policy '{0}' (expected priority or fifo)")]
    UnknownPolicy(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "adaptive_encryptor",
    about = "Parallel chunked authenticated encryption with adaptive scheduling",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a directory tree into an output directory
    Encrypt {
        /// Input directory to encrypt
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Output directory for ciphertext and manifests
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Cipher mode for whole-file outputs (ctr, gcm, cbc)
        #[arg(long, default_value = "ctr")]
        mode: String,

        /// Worker count override (default: autotuned)
        #[arg(long)]
        workers: Option<usize>,

        /// Chunk size override in MiB for large files
        #[arg(long)]
        chunk_mib: Option<u64>,

        /// Work-ordering policy (priority, fifo)
        #[arg(long, default_value = "priority")]
        policy: String,
    },

    /// Decrypt a directory of .enc files
    Decrypt {
        /// Directory containing .enc files and their manifests
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Output directory for restored plaintext
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Worker count override (default: autotuned)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Benchmark chunk-size / worker-count pairs and print the winner
    Tune {
        /// Sample size in MiB for each trial
        #[arg(long, default_value_t = 16)]
        sample_mib: usize,
    },
}

/// A fully validated command, safe to hand to the application layer.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        mode: String,
        workers: Option<usize>,
        chunk_mib: Option<u64>,
        policy: String,
    },
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        workers: Option<usize>,
    },
    Tune {
        sample_mib: usize,
    },
}

/// Validated CLI arguments.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
}

/// Parses `std::env::args` and validates the result.
///
/// Clap handles `--help` and `--version` itself and exits the process.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate(Cli::parse().command)
}

fn validate(command: Command) -> Result<ValidatedCli, ParseError> {
    let command = match command {
        Command::Encrypt {
            input,
            output,
            mode,
            workers,
            chunk_mib,
            policy,
        } => {
            validate_input_dir(&input)?;
            validate_workers(workers)?;
            if let Some(mib) = chunk_mib {
                if !CHUNK_MIB_RANGE.contains(&mib) {
                    return Err(ParseError::ChunkMibOutOfRange(mib));
                }
            }
            let mode = mode.to_ascii_lowercase();
            if !matches!(mode.as_str(), "ctr" | "gcm" | "cbc") {
                return Err(ParseError::UnknownMode(mode));
            }
            let policy = policy.to_ascii_lowercase();
            if !matches!(policy.as_str(), "priority" | "fifo") {
                return Err(ParseError::UnknownPolicy(policy));
            }
            ValidatedCommand::Encrypt {
                input,
                output,
                mode,
                workers,
                chunk_mib,
                policy,
            }
        }
        Command::Decrypt {
            input,
            output,
            workers,
        } => {
            validate_input_dir(&input)?;
            validate_workers(workers)?;
            ValidatedCommand::Decrypt {
                input,
                output,
                workers,
            }
        }
        Command::Tune { sample_mib } => ValidatedCommand::Tune { sample_mib },
    };
    Ok(ValidatedCli { command })
}

fn validate_input_dir(input: &Path) -> Result<(), ParseError> {
    if !input.exists() {
        return Err(ParseError::InputMissing(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Err(ParseError::InputNotADirectory(input.to_path_buf()));
    }
    Ok(())
}

fn validate_workers(workers: Option<usize>) -> Result<(), ParseError> {
    if let Some(w) = workers {
        if !WORKER_RANGE.contains(&w) {
            return Err(ParseError::WorkersOutOfRange(w));
        }
    }
    Ok(())
}

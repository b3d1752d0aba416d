// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Binary entry point: bootstrap the CLI, wire the composition root, run
//! the selected use case, and map the outcome to an exit code.

use adaptive_encryptor::application::use_cases::{
    DecryptDirectoryUseCase, DecryptParams, EncryptDirectoryUseCase, EncryptParams, RunSummary,
    TuneSystemUseCase,
};
use adaptive_encryptor::infrastructure::config::EncryptorConfig;
use adaptive_encryptor::infrastructure::repositories::sqlite_key_vault::SqliteKeyVault;
use adaptive_encryptor::infrastructure::runtime::worker_pools::WorkerPools;
use adaptive_encryptor_bootstrap::{bootstrap_cli, create_platform, ExitCode, ValidatedCommand};
use adaptive_encryptor_domain::services::scheduler::{Scheduler, SchedulingPolicy};
use adaptive_encryptor_domain::services::throughput_predictor::SystemProfile;
use adaptive_encryptor_domain::value_objects::chunk_size::ChunkSize;
use adaptive_encryptor_domain::value_objects::cipher_mode::CipherMode;
use adaptive_encryptor_domain::value_objects::worker_count::WorkerCount;
use adaptive_encryptor_domain::EncryptorError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Argument error: {}", e);
            return ExitCode::UsageError.into();
        }
    };

    let config = match EncryptorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::ConfigError.into();
        }
    };

    match run(cli.command, config).await {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            error!("{}", e);
            classify(&e).into()
        }
    }
}

async fn run(command: ValidatedCommand, config: EncryptorConfig) -> Result<(), EncryptorError> {
    match command {
        ValidatedCommand::Encrypt {
            input,
            output,
            mode,
            workers,
            chunk_mib,
            policy,
        } => {
            let platform = create_platform();
            let scheduler = Scheduler::new(SystemProfile {
                cpu_load: platform.cpu_load(),
                available_memory: platform.available_memory(),
            });
            let pools = WorkerPools::new(resolve_workers(workers).await?);
            let vault = SqliteKeyVault::open(&config.vault_path).await?;

            let params = EncryptParams {
                input,
                output,
                mode: CipherMode::parse(&mode)?,
                policy: SchedulingPolicy::parse(&policy)?,
                chunk_override: chunk_mib.map(ChunkSize::from_mib).transpose()?,
            };
            let summary = EncryptDirectoryUseCase::new()
                .execute(&params, &config, &scheduler, &pools, &vault)
                .await?;
            report(&summary);
            println!(
                "Hand {} to the packager for {}",
                params.output.display(),
                summary.archive_path.display()
            );
            fail_if_nothing_succeeded(summary)
        }

        ValidatedCommand::Decrypt {
            input,
            output,
            workers,
        } => {
            let pools = WorkerPools::new(resolve_workers(workers).await?);
            let vault = SqliteKeyVault::open(&config.vault_path).await?;

            let params = DecryptParams { input, output };
            let summary = DecryptDirectoryUseCase::new()
                .execute(&params, &config, &pools, &vault)
                .await?;
            report(&summary);
            fail_if_nothing_succeeded(summary)
        }

        ValidatedCommand::Tune { sample_mib } => {
            let tuning = tokio::task::spawn_blocking(move || TuneSystemUseCase::new().execute(sample_mib))
                .await
                .map_err(EncryptorError::internal_error)??;

            println!("chunk_mib  workers  MB/s");
            for score in &tuning.all_scores {
                println!(
                    "{:>9}  {:>7}  {:>8.1}",
                    score.chunk_bytes / (1024 * 1024),
                    score.workers,
                    score.mbps
                );
            }
            println!(
                "Best configuration: {} MiB chunks, {} workers",
                tuning.best_chunk / (1024 * 1024),
                tuning.best_workers
            );
            Ok(())
        }
    }
}

/// Explicit worker count wins; otherwise the autotuner picks one.
async fn resolve_workers(workers: Option<usize>) -> Result<WorkerCount, EncryptorError> {
    match workers {
        Some(count) => Ok(WorkerCount::new(count)),
        None => {
            info!("No worker count given, autotuning");
            let tuning = tokio::task::spawn_blocking(|| TuneSystemUseCase::new().execute(16))
                .await
                .map_err(EncryptorError::internal_error)??;
            Ok(WorkerCount::new(tuning.best_workers))
        }
    }
}

fn report(summary: &RunSummary) {
    println!(
        "{} file(s) processed, {} failed, {:.2}s",
        summary.processed,
        summary.failed.len(),
        summary.elapsed.as_secs_f64()
    );
    for (path, error) in &summary.failed {
        eprintln!("  failed: {}: {}", path.display(), error);
    }
    for (path, error) in &summary.vault_failures {
        eprintln!("  key wrap failed (ciphertext kept): {}: {}", path.display(), error);
    }
}

/// Per-file failures are isolated, but a run where nothing succeeded is an
/// error in its own right.
fn fail_if_nothing_succeeded(summary: RunSummary) -> Result<(), EncryptorError> {
    if summary.processed == 0 {
        if let Some((_, error)) = summary.failed.into_iter().next() {
            return Err(error);
        }
    }
    Ok(())
}

fn classify(error: &EncryptorError) -> ExitCode {
    match error {
        EncryptorError::MissingInputs(_) => ExitCode::NoInput,
        EncryptorError::MissingMasterSecret | EncryptorError::InvalidConfiguration(_) => {
            ExitCode::ConfigError
        }
        EncryptorError::VaultAuthFailure(_) => ExitCode::PermissionError,
        EncryptorError::IntegrityFailure(_)
        | EncryptorError::ManifestMissing(_)
        | EncryptorError::ManifestCorrupt(_)
        | EncryptorError::HeaderMismatch(_)
        | EncryptorError::KeyNotFound(_)
        | EncryptorError::EncryptionError(_) => ExitCode::DataError,
        EncryptorError::IoError(_) => ExitCode::IoError,
        EncryptorError::VaultError(_)
        | EncryptorError::PoolError(_)
        | EncryptorError::InternalError(_) => ExitCode::GeneralError,
    }
}

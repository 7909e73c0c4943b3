//! Batch replay of transfers from CSV
//!
//! Opens the accounts listed in a seeds file, runs every row of a transfers
//! file through the engine and writes the final balances as CSV.
//!
//! # Architecture
//!
//! ```text
//! replay
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── read_account_seeds (sync CSV, opened up front)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (account partitioning + tokio tasks)
//!     └── TransferEngine
//! ```
//!
//! Batches run one after another, so an account's transfers are decided in
//! file order even when they span batches. Within a batch, accounts run in
//! parallel on a multi-threaded runtime with `max_concurrent` workers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::WalletConfig;
use crate::core::{spawn_event_logger, BatchProcessor};
use crate::io::{read_account_seeds, write_accounts_csv, AsyncReader};
use crate::types::{TransferReceipt, WalletError};
use crate::wallet::Wallet;

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of transfers per batch
    pub batch_size: usize,
    /// Worker threads of the replay runtime
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            tracing::warn!(
                max_concurrent,
                default = default.max_concurrent,
                "invalid concurrency, using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Input files and batching of one replay
#[derive(Clone, Debug)]
pub struct ReplayOptions {
    pub accounts: PathBuf,
    pub transfers: PathBuf,
    pub batch: BatchConfig,
}

/// Counters of a finished replay
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Accounts opened from the seeds file
    pub accounts: usize,
    /// Transfers that completed
    pub succeeded: u64,
    /// Transfers rejected before their funds moved, or whose mutation timed out
    pub failed: u64,
    /// Transfers whose funds moved but whose record or event went missing
    pub committed: u64,
    /// Rows that could not be parsed
    pub skipped: u64,
}

impl ReplaySummary {
    /// Count one engine outcome
    pub fn record(&mut self, result: &Result<TransferReceipt, WalletError>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(e) if e.is_committed() => self.committed += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Run a replay on its own multi-threaded runtime
///
/// Fatal errors (unreadable files, bad seeds, output failures) are returned;
/// per-transfer failures are logged and counted.
pub fn replay(
    config: &WalletConfig,
    options: &ReplayOptions,
    output: &mut dyn Write,
) -> Result<ReplaySummary, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(options.batch.max_concurrent)
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

    runtime.block_on(run_replay(config, options, output))
}

async fn run_replay(
    config: &WalletConfig,
    options: &ReplayOptions,
    output: &mut dyn Write,
) -> Result<ReplaySummary, String> {
    let (wallet, events) = Wallet::in_memory(config).map_err(|e| e.to_string())?;
    let event_logger = spawn_event_logger(events);
    let mut summary = ReplaySummary::default();

    summary.accounts = seed_accounts(&wallet, &options.accounts)?;

    let file = tokio::fs::File::open(&options.transfers)
        .await
        .map_err(|e| format!("Failed to open file '{}': {}", options.transfers.display(), e))?;
    let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
    let mut reader = AsyncReader::new(compat_file);

    let processor = BatchProcessor::new(wallet.engine.clone());

    loop {
        let batch = reader.read_batch(options.batch.batch_size).await;
        if batch.is_empty() {
            break;
        }

        for processed in processor.process_batch(batch).await {
            summary.record(&processed.result);
            if let Err(e) = &processed.result {
                if e.is_committed() {
                    tracing::error!(
                        account = %processed.request.account_id,
                        amount = %processed.request.amount,
                        currency = %processed.request.currency,
                        code = e.code(),
                        transaction_id = e.transaction_id().unwrap_or_default(),
                        error = %e,
                        "replayed transfer committed but not confirmed"
                    );
                } else {
                    tracing::warn!(
                        account = %processed.request.account_id,
                        amount = %processed.request.amount,
                        currency = %processed.request.currency,
                        code = e.code(),
                        error = %e,
                        "replayed transfer failed"
                    );
                }
            }
        }
    }
    summary.skipped = reader.skipped();

    write_accounts_csv(
        &wallet.accounts.all_accounts(),
        wallet.accounts.currencies(),
        output,
    )?;

    // Release every bus sender so the logger can finish.
    drop(processor);
    drop(wallet);
    match tokio::time::timeout(Duration::from_secs(5), event_logger).await {
        Ok(Ok(delivered)) => tracing::debug!(delivered, "event logger stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "event logger panicked"),
        Err(_) => tracing::warn!("event logger did not stop in time"),
    }

    tracing::info!(
        accounts = summary.accounts,
        succeeded = summary.succeeded,
        failed = summary.failed,
        committed = summary.committed,
        skipped = summary.skipped,
        "replay finished"
    );
    Ok(summary)
}

fn seed_accounts(wallet: &Wallet, path: &Path) -> Result<usize, String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;
    let seeds = read_account_seeds(file)
        .map_err(|e| format!("Failed to read seeds '{}': {}", path.display(), e))?;

    for seed in &seeds {
        wallet
            .accounts
            .open_account(
                &seed.account_id,
                seed.balances
                    .iter()
                    .map(|(code, balance)| (code.as_str(), *balance)),
            )
            .map_err(|e| format!("Failed to open account '{}': {}", seed.account_id, e))?;
    }

    Ok(seeds.len())
}

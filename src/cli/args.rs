use crate::replay::BatchConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Move funds from external currency balances into the internal balance
#[derive(Parser, Debug)]
#[command(name = "wallet-transfer-engine")]
#[command(about = "Wallet transfer engine: HTTP gateway and CSV replay", long_about = None)]
pub struct CliArgs {
    /// Configuration file (TOML); WALLET__* environment variables override it
    #[arg(long = "config", value_name = "FILE", global = true, env = "WALLET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long = "log-level", value_name = "LEVEL", global = true, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP gateway
    Serve {
        /// Listen address, overrides server.bind from the configuration
        #[arg(long = "bind", value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Replay transfers from CSV and print final balances to stdout
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Seeds CSV: account,<CODE>...
    #[arg(long = "accounts", value_name = "FILE")]
    pub accounts: PathBuf,

    /// Transfers CSV: account,amount,currency
    #[arg(long = "transfers", value_name = "FILE")]
    pub transfers: PathBuf,

    /// Number of transfers per batch
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of transfers per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads of the replay runtime
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads processing accounts in parallel (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,
}

impl ReplayArgs {
    /// Batch configuration from the flags, defaults for anything not given
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }
}

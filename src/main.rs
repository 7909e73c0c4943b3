//! Wallet transfer engine CLI
//!
//! # Usage
//!
//! ```bash
//! cargo run -- serve --bind 127.0.0.1:8080
//! cargo run -- --config wallet.toml serve
//! cargo run -- replay --accounts seeds.csv --transfers transfers.csv > balances.csv
//! cargo run -- --log-json replay --accounts seeds.csv --transfers transfers.csv --batch-size 2000 --max-concurrent 8
//! ```
//!
//! Logs go to stderr; `replay` prints the final balances CSV to stdout.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (bad configuration, unreadable input, bind failure, etc.)

use std::process;

use wallet_transfer_engine::cli::{self, Command};
use wallet_transfer_engine::config::WalletConfig;
use wallet_transfer_engine::logging::init_logging;
use wallet_transfer_engine::replay::{replay, ReplayOptions};
use wallet_transfer_engine::server;

fn main() {
    let args = cli::parse_args();

    if let Err(e) = init_logging(&args.log_level, args.log_json) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args) {
        tracing::error!(error = %e, "fatal error");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: cli::CliArgs) -> Result<(), String> {
    let mut config = WalletConfig::load(args.config.as_deref()).map_err(|e| e.to_string())?;

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;
            runtime.block_on(server::serve(&config))
        }
        Command::Replay(replay_args) => {
            let options = ReplayOptions {
                accounts: replay_args.accounts.clone(),
                transfers: replay_args.transfers.clone(),
                batch: replay_args.to_batch_config(),
            };

            let mut output = std::io::stdout();
            replay(&config, &options, &mut output).map(|_| ())
        }
    }
}

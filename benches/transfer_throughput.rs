//! Transfer throughput benchmarks
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! - `sequential_transfers`: one account, transfers one after another
//! - `concurrent_transfers`: 16 accounts, one tokio task per account

use rust_decimal::Decimal;
use tokio::sync::mpsc::Receiver;
use wallet_transfer_engine::core::spawn_event_logger;
use wallet_transfer_engine::types::TransferEvent;
use wallet_transfer_engine::{TransferRequest, Wallet, WalletConfig};

fn main() {
    divan::main();
}

const ACCOUNTS: usize = 16;

/// Wallet with `accounts` accounts funded for `transfers` transfers of 100 RUB each
///
/// The bus holds every event, so the receiver only has to stay alive.
fn funded_wallet(accounts: usize, transfers: usize) -> (Wallet, Receiver<TransferEvent>) {
    let mut config = WalletConfig::default();
    config.bus_capacity = transfers.max(1);
    let (wallet, events) = Wallet::in_memory(&config).expect("Invalid configuration");

    let balance = Decimal::from(transfers as u64 * 100);
    for i in 0..accounts {
        wallet
            .accounts
            .open_account(&format!("acct-{}", i), [("RUB", balance)])
            .expect("Failed to open account");
    }
    (wallet, events)
}

#[divan::bench(args = [100, 1000, 10_000])]
fn sequential_transfers(bencher: divan::Bencher, transfers: usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create runtime");

    bencher
        .with_inputs(|| funded_wallet(1, transfers))
        .bench_local_values(|(wallet, _events)| {
            runtime.block_on(async {
                for _ in 0..transfers {
                    wallet
                        .engine
                        .transfer(TransferRequest::new("acct-0", Decimal::new(100, 0), "RUB"))
                        .await
                        .expect("Transfer failed");
                }
            })
        });
}

#[divan::bench(args = [100, 1000, 10_000])]
fn concurrent_transfers(bencher: divan::Bencher, transfers: usize) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create runtime");
    let per_account = transfers / ACCOUNTS;

    bencher
        .with_inputs(|| funded_wallet(ACCOUNTS, transfers))
        .bench_local_values(|(wallet, _events)| {
            runtime.block_on(async {
                let tasks: Vec<_> = (0..ACCOUNTS)
                    .map(|i| {
                        let engine = wallet.engine.clone();
                        tokio::spawn(async move {
                            let account = format!("acct-{}", i);
                            for _ in 0..per_account {
                                engine
                                    .transfer(TransferRequest::new(
                                        account.as_str(),
                                        Decimal::new(100, 0),
                                        "RUB",
                                    ))
                                    .await
                                    .expect("Transfer failed");
                            }
                        })
                    })
                    .collect();

                for task in tasks {
                    task.await.expect("Task panicked");
                }
            })
        });
}

#[divan::bench]
fn event_logging_overhead(bencher: divan::Bencher) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create runtime");

    bencher.bench_local(|| {
        runtime.block_on(async {
            let config = WalletConfig::default();
            let (wallet, events) = Wallet::in_memory(&config).expect("Invalid configuration");
            let logger = spawn_event_logger(events);
            wallet
                .accounts
                .open_account("acct-0", [("RUB", Decimal::new(100_000, 0))])
                .expect("Failed to open account");

            for _ in 0..100 {
                wallet
                    .engine
                    .transfer(TransferRequest::new("acct-0", Decimal::new(100, 0), "RUB"))
                    .await
                    .expect("Transfer failed");
            }

            drop(wallet);
            logger.await.expect("Logger panicked")
        })
    });
}

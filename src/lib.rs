//! Wallet Transfer Engine Library
//! # Overview
//!
//! Moves funds from an account's external currency balances into its single
//! internal balance, converting at static rates into the settlement currency.
//! Served over HTTP or replayed in bulk from CSV.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, TransactionRecord, WalletError, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::converter`] - Conversion into settlement units
//!   - [`core::account_store`] - Per-account atomic balance state
//!   - [`core::transaction_log`] - Append-only transfer records
//!   - [`core::notification_bus`] - Best-effort transfer events
//!   - [`core::engine`] - Transfer orchestration
//!   - [`core::batch_processor`] - Account-partitioned batch execution
//! - [`config`] - Configuration loading and validation
//! - [`logging`] - Tracing subscriber setup
//! - [`wallet`] - In-memory wiring of the components
//! - [`server`] - HTTP gateway
//! - [`replay`] - CSV replay runner
//! - [`io`] - CSV input and output
//! - [`cli`] - CLI arguments parsing
//!
//! # Transfer lifecycle
//!
//! 1. **Validate**: fields present, amount positive, currency supported,
//!    converted amount at or above the minimum. No store is touched.
//! 2. **Fetch & Check**: the account must exist.
//! 3. **Mutate**: debit external, credit internal, atomically per account.
//! 4. **Persist**: append a `completed` record.
//! 5. **Notify**: publish a transfer event.
//!
//! A failure in steps 4 or 5 does not undo step 3. Such errors carry the
//! transaction id (see [`types::WalletError::is_committed`]).

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod server;
pub mod types;
pub mod wallet;

pub use crate::config::WalletConfig;
pub use crate::core::{EngineSettings, TransferEngine};
pub use crate::wallet::Wallet;
pub use types::{
    Account, CurrencyRateTable, TransactionId, TransactionRecord, TransactionStatus,
    TransferReceipt, TransferRequest, WalletError,
};

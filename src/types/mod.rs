//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account balances
//! - `currency`: Currency codes and the rate table
//! - `transaction`: Transfer requests, records and events
//! - `error`: Error types for the wallet

pub mod account;
pub mod currency;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountId, BalanceUpdate};
pub use currency::{normalize_code, CurrencyCode, CurrencyRateTable};
pub use error::{ConfigError, ErrorKind, WalletError};
pub use transaction::{
    TransactionId, TransactionRecord, TransactionStatus, TransferEvent, TransferReceipt,
    TransferRequest,
};

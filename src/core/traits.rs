//! Core traits for the stores the transfer engine coordinates
//!
//! The engine depends only on these traits, so in-memory implementations and
//! database- or broker-backed ones are interchangeable. Every method is async
//! because real backends do I/O; the engine bounds each call with a timeout.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{
    Account, BalanceUpdate, TransactionId, TransactionRecord, TransferEvent, WalletError,
};

/// Per-account balances with atomic read-modify-write
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Current balances of an account
    ///
    /// Fails with `AccountNotFound` if the account does not exist.
    async fn get_balances(&self, account_id: &str) -> Result<Account, WalletError>;

    /// Debit `debit` from the `currency` balance and credit `credit` to the
    /// internal balance, atomically
    ///
    /// Concurrent calls for the same account are serialized. Fails with
    /// `InsufficientFunds` when `debit` exceeds the external balance; a failed
    /// call leaves the account untouched.
    async fn apply_transfer(
        &self,
        account_id: &str,
        currency: &str,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<BalanceUpdate, WalletError>;
}

/// Append-only store of transaction records
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Append a record
    ///
    /// Failures surface as `LogWriteFailed`, or `DuplicateTransactionId` when
    /// the backend enforces identifier uniqueness. Never retried here.
    async fn append(&self, record: TransactionRecord) -> Result<(), WalletError>;

    /// Up to `limit` records of an account, newest first
    async fn list_by_account(
        &self,
        account_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, WalletError>;

    /// Look a record up by identifier
    async fn get(&self, id: &TransactionId) -> Result<Option<TransactionRecord>, WalletError>;
}

/// Best-effort, at-most-once channel for transfer announcements
#[async_trait]
pub trait NotificationBus: Send + Sync {
    /// Publish an event; fails with `PublishFailed`
    async fn publish(&self, event: TransferEvent) -> Result<(), WalletError>;
}

//! Transaction-related types for the wallet
//!
//! This module defines the transfer request accepted by the engine, the
//! immutable record written to the transaction log, and the event published
//! once a transfer completes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::AccountId;
use super::currency::CurrencyCode;

/// Unique label of one transfer's log record
///
/// A 128-bit MD5 digest over the account id, the settlement amount, the
/// wall-clock time in nanoseconds and a random 64-bit nonce, rendered as 32
/// lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Derive a fresh identifier for a transfer on `account`
    pub fn generate(account: &str, settlement_amount: Decimal, at: DateTime<Utc>) -> Self {
        let nanos = at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| at.timestamp_micros());
        let nonce: u64 = rand::random();
        let material = format!("{}{}{}{}", account, settlement_amount, nanos, nonce);

        Self(format!("{:x}", md5::compute(material.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Outcome stored with a transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Balances moved and the record was written
    Completed,
    /// The transfer was recorded as failed
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Completed => f.write_str("completed"),
            TransactionStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Immutable transaction log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Unique identifier
    pub id: TransactionId,

    /// Account the transfer was applied to
    pub account_id: AccountId,

    /// Amount requested, in the source currency
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Source currency code
    pub currency: CurrencyCode,

    /// Amount credited to the internal balance, in settlement units
    #[serde(with = "rust_decimal::serde::float")]
    pub settlement_amount: Decimal,

    pub status: TransactionStatus,

    pub created_at: DateTime<Utc>,
}

/// Transfer input: move `amount` of `currency` into the internal balance
///
/// Not persisted. Field presence is checked by the engine; an empty
/// `account_id` or `currency` is reported as a missing field.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl TransferRequest {
    pub fn new(account_id: impl Into<AccountId>, amount: Decimal, currency: &str) -> Self {
        Self {
            account_id: account_id.into(),
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub transaction_id: TransactionId,
    /// External balance of the debited currency after the transfer
    pub new_external_balance: Decimal,
    /// Internal balance after the transfer
    pub new_internal_balance: Decimal,
    /// Amount credited, in settlement units
    pub settlement_amount: Decimal,
}

/// Notification announcing a completed transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: CurrencyCode,
    #[serde(with = "rust_decimal::serde::float")]
    pub settlement_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&TransactionRecord> for TransferEvent {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            transaction_id: record.id.clone(),
            account_id: record.account_id.clone(),
            amount: record.amount,
            currency: record.currency.clone(),
            settlement_amount: record.settlement_amount,
            created_at: record.created_at,
        }
    }
}

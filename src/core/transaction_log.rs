//! Thread-safe in-memory transaction log
//!
//! Records are keyed by transaction id in a `DashMap`, with a per-account
//! index of ids in append order for history queries. The log never mutates or
//! removes a record once inserted.
//!
//! Identifier uniqueness is enforced at insert: a second record with an
//! existing id is rejected with `DuplicateTransactionId` and the first one is
//! kept.

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::TransactionLog;
use crate::types::{AccountId, TransactionId, TransactionRecord, WalletError};

/// In-memory append-only transaction log
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    /// Records by id
    records: DashMap<TransactionId, TransactionRecord>,

    /// Ids of each account's records, oldest first
    by_account: DashMap<AccountId, Vec<TransactionId>>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, record: TransactionRecord) -> Result<(), WalletError> {
        let id = record.id.clone();
        let account_id = record.account_id.clone();

        let mut inserted = false;
        self.records.entry(id.clone()).or_insert_with(|| {
            inserted = true;
            record
        });

        if !inserted {
            return Err(WalletError::duplicate_transaction_id(id.as_str()));
        }

        self.by_account.entry(account_id).or_default().push(id);
        Ok(())
    }

    async fn list_by_account(
        &self,
        account_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let ids = match self.by_account.get(account_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(Vec::new()),
        };

        // Newest append first; the stable sort then keeps that order for
        // records sharing a timestamp.
        let mut records: Vec<TransactionRecord> = ids
            .iter()
            .rev()
            .filter_map(|id| self.records.get(id).map(|entry| entry.value().clone()))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);

        Ok(records)
    }

    async fn get(&self, id: &TransactionId) -> Result<Option<TransactionRecord>, WalletError> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }
}

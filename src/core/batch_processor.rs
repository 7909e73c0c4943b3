//! Batch processing with account-based partitioning
//!
//! `BatchProcessor` runs a batch of transfer requests through a
//! [`TransferEngine`]. The batch is partitioned by account id: each account's
//! requests run sequentially in input order on one tokio task, while
//! different accounts proceed in parallel.
//!
//! Per-account ordering matters for replays: two debits against the same
//! balance must be decided in the order they were submitted, otherwise which
//! one hits `InsufficientFunds` would depend on scheduling.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── TransferEngine  (shared, cloneable)
//! ```

use std::collections::HashMap;

use super::engine::TransferEngine;
use crate::types::{AccountId, TransferReceipt, TransferRequest, WalletError};

/// Result of processing a single request
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The request that was processed
    pub request: TransferRequest,

    /// Outcome of the transfer
    pub result: Result<TransferReceipt, WalletError>,
}

/// Batch processor with account-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: TransferEngine,
}

impl BatchProcessor {
    pub fn new(engine: TransferEngine) -> Self {
        Self { engine }
    }

    /// Partition a batch into per-account sub-batches
    ///
    /// Each request lands in exactly one sub-batch and every sub-batch keeps
    /// the relative order of its requests. Ids are compared after
    /// trimming, the same way the engine resolves them.
    pub fn partition_by_account(
        &self,
        batch: Vec<TransferRequest>,
    ) -> HashMap<AccountId, Vec<TransferRequest>> {
        let mut account_batches: HashMap<AccountId, Vec<TransferRequest>> = HashMap::new();

        for request in batch {
            account_batches
                .entry(request.account_id.trim().to_string())
                .or_default()
                .push(request);
        }

        account_batches
    }

    /// Process one account's requests sequentially
    ///
    /// Failures are captured in the results and do not stop the sequence.
    pub async fn process_account_transfers(
        &self,
        requests: Vec<TransferRequest>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let result = self.engine.transfer(request.clone()).await;
            results.push(ProcessingResult { request, result });
        }

        results
    }

    /// Process a batch, one task per account
    ///
    /// Results of different accounts may interleave in any order.
    pub async fn process_batch(&self, batch: Vec<TransferRequest>) -> Vec<ProcessingResult> {
        let account_batches = self.partition_by_account(batch);

        let mut tasks = Vec::with_capacity(account_batches.len());
        for (_account_id, requests) in account_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_account_transfers(requests).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(account_results) => results.extend(account_results),
                Err(e) => tracing::error!(error = %e, "account task panicked"),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ChannelNotificationBus, EngineSettings, InMemoryAccountStore, InMemoryTransactionLog,
    };
    use crate::types::CurrencyRateTable;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn rates() -> CurrencyRateTable {
        CurrencyRateTable::new("RUB", [("RUB", Decimal::ONE), ("USD", Decimal::new(100, 0))])
            .unwrap()
    }

    fn processor(store: Arc<InMemoryAccountStore>) -> BatchProcessor {
        let (bus, receiver) = ChannelNotificationBus::new(1024);
        // Keep events flowing so the bus never fills up.
        crate::core::spawn_event_logger(receiver);

        let engine = TransferEngine::new(
            EngineSettings::new(rates(), Decimal::new(100, 0)),
            store,
            Arc::new(InMemoryTransactionLog::new()),
            Arc::new(bus),
        );
        BatchProcessor::new(engine)
    }

    fn request(account: &str, amount: i64, currency: &str) -> TransferRequest {
        TransferRequest::new(account, Decimal::new(amount, 0), currency)
    }

    #[tokio::test]
    async fn test_partition_keeps_order_per_account() {
        let store = Arc::new(InMemoryAccountStore::new(&rates()));
        let processor = processor(store);

        let batch = vec![
            request("alice", 1, "USD"),
            request("bob", 2, "USD"),
            request(" alice ", 3, "USD"),
            request("bob", 4, "USD"),
        ];

        let partitions = processor.partition_by_account(batch);

        assert_eq!(partitions.len(), 2);
        let alice: Vec<_> = partitions["alice"].iter().map(|r| r.amount).collect();
        assert_eq!(alice, vec![Decimal::new(1, 0), Decimal::new(3, 0)]);
        let bob: Vec<_> = partitions["bob"].iter().map(|r| r.amount).collect();
        assert_eq!(bob, vec![Decimal::new(2, 0), Decimal::new(4, 0)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_decides_debits_in_submission_order() {
        let store = Arc::new(InMemoryAccountStore::new(&rates()));
        store
            .open_account("alice", [("USD", Decimal::new(5, 0))])
            .unwrap();
        store
            .open_account("bob", [("RUB", Decimal::new(500, 0))])
            .unwrap();
        let processor = processor(Arc::clone(&store));

        let batch = vec![
            request("alice", 3, "USD"),
            request("bob", 200, "RUB"),
            request("alice", 3, "USD"),
            request("alice", 2, "USD"),
            request("ghost", 200, "RUB"),
        ];

        let results = processor.process_batch(batch).await;
        assert_eq!(results.len(), 5);

        let alice: Vec<bool> = results
            .iter()
            .filter(|r| r.request.account_id == "alice")
            .map(|r| r.result.is_ok())
            .collect();
        assert_eq!(alice, vec![true, false, true]);

        let ghost = results
            .iter()
            .find(|r| r.request.account_id == "ghost")
            .unwrap();
        assert_eq!(
            ghost.result,
            Err(WalletError::account_not_found("ghost"))
        );

        let account = store.all_accounts();
        let alice = account.iter().find(|a| a.id == "alice").unwrap();
        assert_eq!(alice.external_balance("USD"), Decimal::ZERO);
        assert_eq!(alice.internal, Decimal::new(500, 0));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = Arc::new(InMemoryAccountStore::new(&rates()));
        let processor = processor(store);

        assert!(processor.process_batch(Vec::new()).await.is_empty());
    }
}

//! Transfer orchestration
//!
//! `TransferEngine` moves funds from one external-currency balance of an
//! account into its internal balance. Each attempt runs through strictly
//! ordered steps with no loops back:
//!
//! ```text
//! Validate ─▶ Fetch & Check ─▶ Mutate ─▶ Persist ─▶ Notify ─▶ Success
//!    │              │            │          │          │
//!    ▼              ▼            ▼          ▼          ▼
//! rejected      not found   insufficient  LogWrite   Publish
//!               (nothing happened)        Failed     Failed
//!                                │      (funds already moved)
//!                                ▼
//!                          OutcomeUnknown
//!                        (mutation timed out)
//! ```
//!
//! Validation touches no store. The account lock is only held inside
//! [`AccountStore::apply_transfer`]; persisting and notifying run without it.
//! Failures after the mutation are not rolled back: they are reported with
//! the transaction id so the caller can reconcile through
//! [`TransferEngine::reconcile`] instead of retrying.
//!
//! # Architecture
//!
//! ```text
//! TransferEngine
//!     ├── Arc<EngineSettings>          (rates, minimum, timeouts)
//!     ├── Arc<dyn AccountStore>        (per-account atomic balances)
//!     ├── Arc<dyn TransactionLog>      (append-only records)
//!     └── Arc<dyn NotificationBus>     (best-effort events)
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;

use super::converter::convert;
use super::traits::{AccountStore, NotificationBus, TransactionLog};
use crate::types::{
    normalize_code, Account, CurrencyCode, CurrencyRateTable, ErrorKind, TransactionId,
    TransactionRecord, TransactionStatus, TransferEvent, TransferReceipt, TransferRequest,
    WalletError,
};

/// Process-wide engine parameters, fixed at startup
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Conversion rates into the settlement currency
    pub rates: CurrencyRateTable,

    /// Smallest accepted transfer, in settlement units
    pub minimum_transfer: Decimal,

    /// Bound on every account store and transaction log call
    pub store_timeout: Duration,

    /// Bound on every notification bus call
    pub bus_timeout: Duration,

    /// How many identifiers to try when the log reports a duplicate
    pub id_attempts: u32,
}

impl EngineSettings {
    /// Settings with default timeouts (2s store, 1s bus) and 3 id attempts
    pub fn new(rates: CurrencyRateTable, minimum_transfer: Decimal) -> Self {
        Self {
            rates,
            minimum_transfer,
            store_timeout: Duration::from_millis(2000),
            bus_timeout: Duration::from_millis(1000),
            id_attempts: 3,
        }
    }
}

/// A request that passed validation
struct ValidatedTransfer<'a> {
    account_id: &'a str,
    amount: Decimal,
    currency: CurrencyCode,
    settlement_amount: Decimal,
}

/// Transfer orchestrator
///
/// Cheap to clone; clones share the same stores.
#[derive(Clone)]
pub struct TransferEngine {
    settings: Arc<EngineSettings>,
    accounts: Arc<dyn AccountStore>,
    log: Arc<dyn TransactionLog>,
    bus: Arc<dyn NotificationBus>,
}

impl fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TransferEngine {
    pub fn new(
        settings: EngineSettings,
        accounts: Arc<dyn AccountStore>,
        log: Arc<dyn TransactionLog>,
        bus: Arc<dyn NotificationBus>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            accounts,
            log,
            bus,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Execute one transfer attempt
    ///
    /// # Returns
    ///
    /// * `Ok(TransferReceipt)` - balances moved, record written, event published
    /// * `Err(MissingField | InvalidAmount | UnsupportedCurrency | BelowMinimum
    ///   | PrecisionExceeded | ArithmeticOverflow)` - rejected before any store access
    /// * `Err(AccountNotFound)` - no such account, nothing changed
    /// * `Err(InsufficientFunds)` - nothing changed
    /// * `Err(Timeout | StoreUnavailable)` - a pre-mutation store call failed
    /// * `Err(OutcomeUnknown)` - `apply_transfer` did not answer in time; the
    ///   debit may or may not have landed
    /// * `Err(LogWriteFailed)` - balances moved, the record is missing
    /// * `Err(PublishFailed)` - balances moved and the record exists, no event
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, WalletError> {
        let result = self.execute(&request).await;

        match &result {
            Ok(receipt) => tracing::info!(
                account = %request.account_id,
                currency = %request.currency,
                amount = %request.amount,
                settlement_amount = %receipt.settlement_amount,
                transaction_id = %receipt.transaction_id,
                "transfer completed"
            ),
            Err(e) if e.is_committed() || e.kind() == ErrorKind::Indeterminate => tracing::error!(
                account = %request.account_id,
                currency = %request.currency,
                amount = %request.amount,
                code = e.code(),
                error = %e,
                "transfer committed but not confirmed"
            ),
            Err(e) => tracing::warn!(
                account = %request.account_id,
                currency = %request.currency,
                amount = %request.amount,
                code = e.code(),
                error = %e,
                "transfer rejected"
            ),
        }

        result
    }

    async fn execute(&self, request: &TransferRequest) -> Result<TransferReceipt, WalletError> {
        // 1. Validate
        let transfer = self.validate(request)?;

        // 2. Fetch & Check
        let account = self
            .bounded(
                "get_balances",
                self.settings.store_timeout,
                self.accounts.get_balances(transfer.account_id),
            )
            .await?;
        tracing::debug!(
            account = %account.id,
            available = %account.external_balance(&transfer.currency),
            "balances loaded"
        );

        // 3. Mutate
        // A cut-off mutation may still land in a remote store.
        let update = self
            .bounded(
                "apply_transfer",
                self.settings.store_timeout,
                self.accounts.apply_transfer(
                    transfer.account_id,
                    &transfer.currency,
                    transfer.amount,
                    transfer.settlement_amount,
                ),
            )
            .await
            .map_err(|e| match e {
                WalletError::Timeout { operation, millis } => WalletError::OutcomeUnknown {
                    operation,
                    millis,
                },
                other => other,
            })?;

        // 4. Persist
        let record = self.persist(&transfer).await?;

        // 5. Notify
        self.notify(&record).await?;

        // 6. Success
        Ok(TransferReceipt {
            transaction_id: record.id,
            new_external_balance: update.external,
            new_internal_balance: update.internal,
            settlement_amount: transfer.settlement_amount,
        })
    }

    fn validate<'a>(&self, request: &'a TransferRequest) -> Result<ValidatedTransfer<'a>, WalletError> {
        let account_id = request.account_id.trim();
        if account_id.is_empty() {
            return Err(WalletError::missing_field("accountId"));
        }

        let currency = normalize_code(&request.currency);
        if currency.is_empty() {
            return Err(WalletError::missing_field("currency"));
        }

        if request.amount <= Decimal::ZERO {
            return Err(WalletError::invalid_amount(request.amount));
        }

        let settlement_amount = convert(&self.settings.rates, request.amount, &currency)?;
        if settlement_amount < self.settings.minimum_transfer {
            return Err(WalletError::below_minimum(
                settlement_amount,
                self.settings.minimum_transfer,
            ));
        }

        Ok(ValidatedTransfer {
            account_id,
            amount: request.amount,
            currency,
            settlement_amount,
        })
    }

    /// Append the `completed` record, retrying with a fresh id on collision
    async fn persist(&self, transfer: &ValidatedTransfer<'_>) -> Result<TransactionRecord, WalletError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let created_at = Utc::now();
            let record = TransactionRecord {
                id: TransactionId::generate(
                    transfer.account_id,
                    transfer.settlement_amount,
                    created_at,
                ),
                account_id: transfer.account_id.to_string(),
                amount: transfer.amount,
                currency: transfer.currency.clone(),
                settlement_amount: transfer.settlement_amount,
                status: TransactionStatus::Completed,
                created_at,
            };

            let appended = self
                .bounded(
                    "append",
                    self.settings.store_timeout,
                    self.log.append(record.clone()),
                )
                .await;

            match appended {
                Ok(()) => return Ok(record),
                Err(WalletError::DuplicateTransactionId { .. })
                    if attempt < self.settings.id_attempts =>
                {
                    tracing::warn!(
                        transaction_id = %record.id,
                        attempt,
                        "transaction id collision, retrying with a new id"
                    );
                }
                Err(e @ WalletError::LogWriteFailed { .. }) => return Err(e),
                Err(e) => return Err(WalletError::log_write_failed(record.id.as_str(), e)),
            }
        }
    }

    async fn notify(&self, record: &TransactionRecord) -> Result<(), WalletError> {
        let published = self
            .bounded(
                "publish",
                self.settings.bus_timeout,
                self.bus.publish(TransferEvent::from(record)),
            )
            .await;

        match published {
            Ok(()) => Ok(()),
            Err(e @ WalletError::PublishFailed { .. }) => Err(e),
            Err(e) => Err(WalletError::publish_failed(record.id.as_str(), e)),
        }
    }

    /// Current balances of an account
    pub async fn balances(&self, account_id: &str) -> Result<Account, WalletError> {
        self.bounded(
            "get_balances",
            self.settings.store_timeout,
            self.accounts.get_balances(account_id),
        )
        .await
    }

    /// Up to `limit` records of an account, newest first
    pub async fn history(
        &self,
        account_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        self.bounded(
            "list_by_account",
            self.settings.store_timeout,
            self.log.list_by_account(account_id, limit),
        )
        .await
    }

    /// Read-after-write check for a transfer whose confirmation failed
    ///
    /// `Some(record)` means the transfer is committed and must not be retried.
    pub async fn reconcile(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        self.bounded(
            "get_transaction",
            self.settings.store_timeout,
            self.log.get(transaction_id),
        )
        .await
    }

    async fn bounded<T, F>(&self, operation: &str, limit: Duration, call: F) -> Result<T, WalletError>
    where
        F: Future<Output = Result<T, WalletError>>,
    {
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(WalletError::timeout(
                operation,
                u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

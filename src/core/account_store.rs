//! Thread-safe in-memory account store
//!
//! `InMemoryAccountStore` keeps account state in a `DashMap`, which shards its
//! locks: accounts in different shards are read and written in parallel, while
//! every read-check-write on one account runs under that entry's write guard.
//! The guard is an RAII value, so it is released on every exit path of
//! [`AccountStore::apply_transfer`], including rejections.

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;

use super::traits::AccountStore;
use crate::types::{
    normalize_code, Account, AccountId, BalanceUpdate, CurrencyCode, CurrencyRateTable,
    WalletError,
};

/// In-memory account store with per-account mutual exclusion
#[derive(Debug)]
pub struct InMemoryAccountStore {
    /// Account states by id
    accounts: DashMap<AccountId, Account>,

    /// Currencies every new account gets a balance for
    currencies: Vec<CurrencyCode>,
}

impl InMemoryAccountStore {
    /// Create an empty store whose accounts hold one balance per table currency
    pub fn new(rates: &CurrencyRateTable) -> Self {
        Self {
            accounts: DashMap::new(),
            currencies: rates.codes().map(str::to_string).collect(),
        }
    }

    /// Open a new account
    ///
    /// Currencies missing from `opening` start at zero. The internal balance
    /// always starts at zero.
    ///
    /// # Errors
    ///
    /// * `MissingField` if `account_id` is blank
    /// * `UnsupportedCurrency` if an opening balance names an unknown currency
    /// * `InvalidAmount` if an opening balance is negative
    /// * `AccountExists` if the id is already taken
    pub fn open_account<I, K>(&self, account_id: &str, opening: I) -> Result<Account, WalletError>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(WalletError::missing_field("accountId"));
        }

        let mut account = Account::new(account_id, self.currencies.iter().map(String::as_str));
        for (code, balance) in opening {
            let code = normalize_code(code.as_ref());
            if !account.external.contains_key(&code) {
                return Err(WalletError::unsupported_currency(&code));
            }
            if balance < Decimal::ZERO {
                return Err(WalletError::invalid_amount(balance));
            }
            account.external.insert(code, balance);
        }

        let mut created = false;
        let entry = self
            .accounts
            .entry(account_id.to_string())
            .or_insert_with(|| {
                created = true;
                account
            });

        if !created {
            return Err(WalletError::account_exists(account_id));
        }

        tracing::debug!(account = %account_id, "account opened");
        Ok(entry.value().clone())
    }

    /// Snapshot of all accounts, in arbitrary order
    pub fn all_accounts(&self) -> Vec<Account> {
        self.accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Currencies each account holds, sorted
    pub fn currencies(&self) -> &[CurrencyCode] {
        &self.currencies
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_balances(&self, account_id: &str) -> Result<Account, WalletError> {
        self.accounts
            .get(account_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WalletError::account_not_found(account_id))
    }

    async fn apply_transfer(
        &self,
        account_id: &str,
        currency: &str,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<BalanceUpdate, WalletError> {
        if debit <= Decimal::ZERO {
            return Err(WalletError::invalid_amount(debit));
        }
        if credit < Decimal::ZERO {
            return Err(WalletError::invalid_amount(credit));
        }

        let mut entry = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| WalletError::account_not_found(account_id))?;
        let account = entry.value_mut();
        let code = normalize_code(currency);

        let available = account.external_balance(&code);
        if debit > available {
            return Err(WalletError::insufficient_funds(
                account_id, &code, available, debit,
            ));
        }

        // Compute both sides before writing either, so a failure leaves the
        // account untouched.
        let external = available
            .checked_sub(debit)
            .ok_or_else(|| WalletError::arithmetic_overflow("debit", account_id))?;
        let internal = account
            .internal
            .checked_add(credit)
            .ok_or_else(|| WalletError::arithmetic_overflow("credit", account_id))?;

        account.external.insert(code, external);
        account.internal = internal;

        Ok(BalanceUpdate { external, internal })
    }
}

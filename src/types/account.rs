//! Account-related types for the wallet
//!
//! An account holds one external balance per supported currency plus a single
//! internal balance denominated in the settlement currency.

use super::currency::{normalize_code, CurrencyCode};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Opaque account identifier
pub type AccountId = String;

/// Wallet account state
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account identifier
    pub id: AccountId,

    /// External balances keyed by currency code
    ///
    /// The key set is fixed when the account is opened: one entry per
    /// supported currency. Balances are never negative.
    pub external: BTreeMap<CurrencyCode, Decimal>,

    /// Internal balance in settlement units
    ///
    /// Only grows, through completed transfers.
    pub internal: Decimal,
}

impl Account {
    /// Create an account with a zero balance for every given currency
    pub fn new<'a>(id: impl Into<AccountId>, currencies: impl IntoIterator<Item = &'a str>) -> Self {
        Account {
            id: id.into(),
            external: currencies
                .into_iter()
                .map(|code| (normalize_code(code), Decimal::ZERO))
                .collect(),
            internal: Decimal::ZERO,
        }
    }

    /// External balance for `currency`; zero when the account has no such entry
    pub fn external_balance(&self, currency: &str) -> Decimal {
        self.external
            .get(&normalize_code(currency))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Balances returned by a successful atomic transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// External balance of the debited currency after the transfer
    pub external: Decimal,
    /// Internal balance after the transfer
    pub internal: Decimal,
}

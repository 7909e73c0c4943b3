//! Currency codes and the static rate table

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::error::ConfigError;

/// Currency code such as `RUB` or `USD`
///
/// Codes are always stored in normalized form, see [`normalize_code`].
pub type CurrencyCode = String;

/// Trim and upper-case a currency code
pub fn normalize_code(code: &str) -> CurrencyCode {
    code.trim().to_uppercase()
}

/// Static mapping from currency code to its value in settlement units
///
/// Built once from configuration and shared read-only for the lifetime of the
/// process. The settlement currency is always present with rate 1.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRateTable {
    settlement: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl CurrencyRateTable {
    /// Build a rate table, rejecting tables that could not convert correctly
    ///
    /// # Errors
    ///
    /// * the settlement currency is missing or its rate is not exactly 1
    /// * any rate is zero or negative
    pub fn new<I, K>(settlement: &str, rates: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        let settlement = normalize_code(settlement);
        let mut table = BTreeMap::new();

        for (code, rate) in rates {
            let code = normalize_code(code.as_ref());
            if code.is_empty() {
                return Err(ConfigError::Invalid("empty currency code".to_string()));
            }
            if rate <= Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "rate for {} must be positive, got {}",
                    code, rate
                )));
            }
            table.insert(code, rate);
        }

        match table.get(&settlement) {
            Some(rate) if *rate == Decimal::ONE => {}
            Some(rate) => {
                return Err(ConfigError::Invalid(format!(
                    "settlement currency {} must have rate 1, got {}",
                    settlement, rate
                )))
            }
            None => {
                return Err(ConfigError::Invalid(format!(
                    "settlement currency {} is missing from the rate table",
                    settlement
                )))
            }
        }

        Ok(Self {
            settlement,
            rates: table,
        })
    }

    /// Rate of `code` in settlement units, if supported
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(&normalize_code(code)).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rate(code).is_some()
    }

    pub fn settlement_currency(&self) -> &str {
        &self.settlement
    }

    /// Supported codes in sorted order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

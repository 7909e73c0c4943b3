//! Error types for the wallet transfer engine
//!
//! Every way a transfer can be rejected or fail maps to one `WalletError`
//! variant with a stable machine-readable [`WalletError::code`]. Variants are
//! grouped by [`ErrorKind`] so callers can tell apart:
//!
//! - **Pre-mutation rejections**: nothing happened, the whole request is safe to retry
//! - **Committed failures**: funds already moved but the log write or the
//!   notification failed; retrying blindly would double-debit
//! - **Infrastructure errors**: a store or bus call could not complete in time
//! - **Indeterminate failures**: the balance mutation was cut off mid-call, so
//!   the caller must read the balances before deciding to retry

use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of a [`WalletError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, unsupported currency, sub-threshold amount
    Validation,
    /// The referenced account or record does not exist
    NotFound,
    /// The resource already exists
    Conflict,
    /// The external balance does not cover the debit
    InsufficientFunds,
    /// The balance mutation is committed but a later step failed
    Committed,
    /// A store or the bus could not complete the call
    Unavailable,
    /// The balance mutation may or may not have taken effect
    Indeterminate,
    /// File or stream handling outside the engine (replay input/output)
    Io,
}

/// Main error type for the wallet
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    /// A required request field is absent or empty
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Name of the missing field as seen by the client
        field: String,
    },

    /// Amount is zero, negative or not a number
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The rejected amount, as text
        amount: String,
    },

    /// Currency code is not in the rate table
    #[error("Unsupported currency '{currency}'")]
    UnsupportedCurrency {
        /// The rejected currency code
        currency: String,
    },

    /// Converted amount is below the configured minimum transfer
    #[error("Transfer of {settlement_amount} is below the minimum of {minimum}")]
    BelowMinimum {
        /// Amount after conversion to the settlement currency
        settlement_amount: Decimal,
        /// Configured minimum, in settlement units
        minimum: Decimal,
    },

    /// Conversion would need more precision than a `Decimal` holds
    #[error("Converting {amount} {currency} needs more precision than is supported")]
    PrecisionExceeded {
        /// The amount being converted
        amount: Decimal,
        /// Its currency
        currency: String,
    },

    /// Checked arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account the operation was applied to
        account: String,
    },

    /// No account with this identifier
    #[error("Account {account} not found")]
    AccountNotFound {
        /// The missing account id
        account: String,
    },

    /// An account with this identifier is already open
    #[error("Account {account} already exists")]
    AccountExists {
        /// The duplicated account id
        account: String,
    },

    /// External balance does not cover the requested debit
    #[error(
        "Insufficient funds for account {account}: available {available} {currency}, requested {requested}"
    )]
    InsufficientFunds {
        /// Account id
        account: String,
        /// Currency of the external balance
        currency: String,
        /// External balance at the time of the check
        available: Decimal,
        /// Requested debit
        requested: Decimal,
    },

    /// The log already holds a record with this identifier
    #[error("Transaction id {transaction_id} already exists")]
    DuplicateTransactionId {
        /// The colliding identifier
        transaction_id: String,
    },

    /// Appending the transaction record failed after the balances moved
    #[error("Failed to write transaction {transaction_id}: {message}")]
    LogWriteFailed {
        /// Identifier of the record that could not be written
        transaction_id: String,
        /// Underlying cause
        message: String,
    },

    /// Publishing the transfer event failed after the record was written
    #[error("Failed to publish transaction {transaction_id}: {message}")]
    PublishFailed {
        /// Identifier of the committed transaction
        transaction_id: String,
        /// Underlying cause
        message: String,
    },

    /// A store could not serve the call
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// Underlying cause
        message: String,
    },

    /// A store call did not complete within its bound
    #[error("{operation} timed out after {millis}ms")]
    Timeout {
        /// The store operation that timed out
        operation: String,
        /// Configured bound in milliseconds
        millis: u64,
    },

    /// The balance mutation did not answer within its bound
    #[error("{operation} did not complete within {millis}ms, outcome unknown")]
    OutcomeUnknown {
        /// The store operation that was cut off
        operation: String,
        /// Configured bound in milliseconds
        millis: u64,
    },

    /// I/O error while reading or writing replay files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        WalletError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for WalletError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        WalletError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl WalletError {
    /// Stable code clients can match on
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::MissingField { .. } => "missing_field",
            WalletError::InvalidAmount { .. } => "invalid_amount",
            WalletError::UnsupportedCurrency { .. } => "unsupported_currency",
            WalletError::BelowMinimum { .. } => "below_minimum",
            WalletError::PrecisionExceeded { .. } => "precision_exceeded",
            WalletError::ArithmeticOverflow { .. } => "arithmetic_overflow",
            WalletError::AccountNotFound { .. } => "account_not_found",
            WalletError::AccountExists { .. } => "account_exists",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::DuplicateTransactionId { .. } => "duplicate_transaction_id",
            WalletError::LogWriteFailed { .. } => "log_write_failed",
            WalletError::PublishFailed { .. } => "publish_failed",
            WalletError::StoreUnavailable { .. } => "store_unavailable",
            WalletError::Timeout { .. } => "timeout",
            WalletError::OutcomeUnknown { .. } => "outcome_unknown",
            WalletError::IoError { .. } => "io_error",
            WalletError::ParseError { .. } => "parse_error",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::MissingField { .. }
            | WalletError::InvalidAmount { .. }
            | WalletError::UnsupportedCurrency { .. }
            | WalletError::BelowMinimum { .. }
            | WalletError::PrecisionExceeded { .. }
            | WalletError::ArithmeticOverflow { .. } => ErrorKind::Validation,
            WalletError::AccountNotFound { .. } => ErrorKind::NotFound,
            WalletError::AccountExists { .. } | WalletError::DuplicateTransactionId { .. } => {
                ErrorKind::Conflict
            }
            WalletError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            WalletError::LogWriteFailed { .. } | WalletError::PublishFailed { .. } => {
                ErrorKind::Committed
            }
            WalletError::StoreUnavailable { .. } | WalletError::Timeout { .. } => {
                ErrorKind::Unavailable
            }
            WalletError::OutcomeUnknown { .. } => ErrorKind::Indeterminate,
            WalletError::IoError { .. } | WalletError::ParseError { .. } => ErrorKind::Io,
        }
    }

    /// True when the balance mutation already took effect
    pub fn is_committed(&self) -> bool {
        self.kind() == ErrorKind::Committed
    }

    /// Identifier of the committed transaction, for post-mutation failures
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            WalletError::LogWriteFailed { transaction_id, .. }
            | WalletError::PublishFailed { transaction_id, .. } => Some(transaction_id),
            _ => None,
        }
    }
}

// Helper functions for creating common errors

impl WalletError {
    pub fn missing_field(field: &str) -> Self {
        WalletError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid_amount(amount: impl ToString) -> Self {
        WalletError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    pub fn unsupported_currency(currency: &str) -> Self {
        WalletError::UnsupportedCurrency {
            currency: currency.to_string(),
        }
    }

    pub fn below_minimum(settlement_amount: Decimal, minimum: Decimal) -> Self {
        WalletError::BelowMinimum {
            settlement_amount,
            minimum,
        }
    }

    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        WalletError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    pub fn account_not_found(account: &str) -> Self {
        WalletError::AccountNotFound {
            account: account.to_string(),
        }
    }

    pub fn account_exists(account: &str) -> Self {
        WalletError::AccountExists {
            account: account.to_string(),
        }
    }

    pub fn insufficient_funds(
        account: &str,
        currency: &str,
        available: Decimal,
        requested: Decimal,
    ) -> Self {
        WalletError::InsufficientFunds {
            account: account.to_string(),
            currency: currency.to_string(),
            available,
            requested,
        }
    }

    pub fn duplicate_transaction_id(transaction_id: &str) -> Self {
        WalletError::DuplicateTransactionId {
            transaction_id: transaction_id.to_string(),
        }
    }

    pub fn log_write_failed(transaction_id: &str, message: impl ToString) -> Self {
        WalletError::LogWriteFailed {
            transaction_id: transaction_id.to_string(),
            message: message.to_string(),
        }
    }

    pub fn publish_failed(transaction_id: &str, message: impl ToString) -> Self {
        WalletError::PublishFailed {
            transaction_id: transaction_id.to_string(),
            message: message.to_string(),
        }
    }

    pub fn store_unavailable(message: impl ToString) -> Self {
        WalletError::StoreUnavailable {
            message: message.to_string(),
        }
    }

    pub fn precision_exceeded(amount: Decimal, currency: &str) -> Self {
        WalletError::PrecisionExceeded {
            amount,
            currency: currency.to_string(),
        }
    }

    pub fn outcome_unknown(operation: &str, millis: u64) -> Self {
        WalletError::OutcomeUnknown {
            operation: operation.to_string(),
            millis,
        }
    }

    pub fn timeout(operation: &str, millis: u64) -> Self {
        WalletError::Timeout {
            operation: operation.to_string(),
            millis,
        }
    }
}

/// Errors raised while loading or validating [`crate::config::WalletConfig`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// The configuration was read but violates a constraint
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        ConfigError::Load(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case::missing_field(
        WalletError::missing_field("accountId"),
        "Missing required field 'accountId'"
    )]
    #[case::unsupported_currency(
        WalletError::unsupported_currency("GBP"),
        "Unsupported currency 'GBP'"
    )]
    #[case::below_minimum(
        WalletError::below_minimum(Decimal::new(5, 1), Decimal::new(100, 0)),
        "Transfer of 0.5 is below the minimum of 100"
    )]
    #[case::insufficient_funds(
        WalletError::insufficient_funds("alice", "USD", Decimal::new(50, 0), Decimal::new(60, 0)),
        "Insufficient funds for account alice: available 50 USD, requested 60"
    )]
    #[case::log_write_failed(
        WalletError::log_write_failed("abc", "disk full"),
        "Failed to write transaction abc: disk full"
    )]
    #[case::timeout(
        WalletError::timeout("apply_transfer", 250),
        "apply_transfer timed out after 250ms"
    )]
    #[case::parse_error_with_line(
        WalletError::ParseError { line: Some(42), message: "Invalid field".to_string() },
        "CSV parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        WalletError::ParseError { line: None, message: "Invalid field".to_string() },
        "CSV parse error: Invalid field"
    )]
    #[case::outcome_unknown(
        WalletError::outcome_unknown("apply_transfer", 250),
        "apply_transfer did not complete within 250ms, outcome unknown"
    )]
    fn test_error_display(#[case] error: WalletError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case(WalletError::missing_field("amount"), ErrorKind::Validation)]
    #[case(WalletError::invalid_amount("-1"), ErrorKind::Validation)]
    #[case(WalletError::unsupported_currency("GBP"), ErrorKind::Validation)]
    #[case(WalletError::below_minimum(Decimal::ONE, Decimal::TEN), ErrorKind::Validation)]
    #[case(WalletError::account_not_found("bob"), ErrorKind::NotFound)]
    #[case(WalletError::account_exists("bob"), ErrorKind::Conflict)]
    #[case(
        WalletError::insufficient_funds("bob", "RUB", Decimal::ZERO, Decimal::ONE),
        ErrorKind::InsufficientFunds
    )]
    #[case(WalletError::log_write_failed("id", "x"), ErrorKind::Committed)]
    #[case(WalletError::publish_failed("id", "x"), ErrorKind::Committed)]
    #[case(WalletError::store_unavailable("down"), ErrorKind::Unavailable)]
    #[case(WalletError::timeout("get_balances", 10), ErrorKind::Unavailable)]
    #[case(WalletError::precision_exceeded(Decimal::ONE, "EUR"), ErrorKind::Validation)]
    #[case(WalletError::outcome_unknown("apply_transfer", 10), ErrorKind::Indeterminate)]
    fn test_error_kind(#[case] error: WalletError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            WalletError::missing_field("amount"),
            WalletError::invalid_amount("0"),
            WalletError::unsupported_currency("GBP"),
            WalletError::below_minimum(Decimal::ONE, Decimal::TEN),
            WalletError::arithmetic_overflow("convert", "a"),
            WalletError::account_not_found("a"),
            WalletError::account_exists("a"),
            WalletError::insufficient_funds("a", "RUB", Decimal::ZERO, Decimal::ONE),
            WalletError::duplicate_transaction_id("id"),
            WalletError::log_write_failed("id", "x"),
            WalletError::publish_failed("id", "x"),
            WalletError::store_unavailable("x"),
            WalletError::timeout("op", 1),
            WalletError::precision_exceeded(Decimal::ONE, "EUR"),
            WalletError::outcome_unknown("op", 1),
        ];

        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_committed_errors_expose_transaction_id() {
        let error = WalletError::publish_failed("tx-1", "bus closed");
        assert!(error.is_committed());
        assert_eq!(error.transaction_id(), Some("tx-1"));

        let error = WalletError::account_not_found("a");
        assert!(!error.is_committed());
        assert_eq!(error.transaction_id(), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: WalletError = io_error.into();
        assert!(matches!(error, WalletError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}

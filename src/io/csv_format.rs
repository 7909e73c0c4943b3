//! CSV format handling for replay input and balance output
//!
//! This module centralizes all CSV format concerns:
//! - `CsvTransferRecord` for deserializing transfer rows
//! - Conversion from transfer rows to `TransferRequest`
//! - Reading account seeds (a wide `account,<CODE>...` table)
//! - Account balance output serialization

use crate::types::{normalize_code, Account, AccountId, CurrencyCode, TransferRequest, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::{Read, Write};
use std::str::FromStr;

/// Transfer row with columns: account, amount, currency
///
/// The amount stays textual until conversion so one bad value only drops its
/// own row.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvTransferRecord {
    pub account: String,
    pub amount: String,
    pub currency: String,
}

/// Convert a transfer row to a `TransferRequest`
///
/// Only the amount is parsed here; every other rule is enforced by the engine.
pub fn convert_csv_record(record: CsvTransferRecord) -> Result<TransferRequest, String> {
    let amount_str = record.amount.trim();
    if amount_str.is_empty() {
        return Err(format!(
            "Transfer for account '{}' requires an amount",
            record.account
        ));
    }

    let amount = Decimal::from_str(amount_str).map_err(|_| {
        format!(
            "Invalid amount '{}' for account '{}'",
            record.amount, record.account
        )
    })?;

    Ok(TransferRequest::new(
        record.account.trim(),
        amount,
        &normalize_code(&record.currency),
    ))
}

/// One account to open before a replay
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSeed {
    pub account_id: AccountId,
    pub balances: Vec<(CurrencyCode, Decimal)>,
}

/// Read account seeds from a CSV table
///
/// The header is `account` followed by one column per currency code. Empty
/// cells leave that balance at zero. Any malformed row fails the whole read:
/// replaying against a partially seeded book would give misleading output.
pub fn read_account_seeds<R: Read>(input: R) -> Result<Vec<AccountSeed>, WalletError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    match headers.get(0) {
        Some(first) if first.eq_ignore_ascii_case("account") => {}
        _ => {
            return Err(WalletError::ParseError {
                line: Some(1),
                message: "seed header must start with 'account'".to_string(),
            })
        }
    }
    let currencies: Vec<CurrencyCode> = headers.iter().skip(1).map(normalize_code).collect();

    let mut seeds = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line());

        let account_id = row.get(0).unwrap_or_default().to_string();
        if account_id.is_empty() {
            return Err(WalletError::ParseError {
                line,
                message: "missing account id".to_string(),
            });
        }

        let mut balances = Vec::with_capacity(currencies.len());
        for (code, cell) in currencies.iter().zip(row.iter().skip(1)) {
            if cell.is_empty() {
                continue;
            }
            let balance = Decimal::from_str(cell).map_err(|_| WalletError::ParseError {
                line,
                message: format!("invalid {} balance '{}' for {}", code, cell, account_id),
            })?;
            balances.push((code.clone(), balance));
        }

        seeds.push(AccountSeed {
            account_id,
            balances,
        });
    }

    Ok(seeds)
}

/// Write account balances to CSV format
///
/// Columns: account, one per entry of `currencies`, internal. Accounts are
/// sorted by id for deterministic output. Amounts are written exactly, with
/// trailing zeros removed.
pub fn write_accounts_csv(
    accounts: &[Account],
    currencies: &[CurrencyCode],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    let mut header = Vec::with_capacity(currencies.len() + 2);
    header.push("account");
    header.extend(currencies.iter().map(String::as_str));
    header.push("internal");
    writer
        .write_record(&header)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by(|a, b| a.id.cmp(&b.id));

    for account in sorted_accounts {
        let mut row = Vec::with_capacity(currencies.len() + 2);
        row.push(account.id.clone());
        for code in currencies {
            row.push(account.external_balance(code).normalize().to_string());
        }
        row.push(account.internal.normalize().to_string());

        writer
            .write_record(&row)
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

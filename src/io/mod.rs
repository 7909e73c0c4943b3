//! I/O module
//!
//! Handles CSV parsing and output for the replay command.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, seeds, balance output)
//! - `async_reader` - Asynchronous transfer reader with batch reading interface

pub mod async_reader;
pub mod csv_format;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_csv_record, read_account_seeds, write_accounts_csv, AccountSeed, CsvTransferRecord,
};

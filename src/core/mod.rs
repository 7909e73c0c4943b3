//! Core business logic module
//!
//! This module contains the transfer processing components:
//! - `traits` - Trait abstractions for the account store, log and bus
//! - `converter` - Conversion into settlement units
//! - `account_store` - Per-account atomic balance state
//! - `transaction_log` - Append-only transfer records
//! - `notification_bus` - Best-effort transfer events
//! - `engine` - Transfer orchestration
//! - `batch_processor` - Account-partitioned batch execution

pub mod account_store;
pub mod batch_processor;
pub mod converter;
pub mod engine;
pub mod notification_bus;
pub mod traits;
pub mod transaction_log;

pub use account_store::InMemoryAccountStore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use converter::convert;
pub use engine::{EngineSettings, TransferEngine};
pub use notification_bus::{spawn_event_logger, ChannelNotificationBus};
pub use traits::{AccountStore, NotificationBus, TransactionLog};
pub use transaction_log::InMemoryTransactionLog;

//! In-memory wiring of the transfer components

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::WalletConfig;
use crate::core::{
    AccountStore, ChannelNotificationBus, InMemoryAccountStore, InMemoryTransactionLog,
    NotificationBus, TransactionLog, TransferEngine,
};
use crate::types::{ConfigError, TransferEvent};

/// A transfer engine together with the concrete stores behind it
#[derive(Debug, Clone)]
pub struct Wallet {
    pub engine: TransferEngine,
    pub accounts: Arc<InMemoryAccountStore>,
    pub log: Arc<InMemoryTransactionLog>,
}

impl Wallet {
    /// Build an in-memory wallet from validated configuration
    ///
    /// Returns the receiving half of the notification bus; the caller decides
    /// who consumes events.
    pub fn in_memory(
        config: &WalletConfig,
    ) -> Result<(Self, mpsc::Receiver<TransferEvent>), ConfigError> {
        let settings = config.engine_settings()?;
        let accounts = Arc::new(InMemoryAccountStore::new(&settings.rates));
        let log = Arc::new(InMemoryTransactionLog::new());
        let (bus, events) = ChannelNotificationBus::new(config.bus_capacity);

        let engine = TransferEngine::new(
            settings,
            Arc::clone(&accounts) as Arc<dyn AccountStore>,
            Arc::clone(&log) as Arc<dyn TransactionLog>,
            Arc::new(bus) as Arc<dyn NotificationBus>,
        );

        Ok((
            Self {
                engine,
                accounts,
                log,
            },
            events,
        ))
    }
}

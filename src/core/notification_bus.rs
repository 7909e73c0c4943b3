//! In-process notification bus
//!
//! `ChannelNotificationBus` publishes transfer events into a bounded tokio
//! channel. Publishing never waits: a full or closed channel fails the call
//! with `PublishFailed`, which gives at-most-once delivery. The receiving half
//! is handed to a consumer, typically [`spawn_event_logger`].

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::traits::NotificationBus;
use crate::types::{TransferEvent, WalletError};

/// Bounded channel-backed bus
#[derive(Debug, Clone)]
pub struct ChannelNotificationBus {
    sender: mpsc::Sender<TransferEvent>,
}

impl ChannelNotificationBus {
    /// Create a bus holding at most `capacity` undelivered events
    ///
    /// A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TransferEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationBus for ChannelNotificationBus {
    async fn publish(&self, event: TransferEvent) -> Result<(), WalletError> {
        let transaction_id = event.transaction_id.clone();

        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => {
                WalletError::publish_failed(transaction_id.as_str(), "notification bus is full")
            }
            TrySendError::Closed(_) => {
                WalletError::publish_failed(transaction_id.as_str(), "notification bus is closed")
            }
        })
    }
}

/// Drain events from the bus, logging each one as JSON under the
/// `transactions` target
///
/// The task ends when every sender has been dropped.
pub fn spawn_event_logger(mut receiver: mpsc::Receiver<TransferEvent>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut delivered = 0u64;
        while let Some(event) = receiver.recv().await {
            match serde_json::to_string(&event) {
                Ok(payload) => tracing::info!(target: "transactions", %payload, "transfer event"),
                Err(e) => tracing::error!(
                    target: "transactions",
                    transaction_id = %event.transaction_id,
                    error = %e,
                    "failed to encode transfer event"
                ),
            }
            delivered += 1;
        }
        delivered
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionId;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn event(id: &str) -> TransferEvent {
        TransferEvent {
            transaction_id: TransactionId::from(id),
            account_id: "alice".to_string(),
            amount: Decimal::new(50, 0),
            currency: "USD".to_string(),
            settlement_amount: Decimal::new(5000, 0),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_delivers_event() {
        let (bus, mut receiver) = ChannelNotificationBus::new(4);

        bus.publish(event("t1")).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.transaction_id.as_str(), "t1");
    }

    #[tokio::test]
    async fn test_publish_fails_when_full() {
        let (bus, _receiver) = ChannelNotificationBus::new(1);

        bus.publish(event("t1")).await.unwrap();
        let result = bus.publish(event("t2")).await;

        assert_eq!(
            result,
            Err(WalletError::publish_failed("t2", "notification bus is full"))
        );
    }

    #[tokio::test]
    async fn test_publish_fails_when_closed() {
        let (bus, receiver) = ChannelNotificationBus::new(4);
        drop(receiver);

        let result = bus.publish(event("t1")).await;

        assert_eq!(
            result,
            Err(WalletError::publish_failed("t1", "notification bus is closed"))
        );
    }

    #[tokio::test]
    async fn test_event_logger_drains_until_senders_drop() {
        let (bus, receiver) = ChannelNotificationBus::new(8);
        let logger = spawn_event_logger(receiver);

        bus.publish(event("t1")).await.unwrap();
        bus.publish(event("t2")).await.unwrap();
        drop(bus);

        assert_eq!(logger.await.unwrap(), 2);
    }
}

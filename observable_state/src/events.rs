//! Output channels with replay-last semantics.
//!
//! Each channel keeps the most recent value so a late subscriber starts
//! with it before receiving live values. Emission never blocks: a slow
//! subscriber is cut off with [`StreamError::Lagged`] instead of exerting
//! back pressure on the producer, and subscribers always run on their own
//! tasks.

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    misc::{ChainHead, ObservableBeaconState},
    pending_operations::PendingOperations,
};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("subscriber fell behind by {0} messages")]
    Lagged(u64),
    #[error("channel closed")]
    Closed,
}

pub struct ReplayChannel<T> {
    latest: Mutex<Option<T>>,
    sender: broadcast::Sender<T>,
}

impl<T: Clone> ReplayChannel<T> {
    #[must_use]
    fn new(capacity: usize) -> Self {
        Self {
            latest: Mutex::new(None),
            sender: broadcast::channel(capacity).0,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> ReplayReceiver<T> {
        // Holding the lock across `subscribe` ensures the replayed value
        // and the live subscription do not overlap or leave a gap.
        let latest = self.latest.lock();

        ReplayReceiver {
            replayed: latest.clone(),
            receiver: self.sender.subscribe(),
            lagged: None,
        }
    }

    pub(crate) fn send(&self, value: T) {
        let mut latest = self.latest.lock();
        *latest = Some(value.clone());

        // A send only fails when no subscriber exists, which is not an
        // error for a broadcast output.
        drop(self.sender.send(value));
    }
}

pub struct ReplayReceiver<T> {
    replayed: Option<T>,
    receiver: broadcast::Receiver<T>,
    lagged: Option<u64>,
}

impl<T: Clone> ReplayReceiver<T> {
    /// The next value for this subscriber. Once the subscriber has fallen
    /// behind, every subsequent call reports [`StreamError::Lagged`]; the
    /// subscription is dead.
    pub async fn recv(&mut self) -> Result<T, StreamError> {
        if let Some(skipped) = self.lagged {
            return Err(StreamError::Lagged(skipped));
        }

        if let Some(value) = self.replayed.take() {
            return Ok(value);
        }

        match self.receiver.recv().await {
            Ok(value) => Ok(value),
            Err(RecvError::Lagged(skipped)) => {
                self.lagged = Some(skipped);
                Err(StreamError::Lagged(skipped))
            }
            Err(RecvError::Closed) => Err(StreamError::Closed),
        }
    }
}

/// The three output streams of the subsystem.
pub struct EventChannels {
    pub heads: ReplayChannel<ChainHead>,
    pub observable_states: ReplayChannel<ObservableBeaconState>,
    pub pending_operations: ReplayChannel<PendingOperations>,
}

impl Default for EventChannels {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl EventChannels {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            heads: ReplayChannel::new(capacity),
            observable_states: ReplayChannel::new(capacity),
            pending_operations: ReplayChannel::new(capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(capacity: usize) -> ReplayChannel<u64> {
        ReplayChannel::new(capacity)
    }

    #[tokio::test]
    async fn late_subscriber_receives_the_latest_value_first() {
        let channel = channel(4);

        channel.send(1);
        channel.send(2);

        let mut receiver = channel.subscribe();
        channel.send(3);

        assert_eq!(receiver.recv().await, Ok(2));
        assert_eq!(receiver.recv().await, Ok(3));
    }

    #[tokio::test]
    async fn subscriber_before_the_first_send_only_sees_live_values() {
        let channel = channel(4);

        let mut receiver = channel.subscribe();
        channel.send(1);

        assert_eq!(receiver.recv().await, Ok(1));
    }

    #[tokio::test]
    async fn overrun_subscriber_is_cut_off_while_others_continue() {
        let channel = channel(1);

        let mut slow = channel.subscribe();
        let mut live = channel.subscribe();

        channel.send(1);
        assert_eq!(live.recv().await, Ok(1));

        channel.send(2);
        assert_eq!(live.recv().await, Ok(2));

        channel.send(3);
        assert_eq!(live.recv().await, Ok(3));

        assert_eq!(slow.recv().await, Err(StreamError::Lagged(2)));
        assert_eq!(slow.recv().await, Err(StreamError::Lagged(2)));
    }

    #[tokio::test]
    async fn dropping_the_channel_closes_subscriptions() {
        let channel = channel(4);

        channel.send(7);

        let mut receiver = channel.subscribe();
        drop(channel);

        assert_eq!(receiver.recv().await, Ok(7));
        assert_eq!(receiver.recv().await, Err(StreamError::Closed));
    }
}

//! Publish side of the notifier
//!
//! `Publisher` is the seam the matching and settlement cores depend on.
//! `InMemoryBus` fans events out over tokio mpsc channels, preserving
//! publish order per channel. Delivery is fire-and-forget: a slow or gone
//! subscriber never blocks a publish.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::events::EngineEvent;
use crate::topic::Topic;

/// Event sink the engine publishes into.
pub trait Publisher: Send + Sync {
    fn publish(&self, event: EngineEvent);
}

/// Publisher that drops everything. Used where no realtime consumers exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl Publisher for NullPublisher {
    fn publish(&self, _event: EngineEvent) {}
}

/// In-process pub/sub bus keyed by channel string.
///
/// The subscriber map lock is held across the fan-out of a single event, so
/// two events published to the same channel are observed in publish order
/// by every subscriber of that channel.
#[derive(Debug, Default)]
pub struct InMemoryBus {
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<EngineEvent>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one topic. Events published after this call are
    /// delivered in order; there is no replay of earlier events.
    pub fn subscribe(&self, topic: &Topic) -> mpsc::UnboundedReceiver<EngineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        debug!(channel = %topic, "subscriber added");
        rx
    }

    /// Number of live subscribers on a topic (test and metrics hook).
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        let subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers
            .get(&topic.to_string())
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Publisher for InMemoryBus {
    fn publish(&self, event: EngineEvent) {
        let channel = event.topic().to_string();
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(senders) = subscribers.get_mut(&channel) else {
            trace!(%channel, event = event.event_type_label(), "no subscribers");
            return;
        };
        // Dropped receivers are pruned as we go.
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        trace!(
            %channel,
            event = event.event_type_label(),
            subscribers = senders.len(),
            "event published"
        );
        if senders.is_empty() {
            subscribers.remove(&channel);
        }
    }
}

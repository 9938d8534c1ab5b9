//! Realtime Notifier
//!
//! One-way boundary from the matching and settlement cores to realtime
//! consumers. Producers publish `EngineEvent`s to named topic channels;
//! subscribers receive them in publish order per channel. Publishing never
//! feeds back into matching or balances.

pub mod bus;
pub mod events;
pub mod topic;

pub use bus::{InMemoryBus, NullPublisher, Publisher};
pub use events::EngineEvent;
pub use topic::{Topic, TopicKind};

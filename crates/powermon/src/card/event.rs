//! Messages exchanged between the host and a card.
//!
//! Split by direction:
//! - `HostEvent`: pushed by the host into the card's event loop
//! - `CardEvent`: emitted by the card and its editor back to the host

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use super::card::CardView;
use super::options::CardConfig;
use crate::state::StateSnapshot;

/// Messages FROM the host TO a card.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A fresh state map replaced the previous one.
    StatesUpdated(Arc<StateSnapshot>),

    /// The host stored a new card configuration.
    ConfigChanged(CardConfig),

    /// The user activated the node of an entity.
    EntityClicked { entity_id: String },
}

/// Messages FROM a card TO the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardEvent {
    /// Ask the host to open its detail view for an entity.
    MoreInfo { entity_id: String },

    /// The editor changed the configuration; carries the whole config.
    ConfigChanged { config: CardConfig },

    /// A render pass completed.
    Rendered { view: CardView },
}

/// Bounded channel for host events, providing backpressure on state pushes.
pub type HostEventSender = mpsc::Sender<HostEvent>;
pub type HostEventReceiver = mpsc::Receiver<HostEvent>;

/// Card events are unbounded; a card never waits on its host.
pub type CardEventSender = mpsc::UnboundedSender<CardEvent>;
pub type CardEventReceiver = mpsc::UnboundedReceiver<CardEvent>;

/// Capacity for the host→card event channel.
pub const HOST_EVENT_CHANNEL_SIZE: usize = 64;

pub fn host_event_channel() -> (HostEventSender, HostEventReceiver) {
    mpsc::channel(HOST_EVENT_CHANNEL_SIZE)
}

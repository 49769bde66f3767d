//! The dashboard card and its configuration editor.
//!
//! A [`Card`] consumes [`HostEvent`]s one at a time and answers with
//! [`CardEvent`]s; everything it shows is derived by [`crate::tree`].

mod card;
mod click;
mod editor;
mod event;
mod options;
mod rooms;

use serde::Serialize;

pub use card::Card;
pub use card::CardView;
pub use click::CLICK_LATCH;
pub use click::ClickGuard;
pub use editor::CardEditor;
pub use editor::Checkbox;
pub use event::CardEvent;
pub use event::CardEventReceiver;
pub use event::CardEventSender;
pub use event::HOST_EVENT_CHANNEL_SIZE;
pub use event::HostEvent;
pub use event::HostEventReceiver;
pub use event::HostEventSender;
pub use event::host_event_channel;
pub use options::CardConfig;
pub use options::CardOption;
pub use rooms::RoomList;
pub use rooms::RoomOption;
pub use rooms::list_rooms;

/// Element name the card registers under.
pub const CARD_TYPE: &str = "energy-power-monitor-card";

/// Element name of the configuration editor.
pub const EDITOR_TYPE: &str = "energy-power-monitor-card-editor";

/// Entry the card adds to the host's card picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardRegistration {
    #[serde(rename = "type")]
    pub card_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview: bool,
}

pub const REGISTRATION: CardRegistration = CardRegistration {
    card_type: CARD_TYPE,
    name: "Energy and Power Monitor",
    description: "Displays power states for selected rooms.",
    preview: false,
};

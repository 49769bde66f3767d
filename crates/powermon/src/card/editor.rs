use serde::Serialize;
use tracing::debug;

use super::event::CardEvent;
use super::event::CardEventSender;
use super::options::CardConfig;
use super::options::CardOption;
use super::rooms::RoomList;
use super::rooms::RoomOption;
use crate::state::EntityRegistry;
use crate::state::StateSnapshot;

/// State of one editor checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkbox {
    pub option: CardOption,
    pub label: &'static str,
    pub checked: bool,
}

/// Configuration editor for a card.
///
/// Every change is reported to the host with the complete configuration.
pub struct CardEditor {
    config: CardConfig,
    rooms: RoomList,
    events: CardEventSender,
}

impl CardEditor {
    pub fn new(config: CardConfig, events: CardEventSender) -> Self {
        Self {
            config,
            rooms: RoomList::default(),
            events,
        }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Replace the configuration without reporting it back.
    pub fn set_config(&mut self, config: CardConfig) {
        self.config = config;
    }

    /// Reload the room selector from the host registry.
    ///
    /// A failed query has already been logged by [`RoomList::refresh`]; the
    /// selector keeps the rooms it listed before.
    pub async fn refresh_rooms(
        &mut self,
        registry: &dyn EntityRegistry,
        store: &StateSnapshot,
    ) -> &[RoomOption] {
        if self.rooms.refresh(registry, store).await.is_err() {
            debug!("Room selector unchanged after failed refresh");
        }
        self.rooms.rooms()
    }

    pub fn rooms(&self) -> &[RoomOption] {
        self.rooms.rooms()
    }

    /// Room currently selected, empty when none.
    pub fn selected_room(&self) -> &str {
        self.config.room.as_deref().unwrap_or_default()
    }

    pub fn select_room(&mut self, entity_id: &str) {
        self.config.room = Some(entity_id.to_string());
        self.fire_config_changed();
    }

    pub fn toggle(&mut self, option: CardOption, checked: bool) {
        self.config.options.set(option, checked);
        self.fire_config_changed();
    }

    /// Checkbox states, in editor order.
    pub fn options(&self) -> Vec<Checkbox> {
        CardOption::all()
            .map(|option| Checkbox {
                option,
                label: option.label(),
                checked: self.config.options.get(option),
            })
            .collect()
    }

    fn fire_config_changed(&self) {
        debug!("Editor config changed: {:?}", self.config);
        let event = CardEvent::ConfigChanged {
            config: self.config.clone(),
        };
        if self.events.send(event).is_err() {
            debug!("Host stopped listening for editor events");
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::click::ClickGuard;
use super::event::CardEvent;
use super::event::CardEventSender;
use super::event::HostEvent;
use super::event::HostEventReceiver;
use super::options::CardConfig;
use crate::state::StateSnapshot;
use crate::tree::DisplayNode;
use crate::tree::PrettyPrint;
use crate::tree::TreeNode;
use crate::tree::assemble;
use crate::tree::build_tree;
use crate::tree::write_indent;

/// Outcome of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardView {
    /// No room configured, or the configured room is not in the snapshot.
    NoRoomSelected,
    Tree { nodes: Vec<DisplayNode> },
}

impl CardView {
    pub fn nodes(&self) -> &[DisplayNode] {
        match self {
            CardView::NoRoomSelected => &[],
            CardView::Tree { nodes } => nodes,
        }
    }
}

impl PrettyPrint for CardView {
    fn pretty_print(&self, indent: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardView::NoRoomSelected => {
                write_indent(indent, f)?;
                writeln!(f, "No room selected.")
            }
            CardView::Tree { nodes } => nodes.pretty_print(indent, f),
        }
    }
}

/// The dashboard card
///
/// Holds the current configuration and state snapshot, derives the display
/// tree on demand, and turns node clicks into detail requests for the host.
pub struct Card {
    config: CardConfig,

    /// Latest snapshot pushed by the host (replaced whole, never mutated)
    snapshot: Arc<StateSnapshot>,

    click_guard: ClickGuard,

    /// Events back to the host
    events: CardEventSender,
}

impl Card {
    pub fn new(config: CardConfig, events: CardEventSender) -> Self {
        Self {
            config,
            snapshot: Arc::default(),
            click_guard: ClickGuard::default(),
            events,
        }
    }

    /// Override how long a click blocks further clicks.
    pub fn with_click_latch(mut self, latch: Duration) -> Self {
        self.click_guard = ClickGuard::new(latch);
        self
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CardConfig) {
        debug!("Card config updated: {:?}", config);
        self.config = config;
    }

    pub fn snapshot(&self) -> &Arc<StateSnapshot> {
        &self.snapshot
    }

    pub fn set_snapshot(&mut self, snapshot: Arc<StateSnapshot>) {
        self.snapshot = snapshot;
    }

    /// Flat tree below the configured room, empty when none is configured.
    pub fn tree(&self) -> Vec<TreeNode> {
        match self.config.room() {
            Some(room) => build_tree(room, &self.snapshot, &self.config.options),
            None => Vec::new(),
        }
    }

    /// Derive the display tree from the current snapshot.
    pub fn render(&self) -> CardView {
        let Some(room) = self.config.room() else {
            return CardView::NoRoomSelected;
        };
        if !self.snapshot.contains(room) {
            debug!("Configured room {} is not in the snapshot", room);
            return CardView::NoRoomSelected;
        }

        let options = &self.config.options;
        let nodes = build_tree(room, &self.snapshot, options);
        CardView::Tree {
            nodes: assemble(&nodes, &self.snapshot, options),
        }
    }

    /// Handle a click on a node.
    ///
    /// Emits a detail request unless a previous click still holds the latch.
    /// Returns whether the click was dispatched.
    pub fn click(&mut self, entity_id: &str) -> bool {
        if !self.click_guard.try_acquire() {
            debug!("Dropping click on {} while latched", entity_id);
            return false;
        }
        debug!("Handling click for entity: {}", entity_id);
        self.emit(CardEvent::MoreInfo {
            entity_id: entity_id.to_string(),
        });
        true
    }

    /// Run the card's event loop
    ///
    /// Processes host events one at a time until the host drops its sender.
    pub async fn run(mut self, mut rx: HostEventReceiver) {
        info!("Card starting");

        while let Some(event) = rx.recv().await {
            self.handle_event(event);
        }

        info!("Card shutting down");
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::StatesUpdated(snapshot) => {
                self.set_snapshot(snapshot);
                self.emit_render();
            }
            HostEvent::ConfigChanged(config) => {
                self.set_config(config);
                self.emit_render();
            }
            HostEvent::EntityClicked { entity_id } => {
                self.click(&entity_id);
            }
        }
    }

    fn emit_render(&self) {
        let view = self.render();
        self.emit(CardEvent::Rendered { view });
    }

    fn emit(&self, event: CardEvent) {
        if self.events.send(event).is_err() {
            debug!("Host stopped listening for card events");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::card::event::host_event_channel;
    use crate::state::HostState;

    const KITCHEN: &str = "sensor.energy_power_monitor_kitchen_power";

    fn snapshot() -> Arc<StateSnapshot> {
        Arc::new(StateSnapshot::from_states([
            HostState::new(KITCHEN, "60")
                .with_attribute("friendly_name", "Kitchen Power")
                .with_attribute("unit_of_measurement", "W")
                .with_attribute("selected_entities", json!(["sensor.kitchen_lamp_power"])),
            HostState::new("sensor.kitchen_lamp_power", "40")
                .with_attribute("friendly_name", "Kitchen Lamp Power")
                .with_attribute("unit_of_measurement", "W"),
            HostState::new("sensor.energy_power_monitor_kitchen_untracked_power", "20"),
        ]))
    }

    #[test]
    fn test_render_without_room() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let card = Card::new(CardConfig::default(), tx);
        assert_eq!(card.render(), CardView::NoRoomSelected);
        assert!(card.tree().is_empty());
        assert_eq!(card.render().to_pretty_string(), "No room selected.\n");
    }

    #[test]
    fn test_render_with_unknown_room() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut card = Card::new(CardConfig::for_room("sensor.energy_power_monitor_x"), tx);
        card.set_snapshot(snapshot());
        assert_eq!(card.render(), CardView::NoRoomSelected);
    }

    #[test]
    fn test_render_tree() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut card = Card::new(CardConfig::for_room(KITCHEN), tx);
        card.set_snapshot(snapshot());

        insta::assert_snapshot!(card.render().to_pretty_string(), @"
        Kitchen [sensor.energy_power_monitor_kitchen_power]: 80 W, U: 20 W <split 25%>
          Kitchen Lamp [sensor.kitchen_lamp_power]: 40 W <solid>
        ");
        assert_eq!(card.tree().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_latch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut card = Card::new(CardConfig::for_room(KITCHEN), tx);

        assert!(card.click("sensor.kitchen_lamp_power"));
        assert!(!card.click(KITCHEN));
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(card.click(KITCHEN));

        assert_eq!(
            rx.recv().await,
            Some(CardEvent::MoreInfo {
                entity_id: "sensor.kitchen_lamp_power".to_string()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(CardEvent::MoreInfo {
                entity_id: KITCHEN.to_string()
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_event_loop() {
        let (host_tx, host_rx) = host_event_channel();
        let (card_tx, mut card_rx) = mpsc::unbounded_channel();
        let card = Card::new(CardConfig::default(), card_tx);
        let handle = tokio::spawn(card.run(host_rx));

        host_tx
            .send(HostEvent::StatesUpdated(snapshot()))
            .await
            .unwrap();
        let Some(CardEvent::Rendered { view }) = card_rx.recv().await else {
            panic!("expected a render");
        };
        assert_eq!(view, CardView::NoRoomSelected);

        host_tx
            .send(HostEvent::ConfigChanged(CardConfig::for_room(KITCHEN)))
            .await
            .unwrap();
        let Some(CardEvent::Rendered { view }) = card_rx.recv().await else {
            panic!("expected a render");
        };
        assert_eq!(view.nodes().len(), 1);
        assert_eq!(view.nodes()[0].children.len(), 1);

        host_tx
            .send(HostEvent::EntityClicked {
                entity_id: "sensor.kitchen_lamp_power".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            card_rx.recv().await,
            Some(CardEvent::MoreInfo {
                entity_id: "sensor.kitchen_lamp_power".to_string()
            })
        );

        drop(host_tx);
        handle.await.unwrap();
    }
}

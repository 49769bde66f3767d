use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::state::EntityRegistry;
use crate::state::RegistryEntry;
use crate::state::RegistryError;
use crate::state::StateSnapshot;
use crate::state::is_room_id;
use crate::tree::names::locale_cmp;
use crate::tree::names::room_label;

/// A room the editor offers for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomOption {
    pub entity_id: String,
    pub friendly_name: String,
}

/// Selectable rooms among `entries`, sorted by label.
///
/// Only ids following the room convention qualify, and any whose name (or
/// id) mentions `untracked` is skipped.
pub fn list_rooms(entries: &[RegistryEntry], store: &StateSnapshot) -> Vec<RoomOption> {
    let mut rooms: Vec<RoomOption> = entries
        .iter()
        .filter(|entry| is_room_id(&entry.entity_id))
        .filter_map(|entry| {
            let raw = store
                .get(&entry.entity_id)
                .map_or(entry.entity_id.as_str(), |e| e.display_name());
            if raw.to_lowercase().contains("untracked") {
                return None;
            }
            Some(RoomOption {
                entity_id: entry.entity_id.clone(),
                friendly_name: room_label(raw),
            })
        })
        .collect();

    rooms.sort_by(|a, b| locale_cmp(&a.friendly_name, &b.friendly_name));
    rooms
}

/// Cached room listing, replaced whole on every successful refresh.
#[derive(Debug, Default)]
pub struct RoomList {
    rooms: Vec<RoomOption>,
}

impl RoomList {
    pub fn rooms(&self) -> &[RoomOption] {
        &self.rooms
    }

    /// Query the registry once and rebuild the listing.
    ///
    /// On failure the previous listing is kept.
    pub async fn refresh(
        &mut self,
        registry: &dyn EntityRegistry,
        store: &StateSnapshot,
    ) -> Result<&[RoomOption], RegistryError> {
        let entries = match registry.list_entities().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to fetch rooms, keeping {} known: {}", self.rooms.len(), e);
                return Err(e);
            }
        };

        self.rooms = list_rooms(&entries, store);
        debug!(
            "Listed {} rooms from {} registry entries",
            self.rooms.len(),
            entries.len()
        );
        Ok(&self.rooms)
    }
}

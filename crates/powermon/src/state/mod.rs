//! Read-only view over the host's entity states and entity registry.

mod registry;
mod snapshot;

pub use registry::EntityRegistry;
pub use registry::FileRegistry;
#[cfg(test)]
pub use registry::MockRegistry;
pub use registry::RegistryEntry;
pub use registry::RegistryError;
pub use registry::SnapshotRegistry;
pub use snapshot::ChildRef;
pub use snapshot::Entity;
pub use snapshot::EntityKind;
pub use snapshot::HostState;
pub use snapshot::ROOM_PREFIX;
pub use snapshot::SnapshotError;
pub use snapshot::StateSnapshot;
pub use snapshot::UNTRACKED_SUFFIXES;
pub use snapshot::is_room_id;
pub use snapshot::is_untracked_id;
pub use snapshot::parse_number;

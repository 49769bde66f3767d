//! powermon: hierarchical energy/power monitor views over a smart-home state map.
//!
//! The crate turns a host state snapshot (rooms whose `selected_entities`
//! attribute references child sensors) into an ordered tree of nodes, then
//! shapes that tree for display.

pub mod card;
pub mod config;
pub mod state;
pub mod tree;

pub use card::Card;
pub use card::CardConfig;
pub use card::CardEditor;
pub use card::CardEvent;
pub use card::CardOption;
pub use card::CardView;
pub use card::HostEvent;
pub use config::Config;
pub use config::Diagnostic;
pub use config::Diagnostics;
pub use config::LogLevel;
pub use config::format_diagnostics;
pub use state::Entity;
pub use state::StateSnapshot;
pub use tree::DisplayNode;
pub use tree::DisplayOptions;
pub use tree::TreeNode;

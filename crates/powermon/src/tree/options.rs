use serde::Deserialize;
use serde::Serialize;

fn default_true() -> bool {
    true
}

/// Switches that shape the derived tree and its presentation.
///
/// Every switch defaults to `true` when absent from the host config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    #[serde(default = "default_true")]
    pub show_name: bool,

    #[serde(default = "default_true")]
    pub show_icon: bool,

    #[serde(default = "default_true")]
    pub show_untracked_values: bool,

    /// Add the untracked residual to a node's own value before display and
    /// before computing its untracked share.
    #[serde(default = "default_true")]
    pub combine_value_untracked: bool,

    /// Strip the level-1 room name from the labels of everything below it.
    #[serde(default = "default_true")]
    pub clean_subelement_names: bool,

    /// Emit leaf sensors, not just rooms.
    #[serde(default = "default_true")]
    pub show_children: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_name: true,
            show_icon: true,
            show_untracked_values: true,
            combine_value_untracked: true,
            clean_subelement_names: true,
            show_children: true,
        }
    }
}

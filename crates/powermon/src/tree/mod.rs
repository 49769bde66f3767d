//! Tree derivation and display shaping.
//!
//! [`build_tree`] walks a room and its declared children into a flat,
//! pre-ordered list of [`TreeNode`]s. [`assemble`] then nests, sorts and
//! deduplicates that list into [`DisplayNode`]s ready for a renderer.

mod assemble;
mod border;
mod builder;
pub mod names;
mod options;
mod pretty_print;
mod untracked;


pub use assemble::DisplayNode;
pub use assemble::Visited;
pub use assemble::assemble;
pub use assemble::assemble_with;
pub use border::ACCENT_COLOR;
pub use border::BorderStyle;
pub use border::NEUTRAL_COLOR;
pub use border::border_style;
pub use builder::TreeNode;
pub use builder::build_tree;
pub use builder::percentage_of;
pub use options::DisplayOptions;
pub use pretty_print::PrettyPrint;
pub(crate) use pretty_print::write_indent;
pub use untracked::untracked_id_of;
pub use untracked::untracked_value_of;

use serde::Deserialize;
use serde::Serialize;
use strum::AsRefStr;
use strum::Display;
use strum::EnumIter;
use strum::EnumMessage;
use strum::EnumString;
use strum::IntoEnumIterator;

use crate::tree::DisplayOptions;

/// Configuration of one card instance, as stored by the host.
///
/// `room` may be unset; every display switch defaults to `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardConfig {
    /// Host-side element type, carried through untouched.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,

    /// Root room sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    #[serde(flatten)]
    pub options: DisplayOptions,
}

impl CardConfig {
    pub fn for_room(room: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            ..Self::default()
        }
    }

    /// Configured root, ignoring an empty selection.
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref().filter(|r| !r.is_empty())
    }
}

/// One editor checkbox.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    EnumMessage,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CardOption {
    #[strum(message = "Show Name")]
    ShowName,
    #[strum(message = "Show Icon")]
    ShowIcon,
    #[strum(message = "Show Untracked Values")]
    ShowUntrackedValues,
    #[strum(message = "Combine Untracked Values")]
    CombineValueUntracked,
    #[strum(message = "Clean Subelement Names")]
    CleanSubelementNames,
    #[strum(message = "Show Children")]
    ShowChildren,
}

impl CardOption {
    /// Every option, in editor order.
    pub fn all() -> impl Iterator<Item = CardOption> {
        CardOption::iter()
    }

    /// Checkbox label.
    pub fn label(&self) -> &'static str {
        self.get_message().unwrap_or("")
    }
}

impl DisplayOptions {
    pub fn get(&self, option: CardOption) -> bool {
        match option {
            CardOption::ShowName => self.show_name,
            CardOption::ShowIcon => self.show_icon,
            CardOption::ShowUntrackedValues => self.show_untracked_values,
            CardOption::CombineValueUntracked => self.combine_value_untracked,
            CardOption::CleanSubelementNames => self.clean_subelement_names,
            CardOption::ShowChildren => self.show_children,
        }
    }

    pub fn set(&mut self, option: CardOption, value: bool) {
        let slot = match option {
            CardOption::ShowName => &mut self.show_name,
            CardOption::ShowIcon => &mut self.show_icon,
            CardOption::ShowUntrackedValues => &mut self.show_untracked_values,
            CardOption::CombineValueUntracked => &mut self.combine_value_untracked,
            CardOption::CleanSubelementNames => &mut self.clean_subelement_names,
            CardOption::ShowChildren => &mut self.show_children,
        };
        *slot = value;
    }
}

//! Typed entity state snapshot.
//!
//! The host delivers its whole state map on every update. Each state is
//! ingested once into an [`Entity`]: the numeric value is parsed, the common
//! attributes are lifted into fields, and the `selected_entities` child list
//! is classified into rooms and sensors so later passes never have to look at
//! id prefixes again.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

/// Id prefix the data producer uses for room (composite) sensors.
pub const ROOM_PREFIX: &str = "sensor.energy_power_monitor_";

/// Suffixes of the residual counterparts of tracked power/energy sensors.
pub const UNTRACKED_SUFFIXES: [&str; 2] = ["_untracked_power", "_untracked_energy"];

const SELECTED_ENTITIES: &str = "selected_entities";

/// Returns true if `entity_id` follows the room naming convention.
pub fn is_room_id(entity_id: &str) -> bool {
    entity_id.starts_with(ROOM_PREFIX)
}

/// Returns true if `entity_id` names an untracked residual sensor.
pub fn is_untracked_id(entity_id: &str) -> bool {
    UNTRACKED_SUFFIXES
        .iter()
        .any(|suffix| entity_id.ends_with(suffix))
}

/// Parse a state string the way dashboards read sensor values.
///
/// Leading whitespace is skipped and the longest numeric prefix is used, so
/// `"12.5 W"` reads as `12.5`. Returns `None` when no number can be read
/// (e.g. `"unavailable"`).
pub fn parse_number(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        let n = digits_from(end + 1);
        if int_digits > 0 || n > 0 {
            end += 1 + n;
            frac_digits = n;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let n = digits_from(exp_start);
        if n > 0 {
            end = exp_start + n;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Deserialize a state that may arrive as a string or a bare scalar.
///
/// Home Assistant always sends strings, but hand-written fixtures and other
/// hosts commonly use numbers. Everything is kept in its textual form.
fn deserialize_state<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StateText;

    impl<'de> de::Visitor<'de> for StateText {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("string, number, boolean, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StateText)
}

/// A state object as the host sends it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HostState {
    /// Empty when the state came from an id-keyed map; filled in on ingest.
    #[serde(default)]
    pub entity_id: String,

    #[serde(default, deserialize_with = "deserialize_state")]
    pub state: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl HostState {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// The two document shapes accepted for a state dump: the `/api/states`
/// list, or the `hass.states` object keyed by entity id.
#[derive(Deserialize)]
#[serde(untagged)]
enum StatesDocument {
    List(Vec<HostState>),
    Map(BTreeMap<String, HostState>),
}

/// A declared child of a room, classified by the producer's naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entity_id", rename_all = "snake_case")]
pub enum ChildRef {
    /// Another room; the tree recurses into it.
    Room(String),
    /// A terminal measurement.
    Sensor(String),
}

impl ChildRef {
    /// Classify a child id. Untracked residual ids never become children.
    pub fn classify(entity_id: &str) -> Option<Self> {
        if is_untracked_id(entity_id) {
            None
        } else if is_room_id(entity_id) {
            Some(ChildRef::Room(entity_id.to_string()))
        } else {
            Some(ChildRef::Sensor(entity_id.to_string()))
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            ChildRef::Room(id) | ChildRef::Sensor(id) => id,
        }
    }

    pub fn is_room(&self) -> bool {
        matches!(self, ChildRef::Room(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Carries a `selected_entities` attribute (untracked ids removed).
    Composite { children: Vec<ChildRef> },
    Leaf,
}

/// One ingested entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub entity_id: String,
    /// Raw state text.
    pub state: String,
    /// Parsed numeric state, `None` when not a number.
    pub value: Option<f64>,
    pub friendly_name: Option<String>,
    pub unit: Option<String>,
    pub icon: Option<String>,
    pub kind: EntityKind,
    pub attributes: Map<String, Value>,
}

impl Entity {
    /// Friendly name, or the entity id when none is set.
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.entity_id)
    }

    /// Unit of measurement, empty when unset.
    pub fn unit_or_empty(&self) -> &str {
        self.unit.as_deref().unwrap_or_default()
    }

    /// Declared children, `None` for leaf sensors.
    pub fn children(&self) -> Option<&[ChildRef]> {
        match &self.kind {
            EntityKind::Composite { children } => Some(children),
            EntityKind::Leaf => None,
        }
    }
}

fn string_attribute(attributes: &Map<String, Value>, key: &str) -> Option<String> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<HostState> for Entity {
    fn from(raw: HostState) -> Self {
        let attributes = raw.attributes;
        let kind = match attributes.get(SELECTED_ENTITIES).and_then(Value::as_array) {
            Some(ids) => EntityKind::Composite {
                children: ids
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(ChildRef::classify)
                    .collect(),
            },
            None => EntityKind::Leaf,
        };

        Entity {
            value: parse_number(&raw.state),
            friendly_name: string_attribute(&attributes, "friendly_name"),
            unit: string_attribute(&attributes, "unit_of_measurement"),
            icon: string_attribute(&attributes, "icon"),
            entity_id: raw.entity_id,
            state: raw.state,
            kind,
            attributes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read state dump {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse state dump: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable view of every entity state at one point in time.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    entities: HashMap<String, Entity>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a sequence of host states. Later states replace earlier ones
    /// with the same id.
    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = HostState>,
    {
        let mut snapshot = Self::new();
        for state in states {
            snapshot.insert(state);
        }
        snapshot
    }

    /// Parse a JSON state dump (list or id-keyed object).
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let states = match serde_json::from_str::<StatesDocument>(json)? {
            StatesDocument::List(states) => states,
            StatesDocument::Map(states) => states
                .into_iter()
                .map(|(entity_id, mut state)| {
                    state.entity_id = entity_id;
                    state
                })
                .collect(),
        };
        let snapshot = Self::from_states(states);
        debug!("Ingested {} entity states", snapshot.len());
        Ok(snapshot)
    }

    /// Read and parse a JSON state dump from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SnapshotError::Io(path.to_path_buf(), e))?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, state: HostState) {
        let entity = Entity::from(state);
        self.entities.insert(entity.entity_id.clone(), entity);
    }

    pub fn get(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.get(entity_id)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    /// Numeric state of `entity_id`, `None` when absent or not a number.
    pub fn value_of(&self, entity_id: &str) -> Option<f64> {
        self.get(entity_id).and_then(|e| e.value)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_plain_and_prefixed() {
        assert_eq!(parse_number("120"), Some(120.0));
        assert_eq!(parse_number("  12.5 W"), Some(12.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("1e3kWh"), Some(1000.0));
        assert_eq!(parse_number("2e"), Some(2.0));
        assert_eq!(parse_number("Infinity"), Some(f64::INFINITY));
    }

    #[test]
    fn test_parse_number_rejects_non_numeric() {
        assert_eq!(parse_number("unavailable"), None);
        assert_eq!(parse_number("unknown"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("W 12"), None);
    }

    #[test]
    fn test_untracked_ids() {
        assert!(is_untracked_id("sensor.energy_power_monitor_kitchen_untracked_power"));
        assert!(is_untracked_id("sensor.energy_power_monitor_kitchen_untracked_energy"));
        assert!(!is_untracked_id("sensor.energy_power_monitor_kitchen_power"));
    }

    #[test]
    fn test_children_are_classified_on_ingest() {
        let snapshot = StateSnapshot::from_states([HostState::new(
            "sensor.energy_power_monitor_kitchen_power",
            "160",
        )
        .with_attribute(
            "selected_entities",
            json!([
                "sensor.energy_power_monitor_kitchen_fridge_power",
                "sensor.kitchen_lamp_power",
                "sensor.energy_power_monitor_kitchen_untracked_power",
            ]),
        )]);

        let kitchen = snapshot
            .get("sensor.energy_power_monitor_kitchen_power")
            .unwrap();
        assert_eq!(
            kitchen.children(),
            Some(
                &[
                    ChildRef::Room("sensor.energy_power_monitor_kitchen_fridge_power".to_string()),
                    ChildRef::Sensor("sensor.kitchen_lamp_power".to_string()),
                ][..]
            )
        );
    }

    #[test]
    fn test_empty_child_list_is_still_composite() {
        let snapshot = StateSnapshot::from_states([HostState::new("sensor.energy_power_monitor_empty", "0")
            .with_attribute("selected_entities", json!([]))]);
        let entity = snapshot.get("sensor.energy_power_monitor_empty").unwrap();
        assert_eq!(entity.kind, EntityKind::Composite { children: vec![] });
    }

    #[test]
    fn test_from_json_list_document() {
        let json = r#"[
            {
                "entity_id": "sensor.kitchen_lamp_power",
                "state": "40",
                "attributes": {
                    "friendly_name": "Kitchen Lamp Power",
                    "unit_of_measurement": "W",
                    "icon": "mdi:lamp"
                }
            },
            {"entity_id": "sensor.counter", "state": 7}
        ]"#;

        let snapshot = StateSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.len(), 2);

        let lamp = snapshot.get("sensor.kitchen_lamp_power").unwrap();
        assert_eq!(lamp.value, Some(40.0));
        assert_eq!(lamp.display_name(), "Kitchen Lamp Power");
        assert_eq!(lamp.unit_or_empty(), "W");
        assert_eq!(lamp.icon.as_deref(), Some("mdi:lamp"));
        assert_eq!(lamp.kind, EntityKind::Leaf);

        let counter = snapshot.get("sensor.counter").unwrap();
        assert_eq!(counter.state, "7");
        assert_eq!(counter.display_name(), "sensor.counter");
        assert_eq!(counter.unit_or_empty(), "");
    }

    #[test]
    fn test_from_json_keyed_document() {
        let json = r#"{
            "sensor.kitchen_lamp_power": {"state": "unavailable", "attributes": {}}
        }"#;

        let snapshot = StateSnapshot::from_json(json).unwrap();
        let lamp = snapshot.get("sensor.kitchen_lamp_power").unwrap();
        assert_eq!(lamp.entity_id, "sensor.kitchen_lamp_power");
        assert_eq!(lamp.value, None);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            StateSnapshot::from_json("\"nope\""),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = StateSnapshot::load("/nonexistent/powermon/states.json").await;
        assert!(matches!(result, Err(SnapshotError::Io(_, _))));
    }
}

use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::names::PrefixMatch;
use super::names::normalize;
use super::names::strip_ancestor_prefix;
use super::untracked::untracked_value_of;
use super::DisplayOptions;
use crate::state::ChildRef;
use crate::state::StateSnapshot;

/// One derived node of the power tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub entity_id: String,

    /// Normalized label.
    pub friendly_name: String,

    /// Own numeric state, `None` when not a number.
    pub value: Option<f64>,

    /// Unit of measurement, empty when unset.
    pub unit: String,

    /// Depth below the root the tree was built from.
    pub level: usize,

    pub untracked_value: Option<f64>,

    /// Untracked share of the base value, rounded. Not clamped, so a residual
    /// larger than its base reads above 100.
    pub percentage: u32,
}

/// Untracked share of `base` in whole percent.
///
/// Zero unless both values are present and positive.
pub fn percentage_of(untracked: Option<f64>, base: Option<f64>) -> u32 {
    match (untracked, base) {
        (Some(untracked), Some(base)) if untracked > 0.0 && base > 0.0 => {
            (untracked / base * 100.0).round() as u32
        }
        _ => 0,
    }
}

/// Value the untracked share of a room is measured against.
pub(super) fn base_value(
    value: Option<f64>,
    untracked: Option<f64>,
    options: &DisplayOptions,
) -> Option<f64> {
    if !options.combine_value_untracked {
        return value;
    }
    match untracked {
        Some(untracked) => value.map(|v| v + untracked),
        None => value,
    }
}

/// Derive the power tree below `root_id`.
///
/// The result is pre-ordered depth-first: each room is followed by its
/// children's contributions in declaration order. An unknown root, or one
/// without a child list, yields no nodes. The same entity may appear more
/// than once when several rooms reference it.
pub fn build_tree(
    root_id: &str,
    store: &StateSnapshot,
    options: &DisplayOptions,
) -> Vec<TreeNode> {
    let mut walk = Walk {
        store,
        options,
        ancestors: Vec::new(),
        nodes: Vec::new(),
    };
    walk.room(root_id, 0, "");
    debug!("Built {} tree nodes below {}", walk.nodes.len(), root_id);
    walk.nodes
}

struct Walk<'a> {
    store: &'a StateSnapshot,
    options: &'a DisplayOptions,
    /// Rooms on the current path, to cut reference cycles.
    ancestors: Vec<String>,
    nodes: Vec<TreeNode>,
}

impl Walk<'_> {
    fn room(&mut self, entity_id: &str, level: usize, inherited_prefix: &str) {
        let store = self.store;
        let options = self.options;

        let Some(entity) = store.get(entity_id) else {
            debug!("Room {} not found in snapshot", entity_id);
            return;
        };
        let Some(children) = entity.children() else {
            debug!("No selected entities found for {}", entity_id);
            return;
        };
        if self.ancestors.iter().any(|a| a == entity_id) {
            warn!("Room {} references itself through its children, skipping", entity_id);
            return;
        }

        let mut name = normalize(entity.display_name());
        let mut prefix = inherited_prefix.to_string();
        if options.clean_subelement_names {
            if level == 1 {
                prefix = format!("{name} ");
            } else if level > 1 {
                name = strip_ancestor_prefix(&name, &prefix, PrefixMatch::Exact);
            }
        }

        let untracked_value = untracked_value_of(entity_id, store);
        let percentage = percentage_of(
            untracked_value,
            base_value(entity.value, untracked_value, options),
        );
        debug!(
            "Room {} at level {}: value={:?} untracked={:?} percentage={}",
            entity_id, level, entity.value, untracked_value, percentage
        );

        let child_prefix = match (options.clean_subelement_names, level) {
            (false, _) => String::new(),
            (true, 0) => format!("{name} "),
            (true, _) => prefix.clone(),
        };

        self.nodes.push(TreeNode {
            entity_id: entity_id.to_string(),
            friendly_name: name,
            value: entity.value,
            unit: entity.unit_or_empty().to_string(),
            level,
            untracked_value,
            percentage,
        });

        self.ancestors.push(entity_id.to_string());
        for child in children {
            match child {
                ChildRef::Room(child_id) => self.room(child_id, level + 1, &child_prefix),
                ChildRef::Sensor(child_id) if options.show_children => {
                    let node = self.sensor(child_id, level + 1, &prefix);
                    self.nodes.push(node);
                }
                ChildRef::Sensor(_) => {}
            }
        }
        self.ancestors.pop();
    }

    /// Node for a leaf sensor, measured against its own raw value.
    fn sensor(&self, entity_id: &str, level: usize, prefix: &str) -> TreeNode {
        let entity = self.store.get(entity_id);

        let mut name = normalize(entity.map_or(entity_id, |e| e.display_name()));
        if self.options.clean_subelement_names {
            name = strip_ancestor_prefix(&name, prefix, PrefixMatch::IgnoreCase);
        }

        let value = entity.and_then(|e| e.value);
        let untracked_value = untracked_value_of(entity_id, self.store);

        TreeNode {
            entity_id: entity_id.to_string(),
            friendly_name: name,
            value,
            unit: entity
                .map(|e| e.unit_or_empty().to_string())
                .unwrap_or_default(),
            level,
            untracked_value,
            percentage: percentage_of(untracked_value, value),
        }
    }
}

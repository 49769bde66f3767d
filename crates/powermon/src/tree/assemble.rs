use std::collections::HashMap;
use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::border::BorderStyle;
use super::border::border_style;
use super::builder::TreeNode;
use super::builder::base_value;
use super::builder::percentage_of;
use super::names::LABEL_LINE_LENGTH;
use super::names::locale_cmp;
use super::names::split_label;
use super::untracked::untracked_value_of;
use super::DisplayOptions;
use crate::state::ChildRef;
use crate::state::Entity;
use crate::state::StateSnapshot;

/// Entity ids already emitted during one assembly pass.
#[derive(Debug, Default)]
pub struct Visited(HashSet<String>);

impl Visited {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entity_id`, returning false if it was already recorded.
    pub fn first_visit(&mut self, entity_id: &str) -> bool {
        if self.0.contains(entity_id) {
            return false;
        }
        self.0.insert(entity_id.to_string())
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.0.contains(entity_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A node shaped for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayNode {
    pub entity_id: String,

    /// Label, either the derived tree name or the entity id.
    pub name: String,

    /// `name` wrapped for display, empty when names are hidden.
    pub name_lines: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Displayed value, including the untracked residual when combining.
    pub value: f64,

    pub unit: String,

    pub value_text: String,

    pub untracked_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub untracked_text: Option<String>,

    pub percentage: u32,

    pub border: BorderStyle,

    /// Nesting depth in the display tree.
    pub depth: usize,

    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    /// Depth-first iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Vec<&DisplayNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}

fn format_number(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

fn measurement_text(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format_number(value)
    } else {
        format!("{} {}", format_number(value), unit)
    }
}

/// Nest, sort and deduplicate a built tree for display.
///
/// See [`assemble_with`]; this starts from an empty [`Visited`] set.
pub fn assemble(
    nodes: &[TreeNode],
    store: &StateSnapshot,
    options: &DisplayOptions,
) -> Vec<DisplayNode> {
    let mut visited = Visited::new();
    assemble_with(nodes, store, options, &mut visited)
}

/// Nest, sort and deduplicate a built tree for display.
///
/// Every node of `nodes` is offered at the top level in order; each one
/// pulls in its children from the entity's own child list, sorted by live
/// friendly name. An entity already present in `visited` is skipped, so an
/// entity referenced by several rooms appears once, under the first room
/// reached. Normally only the root survives at the top level.
pub fn assemble_with(
    nodes: &[TreeNode],
    store: &StateSnapshot,
    options: &DisplayOptions,
    visited: &mut Visited,
) -> Vec<DisplayNode> {
    let mut index = HashMap::new();
    for node in nodes {
        index.entry(node.entity_id.as_str()).or_insert(node);
    }

    let assembler = Assembler {
        index,
        store,
        options,
    };

    nodes
        .iter()
        .filter_map(|node| {
            let item = Item {
                entity_id: &node.entity_id,
                label: &node.friendly_name,
                node: Some(node),
            };
            assembler.shape(item, 0, visited)
        })
        .collect()
}

struct Item<'a> {
    entity_id: &'a str,
    label: &'a str,
    node: Option<&'a TreeNode>,
}

struct Assembler<'a> {
    /// First occurrence of each entity in the built tree.
    index: HashMap<&'a str, &'a TreeNode>,
    store: &'a StateSnapshot,
    options: &'a DisplayOptions,
}

impl<'a> Assembler<'a> {
    fn sort_name(&self, entity_id: &'a str) -> &'a str {
        self.store
            .get(entity_id)
            .map_or(entity_id, |e| e.display_name())
    }

    fn shape(&self, item: Item<'a>, depth: usize, visited: &mut Visited) -> Option<DisplayNode> {
        if !visited.first_visit(item.entity_id) {
            debug!("Entity already rendered: {}", item.entity_id);
            return None;
        }

        let entity = self.store.get(item.entity_id);
        let (value, unit, untracked_value, percentage) = match item.node {
            Some(node) => (
                node.value,
                node.unit.clone(),
                node.untracked_value,
                node.percentage,
            ),
            None => {
                let value = entity.and_then(|e| e.value);
                let untracked = untracked_value_of(item.entity_id, self.store);
                (
                    value,
                    entity
                        .map(|e| e.unit_or_empty().to_string())
                        .unwrap_or_default(),
                    untracked,
                    percentage_of(untracked, base_value(value, untracked, self.options)),
                )
            }
        };

        let mut shown = value.unwrap_or(0.0);
        if self.options.combine_value_untracked {
            if let Some(untracked) = untracked_value {
                shown += untracked;
            }
        }

        let untracked_text = untracked_value
            .filter(|_| self.options.show_untracked_values)
            .map(|u| format!("U: {}", measurement_text(u, &unit)));

        let mut children: Vec<&'a ChildRef> = entity
            .and_then(Entity::children)
            .map(|c| c.iter().collect())
            .unwrap_or_default();
        children.sort_by(|a, b| {
            locale_cmp(self.sort_name(a.entity_id()), self.sort_name(b.entity_id()))
        });

        let children = children
            .into_iter()
            .filter_map(|child| {
                let id = child.entity_id();
                let node = self.index.get(id).copied();
                if !self.options.show_children && !(node.is_some() && child.is_room()) {
                    return None;
                }
                let item = Item {
                    entity_id: id,
                    label: node.map_or(id, |n| n.friendly_name.as_str()),
                    node,
                };
                self.shape(item, depth + 1, visited)
            })
            .collect();

        Some(DisplayNode {
            entity_id: item.entity_id.to_string(),
            name: item.label.to_string(),
            name_lines: if self.options.show_name {
                split_label(item.label, LABEL_LINE_LENGTH)
            } else {
                Vec::new()
            },
            icon: entity
                .and_then(|e| e.icon.clone())
                .filter(|_| self.options.show_icon),
            value: shown,
            value_text: measurement_text(shown, &unit),
            unit,
            untracked_value,
            untracked_text,
            percentage,
            border: border_style(
                percentage,
                untracked_value,
                self.options.show_untracked_values,
            ),
            depth,
            children,
        })
    }
}

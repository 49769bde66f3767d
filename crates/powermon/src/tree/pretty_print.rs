//! Indented text rendering of built and assembled trees.
//!
//! Used by the `render` command and by tests to produce readable snapshots.

use super::assemble::DisplayNode;
use super::builder::TreeNode;

/// Trait for multi-line, indented pretty-printing.
pub trait PrettyPrint {
    fn pretty_print(&self, indent: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result;

    fn to_pretty_string(&self) -> String {
        struct Wrapper<'a, T: PrettyPrint + ?Sized>(&'a T);
        impl<T: PrettyPrint + ?Sized> std::fmt::Display for Wrapper<'_, T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.pretty_print(0, f)
            }
        }
        Wrapper(self).to_string()
    }
}

pub(crate) fn write_indent(indent: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for _ in 0..indent {
        write!(f, "  ")?;
    }
    Ok(())
}

fn write_optional(value: Option<f64>, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match value {
        Some(v) => write!(f, "{v}"),
        None => write!(f, "-"),
    }
}

/// Flat node, indented by its level.
impl PrettyPrint for TreeNode {
    fn pretty_print(&self, indent: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_indent(indent + self.level, f)?;
        write!(f, "{} [{}]: ", self.friendly_name, self.entity_id)?;
        write_optional(self.value, f)?;
        if self.value.is_some() && !self.unit.is_empty() {
            write!(f, " {}", self.unit)?;
        }
        write!(f, ", untracked ")?;
        write_optional(self.untracked_value, f)?;
        writeln!(f, " ({}%)", self.percentage)
    }
}

impl PrettyPrint for [TreeNode] {
    fn pretty_print(&self, indent: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in self {
            node.pretty_print(indent, f)?;
        }
        Ok(())
    }
}

impl PrettyPrint for DisplayNode {
    fn pretty_print(&self, indent: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_indent(indent, f)?;
        if self.name_lines.is_empty() {
            write!(f, "[{}]", self.entity_id)?;
        } else {
            write!(f, "{} [{}]", self.name_lines.join(" / "), self.entity_id)?;
        }
        if let Some(icon) = &self.icon {
            write!(f, " ({icon})")?;
        }
        write!(f, ": {}", self.value_text)?;
        if let Some(untracked) = &self.untracked_text {
            write!(f, ", {untracked}")?;
        }
        writeln!(f, " <{}>", self.border.label())?;

        for child in &self.children {
            child.pretty_print(indent + 1, f)?;
        }
        Ok(())
    }
}

impl PrettyPrint for [DisplayNode] {
    fn pretty_print(&self, indent: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in self {
            node.pretty_print(indent, f)?;
        }
        Ok(())
    }
}

//! The location hierarchy consumed by the selector.

use std::collections::HashSet;

use crate::error::HierarchyError;
use crate::location::RelayLocation;

/// One entry in the country → city → relay hierarchy.
///
/// Nodes are immutable once built; a new relay list produces a new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNode {
    pub location: RelayLocation,
    pub name: String,
    /// Inactive locations can still be expanded but not selected.
    pub has_active_relays: bool,
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    pub fn new(location: RelayLocation, name: impl Into<String>, has_active_relays: bool) -> Self {
        Self {
            location,
            name: name.into(),
            has_active_relays,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<LocationNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first search for a location in this subtree.
    pub fn find(&self, location: &RelayLocation) -> Option<&LocationNode> {
        if &self.location == location {
            return Some(self);
        }
        if !self.location.contains(location) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(location))
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Find a location anywhere in a list of top-level nodes.
pub fn find_node<'a>(nodes: &'a [LocationNode], location: &RelayLocation) -> Option<&'a LocationNode> {
    nodes.iter().find_map(|node| node.find(location))
}

/// Check that a source list satisfies the hierarchy invariants: top-level
/// nodes are countries, every id is unique, and every child is contained in
/// its parent one level down.
pub fn check_hierarchy(nodes: &[LocationNode]) -> Result<(), HierarchyError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !matches!(node.location, RelayLocation::Country(_)) {
            return Err(HierarchyError::NotACountry(node.location.clone()));
        }
        check_node(node, &mut seen)?;
    }
    Ok(())
}

fn check_node<'a>(
    node: &'a LocationNode,
    seen: &mut HashSet<&'a RelayLocation>,
) -> Result<(), HierarchyError> {
    if !seen.insert(&node.location) {
        return Err(HierarchyError::DuplicateLocation(node.location.clone()));
    }
    for child in &node.children {
        if child.location.parent().as_ref() != Some(&node.location) {
            return Err(HierarchyError::MisplacedChild {
                parent: node.location.clone(),
                child: child.location.clone(),
            });
        }
        check_node(child, seen)?;
    }
    Ok(())
}

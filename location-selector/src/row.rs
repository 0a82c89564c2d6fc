//! Location rows: the recursive country → city → relay nodes of a tree.

use std::time::Instant;

use relay_list::RelayLocation;

use crate::section::{ExpandableSection, SectionStep};
use crate::transitions::TransitionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLevel {
    Country,
    City,
    Relay,
}

impl RowLevel {
    pub fn of(location: &RelayLocation) -> Self {
        match location {
            RelayLocation::Country(_) => RowLevel::Country,
            RelayLocation::City(..) => RowLevel::City,
            RelayLocation::Hostname(..) => RowLevel::Relay,
        }
    }
}

/// Everything a row renders from. Rows compare these to decide whether a
/// re-render can be skipped.
#[derive(Debug, Clone)]
pub struct RowProps {
    pub name: String,
    pub location: RelayLocation,
    pub has_active_relays: bool,
    pub selected: bool,
    pub expanded: bool,
    pub children: Vec<RowProps>,
}

impl RowProps {
    pub fn level(&self) -> RowLevel {
        RowLevel::of(&self.location)
    }

    pub fn is_selectable(&self) -> bool {
        self.has_active_relays
    }

    /// Structural equality over the whole subtree.
    ///
    /// Children are compared by position, not matched up by location, so a
    /// reordered child list counts as a change.
    pub fn props_equal(&self, other: &RowProps) -> bool {
        if self.children.len() != other.children.len() {
            return false;
        }

        if self.name != other.name
            || self.has_active_relays != other.has_active_relays
            || self.selected != other.selected
            || self.expanded != other.expanded
            || self.location != other.location
        {
            return false;
        }

        self.children
            .iter()
            .zip(&other.children)
            .all(|(current, next)| current.props_equal(next))
    }

    /// Whether the expand toggle is shown.
    ///
    /// A row whose content is a single path is flattened: a city needs more
    /// than one relay, and a country needs more than one city or a single
    /// city with more than one relay. Relays never expand.
    pub fn shows_expand_affordance(&self) -> bool {
        match self.level() {
            RowLevel::Country => match self.children.as_slice() {
                [only_child] => only_child.children.len() > 1,
                children => children.len() > 1,
            },
            RowLevel::City => self.children.len() > 1,
            RowLevel::Relay => false,
        }
    }

    /// Number of rows in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(RowProps::subtree_len).sum::<usize>()
    }
}

impl PartialEq for RowProps {
    fn eq(&self, other: &Self) -> bool {
        self.props_equal(other)
    }
}

impl Eq for RowProps {}

/// A vertical span in scroll-content coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region {
    pub top: u16,
    pub height: u16,
}

impl Region {
    pub fn new(top: u16, height: u16) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> u16 {
        self.top.saturating_add(self.height)
    }
}

/// Where a row and its (natural-height) content sit in the scroll content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowGeometry {
    pub row: Region,
    pub content: Region,
}

/// Measurements sent upward when a row goes from collapsed to expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedRegion {
    pub location: RelayLocation,
    /// The revealed content at its natural height.
    pub content: Region,
    /// The clickable row that was toggled.
    pub anchor: Region,
}

/// What a row reports to its owning tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEvent {
    Select(RelayLocation),
    Expand { location: RelayLocation, expanded: bool },
    JustExpanded(ExpandedRegion),
}

/// A mounted row: its expandable section plus the props it last rendered.
#[derive(Debug, Clone)]
pub struct LocationRow {
    location: RelayLocation,
    section: ExpandableSection,
    rendered: Option<RowProps>,
}

impl LocationRow {
    pub fn new(props: &RowProps, transition: TransitionConfig) -> Self {
        Self {
            location: props.location.clone(),
            section: ExpandableSection::new(props.expanded, transition),
            rendered: None,
        }
    }

    pub fn location(&self) -> &RelayLocation {
        &self.location
    }

    pub fn section(&self) -> &ExpandableSection {
        &self.section
    }

    pub(crate) fn section_mut(&mut self) -> &mut ExpandableSection {
        &mut self.section
    }

    pub fn rendered(&self) -> Option<&RowProps> {
        self.rendered.as_ref()
    }

    pub fn should_update(&self, next: &RowProps) -> bool {
        self.rendered
            .as_ref()
            .is_none_or(|current| !current.props_equal(next))
    }

    /// Render `props`, driving the section from the expanded flag. With
    /// `animate` off the section jumps to its resting state.
    pub fn update(
        &mut self,
        props: &RowProps,
        content_height: u16,
        animate: bool,
        now: Instant,
    ) -> SectionStep {
        let step = if animate {
            self.section
                .set_expanded(props.expanded, content_height, now)
        } else {
            if self.section.is_expanded() != props.expanded || self.section.is_animating() {
                self.section.snap(props.expanded);
            }
            SectionStep::Idle
        };
        self.rendered = Some(props.clone());
        step
    }

    /// A press on the row. Rows without active relays are disabled.
    pub fn press(&self) -> Option<RowEvent> {
        let props = self.rendered.as_ref()?;
        props
            .is_selectable()
            .then(|| RowEvent::Select(self.location.clone()))
    }

    /// A press on the expand toggle.
    pub fn toggle_expand(&self, geometry: RowGeometry) -> Vec<RowEvent> {
        let Some(props) = self.rendered.as_ref() else {
            return Vec::new();
        };
        let expanded = !props.expanded;
        let mut events = vec![RowEvent::Expand {
            location: self.location.clone(),
            expanded,
        }];
        if expanded {
            events.push(RowEvent::JustExpanded(ExpandedRegion {
                location: self.location.clone(),
                content: geometry.content,
                anchor: geometry.row,
            }));
        }
        events
    }
}

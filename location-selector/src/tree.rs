//! Location tree: one dataset's rows, their expansion state and layout.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace};
use relay_list::{LocationNode, RelayLocation};

use crate::config::SelectorConfig;
use crate::expansion::ExpansionSet;
use crate::row::{ExpandedRegion, LocationRow, Region, RowEvent, RowGeometry, RowProps};
use crate::section::SectionStep;
use crate::transitions::TransitionConfig;

/// Selectable entries that are not locations, rendered above the
/// location rows.
pub trait SpecialLocation: Clone + PartialEq + fmt::Debug {
    /// Every special entry the tree offers, in display order.
    fn all() -> Vec<Self>;
    fn label(&self) -> &'static str;
}

/// For trees without special entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSpecialLocation {}

impl SpecialLocation for NoSpecialLocation {
    fn all() -> Vec<Self> {
        Vec::new()
    }

    fn label(&self) -> &'static str {
        match *self {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialBridgeLocation {
    ClosestToExit,
}

impl SpecialLocation for SpecialBridgeLocation {
    fn all() -> Vec<Self> {
        vec![SpecialBridgeLocation::ClosestToExit]
    }

    fn label(&self) -> &'static str {
        match self {
            SpecialBridgeLocation::ClosestToExit => "Closest to exit server",
        }
    }
}

/// A selected value: a real location or a special entry, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSelection<S> {
    Relay(RelayLocation),
    Special(S),
}

/// What a laid-out line stands for. Special entries are addressed by their
/// index in [`SpecialLocation::all`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowTarget {
    Location(RelayLocation),
    Special(usize),
}

/// One visible line of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLine {
    pub target: RowTarget,
    pub label: String,
    pub depth: u16,
    /// Top edge in scroll-content coordinates.
    pub top: u16,
    pub selected: bool,
    pub active: bool,
    /// `Some(expanded)` when the row shows an expand toggle.
    pub expander: Option<bool>,
}

/// The visible lines of a tree and the geometry of every laid-out row.
#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    lines: Vec<LayoutLine>,
    geometry: HashMap<RelayLocation, RowGeometry>,
    height: u16,
    row_height: u16,
}

impl TreeLayout {
    pub fn lines(&self) -> &[LayoutLine] {
        &self.lines
    }

    /// Total content height.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Geometry of a laid-out row; rows hidden inside a collapsed section
    /// have none.
    pub fn geometry(&self, location: &RelayLocation) -> Option<RowGeometry> {
        self.geometry.get(location).copied()
    }

    /// The line covering content coordinate `y`.
    pub fn line_at(&self, y: u16) -> Option<&LayoutLine> {
        self.lines
            .iter()
            .find(|line| line.top <= y && y < line.top.saturating_add(self.row_height))
    }

    pub fn position(&self, target: &RowTarget) -> Option<usize> {
        self.lines.iter().position(|line| &line.target == target)
    }

    /// Region of the selected line, if it is laid out.
    pub fn selected_region(&self) -> Option<Region> {
        self.lines
            .iter()
            .find(|line| line.selected)
            .map(|line| Region::new(line.top, self.row_height))
    }
}

/// Counts from one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Rows whose props changed and were rendered again.
    pub rendered: usize,
    /// Rows whose props were unchanged; their subtrees were not visited.
    pub skipped: usize,
}

/// A section finished resizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeTransitionEnd {
    pub location: RelayLocation,
    pub expanded: bool,
}

/// The recursive row structure for one dataset.
///
/// The tree owns its [`ExpansionSet`], which outlives individual renders;
/// everything else is projected from the source list on each render.
#[derive(Debug)]
pub struct LocationTree<S: SpecialLocation> {
    transition: TransitionConfig,
    row_height: u16,
    source: Arc<[LocationNode]>,
    specials: Vec<S>,
    selected: Option<LocationSelection<S>>,
    expanded: ExpansionSet,
    seeded: bool,
    rows: HashMap<RelayLocation, LocationRow>,
    roots: Vec<RowProps>,
    deferred: Vec<RelayLocation>,
    layout: TreeLayout,
    last_stats: RenderStats,
}

impl<S: SpecialLocation> LocationTree<S> {
    pub fn new(config: &SelectorConfig) -> Self {
        Self {
            transition: config.transition(),
            row_height: config.row_height,
            source: Arc::from(Vec::new()),
            specials: S::all(),
            selected: None,
            expanded: ExpansionSet::new(),
            seeded: false,
            rows: HashMap::new(),
            roots: Vec::new(),
            deferred: Vec::new(),
            layout: TreeLayout {
                row_height: config.row_height,
                ..Default::default()
            },
            last_stats: RenderStats::default(),
        }
    }

    /// Render the tree for `source` with `selected` highlighted.
    ///
    /// The first build seeds the expansion set with the ancestors of the
    /// selected location so that it is visible.
    pub fn build(
        &mut self,
        source: Arc<[LocationNode]>,
        selected: Option<LocationSelection<S>>,
        now: Instant,
    ) -> RenderStats {
        if !self.seeded {
            if let Some(LocationSelection::Relay(location)) = &selected {
                for ancestor in location.ancestors() {
                    self.expanded.insert(ancestor);
                }
            }
            self.seeded = true;
        }
        self.source = source;
        self.selected = selected;
        self.render(true, now)
    }

    pub fn selected(&self) -> Option<&LocationSelection<S>> {
        self.selected.as_ref()
    }

    pub fn roots(&self) -> &[RowProps] {
        &self.roots
    }

    pub fn row(&self, location: &RelayLocation) -> Option<&LocationRow> {
        self.rows.get(location)
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    pub fn is_animating(&self) -> bool {
        self.rows.values().any(|row| row.section().is_animating())
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    pub fn is_expanded(&self, location: &RelayLocation) -> bool {
        self.expanded.contains(location)
    }

    /// Flip `location` in the expansion set and re-render. Descendants keep
    /// their own membership. Returns the new membership.
    pub fn toggle(&mut self, location: &RelayLocation, now: Instant) -> bool {
        let expanded = self.expanded.toggle(location);
        debug!("Toggled {} (expanded: {})", location, expanded);
        self.render(true, now);
        expanded
    }

    /// Set the membership of `location`, re-rendering only on change.
    pub fn set_expanded(&mut self, location: &RelayLocation, expanded: bool, now: Instant) {
        if self.expanded.contains(location) != expanded {
            self.toggle(location, now);
        }
    }

    pub fn expanded_ids(&self) -> ExpansionSet {
        self.expanded.clone()
    }

    /// Replace the whole expansion set. Sections jump to their new state
    /// without animating, as if the tree had been mounted with it.
    pub fn set_expanded_ids(&mut self, ids: ExpansionSet, now: Instant) {
        debug!("Restoring {} expanded locations", ids.len());
        self.expanded.replace(ids);
        self.seeded = true;
        self.render(false, now);
    }

    /// A press on the expand toggle of `location`. The row reports the new
    /// value, which is applied here; when it expanded, the measurements of
    /// the revealed content are returned for the owner to scroll by.
    pub fn toggle_row(&mut self, location: &RelayLocation, now: Instant) -> Option<ExpandedRegion> {
        let Some(row) = self.rows.get(location) else {
            debug!("Ignoring toggle of unknown location {}", location);
            return None;
        };
        let geometry = self.layout.geometry(location).unwrap_or_default();

        let mut just_expanded = None;
        for event in row.toggle_expand(geometry) {
            match event {
                RowEvent::Expand { location, expanded } => {
                    self.set_expanded(&location, expanded, now);
                }
                RowEvent::JustExpanded(region) => just_expanded = Some(region),
                RowEvent::Select(_) => {}
            }
        }
        just_expanded
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Classify a press on a line. Disabled rows, unknown rows and special
    /// indices this tree does not offer are ignored.
    pub fn press(&self, target: &RowTarget) -> Option<LocationSelection<S>> {
        match target {
            RowTarget::Special(index) => match self.specials.get(*index) {
                Some(special) => Some(LocationSelection::Special(special.clone())),
                None => {
                    debug!("Ignoring unknown special location {}", index);
                    None
                }
            },
            RowTarget::Location(location) => {
                let Some(row) = self.rows.get(location) else {
                    debug!("Ignoring press on unknown location {}", location);
                    return None;
                };
                match row.press() {
                    Some(RowEvent::Select(location)) => Some(LocationSelection::Relay(location)),
                    _ => {
                        trace!("Press on disabled location {}", location);
                        None
                    }
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Deferred work
    // -------------------------------------------------------------------------

    /// Locations whose collapse is waiting for a layout commit. The owner
    /// schedules [`LocationTree::commit_collapse`] for each on the next tick.
    pub fn take_deferred(&mut self) -> Vec<RelayLocation> {
        std::mem::take(&mut self.deferred)
    }

    /// Run the second step of a collapse. Rows that have since been removed
    /// are skipped. Returns true if a collapse animation started.
    pub fn commit_collapse(&mut self, location: &RelayLocation, now: Instant) -> bool {
        let content_height = match find_props(&self.roots, location) {
            Some(props) => self.natural_content_height(props, now),
            None => {
                trace!("Skipping collapse of removed location {}", location);
                return false;
            }
        };
        let Some(row) = self.rows.get_mut(location) else {
            return false;
        };
        let started = row.section_mut().commit_layout(content_height, now);
        self.relayout(now);
        started
    }

    /// Finish resizes whose duration has elapsed and refresh the layout
    /// while anything is moving.
    pub fn advance(&mut self, now: Instant) -> Vec<TreeTransitionEnd> {
        let was_animating = self.is_animating();
        let mut ended = Vec::new();
        for (location, row) in self.rows.iter_mut() {
            if let Some(end) = row.section_mut().advance(now) {
                ended.push(TreeTransitionEnd {
                    location: location.clone(),
                    expanded: end.expanded,
                });
            }
        }
        ended.sort_by(|a, b| a.location.cmp(&b.location));

        if was_animating {
            self.relayout(now);
        }
        ended
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn render(&mut self, animate: bool, now: Instant) -> RenderStats {
        let selected_location = match &self.selected {
            Some(LocationSelection::Relay(location)) => Some(location),
            _ => None,
        };
        let roots = project(&self.source, &self.expanded, selected_location);

        let mut stats = RenderStats::default();
        for root in &roots {
            self.render_row(root, animate, now, &mut stats);
        }

        let mut mounted = HashSet::new();
        for root in &roots {
            collect_locations(root, &mut mounted);
        }
        self.rows.retain(|location, _| mounted.contains(location));

        self.roots = roots;
        self.relayout(now);
        trace!(
            "Rendered tree: {} rows rendered, {} skipped",
            stats.rendered, stats.skipped
        );
        self.last_stats = stats;
        stats
    }

    fn render_row(&mut self, props: &RowProps, animate: bool, now: Instant, stats: &mut RenderStats) {
        let transition = self.transition;
        let row = self
            .rows
            .entry(props.location.clone())
            .or_insert_with(|| LocationRow::new(props, transition));

        if !row.should_update(props) {
            stats.skipped += 1;
            return;
        }
        stats.rendered += 1;

        let content_height = self.natural_content_height(props, now);
        let Some(row) = self.rows.get_mut(&props.location) else {
            return;
        };
        if row.update(props, content_height, animate, now) == SectionStep::CommitLayout {
            self.deferred.push(props.location.clone());
        }
        for child in &props.children {
            self.render_row(child, animate, now, stats);
        }
    }

    /// Height of a row's children as if its own section were fully open.
    fn natural_content_height(&self, props: &RowProps, now: Instant) -> u16 {
        props
            .children
            .iter()
            .fold(0u16, |height, child| height.saturating_add(self.row_extent(child, now)))
    }

    fn row_extent(&self, props: &RowProps, now: Instant) -> u16 {
        if !props.shows_expand_affordance() {
            return self.row_height;
        }
        let content_height = self.natural_content_height(props, now);
        self.row_height
            .saturating_add(self.section_height(props, content_height, now))
    }

    fn section_height(&self, props: &RowProps, content_height: u16, now: Instant) -> u16 {
        match self.rows.get(&props.location) {
            Some(row) => row.section().displayed_height(content_height, now),
            None if props.expanded => content_height,
            None => 0,
        }
    }

    /// Recompute lines and geometry from the current rows and sections.
    pub fn relayout(&mut self, now: Instant) {
        let mut layout = TreeLayout {
            row_height: self.row_height,
            ..Default::default()
        };
        let mut top = 0u16;

        for (index, special) in self.specials.iter().enumerate() {
            let selected = matches!(
                &self.selected,
                Some(LocationSelection::Special(current)) if current == special
            );
            layout.lines.push(LayoutLine {
                target: RowTarget::Special(index),
                label: special.label().to_string(),
                depth: 0,
                top,
                selected,
                active: true,
                expander: None,
            });
            top = top.saturating_add(self.row_height);
        }

        for root in &self.roots {
            let extent = self.layout_row(root, 0, top, now, &mut layout);
            top = top.saturating_add(extent);
        }
        layout.height = top;
        self.layout = layout;
    }

    fn layout_row(
        &self,
        props: &RowProps,
        depth: u16,
        top: u16,
        now: Instant,
        out: &mut TreeLayout,
    ) -> u16 {
        let affordance = props.shows_expand_affordance();
        out.lines.push(LayoutLine {
            target: RowTarget::Location(props.location.clone()),
            label: props.name.clone(),
            depth,
            top,
            selected: props.selected,
            active: props.has_active_relays,
            expander: affordance.then_some(props.expanded),
        });

        let content_top = top.saturating_add(self.row_height);
        let mut content = Region::new(content_top, 0);
        let mut extent = self.row_height;

        if affordance {
            let mut inner = TreeLayout {
                row_height: self.row_height,
                ..Default::default()
            };
            let mut natural = 0u16;
            for child in &props.children {
                let child_top = content_top.saturating_add(natural);
                natural = natural.saturating_add(self.layout_row(child, depth + 1, child_top, now, &mut inner));
            }

            let shown = self.section_height(props, natural, now);
            let clip = content_top.saturating_add(shown);
            out.lines
                .extend(inner.lines.into_iter().filter(|line| line.top < clip));
            out.geometry.extend(
                inner
                    .geometry
                    .into_iter()
                    .filter(|(_, geometry)| geometry.row.top < clip),
            );

            content.height = natural;
            extent = extent.saturating_add(shown);
        }

        out.geometry.insert(
            props.location.clone(),
            RowGeometry {
                row: Region::new(top, self.row_height),
                content,
            },
        );
        extent
    }
}

/// Project the source list into row props for one render pass.
fn project(
    nodes: &[LocationNode],
    expanded: &ExpansionSet,
    selected: Option<&RelayLocation>,
) -> Vec<RowProps> {
    nodes
        .iter()
        .map(|node| RowProps {
            name: node.name.clone(),
            location: node.location.clone(),
            has_active_relays: node.has_active_relays,
            selected: selected == Some(&node.location),
            expanded: expanded.contains(&node.location),
            children: project(&node.children, expanded, selected),
        })
        .collect()
}

fn collect_locations(props: &RowProps, out: &mut HashSet<RelayLocation>) {
    out.insert(props.location.clone());
    for child in &props.children {
        collect_locations(child, out);
    }
}

fn find_props<'a>(roots: &'a [RowProps], location: &RelayLocation) -> Option<&'a RowProps> {
    roots.iter().find_map(|props| {
        if &props.location == location {
            Some(props)
        } else if props.location.contains(location) {
            find_props(&props.children, location)
        } else {
            None
        }
    })
}

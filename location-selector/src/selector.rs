//! Screen-level location selector.
//!
//! Owns one tree per scope and the scroll viewport they share. Leaving a
//! scope stores a [`ScopeSnapshot`] of the scroll offset and the tree's
//! expansion set; coming back restores it, so switching between entry and
//! exit never loses the user's place.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace};
use relay_list::{Constraint, LocationNode, RelayLocation};

use crate::config::SelectorConfig;
use crate::error::SelectorError;
use crate::expansion::ExpansionSet;
use crate::row::ExpandedRegion;
use crate::scheduler::Scheduler;
use crate::scroll::{ScrollAlignment, ScrollPosition, ScrollView};
use crate::tree::{
    LayoutLine, LocationSelection, LocationTree, NoSpecialLocation, RenderStats, RowTarget,
    SpecialBridgeLocation, TreeLayout, TreeTransitionEnd,
};

/// Which hop is being picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LocationScope {
    /// The entry hop, picked among bridges.
    Entry,
    /// The exit hop, picked among relays.
    #[default]
    Exit,
}

/// Input to a render pass, supplied by the surrounding application.
#[derive(Debug, Clone)]
pub struct SelectorProps {
    pub scope: LocationScope,
    pub relay_locations: Arc<[LocationNode]>,
    pub bridge_locations: Arc<[LocationNode]>,
    pub selected_exit: Option<RelayLocation>,
    /// `Any` stands for "closest to exit".
    pub selected_bridge: Option<Constraint<RelayLocation>>,
    pub allow_bridge_selection: bool,
}

impl Default for SelectorProps {
    fn default() -> Self {
        Self {
            scope: LocationScope::Exit,
            relay_locations: Arc::from(Vec::new()),
            bridge_locations: Arc::from(Vec::new()),
            selected_exit: None,
            selected_bridge: None,
            allow_bridge_selection: false,
        }
    }
}

impl SelectorProps {
    /// Without bridge selection there is only the exit scope.
    pub fn effective_scope(&self) -> LocationScope {
        if self.allow_bridge_selection {
            self.scope
        } else {
            LocationScope::Exit
        }
    }

    fn exit_selection(&self) -> Option<LocationSelection<NoSpecialLocation>> {
        self.selected_exit.clone().map(LocationSelection::Relay)
    }

    fn bridge_selection(&self) -> Option<LocationSelection<SpecialBridgeLocation>> {
        match &self.selected_bridge {
            Some(Constraint::Any) => Some(LocationSelection::Special(
                SpecialBridgeLocation::ClosestToExit,
            )),
            Some(Constraint::Only(location)) => Some(LocationSelection::Relay(location.clone())),
            None => None,
        }
    }
}

/// View state saved when leaving a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSnapshot {
    pub scroll_position: ScrollPosition,
    pub expanded: ExpansionSet,
}

/// Receives final selections. The selector never applies them itself.
pub trait SelectionSink {
    fn select_exit_location(&mut self, location: RelayLocation);
    fn select_bridge_location(&mut self, location: RelayLocation);
    fn select_closest_to_exit(&mut self);
}

/// Receives scope change requests.
pub trait ScopeController {
    fn change_scope(&mut self, scope: LocationScope);
}

/// Everything the selector can ask of its surroundings, for callers that
/// prefer to queue requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    SelectExit(RelayLocation),
    SelectBridge(RelayLocation),
    SelectClosestToExit,
    ChangeScope(LocationScope),
}

impl SelectionSink for Vec<SelectorEvent> {
    fn select_exit_location(&mut self, location: RelayLocation) {
        self.push(SelectorEvent::SelectExit(location));
    }

    fn select_bridge_location(&mut self, location: RelayLocation) {
        self.push(SelectorEvent::SelectBridge(location));
    }

    fn select_closest_to_exit(&mut self) {
        self.push(SelectorEvent::SelectClosestToExit);
    }
}

impl ScopeController for Vec<SelectorEvent> {
    fn change_scope(&mut self, scope: LocationScope) {
        self.push(SelectorEvent::ChangeScope(scope));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SelectorTask {
    CommitCollapse {
        scope: LocationScope,
        location: RelayLocation,
    },
    RevealExpanded {
        scope: LocationScope,
        location: RelayLocation,
        dy: i32,
    },
    RemovePadding {
        generation: u64,
    },
}

#[derive(Debug)]
pub struct LocationSelector {
    config: SelectorConfig,
    props: SelectorProps,
    scope: LocationScope,
    mounted: bool,
    exit_tree: LocationTree<NoSpecialLocation>,
    bridge_tree: LocationTree<SpecialBridgeLocation>,
    scroll: ScrollView,
    snapshots: HashMap<LocationScope, ScopeSnapshot>,
    scheduler: Scheduler<SelectorTask>,
    padding_generation: u64,
}

impl LocationSelector {
    pub fn new(config: SelectorConfig) -> Result<Self, SelectorError> {
        config.validate()?;
        Ok(Self {
            exit_tree: LocationTree::new(&config),
            bridge_tree: LocationTree::new(&config),
            scroll: ScrollView::new(config.viewport_height, config.transition()),
            props: SelectorProps::default(),
            scope: LocationScope::Exit,
            mounted: false,
            snapshots: HashMap::new(),
            scheduler: Scheduler::new(),
            padding_generation: 0,
            config,
        })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn props(&self) -> &SelectorProps {
        &self.props
    }

    pub fn scope(&self) -> LocationScope {
        self.scope
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn scroll_view(&self) -> &ScrollView {
        &self.scroll
    }

    pub fn scroll_position(&self) -> ScrollPosition {
        self.scroll.position()
    }

    pub fn snapshot(&self, scope: LocationScope) -> Option<&ScopeSnapshot> {
        self.snapshots.get(&scope)
    }

    pub fn exit_tree(&self) -> &LocationTree<NoSpecialLocation> {
        &self.exit_tree
    }

    pub fn bridge_tree(&self) -> &LocationTree<SpecialBridgeLocation> {
        &self.bridge_tree
    }

    pub fn expanded_ids(&self, scope: LocationScope) -> ExpansionSet {
        match scope {
            LocationScope::Exit => self.exit_tree.expanded_ids(),
            LocationScope::Entry => self.bridge_tree.expanded_ids(),
        }
    }

    pub fn layout(&self, scope: LocationScope) -> &TreeLayout {
        match scope {
            LocationScope::Exit => self.exit_tree.layout(),
            LocationScope::Entry => self.bridge_tree.layout(),
        }
    }

    pub fn active_layout(&self) -> &TreeLayout {
        self.layout(self.scope)
    }

    /// Lines of the active tree that intersect the viewport.
    pub fn visible_lines(&self) -> Vec<&LayoutLine> {
        let top = self.scroll.position().y;
        let bottom = top.saturating_add(self.scroll.viewport_height());
        let row_height = self.config.row_height;
        self.active_layout()
            .lines()
            .iter()
            .filter(|line| line.top.saturating_add(row_height) > top && line.top < bottom)
            .collect()
    }

    /// When the next scheduled step becomes due.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        self.scheduler.next_deadline(now)
    }

    /// True while animations, smooth scrolls or scheduled steps are pending.
    pub fn is_busy(&self) -> bool {
        !self.scheduler.is_empty()
            || self.exit_tree.is_animating()
            || self.bridge_tree.is_animating()
            || self.scroll.is_scrolling()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// First render: build the active tree and scroll to its selection.
    pub fn mount(&mut self, props: SelectorProps, now: Instant) {
        self.scope = props.effective_scope();
        self.props = props;
        self.mounted = true;
        self.build_active(now);
        self.scroll_to_selected();
        debug!("Mounted location selector in {:?} scope", self.scope);
    }

    /// Render with new props. A scope change snapshots the scope being
    /// left before switching, then restores the snapshot of the scope being
    /// entered or falls back to scrolling to its selection.
    pub fn render(&mut self, props: SelectorProps, now: Instant) -> RenderStats {
        if !self.mounted {
            self.mount(props, now);
            return self.active_stats();
        }

        let previous = self.scope;
        let next = props.effective_scope();
        if previous == next {
            self.props = props;
            return self.build_active(now);
        }

        let snapshot = self.capture(previous);
        self.clear_padding();
        self.props = props;
        self.scope = next;
        let stats = self.build_active(now);
        self.restore(next, now);
        debug!(
            "Switched scope {:?} -> {:?}, saved scroll {:?}",
            previous, next, snapshot.scroll_position
        );
        self.snapshots.insert(previous, snapshot);
        stats
    }

    /// Tear down: trees, snapshots and pending work do not outlive the view.
    pub fn unmount(&mut self) {
        self.exit_tree = LocationTree::new(&self.config);
        self.bridge_tree = LocationTree::new(&self.config);
        self.snapshots.clear();
        self.scheduler.clear();
        self.clear_padding();
        self.mounted = false;
        debug!("Unmounted location selector");
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.scroll.set_viewport_height(height.max(1));
    }

    /// User scrolling.
    pub fn scroll_to(&mut self, x: u16, y: u16) {
        self.scroll.scroll_to(x, y);
    }

    pub fn scroll_by(&mut self, dy: i32) {
        let position = self.scroll.position();
        let y = (position.y as i32 + dy).clamp(0, u16::MAX as i32) as u16;
        self.scroll.scroll_to(position.x, y);
    }

    // -------------------------------------------------------------------------
    // User input
    // -------------------------------------------------------------------------

    /// Ask the scope controller to switch scope. Ignored when bridge
    /// selection is not allowed or the scope is already active.
    pub fn request_scope(&self, scope: LocationScope, controller: &mut impl ScopeController) -> bool {
        if !self.props.allow_bridge_selection || scope == self.scope {
            return false;
        }
        controller.change_scope(scope);
        true
    }

    /// A press on a line of the active tree. Resolved selections go to
    /// `sink`; disabled rows and unknown entries are dropped.
    pub fn press(&self, target: &RowTarget, sink: &mut impl SelectionSink) {
        match self.scope {
            LocationScope::Exit => match self.exit_tree.press(target) {
                Some(LocationSelection::Relay(location)) => {
                    debug!("Selected exit location {}", location);
                    sink.select_exit_location(location);
                }
                Some(LocationSelection::Special(never)) => match never {},
                None => {}
            },
            LocationScope::Entry => match self.bridge_tree.press(target) {
                Some(LocationSelection::Relay(location)) => {
                    debug!("Selected bridge location {}", location);
                    sink.select_bridge_location(location);
                }
                Some(LocationSelection::Special(SpecialBridgeLocation::ClosestToExit)) => {
                    debug!("Selected closest to exit");
                    sink.select_closest_to_exit();
                }
                None => {}
            },
        }
    }

    /// A press on the expand toggle of `location` in the active tree.
    pub fn toggle(&mut self, location: &RelayLocation, now: Instant) {
        let just_expanded = match self.scope {
            LocationScope::Exit => self.exit_tree.toggle_row(location, now),
            LocationScope::Entry => self.bridge_tree.toggle_row(location, now),
        };
        self.schedule_deferred();
        self.sync_content();
        if let Some(region) = just_expanded {
            self.on_just_expanded(region, now);
        }
    }

    /// Run due tasks and move animations forward. Returns
    /// [`LocationSelector::is_busy`].
    pub fn advance(&mut self, now: Instant) -> bool {
        for task in self.scheduler.take_due(now) {
            self.run_task(task, now);
        }

        let mut ended = self.exit_tree.advance(now);
        ended.extend(self.bridge_tree.advance(now));
        for TreeTransitionEnd { location, expanded } in ended {
            trace!("Transition ended for {} (expanded: {})", location, expanded);
        }

        self.schedule_deferred();
        self.sync_content();
        self.scroll.advance(now);
        self.is_busy()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn active_stats(&self) -> RenderStats {
        match self.scope {
            LocationScope::Exit => self.exit_tree.last_stats(),
            LocationScope::Entry => self.bridge_tree.last_stats(),
        }
    }

    fn build_active(&mut self, now: Instant) -> RenderStats {
        let stats = match self.scope {
            LocationScope::Exit => {
                let selection = self.props.exit_selection();
                self.exit_tree
                    .build(Arc::clone(&self.props.relay_locations), selection, now)
            }
            LocationScope::Entry => {
                let selection = self.props.bridge_selection();
                self.bridge_tree
                    .build(Arc::clone(&self.props.bridge_locations), selection, now)
            }
        };
        self.schedule_deferred();
        self.sync_content();
        stats
    }

    fn capture(&self, scope: LocationScope) -> ScopeSnapshot {
        ScopeSnapshot {
            scroll_position: self.scroll.position(),
            expanded: self.expanded_ids(scope),
        }
    }

    fn restore(&mut self, scope: LocationScope, now: Instant) {
        let Some(snapshot) = self.snapshots.get(&scope).cloned() else {
            trace!("No snapshot for {:?}, scrolling to selection", scope);
            self.scroll_to_selected();
            return;
        };
        match scope {
            LocationScope::Exit => self.exit_tree.set_expanded_ids(snapshot.expanded, now),
            LocationScope::Entry => self.bridge_tree.set_expanded_ids(snapshot.expanded, now),
        }
        self.sync_content();
        let ScrollPosition { x, y } = snapshot.scroll_position;
        self.scroll.scroll_to(x, y);
    }

    /// Scroll the selected row to the middle of the viewport, or to the top
    /// when nothing selected is laid out.
    fn scroll_to_selected(&mut self) {
        match self.active_layout().selected_region() {
            Some(region) => self.scroll.scroll_to_region(region, ScrollAlignment::Middle),
            None => self.scroll.scroll_to_top(),
        }
    }

    fn sync_content(&mut self) {
        let height = self.active_layout().height();
        self.scroll.set_content_height(height);
    }

    fn clear_padding(&mut self) {
        self.padding_generation += 1;
        self.scroll.set_padding_bottom(0);
    }

    fn schedule_deferred(&mut self) {
        for location in self.exit_tree.take_deferred() {
            self.scheduler.next_tick(SelectorTask::CommitCollapse {
                scope: LocationScope::Exit,
                location,
            });
        }
        for location in self.bridge_tree.take_deferred() {
            self.scheduler.next_tick(SelectorTask::CommitCollapse {
                scope: LocationScope::Entry,
                location,
            });
        }
    }

    /// Keep newly revealed content in view. If it would end below the
    /// viewport, pad the scroll area by its height for the duration of the
    /// expand animation and scroll down by whichever is smaller: the
    /// distance needed to show all of it, or the distance that brings the
    /// toggled row to the top.
    fn on_just_expanded(&mut self, region: ExpandedRegion, now: Instant) {
        let viewport_height = self.scroll.viewport_height() as i32;
        let anchor_top = region.anchor.top as i32 - self.scroll.position().y as i32;
        let anchor_height = region.anchor.height as i32;
        let content_height = region.content.height as i32;

        let content_bottom = anchor_top + anchor_height + content_height;
        if content_bottom <= viewport_height {
            return;
        }

        self.padding_generation += 1;
        self.scroll.set_padding_bottom(region.content.height);
        self.scheduler.after(
            now,
            self.config.transition().duration,
            SelectorTask::RemovePadding {
                generation: self.padding_generation,
            },
        );

        let to_bottom = content_bottom - viewport_height;
        let dy = to_bottom.min(anchor_top);
        debug!(
            "Revealing {} by {} rows (padding {})",
            region.location, dy, region.content.height
        );
        self.scheduler.next_tick(SelectorTask::RevealExpanded {
            scope: self.scope,
            location: region.location,
            dy,
        });
    }

    fn run_task(&mut self, task: SelectorTask, now: Instant) {
        match task {
            SelectorTask::CommitCollapse { scope, location } => {
                match scope {
                    LocationScope::Exit => self.exit_tree.commit_collapse(&location, now),
                    LocationScope::Entry => self.bridge_tree.commit_collapse(&location, now),
                };
            }
            SelectorTask::RevealExpanded {
                scope,
                location,
                dy,
            } => {
                if scope != self.scope || self.layout(scope).geometry(&location).is_none() {
                    trace!("Skipping reveal of {}: row is gone", location);
                    return;
                }
                self.scroll.scroll_by_smooth(dy, now);
            }
            SelectorTask::RemovePadding { generation } => {
                if generation == self.padding_generation {
                    self.scroll.set_padding_bottom(0);
                }
            }
        }
    }
}

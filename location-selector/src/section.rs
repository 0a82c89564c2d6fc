//! Expandable section: a region that resizes between zero and its content
//! height.
//!
//! The height is either content-driven (`Auto`), pinned to a concrete row
//! count while animating, or `Zero` at rest when collapsed. Collapsing takes
//! two steps: the current content height is pinned first, and the animation
//! to zero starts only after the owner commits that layout on the next tick
//! (see [`ExpandableSection::commit_layout`]).

use std::time::Instant;

use crate::transitions::TransitionConfig;

/// The height a section is asked to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionHeight {
    /// Follow the content; later content growth shows up without animating.
    Auto,
    /// A concrete height, used while a resize is in flight.
    Px(u16),
    Zero,
}

impl SectionHeight {
    pub fn resolve(self, content_height: u16) -> u16 {
        match self {
            SectionHeight::Auto => content_height,
            SectionHeight::Px(height) => height,
            SectionHeight::Zero => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPhase {
    Collapsed,
    Expanding,
    Expanded,
    /// Height pinned, waiting for the layout commit before collapsing.
    PendingMeasure,
    Collapsing,
}

/// What the owner has to do after changing the expanded flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SectionStep {
    Idle,
    /// Call [`ExpandableSection::commit_layout`] on the next tick.
    CommitLayout,
}

/// Emitted once when a physical resize finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEnd {
    /// The desired state at the moment the resize finished.
    pub expanded: bool,
}

#[derive(Debug, Clone, Copy)]
struct Resize {
    from: u16,
    started: Instant,
}

#[derive(Debug, Clone)]
pub struct ExpandableSection {
    expanded: bool,
    height: SectionHeight,
    phase: SectionPhase,
    resize: Option<Resize>,
    transition: TransitionConfig,
}

impl ExpandableSection {
    pub fn new(expanded: bool, transition: TransitionConfig) -> Self {
        let (height, phase) = Self::rest(expanded);
        Self {
            expanded,
            height,
            phase,
            resize: None,
            transition,
        }
    }

    fn rest(expanded: bool) -> (SectionHeight, SectionPhase) {
        if expanded {
            (SectionHeight::Auto, SectionPhase::Expanded)
        } else {
            (SectionHeight::Zero, SectionPhase::Collapsed)
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn phase(&self) -> SectionPhase {
        self.phase
    }

    pub fn height(&self) -> SectionHeight {
        self.height
    }

    pub fn is_animating(&self) -> bool {
        self.resize.is_some()
    }

    /// The height to lay out at `now`, given the content's natural height.
    pub fn displayed_height(&self, content_height: u16, now: Instant) -> u16 {
        let target = self.height.resolve(content_height);
        match self.resize {
            Some(resize) => self
                .transition
                .interpolate(resize.from, target, resize.started, now),
            None => target,
        }
    }

    /// Drive the section from the external `expanded` flag.
    pub fn set_expanded(&mut self, expanded: bool, content_height: u16, now: Instant) -> SectionStep {
        if self.expanded == expanded {
            return SectionStep::Idle;
        }
        self.expanded = expanded;

        if expanded {
            self.phase = SectionPhase::Expanding;
            if !self.resize_to(SectionHeight::Px(content_height), content_height, now) {
                self.settle();
            }
            SectionStep::Idle
        } else {
            // There is no animating from Auto, so pin the current content
            // height and shrink from there once it is committed.
            self.phase = SectionPhase::PendingMeasure;
            self.resize_to(SectionHeight::Px(content_height), content_height, now);
            SectionStep::CommitLayout
        }
    }

    /// Second half of a collapse. The effect depends on the desired state at
    /// the time this runs: if the section was expanded again in the
    /// meantime, nothing happens. Returns true if a collapse was started.
    pub fn commit_layout(&mut self, content_height: u16, now: Instant) -> bool {
        if self.expanded || self.phase != SectionPhase::PendingMeasure {
            return false;
        }
        self.phase = SectionPhase::Collapsing;
        if !self.resize_to(SectionHeight::Zero, content_height, now) {
            self.settle();
        }
        true
    }

    /// Finish the running resize if its duration has elapsed.
    pub fn advance(&mut self, now: Instant) -> Option<TransitionEnd> {
        let resize = self.resize?;
        if !self.transition.is_finished(resize.started, now) {
            return None;
        }
        self.resize = None;
        if matches!(self.phase, SectionPhase::Expanding | SectionPhase::Collapsing) {
            self.settle();
        }
        Some(TransitionEnd {
            expanded: self.expanded,
        })
    }

    /// Jump straight to the resting state for `expanded`.
    pub fn snap(&mut self, expanded: bool) {
        let (height, phase) = Self::rest(expanded);
        self.expanded = expanded;
        self.height = height;
        self.phase = phase;
        self.resize = None;
    }

    fn settle(&mut self) {
        match self.phase {
            SectionPhase::Expanding if self.expanded => {
                self.height = SectionHeight::Auto;
                self.phase = SectionPhase::Expanded;
            }
            SectionPhase::Collapsing if !self.expanded => {
                self.height = SectionHeight::Zero;
                self.phase = SectionPhase::Collapsed;
            }
            _ => {}
        }
    }

    /// Returns true if a physical resize was started.
    fn resize_to(&mut self, target: SectionHeight, content_height: u16, now: Instant) -> bool {
        let current = self.displayed_height(content_height, now);
        self.height = target;
        if current == target.resolve(content_height) {
            self.resize = None;
            false
        } else {
            self.resize = Some(Resize { from: current, started: now });
            true
        }
    }
}

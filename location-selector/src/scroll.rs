//! Scroll viewport model.

use std::time::Instant;

use crate::row::Region;
use crate::transitions::TransitionConfig;

/// Scroll offset of the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScrollPosition {
    pub x: u16,
    pub y: u16,
}

impl ScrollPosition {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Where an element should land when scrolled into view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollAlignment {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy)]
struct SmoothScroll {
    from: u16,
    to: u16,
    started: Instant,
}

/// A vertically scrolling viewport over content of a known height.
///
/// Offsets are clamped to the scrollable range, which includes any
/// temporary bottom padding.
#[derive(Debug, Clone)]
pub struct ScrollView {
    position: ScrollPosition,
    viewport_height: u16,
    content_height: u16,
    padding_bottom: u16,
    smooth: Option<SmoothScroll>,
    transition: TransitionConfig,
}

impl ScrollView {
    pub fn new(viewport_height: u16, transition: TransitionConfig) -> Self {
        Self {
            position: ScrollPosition::default(),
            viewport_height,
            content_height: 0,
            padding_bottom: 0,
            smooth: None,
            transition,
        }
    }

    pub fn position(&self) -> ScrollPosition {
        self.position
    }

    pub fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    pub fn content_height(&self) -> u16 {
        self.content_height
    }

    pub fn padding_bottom(&self) -> u16 {
        self.padding_bottom
    }

    /// Content height plus padding.
    pub fn scroll_height(&self) -> u16 {
        self.content_height.saturating_add(self.padding_bottom)
    }

    pub fn max_offset_y(&self) -> u16 {
        self.scroll_height().saturating_sub(self.viewport_height)
    }

    pub fn is_scrolling(&self) -> bool {
        self.smooth.is_some()
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
        self.clamp();
    }

    pub fn set_content_height(&mut self, height: u16) {
        self.content_height = height;
        self.clamp();
    }

    pub fn set_padding_bottom(&mut self, padding: u16) {
        self.padding_bottom = padding;
        self.clamp();
    }

    /// Jump to a position, cancelling any smooth scroll.
    pub fn scroll_to(&mut self, x: u16, y: u16) {
        self.smooth = None;
        self.position = ScrollPosition::new(x, y.min(self.max_offset_y()));
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_to(0, 0);
    }

    /// Jump so that `region` sits at `alignment` within the viewport.
    pub fn scroll_to_region(&mut self, region: Region, alignment: ScrollAlignment) {
        let y = match alignment {
            ScrollAlignment::Top => region.top,
            ScrollAlignment::Middle => region
                .top
                .saturating_add(region.height / 2)
                .saturating_sub(self.viewport_height / 2),
            ScrollAlignment::Bottom => region.bottom().saturating_sub(self.viewport_height),
        };
        self.scroll_to(self.position.x, y);
    }

    /// Start an animated scroll by `dy` rows from the current offset.
    pub fn scroll_by_smooth(&mut self, dy: i32, now: Instant) {
        let from = self.position.y;
        let to = (from as i32 + dy).clamp(0, self.max_offset_y() as i32) as u16;
        if to == from {
            self.smooth = None;
            return;
        }
        self.smooth = Some(SmoothScroll {
            from,
            to,
            started: now,
        });
    }

    /// Move a running smooth scroll forward. Returns true while it runs.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(smooth) = self.smooth else {
            return false;
        };
        let y = self
            .transition
            .interpolate(smooth.from, smooth.to, smooth.started, now);
        self.position.y = y.min(self.max_offset_y());
        if self.transition.is_finished(smooth.started, now) {
            self.smooth = None;
            return false;
        }
        true
    }

    /// Whether `region` is fully inside the viewport.
    pub fn is_visible(&self, region: Region) -> bool {
        region.top >= self.position.y
            && region.bottom() <= self.position.y.saturating_add(self.viewport_height)
    }

    fn clamp(&mut self) {
        self.position.y = self.position.y.min(self.max_offset_y());
    }
}

//! Hierarchical location selector.
//!
//! A headless model of the country → city → relay picker: expandable
//! sections, recursive rows that skip re-rendering when their subtree is
//! unchanged, per-tree expansion state and a selector that keeps one scroll
//! and expansion snapshot per scope. Time is passed in explicitly, so the
//! owner drives animations by calling `advance` from its frame loop.

pub mod config;
pub mod error;
pub mod expansion;
pub mod row;
pub mod scheduler;
pub mod scroll;
pub mod section;
pub mod selector;
pub mod transitions;
pub mod tree;

pub use config::SelectorConfig;
pub use error::SelectorError;
pub use expansion::ExpansionSet;
pub use row::{ExpandedRegion, LocationRow, Region, RowEvent, RowGeometry, RowLevel, RowProps};
pub use scheduler::Scheduler;
pub use scroll::{ScrollAlignment, ScrollPosition, ScrollView};
pub use section::{ExpandableSection, SectionHeight, SectionPhase, SectionStep, TransitionEnd};
pub use selector::{
    LocationScope, LocationSelector, ScopeController, ScopeSnapshot, SelectionSink,
    SelectorEvent, SelectorProps,
};
pub use transitions::{Easing, TransitionConfig};
pub use tree::{
    LayoutLine, LocationSelection, LocationTree, NoSpecialLocation, RenderStats, RowTarget,
    SpecialBridgeLocation, SpecialLocation, TreeLayout, TreeTransitionEnd,
};

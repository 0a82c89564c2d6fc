use std::time::{Duration, Instant};

use location_selector::{
    Easing, ExpandableSection, SectionHeight, SectionPhase, SectionStep, TransitionConfig,
    TransitionEnd,
};

fn linear() -> TransitionConfig {
    TransitionConfig::new(Duration::from_millis(100), Easing::Linear)
}

fn ms(start: Instant, millis: u64) -> Instant {
    start + Duration::from_millis(millis)
}

// =============================================================================
// Expanding
// =============================================================================

#[test]
fn test_expand_animates_then_follows_content() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(false, linear());
    assert_eq!(section.displayed_height(10, start), 0);

    let step = section.set_expanded(true, 10, start);
    assert_eq!(step, SectionStep::Idle);
    assert_eq!(section.phase(), SectionPhase::Expanding);
    assert!(section.is_animating());
    assert_eq!(section.displayed_height(10, ms(start, 50)), 5);

    assert_eq!(section.advance(ms(start, 60)), None);
    assert_eq!(
        section.advance(ms(start, 100)),
        Some(TransitionEnd { expanded: true })
    );
    assert_eq!(section.phase(), SectionPhase::Expanded);
    assert_eq!(section.height(), SectionHeight::Auto);

    // Content growth after the animation shows up directly.
    assert_eq!(section.displayed_height(14, ms(start, 200)), 14);
}

#[test]
fn test_expand_with_empty_content_settles_immediately() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(false, linear());
    let _ = section.set_expanded(true, 0, start);
    assert!(!section.is_animating());
    assert_eq!(section.phase(), SectionPhase::Expanded);
    assert_eq!(section.advance(ms(start, 100)), None);
}

#[test]
fn test_setting_same_state_is_a_no_op() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(true, linear());
    assert_eq!(section.set_expanded(true, 10, start), SectionStep::Idle);
    assert_eq!(section.phase(), SectionPhase::Expanded);
    assert!(!section.is_animating());
}

// =============================================================================
// Collapsing
// =============================================================================

#[test]
fn test_collapse_waits_for_commit() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(true, linear());

    assert_eq!(section.set_expanded(false, 10, start), SectionStep::CommitLayout);
    assert_eq!(section.phase(), SectionPhase::PendingMeasure);
    assert_eq!(section.height(), SectionHeight::Px(10));
    // Still fully open until the layout is committed.
    assert_eq!(section.displayed_height(10, ms(start, 50)), 10);

    assert!(section.commit_layout(10, ms(start, 50)));
    assert_eq!(section.phase(), SectionPhase::Collapsing);
    assert_eq!(section.displayed_height(10, ms(start, 100)), 5);

    assert_eq!(
        section.advance(ms(start, 150)),
        Some(TransitionEnd { expanded: false })
    );
    assert_eq!(section.phase(), SectionPhase::Collapsed);
    assert_eq!(section.height(), SectionHeight::Zero);
    assert_eq!(section.displayed_height(10, ms(start, 200)), 0);
}

#[test]
fn test_commit_after_reexpand_does_nothing() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(true, linear());

    let _ = section.set_expanded(false, 10, start);
    let _ = section.set_expanded(true, 10, start);
    assert_eq!(section.phase(), SectionPhase::Expanded);

    assert!(!section.commit_layout(10, ms(start, 10)));
    assert_eq!(section.phase(), SectionPhase::Expanded);
    assert_eq!(section.displayed_height(10, ms(start, 10)), 10);
}

#[test]
fn test_commit_without_pending_collapse_does_nothing() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(false, linear());
    assert!(!section.commit_layout(10, start));
    assert_eq!(section.phase(), SectionPhase::Collapsed);
}

#[test]
fn test_reverse_during_expand() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(false, linear());
    let _ = section.set_expanded(true, 10, start);

    let step = section.set_expanded(false, 10, ms(start, 50));
    assert_eq!(step, SectionStep::CommitLayout);
    assert!(section.commit_layout(10, ms(start, 60)));

    let midway = section.displayed_height(10, ms(start, 110));
    assert!(midway > 0 && midway < 10);

    assert_eq!(
        section.advance(ms(start, 160)),
        Some(TransitionEnd { expanded: false })
    );
    assert_eq!(section.phase(), SectionPhase::Collapsed);
}

// =============================================================================
// Snapping
// =============================================================================

#[test]
fn test_snap_cancels_running_resize() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(false, linear());
    let _ = section.set_expanded(true, 10, start);

    section.snap(false);
    assert!(!section.is_animating());
    assert!(!section.is_expanded());
    assert_eq!(section.phase(), SectionPhase::Collapsed);
    assert_eq!(section.advance(ms(start, 100)), None);
}

#[test]
fn test_instant_transition_finishes_on_first_advance() {
    let start = Instant::now();
    let mut section = ExpandableSection::new(false, TransitionConfig::instant());
    let _ = section.set_expanded(true, 4, start);
    assert_eq!(section.displayed_height(4, start), 4);
    assert_eq!(section.advance(start), Some(TransitionEnd { expanded: true }));
    assert_eq!(section.phase(), SectionPhase::Expanded);
}

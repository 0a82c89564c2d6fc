use std::sync::Arc;
use std::time::{Duration, Instant};

use location_selector::{
    Easing, ExpansionSet, LocationSelection, LocationTree, NoSpecialLocation, RenderStats,
    RowTarget, SelectorConfig, SpecialBridgeLocation, TreeTransitionEnd,
};
use relay_list::{LocationNode, RelayLocation, check_hierarchy};

fn config() -> SelectorConfig {
    SelectorConfig::new()
        .animation_duration(Duration::from_millis(100))
        .easing(Easing::Linear)
}

fn ms(start: Instant, millis: u64) -> Instant {
    start + Duration::from_millis(millis)
}

fn relay(country: &str, city: &str, host: &str, active: bool) -> LocationNode {
    LocationNode::new(RelayLocation::hostname(country, city, host), host, active)
}

fn city(country: &str, code: &str, name: &str, relays: Vec<LocationNode>) -> LocationNode {
    let active = relays.iter().any(|relay| relay.has_active_relays);
    LocationNode::new(RelayLocation::city(country, code), name, active).with_children(relays)
}

fn country(code: &str, name: &str, cities: Vec<LocationNode>) -> LocationNode {
    let active = cities.iter().any(|city| city.has_active_relays);
    LocationNode::new(RelayLocation::country(code), name, active).with_children(cities)
}

/// France has one city with two relays, Germany a single relay in a single
/// city and Sweden two cities with two relays each.
fn locations() -> Arc<[LocationNode]> {
    Arc::from(vec![
        country(
            "fr",
            "France",
            vec![city(
                "fr",
                "par",
                "Paris",
                vec![
                    relay("fr", "par", "fr-par-001", true),
                    relay("fr", "par", "fr-par-002", true),
                ],
            )],
        ),
        country(
            "de",
            "Germany",
            vec![city(
                "de",
                "ber",
                "Berlin",
                vec![relay("de", "ber", "de-ber-001", true)],
            )],
        ),
        country(
            "se",
            "Sweden",
            vec![
                city(
                    "se",
                    "got",
                    "Gothenburg",
                    vec![
                        relay("se", "got", "se-got-001", true),
                        relay("se", "got", "se-got-002", false),
                    ],
                ),
                city(
                    "se",
                    "sto",
                    "Stockholm",
                    vec![
                        relay("se", "sto", "se-sto-001", true),
                        relay("se", "sto", "se-sto-002", true),
                    ],
                ),
            ],
        ),
    ])
}

fn labels(tree: &LocationTree<NoSpecialLocation>) -> Vec<&str> {
    tree.layout()
        .lines()
        .iter()
        .map(|line| line.label.as_str())
        .collect()
}

fn built(now: Instant) -> LocationTree<NoSpecialLocation> {
    let mut tree = LocationTree::new(&config());
    let _ = tree.build(locations(), None, now);
    tree
}

/// Run every deferred collapse, as the owner does on the next tick.
fn commit_deferred(tree: &mut LocationTree<NoSpecialLocation>, now: Instant) {
    for location in tree.take_deferred() {
        tree.commit_collapse(&location, now);
    }
}

// =============================================================================
// Building
// =============================================================================

#[test]
fn test_initial_build_shows_countries() {
    let tree = built(Instant::now());
    assert_eq!(labels(&tree), vec!["France", "Germany", "Sweden"]);
    assert_eq!(tree.layout().height(), 3);
    assert!(tree.expanded_ids().is_empty());
}

#[test]
fn test_initial_build_renders_every_row() {
    let mut tree = LocationTree::<NoSpecialLocation>::new(&config());
    let stats = tree.build(locations(), None, Instant::now());
    assert_eq!(
        stats,
        RenderStats {
            rendered: 14,
            skipped: 0
        }
    );
}

#[test]
fn test_selection_expands_its_ancestors() {
    let sto_002 = RelayLocation::hostname("se", "sto", "se-sto-002");
    let mut tree = LocationTree::<NoSpecialLocation>::new(&config());
    let _ = tree.build(
        locations(),
        Some(LocationSelection::Relay(sto_002.clone())),
        Instant::now(),
    );

    assert!(tree.is_expanded(&RelayLocation::country("se")));
    assert!(tree.is_expanded(&RelayLocation::city("se", "sto")));
    assert!(!tree.is_animating());
    assert_eq!(
        labels(&tree),
        vec![
            "France",
            "Germany",
            "Sweden",
            "Gothenburg",
            "Stockholm",
            "se-sto-001",
            "se-sto-002"
        ]
    );
    let region = tree.layout().selected_region().unwrap();
    assert_eq!(region.top, 6);
}

#[test]
fn test_rebuild_with_same_data_skips_every_root() {
    let start = Instant::now();
    let mut tree = built(start);
    let stats = tree.build(locations(), None, ms(start, 10));
    assert_eq!(
        stats,
        RenderStats {
            rendered: 0,
            skipped: 3
        }
    );
}

#[test]
fn test_selection_change_rerenders_only_the_affected_path() {
    let start = Instant::now();
    let mut tree = built(start);
    let paris = RelayLocation::city("fr", "par");
    let stats = tree.build(
        locations(),
        Some(LocationSelection::Relay(paris)),
        ms(start, 10),
    );
    // France and Paris changed; both relays under Paris and the other two
    // countries did not.
    assert_eq!(
        stats,
        RenderStats {
            rendered: 2,
            skipped: 4
        }
    );
}

// =============================================================================
// Expansion
// =============================================================================

#[test]
fn test_toggle_renders_only_the_toggled_row() {
    let start = Instant::now();
    let mut tree = built(start);
    assert!(tree.toggle(&RelayLocation::country("se"), start));
    assert_eq!(
        tree.last_stats(),
        RenderStats {
            rendered: 1,
            skipped: 4
        }
    );
}

#[test]
fn test_skipped_rows_keep_their_open_height() {
    let start = Instant::now();
    let mut tree = built(start);
    tree.toggle(&RelayLocation::country("fr"), start);
    tree.advance(ms(start, 100));
    assert_eq!(labels(&tree), vec!["France", "Paris", "Germany", "Sweden"]);

    tree.toggle(&RelayLocation::country("se"), ms(start, 100));
    assert_eq!(
        tree.last_stats(),
        RenderStats {
            rendered: 1,
            skipped: 4
        }
    );
    tree.advance(ms(start, 200));
    assert_eq!(
        labels(&tree),
        vec!["France", "Paris", "Germany", "Sweden", "Gothenburg", "Stockholm"]
    );
    assert_eq!(tree.layout().height(), 6);
}

#[test]
fn test_expand_reveals_children_over_time() {
    let start = Instant::now();
    let mut tree = built(start);
    let sweden = RelayLocation::country("se");

    tree.toggle(&sweden, start);
    assert!(tree.is_animating());
    assert_eq!(tree.layout().height(), 3);

    assert!(tree.advance(ms(start, 50)).is_empty());
    assert_eq!(labels(&tree), vec!["France", "Germany", "Sweden", "Gothenburg"]);
    assert_eq!(tree.layout().height(), 4);

    let ended = tree.advance(ms(start, 100));
    assert_eq!(
        ended,
        vec![TreeTransitionEnd {
            location: sweden,
            expanded: true
        }]
    );
    assert_eq!(
        labels(&tree),
        vec!["France", "Germany", "Sweden", "Gothenburg", "Stockholm"]
    );
    assert!(!tree.is_animating());
}

#[test]
fn test_toggle_twice_restores_expansion_set() {
    let start = Instant::now();
    let mut tree = built(start);
    tree.set_expanded(&RelayLocation::country("fr"), true, start);
    let before = tree.expanded_ids();

    let sweden = RelayLocation::country("se");
    assert!(tree.toggle(&sweden, start));
    assert!(!tree.toggle(&sweden, start));
    assert_eq!(tree.expanded_ids(), before);
}

#[test]
fn test_collapse_keeps_descendant_expansion() {
    let start = Instant::now();
    let mut tree = built(start);
    let sweden = RelayLocation::country("se");
    let stockholm = RelayLocation::city("se", "sto");

    tree.toggle(&sweden, start);
    tree.toggle(&stockholm, start);
    tree.advance(ms(start, 100));
    assert_eq!(tree.layout().lines().len(), 7);

    // Collapse the country.
    tree.toggle(&sweden, ms(start, 200));
    assert_eq!(tree.take_deferred(), vec![sweden.clone()]);
    assert!(tree.commit_collapse(&sweden, ms(start, 210)));
    tree.advance(ms(start, 310));
    assert_eq!(labels(&tree), vec!["France", "Germany", "Sweden"]);
    assert!(tree.is_expanded(&stockholm));

    // Expanding it again brings Stockholm back open.
    tree.toggle(&sweden, ms(start, 400));
    tree.advance(ms(start, 500));
    assert_eq!(
        labels(&tree),
        vec![
            "France",
            "Germany",
            "Sweden",
            "Gothenburg",
            "Stockholm",
            "se-sto-001",
            "se-sto-002"
        ]
    );
}

#[test]
fn test_collapse_waits_for_commit() {
    let start = Instant::now();
    let mut tree = built(start);
    let sweden = RelayLocation::country("se");
    tree.toggle(&sweden, start);
    tree.advance(ms(start, 100));

    tree.toggle(&sweden, ms(start, 200));
    tree.advance(ms(start, 400));
    // Nothing shrinks before the commit runs.
    assert_eq!(tree.layout().height(), 5);

    commit_deferred(&mut tree, ms(start, 400));
    tree.advance(ms(start, 450));
    assert_eq!(tree.layout().height(), 4);
    tree.advance(ms(start, 500));
    assert_eq!(tree.layout().height(), 3);
}

#[test]
fn test_commit_for_removed_row_is_a_no_op() {
    let start = Instant::now();
    let mut tree = built(start);
    let sweden = RelayLocation::country("se");
    tree.toggle(&sweden, start);
    tree.advance(ms(start, 100));
    tree.toggle(&sweden, ms(start, 200));
    let deferred = tree.take_deferred();

    // Sweden disappears before the commit runs.
    let without_sweden: Arc<[LocationNode]> = locations()[..2].to_vec().into();
    tree.build(without_sweden, None, ms(start, 210));

    for location in deferred {
        assert!(!tree.commit_collapse(&location, ms(start, 220)));
    }
    assert!(!tree.commit_collapse(&RelayLocation::country("xx"), ms(start, 220)));
    assert_eq!(labels(&tree), vec!["France", "Germany"]);
}

#[test]
fn test_set_expanded_ids_restores_without_animation() {
    let start = Instant::now();
    let mut tree = built(start);
    let ids: ExpansionSet = [RelayLocation::country("fr"), RelayLocation::country("se")]
        .into_iter()
        .collect();

    tree.set_expanded_ids(ids.clone(), start);
    assert_eq!(tree.expanded_ids(), ids);
    assert!(!tree.is_animating());
    assert!(tree.take_deferred().is_empty());
    assert_eq!(
        labels(&tree),
        vec![
            "France",
            "Paris",
            "Germany",
            "Sweden",
            "Gothenburg",
            "Stockholm"
        ]
    );

    tree.set_expanded_ids(ExpansionSet::new(), ms(start, 10));
    assert!(!tree.is_animating());
    assert_eq!(labels(&tree), vec!["France", "Germany", "Sweden"]);
}

// =============================================================================
// Flattening
// =============================================================================

#[test]
fn test_single_paths_have_no_expander() {
    let tree = built(Instant::now());
    let lines = tree.layout().lines();
    assert_eq!(lines[0].expander, Some(false)); // France: one city, two relays
    assert_eq!(lines[1].expander, None); // Germany: one city, one relay
    assert_eq!(lines[2].expander, Some(false));
}

#[test]
fn test_relay_under_flattened_row_is_selectable() {
    let tree = built(Instant::now());
    let relay = RelayLocation::hostname("de", "ber", "de-ber-001");
    assert_eq!(
        tree.press(&RowTarget::Location(relay.clone())),
        Some(LocationSelection::Relay(relay))
    );
}

// =============================================================================
// Pressing
// =============================================================================

#[test]
fn test_press_ignores_disabled_and_unknown_rows() {
    let tree = built(Instant::now());
    let inactive = RelayLocation::hostname("se", "got", "se-got-002");
    assert_eq!(tree.press(&RowTarget::Location(inactive)), None);
    assert_eq!(
        tree.press(&RowTarget::Location(RelayLocation::country("xx"))),
        None
    );
    assert_eq!(tree.press(&RowTarget::Special(0)), None);
}

#[test]
fn test_bridge_tree_offers_closest_to_exit() {
    let mut tree = LocationTree::<SpecialBridgeLocation>::new(&config());
    tree.build(
        locations(),
        Some(LocationSelection::Special(SpecialBridgeLocation::ClosestToExit)),
        Instant::now(),
    );

    let first = &tree.layout().lines()[0];
    assert_eq!(first.target, RowTarget::Special(0));
    assert_eq!(first.label, "Closest to exit server");
    assert!(first.selected);
    assert_eq!(tree.layout().lines()[1].top, 1);

    assert_eq!(
        tree.press(&RowTarget::Special(0)),
        Some(LocationSelection::Special(SpecialBridgeLocation::ClosestToExit))
    );
    assert_eq!(tree.press(&RowTarget::Special(1)), None);
}

// =============================================================================
// Malformed input
// =============================================================================

#[test]
fn test_malformed_hierarchy_does_not_panic() {
    let start = Instant::now();
    let misplaced = country(
        "se",
        "Sweden",
        vec![city(
            "no",
            "osl",
            "Oslo",
            vec![relay("no", "osl", "no-osl-001", true)],
        )],
    );
    let duplicate = country("se", "Sweden again", Vec::new());
    let nodes: Arc<[LocationNode]> = vec![misplaced, duplicate].into();
    assert!(check_hierarchy(&nodes).is_err());

    let mut tree = LocationTree::<NoSpecialLocation>::new(&config());
    tree.build(nodes, None, start);
    let sweden = RelayLocation::country("se");
    tree.toggle(&sweden, start);
    tree.advance(ms(start, 100));
    tree.toggle(&sweden, ms(start, 200));
    commit_deferred(&mut tree, ms(start, 210));
    tree.advance(ms(start, 400));
    assert!(!tree.is_animating());
}

#[test]
fn test_flattened_rows_can_hold_expansion_without_effect() {
    let start = Instant::now();
    let mut tree = built(start);
    let germany = RelayLocation::country("de");
    let berlin = RelayLocation::city("de", "ber");

    tree.set_expanded(&germany, true, start);
    tree.set_expanded(&berlin, true, start);
    tree.advance(ms(start, 100));

    assert!(tree.is_expanded(&germany));
    assert!(tree.is_expanded(&berlin));
    assert_eq!(labels(&tree), vec!["France", "Germany", "Sweden"]);
}

// =============================================================================
// Walkthrough
// =============================================================================

#[test]
fn test_selecting_relay_keeps_expansion() {
    let start = Instant::now();
    let sweden_only: Arc<[LocationNode]> = vec![country(
        "se",
        "Sweden",
        vec![
            city(
                "se",
                "got",
                "Gothenburg",
                vec![relay("se", "got", "r3", true)],
            ),
            city(
                "se",
                "sto",
                "Stockholm",
                vec![
                    relay("se", "sto", "r1", true),
                    relay("se", "sto", "r2", true),
                ],
            ),
        ],
    )]
    .into();
    let mut tree = LocationTree::<NoSpecialLocation>::new(&config());
    tree.build(sweden_only, None, start);

    let sweden = RelayLocation::country("se");
    let stockholm = RelayLocation::city("se", "sto");
    tree.toggle_row(&sweden, start);
    assert_eq!(tree.expanded_ids().to_sorted_vec(), vec![sweden.clone()]);
    tree.toggle_row(&stockholm, start);
    tree.advance(ms(start, 100));
    assert_eq!(
        tree.expanded_ids().to_sorted_vec(),
        vec![sweden.clone(), stockholm.clone()]
    );

    let r3 = RelayLocation::hostname("se", "got", "r3");
    assert_eq!(
        tree.press(&RowTarget::Location(r3.clone())),
        Some(LocationSelection::Relay(r3))
    );
    assert!(tree.is_expanded(&sweden));
    assert!(tree.is_expanded(&stockholm));
    assert!(!tree.is_expanded(&RelayLocation::city("se", "got")));
}

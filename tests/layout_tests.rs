//! Layout engine properties
//!
//! Levels, wave placement, idempotence and edge derivation, checked on
//! fixed graphs and on generated acyclic ones.

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use taskflow::model::TaskNode;
use taskflow::workflow::{to_svg, Scene};
use taskflow::{compute_layout, LayoutSettings, TaskflowError};

fn levels(nodes: &[TaskNode]) -> Vec<(String, usize)> {
    compute_layout(nodes, &LayoutSettings::default())
        .unwrap()
        .nodes
        .into_iter()
        .map(|n| (n.id, n.level))
        .collect()
}

fn pairs(items: &[(&str, usize)]) -> Vec<(String, usize)> {
    items.iter().map(|(id, l)| (id.to_string(), *l)).collect()
}

#[test]
fn test_roots_sit_at_level_zero_on_baseline() {
    let settings = LayoutSettings::default();
    let nodes = vec![TaskNode::new("a", "A"), TaskNode::new("b", "B")];
    let layout = compute_layout(&nodes, &settings).unwrap();
    for node in &layout.nodes {
        assert_eq!(node.level, 0);
        assert_eq!(node.position.y, settings.baseline_y);
    }
}

#[test]
fn test_diamond_levels_and_edges() {
    let nodes = vec![
        TaskNode::new("A", "A"),
        TaskNode::new("B", "B").depends_on(["A"]),
        TaskNode::new("C", "C").depends_on(["A"]),
        TaskNode::new("D", "D").depends_on(["B", "C"]),
    ];
    assert_eq!(
        levels(&nodes),
        pairs(&[("A", 0), ("B", 1), ("C", 1), ("D", 2)])
    );

    let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
    let edges: Vec<(&str, &str)> = layout
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(edges, vec![("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
}

#[test]
fn test_dependents_listed_before_dependencies() {
    let nodes = vec![
        TaskNode::new("ship", "Ship").depends_on(["build"]),
        TaskNode::new("build", "Build").depends_on(["design"]),
        TaskNode::new("design", "Design"),
    ];
    assert_eq!(
        levels(&nodes),
        pairs(&[("ship", 2), ("build", 1), ("design", 0)])
    );
}

#[test]
fn test_missing_dependency_is_placed_without_edge() {
    let nodes = vec![
        TaskNode::new("a", "A"),
        TaskNode::new("b", "B").depends_on(["a", "ghost"]),
        TaskNode::new("c", "C").depends_on(["ghost"]),
    ];
    let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.node("c").unwrap().level, 1);
    assert_eq!(layout.edges.len(), 1);
    assert_eq!(layout.edges[0].from, "a");
}

#[test]
fn test_edges_run_bottom_centre_to_top_centre() {
    let settings = LayoutSettings::default();
    let nodes = vec![TaskNode::new("a", "A"), TaskNode::new("b", "B").depends_on(["a"])];
    let layout = compute_layout(&nodes, &settings).unwrap();
    let a = layout.node("a").unwrap().position;
    let b = layout.node("b").unwrap().position;
    let edge = &layout.edges[0];
    assert_eq!(edge.start.x, a.x + settings.node_width / 2.0);
    assert_eq!(edge.start.y, a.y + settings.node_height);
    assert_eq!(edge.end.x, b.x + settings.node_width / 2.0);
    assert_eq!(edge.end.y, b.y);
}

#[test]
fn test_duplicate_ids_keep_first_placement() {
    let nodes = vec![
        TaskNode::new("a", "First"),
        TaskNode::new("a", "Second").depends_on(["b"]),
        TaskNode::new("b", "B"),
    ];
    let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
    assert_eq!(layout.nodes.len(), 2);
    assert_eq!(layout.node("a").unwrap().name, "First");
    assert!(layout.edges.is_empty());
}

#[test]
fn test_cycle_is_reported() {
    let nodes = vec![
        TaskNode::new("a", "A").depends_on(["c"]),
        TaskNode::new("b", "B").depends_on(["a"]),
        TaskNode::new("c", "C").depends_on(["b"]),
    ];
    match compute_layout(&nodes, &LayoutSettings::default()) {
        Err(TaskflowError::DependencyCycle { path }) => {
            assert_eq!(path.first(), path.last());
            assert!(path.len() >= 4);
        }
        other => panic!("expected cycle, got {:?}", other),
    }

    let selfish = vec![TaskNode::new("x", "X").depends_on(["x"])];
    assert!(matches!(
        compute_layout(&selfish, &LayoutSettings::default()),
        Err(TaskflowError::DependencyCycle { .. })
    ));
}

#[test]
fn test_long_chain_listed_dependents_first() {
    const LEN: usize = 20_000;
    let nodes: Vec<TaskNode> = (0..LEN)
        .rev()
        .map(|i| {
            let node = TaskNode::new(format!("n{}", i), format!("Step {}", i));
            if i == 0 {
                node
            } else {
                node.depends_on([format!("n{}", i - 1)])
            }
        })
        .collect();

    let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
    assert_eq!(layout.nodes.len(), LEN);
    assert_eq!(layout.edges.len(), LEN - 1);
    assert_eq!(layout.node("n0").unwrap().level, 0);
    assert_eq!(layout.node(&format!("n{}", LEN - 1)).unwrap().level, LEN - 1);
}

#[test]
fn test_cycle_at_end_of_long_chain() {
    let mut nodes: Vec<TaskNode> = (1..5_000)
        .map(|i| TaskNode::new(format!("n{}", i), "step").depends_on([format!("n{}", i - 1)]))
        .collect();
    nodes.push(TaskNode::new("n0", "start").depends_on(["n4999"]));

    match compute_layout(&nodes, &LayoutSettings::default()) {
        Err(TaskflowError::DependencyCycle { path }) => {
            assert_eq!(path.len(), 5_001);
            assert_eq!(path.first(), path.last());
        }
        other => panic!("expected cycle, got {:?}", other.map(|l| l.nodes.len())),
    }
}

#[test]
fn test_empty_input_renders_blank_scene() {
    let layout = compute_layout(&[], &LayoutSettings::default()).unwrap();
    assert!(layout.is_empty());
    assert!(Scene::from_layout(&layout).is_blank());
    assert!(to_svg(&layout).starts_with("<svg"));
}

// ============================================================================
// Generated graphs
// ============================================================================

/// Acyclic graphs: node `i` may only depend on nodes before it, or on ids
/// that are absent from the input.
fn acyclic_nodes() -> impl Strategy<Value = Vec<TaskNode>> {
    prop::collection::vec(prop::collection::vec(0usize..64, 0..4), 1..30).prop_map(|deps| {
        deps.into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let dependencies: Vec<String> = raw
                    .into_iter()
                    .map(|r| {
                        let pick = r % (i + 2);
                        if pick < i {
                            format!("n{}", pick)
                        } else {
                            format!("missing{}", r)
                        }
                    })
                    .collect();
                TaskNode::new(format!("n{}", i), format!("Task {}", i)).depends_on(dependencies)
            })
            .collect()
    })
}

fn settings_strategy() -> impl Strategy<Value = LayoutSettings> {
    (50.0f64..300.0, 100.0f64..800.0).prop_map(|(column_spacing, max_offset)| LayoutSettings {
        column_spacing,
        max_offset,
        ..LayoutSettings::default()
    })
}

proptest! {
    #[test]
    fn prop_level_is_one_past_deepest_dependency(nodes in acyclic_nodes()) {
        let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
        let level: HashMap<&str, usize> =
            layout.nodes.iter().map(|n| (n.id.as_str(), n.level)).collect();
        for node in &nodes {
            let expected = if node.dependencies.is_empty() {
                0
            } else {
                1 + node
                    .dependencies
                    .iter()
                    .map(|d| level.get(d.as_str()).copied().unwrap_or(0))
                    .max()
                    .unwrap_or(0)
            };
            prop_assert_eq!(level[node.id.as_str()], expected);
        }
    }

    #[test]
    fn prop_wave_flips_every_three_and_stays_clamped(
        nodes in acyclic_nodes(),
        settings in settings_strategy(),
    ) {
        let layout = compute_layout(&nodes, &settings).unwrap();
        let mut placed: HashMap<usize, usize> = HashMap::new();
        for node in &layout.nodes {
            let k = placed.entry(node.level).or_insert(0);
            let offset = node.position.x + settings.node_width / 2.0 - settings.center_x;
            let expected_right = (*k / 3) % 2 == 0;
            prop_assert_eq!(offset > 0.0, expected_right, "node {} k={}", node.id, *k);
            prop_assert!(offset.abs() <= settings.max_offset + 1e-9);
            *k += 1;
        }
    }

    #[test]
    fn prop_layout_is_idempotent(nodes in acyclic_nodes()) {
        let settings = LayoutSettings::default();
        let first = compute_layout(&nodes, &settings).unwrap();
        let second = compute_layout(&nodes, &settings).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_edge_count_matches_present_dependencies(nodes in acyclic_nodes()) {
        let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
        let present = nodes
            .iter()
            .flat_map(|n| n.dependencies.iter())
            .filter(|d| layout.node(d).is_some())
            .count();
        prop_assert_eq!(layout.edges.len(), present);
    }
}

//! Workflow graph: layout and rendering of a project's task dependencies

pub mod layout;
pub mod render;

use std::collections::HashSet;

use crate::model::{Task, TaskNode, TaskStatus};

pub use layout::{compute_layout, Edge, Layout, LayoutSettings, PlacedNode, Point};
pub use render::{render, to_svg, DrawCommand, Scene, Surface, SvgSurface};

/// Recompute each node's `blocked` flag from the project's task statuses
///
/// A node is blocked when any dependency is not a `Done` task. A dependency
/// with no matching task is unknown and counts as not done.
pub fn mark_blocked(nodes: &mut [TaskNode], tasks: &[Task]) {
    let done: HashSet<&str> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .map(|t| t.id.as_str())
        .collect();

    for node in nodes.iter_mut() {
        node.blocked = node
            .dependencies
            .iter()
            .any(|dep| !done.contains(dep.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            status,
            project_id: "p".into(),
            members: vec![],
        }
    }

    #[test]
    fn test_mark_blocked() {
        let mut nodes = vec![
            TaskNode::new("a", "A"),
            TaskNode::new("b", "B").depends_on(["a"]),
            TaskNode::new("c", "C").depends_on(["b"]),
            TaskNode::new("d", "D").depends_on(["ghost"]),
        ];
        nodes[0].blocked = true;
        let tasks = vec![task("a", TaskStatus::Done), task("b", TaskStatus::Working)];

        mark_blocked(&mut nodes, &tasks);

        let flags: Vec<bool> = nodes.iter().map(|n| n.blocked).collect();
        assert_eq!(flags, vec![false, false, true, true]);
    }
}

//! Dependency-graph layout
//!
//! Assigns every task node a box position from its dependency depth:
//!
//! ```text
//!   level 0          [A]
//!                   /    \
//!   level 1      [B]      [C]
//!                   \    /
//!   level 2          [D]
//! ```
//!
//! Vertical position is `baseline_y + level * row_spacing`, so a node always
//! sits below every dependency. Horizontally, the k-th node placed on a level
//! goes right of the centre line for k in 0..3, left for 3..6, right again
//! for 6..9 and so on, stepping out by `column_spacing` and clamped to
//! `max_offset`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TaskflowError};
use crate::model::TaskNode;

/// Nodes placed in one direction before flipping to the other side
pub const WAVE_FLIP: usize = 3;

/// Layout parameters, in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub center_x: f64,
    pub baseline_y: f64,
    pub row_spacing: f64,
    pub column_spacing: f64,
    pub max_offset: f64,
    pub node_width: f64,
    pub node_height: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            center_x: 400.0,
            baseline_y: 40.0,
            row_spacing: 100.0,
            column_spacing: 160.0,
            max_offset: 360.0,
            node_width: 140.0,
            node_height: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Side of the centre line for the k-th node placed on a level
    pub fn for_index(k: usize) -> Self {
        if (k / WAVE_FLIP) % 2 == 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Signed horizontal offset of a box centre from the centre line
pub fn horizontal_offset(k: usize, settings: &LayoutSettings) -> f64 {
    let band = k / (2 * WAVE_FLIP);
    let step = band * WAVE_FLIP + k % WAVE_FLIP + 1;
    let magnitude = (step as f64 * settings.column_spacing).min(settings.max_offset);
    Direction::for_index(k).sign() * magnitude
}

/// A positioned task node. `position` is the top-left corner of its box.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub id: String,
    pub name: String,
    pub level: usize,
    pub position: Point,
    pub blocked: bool,
}

/// Line from a dependency's box to its dependent's box
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// The dependency
    pub from: String,
    /// The node that depends on `from`
    pub to: String,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<Edge>,
    pub node_width: f64,
    pub node_height: f64,
    index: HashMap<String, usize>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.node(id).map(|n| n.position)
    }

    pub fn level(&self, id: &str) -> Option<usize> {
        self.node(id).map(|n| n.level)
    }

    /// Smallest rectangle holding every box, `None` when empty
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;
        let mut min = first.position;
        let mut max = first.position;
        for node in &self.nodes {
            min.x = min.x.min(node.position.x);
            min.y = min.y.min(node.position.y);
            max.x = max.x.max(node.position.x);
            max.y = max.y.max(node.position.y);
        }
        max.x += self.node_width;
        max.y += self.node_height;
        Some(Bounds { min, max })
    }
}

/// Index over the input nodes; the first occurrence of an id wins
struct DependencyGraph<'a> {
    nodes: HashMap<&'a str, &'a TaskNode>,
}

impl<'a> DependencyGraph<'a> {
    fn new(tasks: &'a [TaskNode]) -> Self {
        let mut nodes = HashMap::with_capacity(tasks.len());
        for task in tasks {
            nodes.entry(task.id.as_str()).or_insert(task);
        }
        Self { nodes }
    }

    /// `max(level of deps) + 1`, 0 without deps. A missing dependency
    /// counts as level 0.
    ///
    /// Depth-first over an explicit stack, so chain length is bounded by
    /// the heap rather than the thread stack. Every `InProgress` node is on
    /// the stack, which is where a cycle's path is read from.
    fn level_of(&self, id: &'a str, marks: &mut HashMap<&'a str, Mark>) -> Result<usize> {
        if let Some(Mark::Done(level)) = marks.get(id).copied() {
            return Ok(level);
        }
        let Some(root) = self.nodes.get(id).copied() else {
            return Ok(0);
        };

        marks.insert(id, Mark::InProgress);
        let mut stack = vec![Frame::new(root)];
        while let Some(top) = stack.last_mut() {
            let node = top.node;
            if let Some(dep) = node.dependencies.get(top.next) {
                top.next += 1;
                let dep = dep.as_str();
                let Some(dep_node) = self.nodes.get(dep).copied() else {
                    debug!(task = %node.id, dependency = dep, "dependency not in workflow, counting as level 0");
                    top.record(0);
                    continue;
                };
                match marks.get(dep).copied() {
                    Some(Mark::Done(level)) => top.record(level),
                    Some(Mark::InProgress) => return Err(cycle_through(&stack, dep)),
                    None => {
                        marks.insert(dep, Mark::InProgress);
                        stack.push(Frame::new(dep_node));
                    }
                }
                continue;
            }

            let level = top.deepest.map_or(0, |d| d + 1);
            marks.insert(node.id.as_str(), Mark::Done(level));
            stack.pop();
            match stack.last_mut() {
                Some(parent) => parent.record(level),
                None => return Ok(level),
            }
        }
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy)]
enum Mark {
    InProgress,
    Done(usize),
}

/// A node being expanded: the next dependency to visit and the deepest
/// dependency level seen so far
struct Frame<'a> {
    node: &'a TaskNode,
    next: usize,
    deepest: Option<usize>,
}

impl<'a> Frame<'a> {
    fn new(node: &'a TaskNode) -> Self {
        Self {
            node,
            next: 0,
            deepest: None,
        }
    }

    fn record(&mut self, level: usize) {
        self.deepest = Some(self.deepest.map_or(level, |d| d.max(level)));
    }
}

/// Path from `dep`'s frame to the top of the stack, closed back on `dep`
fn cycle_through(stack: &[Frame<'_>], dep: &str) -> TaskflowError {
    let start = stack
        .iter()
        .position(|f| f.node.id == dep)
        .unwrap_or(0);
    let mut path: Vec<String> = stack[start..].iter().map(|f| f.node.id.clone()).collect();
    path.push(dep.to_string());
    TaskflowError::DependencyCycle { path }
}

/// Compute positions and edges for a workflow's task nodes
///
/// Nodes are placed in input order. Fails with `DependencyCycle` when the
/// dependency graph is not acyclic.
pub fn compute_layout(tasks: &[TaskNode], settings: &LayoutSettings) -> Result<Layout> {
    let graph = DependencyGraph::new(tasks);
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(tasks.len());
    let mut placed_per_level: HashMap<usize, usize> = HashMap::new();

    let mut nodes: Vec<PlacedNode> = Vec::with_capacity(tasks.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(tasks.len());
    let mut sources: Vec<&TaskNode> = Vec::with_capacity(tasks.len());

    for task in tasks {
        if index.contains_key(&task.id) {
            debug!(task = %task.id, "duplicate task id ignored");
            continue;
        }
        let level = graph.level_of(task.id.as_str(), &mut marks)?;
        let k = placed_per_level.entry(level).or_insert(0);
        let center = settings.center_x + horizontal_offset(*k, settings);
        *k += 1;

        let position = Point::new(
            center - settings.node_width / 2.0,
            settings.baseline_y + level as f64 * settings.row_spacing,
        );
        index.insert(task.id.clone(), nodes.len());
        nodes.push(PlacedNode {
            id: task.id.clone(),
            name: task.name.clone(),
            level,
            position,
            blocked: task.blocked,
        });
        sources.push(task);
    }

    let half_width = settings.node_width / 2.0;
    let mut edges = Vec::new();
    for task in sources {
        let end = nodes[index[&task.id]].position;
        for dep in &task.dependencies {
            let Some(&dep_index) = index.get(dep) else {
                continue;
            };
            let start = nodes[dep_index].position;
            edges.push(Edge {
                from: dep.clone(),
                to: task.id.clone(),
                start: Point::new(start.x + half_width, start.y + settings.node_height),
                end: Point::new(end.x + half_width, end.y),
            });
        }
    }

    Ok(Layout {
        nodes,
        edges,
        node_width: settings.node_width,
        node_height: settings.node_height,
        index,
    })
}

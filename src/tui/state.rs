//! Viewer state
//!
//! Everything the viewer draws is derived from the loaded workflow view;
//! key handling only moves the selection and the viewport.

use crate::model::{Task, TaskStatus};
use crate::ops::WorkflowView;
use crate::workflow::{Layout, PlacedNode, Point, Scene};

/// Layout units covered by one terminal column at zoom 1
pub const UNITS_PER_COLUMN: f64 = 8.0;
/// Layout units covered by one terminal row at zoom 1 (cells are tall)
pub const UNITS_PER_ROW: f64 = 16.0;

const PAN_STEP: f64 = 40.0;
const ZOOM_STEP: f64 = 1.25;
const MIN_ZOOM: f64 = 0.25;
const MAX_ZOOM: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Graph,
    Details,
}

impl PanelFocus {
    pub fn next(self) -> Self {
        match self {
            PanelFocus::Graph => PanelFocus::Details,
            PanelFocus::Details => PanelFocus::Graph,
        }
    }
}

/// Visible window onto the layout plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Point,
    pub zoom: f64,
}

impl Viewport {
    /// `[min, max]` x and y ranges in layout coordinates for a `cols` x `rows` area
    pub fn ranges(&self, cols: u16, rows: u16) -> ([f64; 2], [f64; 2]) {
        let half_w = f64::from(cols) * UNITS_PER_COLUMN / self.zoom / 2.0;
        let half_h = f64::from(rows) * UNITS_PER_ROW / self.zoom / 2.0;
        (
            [self.center.x - half_w, self.center.x + half_w],
            [self.center.y - half_h, self.center.y + half_h],
        )
    }
}

#[derive(Debug)]
pub struct ViewerState {
    pub project_name: String,
    pub layout: Layout,
    pub scene: Scene,
    pub tasks: Vec<Task>,

    pub selected: Option<usize>,
    pub viewport: Viewport,
    pub focus: PanelFocus,
    pub show_help: bool,
    pub should_quit: bool,
}

impl ViewerState {
    pub fn new(view: WorkflowView) -> Self {
        let scene = Scene::from_layout(&view.layout);
        let viewport = home_viewport(&view.layout);
        let selected = (!view.layout.is_empty()).then_some(0);
        Self {
            project_name: view.workflow.project_name,
            layout: view.layout,
            scene,
            tasks: view.tasks,
            selected,
            viewport,
            focus: PanelFocus::Graph,
            show_help: false,
            should_quit: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selectors
    // ─────────────────────────────────────────────────────────────────────

    pub fn selected_node(&self) -> Option<&PlacedNode> {
        self.selected.and_then(|i| self.layout.nodes.get(i))
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.status)
    }

    /// Ids the node waits on, in edge order
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.layout
            .edges
            .iter()
            .filter(|e| e.to == id)
            .map(|e| e.from.as_str())
            .collect()
    }

    /// Ids waiting on the node
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.layout
            .edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to.as_str())
            .collect()
    }

    pub fn blocked_count(&self) -> usize {
        self.layout.nodes.iter().filter(|n| n.blocked).count()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    pub fn select_next(&mut self) {
        let len = self.layout.nodes.len();
        if len > 0 {
            self.selected = Some(self.selected.map_or(0, |i| (i + 1) % len));
        }
    }

    pub fn select_prev(&mut self) {
        let len = self.layout.nodes.len();
        if len > 0 {
            self.selected = Some(self.selected.map_or(0, |i| (i + len - 1) % len));
        }
    }

    /// Move the viewport by whole steps; positive `dy` moves down the graph
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let step = PAN_STEP / self.viewport.zoom;
        self.viewport.center.x += f64::from(dx) * step;
        self.viewport.center.y += f64::from(dy) * step;
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom = (self.viewport.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom = (self.viewport.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn reset_view(&mut self) {
        self.viewport = home_viewport(&self.layout);
    }

    /// Centre the viewport on the selected node
    pub fn focus_selected(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let center = Point::new(
            node.position.x + self.layout.node_width / 2.0,
            node.position.y + self.layout.node_height / 2.0,
        );
        self.viewport.center = center;
    }
}

/// Viewport centred on the whole graph
fn home_viewport(layout: &Layout) -> Viewport {
    let center = layout
        .bounds()
        .map(|b| b.min.midpoint(&b.max))
        .unwrap_or(Point::new(0.0, 0.0));
    Viewport { center, zoom: 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskNode, Workflow};
    use crate::workflow::{compute_layout, LayoutSettings};

    fn state() -> ViewerState {
        let nodes = vec![
            TaskNode::new("a", "Design"),
            TaskNode::new("b", "Build").depends_on(["a"]),
            TaskNode::new("c", "Ship").depends_on(["a", "b"]),
        ];
        let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
        ViewerState::new(WorkflowView {
            workflow: Workflow {
                project_id: "p1".into(),
                project_name: "Apollo".into(),
                tasks: nodes,
            },
            tasks: vec![],
            layout,
        })
    }

    #[test]
    fn test_selection_wraps() {
        let mut s = state();
        assert_eq!(s.selected, Some(0));
        s.select_prev();
        assert_eq!(s.selected, Some(2));
        s.select_next();
        assert_eq!(s.selected, Some(0));
    }

    #[test]
    fn test_dependency_selectors() {
        let s = state();
        assert_eq!(s.dependencies_of("c"), vec!["a", "b"]);
        assert_eq!(s.dependents_of("a"), vec!["b", "c"]);
        assert!(s.status_of("a").is_none());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut s = state();
        for _ in 0..50 {
            s.zoom_in();
        }
        assert_eq!(s.viewport.zoom, MAX_ZOOM);
        for _ in 0..50 {
            s.zoom_out();
        }
        assert_eq!(s.viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_pan_and_reset() {
        let mut s = state();
        let home = s.viewport;
        s.pan(1, -2);
        assert_eq!(s.viewport.center.x, home.center.x + PAN_STEP);
        assert_eq!(s.viewport.center.y, home.center.y - 2.0 * PAN_STEP);
        s.reset_view();
        assert_eq!(s.viewport, home);
    }

    #[test]
    fn test_viewport_ranges_scale_with_zoom() {
        let vp = Viewport {
            center: Point::new(0.0, 0.0),
            zoom: 2.0,
        };
        let (x, y) = vp.ranges(100, 10);
        assert_eq!(x, [-200.0, 200.0]);
        assert_eq!(y, [-40.0, 40.0]);
    }
}

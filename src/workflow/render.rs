//! Workflow rendering
//!
//! A render pass walks a [`Layout`] and issues drawing calls against a
//! [`Surface`]: one box and label per node, one arrow per edge, one
//! "depends on" caption at each edge midpoint. Every pass starts with
//! `clear()`; nothing is drawn incrementally.

use std::fmt::Write as _;

use tracing::info;

use super::layout::{Bounds, Layout, Point};

pub const EDGE_CAPTION: &str = "depends on";

const ARROW_LENGTH: f64 = 10.0;
const ARROW_HALF_WIDTH: f64 = 5.0;

/// Something a workflow can be drawn on
pub trait Surface {
    fn clear(&mut self);
    fn rect(&mut self, origin: Point, width: f64, height: f64, blocked: bool);
    fn label(&mut self, at: Point, text: &str);
    fn arrow(&mut self, from: Point, to: Point, head: [Point; 2]);
    fn caption(&mut self, at: Point, text: &str);
}

/// Wing points of an arrowhead whose tip is `to`
pub fn arrow_head(from: Point, to: Point) -> [Point; 2] {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return [to, to];
    }
    let (ux, uy) = (dx / len, dy / len);
    let base = Point::new(to.x - ux * ARROW_LENGTH, to.y - uy * ARROW_LENGTH);
    [
        Point::new(base.x - uy * ARROW_HALF_WIDTH, base.y + ux * ARROW_HALF_WIDTH),
        Point::new(base.x + uy * ARROW_HALF_WIDTH, base.y - ux * ARROW_HALF_WIDTH),
    ]
}

/// Full redraw of `layout` onto `surface`
pub fn render(layout: &Layout, surface: &mut dyn Surface) {
    surface.clear();

    if layout.is_empty() {
        info!("workflow has no tasks, rendering empty canvas");
        return;
    }

    for edge in &layout.edges {
        surface.arrow(edge.start, edge.end, arrow_head(edge.start, edge.end));
        surface.caption(edge.start.midpoint(&edge.end), EDGE_CAPTION);
    }

    for node in &layout.nodes {
        surface.rect(node.position, layout.node_width, layout.node_height, node.blocked);
        let center = Point::new(
            node.position.x + layout.node_width / 2.0,
            node.position.y + layout.node_height / 2.0,
        );
        surface.label(center, &node.name);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scene: recorded draw commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Rect {
        origin: Point,
        width: f64,
        height: f64,
        blocked: bool,
    },
    Label {
        at: Point,
        text: String,
    },
    Arrow {
        from: Point,
        to: Point,
        head: [Point; 2],
    },
    Caption {
        at: Point,
        text: String,
    },
}

/// Retained list of draw commands; replays onto any other surface
#[derive(Debug, Default, Clone)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layout(layout: &Layout) -> Self {
        let mut scene = Self::new();
        render(layout, &mut scene);
        scene
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_blank(&self) -> bool {
        self.commands.iter().all(|c| matches!(c, DrawCommand::Clear))
    }

    pub fn replay(&self, surface: &mut dyn Surface) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear => surface.clear(),
                DrawCommand::Rect {
                    origin,
                    width,
                    height,
                    blocked,
                } => surface.rect(*origin, *width, *height, *blocked),
                DrawCommand::Label { at, text } => surface.label(*at, text),
                DrawCommand::Arrow { from, to, head } => surface.arrow(*from, *to, *head),
                DrawCommand::Caption { at, text } => surface.caption(*at, text),
            }
        }
    }
}

impl Surface for Scene {
    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn rect(&mut self, origin: Point, width: f64, height: f64, blocked: bool) {
        self.commands.push(DrawCommand::Rect {
            origin,
            width,
            height,
            blocked,
        });
    }

    fn label(&mut self, at: Point, text: &str) {
        self.commands.push(DrawCommand::Label {
            at,
            text: text.to_string(),
        });
    }

    fn arrow(&mut self, from: Point, to: Point, head: [Point; 2]) {
        self.commands.push(DrawCommand::Arrow { from, to, head });
    }

    fn caption(&mut self, at: Point, text: &str) {
        self.commands.push(DrawCommand::Caption {
            at,
            text: text.to_string(),
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SVG output
// ─────────────────────────────────────────────────────────────────────────────

const SVG_MARGIN: f64 = 20.0;

/// Writes SVG elements; `finish` wraps them in a document
#[derive(Debug, Default)]
pub struct SvgSurface {
    body: String,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standalone SVG document sized to `bounds` (or a small blank canvas)
    pub fn finish(self, bounds: Option<Bounds>) -> String {
        let (x, y, w, h) = match bounds {
            Some(b) => (
                b.min.x - SVG_MARGIN,
                b.min.y - SVG_MARGIN,
                b.width() + 2.0 * SVG_MARGIN,
                b.height() + 2.0 * SVG_MARGIN,
            ),
            None => (0.0, 0.0, 2.0 * SVG_MARGIN, 2.0 * SVG_MARGIN),
        };
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{x} {y} {w} {h}\" \
             width=\"{w}\" height=\"{h}\" font-family=\"sans-serif\">\n{}</svg>\n",
            self.body
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// write! into a String cannot fail
impl Surface for SvgSurface {
    fn clear(&mut self) {
        self.body.clear();
    }

    fn rect(&mut self, origin: Point, width: f64, height: f64, blocked: bool) {
        let fill = if blocked { "#f8d7da" } else { "#e6f4ea" };
        let _ = writeln!(
            self.body,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"6\" fill=\"{}\" stroke=\"#333\"/>",
            origin.x, origin.y, width, height, fill
        );
    }

    fn label(&mut self, at: Point, text: &str) {
        let _ = writeln!(
            self.body,
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-size=\"13\">{}</text>",
            at.x,
            at.y,
            escape_xml(text)
        );
    }

    fn arrow(&mut self, from: Point, to: Point, head: [Point; 2]) {
        let _ = writeln!(
            self.body,
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#555\"/>",
            from.x, from.y, to.x, to.y
        );
        let _ = writeln!(
            self.body,
            "  <polygon points=\"{},{} {},{} {},{}\" fill=\"#555\"/>",
            to.x, to.y, head[0].x, head[0].y, head[1].x, head[1].y
        );
    }

    fn caption(&mut self, at: Point, text: &str) {
        let _ = writeln!(
            self.body,
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#777\">{}</text>",
            at.x,
            at.y,
            escape_xml(text)
        );
    }
}

/// Render a layout straight to an SVG document
pub fn to_svg(layout: &Layout) -> String {
    let mut svg = SvgSurface::new();
    render(layout, &mut svg);
    svg.finish(layout.bounds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskNode;
    use crate::workflow::layout::{compute_layout, LayoutSettings};

    fn diamond() -> Layout {
        let tasks = vec![
            TaskNode::new("a", "Design"),
            TaskNode::new("b", "Build").depends_on(["a"]),
            TaskNode::new("c", "Docs").depends_on(["a"]),
            TaskNode::new("d", "Ship").depends_on(["b", "c"]),
        ];
        compute_layout(&tasks, &LayoutSettings::default()).unwrap()
    }

    fn count(scene: &Scene, pred: fn(&DrawCommand) -> bool) -> usize {
        scene.commands().iter().filter(|c| pred(c)).count()
    }

    #[test]
    fn test_scene_draws_every_element() {
        let scene = Scene::from_layout(&diamond());
        assert_eq!(scene.commands()[0], DrawCommand::Clear);
        assert_eq!(count(&scene, |c| matches!(c, DrawCommand::Rect { .. })), 4);
        assert_eq!(count(&scene, |c| matches!(c, DrawCommand::Label { .. })), 4);
        assert_eq!(count(&scene, |c| matches!(c, DrawCommand::Arrow { .. })), 4);
        assert_eq!(count(&scene, |c| matches!(c, DrawCommand::Caption { .. })), 4);
    }

    #[test]
    fn test_rerender_replaces_previous_drawing() {
        let layout = diamond();
        let mut scene = Scene::new();
        render(&layout, &mut scene);
        let first = scene.commands().len();
        render(&layout, &mut scene);
        assert_eq!(scene.commands().len(), first);
        assert_eq!(count(&scene, |c| matches!(c, DrawCommand::Clear)), 1);
    }

    #[test]
    fn test_empty_layout_renders_blank() {
        let layout = compute_layout(&[], &LayoutSettings::default()).unwrap();
        let scene = Scene::from_layout(&layout);
        assert!(scene.is_blank());
        assert!(to_svg(&layout).starts_with("<svg"));
    }

    #[test]
    fn test_caption_sits_at_edge_midpoint() {
        let layout = diamond();
        let scene = Scene::from_layout(&layout);
        let edge = &layout.edges[0];
        let expected = edge.start.midpoint(&edge.end);
        assert!(scene.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Caption { at, text } if *at == expected && text == EDGE_CAPTION
        )));
    }

    #[test]
    fn test_arrow_head_is_behind_tip() {
        let head = arrow_head(Point::new(0.0, 0.0), Point::new(0.0, 100.0));
        assert_eq!(head[0].y, 90.0);
        assert_eq!(head[1].y, 90.0);
        assert_eq!(head[0].x, -5.0);
        assert_eq!(head[1].x, 5.0);
    }

    #[test]
    fn test_svg_escapes_labels() {
        let tasks = vec![TaskNode::new("x", "R&D <phase 1>")];
        let layout = compute_layout(&tasks, &LayoutSettings::default()).unwrap();
        let svg = to_svg(&layout);
        assert!(svg.contains("R&amp;D &lt;phase 1&gt;"));
        assert_eq!(svg.matches("<rect").count(), 1);
    }

    #[test]
    fn test_replay_reproduces_scene() {
        let original = Scene::from_layout(&diamond());
        let mut copy = Scene::new();
        original.replay(&mut copy);
        assert_eq!(original.commands(), copy.commands());
    }
}

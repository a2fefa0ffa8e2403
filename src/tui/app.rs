//! Viewer application: terminal setup, run loop, drawing

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Context as _;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Rectangle},
        Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use tracing::debug;

use super::events::{handle_key_event, poll_event, Action};
use super::state::{PanelFocus, ViewerState, UNITS_PER_COLUMN};
use super::theme::{icons, WorkflowTheme};
use crate::ops::WorkflowView;
use crate::workflow::{Point, Surface};

/// Draws workflow scenes on a ratatui canvas
///
/// Layout coordinates grow downwards, canvas coordinates upwards, so every
/// y is negated.
struct CanvasSurface<'c, 'a> {
    ctx: &'c mut Context<'a>,
    theme: &'c WorkflowTheme,
}

fn flip(p: Point) -> (f64, f64) {
    (p.x, -p.y)
}

impl CanvasSurface<'_, '_> {
    fn line(&mut self, from: Point, to: Point, color: Color) {
        let (x1, y1) = flip(from);
        let (x2, y2) = flip(to);
        self.ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color));
    }

    /// Print `text` centred on `at`
    fn centred(&mut self, at: Point, text: &str, span_style: ratatui::style::Style) {
        let half = text.chars().count() as f64 * UNITS_PER_COLUMN / 2.0;
        let (x, y) = flip(at);
        self.ctx
            .print(x - half, y, Span::styled(text.to_string(), span_style));
    }
}

impl Surface for CanvasSurface<'_, '_> {
    fn clear(&mut self) {}

    fn rect(&mut self, origin: Point, width: f64, height: f64, blocked: bool) {
        self.ctx.draw(&Rectangle {
            x: origin.x,
            y: -(origin.y + height),
            width,
            height,
            color: self.theme.node_color(blocked),
        });
    }

    fn label(&mut self, at: Point, text: &str) {
        let style = self.theme.text();
        self.centred(at, text, style);
    }

    fn arrow(&mut self, from: Point, to: Point, head: [Point; 2]) {
        let color = self.theme.edge_color();
        self.line(from, to, color);
        self.line(head[0], to, color);
        self.line(head[1], to, color);
    }

    fn caption(&mut self, at: Point, text: &str) {
        let style = self.theme.dimmed();
        self.centred(at, text, style);
    }
}

/// Workflow viewer
pub struct TuiApp {
    state: ViewerState,
    theme: WorkflowTheme,
}

impl TuiApp {
    pub fn new(view: WorkflowView) -> Self {
        Self {
            state: ViewerState::new(view),
            theme: WorkflowTheme::new(),
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut terminal = self.setup_terminal()?;
        let result = self.main_loop(&mut terminal).await;
        self.restore_terminal(&mut terminal)?;
        result
    }

    fn setup_terminal(&self) -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode().context("cannot enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(terminal)
    }

    fn restore_terminal(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(50);

        while !self.state.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            if let Some(key) = poll_event(tick_rate)? {
                let action = handle_key_event(key, &mut self.state);
                if action == Action::Quit {
                    self.state.should_quit = true;
                } else if action != Action::None {
                    debug!(?action, "viewer input");
                }
            }
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(8),    // Graph + details
                Constraint::Length(1), // Footer
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(chunks[1]);
        self.render_graph(frame, body[0]);
        self.render_details(frame, body[1]);

        self.render_footer(frame, chunks[2]);

        if self.state.show_help {
            self.render_help(frame, centred_rect(50, 50, frame.area()));
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let blocked = self.state.blocked_count();
        let header = Line::from(vec![
            Span::styled(format!("{} TASKFLOW", icons::NODE), self.theme.header()),
            Span::raw("  │  "),
            Span::styled(&self.state.project_name, self.theme.accent()),
            Span::raw("  │  "),
            Span::styled(
                format!("{} tasks", self.state.layout.nodes.len()),
                self.theme.text(),
            ),
            Span::raw("  │  "),
            Span::styled(
                format!("{} blocked", blocked),
                if blocked > 0 {
                    self.theme.blocked()
                } else {
                    self.theme.dimmed()
                },
            ),
            Span::raw("  │  "),
            Span::styled(format!("zoom {:.2}x", self.state.viewport.zoom), self.theme.dimmed()),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.header())
            .title(" WORKFLOW ");
        frame.render_widget(Paragraph::new(header).block(block), area);
    }

    fn border_for(&self, panel: PanelFocus) -> ratatui::style::Style {
        if self.state.focus == panel {
            self.theme.highlight()
        } else {
            self.theme.dimmed()
        }
    }

    fn render_graph(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_for(PanelFocus::Graph))
            .title(" DEPENDENCIES ");

        if self.state.scene.is_blank() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "  This workflow has no tasks yet",
                self.theme.dimmed(),
            )))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let inner = block.inner(area);
        let (x_range, y_range) = self.state.viewport.ranges(inner.width, inner.height);
        let selected = self.state.selected_node().map(|n| n.position);
        let (node_w, node_h) = (self.state.layout.node_width, self.state.layout.node_height);

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds(x_range)
            .y_bounds([-y_range[1], -y_range[0]])
            .paint(|ctx| {
                let mut surface = CanvasSurface {
                    ctx,
                    theme: &self.theme,
                };
                self.state.scene.replay(&mut surface);
                if let Some(origin) = selected {
                    ctx_highlight(surface.ctx, origin, node_w, node_h, self.theme.selected_color());
                }
            });
        frame.render_widget(canvas, area);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_for(PanelFocus::Details))
            .title(" TASK ");

        let lines = match self.state.selected_node() {
            None => vec![Line::from(Span::styled("  nothing selected", self.theme.dimmed()))],
            Some(node) => {
                let status = self.state.status_of(&node.id);
                let deps = self.state.dependencies_of(&node.id);
                let dependents = self.state.dependents_of(&node.id);
                vec![
                    Line::from(Span::styled(node.name.clone(), self.theme.header())),
                    Line::from(vec![
                        Span::styled("id      ", self.theme.dimmed()),
                        Span::styled(node.id.clone(), self.theme.text()),
                    ]),
                    Line::from(vec![
                        Span::styled("level   ", self.theme.dimmed()),
                        Span::styled(node.level.to_string(), self.theme.text()),
                    ]),
                    Line::from(vec![
                        Span::styled("status  ", self.theme.dimmed()),
                        Span::styled(
                            status.map_or("unknown", |s| s.as_str()),
                            self.theme.status_style(status),
                        ),
                    ]),
                    Line::from(if node.blocked {
                        Span::styled(format!("{} blocked", icons::BLOCKED), self.theme.blocked())
                    } else {
                        Span::styled(format!("{} ready", icons::READY), self.theme.text())
                    }),
                    Line::from(""),
                    Line::from(Span::styled("depends on", self.theme.dimmed())),
                    id_list(&deps, &self.theme),
                    Line::from(Span::styled("needed by", self.theme.dimmed())),
                    id_list(&dependents, &self.theme),
                ]
            }
        };

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let keys = [
            ("[q]", "uit  "),
            ("[←↑↓→]", " pan  "),
            ("[+/-]", " zoom  "),
            ("[Tab]", " next task  "),
            ("[Enter]", " centre  "),
            ("[0]", " reset  "),
            ("[?]", " help"),
        ];
        let spans: Vec<Span> = keys
            .iter()
            .flat_map(|(key, what)| {
                [
                    Span::styled(*key, self.theme.accent()),
                    Span::styled(*what, self.theme.dimmed()),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let text = vec![
            Line::from("Arrows / hjkl   pan the graph"),
            Line::from("+ / -           zoom in / out"),
            Line::from("Tab / n, p      select next / previous task"),
            Line::from("Enter           centre on the selected task"),
            Line::from("0 / r           show the whole graph"),
            Line::from("d               switch panel focus"),
            Line::from("q / Esc         quit"),
            Line::from(""),
            Line::from(Span::styled(
                format!("Red boxes are blocked: a dependency is not done. Arrows point {} the dependent task.", icons::ARROW),
                self.theme.dimmed(),
            )),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.highlight())
            .title(" HELP ");
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }
}

fn ctx_highlight(ctx: &mut Context<'_>, origin: Point, width: f64, height: f64, color: Color) {
    const PAD: f64 = 4.0;
    ctx.draw(&Rectangle {
        x: origin.x - PAD,
        y: -(origin.y + height + PAD),
        width: width + 2.0 * PAD,
        height: height + 2.0 * PAD,
        color,
    });
}

fn id_list<'a>(ids: &[&str], theme: &WorkflowTheme) -> Line<'a> {
    if ids.is_empty() {
        Line::from(Span::styled("  none", theme.dimmed()))
    } else {
        Line::from(Span::styled(format!("  {}", ids.join(", ")), theme.text()))
    }
}

/// `percent_x` by `percent_y` rectangle in the middle of `area`
fn centred_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TaskNode, TaskStatus, Workflow};
    use crate::workflow::{compute_layout, mark_blocked, LayoutSettings};
    use ratatui::backend::TestBackend;

    fn app(nodes: Vec<TaskNode>) -> TuiApp {
        let tasks = vec![Task {
            id: "a".into(),
            name: "Design".into(),
            description: String::new(),
            status: TaskStatus::Working,
            project_id: "p1".into(),
            members: vec![],
        }];
        let mut nodes = nodes;
        mark_blocked(&mut nodes, &tasks);
        let layout = compute_layout(&nodes, &LayoutSettings::default()).unwrap();
        TuiApp::new(WorkflowView {
            workflow: Workflow {
                project_id: "p1".into(),
                project_name: "Apollo".into(),
                tasks: nodes,
            },
            tasks,
            layout,
        })
    }

    fn screen(app: &TuiApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_renders_header_and_details() {
        let app = app(vec![
            TaskNode::new("a", "Design"),
            TaskNode::new("b", "Build").depends_on(["a"]),
        ]);
        let text = screen(&app);
        assert!(text.contains("Apollo"));
        assert!(text.contains("2 tasks"));
        assert!(text.contains("1 blocked"));
        assert!(text.contains("Working"));
    }

    #[test]
    fn test_empty_workflow_message() {
        let text = screen(&app(vec![]));
        assert!(text.contains("no tasks yet"));
    }

    #[test]
    fn test_help_overlay() {
        let mut app = app(vec![TaskNode::new("a", "Design")]);
        app.state.show_help = true;
        assert!(screen(&app).contains("HELP"));
    }
}

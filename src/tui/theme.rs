//! Viewer theme
//!
//! Violet/amber palette; blocked tasks stand out in red.

use ratatui::style::{Color, Modifier, Style};

/// Colour palette of the workflow viewer
pub struct WorkflowTheme {
    pub violet: Color,
    pub amber: Color,
    pub cyan: Color,
    pub white: Color,
    pub grey: Color,

    pub ready_green: Color,
    pub working_orange: Color,
    pub blocked_red: Color,
}

impl Default for WorkflowTheme {
    fn default() -> Self {
        Self {
            violet: Color::Rgb(138, 43, 226), // #8A2BE2
            amber: Color::Rgb(255, 191, 0),   // #FFBF00
            cyan: Color::Rgb(0, 255, 255),    // #00FFFF
            white: Color::Rgb(230, 237, 243), // #E6EDF3
            grey: Color::Rgb(128, 128, 128),

            ready_green: Color::Rgb(63, 185, 80),     // #3FB950
            working_orange: Color::Rgb(210, 153, 34), // #D29922
            blocked_red: Color::Rgb(248, 81, 73),     // #F85149
        }
    }
}

impl WorkflowTheme {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Graph colours
    // ─────────────────────────────────────────────────────────────────────

    /// Box outline of a node
    pub fn node_color(&self, blocked: bool) -> Color {
        if blocked {
            self.blocked_red
        } else {
            self.violet
        }
    }

    pub fn edge_color(&self) -> Color {
        self.grey
    }

    pub fn selected_color(&self) -> Color {
        self.cyan
    }

    // ─────────────────────────────────────────────────────────────────────
    // Text styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn text(&self) -> Style {
        Style::default().fg(self.white)
    }

    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.grey)
    }

    pub fn header(&self) -> Style {
        Style::default().fg(self.violet).add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.amber)
    }

    pub fn highlight(&self) -> Style {
        Style::default().fg(self.cyan).add_modifier(Modifier::BOLD)
    }

    pub fn blocked(&self) -> Style {
        Style::default()
            .fg(self.blocked_red)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for a task status name
    pub fn status_style(&self, status: Option<crate::model::TaskStatus>) -> Style {
        use crate::model::TaskStatus;
        match status {
            Some(TaskStatus::Done) => Style::default().fg(self.ready_green),
            Some(TaskStatus::Working) => Style::default().fg(self.working_orange),
            Some(TaskStatus::Pending) => self.text(),
            None => self.dimmed(),
        }
    }
}

pub mod icons {
    pub const NODE: &str = "◆";
    pub const BLOCKED: &str = "⛔";
    pub const READY: &str = "✓";
    pub const ARROW: &str = "→";
}

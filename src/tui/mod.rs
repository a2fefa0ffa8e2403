//! Terminal workflow viewer
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  app.rs     terminal setup, run loop, canvas drawing         │
//! └──────────────────────────────────────────────────────────────┘
//!                        ▲ ViewerState
//! ┌──────────────────────────────────────────────────────────────┐
//! │  state.rs   selection, viewport, selectors over the layout   │
//! └──────────────────────────────────────────────────────────────┘
//!                        ▲ WorkflowView (ops::load_workflow_view)
//! ```
//!
//! The graph is drawn by replaying the workflow's [`Scene`] onto a ratatui
//! canvas, the same render pass that produces SVG output.
//!
//! [`Scene`]: crate::workflow::Scene

mod app;
mod events;
mod state;
mod theme;

pub use app::TuiApp;
pub use events::Action;
pub use state::{PanelFocus, ViewerState, Viewport};
pub use theme::WorkflowTheme;

use crate::ops::WorkflowView;

/// Open the viewer on `view` until the user quits
pub async fn run(view: WorkflowView) -> anyhow::Result<()> {
    TuiApp::new(view).run().await
}

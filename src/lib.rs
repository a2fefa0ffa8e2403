//! taskflow - command-line client for the taskflow project manager

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod model;
pub mod ops;
pub mod session;
pub mod timestamp;
pub mod tui;
pub mod validation;
pub mod workflow;

pub use api::ApiClient;
pub use config::TaskflowConfig;
pub use error::{FixSuggestion, Result, TaskflowError};
pub use guard::{GuardDecision, Route, RouteGuard};
pub use session::{CredentialStore, FileCredentialStore, MemoryCredentialStore, Session};
pub use workflow::{compute_layout, Layout, LayoutSettings};

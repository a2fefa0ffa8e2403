//! Error types with fix suggestions
//!
//! Error code ranges:
//! - TF-000-009: Config errors
//! - TF-010-019: Session/credential errors
//! - TF-020-029: HTTP errors
//! - TF-030-039: Decode errors
//! - TF-040-049: Validation/guard errors
//! - TF-050-059: Workflow layout errors
//! - TF-060-069: Multi-step operation errors
//! - TF-090-099: IO errors

use thiserror::Error;

use crate::validation::ValidationReport;

pub type Result<T> = std::result::Result<T, TaskflowError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum TaskflowError {
    // ─────────────────────────────────────────────────────────────
    // Config errors (TF-000 to TF-009)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-001: Config error: {reason}")]
    Config { reason: String },

    #[error("TF-002: Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Session errors (TF-010 to TF-019)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-010: Not logged in")]
    NotLoggedIn,

    #[error("TF-011: Invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("TF-012: Magic link has no token parameter")]
    MissingMagicToken,

    // ─────────────────────────────────────────────────────────────
    // HTTP errors (TF-020 to TF-029)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-020: Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("TF-021: Unauthorized (credential rejected by the server)")]
    Unauthorized,

    #[error("TF-022: Forbidden")]
    Forbidden,

    #[error("TF-023: Not found: {resource}")]
    NotFound { resource: String },

    #[error("TF-024: Conflict: {message}")]
    Conflict { message: String },

    #[error("TF-025: HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ─────────────────────────────────────────────────────────────
    // Decode errors (TF-030 to TF-039)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-030: Cannot decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("TF-031: Invalid timestamp: {value}")]
    InvalidTimestamp { value: String },

    // ─────────────────────────────────────────────────────────────
    // Validation and guard errors (TF-040 to TF-049)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-040: Form '{form}' is invalid: {report}")]
    Validation { form: String, report: ValidationReport },

    #[error("TF-041: Access denied: requires one of [{}]", required.join(", "))]
    AccessDenied { required: Vec<String> },

    #[error("TF-042: '{username}' is already a member")]
    AlreadyMember { username: String },

    #[error("TF-043: Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Workflow layout errors (TF-050 to TF-059)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-050: Dependency cycle: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    // ─────────────────────────────────────────────────────────────
    // Multi-step errors (TF-060 to TF-069)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-060: Step '{failed_step}' failed after [{}]: {source}", completed.join(", "))]
    MultiStep {
        completed: Vec<&'static str>,
        failed_step: &'static str,
        #[source]
        source: Box<TaskflowError>,
    },

    // ─────────────────────────────────────────────────────────────
    // IO errors (TF-090 to TF-099)
    // ─────────────────────────────────────────────────────────────
    #[error("TF-090: IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TF-091: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TaskflowError {
    /// Server-side business conflict (HTTP 409), possibly wrapped in a multi-step failure
    pub fn is_conflict(&self) -> bool {
        match self {
            TaskflowError::Conflict { .. } => true,
            TaskflowError::MultiStep { source, .. } => source.is_conflict(),
            _ => false,
        }
    }

    pub(crate) fn decode(endpoint: &str, reason: impl Into<String>) -> Self {
        TaskflowError::Decode {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

impl FixSuggestion for TaskflowError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            TaskflowError::Config { .. } => {
                Some("Check ~/.config/taskflow/config.toml syntax or delete it to use defaults")
            }
            TaskflowError::InvalidUrl { .. } => Some("Use a full URL such as https://localhost:8000/api"),
            TaskflowError::NotLoggedIn => Some("Run 'taskflow login' first"),
            TaskflowError::InvalidToken { .. } => Some("Log in again to obtain a fresh token"),
            TaskflowError::MissingMagicToken => Some("Paste the full link from the email, including ?token="),
            TaskflowError::Network(_) => Some("Check the API URL and that the gateway is running"),
            TaskflowError::Unauthorized => Some("Your session may have expired: run 'taskflow login'"),
            TaskflowError::Forbidden => Some("This action needs a different role"),
            TaskflowError::NotFound { .. } => Some("Verify the identifier"),
            TaskflowError::Conflict { .. } => {
                Some("The resource is still referenced elsewhere; resolve that first")
            }
            TaskflowError::Http { .. } => None,
            TaskflowError::Decode { .. } => Some("The server response has an unexpected shape"),
            TaskflowError::InvalidTimestamp { .. } => None,
            TaskflowError::Validation { .. } => Some("Fix the listed fields and retry"),
            TaskflowError::AccessDenied { .. } => Some("Log in with an account that has the required role"),
            TaskflowError::AlreadyMember { .. } => None,
            TaskflowError::InvalidArgument { .. } => Some("See --help for accepted values"),
            TaskflowError::DependencyCycle { .. } => {
                Some("Remove one of the dependencies in the cycle")
            }
            TaskflowError::MultiStep { .. } => {
                Some("Earlier steps were applied; undo them manually if needed")
            }
            TaskflowError::Io(_) => Some("Check file path and permissions"),
            TaskflowError::Json(_) => None,
        }
    }
}

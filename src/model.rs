//! View records
//!
//! Strongly typed records produced by the decoding boundary in `api`.
//! Nothing here knows about the wire format.

use std::fmt;

use chrono::{DateTime, Utc};

/// Role claim carried by users and tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Manager,
    User,
    Other(String),
}

impl Role {
    /// Accepts "Manager", "ROLE_MANAGER", "user", "ROLE_USER", ...
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let bare = trimmed
            .strip_prefix("ROLE_")
            .or_else(|| trimmed.strip_prefix("role_"))
            .unwrap_or(trimmed);
        if bare.eq_ignore_ascii_case("manager") {
            Role::Manager
        } else if bare.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Other(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Manager => "Manager",
            Role::User => "User",
            Role::Other(s) => s,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member as embedded in projects and tasks
#[derive(Debug, Clone, PartialEq)]
pub struct UserRef {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Full user profile
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub completion_date: DateTime<Utc>,
    pub min_members: u32,
    pub max_members: u32,
    pub manager: UserRef,
    pub members: Vec<UserRef>,
}

impl Project {
    pub fn has_member(&self, user: &UserRef) -> bool {
        self.members
            .iter()
            .any(|m| m.id == user.id || m.username == user.username)
    }
}

/// Input for project creation
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub completion_date: DateTime<Utc>,
    pub min_members: u32,
    pub max_members: u32,
    pub manager: UserRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Working,
    Done,
}

impl TaskStatus {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(TaskStatus::Pending),
            "working" => Some(TaskStatus::Working),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Pending),
            1 => Some(TaskStatus::Working),
            2 => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Working => "Working",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub project_id: String,
    pub members: Vec<UserRef>,
}

impl Task {
    pub fn has_member(&self, user: &UserRef) -> bool {
        self.members
            .iter()
            .any(|m| m.id == user.id || m.username == user.username)
    }
}

/// Input for task creation
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub message: String,
    pub read: bool,
}

/// A task in a project's dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub id: String,
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub blocked: bool,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            dependencies: Vec::new(),
            blocked: false,
        }
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub project_id: String,
    pub project_name: String,
    pub tasks: Vec<TaskNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    pub id: String,
    pub task_id: String,
    pub file_name: String,
    pub size: Option<u64>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Downloaded file content
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Claims read from the JWT payload
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Claims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.role.as_ref() == Some(role)
    }
}

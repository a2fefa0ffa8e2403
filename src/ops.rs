//! Multi-step operations
//!
//! Each operation chains several requests and reports them as one result.
//! When a step fails after earlier changes went through, the error is a
//! `TaskflowError::MultiStep` listing what was already applied, so the
//! caller can compensate. Lookups (`Steps::read`) change nothing and are
//! never listed. A failure before any change was applied is returned
//! as-is: nothing needs undoing.

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{Result, TaskflowError};
use crate::model::{
    Claims, NewProject, NewTask, Role, Task, TaskNode, TaskStatus, UserRef, Workflow,
};
use crate::workflow::{compute_layout, mark_blocked, Layout, LayoutSettings};

/// Value of a finished operation with the steps it took
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport<T> {
    pub steps: Vec<&'static str>,
    pub value: T,
}

/// Step tracker shared by the operations below
#[derive(Debug, Default)]
struct Steps {
    completed: Vec<&'static str>,
}

impl Steps {
    async fn run<T, F>(&mut self, name: &'static str, step: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match step.await {
            Ok(value) => {
                self.completed.push(name);
                Ok(value)
            }
            Err(source) if self.completed.is_empty() => Err(source),
            Err(source) => {
                warn!(step = name, completed = ?self.completed, error = %source, "step failed");
                Err(TaskflowError::MultiStep {
                    completed: self.completed.clone(),
                    failed_step: name,
                    source: Box::new(source),
                })
            }
        }
    }

    /// A lookup: its failure is wrapped like any other step's, but it is
    /// never listed as completed since there is nothing to undo
    async fn read<T, F>(&self, name: &'static str, lookup: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        lookup.await.map_err(|source| {
            if self.completed.is_empty() {
                return source;
            }
            warn!(step = name, completed = ?self.completed, error = %source, "lookup failed");
            TaskflowError::MultiStep {
                completed: self.completed.clone(),
                failed_step: name,
                source: Box::new(source),
            }
        })
    }

    fn finish<T>(self, value: T) -> StepReport<T> {
        StepReport {
            steps: self.completed,
            value,
        }
    }
}

/// Delete a project, then every task that belonged to it
pub async fn delete_project_cascade(api: &ApiClient, project_id: &str) -> Result<StepReport<()>> {
    let mut steps = Steps::default();
    steps
        .run("delete project", api.delete_project(project_id))
        .await?;
    steps
        .run("delete tasks", api.delete_project_tasks(project_id))
        .await?;
    info!(project_id, "project and its tasks deleted");
    Ok(steps.finish(()))
}

/// Create a task and return the project's refreshed task list
pub async fn create_task_and_refresh(
    api: &ApiClient,
    task: &NewTask,
) -> Result<StepReport<Vec<Task>>> {
    let mut steps = Steps::default();
    steps.run("create task", api.create_task(task)).await?;
    let tasks = steps
        .read("list tasks", api.list_tasks(&task.project_id))
        .await?;
    Ok(steps.finish(tasks))
}

/// Look up `username` and add them to the project
///
/// A user who is already a member is rejected without calling the add
/// endpoint.
pub async fn add_project_member_by_username(
    api: &ApiClient,
    project_id: &str,
    username: &str,
) -> Result<StepReport<UserRef>> {
    let mut steps = Steps::default();
    let project = steps.read("load project", api.get_project(project_id)).await?;
    let user = steps
        .read("look up user", api.get_user(username))
        .await?
        .to_ref();
    if project.has_member(&user) {
        return Err(TaskflowError::AlreadyMember {
            username: user.username,
        });
    }
    steps
        .run("add member", api.add_project_member(project_id, &user))
        .await?;
    info!(project_id, username = %user.username, "member added to project");
    Ok(steps.finish(user))
}

/// Look up `username` and add them to the task
pub async fn add_task_member_by_username(
    api: &ApiClient,
    task_id: &str,
    username: &str,
) -> Result<StepReport<UserRef>> {
    let mut steps = Steps::default();
    let task = steps.read("load task", api.get_task(task_id)).await?;
    let user = steps
        .read("look up user", api.get_user(username))
        .await?
        .to_ref();
    if task.has_member(&user) {
        return Err(TaskflowError::AlreadyMember {
            username: user.username,
        });
    }
    steps
        .run("add member", api.add_task_member(task_id, &user))
        .await?;
    info!(task_id, username = %user.username, "member added to task");
    Ok(steps.finish(user))
}

/// Create a project's workflow and register `nodes` in order
///
/// The graph is checked for cycles before anything is sent. The report's
/// value is the number of nodes added.
pub async fn create_workflow_with_tasks(
    api: &ApiClient,
    project_id: &str,
    project_name: &str,
    nodes: &[TaskNode],
) -> Result<StepReport<usize>> {
    compute_layout(nodes, &LayoutSettings::default())?;

    let mut steps = Steps::default();
    steps
        .run("create workflow", api.create_workflow(project_id, project_name))
        .await?;
    for node in nodes {
        steps
            .run("add task node", api.add_workflow_task(project_id, node))
            .await?;
    }
    info!(project_id, nodes = nodes.len(), "workflow created");
    Ok(steps.finish(nodes.len()))
}

/// Look up `username` and remove them from the project
pub async fn remove_project_member_by_username(
    api: &ApiClient,
    project_id: &str,
    username: &str,
) -> Result<StepReport<UserRef>> {
    let mut steps = Steps::default();
    let project = steps.read("load project", api.get_project(project_id)).await?;
    let member = project
        .members
        .iter()
        .find(|m| m.username == username)
        .cloned()
        .ok_or_else(|| not_a_member(username))?;
    steps
        .run("remove member", api.remove_project_member(project_id, &member.id))
        .await?;
    info!(project_id, username, "member removed from project");
    Ok(steps.finish(member))
}

/// Look up `username` and remove them from the task
///
/// The service answers `Conflict` once the task is done.
pub async fn remove_task_member_by_username(
    api: &ApiClient,
    task_id: &str,
    username: &str,
) -> Result<StepReport<UserRef>> {
    let mut steps = Steps::default();
    let task = steps.read("load task", api.get_task(task_id)).await?;
    let member = task
        .members
        .iter()
        .find(|m| m.username == username)
        .cloned()
        .ok_or_else(|| not_a_member(username))?;
    steps
        .run("remove member", api.remove_task_member(task_id, &member.id))
        .await?;
    info!(task_id, username, "member removed from task");
    Ok(steps.finish(member))
}

fn not_a_member(username: &str) -> TaskflowError {
    TaskflowError::NotFound {
        resource: format!("member '{}'", username),
    }
}

/// Project fields entered by the user; the manager is the caller
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub name: String,
    pub completion_date: DateTime<Utc>,
    pub min_members: u32,
    pub max_members: u32,
}

/// Create a project managed by the logged-in user
///
/// The manager reference comes from the token claims when they carry an id,
/// otherwise from a profile lookup.
pub async fn create_project_as(
    api: &ApiClient,
    claims: &Claims,
    draft: ProjectDraft,
) -> Result<StepReport<NewProject>> {
    let mut steps = Steps::default();
    let username = claims.username.as_deref().ok_or(TaskflowError::InvalidToken {
        reason: "token carries no username".into(),
    })?;
    let manager = match &claims.user_id {
        Some(id) => UserRef {
            id: id.clone(),
            username: username.to_string(),
            role: claims.role.clone().unwrap_or(Role::Manager),
        },
        None => steps
            .read("look up manager", api.get_user(username))
            .await?
            .to_ref(),
    };
    let project = NewProject {
        name: draft.name,
        completion_date: draft.completion_date,
        min_members: draft.min_members,
        max_members: draft.max_members,
        manager,
    };
    steps.run("create project", api.create_project(&project)).await?;
    Ok(steps.finish(project))
}

/// Fields of a task to overwrite; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }

    fn apply(self, task: &mut Task) {
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

/// Load a task, apply `changes`, write it back
pub async fn update_task(
    api: &ApiClient,
    task_id: &str,
    changes: TaskChanges,
) -> Result<StepReport<Task>> {
    let mut steps = Steps::default();
    let mut task = steps.read("load task", api.get_task(task_id)).await?;
    changes.apply(&mut task);
    steps.run("update task", api.update_task(&task)).await?;
    Ok(steps.finish(task))
}

/// Add one node to an existing workflow
///
/// The node's id must be new and the extended graph must stay acyclic;
/// both are checked before the add request.
pub async fn add_workflow_task_checked(
    api: &ApiClient,
    project_id: &str,
    node: TaskNode,
) -> Result<StepReport<TaskNode>> {
    let mut steps = Steps::default();
    let workflow = steps
        .read("load workflow", api.get_workflow(project_id))
        .await?;
    if workflow.tasks.iter().any(|t| t.id == node.id) {
        return Err(TaskflowError::Conflict {
            message: format!("task node '{}' already exists", node.id),
        });
    }
    let mut extended = workflow.tasks;
    extended.push(node.clone());
    compute_layout(&extended, &LayoutSettings::default())?;

    steps
        .run("add task node", api.add_workflow_task(project_id, &node))
        .await?;
    Ok(steps.finish(node))
}

/// Everything the workflow views draw
#[derive(Debug, Clone)]
pub struct WorkflowView {
    pub workflow: Workflow,
    pub tasks: Vec<Task>,
    pub layout: Layout,
}

/// Fetch a workflow and its project's tasks, derive blocked flags, lay out
pub async fn load_workflow_view(
    api: &ApiClient,
    project_id: &str,
    settings: &LayoutSettings,
) -> Result<StepReport<WorkflowView>> {
    let steps = Steps::default();
    let mut workflow = steps
        .read("load workflow", api.get_workflow(project_id))
        .await?;
    let tasks = steps.read("list tasks", api.list_tasks(project_id)).await?;

    mark_blocked(&mut workflow.tasks, &tasks);
    let layout = compute_layout(&workflow.tasks, settings)?;
    Ok(steps.finish(WorkflowView {
        workflow,
        tasks,
        layout,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_step_failure_is_unwrapped() {
        let mut steps = Steps::default();
        let err = steps
            .run("first", async { Err::<(), _>(TaskflowError::Forbidden) })
            .await
            .unwrap_err();
        assert!(matches!(err, TaskflowError::Forbidden));
    }

    #[tokio::test]
    async fn test_later_failure_lists_completed_steps() {
        let mut steps = Steps::default();
        steps.run("first", async { Ok(()) }).await.unwrap();
        let err = steps
            .run("second", async {
                Err::<(), _>(TaskflowError::Conflict {
                    message: "busy".into(),
                })
            })
            .await
            .unwrap_err();
        match err {
            TaskflowError::MultiStep {
                completed,
                failed_step,
                ..
            } => {
                assert_eq!(completed, vec!["first"]);
                assert_eq!(failed_step, "second");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookups_are_not_listed_as_applied() {
        let mut steps = Steps::default();
        steps.read("load", async { Ok(()) }).await.unwrap();
        let err = steps
            .run("change", async {
                Err::<(), _>(TaskflowError::Conflict {
                    message: "done".into(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TaskflowError::Conflict { .. }));
        assert!(steps.completed.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_after_change_reports_the_change() {
        let mut steps = Steps::default();
        steps.run("create", async { Ok(()) }).await.unwrap();
        let err = steps
            .read("refresh", async { Err::<(), _>(TaskflowError::Unauthorized) })
            .await
            .unwrap_err();
        match err {
            TaskflowError::MultiStep {
                completed,
                failed_step,
                ..
            } => {
                assert_eq!(completed, vec!["create"]);
                assert_eq!(failed_step, "refresh");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_finish_reports_steps() {
        let mut steps = Steps::default();
        steps.run("a", async { Ok(()) }).await.unwrap();
        steps.run("b", async { Ok(()) }).await.unwrap();
        let report = steps.finish(7);
        assert_eq!(report.steps, vec!["a", "b"]);
        assert_eq!(report.value, 7);
    }

    #[test]
    fn test_task_changes_keep_unset_fields() {
        let mut task = Task {
            id: "t1".into(),
            name: "Old".into(),
            description: "keep me".into(),
            status: TaskStatus::Pending,
            project_id: "p1".into(),
            members: vec![],
        };
        let changes = TaskChanges {
            name: Some("New".into()),
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply(&mut task);
        assert_eq!(task.name, "New");
        assert_eq!(task.description, "keep me");
        assert_eq!(task.status, TaskStatus::Done);
        assert!(TaskChanges::default().is_empty());
    }
}

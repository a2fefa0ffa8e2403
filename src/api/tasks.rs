//! Tasks service

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{required_id, ApiClient, UserRefBody, UserRefDto};
use crate::error::{Result, TaskflowError};
use crate::model::{NewTask, Task, TaskStatus, UserRef};

#[derive(Deserialize)]
struct TaskDto {
    #[serde(default, alias = "_id", alias = "ID", alias = "Id")]
    id: Option<Value>,
    #[serde(default, alias = "Name")]
    name: Option<String>,
    #[serde(default, alias = "Description")]
    description: Option<String>,
    #[serde(default, alias = "Status")]
    status: Option<Value>,
    #[serde(default, alias = "projectId", alias = "ProjectID", alias = "project")]
    project_id: Option<Value>,
    #[serde(default, alias = "Members")]
    members: Option<Vec<UserRefDto>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskList {
    Bare(Vec<TaskDto>),
    Wrapped {
        #[serde(default)]
        tasks: Option<Vec<TaskDto>>,
    },
}

/// Status arrives as a name ("Done") or a proto enum number (2)
fn decode_status(endpoint: &str, value: Option<&Value>) -> Result<TaskStatus> {
    match value {
        None | Some(Value::Null) => Some(TaskStatus::default()),
        Some(Value::String(s)) => TaskStatus::from_name(s),
        Some(Value::Number(n)) => n.as_i64().and_then(TaskStatus::from_code),
        Some(_) => None,
    }
    .ok_or_else(|| TaskflowError::decode(endpoint, format!("unknown task status {:?}", value)))
}

impl TaskDto {
    fn decode(self, endpoint: &str) -> Result<Task> {
        Ok(Task {
            id: required_id(endpoint, "task id", self.id.as_ref())?,
            name: self
                .name
                .ok_or_else(|| TaskflowError::decode(endpoint, "missing task name"))?,
            description: self.description.unwrap_or_default(),
            status: decode_status(endpoint, self.status.as_ref())?,
            project_id: self
                .project_id
                .as_ref()
                .and_then(super::id_string)
                .unwrap_or_default(),
            members: self
                .members
                .unwrap_or_default()
                .into_iter()
                .map(|m| m.decode(endpoint))
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Serialize)]
struct TaskBody<'a> {
    name: &'a str,
    description: &'a str,
    status: &'a str,
    project_id: &'a str,
}

impl ApiClient {
    pub async fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        const ENDPOINT: &str = "/tasks/{projectId}";
        let list: TaskList = self.get(ENDPOINT, &["tasks", project_id]).await?;
        let dtos = match list {
            TaskList::Bare(items) => items,
            TaskList::Wrapped { tasks } => tasks.unwrap_or_default(),
        };
        dtos.into_iter().map(|t| t.decode(ENDPOINT)).collect()
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        const ENDPOINT: &str = "/task/{id}";
        let dto: TaskDto = self.get(ENDPOINT, &["task", id]).await?;
        dto.decode(ENDPOINT)
    }

    /// New tasks always start out pending
    pub async fn create_task(&self, task: &NewTask) -> Result<()> {
        let body = TaskBody {
            name: &task.name,
            description: &task.description,
            status: TaskStatus::Pending.as_str(),
            project_id: &task.project_id,
        };
        self.post("/task", &["task"], &body).await?;
        info!(name = %task.name, project_id = %task.project_id, "task created");
        Ok(())
    }

    pub async fn update_task(&self, task: &Task) -> Result<()> {
        let body = TaskBody {
            name: &task.name,
            description: &task.description,
            status: task.status.as_str(),
            project_id: &task.project_id,
        };
        self.put("/task/{id}", &["task", &task.id], &body).await
    }

    /// Delete every task of a project
    pub async fn delete_project_tasks(&self, project_id: &str) -> Result<()> {
        self.delete("/task/{projectId}", &["task", project_id]).await
    }

    pub async fn add_task_member(&self, task_id: &str, user: &UserRef) -> Result<()> {
        self.post(
            "/task/{id}/members",
            &["task", task_id, "members"],
            &UserRefBody::from(user),
        )
        .await
    }

    /// Fails with `Conflict` once the task is done
    pub async fn remove_task_member(&self, task_id: &str, member_id: &str) -> Result<()> {
        self.delete(
            "/task/{id}/members/{memberId}",
            &["task", task_id, "members", member_id],
        )
        .await
    }
}

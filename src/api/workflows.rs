//! Workflow service: per-project dependency graphs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{id_string, required_id, ApiClient};
use crate::error::{Result, TaskflowError};
use crate::model::{TaskNode, Workflow};

#[derive(Deserialize)]
struct WorkflowDto {
    #[serde(default, alias = "projectID", alias = "projectId")]
    project_id: Option<Value>,
    #[serde(default, alias = "projectName")]
    project_name: Option<String>,
    #[serde(default)]
    tasks: Option<Vec<TaskNodeDto>>,
}

#[derive(Deserialize)]
struct TaskNodeDto {
    #[serde(default, alias = "taskID", alias = "taskId")]
    id: Option<Value>,
    #[serde(default, alias = "taskName")]
    name: Option<String>,
    #[serde(default, alias = "taskDescription")]
    description: Option<String>,
    #[serde(default)]
    dependencies: Option<Vec<Value>>,
    #[serde(default)]
    blocked: Option<bool>,
}

impl TaskNodeDto {
    fn decode(self, endpoint: &str) -> Result<TaskNode> {
        let id = required_id(endpoint, "task node id", self.id.as_ref())?;
        let dependencies = self
            .dependencies
            .unwrap_or_default()
            .iter()
            .map(|d| {
                id_string(d).ok_or_else(|| {
                    TaskflowError::decode(endpoint, format!("bad dependency of '{}'", id))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TaskNode {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            description: self.description.unwrap_or_default(),
            dependencies,
            blocked: self.blocked.unwrap_or(false),
        })
    }
}

impl WorkflowDto {
    fn decode(self, endpoint: &str) -> Result<Workflow> {
        Ok(Workflow {
            project_id: required_id(endpoint, "project id", self.project_id.as_ref())?,
            project_name: self.project_name.unwrap_or_default(),
            tasks: self
                .tasks
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.decode(endpoint))
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Serialize)]
struct CreateBody<'a> {
    project_id: &'a str,
    project_name: &'a str,
}

#[derive(Serialize)]
struct TaskNodeBody<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    dependencies: &'a [String],
    blocked: bool,
}

#[derive(Serialize)]
struct AddTaskBody<'a> {
    task: TaskNodeBody<'a>,
    project_id: &'a str,
}

impl ApiClient {
    pub async fn get_workflow(&self, project_id: &str) -> Result<Workflow> {
        const ENDPOINT: &str = "/workflows/{projectId}";
        let dto: WorkflowDto = self.get(ENDPOINT, &["workflows", project_id]).await?;
        dto.decode(ENDPOINT)
    }

    pub async fn create_workflow(&self, project_id: &str, project_name: &str) -> Result<()> {
        self.post(
            "/workflows/create",
            &["workflows", "create"],
            &CreateBody {
                project_id,
                project_name,
            },
        )
        .await?;
        info!(project_id, "workflow created");
        Ok(())
    }

    pub async fn add_workflow_task(&self, project_id: &str, node: &TaskNode) -> Result<()> {
        let body = AddTaskBody {
            task: TaskNodeBody {
                id: &node.id,
                name: &node.name,
                description: &node.description,
                dependencies: &node.dependencies,
                blocked: node.blocked,
            },
            project_id,
        };
        self.post("/workflows/addtask", &["workflows", "addtask"], &body)
            .await
    }
}

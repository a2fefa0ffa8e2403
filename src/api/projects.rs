//! Projects service

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{decode_count, required_id, ApiClient, UserRefBody, UserRefDto};
use crate::error::{Result, TaskflowError};
use crate::model::{NewProject, Project, UserRef};
use crate::timestamp::{to_proto, RawTimestamp};

#[derive(Deserialize)]
struct ProjectDto {
    #[serde(default, alias = "_id", alias = "ID")]
    id: Option<Value>,
    #[serde(default, alias = "Name")]
    name: Option<String>,
    #[serde(default, alias = "completionDate", alias = "CompletionDate")]
    completion_date: Option<RawTimestamp>,
    #[serde(default, alias = "minMembers", alias = "MinMembers")]
    min_members: Option<Value>,
    #[serde(default, alias = "maxMembers", alias = "MaxMembers")]
    max_members: Option<Value>,
    #[serde(default, alias = "Manager")]
    manager: Option<UserRefDto>,
    #[serde(default, alias = "Members")]
    members: Option<Vec<UserRefDto>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectList {
    Bare(Vec<ProjectDto>),
    Wrapped {
        #[serde(default)]
        projects: Option<Vec<ProjectDto>>,
    },
}

impl ProjectDto {
    fn decode(self, endpoint: &str) -> Result<Project> {
        let completion_date = self
            .completion_date
            .ok_or_else(|| TaskflowError::decode(endpoint, "missing completion date"))?
            .decode()?;
        Ok(Project {
            id: required_id(endpoint, "project id", self.id.as_ref())?,
            name: self
                .name
                .ok_or_else(|| TaskflowError::decode(endpoint, "missing project name"))?,
            completion_date,
            min_members: decode_count(endpoint, "min members", self.min_members.as_ref())?,
            max_members: decode_count(endpoint, "max members", self.max_members.as_ref())?,
            manager: self
                .manager
                .ok_or_else(|| TaskflowError::decode(endpoint, "missing manager"))?
                .decode(endpoint)?,
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
struct NewProjectBody<'a> {
    name: &'a str,
    completion_date: RawTimestamp,
    min_members: String,
    max_members: String,
    manager: UserRefBody<'a>,
}

impl<'a> From<&'a NewProject> for NewProjectBody<'a> {
    fn from(project: &'a NewProject) -> Self {
        Self {
            name: &project.name,
            completion_date: to_proto(&project.completion_date),
            min_members: project.min_members.to_string(),
            max_members: project.max_members.to_string(),
            manager: UserRefBody::from(&project.manager),
        }
    }
}

impl ApiClient {
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        const ENDPOINT: &str = "/projects";
        let list: ProjectList = self.get(ENDPOINT, &["projects"]).await?;
        let dtos = match list {
            ProjectList::Bare(items) => items,
            ProjectList::Wrapped { projects } => projects.unwrap_or_default(),
        };
        dtos.into_iter().map(|p| p.decode(ENDPOINT)).collect()
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        const ENDPOINT: &str = "/projects/{id}";
        let dto: ProjectDto = self.get(ENDPOINT, &["projects", id]).await?;
        dto.decode(ENDPOINT)
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<()> {
        self.post("/projects", &["projects"], &NewProjectBody::from(project))
            .await?;
        info!(name = %project.name, "project created");
        Ok(())
    }

    /// Fails with `Conflict` while the project still has tasks in progress
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        self.delete("/projects/{id}", &["projects", id]).await
    }

    pub async fn add_project_member(&self, project_id: &str, user: &UserRef) -> Result<()> {
        self.post(
            "/projects/{id}/members",
            &["projects", project_id, "members"],
            &UserRefBody::from(user),
        )
        .await
    }

    pub async fn remove_project_member(&self, project_id: &str, user_id: &str) -> Result<()> {
        self.delete(
            "/projects/{id}/members/{userId}",
            &["projects", project_id, "members", user_id],
        )
        .await
    }
}

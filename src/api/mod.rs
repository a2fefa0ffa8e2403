//! REST client for the taskflow gateway
//!
//! `ApiClient` owns the HTTP plumbing: URL building, auth header, status
//! mapping. Each endpoint group lives in its own submodule with private wire
//! DTOs and a single decode step into `crate::model`.

pub mod files;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod workflows;

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{validate_base_url, ApiSettings};
use crate::error::{Result, TaskflowError};
use crate::model::{Role, UserRef};
use crate::session::Session;

pub use files::FileUpload;
pub use users::Registration;

/// HTTP client bound to one base URL and, optionally, one bearer token
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, token: Option<String>) -> Result<Self> {
        let base_url = validate_base_url(&settings.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Client carrying the session's live token, if any
    pub fn for_session(settings: &ApiSettings, session: &Session) -> Result<Self> {
        Self::new(settings, session.token().map(str::to_string))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TaskflowError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        let mut req = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(req)
    }

    /// Send and map non-2xx statuses to errors
    async fn send(&self, endpoint: &str, req: RequestBuilder) -> Result<Response> {
        debug!(endpoint, "sending request");
        let response = req.send().await?;
        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(endpoint, status = status.as_u16(), "request failed");
        Err(status_error(endpoint, status, &body))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        segments: &[&str],
    ) -> Result<T> {
        let req = self.request(Method::GET, segments)?;
        let response = self.send(endpoint, req).await?;
        read_json(endpoint, response).await
    }

    pub(crate) async fn get_raw(&self, endpoint: &str, segments: &[&str]) -> Result<Response> {
        let req = self.request(Method::GET, segments)?;
        self.send(endpoint, req).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        segments: &[&str],
        body: &B,
    ) -> Result<()> {
        let req = self.request(Method::POST, segments)?.json(body);
        self.send(endpoint, req).await.map(drop)
    }

    pub(crate) async fn post_for<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let req = self.request(Method::POST, segments)?.json(body);
        let response = self.send(endpoint, req).await?;
        read_json(endpoint, response).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        segments: &[&str],
        body: &B,
    ) -> Result<()> {
        let req = self.request(Method::PUT, segments)?.json(body);
        self.send(endpoint, req).await.map(drop)
    }

    pub(crate) async fn delete(&self, endpoint: &str, segments: &[&str]) -> Result<()> {
        let req = self.request(Method::DELETE, segments)?;
        self.send(endpoint, req).await.map(drop)
    }
}

async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| TaskflowError::decode(endpoint, e.to_string()))
}

fn status_error(endpoint: &str, status: StatusCode, body: &str) -> TaskflowError {
    match status {
        StatusCode::UNAUTHORIZED => TaskflowError::Unauthorized,
        StatusCode::FORBIDDEN => TaskflowError::Forbidden,
        StatusCode::NOT_FOUND => TaskflowError::NotFound {
            resource: endpoint.to_string(),
        },
        StatusCode::CONFLICT => TaskflowError::Conflict {
            message: error_message(status, body),
        },
        _ => TaskflowError::Http {
            status: status.as_u16(),
            message: error_message(status, body),
        },
    }
}

/// `message` or `error` from a JSON body, else the raw text
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["message", "error"]
            .iter()
            .find_map(|k| v.get(k).and_then(Value::as_str).map(str::to_string))
    });
    let text = from_json.unwrap_or_else(|| body.trim().to_string());
    if text.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        text
    }
}

// ============================================================================
// SHARED WIRE TYPES
// ============================================================================

/// Member as embedded in projects and tasks
#[derive(Debug, Deserialize)]
pub(crate) struct UserRefDto {
    #[serde(default, alias = "_id", alias = "ID")]
    id: Option<Value>,
    #[serde(default, alias = "Username", alias = "userName")]
    username: Option<String>,
    #[serde(default, alias = "Role")]
    role: Option<Value>,
}

impl UserRefDto {
    pub(crate) fn decode(self, endpoint: &str) -> Result<UserRef> {
        Ok(UserRef {
            id: required_id(endpoint, "member id", self.id.as_ref())?,
            username: self
                .username
                .ok_or_else(|| TaskflowError::decode(endpoint, "member without username"))?,
            role: self.role.as_ref().and_then(decode_role).unwrap_or(Role::User),
        })
    }
}

/// Outgoing member body
#[derive(Debug, Serialize)]
pub(crate) struct UserRefBody<'a> {
    id: &'a str,
    username: &'a str,
    role: &'a str,
}

impl<'a> From<&'a UserRef> for UserRefBody<'a> {
    fn from(user: &'a UserRef) -> Self {
        Self {
            id: &user.id,
            username: &user.username,
            role: user.role.as_str(),
        }
    }
}

/// Identifiers arrive as strings, numbers, or Mongo `{"$oid": ...}`
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(id_string),
        _ => None,
    }
}

pub(crate) fn required_id(endpoint: &str, what: &str, value: Option<&Value>) -> Result<String> {
    value
        .and_then(id_string)
        .ok_or_else(|| TaskflowError::decode(endpoint, format!("missing {}", what)))
}

/// Role is either a plain name or `{"authority": "ROLE_..."}`
pub(crate) fn decode_role(value: &Value) -> Option<Role> {
    match value {
        Value::String(s) => Some(Role::parse(s)),
        Value::Object(map) => map.get("authority").and_then(Value::as_str).map(Role::parse),
        _ => None,
    }
}

/// Counts may be numbers or numeric strings
pub(crate) fn decode_count(endpoint: &str, what: &str, value: Option<&Value>) -> Result<u32> {
    let n = match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    n.and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| TaskflowError::decode(endpoint, format!("missing or invalid {}", what)))
}

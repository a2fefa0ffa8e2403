//! Task file attachments

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{id_string, ApiClient};
use crate::error::{Result, TaskflowError};
use crate::model::{FileAttachment, FileDownload};
use crate::timestamp::RawTimestamp;

/// File to attach to a task
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub task_id: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    /// Read `path` from disk; the upload keeps its base name
    pub fn from_path(task_id: &str, path: &Path) -> Result<Self> {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                return Err(TaskflowError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", path.display()),
                )))
            }
        };
        Ok(Self {
            task_id: task_id.to_string(),
            file_name,
            content: std::fs::read(path)?,
        })
    }
}

#[derive(Serialize)]
struct UploadBody<'a> {
    #[serde(rename = "taskId")]
    task_id: &'a str,
    #[serde(rename = "fileName")]
    file_name: &'a str,
    #[serde(rename = "fileContent")]
    file_content: String,
}

/// The listing is either attachment objects or bare file names
#[derive(Deserialize)]
#[serde(untagged)]
enum FileListDto {
    Bare(Vec<FileEntryDto>),
    Names {
        #[serde(alias = "fileNames", alias = "file_names")]
        names: Vec<String>,
    },
    Wrapped {
        #[serde(default)]
        files: Option<Vec<FileEntryDto>>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileEntryDto {
    Name(String),
    Full(FileDto),
}

#[derive(Deserialize)]
struct FileDto {
    #[serde(default, alias = "_id", alias = "fileId")]
    id: Option<Value>,
    #[serde(default, alias = "fileName", alias = "name")]
    file_name: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default, alias = "uploadedAt")]
    uploaded_at: Option<RawTimestamp>,
}

impl FileListDto {
    fn into_entries(self) -> Vec<FileEntryDto> {
        match self {
            FileListDto::Bare(items) => items,
            FileListDto::Names { names } => names.into_iter().map(FileEntryDto::Name).collect(),
            FileListDto::Wrapped { files } => files.unwrap_or_default(),
        }
    }
}

impl FileEntryDto {
    fn decode(self, endpoint: &str, task_id: &str) -> Result<FileAttachment> {
        match self {
            FileEntryDto::Name(name) => Ok(FileAttachment {
                id: name.clone(),
                task_id: task_id.to_string(),
                file_name: name,
                size: None,
                uploaded_at: None,
            }),
            FileEntryDto::Full(dto) => {
                let file_name = dto
                    .file_name
                    .ok_or_else(|| TaskflowError::decode(endpoint, "file without a name"))?;
                Ok(FileAttachment {
                    id: dto
                        .id
                        .as_ref()
                        .and_then(id_string)
                        .unwrap_or_else(|| file_name.clone()),
                    task_id: task_id.to_string(),
                    file_name,
                    size: dto.size,
                    uploaded_at: dto.uploaded_at.map(|t| t.decode()).transpose()?,
                })
            }
        }
    }
}

/// Name from a `filename` header, then `Content-Disposition`
fn download_name(headers: &HeaderMap) -> Option<String> {
    if let Some(name) = headers.get("filename").and_then(|v| v.to_str().ok()) {
        return Some(name.to_string());
    }
    let disposition = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    disposition.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("filename=")
            .map(|v| v.trim_matches('"').to_string())
    })
}

impl ApiClient {
    pub async fn upload_file(&self, upload: &FileUpload) -> Result<()> {
        let body = UploadBody {
            task_id: &upload.task_id,
            file_name: &upload.file_name,
            file_content: STANDARD.encode(&upload.content),
        };
        self.post("/tasks/files/upload", &["tasks", "files", "upload"], &body)
            .await?;
        info!(
            task_id = %upload.task_id,
            file = %upload.file_name,
            bytes = upload.content.len(),
            "file uploaded"
        );
        Ok(())
    }

    pub async fn list_files(&self, task_id: &str) -> Result<Vec<FileAttachment>> {
        const ENDPOINT: &str = "/tasks/{taskId}/files";
        let dto: FileListDto = self.get(ENDPOINT, &["tasks", task_id, "files"]).await?;
        dto.into_entries()
            .into_iter()
            .map(|e| e.decode(ENDPOINT, task_id))
            .collect()
    }

    pub async fn download_file(&self, file_id: &str) -> Result<FileDownload> {
        const ENDPOINT: &str = "/tasks/files/{fileId}";
        let response = self
            .get_raw(ENDPOINT, &["tasks", "files", file_id])
            .await?;
        let file_name = download_name(response.headers()).unwrap_or_else(|| file_id.to_string());
        let content = response.bytes().await?.to_vec();
        Ok(FileDownload { file_name, content })
    }

    /// Fails with `Conflict` while the file is referenced elsewhere
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.delete("/tasks/files/{fileId}", &["tasks", "files", file_id])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn decode(value: Value) -> Vec<FileAttachment> {
        let dto: FileListDto = serde_json::from_value(value).unwrap();
        dto.into_entries()
            .into_iter()
            .map(|e| e.decode("/files", "t1").unwrap())
            .collect()
    }

    #[test]
    fn test_file_names_listing() {
        let files = decode(json!({"fileNames": ["spec.pdf", "notes.txt"]}));
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, "spec.pdf");
        assert_eq!(files[1].task_id, "t1");
    }

    #[test]
    fn test_object_listing() {
        let files = decode(json!([
            {"fileId": "f1", "fileName": "a.png", "size": 12, "uploadedAt": "2025-01-01"}
        ]));
        assert_eq!(files[0].id, "f1");
        assert_eq!(files[0].size, Some(12));
        assert!(files[0].uploaded_at.is_some());
    }

    #[test]
    fn test_download_name_sources() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"report.pdf\""),
        );
        assert_eq!(download_name(&headers).as_deref(), Some("report.pdf"));
        headers.insert("filename", HeaderValue::from_static("direct.txt"));
        assert_eq!(download_name(&headers).as_deref(), Some("direct.txt"));
        assert_eq!(download_name(&HeaderMap::new()), None);
    }

    #[test]
    fn test_upload_body_is_base64() {
        let body = UploadBody {
            task_id: "t1",
            file_name: "a.txt",
            file_content: STANDARD.encode(b"hello"),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"taskId": "t1", "fileName": "a.txt", "fileContent": "aGVsbG8="})
        );
    }
}

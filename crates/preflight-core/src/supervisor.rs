//! Supervisor REST API collaborator.
//!
//! [`SupervisorApi`] is the seam the manager talks through; tests substitute
//! an in-memory fake. [`SupervisorClient`] is the real client: bearer-token
//! auth, `{"data": ...}` response envelopes, bounded timeouts. Nothing is
//! retried; failures are reported upward as-is.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://supervisor";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Archive downloads can be multi-gigabyte; give them five minutes.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

fn default_true() -> bool {
    true
}

/// One row of the backup list.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupEntry {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub size: f64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub protected: bool,
    #[serde(default = "default_true")]
    pub compressed: bool,
}

/// Full record from the backup info endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupDetail {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub size: f64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub protected: bool,
    #[serde(default = "default_true")]
    pub compressed: bool,
    #[serde(default)]
    pub homeassistant: Option<String>,
    #[serde(default)]
    pub addons: Vec<DetailAddon>,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailAddon {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub size: f64,
}

/// Host disk usage, from the supervisor info endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub used: f64,
    pub total: f64,
    pub free: f64,
    pub percentage: f64,
}

/// Operations the backup manager needs from the supervisor.
#[async_trait]
pub trait SupervisorApi: Send + Sync {
    async fn list_backups(&self) -> Result<Vec<BackupEntry>, ApiError>;
    async fn backup_info(&self, backup_id: &str) -> Result<Option<BackupDetail>, ApiError>;
    async fn download_backup(&self, backup_id: &str) -> Result<Vec<u8>, ApiError>;
    async fn core_version(&self) -> Result<String, ApiError>;
    /// Create a full backup; returns the new backup's slug.
    async fn create_backup(&self, name: &str, password: Option<&str>) -> Result<String, ApiError>;
    async fn restore_backup(&self, backup_id: &str, password: Option<&str>)
        -> Result<(), ApiError>;
    async fn delete_backup(&self, backup_id: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct SupervisorClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl SupervisorClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let token = token.into();
        if token.is_empty() {
            warn!("supervisor token is empty; requests will be unauthenticated");
        }
        Self {
            base_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Build from `SUPERVISOR_URL` / `SUPERVISOR_TOKEN`, the environment the
    /// supervisor injects into add-on containers.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("SUPERVISOR_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = std::env::var("SUPERVISOR_TOKEN").unwrap_or_default();
        Self::new(base_url, token)
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%method, %url, "supervisor request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|err| ApiError::Decode(format!("response body is not JSON: {err}")))
    }

    /// Whether the supervisor answers at all.
    pub async fn ping(&self) -> bool {
        self.request(Method::GET, "supervisor/info", None)
            .await
            .is_ok()
    }

    pub async fn storage_info(&self) -> Result<StorageInfo, ApiError> {
        let value = self.request(Method::GET, "supervisor/info", None).await?;
        let field = |name: &str| {
            value
                .pointer(&format!("/data/{name}"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };
        let used = field("disk_used");
        let total = field("disk_total");
        let free = field("disk_free");
        let percentage = if total > 0.0 {
            (used / total * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        Ok(StorageInfo {
            used,
            total,
            free,
            percentage,
        })
    }
}

#[async_trait]
impl SupervisorApi for SupervisorClient {
    async fn list_backups(&self) -> Result<Vec<BackupEntry>, ApiError> {
        let value = self.request(Method::GET, "backups", None).await?;
        let backups = value
            .pointer("/data/backups")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        serde_json::from_value(backups)
            .map_err(|err| ApiError::Decode(format!("backup list: {err}")))
    }

    async fn backup_info(&self, backup_id: &str) -> Result<Option<BackupDetail>, ApiError> {
        let endpoint = format!("backups/{backup_id}/info");
        match self.request(Method::GET, &endpoint, None).await {
            Ok(value) => {
                let data = value.get("data").cloned().unwrap_or(Value::Null);
                if data.is_null() {
                    return Ok(None);
                }
                serde_json::from_value(data)
                    .map(Some)
                    .map_err(|err| ApiError::Decode(format!("backup info: {err}")))
            }
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn download_backup(&self, backup_id: &str) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/backups/{}/download", self.base_url, backup_id);
        debug!(%url, "downloading backup archive");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn core_version(&self) -> Result<String, ApiError> {
        let value = self.request(Method::GET, "core/info", None).await?;
        value
            .pointer("/data/version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("core info response missing version".to_string()))
    }

    async fn create_backup(&self, name: &str, password: Option<&str>) -> Result<String, ApiError> {
        let mut body = json!({ "name": name, "compressed": true });
        if let Some(password) = password {
            body["password"] = json!(password);
        }
        let value = self
            .request(Method::POST, "backups/new/full", Some(body))
            .await?;
        value
            .pointer("/data/slug")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("backup creation response missing slug".to_string()))
    }

    async fn restore_backup(
        &self,
        backup_id: &str,
        password: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut body = json!({});
        if let Some(password) = password {
            body["password"] = json!(password);
        }
        let endpoint = format!("backups/{backup_id}/restore/full");
        self.request(Method::POST, &endpoint, Some(body)).await?;
        Ok(())
    }

    async fn delete_backup(&self, backup_id: &str) -> Result<(), ApiError> {
        let endpoint = format!("backups/{backup_id}");
        self.request(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }
}

//! Google Drive v3 gateway.
//!
//! Resolves the remote object by name and updates it in place; creates
//! exactly one object when none exists yet. The OAuth token is read from a
//! token JSON file and refreshed against the token endpoint when expired
//! (the refreshed token is written back, like the CLI that generated it).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use streak_core::{config::SyncConfig, error::StreakError, shellexpand, traits::SyncGateway};
use tokio::sync::Mutex;
use tracing::{debug, info};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// Stored OAuth credentials, in the layout Google's tooling writes.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    #[serde(default)]
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

/// Google Drive sync gateway.
pub struct DriveGateway {
    client: reqwest::Client,
    token_path: PathBuf,
    folder_id: Option<String>,
    /// Remote file id, seeded from config and cached once discovered, so the
    /// create path runs at most once per process.
    file_id: Mutex<Option<String>>,
}

impl DriveGateway {
    pub fn new(config: &SyncConfig) -> Self {
        let folder_id = if config.folder_id.is_empty() {
            None
        } else {
            Some(config.folder_id.clone())
        };
        let file_id = if config.file_id.is_empty() {
            None
        } else {
            Some(config.file_id.clone())
        };
        Self {
            client: reqwest::Client::new(),
            token_path: PathBuf::from(shellexpand(&config.token_path)),
            folder_id,
            file_id: Mutex::new(file_id),
        }
    }

    /// Load the stored token, refreshing it first if it has expired.
    async fn access_token(&self) -> Result<String, StreakError> {
        let content = std::fs::read_to_string(&self.token_path).map_err(|e| {
            StreakError::Sync(format!(
                "token file {} not readable: {e}",
                self.token_path.display()
            ))
        })?;
        let mut stored: StoredToken = serde_json::from_str(&content)
            .map_err(|e| StreakError::Sync(format!("token file parse failed: {e}")))?;

        let expired = stored
            .expiry
            .map(|t| t <= Utc::now() + chrono::Duration::seconds(60))
            .unwrap_or(false);

        if expired && stored.refresh_token.is_some() {
            self.refresh(&mut stored).await?;
            // Best-effort write-back so the next run starts fresh.
            if let Ok(serialized) = serde_json::to_string_pretty(&stored) {
                if let Err(e) = std::fs::write(&self.token_path, serialized) {
                    debug!("failed to write refreshed token back: {e}");
                }
            }
        }

        if stored.token.is_empty() {
            return Err(StreakError::Sync("token file has no access token".into()));
        }
        Ok(stored.token)
    }

    /// Exchange the refresh token for a fresh access token.
    async fn refresh(&self, stored: &mut StoredToken) -> Result<(), StreakError> {
        let token_uri = stored
            .token_uri
            .as_deref()
            .unwrap_or("https://oauth2.googleapis.com/token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", stored.refresh_token.as_deref().unwrap_or("")),
            ("client_id", stored.client_id.as_deref().unwrap_or("")),
            ("client_secret", stored.client_secret.as_deref().unwrap_or("")),
        ];

        let resp: RefreshResponse = self
            .client
            .post(token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| StreakError::Sync(format!("token refresh failed: {e}")))?
            .error_for_status()
            .map_err(|e| StreakError::Sync(format!("token refresh rejected: {e}")))?
            .json()
            .await
            .map_err(|e| StreakError::Sync(format!("token refresh parse failed: {e}")))?;

        stored.token = resp.access_token;
        stored.expiry = Some(Utc::now() + chrono::Duration::seconds(resp.expires_in));
        info!("drive: refreshed access token");
        Ok(())
    }

    /// Find an existing untrashed file by exact name, scoped to the
    /// configured folder when one is set.
    async fn find_by_name(&self, token: &str, name: &str) -> Result<Option<String>, StreakError> {
        let mut q = format!("name = '{}' and trashed = false", name.replace('\'', "\\'"));
        if let Some(ref folder) = self.folder_id {
            q.push_str(&format!(" and '{folder}' in parents"));
        }

        let list: FileList = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(token)
            .query(&[("q", q.as_str()), ("fields", "files(id)"), ("pageSize", "1")])
            .send()
            .await
            .map_err(|e| StreakError::Sync(format!("drive list failed: {e}")))?
            .error_for_status()
            .map_err(|e| StreakError::Sync(format!("drive list rejected: {e}")))?
            .json()
            .await
            .map_err(|e| StreakError::Sync(format!("drive list parse failed: {e}")))?;

        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Replace the content of an existing file.
    async fn update_media(
        &self,
        token: &str,
        file_id: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StreakError> {
        self.client
            .patch(format!("{DRIVE_UPLOAD_URL}/{file_id}?uploadType=media"))
            .bearer_auth(token)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StreakError::Sync(format!("drive update failed: {e}")))?
            .error_for_status()
            .map_err(|e| StreakError::Sync(format!("drive update rejected: {e}")))?;
        Ok(())
    }

    /// Create the remote file: metadata first, then its content.
    async fn create(&self, token: &str, name: &str, bytes: Vec<u8>) -> Result<String, StreakError> {
        let mut metadata = json!({ "name": name });
        if let Some(ref folder) = self.folder_id {
            metadata["parents"] = json!([folder]);
        }

        let created: FileRef = self
            .client
            .post(DRIVE_FILES_URL)
            .bearer_auth(token)
            .json(&metadata)
            .send()
            .await
            .map_err(|e| StreakError::Sync(format!("drive create failed: {e}")))?
            .error_for_status()
            .map_err(|e| StreakError::Sync(format!("drive create rejected: {e}")))?
            .json()
            .await
            .map_err(|e| StreakError::Sync(format!("drive create parse failed: {e}")))?;

        self.update_media(token, &created.id, bytes).await?;
        Ok(created.id)
    }
}

#[async_trait]
impl SyncGateway for DriveGateway {
    fn name(&self) -> &str {
        "drive"
    }

    async fn sync_file(&self, local_path: &Path, remote_name: &str) -> Result<(), StreakError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| StreakError::Sync(format!("cannot read {}: {e}", local_path.display())))?;
        let token = self.access_token().await?;

        // Holding the id lock across the whole operation keeps the
        // lookup-then-create path single-flight within this process.
        let mut cached = self.file_id.lock().await;

        if let Some(ref id) = *cached {
            self.update_media(&token, id, bytes).await?;
            debug!("drive: updated {remote_name} ({id})");
            return Ok(());
        }

        if let Some(id) = self.find_by_name(&token, remote_name).await? {
            self.update_media(&token, &id, bytes).await?;
            debug!("drive: updated {remote_name} ({id})");
            *cached = Some(id);
            return Ok(());
        }

        let id = self.create(&token, remote_name, bytes).await?;
        info!("drive: created {remote_name} ({id}); set sync.file_id = \"{id}\" in config.toml");
        *cached = Some(id);
        Ok(())
    }
}

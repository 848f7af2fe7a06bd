//! Local records of provisioned enterprises and their credentials.
//!
//! The gateway decides whether a consumer exists; this store only retains
//! the generated API key and password hash so they are never regenerated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::fs;
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enterprise {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Enterprise {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    pub enterprise_id: Uuid,
    pub username: String,
    pub email: String,
    pub apikey: String,
    /// Argon2id PHC hash.
    pub password: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait EnterpriseStore: Send + Sync {
    /// Exact, case-sensitive name match.
    async fn find_enterprise(&self, name: &str) -> Result<Option<Enterprise>, StoreError>;

    async fn find_authorization(
        &self,
        enterprise_id: Uuid,
    ) -> Result<Option<Authorization>, StoreError>;

    async fn save_enterprise(&self, enterprise: &Enterprise) -> Result<(), StoreError>;

    async fn save_authorization(&self, authorization: &Authorization) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Records {
    #[serde(default)]
    enterprises: Vec<Enterprise>,
    #[serde(default)]
    authorizations: Vec<Authorization>,
}

impl Records {
    fn enterprise(&self, name: &str) -> Option<Enterprise> {
        self.enterprises.iter().find(|e| e.name == name).cloned()
    }

    fn authorization(&self, enterprise_id: Uuid) -> Option<Authorization> {
        self.authorizations
            .iter()
            .find(|a| a.enterprise_id == enterprise_id)
            .cloned()
    }

    fn upsert_enterprise(&mut self, enterprise: &Enterprise) {
        match self.enterprises.iter_mut().find(|e| e.id == enterprise.id) {
            Some(existing) => *existing = enterprise.clone(),
            None => self.enterprises.push(enterprise.clone()),
        }
    }

    fn upsert_authorization(&mut self, authorization: &Authorization) {
        match self
            .authorizations
            .iter_mut()
            .find(|a| a.enterprise_id == authorization.enterprise_id)
        {
            Some(existing) => *existing = authorization.clone(),
            None => self.authorizations.push(authorization.clone()),
        }
    }
}

/// Store backed by a single JSON document on disk.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.kong-provision/enterprises.json`, or the working directory when
    /// no home directory is known.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".kong-provision"))
            .unwrap_or_default()
            .join("enterprises.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Records, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Records::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_str(&content).map_err(|e| self.corrupt(e))
    }

    async fn save(&self, records: &Records) -> Result<(), StoreError> {
        let parent = self.path.parent();
        if let Some(dir) = parent.filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string_pretty(records).map_err(|e| self.corrupt(e))?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, source: serde_json::Error) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl EnterpriseStore for FileStore {
    async fn find_enterprise(&self, name: &str) -> Result<Option<Enterprise>, StoreError> {
        Ok(self.load().await?.enterprise(name))
    }

    async fn find_authorization(
        &self,
        enterprise_id: Uuid,
    ) -> Result<Option<Authorization>, StoreError> {
        Ok(self.load().await?.authorization(enterprise_id))
    }

    async fn save_enterprise(&self, enterprise: &Enterprise) -> Result<(), StoreError> {
        let mut records = self.load().await?;
        records.upsert_enterprise(enterprise);
        self.save(&records).await
    }

    async fn save_authorization(&self, authorization: &Authorization) -> Result<(), StoreError> {
        let mut records = self.load().await?;
        records.upsert_authorization(authorization);
        self.save(&records).await
    }
}

/// In-process store; records are lost when it is dropped.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enterprises(&self) -> Vec<Enterprise> {
        self.lock().enterprises.clone()
    }

    pub fn authorizations(&self) -> Vec<Authorization> {
        self.lock().authorizations.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EnterpriseStore for MemoryStore {
    async fn find_enterprise(&self, name: &str) -> Result<Option<Enterprise>, StoreError> {
        Ok(self.lock().enterprise(name))
    }

    async fn find_authorization(
        &self,
        enterprise_id: Uuid,
    ) -> Result<Option<Authorization>, StoreError> {
        Ok(self.lock().authorization(enterprise_id))
    }

    async fn save_enterprise(&self, enterprise: &Enterprise) -> Result<(), StoreError> {
        self.lock().upsert_enterprise(enterprise);
        Ok(())
    }

    async fn save_authorization(&self, authorization: &Authorization) -> Result<(), StoreError> {
        self.lock().upsert_authorization(authorization);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorization_for(enterprise: &Enterprise) -> Authorization {
        Authorization {
            enterprise_id: enterprise.id,
            username: enterprise.name.clone(),
            email: "ops@acme.com".to_string(),
            apikey: "0123456789abcdef0123456789abcdef01234567".to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("enterprises.json");
        let store = FileStore::new(&path);

        let missing = store.find_enterprise("Acme").await.unwrap();
        assert!(missing.is_none());
        assert!(!path.exists());

        let enterprise = Enterprise::new("Acme");
        let authorization = authorization_for(&enterprise);
        store.save_enterprise(&enterprise).await.unwrap();
        store.save_authorization(&authorization).await.unwrap();
        assert!(path.exists());

        let reopened = FileStore::new(store.path());
        let found = reopened.find_enterprise("Acme").await.unwrap();
        let found = found.expect("enterprise should be persisted");
        assert_eq!(found, enterprise);
        let auth = reopened.find_authorization(found.id).await.unwrap();
        let auth = auth.expect("authorization should be persisted");
        assert_eq!(auth.username, "Acme");
        assert_eq!(auth.apikey.len(), 40);
    }

    #[tokio::test]
    async fn test_file_store_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("enterprises.json"));

        let mut enterprise = Enterprise::new("Acme");
        store.save_enterprise(&enterprise).await.unwrap();
        enterprise.name = "Acme Corp".to_string();
        store.save_enterprise(&enterprise).await.unwrap();

        let renamed = store.find_enterprise("Acme Corp").await.unwrap();
        assert_eq!(renamed.map(|e| e.id), Some(enterprise.id));
        assert!(store.find_enterprise("Acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enterprise_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        let enterprise = Enterprise::new("Acme");
        store.save_enterprise(&enterprise).await.unwrap();

        assert!(store.find_enterprise("Acme").await.unwrap().is_some());
        assert!(store.find_enterprise("acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enterprises.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        let err = store.find_enterprise("Acme").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_saving_twice_does_not_duplicate() {
        let store = MemoryStore::new();
        let enterprise = Enterprise::new("Acme");
        store.save_enterprise(&enterprise).await.unwrap();
        store.save_enterprise(&enterprise).await.unwrap();
        assert_eq!(store.enterprises().len(), 1);
    }
}

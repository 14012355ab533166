use std::path::{ Path, PathBuf };
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{ Mutex, MutexGuard, RwLock };

use crate::error::{ AppError, Result };

pub mod entity;
pub use entity::*;

/// Whole-collection alert storage.
///
/// Implementations are not expected to lock; callers serialize
/// read-modify-write sequences themselves.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Load every stored alert. A store that does not exist yet is empty.
    async fn load(&self) -> Result<Vec<Alert>>;

    /// Replace the stored collection.
    async fn save(&self, alerts: &[Alert]) -> Result<()>;
}

/// Serializes access to an [`AlertRepository`].
///
/// Every load→mutate→save sequence must hold the guard returned by
/// [`AlertStore::lock`] for its whole duration.
pub struct AlertStore {
    repo: Mutex<Arc<dyn AlertRepository>>,
}

impl AlertStore {
    pub fn new(repo: Arc<dyn AlertRepository>) -> Self {
        Self { repo: Mutex::new(repo) }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Arc<dyn AlertRepository>> {
        self.repo.lock().await
    }
}

/// Alerts kept as a pretty-printed JSON array in a single file.
pub struct JsonFileAlertRepository {
    path: PathBuf,
}

impl JsonFileAlertRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "alerts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl AlertRepository for JsonFileAlertRepository {
    async fn load(&self) -> Result<Vec<Alert>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Alert store {} not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::StoreIo(format!("Failed to read {}: {}", self.path.display(), e)));
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json
            ::from_str(&contents)
            .map_err(|e| AppError::StoreIo(format!("Corrupt alert store {}: {}", self.path.display(), e)))
    }

    async fn save(&self, alerts: &[Alert]) -> Result<()> {
        let json = serde_json
            ::to_string_pretty(alerts)
            .map_err(|e| AppError::StoreIo(format!("Failed to encode alerts: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so readers never observe a half-written file.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!("Saved {} alerts to {}", alerts.len(), self.path.display());
        Ok(())
    }
}

/// Process-local store, used in tests and for throwaway deployments.
#[derive(Default)]
pub struct InMemoryAlertRepository {
    alerts: RwLock<Vec<Alert>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alerts(alerts: Vec<Alert>) -> Self {
        Self { alerts: RwLock::new(alerts) }
    }
}

#[async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn load(&self) -> Result<Vec<Alert>> {
        Ok(self.alerts.read().await.clone())
    }

    async fn save(&self, alerts: &[Alert]) -> Result<()> {
        *self.alerts.write().await = alerts.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_alert(id: &str) -> Alert {
        Alert {
            id: id.to_string(),
            symbol: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            alert_type: "price-above".to_string(),
            threshold: Some(200.0),
            percentage: None,
            status: "active".to_string(),
            created_at: Utc::now(),
            last_triggered: None,
            triggered_price: None,
            triggered_change: None,
            email_notifications: true,
            in_app_notifications: false,
        }
    }

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("stock-alerts-{}", uuid::Uuid::new_v4()))
            .join("alerts.json")
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let repo = JsonFileAlertRepository::new(temp_store_path());
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_save_and_load() {
        let path = temp_store_path();
        let repo = JsonFileAlertRepository::new(&path);

        let alerts = vec![sample_alert("a1"), sample_alert("a2")];
        repo.save(&alerts).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded, alerts);
        assert!(!repo.temp_path().exists());

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn test_corrupt_file_is_store_error() {
        let path = temp_store_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let repo = JsonFileAlertRepository::new(&path);
        let err = repo.load().await.unwrap_err();
        assert!(matches!(err, AppError::StoreIo(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_store_lock_serializes_writers() {
        let store = Arc::new(AlertStore::new(Arc::new(InMemoryAlertRepository::new())));

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let repo = store.lock().await;
                let mut alerts = repo.load().await.unwrap();
                tokio::task::yield_now().await;
                alerts.push(sample_alert(&format!("a{}", i)));
                repo.save(&alerts).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let repo = store.lock().await;
        assert_eq!(repo.load().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_in_memory_replaces_collection() {
        let repo = InMemoryAlertRepository::with_alerts(vec![sample_alert("a1")]);
        repo.save(&[sample_alert("b1")]).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "b1");
    }
}

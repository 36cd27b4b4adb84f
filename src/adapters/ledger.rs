use crate::domain::model::{JobId, JobRecord, OwnerId, StoredJob};
use crate::domain::ports::{JobLedger, Storage};
use crate::utils::error::{Result, SiteError};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

fn owned_newest_first(jobs: &[StoredJob], owner: &OwnerId) -> Vec<StoredJob> {
    // Later appends win timestamp ties.
    let mut owned: Vec<StoredJob> = jobs
        .iter()
        .rev()
        .filter(|job| &job.record.owner == owner)
        .cloned()
        .collect();
    owned.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
    owned
}

fn find_owned(jobs: &[StoredJob], id: JobId, owner: &OwnerId) -> Option<StoredJob> {
    jobs.iter()
        .find(|job| job.id == id && &job.record.owner == owner)
        .cloned()
}

/// Process-local ledger. Jobs vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryJobLedger {
    jobs: RwLock<Vec<StoredJob>>,
}

impl InMemoryJobLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobLedger for InMemoryJobLedger {
    async fn append(&self, record: JobRecord) -> Result<JobId> {
        let id = JobId::new();
        self.jobs.write().await.push(StoredJob { id, record });
        Ok(id)
    }

    async fn get(&self, id: JobId, owner: &OwnerId) -> Result<Option<StoredJob>> {
        Ok(find_owned(&self.jobs.read().await, id, owner))
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<StoredJob>> {
        Ok(owned_newest_first(&self.jobs.read().await, owner))
    }
}

/// Ledger persisted as a single JSON document through a `Storage` backend.
///
/// Every append rewrites the whole document; the in-memory copy only changes
/// after the write succeeds, so a failed append never shows up in history.
pub struct FileJobLedger<S: Storage> {
    storage: S,
    path: String,
    jobs: Mutex<Option<Vec<StoredJob>>>,
}

impl<S: Storage> FileJobLedger<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
            jobs: Mutex::new(None),
        }
    }

    async fn read_all(&self) -> Result<Vec<StoredJob>> {
        match self.storage.read_file(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| SiteError::PersistenceFailure {
                message: format!("ledger '{}' is corrupt: {}", self.path, e),
            }),
            Err(SiteError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No ledger at '{}', starting empty", self.path);
                Ok(Vec::new())
            }
            Err(e) => Err(SiteError::PersistenceFailure {
                message: format!("failed to read ledger '{}': {}", self.path, e),
            }),
        }
    }

    async fn with_jobs<T>(&self, f: impl FnOnce(&[StoredJob]) -> T) -> Result<T> {
        let mut guard = self.jobs.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_all().await?);
        }
        Ok(f(guard.as_deref().unwrap_or_default()))
    }
}

#[async_trait]
impl<S: Storage> JobLedger for FileJobLedger<S> {
    async fn append(&self, record: JobRecord) -> Result<JobId> {
        let mut guard = self.jobs.lock().await;
        let mut jobs = match guard.take() {
            Some(jobs) => jobs,
            None => self.read_all().await?,
        };

        let id = JobId::new();
        jobs.push(StoredJob { id, record });

        let written = match serde_json::to_vec_pretty(&jobs) {
            Ok(bytes) => self.storage.write_file(&self.path, &bytes).await,
            Err(e) => Err(e.into()),
        };

        match written {
            Ok(()) => {
                *guard = Some(jobs);
                Ok(id)
            }
            Err(e) => {
                jobs.pop();
                *guard = Some(jobs);
                Err(SiteError::PersistenceFailure {
                    message: format!("failed to write ledger '{}': {}", self.path, e),
                })
            }
        }
    }

    async fn get(&self, id: JobId, owner: &OwnerId) -> Result<Option<StoredJob>> {
        self.with_jobs(|jobs| find_owned(jobs, id, owner)).await
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<StoredJob>> {
        self.with_jobs(|jobs| owned_newest_first(jobs, owner)).await
    }
}

//! Job table shared between the manager and pipeline tasks.
//!
//! The store is the only cross-job mutable state. Reads return clones so
//! polling never holds the lock across an await point of the caller.

use std::collections::HashMap;

use tokio::sync::RwLock;

use invite_models::{GenerationJob, JobId, JobResult, PipelineStage};

use crate::error::{WorkerError, WorkerResult};

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, GenerationJob>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job. Fails if the ID is taken.
    pub async fn insert(&self, job: GenerationJob) -> WorkerResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(WorkerError::DuplicateJob(job.id.to_string()));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    /// Snapshot of a job.
    pub async fn get(&self, id: &JobId) -> Option<GenerationJob> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn update<R>(&self, id: &JobId, f: impl FnOnce(&mut GenerationJob) -> R) -> WorkerResult<R> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| WorkerError::JobNotFound(id.to_string()))?;
        Ok(f(job))
    }

    /// Claim a queued job for execution.
    ///
    /// Returns `false` if the job was already claimed, which makes a second
    /// pipeline run for the same ID impossible.
    pub async fn begin(&self, id: &JobId) -> WorkerResult<bool> {
        self.update(id, |job| job.start()).await
    }

    /// Record a stage checkpoint.
    pub async fn advance(
        &self,
        id: &JobId,
        stage: PipelineStage,
        progress: u8,
        message: impl Into<String>,
    ) -> WorkerResult<()> {
        let message = message.into();
        self.update(id, |job| {
            job.advance(stage, progress, message);
        })
        .await
    }

    pub async fn warn(&self, id: &JobId, warning: impl Into<String>) -> WorkerResult<()> {
        let warning = warning.into();
        self.update(id, |job| job.warn(warning)).await
    }

    /// Mark a running job completed. Returns `false` if it was not running.
    pub async fn complete(&self, id: &JobId, result: JobResult) -> WorkerResult<bool> {
        self.update(id, |job| job.complete(result)).await
    }

    /// Mark a job failed. Returns `false` if it was already terminal.
    pub async fn fail(&self, id: &JobId, error: impl Into<String>) -> WorkerResult<bool> {
        let error = error.into();
        self.update(id, |job| job.fail(error)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invite_models::JobStatus;

    fn job() -> GenerationJob {
        GenerationJob::new(JobId::new(), "elegant-engagement", "default")
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = JobStore::new();
        let job = job();
        let id = job.id.clone();

        store.insert(job.clone()).await.unwrap();
        assert!(matches!(
            store.insert(job).await,
            Err(WorkerError::DuplicateJob(_))
        ));
        assert_eq!(store.get(&id).await.unwrap().status, JobStatus::Queued);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_begin_only_once() {
        let store = JobStore::new();
        let job = job();
        let id = job.id.clone();
        store.insert(job).await.unwrap();

        assert!(store.begin(&id).await.unwrap());
        assert!(!store.begin(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let store = JobStore::new();
        let id = JobId::new();
        assert!(store.get(&id).await.is_none());
        assert!(matches!(
            store.advance(&id, PipelineStage::Rendering, 40, "x").await,
            Err(WorkerError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_and_warn() {
        let store = JobStore::new();
        let job = job();
        let id = job.id.clone();
        store.insert(job).await.unwrap();
        store.begin(&id).await.unwrap();

        store.warn(&id, "media slot couple-photo empty").await.unwrap();
        assert!(store.fail(&id, "boom").await.unwrap());
        assert!(!store.fail(&id, "again").await.unwrap());

        let job = store.get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert_eq!(job.warnings.len(), 1);
    }
}
